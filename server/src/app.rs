//! Core application

use std::sync::Arc;

use anyhow::Result;

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::{AuditStore, DynamoStore};
use crate::domain::query::{
    classify, classify_for_query, collect_parameters, compile_query, compile_scan, decode_cursor,
};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub store: Arc<dyn AuditStore>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Explain { params, scan }) => {
                let config = AppConfig::load(&cli_config)?;
                return Self::explain(&config, &params, scan);
            }
            Some(Commands::Start) | None => {}
        }

        let app = Self::init(&cli_config).await?;
        Self::start_server(app).await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let store: Arc<dyn AuditStore> = Arc::new(
            DynamoStore::new(config.store.region.clone(), config.store.endpoint.clone()).await,
        );
        tracing::debug!(backend = store.name(), table = %config.store.table, "Store initialized");

        Ok(Self {
            shutdown: ShutdownService::new(),
            config,
            store,
        })
    }

    /// Print the compiled audit request for `params` without contacting the store
    fn explain(config: &AppConfig, params: &[(String, String)], scan: bool) -> Result<()> {
        let request = collect_parameters(params, None);

        let (operation, compiled) = if scan {
            let classification = classify(&request.params, &[]);
            ("scan", compile_scan(&classification, &config.audit.scan_options()))
        } else {
            let classification = classify_for_query(&request.params, &config.audit.index_fields)?;
            (
                "query",
                compile_query(&classification, &config.audit.query_options())?,
            )
        };
        let compiled = compiled.with_controls(&request.controls);

        let start_key = request
            .controls
            .next_token
            .as_deref()
            .map(decode_cursor)
            .transpose()?
            .flatten();

        let output = serde_json::json!({
            "table": config.store.table,
            "operation": operation,
            "compiled": compiled,
            "exclusive_start_key": start_key,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        banner::print_banner(&app.config, app.store.name());

        let server = ApiServer::new(app);
        let app = server.start().await?;
        tracing::debug!(triggered = app.shutdown.is_triggered(), "Shutdown complete");

        Ok(())
    }
}
