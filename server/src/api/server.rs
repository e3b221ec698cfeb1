//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;

use tower_http::compression::CompressionLayer;

use super::middleware;
use super::routes::{audit, health, tables};
use crate::core::CoreApp;
use crate::core::config::AppConfig;
use crate::core::constants::DEFAULT_BODY_LIMIT;
use crate::data::AuditStore;

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Serve until the shutdown signal fires
    pub async fn start(self) -> Result<CoreApp> {
        let Self { app } = self;

        let shutdown = app.shutdown.clone();

        let host = app.config.server.host.clone();
        let port = app.config.server.port;

        let router = build_router(app.store.clone(), &app.config);

        // Bind by name so "localhost" resolves
        let listener = TcpListener::bind((host.as_str(), port))
            .await
            .with_context(|| format!("Failed to bind {}:{}", host, port))?;
        let addr: SocketAddr = listener.local_addr()?;
        tracing::debug!(%addr, "Listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::debug!("Server stopped");
        Ok(app)
    }
}

/// Build the full application router
pub fn build_router(store: Arc<dyn AuditStore>, config: &AppConfig) -> Router {
    Router::new()
        .route("/api/v1/health", get(health::health))
        .nest(
            "/api/v1/audit",
            audit::routes(store.clone(), &config.store.table, config.audit.clone()),
        )
        .nest("/api/v1/tables", tables::routes(store))
        .fallback(middleware::handle_404)
        .layer(CompressionLayer::new())
        .layer(middleware::cors())
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
}
