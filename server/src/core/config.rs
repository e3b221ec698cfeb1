use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, AUDIT_PROJECTION, CONFIG_FILE_NAME, DEFAULT_AUDIT_TABLE, DEFAULT_HOST,
    DEFAULT_INDEX_FIELDS, DEFAULT_PORT, DEFAULT_RANGE_ATTRIBUTE,
};
use crate::domain::RangeBoundMode;
use crate::domain::query::CompileOptions;

// =============================================================================
// File Config Structs (all fields optional for merging)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Store configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StoreFileConfig {
    pub table: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

/// Audit query configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuditFileConfig {
    pub index_fields: Option<Vec<String>>,
    pub range_attribute: Option<String>,
    pub range_mode: Option<RangeBoundMode>,
    pub projection: Option<Vec<String>>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub store: Option<StoreFileConfig>,
    pub audit: Option<AuditFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
        }

        if let Some(store) = other.store {
            let current = self.store.get_or_insert_with(StoreFileConfig::default);
            if store.table.is_some() {
                tracing::trace!(table = ?store.table, "Merging store.table");
                current.table = store.table;
            }
            if store.region.is_some() {
                current.region = store.region;
            }
            if store.endpoint.is_some() {
                current.endpoint = store.endpoint;
            }
        }

        // Lists replace rather than append
        if let Some(audit) = other.audit {
            let current = self.audit.get_or_insert_with(AuditFileConfig::default);
            if audit.index_fields.is_some() {
                tracing::trace!(index_fields = ?audit.index_fields, "Merging audit.index_fields");
                current.index_fields = audit.index_fields;
            }
            if audit.range_attribute.is_some() {
                current.range_attribute = audit.range_attribute;
            }
            if audit.range_mode.is_some() {
                tracing::trace!(range_mode = ?audit.range_mode, "Merging audit.range_mode");
                current.range_mode = audit.range_mode;
            }
            if audit.projection.is_some() {
                current.projection = audit.projection;
            }
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Store connection configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub table: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

/// Audit query shape
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Fields that select a `<field>-index`, in priority order
    pub index_fields: Vec<String>,
    pub range_attribute: String,
    pub range_mode: RangeBoundMode,
    pub projection: Vec<String>,
}

impl AuditConfig {
    /// Compiler options for indexed audit queries
    pub fn query_options(&self) -> CompileOptions {
        CompileOptions {
            range_attribute: self.range_attribute.clone(),
            range_mode: self.range_mode,
            projection: self.projection.clone(),
        }
    }

    /// Compiler options for the fixed-table audit scan
    pub fn scan_options(&self) -> CompileOptions {
        CompileOptions {
            range_attribute: self.range_attribute.clone(),
            range_mode: RangeBoundMode::FilterClause,
            projection: self.projection.clone(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            index_fields: DEFAULT_INDEX_FIELDS.iter().map(|f| f.to_string()).collect(),
            range_attribute: DEFAULT_RANGE_ATTRIBUTE.to_string(),
            range_mode: RangeBoundMode::default(),
            projection: AUDIT_PROJECTION.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub audit: AuditConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.auditquery/auditquery.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.auditquery/auditquery.json) - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_home(path);
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::resolve(cli, file_config);
        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            table = %config.store.table,
            region = ?config.store.region,
            range_mode = %config.audit.range_mode,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn resolve(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_store = file_config.store.unwrap_or_default();
        let file_audit = file_config.audit.unwrap_or_default();
        let defaults = AuditConfig::default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        let table = cli
            .table
            .clone()
            .or(file_store.table)
            .unwrap_or_else(|| DEFAULT_AUDIT_TABLE.to_string());

        // Blank region/endpoint means "use the SDK default"
        let region = cli
            .region
            .clone()
            .or(file_store.region)
            .filter(|r| !r.trim().is_empty());
        let endpoint = cli
            .endpoint
            .clone()
            .or(file_store.endpoint)
            .filter(|e| !e.trim().is_empty());

        let audit = AuditConfig {
            index_fields: file_audit.index_fields.unwrap_or(defaults.index_fields),
            range_attribute: file_audit
                .range_attribute
                .unwrap_or(defaults.range_attribute),
            range_mode: cli
                .range_mode
                .or(file_audit.range_mode)
                .unwrap_or(defaults.range_mode),
            projection: file_audit.projection.unwrap_or(defaults.projection),
        };

        Self {
            server: ServerConfig { host, port },
            store: StoreConfig {
                table,
                region,
                endpoint,
            },
            audit,
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }

        // Port must be non-zero (port 0 would cause bind failure)
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        if self.store.table.trim().is_empty() {
            anyhow::bail!("Configuration error: store.table must not be empty");
        }

        if self.audit.index_fields.is_empty() {
            anyhow::bail!("Configuration error: audit.index_fields must list at least one field");
        }

        for (i, field) in self.audit.index_fields.iter().enumerate() {
            if field.trim().is_empty() {
                anyhow::bail!("Configuration error: audit.index_fields[{}] is empty", i);
            }
            if self.audit.index_fields[..i]
                .iter()
                .any(|f| f.eq_ignore_ascii_case(field))
            {
                anyhow::bail!(
                    "Configuration error: audit.index_fields contains '{}' more than once",
                    field
                );
            }
        }

        if self.audit.range_attribute.trim().is_empty() {
            anyhow::bail!("Configuration error: audit.range_attribute must not be empty");
        }

        if self.audit.projection.iter().any(|p| p.trim().is_empty()) {
            anyhow::bail!("Configuration error: audit.projection contains an empty name");
        }

        Ok(())
    }
}

/// Get the profile config path (~/.auditquery/auditquery.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// Check if host binds to all network interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}
