use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_ENDPOINT, ENV_HOST, ENV_PORT, ENV_RANGE_MODE, ENV_REGION, ENV_TABLE,
    ENV_TABLE_FALLBACK,
};
use crate::domain::RangeBoundMode;

#[derive(Parser)]
#[command(name = "auditquery")]
#[command(version, about = "Ad-hoc filtered queries over a DynamoDB audit table", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Audit table name (falls back to AUDIT_TABLE)
    #[arg(long, short = 't', global = true, env = ENV_TABLE)]
    pub table: Option<String>,

    /// AWS region
    #[arg(long, global = true, env = ENV_REGION)]
    pub region: Option<String>,

    /// Custom DynamoDB endpoint URL (DynamoDB Local, LocalStack)
    #[arg(long, global = true, env = ENV_ENDPOINT)]
    pub endpoint: Option<String>,

    /// Where the date range goes in indexed queries (filter or key_condition)
    #[arg(long, global = true, env = ENV_RANGE_MODE, value_parser = parse_range_mode)]
    pub range_mode: Option<RangeBoundMode>,
}

/// Parse range bound mode from CLI/env string
fn parse_range_mode(s: &str) -> Result<RangeBoundMode, String> {
    match s.to_lowercase().as_str() {
        "filter" | "filter_clause" => Ok(RangeBoundMode::FilterClause),
        "key_condition" | "key" => Ok(RangeBoundMode::KeyCondition),
        _ => Err(format!(
            "Invalid range mode '{}'. Valid options: filter, key_condition",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Print the compiled audit query for the given parameters without running it
    Explain {
        /// Request parameters as name=value pairs
        #[arg(value_name = "NAME=VALUE", value_parser = parse_pair)]
        params: Vec<(String, String)>,

        /// Compile as a scan instead of an indexed query
        #[arg(long)]
        scan: bool,
    },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("Expected NAME=VALUE, got '{}'", s))
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub table: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub range_mode: Option<RangeBoundMode>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        table: cli.table.or_else(|| {
            std::env::var(ENV_TABLE_FALLBACK)
                .ok()
                .filter(|t| !t.trim().is_empty())
        }),
        region: cli.region,
        endpoint: cli.endpoint,
        range_mode: cli.range_mode,
    };
    (config, cli.command)
}
