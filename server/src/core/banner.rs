//! Startup banner

use super::config::{AppConfig, is_all_interfaces};
use super::constants::APP_NAME;

/// Print the startup banner with the API URL and store target
pub fn print_banner(config: &AppConfig, store_name: &str) {
    let host = config.server.host.as_str();
    let port = config.server.port;

    // Use localhost for display when binding to all interfaces
    let display_host = if is_all_interfaces(host) {
        "localhost"
    } else {
        host
    };

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();

    const W: usize = 10;
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/api/v1/audit/query",
        "API:", display_host, port
    );
    println!(
        "  \x1b[90m➜  {:<W$} {} table {} ({})\x1b[0m",
        "Store:",
        store_name,
        config.store.table,
        config.store.region.as_deref().unwrap_or("default region")
    );
    if let Some(endpoint) = &config.store.endpoint {
        println!("  \x1b[90m➜  {:<W$} {}\x1b[0m", "Endpoint:", endpoint);
    }
    if host == "127.0.0.1" || host == "localhost" {
        println!(
            "  \x1b[90m➜  {:<W$} use --host 0.0.0.0 to expose\x1b[0m",
            "Network:"
        );
    }

    println!();
}
