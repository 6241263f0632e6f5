#![cfg(not(tarpaulin_include))]

use clap::Parser;
use orders_dashboard::app;
use orders_dashboard::Config;

/// Main entry point for the web application
///
/// Reads the configuration from flags and environment variables, sets up
/// logging (`RUST_LOG`, default `info`) and serves the dashboard until the
/// process is stopped.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    app::run(config).await
}
