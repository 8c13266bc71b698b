use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use minftpd::config::Config;
use minftpd::core_cli::Cli;
use minftpd::core_log::init_logger;
use minftpd::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();
    init_logger(args.verbose);

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load configuration file: {}", path.display()))?,
        None => Config::default(),
    };
    args.apply_to(&mut config)?;

    tokio::select! {
        result = server::run(config) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down.");
            Ok(())
        }
    }
}
