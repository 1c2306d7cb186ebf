//! smallchat - Entry Point
//!
//! A line-oriented multi-user chat relay over TCP.

use log::{error, info};
use std::process::ExitCode;

use smallchat::Server;
use smallchat::config::ServerConfig;
use smallchat::error::ServerError;
use smallchat::utils::logging::setup_logging;

#[tokio::main]
async fn main() -> ExitCode {
    // env_logger picks up RUST_LOG, defaulting to info
    setup_logging();

    info!("Launching chat server...");

    match run().await {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Server startup failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;
    let server = Server::bind(config).await?;
    server.start().await;
    Ok(())
}
