use anyhow::Result;
use std::sync::Arc;
use sysmon_daemon::{
    config::Config,
    server::DaemonState,
    socket::{handle_client, SocketServer},
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    info!("SysMon daemon starting...");

    let config_path = Config::config_path();
    let config = if config_path.exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        })
    } else {
        info!("No config file found, using defaults");
        Config::default()
    };

    let server = SocketServer::bind(&config.server.socket_path)?;
    let state = Arc::new(DaemonState::new(&config));

    info!("Daemon ready, listening for connections...");

    loop {
        match server.accept().await {
            Ok(stream) => {
                info!("Client connected");
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    handle_client(stream, state).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
