use std::sync::Arc;
use tracing::{error, info};
use zechat::{bus, config, fixtures, interface};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        // Not fatal, the defaults cover everything
        info!("No .env file found or failed to load: {}", e);
    }

    // Initialize logging with default filter if RUST_LOG is not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("ZeChat starting...");

    let config = config::Config::from_env()?;
    let bus = Arc::new(bus::EventBus::new(config.bus_capacity));
    let directory = fixtures::directory(&config.self_id);
    let first_contact = directory.contacts().first().map(|c| c.id.clone());

    let mut console = interface::console::ConsoleInterface::new(config, bus, directory);
    if let Some(contact_id) = first_contact {
        console.open(&contact_id)?;
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        res = console.run() => {
            if let Err(e) = res {
                error!("Console stopped with error: {:#}", e);
            }
        }
    }

    Ok(())
}
