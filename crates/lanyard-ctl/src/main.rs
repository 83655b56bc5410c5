//! lanyardd entry point.
//!
//! Starts the control listener and serves endpoint lifecycle operations
//! against the host network fabric.

use lanyard_core::Network;
use lanyard_ctl::{register_handlers, AppState, CtlConfig, Listener};
use lanyard_fabric::HttpFabric;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{mpsc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("lanyard_ctl=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting lanyardd");

    let config = CtlConfig::from_env();
    tracing::info!(?config, "Configuration loaded");
    config.validate_warn();

    let fabric = Arc::new(HttpFabric::new(&config.fabric_socket));
    let network = Arc::new(Mutex::new(Network::new(
        config.network_name.clone(),
        config.network_fabric_id.clone(),
    )));
    let state = AppState { network, fabric };

    let mut listener = Listener::new(config.transport, &config.address);
    register_handlers(&listener, state).await;

    let (err_tx, mut err_rx) = mpsc::channel(1);
    listener.start(err_tx).await?;
    tracing::info!(
        transport = %config.transport,
        address = %listener.local_address(),
        "Control listener ready"
    );

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
        }
        Some(err) = err_rx.recv() => {
            tracing::error!(error = %err, "Listener died");
        }
    }

    listener.stop();
    Ok(())
}
