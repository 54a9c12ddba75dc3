use alloc::string;
use core::net::{IpAddr, SocketAddr};
use std::path::Path;

use eyre::WrapErr as _;
use tokio::{net, signal};

use crate::{
    app::state::{AppState, initialize_state},
    config::ServiceConfig,
    http::router,
};

/// Creates a future that resolves when a shutdown signal is received.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to create SIGTERM signal handler");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = signal::ctrl_c() => {}
        }
    }
    #[cfg(not(unix))]
    {
        drop(signal::ctrl_c().await);
    }
}

/// Start the HTTP server and run it until a shutdown signal arrives.
async fn start_server(app_state: AppState, listen_ip: IpAddr, listen_port: u16) -> eyre::Result<()> {
    let app = router::create_app(app_state);

    let addr = SocketAddr::from((listen_ip, listen_port));

    let listener = net::TcpListener::bind(addr)
        .await
        .wrap_err(format!("Failed to bind to {addr}"))?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Received shutdown, shutting down");
        })
        .await?;

    Ok(())
}

/// # Returns
///
/// `Ok(())` when the server runs until termination, or an error if binding or setup fails.
///
/// # Errors
///
/// Returns an error if the monitoring configuration is invalid, the bind address
/// cannot be parsed, or the server cannot bind.
///
/// # Panics
///
/// Panics if the SIGTERM handler cannot be installed.
pub async fn start(
    config: &ServiceConfig,
    config_path: &Path,
    port_override: Option<u16>,
    bind_override: Option<&str>,
) -> eyre::Result<()> {
    tracing::info!("Starting HTTP server...");

    let (app_state, server) = initialize_state(config, config_path)?;

    // Apply optional overrides from CLI/tests
    let listen_port = port_override.unwrap_or(server.port);
    let bind_str = bind_override.map_or_else(|| server.bind.clone(), string::ToString::to_string);

    let listen_ip: IpAddr = bind_str
        .parse()
        .wrap_err(format!("Invalid bind address: {bind_str}"))?;

    start_server(app_state, listen_ip, listen_port).await
}
