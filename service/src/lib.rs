//! Library entry for the runfolder service.
//!
//! Exposes `inner_main` so the workspace-level shim binary can call into the
//! service logic.
//!
//! Provides commands to serve the runfolder HTTP API or to print the
//! runfolders found in the monitored directories once.
#![cfg_attr(
    test,
    expect(clippy::unwrap_used, reason = "This is not problematic in tests",)
)]

extern crate alloc;
extern crate core;

pub mod app;
pub mod cli;
pub mod config;
pub mod http;


use std::{fs, io, sync::Once};

use arteria_core::RunfolderMonitor;
use eyre::{Result, WrapErr as _};
use serde_json::json;
use tracing::{Instrument as _, info};
use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use cli::{Cli, Command, ListArgs, LogFormat};

static INIT_TRACING: Once = Once::new();

/// The service's main function; can be called from a shim binary.
///
/// Parses CLI and dispatches server startup or a one-off listing.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the server fails
/// to start, or a listing scan fails.
pub async fn inner_main(invocation: Cli) -> Result<()> {
    match invocation.command {
        Command::Service(args) => {
            let config = &args.config;
            let config_path =
                fs::canonicalize(config).wrap_err(format!("Config file not found at: {config}"))?;
            let service_config = config::load(&config_path).await?;

            init_tracing(&service_config.logging.filter, args.log_format);

            let startup_span = tracing::info_span!(
                "runfolder.startup",
                ?config_path,
                pid = ?std::process::id(),
                version = env!("CARGO_PKG_VERSION")
            );

            async {
                info!("Starting runfolder service");
                app::start(
                    &service_config,
                    &config_path,
                    args.port,
                    args.bind.as_deref(),
                )
                .await
            }
            .instrument(startup_span)
            .await
        }
        Command::List(args) => list(args).await,
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the configured filter.
fn init_tracing(filter: &str, format: LogFormat) {
    let filter = filter.to_string();
    INIT_TRACING.call_once(move || {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
            )
            .with_timer(ChronoLocal::rfc_3339())
            .with_writer(io::stderr);

        match format {
            LogFormat::Compact => builder.compact().init(),
            LogFormat::Json => builder.json().init(),
            LogFormat::Pretty => builder.pretty().init(),
        }
    });
}

/// Scans once and prints one JSON object per runfolder to stdout.
async fn list(args: ListArgs) -> Result<()> {
    let config = &args.config;
    let config_path =
        fs::canonicalize(config).wrap_err(format!("Config file not found at: {config}"))?;
    let service_config = config::load(&config_path).await?;
    init_tracing(&service_config.logging.filter, LogFormat::Compact);

    let monitor = RunfolderMonitor::new(&service_config.runfolders)
        .wrap_err("Failed to set up runfolder monitoring")?;
    let filter = args.state;

    let lines = tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
        let listed = monitor.list_with_state(filter)?;
        Ok(listed
            .iter()
            .map(|&(ref runfolder, current)| {
                json!({
                    "path": runfolder.path(),
                    "state": current,
                    "metadata": runfolder.metadata(),
                })
                .to_string()
            })
            .collect())
    })
    .await
    .wrap_err("Runfolder scan task failed")??;

    for line in lines {
        println!("{line}");
    }
    Ok(())
}
