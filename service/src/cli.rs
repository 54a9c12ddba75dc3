//! Command-line interface definitions for the runfolder service.
//!
//! This module contains the CLI argument parsing structures and enums
//! used by the `arteria-runfolder` binary.

use std::env;

use clap::{Parser, Subcommand, ValueEnum};

/// Top-level command-line interface definition.
#[derive(Debug, Parser)]
#[command(name = "arteria-runfolder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the runfolder API over HTTP.
    Service(ServiceArgs),

    /// Scan the monitored directories once and print the runfolders as JSON lines.
    List(ListArgs),
}

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
    Pretty,
}

/// Arguments for the service command.
#[derive(Debug, Parser)]
pub struct ServiceArgs {
    /// Path to the configuration file
    #[arg(short, long, env = "ARTERIA_RUNFOLDER_CONFIG", default_value = "arteria_runfolder.toml")]
    pub config: String,

    /// Optional override for the listen port (overrides port in config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Optional override for the bind address (overrides bind in config)
    #[arg(long)]
    pub bind: Option<String>,

    #[arg(long, value_enum, default_value_t)]
    pub log_format: LogFormat,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Path to the configuration file
    #[arg(short, long, env = "ARTERIA_RUNFOLDER_CONFIG", default_value = "arteria_runfolder.toml")]
    pub config: String,

    /// Only list runfolders in this state
    #[arg(long)]
    pub state: Option<arteria_core::State>,
}
