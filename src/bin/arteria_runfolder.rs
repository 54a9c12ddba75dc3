//! Shim binary that calls into the `arteria_service` library's `inner_main`.
use arteria_service::cli::Cli;
use clap::Parser as _;
use eyre::Result;

#[tokio::main]
async fn main() -> Result<()> {
    arteria_service::inner_main(Cli::parse()).await
}
