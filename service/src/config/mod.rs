//! Configuration management: loading and validating the TOML config file.

mod loader;
mod types;

pub use loader::*;
pub use types::*;
