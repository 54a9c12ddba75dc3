mod startup;
mod state;

// Re-export a curated crate-visible surface for consumers of `crate::app`
pub use startup::{shutdown_signal, start};
pub use state::AppState;
