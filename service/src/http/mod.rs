//! HTTP surface of the runfolder service.

pub mod api;
pub mod error;
pub mod router;
