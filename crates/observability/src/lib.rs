//! Logging setup shared by the API server and the seed tool.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, init};
