//! Logging setup shared by everything that embeds the ledger.

pub mod tracing;

pub use tracing::{LogConfig, LogFormat, init, init_test, init_with};
