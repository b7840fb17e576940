//! Task and topic storage for Daybook
//!
//! This crate persists [`entities::Task`] and [`entities::Topic`] records in
//! an embedded SQLite database. Each storage component creates its table
//! lazily on first use and validates what it can before touching the engine.

mod codec;
mod config;
mod database;
mod error;
mod init;
mod schema;
mod task;
mod topic;
mod traits;
pub mod validation;

pub use config::*;
pub use database::*;
pub use error::*;
pub use init::SchemaInit;
pub use task::*;
pub use topic::*;
pub use traits::*;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
