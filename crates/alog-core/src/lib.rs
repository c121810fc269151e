//! alog-core: characters, logs and the item ledger they carry.
//!
//! # Conventions
//!
//! - **Errors**: the service layer ([`db::write`]) returns
//!   [`error::Result`]; store helpers and config use `anyhow::Result` with
//!   `.context(...)`.
//! - **Logging**: `tracing` macros (`debug!` for reads and reductions,
//!   `info!` for mutations, `warn!` for degraded opens).
//! - **Time**: instants are `i64` microseconds since the Unix epoch (`*_us`).

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod ledger;
pub mod model;

pub use error::{AlogError, ErrorCode};
