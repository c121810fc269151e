#![forbid(unsafe_code)]
//! alog-search: heuristic search over a user's characters, logs and
//! dungeon masters.
//!
//! Documents are rebuilt from the store per query ([`index`]) and ranked in
//! memory ([`scoring`]); there is no persistent index.
//!
//! # Conventions
//!
//! - **Errors**: `anyhow::Result` for store-backed functions; scoring is
//!   infallible.
//! - **Logging**: `tracing` macros.

pub mod index;
pub mod scoring;

pub use index::build_documents;
pub use scoring::{DocKind, SearchDocument, SearchField, SearchHit, parse_query, search};

use anyhow::Result;
use rusqlite::Connection;

/// Search everything `user_id` owns.
///
/// # Errors
///
/// Returns an error if building documents from the store fails.
pub fn search_user(conn: &Connection, user_id: &str, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
    if parse_query(query).is_empty() {
        return Ok(Vec::new());
    }
    let documents = build_documents(conn, user_id)?;
    Ok(search(&documents, query, limit))
}
