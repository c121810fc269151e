//! Acting-user resolution for CLI commands.
//!
//! The resolution chain: `--user` flag > `ALOG_USER` env > `user` in the
//! user config. The resolved key may be a user id or an email address.
//! Owner-scoped commands require an acting user; `init`, `user add`,
//! `user list` and `completions` do not.

use alog_core::db::write;
use alog_core::model::User;
use alog_core::{AlogError, error::Result};
use rusqlite::Connection;
use std::env;

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

fn resolve_user_key_with(
    cli_flag: Option<&str>,
    config_user: Option<&str>,
    env: &dyn EnvReader,
) -> Option<String> {
    if let Some(key) = cli_flag.map(str::trim).filter(|k| !k.is_empty()) {
        return Some(key.to_string());
    }

    if let Some(key) = env.get("ALOG_USER") {
        return Some(key.trim().to_string());
    }

    config_user
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToString::to_string)
}

/// Resolve the acting user's id or email without touching the store.
pub fn resolve_user_key(cli_flag: Option<&str>, config_user: Option<&str>) -> Option<String> {
    resolve_user_key_with(cli_flag, config_user, &RealEnv)
}

/// Resolve and load the acting user.
///
/// # Errors
///
/// Returns [`AlogError::UserRequired`] when nothing names a user and
/// [`AlogError::NotFound`] when the named user is not registered.
pub fn require_acting_user(
    conn: &Connection,
    cli_flag: Option<&str>,
    config_user: Option<&str>,
) -> Result<User> {
    let key = resolve_user_key(cli_flag, config_user).ok_or(AlogError::UserRequired)?;
    let user = write::require_user(conn, &key)?;
    tracing::debug!(user_id = %user.id, "resolved acting user");
    Ok(user)
}
