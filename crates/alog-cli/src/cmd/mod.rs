pub mod character;
pub mod completions;
pub mod dm;
pub mod export;
pub mod init;
pub mod items;
pub mod log;
pub mod search;
pub mod summary;
pub mod user;

use crate::output::OutputMode;
use alog_core::AlogError;
use alog_core::config::EffectiveConfig;
use alog_core::db;
use alog_core::ledger::Cutoff;
use alog_core::model::User;
use anyhow::Result;
use clap::Args;
use rusqlite::Connection;
use std::path::PathBuf;

/// Everything a command handler needs besides its own arguments.
#[derive(Debug)]
pub struct Context {
    pub project_root: PathBuf,
    pub output: OutputMode,
    pub quiet: bool,
    pub user_flag: Option<String>,
    pub config: EffectiveConfig,
}

impl Context {
    /// Open the project's store.
    ///
    /// # Errors
    ///
    /// Returns [`AlogError::NotInitialized`] when `alog init` has not run
    /// here or the store cannot be opened.
    pub fn open_store(&self) -> Result<Connection> {
        let path = db::store_path(&self.project_root);
        db::try_open_store(&path)?
            .ok_or_else(|| AlogError::NotInitialized(self.project_root.display().to_string()).into())
    }

    /// Load the acting user.
    ///
    /// # Errors
    ///
    /// Returns [`AlogError::UserRequired`] or [`AlogError::NotFound`].
    pub fn acting_user(&self, conn: &Connection) -> Result<User> {
        Ok(crate::user::require_acting_user(
            conn,
            self.user_flag.as_deref(),
            self.config.user.user.as_deref(),
        )?)
    }

    pub const fn max_level(&self) -> i64 {
        self.config.project.ledger.max_level
    }
}

/// `--through` / `--before`: view a character's history as of one log.
#[derive(Args, Debug, Default)]
pub struct CutoffArgs {
    /// State right after this log.
    #[arg(long, value_name = "LOG", conflicts_with = "before")]
    pub through: Option<String>,

    /// State right before this log.
    #[arg(long, value_name = "LOG")]
    pub before: Option<String>,
}

impl CutoffArgs {
    pub fn cutoff(&self) -> Option<Cutoff<'_>> {
        match (self.through.as_deref(), self.before.as_deref()) {
            (Some(id), _) => Some(Cutoff::Through(id)),
            (None, Some(id)) => Some(Cutoff::Before(id)),
            (None, None) => None,
        }
    }
}

/// Parse an optional date argument.
///
/// # Errors
///
/// Returns a validation error naming `field`.
pub fn parse_date_arg(field: &'static str, raw: Option<&str>) -> alog_core::error::Result<Option<i64>> {
    raw.map(|raw| alog_core::model::time::parse_date(field, raw))
        .transpose()
}
