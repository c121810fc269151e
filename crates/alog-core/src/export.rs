//! Whole-account JSON export.

use anyhow::Result;
use serde::Serialize;

use crate::db::query::{self, DmWithCount};
use crate::ledger::{LedgerOptions, LogsSummary, summarize};
use crate::model::time::{format_timestamp, now_us};
use crate::model::{Character, Log, User};

/// Bumped when the document layout changes incompatibly.
pub const EXPORT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub format_version: u32,
    pub exported_at: String,
    pub user: User,
    pub dungeon_masters: Vec<DmWithCount>,
    pub characters: Vec<CharacterExport>,
    /// DM logs not applied to any character.
    pub unapplied_dm_logs: Vec<Log>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterExport {
    #[serde(flatten)]
    pub character: Character,
    pub summary: LogsSummary,
    pub logs: Vec<Log>,
}

/// Collect everything `user` owns into one document.
///
/// # Errors
///
/// Returns an error if any store read fails.
pub fn build_export(conn: &rusqlite::Connection, user: &User, max_level: i64) -> Result<ExportDocument> {
    let characters = query::list_characters(conn, &user.id)?
        .into_iter()
        .map(|character| {
            let logs = query::load_character_logs(conn, &character.id)?;
            let summary = summarize(&logs, &LedgerOptions::default(), max_level);
            Ok(CharacterExport {
                character,
                summary,
                logs,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let unapplied_dm_logs = query::list_dm_logs(conn, &user.id)?
        .into_iter()
        .filter(|log| log.character_id.is_none())
        .collect();

    tracing::debug!(user_id = %user.id, characters = characters.len(), "built export");

    Ok(ExportDocument {
        format_version: EXPORT_FORMAT_VERSION,
        exported_at: format_timestamp(now_us()),
        user: user.clone(),
        dungeon_masters: query::list_dms(conn, &user.id)?,
        characters,
        unapplied_dm_logs,
    })
}
