//! Build search documents from a user's records in the store.

use anyhow::{Context, Result};
use rusqlite::Connection;

use alog_core::db::query;
use alog_core::ledger::{LedgerOptions, magic_items, story_awards};
use alog_core::model::time::format_date;
use alog_core::model::{Character, DungeonMaster, Log};

use crate::scoring::{DocKind, SearchDocument};

const NAME_WEIGHT: f64 = 3.0;
const DETAIL_WEIGHT: f64 = 1.5;
const BODY_WEIGHT: f64 = 1.0;

/// Every character, log and dungeon master owned by `user_id`.
///
/// # Errors
///
/// Returns an error if any store read fails.
pub fn build_documents(conn: &Connection, user_id: &str) -> Result<Vec<SearchDocument>> {
    let mut documents = Vec::new();

    for character in query::list_characters(conn, user_id).context("list characters for search")? {
        let logs = query::load_character_logs(conn, &character.id)
            .with_context(|| format!("load logs of '{}' for search", character.id))?;
        documents.push(character_document(&character, &logs));
        documents.extend(
            logs.iter()
                .map(|log| log_document(log, Some(character.name.as_str()))),
        );
    }

    for log in query::list_dm_logs(conn, user_id).context("list DM logs for search")? {
        if log.character_id.is_none() {
            documents.push(log_document(&log, None));
        }
    }

    for entry in query::list_dms(conn, user_id).context("list DMs for search")? {
        documents.push(dm_document(&entry.dm));
    }

    tracing::debug!(user_id, documents = documents.len(), "built search documents");
    Ok(documents)
}

/// A character, searchable by its details and what it currently holds.
#[must_use]
pub fn character_document(character: &Character, logs: &[Log]) -> SearchDocument {
    let options = LedgerOptions::default();
    let items = join_names(magic_items(logs, &options).iter().map(|item| item.name.as_str()));
    let awards = join_names(story_awards(logs, &options).iter().map(|item| item.name.as_str()));

    let subtitle = [character.race.as_deref(), character.class.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    let doc = SearchDocument::new(DocKind::Character, &character.id, &character.name);
    let doc = if subtitle.is_empty() {
        doc
    } else {
        doc.with_subtitle(subtitle)
    };
    doc.field("name", &character.name, NAME_WEIGHT)
        .field_opt("race", character.race.as_deref(), DETAIL_WEIGHT)
        .field_opt("class", character.class.as_deref(), DETAIL_WEIGHT)
        .field_opt("campaign", character.campaign.as_deref(), DETAIL_WEIGHT)
        .field("magic_items", items, BODY_WEIGHT)
        .field("story_awards", awards, BODY_WEIGHT)
}

/// A log, searchable by name, description, DM and what it gained.
#[must_use]
pub fn log_document(log: &Log, character_name: Option<&str>) -> SearchDocument {
    let gained = join_names(log.gained.iter().map(|item| item.name.as_str()));
    let date = format_date(log.effective_date_us());
    let subtitle = match character_name {
        Some(name) => format!("{date} · {name}"),
        None if log.is_dm_log => format!("{date} · DM log"),
        None => date,
    };

    SearchDocument::new(DocKind::Log, &log.id, &log.name)
        .with_subtitle(subtitle)
        .field("name", &log.name, NAME_WEIGHT)
        .field_opt("dm", log.dm_name.as_deref(), DETAIL_WEIGHT)
        .field_opt("description", log.description.as_deref(), BODY_WEIGHT)
        .field("items_gained", gained, BODY_WEIGHT)
}

#[must_use]
pub fn dm_document(dm: &DungeonMaster) -> SearchDocument {
    let doc = SearchDocument::new(DocKind::DungeonMaster, &dm.id, &dm.name)
        .field("name", &dm.name, NAME_WEIGHT)
        .field_opt("dci", dm.dci.as_deref(), DETAIL_WEIGHT);
    match dm.dci.as_deref() {
        Some(dci) => doc.with_subtitle(format!("DCI {dci}")),
        None => doc,
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join("; ")
}
