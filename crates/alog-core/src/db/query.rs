//! Typed read helpers for the store.
//!
//! Every function takes a shared `&Connection` (a `Transaction` derefs to
//! one) and returns `anyhow::Result` with model structs. Lookups by id
//! return `Ok(None)` when the row does not exist; turning that into a
//! not-found error is the caller's decision.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::model::{
    Character, DungeonMaster, ItemKind, LedgerItem, Log, LogType, Role, User,
    sort_chronologically,
};

/// A dungeon master together with the number of logs that reference it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DmWithCount {
    #[serde(flatten)]
    pub dm: DungeonMaster,
    pub log_count: u64,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

const USER_COLUMNS: &str = "user_id, name, email, role, created_at_us";

/// Fetch a user by exact id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_user(conn: &Connection, user_id: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1");
    conn.query_row(&sql, params![user_id], row_to_user)
        .optional()
        .with_context(|| format!("get_user for '{user_id}'"))
}

/// Fetch a user by email, case-insensitively.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 COLLATE NOCASE");
    conn.query_row(&sql, params![email.trim()], row_to_user)
        .optional()
        .with_context(|| format!("get_user_by_email for '{email}'"))
}

/// Resolve a user from either an id (`u-…`) or an email address.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_user(conn: &Connection, key: &str) -> Result<Option<User>> {
    let key = key.trim();
    if key.contains('@') {
        get_user_by_email(conn, key)
    } else {
        get_user(conn, key)
    }
}

/// List all users, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at_us, user_id");
    let mut stmt = conn.prepare(&sql).context("prepare list_users")?;
    let rows = stmt
        .query_map([], row_to_user)
        .context("execute list_users")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row.context("read user row")?);
    }
    Ok(users)
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

const CHARACTER_COLUMNS: &str = "character_id, user_id, name, race, class, campaign, \
                                 sheet_url, image_url, created_at_us, updated_at_us";

/// Fetch a character by exact id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_character(conn: &Connection, character_id: &str) -> Result<Option<Character>> {
    let sql = format!("SELECT {CHARACTER_COLUMNS} FROM characters WHERE character_id = ?1");
    conn.query_row(&sql, params![character_id], row_to_character)
        .optional()
        .with_context(|| format!("get_character for '{character_id}'"))
}

/// Resolve one of `user_id`'s characters by id or by name.
///
/// Name matching is case-insensitive; when several characters share the
/// name, the oldest wins.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_character(conn: &Connection, user_id: &str, key: &str) -> Result<Option<Character>> {
    let key = key.trim();
    if let Some(character) = get_character(conn, key)? {
        return Ok(Some(character));
    }
    let sql = format!(
        "SELECT {CHARACTER_COLUMNS} FROM characters \
         WHERE user_id = ?1 AND name = ?2 COLLATE NOCASE \
         ORDER BY created_at_us, character_id LIMIT 1"
    );
    conn.query_row(&sql, params![user_id, key], row_to_character)
        .optional()
        .with_context(|| format!("find_character '{key}' for '{user_id}'"))
}

/// List a user's characters by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_characters(conn: &Connection, user_id: &str) -> Result<Vec<Character>> {
    let sql = format!(
        "SELECT {CHARACTER_COLUMNS} FROM characters \
         WHERE user_id = ?1 ORDER BY name COLLATE NOCASE, character_id"
    );
    let mut stmt = conn.prepare(&sql).context("prepare list_characters")?;
    let rows = stmt
        .query_map(params![user_id], row_to_character)
        .context("execute list_characters")?;

    let mut characters = Vec::new();
    for row in rows {
        characters.push(row.context("read character row")?);
    }
    Ok(characters)
}

// ---------------------------------------------------------------------------
// Dungeon masters
// ---------------------------------------------------------------------------

const DM_COLUMNS: &str = "d.dm_id, d.user_id, d.name, d.dci, d.is_user, d.created_at_us";

/// Fetch a dungeon master by exact id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_dm(conn: &Connection, dm_id: &str) -> Result<Option<DungeonMaster>> {
    let sql = format!("SELECT {DM_COLUMNS} FROM dungeon_masters d WHERE d.dm_id = ?1");
    conn.query_row(&sql, params![dm_id], row_to_dm)
        .optional()
        .with_context(|| format!("get_dm for '{dm_id}'"))
}

/// Find one of `user_id`'s dungeon masters by name, case-insensitively.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_dm_by_name(conn: &Connection, user_id: &str, name: &str) -> Result<Option<DungeonMaster>> {
    let sql = format!(
        "SELECT {DM_COLUMNS} FROM dungeon_masters d \
         WHERE d.user_id = ?1 AND d.name = ?2 COLLATE NOCASE \
         ORDER BY d.is_user DESC, d.created_at_us LIMIT 1"
    );
    conn.query_row(&sql, params![user_id, name.trim()], row_to_dm)
        .optional()
        .with_context(|| format!("find_dm_by_name '{name}' for '{user_id}'"))
}

/// The user's own DM record, if it has been created.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_self_dm(conn: &Connection, user_id: &str) -> Result<Option<DungeonMaster>> {
    let sql = format!("SELECT {DM_COLUMNS} FROM dungeon_masters d WHERE d.user_id = ?1 AND d.is_user = 1");
    conn.query_row(&sql, params![user_id], row_to_dm)
        .optional()
        .with_context(|| format!("get_self_dm for '{user_id}'"))
}

/// List a user's dungeon masters with log counts, self record first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_dms(conn: &Connection, user_id: &str) -> Result<Vec<DmWithCount>> {
    let sql = format!(
        "SELECT {DM_COLUMNS}, \
         (SELECT COUNT(*) FROM logs l WHERE l.dm_id = d.dm_id) AS log_count \
         FROM dungeon_masters d \
         WHERE d.user_id = ?1 \
         ORDER BY d.is_user DESC, d.name COLLATE NOCASE, d.dm_id"
    );
    let mut stmt = conn.prepare(&sql).context("prepare list_dms")?;
    let rows = stmt
        .query_map(params![user_id], |row| {
            let count: i64 = row.get(6)?;
            Ok(DmWithCount {
                dm: row_to_dm(row)?,
                log_count: u64::try_from(count).unwrap_or(0),
            })
        })
        .context("execute list_dms")?;

    let mut dms = Vec::new();
    for row in rows {
        dms.push(row.context("read dm row")?);
    }
    Ok(dms)
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

const LOG_SELECT: &str = "SELECT l.log_id, l.user_id, l.name, l.log_type, l.date_us, \
                          l.applied_date_us, l.is_dm_log, l.character_id, l.dm_id, d.name, \
                          l.experience, l.acp, l.tcp, l.level, l.gold, l.dtd, l.description, \
                          l.created_at_us, l.updated_at_us \
                          FROM logs l LEFT JOIN dungeon_masters d ON d.dm_id = l.dm_id";

/// Fetch one log with its gained and lost items.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn get_log(conn: &Connection, log_id: &str) -> Result<Option<Log>> {
    let sql = format!("{LOG_SELECT} WHERE l.log_id = ?1");
    let log = conn
        .query_row(&sql, params![log_id], row_to_log)
        .optional()
        .with_context(|| format!("get_log for '{log_id}'"))?;

    match log {
        Some(mut log) => {
            attach_items(conn, std::slice::from_mut(&mut log))?;
            Ok(Some(log))
        }
        None => Ok(None),
    }
}

/// All logs of a character, hydrated and in chronological order.
///
/// Includes DM logs applied to the character.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn load_character_logs(conn: &Connection, character_id: &str) -> Result<Vec<Log>> {
    let sql = format!("{LOG_SELECT} WHERE l.character_id = ?1 ORDER BY l.date_us, l.log_id");
    let mut logs = collect_logs(conn, &sql, character_id)?;
    attach_items(conn, &mut logs)?;
    sort_chronologically(&mut logs);
    tracing::debug!(character_id, count = logs.len(), "loaded character logs");
    Ok(logs)
}

/// A user's DM logs, hydrated, newest first.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn list_dm_logs(conn: &Connection, user_id: &str) -> Result<Vec<Log>> {
    let sql = format!(
        "{LOG_SELECT} WHERE l.user_id = ?1 AND l.is_dm_log = 1 \
         ORDER BY l.date_us DESC, l.created_at_us DESC, l.log_id DESC"
    );
    let mut logs = collect_logs(conn, &sql, user_id)?;
    attach_items(conn, &mut logs)?;
    Ok(logs)
}

/// Number of logs recorded for a character.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_character_logs(conn: &Connection, character_id: &str) -> Result<u64> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM logs WHERE character_id = ?1",
            params![character_id],
            |row| row.get(0),
        )
        .with_context(|| format!("count_character_logs for '{character_id}'"))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

fn collect_logs(conn: &Connection, sql: &str, key: &str) -> Result<Vec<Log>> {
    let mut stmt = conn
        .prepare(sql)
        .with_context(|| format!("prepare log query: {sql}"))?;
    let rows = stmt
        .query_map(params![key], row_to_log)
        .context("execute log query")?;

    let mut logs = Vec::new();
    for row in rows {
        logs.push(row.context("read log row")?);
    }
    Ok(logs)
}

// ---------------------------------------------------------------------------
// Ledger items
// ---------------------------------------------------------------------------

const ITEM_COLUMNS: &str = "i.item_id, i.kind, i.name, i.description, i.log_gained_id, i.log_lost_id";

/// Fetch a ledger item by exact id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_item(conn: &Connection, item_id: &str) -> Result<Option<LedgerItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM ledger_items i WHERE i.item_id = ?1");
    conn.query_row(&sql, params![item_id], row_to_item)
        .optional()
        .with_context(|| format!("get_item for '{item_id}'"))
}

/// The character whose log gained `item_id`, if any.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn item_owner_character(conn: &Connection, item_id: &str) -> Result<Option<String>> {
    let owner: Option<Option<String>> = conn
        .query_row(
            "SELECT l.character_id FROM ledger_items i \
             INNER JOIN logs l ON l.log_id = i.log_gained_id \
             WHERE i.item_id = ?1",
            params![item_id],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("item_owner_character for '{item_id}'"))?;
    Ok(owner.flatten())
}

fn items_for(conn: &Connection, column: &str, log_id: &str) -> Result<Vec<LedgerItem>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM ledger_items i \
         WHERE i.{column} = ?1 ORDER BY i.position, i.created_at_us, i.item_id"
    );
    let mut stmt = conn
        .prepare_cached(&sql)
        .with_context(|| format!("prepare items query on {column}"))?;
    let rows = stmt
        .query_map(params![log_id], row_to_item)
        .context("execute items query")?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row.context("read ledger item row")?);
    }
    Ok(items)
}

fn attach_items(conn: &Connection, logs: &mut [Log]) -> Result<()> {
    for log in logs {
        log.gained = items_for(conn, "log_gained_id", &log.id)?;
        log.lost = items_for(conn, "log_lost_id", &log.id)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn parse_column<T: std::str::FromStr>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().map_err(|error: T::Err| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(error))
    })
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: parse_column::<Role>(3, &role)?,
        created_at_us: row.get(4)?,
    })
}

fn row_to_character(row: &rusqlite::Row<'_>) -> rusqlite::Result<Character> {
    Ok(Character {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        race: row.get(3)?,
        class: row.get(4)?,
        campaign: row.get(5)?,
        sheet_url: row.get(6)?,
        image_url: row.get(7)?,
        created_at_us: row.get(8)?,
        updated_at_us: row.get(9)?,
    })
}

fn row_to_dm(row: &rusqlite::Row<'_>) -> rusqlite::Result<DungeonMaster> {
    Ok(DungeonMaster {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        dci: row.get(3)?,
        is_user: row.get::<_, i64>(4)? != 0,
        created_at_us: row.get(5)?,
    })
}

fn row_to_log(row: &rusqlite::Row<'_>) -> rusqlite::Result<Log> {
    let log_type: String = row.get(3)?;
    Ok(Log {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        log_type: parse_column::<LogType>(3, &log_type)?,
        date_us: row.get(4)?,
        applied_date_us: row.get(5)?,
        is_dm_log: row.get::<_, i64>(6)? != 0,
        character_id: row.get(7)?,
        dm_id: row.get(8)?,
        dm_name: row.get(9)?,
        experience: row.get(10)?,
        acp: row.get(11)?,
        tcp: row.get(12)?,
        level: row.get(13)?,
        gold: row.get(14)?,
        dtd: row.get(15)?,
        description: row.get(16)?,
        gained: Vec::new(),
        lost: Vec::new(),
        created_at_us: row.get(17)?,
        updated_at_us: row.get(18)?,
    })
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerItem> {
    let kind: String = row.get(1)?;
    Ok(LedgerItem {
        id: row.get(0)?,
        kind: parse_column::<ItemKind>(1, &kind)?,
        name: row.get(2)?,
        description: row.get(3)?,
        log_gained_id: row.get(4)?,
        log_lost_id: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn seeded() -> Connection {
        let conn = open_in_memory().expect("open store");
        conn.execute_batch(
            "INSERT INTO users (user_id, name, email, role, created_at_us)
                 VALUES ('u-1', 'Avery', 'avery@example.com', 'user', 1),
                        ('u-2', 'Blake', 'blake@example.com', 'admin', 2);
             INSERT INTO characters (character_id, user_id, name, race, created_at_us, updated_at_us)
                 VALUES ('ch-1', 'u-1', 'Brisk', 'Halfling', 1, 1),
                        ('ch-2', 'u-1', 'anvil', NULL, 2, 2),
                        ('ch-3', 'u-2', 'Brisk', NULL, 3, 3);
             INSERT INTO dungeon_masters (dm_id, user_id, name, dci, is_user, created_at_us)
                 VALUES ('dm-self', 'u-1', 'Avery', NULL, 1, 1),
                        ('dm-guest', 'u-1', 'Rowan', '123', 0, 2);
             INSERT INTO logs (log_id, user_id, character_id, dm_id, name, date_us,
                               applied_date_us, is_dm_log, gold, created_at_us, updated_at_us)
                 VALUES ('lg-a', 'u-1', 'ch-1', 'dm-guest', 'Into the Mines', 100, NULL, 0, 12.5, 1, 1),
                        ('lg-b', 'u-1', 'ch-1', NULL, 'Shopping', 300, NULL, 0, -5, 2, 2),
                        ('lg-dm', 'u-1', 'ch-1', 'dm-self', 'Ran a table', 50, 200, 1, 0, 3, 3),
                        ('lg-free', 'u-1', NULL, 'dm-self', 'Unapplied', 400, NULL, 1, 0, 4, 4);
             INSERT INTO ledger_items (item_id, kind, name, log_gained_id, log_lost_id, position, created_at_us)
                 VALUES ('it-2', 'magic_item', 'Rope of Climbing', 'lg-a', NULL, 1, 1),
                        ('it-1', 'magic_item', 'Bag of Holding', 'lg-a', 'lg-b', 0, 1),
                        ('it-3', 'story_award', 'Friend of the Guild', 'lg-dm', NULL, 0, 1);",
        )
        .expect("seed");
        conn
    }

    #[test]
    fn find_user_by_id_or_email() {
        let conn = seeded();
        assert_eq!(find_user(&conn, "u-1").unwrap().unwrap().name, "Avery");
        assert_eq!(find_user(&conn, "BLAKE@example.com").unwrap().unwrap().role, Role::Admin);
        assert!(find_user(&conn, "nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn list_users_oldest_first() {
        let conn = seeded();
        let ids: Vec<_> = list_users(&conn).unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, ["u-1", "u-2"]);
    }

    #[test]
    fn find_character_by_name_is_owner_scoped() {
        let conn = seeded();
        let own = find_character(&conn, "u-1", "brisk").unwrap().unwrap();
        assert_eq!(own.id, "ch-1");
        let other = find_character(&conn, "u-2", "Brisk").unwrap().unwrap();
        assert_eq!(other.id, "ch-3");
        assert!(find_character(&conn, "u-2", "anvil").unwrap().is_none());
    }

    #[test]
    fn list_characters_sorted_by_name() {
        let conn = seeded();
        let names: Vec<_> = list_characters(&conn, "u-1")
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["anvil", "Brisk"]);
    }

    #[test]
    fn character_logs_are_chronological_by_effective_date() {
        let conn = seeded();
        let logs = load_character_logs(&conn, "ch-1").unwrap();
        let ids: Vec<_> = logs.iter().map(|l| l.id.as_str()).collect();
        // lg-dm was run at 50 but applied at 200
        assert_eq!(ids, ["lg-a", "lg-dm", "lg-b"]);
    }

    #[test]
    fn logs_are_hydrated_with_items_and_dm_name() {
        let conn = seeded();
        let log = get_log(&conn, "lg-a").unwrap().unwrap();
        assert_eq!(log.dm_name.as_deref(), Some("Rowan"));
        let gained: Vec<_> = log.gained.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(gained, ["it-1", "it-2"]);
        assert!(log.lost.is_empty());

        let shopping = get_log(&conn, "lg-b").unwrap().unwrap();
        assert_eq!(shopping.lost.len(), 1);
        assert_eq!(shopping.lost[0].id, "it-1");
        assert!((shopping.gold + 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn get_log_missing_is_none() {
        let conn = seeded();
        assert!(get_log(&conn, "lg-nope").unwrap().is_none());
    }

    #[test]
    fn dm_logs_include_unapplied_newest_first() {
        let conn = seeded();
        let ids: Vec<_> = list_dm_logs(&conn, "u-1")
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, ["lg-free", "lg-dm"]);
    }

    #[test]
    fn list_dms_counts_logs_self_first() {
        let conn = seeded();
        let dms = list_dms(&conn, "u-1").unwrap();
        assert_eq!(dms.len(), 2);
        assert!(dms[0].dm.is_user);
        assert_eq!(dms[0].log_count, 2);
        assert_eq!(dms[1].dm.name, "Rowan");
        assert_eq!(dms[1].log_count, 1);
    }

    #[test]
    fn dm_lookups() {
        let conn = seeded();
        assert_eq!(find_dm_by_name(&conn, "u-1", "rowan").unwrap().unwrap().id, "dm-guest");
        assert_eq!(get_self_dm(&conn, "u-1").unwrap().unwrap().id, "dm-self");
        assert!(get_self_dm(&conn, "u-2").unwrap().is_none());
    }

    #[test]
    fn item_owner_follows_gaining_log() {
        let conn = seeded();
        assert_eq!(item_owner_character(&conn, "it-1").unwrap().as_deref(), Some("ch-1"));
        assert!(item_owner_character(&conn, "it-none").unwrap().is_none());
        assert_eq!(get_item(&conn, "it-1").unwrap().unwrap().log_lost_id.as_deref(), Some("lg-b"));
    }

    #[test]
    fn count_character_logs_counts_applied_dm_logs() {
        let conn = seeded();
        assert_eq!(count_character_logs(&conn, "ch-1").unwrap(), 3);
        assert_eq!(count_character_logs(&conn, "ch-2").unwrap(), 0);
    }
}
