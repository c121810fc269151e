//! Validated, ownership-checked writes.
//!
//! Functions here return [`crate::error::Result`] so callers get a typed
//! [`AlogError`] (not-found, forbidden, validation, ledger) instead of a raw
//! SQLite failure. Anything touching more than one row runs in a single
//! transaction; an error drops the transaction, which rolls it back.

use std::collections::HashSet;

use rusqlite::{Connection, params};
use tracing::{debug, info};

use super::query;
use crate::error::{AlogError, Result};
use crate::ledger::check_consistency;
use crate::model::id::{IdKind, generate};
use crate::model::time::now_us;
use crate::model::{
    Character, CharacterDraft, DmDraft, DungeonMaster, Log, LogDraft, User, UserDraft,
};

fn ensure_can_modify(actor: &User, owner_id: &str, entity: &'static str, id: &str) -> Result<()> {
    if actor.can_modify(owner_id) {
        Ok(())
    } else {
        Err(AlogError::Forbidden {
            user_id: actor.id.clone(),
            entity,
            id: id.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Lookups that fail loudly
// ---------------------------------------------------------------------------

/// Resolve a user by id or email.
///
/// # Errors
///
/// Returns [`AlogError::NotFound`] when no user matches.
pub fn require_user(conn: &Connection, key: &str) -> Result<User> {
    query::find_user(conn, key)?.ok_or_else(|| AlogError::not_found("user", key))
}

/// Resolve one of `owner`'s characters by id or name.
///
/// # Errors
///
/// Returns [`AlogError::NotFound`] when nothing matches.
pub fn require_character(conn: &Connection, owner: &User, key: &str) -> Result<Character> {
    query::find_character(conn, &owner.id, key)?.ok_or_else(|| AlogError::not_found("character", key))
}

/// # Errors
///
/// Returns [`AlogError::NotFound`] when the log does not exist.
pub fn require_log(conn: &Connection, log_id: &str) -> Result<Log> {
    query::get_log(conn, log_id)?.ok_or_else(|| AlogError::not_found("log", log_id))
}

/// Resolve a log `viewer` may see: their own, or any log for an admin.
///
/// # Errors
///
/// Returns [`AlogError::NotFound`] when the log does not exist or belongs
/// to someone else.
pub fn require_visible_log(conn: &Connection, viewer: &User, log_id: &str) -> Result<Log> {
    match query::get_log(conn, log_id)? {
        Some(log) if viewer.can_modify(&log.user_id) => Ok(log),
        _ => Err(AlogError::not_found("log", log_id)),
    }
}

/// Resolve one of `owner`'s dungeon masters by id or name.
///
/// # Errors
///
/// Returns [`AlogError::NotFound`] when nothing matches.
pub fn require_dm(conn: &Connection, owner: &User, key: &str) -> Result<DungeonMaster> {
    if let Some(dm) = query::get_dm(conn, key)? {
        return Ok(dm);
    }
    query::find_dm_by_name(conn, &owner.id, key)?.ok_or_else(|| AlogError::not_found("dm", key))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Register a user.
///
/// # Errors
///
/// Returns a validation error for a bad draft and [`AlogError::Conflict`]
/// when the email is taken.
pub fn create_user(conn: &Connection, draft: &UserDraft) -> Result<User> {
    draft.validate()?;
    let email = draft.email.trim();
    if query::get_user_by_email(conn, email)?.is_some() {
        return Err(AlogError::Conflict(format!(
            "a user with email '{email}' already exists"
        )));
    }

    let user = User {
        id: generate(IdKind::User, email),
        name: draft.name.clone(),
        email: email.to_string(),
        role: draft.role,
        created_at_us: now_us(),
    };
    conn.execute(
        "INSERT INTO users (user_id, name, email, role, created_at_us) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user.id, user.name, user.email, user.role.as_str(), user.created_at_us],
    )?;
    info!(user_id = %user.id, role = %user.role, "created user");
    Ok(user)
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

/// Create a character owned by `actor`.
///
/// # Errors
///
/// Returns a validation error for a bad draft.
pub fn create_character(conn: &Connection, actor: &User, draft: &CharacterDraft) -> Result<Character> {
    draft.validate()?;
    let now = now_us();
    let character = Character {
        id: generate(IdKind::Character, &draft.name),
        user_id: actor.id.clone(),
        name: draft.name.clone(),
        race: draft.race.clone(),
        class: draft.class.clone(),
        campaign: draft.campaign.clone(),
        sheet_url: draft.sheet_url.clone(),
        image_url: draft.image_url.clone(),
        created_at_us: now,
        updated_at_us: now,
    };
    conn.execute(
        "INSERT INTO characters (character_id, user_id, name, race, class, campaign, \
         sheet_url, image_url, created_at_us, updated_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            character.id,
            character.user_id,
            character.name,
            character.race,
            character.class,
            character.campaign,
            character.sheet_url,
            character.image_url,
            character.created_at_us,
            character.updated_at_us
        ],
    )?;
    info!(character_id = %character.id, user_id = %actor.id, "created character");
    Ok(character)
}

/// Replace a character's editable fields.
///
/// # Errors
///
/// Returns not-found, forbidden or validation errors.
pub fn update_character(
    conn: &Connection,
    actor: &User,
    character_id: &str,
    draft: &CharacterDraft,
) -> Result<Character> {
    let current = query::get_character(conn, character_id)?
        .ok_or_else(|| AlogError::not_found("character", character_id))?;
    ensure_can_modify(actor, &current.user_id, "character", &current.id)?;
    draft.validate()?;

    let updated = Character {
        name: draft.name.clone(),
        race: draft.race.clone(),
        class: draft.class.clone(),
        campaign: draft.campaign.clone(),
        sheet_url: draft.sheet_url.clone(),
        image_url: draft.image_url.clone(),
        updated_at_us: now_us(),
        ..current
    };
    conn.execute(
        "UPDATE characters SET name = ?2, race = ?3, class = ?4, campaign = ?5, \
         sheet_url = ?6, image_url = ?7, updated_at_us = ?8 WHERE character_id = ?1",
        params![
            updated.id,
            updated.name,
            updated.race,
            updated.class,
            updated.campaign,
            updated.sheet_url,
            updated.image_url,
            updated.updated_at_us
        ],
    )?;
    info!(character_id = %updated.id, "updated character");
    Ok(updated)
}

/// Delete a character and its logs.
///
/// DM logs applied to the character are detached (character and applied
/// date cleared) and survive. Returns how many were detached.
///
/// # Errors
///
/// Returns not-found or forbidden errors, or a store failure.
pub fn delete_character(conn: &mut Connection, actor: &User, character_id: &str) -> Result<usize> {
    let tx = conn.transaction()?;
    let character = query::get_character(&tx, character_id)?
        .ok_or_else(|| AlogError::not_found("character", character_id))?;
    ensure_can_modify(actor, &character.user_id, "character", &character.id)?;

    let detached = tx.execute(
        "UPDATE logs SET character_id = NULL, applied_date_us = NULL, updated_at_us = ?2 \
         WHERE character_id = ?1 AND is_dm_log = 1",
        params![character.id, now_us()],
    )?;
    tx.execute(
        "DELETE FROM characters WHERE character_id = ?1",
        params![character.id],
    )?;
    tx.commit()?;

    info!(character_id = %character.id, detached, "deleted character");
    Ok(detached)
}

// ---------------------------------------------------------------------------
// Dungeon masters
// ---------------------------------------------------------------------------

fn insert_dm(conn: &Connection, owner_id: &str, name: &str, dci: Option<&str>, is_user: bool) -> Result<DungeonMaster> {
    let dm = DungeonMaster {
        id: generate(IdKind::DungeonMaster, name),
        user_id: owner_id.to_string(),
        name: name.to_string(),
        dci: dci.map(ToString::to_string),
        is_user,
        created_at_us: now_us(),
    };
    conn.execute(
        "INSERT INTO dungeon_masters (dm_id, user_id, name, dci, is_user, created_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![dm.id, dm.user_id, dm.name, dm.dci, dm.is_user, dm.created_at_us],
    )?;
    Ok(dm)
}

/// Add a dungeon master to `actor`'s list.
///
/// # Errors
///
/// Returns a validation error, or [`AlogError::Conflict`] when the name is
/// already on the list.
pub fn create_dm(conn: &Connection, actor: &User, draft: &DmDraft) -> Result<DungeonMaster> {
    draft.validate()?;
    if query::find_dm_by_name(conn, &actor.id, &draft.name)?.is_some() {
        return Err(AlogError::Conflict(format!(
            "a dungeon master named '{}' already exists",
            draft.name
        )));
    }
    let dm = insert_dm(conn, &actor.id, &draft.name, draft.dci.as_deref(), false)?;
    info!(dm_id = %dm.id, "created dungeon master");
    Ok(dm)
}

/// Rename a dungeon master or change their DCI.
///
/// # Errors
///
/// Returns not-found, forbidden, validation or conflict errors.
pub fn update_dm(conn: &Connection, actor: &User, dm_id: &str, draft: &DmDraft) -> Result<DungeonMaster> {
    let current = query::get_dm(conn, dm_id)?.ok_or_else(|| AlogError::not_found("dm", dm_id))?;
    ensure_can_modify(actor, &current.user_id, "dm", &current.id)?;
    draft.validate()?;

    if let Some(clash) = query::find_dm_by_name(conn, &current.user_id, &draft.name)? {
        if clash.id != current.id {
            return Err(AlogError::Conflict(format!(
                "a dungeon master named '{}' already exists",
                draft.name
            )));
        }
    }

    conn.execute(
        "UPDATE dungeon_masters SET name = ?2, dci = ?3 WHERE dm_id = ?1",
        params![current.id, draft.name, draft.dci],
    )?;
    info!(dm_id = %current.id, "updated dungeon master");
    Ok(DungeonMaster {
        name: draft.name.clone(),
        dci: draft.dci.clone(),
        ..current
    })
}

/// Delete a dungeon master; their logs keep existing without a DM.
///
/// # Errors
///
/// Returns [`AlogError::Conflict`] for the user's own DM record, plus the
/// usual not-found and forbidden errors.
pub fn delete_dm(conn: &Connection, actor: &User, dm_id: &str) -> Result<()> {
    let dm = query::get_dm(conn, dm_id)?.ok_or_else(|| AlogError::not_found("dm", dm_id))?;
    ensure_can_modify(actor, &dm.user_id, "dm", &dm.id)?;
    if dm.is_user {
        return Err(AlogError::Conflict(
            "the user's own dungeon master record cannot be deleted".to_string(),
        ));
    }
    conn.execute("DELETE FROM dungeon_masters WHERE dm_id = ?1", params![dm.id])?;
    info!(dm_id = %dm.id, "deleted dungeon master");
    Ok(())
}

/// The owner's self DM record, created on first use.
///
/// # Errors
///
/// Returns a store failure if the lookup or insert fails.
pub fn ensure_self_dm(conn: &Connection, owner: &User) -> Result<DungeonMaster> {
    if let Some(dm) = query::get_self_dm(conn, &owner.id)? {
        return Ok(dm);
    }
    let dm = insert_dm(conn, &owner.id, &owner.name, None, true)?;
    info!(dm_id = %dm.id, user_id = %owner.id, "created self dungeon master");
    Ok(dm)
}

/// Look up a DM on the owner's list by name, adding it when missing.
///
/// A DCI given for an existing DM without one is recorded.
///
/// # Errors
///
/// Returns a validation error for a bad name or DCI.
pub fn find_or_create_dm(
    conn: &Connection,
    owner_id: &str,
    name: &str,
    dci: Option<&str>,
) -> Result<DungeonMaster> {
    let draft = DmDraft {
        name: name.trim().to_string(),
        dci: dci.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
    };
    draft.validate()?;

    if let Some(mut dm) = query::find_dm_by_name(conn, owner_id, &draft.name)? {
        if dm.dci.is_none() && draft.dci.is_some() {
            conn.execute(
                "UPDATE dungeon_masters SET dci = ?2 WHERE dm_id = ?1",
                params![dm.id, draft.dci],
            )?;
            dm.dci = draft.dci;
        }
        return Ok(dm);
    }

    let dm = insert_dm(conn, owner_id, &draft.name, draft.dci.as_deref(), false)?;
    debug!(dm_id = %dm.id, "added dungeon master from log");
    Ok(dm)
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

/// Create or update a log, its gained items and its loss references.
///
/// Runs in one transaction:
///
/// 1. validate the draft and resolve owner, character and DM
/// 2. upsert the log row
/// 3. reconcile gained items (update kept ids, insert new, delete dropped)
/// 4. clear and re-apply loss references, each of which must name an item
///    of the same character not already lost elsewhere
/// 5. re-check loss ordering for every character the save touched
///
/// # Errors
///
/// Returns validation, not-found, forbidden or [`AlogError::InvalidLedger`]
/// errors; nothing is written in that case.
pub fn save_log(conn: &mut Connection, actor: &User, draft: &LogDraft) -> Result<Log> {
    draft.validate()?;
    let tx = conn.transaction()?;

    let existing = match draft.id.as_deref() {
        Some(id) => Some(require_log(&tx, id)?),
        None => None,
    };
    if let Some(current) = &existing {
        ensure_can_modify(actor, &current.user_id, "log", &current.id)?;
        if current.is_dm_log != draft.is_dm_log {
            return Err(AlogError::validation(
                "is_dm_log",
                "a log cannot switch between character log and DM log",
            ));
        }
    }

    let character = match draft.character_id.as_deref() {
        Some(id) => Some(
            query::get_character(&tx, id)?.ok_or_else(|| AlogError::not_found("character", id))?,
        ),
        None => None,
    };
    if let Some(character) = &character {
        ensure_can_modify(actor, &character.user_id, "character", &character.id)?;
    }

    let owner_id = existing
        .as_ref()
        .map(|log| log.user_id.clone())
        .or_else(|| character.as_ref().map(|c| c.user_id.clone()))
        .unwrap_or_else(|| actor.id.clone());
    if let Some(character) = &character {
        if character.user_id != owner_id {
            return Err(AlogError::validation(
                "character",
                "belongs to a different user than the log",
            ));
        }
    }
    let owner = require_user(&tx, &owner_id)?;

    if draft.is_dm_log && character.is_none() && draft.applied_date_us.is_some() {
        return Err(AlogError::validation(
            "applied_date",
            "a DM log needs a character to be applied to",
        ));
    }
    let applied_date_us = if draft.is_dm_log && character.is_some() {
        Some(draft.applied_date_us.unwrap_or(draft.date_us))
    } else {
        None
    };

    let dm_id = if draft.is_dm_log {
        Some(ensure_self_dm(&tx, &owner)?.id)
    } else {
        match draft.dm_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                Some(find_or_create_dm(&tx, &owner.id, name, draft.dm_dci.as_deref())?.id)
            }
            _ => None,
        }
    };

    let now = now_us();
    let log_id = match &existing {
        Some(current) => {
            tx.execute(
                "UPDATE logs SET character_id = ?2, dm_id = ?3, name = ?4, log_type = ?5, \
                 date_us = ?6, applied_date_us = ?7, experience = ?8, acp = ?9, tcp = ?10, \
                 level = ?11, gold = ?12, dtd = ?13, description = ?14, updated_at_us = ?15 \
                 WHERE log_id = ?1",
                params![
                    current.id,
                    draft.character_id,
                    dm_id,
                    draft.name,
                    draft.log_type.as_str(),
                    draft.date_us,
                    applied_date_us,
                    draft.experience,
                    draft.acp,
                    draft.tcp,
                    draft.level,
                    draft.gold,
                    draft.dtd,
                    draft.description,
                    now
                ],
            )?;
            current.id.clone()
        }
        None => {
            let id = generate(IdKind::Log, &draft.name);
            tx.execute(
                "INSERT INTO logs (log_id, user_id, character_id, dm_id, name, log_type, \
                 date_us, applied_date_us, is_dm_log, experience, acp, tcp, level, gold, dtd, \
                 description, created_at_us, updated_at_us) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)",
                params![
                    id,
                    owner.id,
                    draft.character_id,
                    dm_id,
                    draft.name,
                    draft.log_type.as_str(),
                    draft.date_us,
                    applied_date_us,
                    draft.is_dm_log,
                    draft.experience,
                    draft.acp,
                    draft.tcp,
                    draft.level,
                    draft.gold,
                    draft.dtd,
                    draft.description,
                    now
                ],
            )?;
            id
        }
    };

    reconcile_gained(&tx, &log_id, existing.as_ref(), draft, now)?;
    apply_losses(&tx, &log_id, draft)?;

    let mut touched: Vec<&str> = draft.character_id.iter().map(String::as_str).collect();
    if let Some(previous) = existing.as_ref().and_then(|log| log.character_id.as_deref()) {
        if !touched.contains(&previous) {
            touched.push(previous);
        }
    }
    for character_id in touched {
        let logs = query::load_character_logs(&tx, character_id)?;
        check_consistency(&logs).map_err(|violation| AlogError::InvalidLedger {
            item_id: violation.item_id,
            log_id: violation.log_lost_id,
            reason: violation.reason,
        })?;
    }

    tx.commit()?;
    info!(
        log_id = %log_id,
        character_id = draft.character_id.as_deref().unwrap_or("-"),
        is_dm_log = draft.is_dm_log,
        created = existing.is_none(),
        "saved log"
    );

    require_log(conn, &log_id)
}

fn reconcile_gained(
    conn: &Connection,
    log_id: &str,
    existing: Option<&Log>,
    draft: &LogDraft,
    now: i64,
) -> Result<()> {
    let previous: HashSet<&str> = existing
        .map(|log| log.gained.iter().map(|item| item.id.as_str()).collect())
        .unwrap_or_default();
    let mut kept: HashSet<String> = HashSet::new();

    for (position, item) in draft.gained.iter().enumerate() {
        let position = i64::try_from(position).unwrap_or(i64::MAX);
        match item.id.as_deref() {
            Some(item_id) => {
                if !previous.contains(item_id) || !kept.insert(item_id.to_string()) {
                    return Err(AlogError::validation(
                        "gained_items",
                        format!("item '{item_id}' is not an item gained by this log"),
                    ));
                }
                conn.execute(
                    "UPDATE ledger_items SET kind = ?2, name = ?3, description = ?4, position = ?5 \
                     WHERE item_id = ?1",
                    params![item_id, item.kind.as_str(), item.name, item.description, position],
                )?;
            }
            None => {
                let item_id = generate(IdKind::Item, &item.name);
                conn.execute(
                    "INSERT INTO ledger_items (item_id, kind, name, description, log_gained_id, \
                     position, created_at_us) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![item_id, item.kind.as_str(), item.name, item.description, log_id, position, now],
                )?;
                kept.insert(item_id);
            }
        }
    }

    for dropped in previous.iter().filter(|id| !kept.contains(**id)) {
        conn.execute("DELETE FROM ledger_items WHERE item_id = ?1", params![dropped])?;
        debug!(item_id = %dropped, log_id, "removed gained item");
    }
    Ok(())
}

fn apply_losses(conn: &Connection, log_id: &str, draft: &LogDraft) -> Result<()> {
    conn.execute(
        "UPDATE ledger_items SET log_lost_id = NULL WHERE log_lost_id = ?1",
        params![log_id],
    )?;

    for item_id in &draft.lost_ids {
        let invalid = |reason: &'static str| AlogError::InvalidLedger {
            item_id: item_id.clone(),
            log_id: log_id.to_string(),
            reason,
        };

        let item = query::get_item(conn, item_id)?.ok_or_else(|| invalid("no such item"))?;
        let owner_character = query::item_owner_character(conn, item_id)?;
        if owner_character.is_none() || owner_character != draft.character_id {
            return Err(invalid("item was not gained by this character"));
        }
        if item.log_lost_id.is_some() {
            return Err(invalid("item was already lost by another log"));
        }

        conn.execute(
            "UPDATE ledger_items SET log_lost_id = ?2 WHERE item_id = ?1",
            params![item_id, log_id],
        )?;
    }
    Ok(())
}

/// Delete a log. Items it gained go with it; items it lost become held
/// again.
///
/// # Errors
///
/// Returns not-found or forbidden errors.
pub fn delete_log(conn: &Connection, actor: &User, log_id: &str) -> Result<()> {
    let log = require_log(conn, log_id)?;
    ensure_can_modify(actor, &log.user_id, "log", &log.id)?;
    conn.execute("DELETE FROM logs WHERE log_id = ?1", params![log.id])?;
    info!(
        log_id = %log.id,
        gained = log.gained.len(),
        restored = log.lost.len(),
        "deleted log"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::model::{Role, UserDraft};

    fn user(conn: &Connection, email: &str, role: Role) -> User {
        create_user(
            conn,
            &UserDraft {
                name: email.split('@').next().unwrap_or("x").to_string(),
                email: email.to_string(),
                role,
            },
        )
        .expect("create user")
    }

    fn character(conn: &Connection, owner: &User, name: &str) -> Character {
        create_character(
            conn,
            owner,
            &CharacterDraft {
                name: name.to_string(),
                ..CharacterDraft::default()
            },
        )
        .expect("create character")
    }

    #[test]
    fn logs_are_visible_to_owner_and_admin_only() {
        let mut conn = open_in_memory().expect("store");
        let avery = user(&conn, "avery@example.com", Role::User);
        let mallory = user(&conn, "mallory@example.com", Role::User);
        let ada = user(&conn, "ada@example.com", Role::Admin);
        let brisk = character(&conn, &avery, "Brisk");
        let log = save_log(
            &mut conn,
            &avery,
            &LogDraft {
                name: "Secret".into(),
                date_us: 1_000,
                character_id: Some(brisk.id),
                ..LogDraft::default()
            },
        )
        .expect("save");

        assert_eq!(require_visible_log(&conn, &avery, &log.id).expect("owner").id, log.id);
        assert_eq!(require_visible_log(&conn, &ada, &log.id).expect("admin").id, log.id);
        let err = require_visible_log(&conn, &mallory, &log.id).expect_err("stranger");
        assert!(matches!(err, AlogError::NotFound { entity: "log", .. }));
    }

    #[test]
    fn duplicate_email_conflicts() {
        let conn = open_in_memory().expect("store");
        user(&conn, "avery@example.com", Role::User);
        let err = create_user(
            &conn,
            &UserDraft {
                name: "Other".into(),
                email: "AVERY@example.com".into(),
                role: Role::User,
            },
        )
        .expect_err("duplicate");
        assert_eq!(err.status(), 409);
    }

    #[test]
    fn non_owner_cannot_update_but_admin_can() {
        let conn = open_in_memory().expect("store");
        let owner = user(&conn, "owner@example.com", Role::User);
        let stranger = user(&conn, "stranger@example.com", Role::User);
        let admin = user(&conn, "admin@example.com", Role::Admin);
        let ch = character(&conn, &owner, "Brisk");

        let draft = CharacterDraft {
            name: "Brisker".into(),
            ..CharacterDraft::default()
        };
        let err = update_character(&conn, &stranger, &ch.id, &draft).expect_err("forbidden");
        assert_eq!(err.status(), 403);

        let updated = update_character(&conn, &admin, &ch.id, &draft).expect("admin update");
        assert_eq!(updated.name, "Brisker");
        assert_eq!(updated.user_id, owner.id);
    }

    #[test]
    fn self_dm_is_created_once_and_cannot_be_deleted() {
        let conn = open_in_memory().expect("store");
        let owner = user(&conn, "dm@example.com", Role::User);
        let first = ensure_self_dm(&conn, &owner).expect("self dm");
        let second = ensure_self_dm(&conn, &owner).expect("self dm again");
        assert_eq!(first.id, second.id);
        assert!(first.is_user);

        let err = delete_dm(&conn, &owner, &first.id).expect_err("self dm");
        assert_eq!(err.status(), 409);
    }

    #[test]
    fn find_or_create_dm_reuses_case_insensitively() {
        let conn = open_in_memory().expect("store");
        let owner = user(&conn, "p@example.com", Role::User);
        let a = find_or_create_dm(&conn, &owner.id, "Rowan", None).expect("create");
        let b = find_or_create_dm(&conn, &owner.id, "rowan", Some("42")).expect("reuse");
        assert_eq!(a.id, b.id);
        assert_eq!(b.dci.as_deref(), Some("42"));
    }

    #[test]
    fn create_dm_rejects_duplicate_name() {
        let conn = open_in_memory().expect("store");
        let owner = user(&conn, "p@example.com", Role::User);
        let draft = DmDraft {
            name: "Rowan".into(),
            dci: None,
        };
        create_dm(&conn, &owner, &draft).expect("first");
        assert_eq!(create_dm(&conn, &owner, &draft).expect_err("dup").status(), 409);
    }
}
