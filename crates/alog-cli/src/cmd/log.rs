//! `alog log`: record, edit and inspect adventure and DM logs.
//!
//! Items gained are entered by name (`--magic-item`, `--story-award`).
//! Items lost (`--lose`) may be named by item id or, when unambiguous, by
//! the name of an item the character still holds.

use super::{Context, parse_date_arg};
use crate::output::{
    Renderable, or_dash, pretty_kv, pretty_section, render_list, render_mode, render_success,
};
use alog_core::AlogError;
use alog_core::db::{query, write};
use alog_core::model::time::{format_date, now_us};
use alog_core::model::{ItemDraft, ItemKind, LedgerItem, Log, LogDraft, LogType, User};
use anyhow::Result;
use clap::{ArgGroup, Args, Subcommand};
use rusqlite::Connection;
use std::io::{self, Write};

#[derive(Subcommand, Debug)]
pub enum LogCommand {
    /// Record a new log.
    Add(AddArgs),
    /// Change an existing log.
    Edit(EditArgs),
    /// Delete a log; items it gained go with it.
    Delete(IdArgs),
    /// List a character's logs (chronological) or your DM logs (newest first).
    List(ListArgs),
    /// Show one log with its items.
    Show(IdArgs),
}

/// Fields shared by `log add` and `log edit`.
#[derive(Args, Debug, Default)]
pub struct LogFields {
    /// Character id or name the log belongs to (or a DM log is applied to).
    #[arg(long)]
    pub character: Option<String>,

    /// Session date (YYYY-MM-DD, YYYY-MM-DD HH:MM or RFC 3339).
    #[arg(long)]
    pub date: Option<String>,

    /// Date a DM log was applied to its character.
    #[arg(long)]
    pub applied_date: Option<String>,

    #[arg(long = "type", value_name = "game|nongame")]
    pub log_type: Option<LogType>,

    /// Dungeon master by name; added to your DM list when new.
    #[arg(long)]
    pub dm: Option<String>,

    /// DCI number recorded for the dungeon master.
    #[arg(long)]
    pub dm_dci: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    pub xp: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub acp: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub tcp: Option<i64>,

    /// Levels granted outright by this log.
    #[arg(long)]
    pub level: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub gold: Option<f64>,

    /// Downtime days.
    #[arg(long, allow_negative_numbers = true)]
    pub dtd: Option<i64>,

    #[arg(long)]
    pub description: Option<String>,

    /// Magic item gained (repeatable).
    #[arg(long = "magic-item", value_name = "NAME")]
    pub magic_items: Vec<String>,

    /// Story award gained (repeatable).
    #[arg(long = "story-award", value_name = "NAME")]
    pub story_awards: Vec<String>,

    /// Item lost, by id or held item name (repeatable).
    #[arg(long = "lose", value_name = "ITEM")]
    pub lose: Vec<String>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,

    /// Record a log of a session you ran as DM.
    #[arg(long)]
    pub dm_log: bool,

    #[command(flatten)]
    pub fields: LogFields,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub fields: LogFields,

    /// Remove a gained item from this log, by id (repeatable).
    #[arg(long = "drop-item", value_name = "ITEM_ID")]
    pub drop_items: Vec<String>,

    /// Undo a loss recorded by this log, by item id (repeatable).
    #[arg(long = "restore", value_name = "ITEM_ID")]
    pub restore: Vec<String>,

    /// Detach a DM log from its character.
    #[arg(long, conflicts_with = "character")]
    pub detach: bool,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("scope").required(true).args(["character", "dm"])))]
pub struct ListArgs {
    /// Character id or name.
    #[arg(long)]
    pub character: Option<String>,

    /// List your DM logs instead.
    #[arg(long)]
    pub dm: bool,
}

impl Renderable for Log {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let marker = if self.is_dm_log { " (DM)" } else { "" };
        writeln!(
            w,
            "{}  {:<40}{}  xp {:<6} gold {:<8.2} [{}]",
            format_date(self.effective_date_us()),
            self.name,
            marker,
            self.experience,
            self.gold,
            self.id
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.id,
            format_date(self.effective_date_us()),
            self.log_type,
            self.name,
            self.experience,
            self.gold,
            self.gained.len(),
            self.lost.len()
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["id", "date", "type", "name", "xp", "gold", "gained", "lost"]
    }
}

/// # Errors
///
/// Returns store, validation, lookup, permission or ledger errors.
pub fn run_log(command: &LogCommand, ctx: &Context) -> Result<()> {
    match command {
        LogCommand::Add(args) => run_add(args, ctx),
        LogCommand::Edit(args) => run_edit(args, ctx),
        LogCommand::Delete(args) => run_delete(args, ctx),
        LogCommand::List(args) => run_list(args, ctx),
        LogCommand::Show(args) => run_show(args, ctx),
    }
}

fn run_add(args: &AddArgs, ctx: &Context) -> Result<()> {
    let mut conn = ctx.open_store()?;
    let actor = ctx.acting_user(&conn)?;

    let mut draft = LogDraft {
        name: args.name.trim().to_string(),
        is_dm_log: args.dm_log,
        date_us: now_us(),
        ..LogDraft::default()
    };
    apply_fields(&conn, &actor, &args.fields, &mut draft)?;

    let log = write::save_log(&mut conn, &actor, &draft)?;
    render_saved(ctx, &log)
}

fn run_edit(args: &EditArgs, ctx: &Context) -> Result<()> {
    let mut conn = ctx.open_store()?;
    let actor = ctx.acting_user(&conn)?;
    let current = write::require_log(&conn, &args.id)?;

    let mut draft = draft_from_log(&current);
    if let Some(name) = &args.name {
        draft.name = name.trim().to_string();
    }
    if args.detach {
        if !current.is_dm_log {
            return Err(AlogError::validation("character", "only DM logs can be detached").into());
        }
        draft.character_id = None;
        draft.applied_date_us = None;
    }
    for item_id in &args.drop_items {
        let before = draft.gained.len();
        draft.gained.retain(|item| item.id.as_deref() != Some(item_id.as_str()));
        if draft.gained.len() == before {
            return Err(AlogError::validation(
                "gained_items",
                format!("log '{}' did not gain item '{item_id}'", current.id),
            )
            .into());
        }
    }
    for item_id in &args.restore {
        let before = draft.lost_ids.len();
        draft.lost_ids.retain(|id| id != item_id);
        if draft.lost_ids.len() == before {
            return Err(AlogError::validation(
                "lost_items",
                format!("log '{}' did not lose item '{item_id}'", current.id),
            )
            .into());
        }
    }
    apply_fields(&conn, &actor, &args.fields, &mut draft)?;

    let log = write::save_log(&mut conn, &actor, &draft)?;
    render_saved(ctx, &log)
}

fn run_delete(args: &IdArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let actor = ctx.acting_user(&conn)?;
    let log = write::require_log(&conn, &args.id)?;
    write::delete_log(&conn, &actor, &log.id)?;
    render_success(ctx.output, ctx.quiet, &format!("deleted log {} ({})", log.name, log.id))
}

fn run_list(args: &ListArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let owner = ctx.acting_user(&conn)?;
    match args.character.as_deref() {
        Some(key) => {
            let character = write::require_character(&conn, &owner, key)?;
            let logs = query::load_character_logs(&conn, &character.id)?;
            render_list(&format!("Logs of {}", character.name), &logs, ctx.output)
        }
        None => {
            let logs = query::list_dm_logs(&conn, &owner.id)?;
            render_list("DM logs", &logs, ctx.output)
        }
    }
}

fn run_show(args: &IdArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let viewer = ctx.acting_user(&conn)?;
    let log = write::require_visible_log(&conn, &viewer, &args.id)?;
    let character_name = match log.character_id.as_deref() {
        Some(id) => query::get_character(&conn, id)?.map(|c| c.name),
        None => None,
    };
    render_mode(ctx.output, &log, render_log_text, |log, w| {
        render_log_human(log, character_name.as_deref(), w)
    })
}

/// A draft that reproduces `log` unchanged when saved.
fn draft_from_log(log: &Log) -> LogDraft {
    LogDraft {
        id: Some(log.id.clone()),
        name: log.name.clone(),
        log_type: log.log_type,
        date_us: log.date_us,
        applied_date_us: log.applied_date_us,
        is_dm_log: log.is_dm_log,
        character_id: log.character_id.clone(),
        dm_name: if log.is_dm_log { None } else { log.dm_name.clone() },
        dm_dci: None,
        experience: log.experience,
        acp: log.acp,
        tcp: log.tcp,
        level: log.level,
        gold: log.gold,
        dtd: log.dtd,
        description: log.description.clone(),
        gained: log
            .gained
            .iter()
            .map(|item| ItemDraft {
                id: Some(item.id.clone()),
                kind: item.kind,
                name: item.name.clone(),
                description: item.description.clone(),
            })
            .collect(),
        lost_ids: log.lost.iter().map(|item| item.id.clone()).collect(),
    }
}

fn apply_fields(conn: &Connection, actor: &User, fields: &LogFields, draft: &mut LogDraft) -> Result<()> {
    if let Some(key) = fields.character.as_deref() {
        draft.character_id = Some(write::require_character(conn, actor, key)?.id);
    }
    if let Some(date) = parse_date_arg("date", fields.date.as_deref())? {
        draft.date_us = date;
    }
    if let Some(applied) = parse_date_arg("applied_date", fields.applied_date.as_deref())? {
        draft.applied_date_us = Some(applied);
    }
    if let Some(log_type) = fields.log_type {
        draft.log_type = log_type;
    }
    if let Some(dm) = &fields.dm {
        draft.dm_name = Some(dm.trim().to_string()).filter(|d| !d.is_empty());
    }
    if let Some(dci) = &fields.dm_dci {
        draft.dm_dci = Some(dci.trim().to_string());
    }

    let numbers = [
        (fields.xp, &mut draft.experience),
        (fields.acp, &mut draft.acp),
        (fields.tcp, &mut draft.tcp),
        (fields.level, &mut draft.level),
        (fields.dtd, &mut draft.dtd),
    ];
    for (value, slot) in numbers {
        if let Some(value) = value {
            *slot = value;
        }
    }
    if let Some(gold) = fields.gold {
        draft.gold = gold;
    }
    if let Some(description) = &fields.description {
        draft.description = Some(description.clone()).filter(|d| !d.trim().is_empty());
    }

    let gained = fields
        .magic_items
        .iter()
        .map(|name| (ItemKind::MagicItem, name))
        .chain(fields.story_awards.iter().map(|name| (ItemKind::StoryAward, name)));
    for (kind, name) in gained {
        draft.gained.push(ItemDraft {
            id: None,
            kind,
            name: name.trim().to_string(),
            description: None,
        });
    }

    for key in &fields.lose {
        let item_id = resolve_lost_item(conn, draft, key)?;
        draft.lost_ids.push(item_id);
    }
    Ok(())
}

/// Resolve `key` to an item id: an existing item id wins, then a unique
/// case-insensitive (Unicode lowercase) name match among the character's unlost items.
///
/// Unresolvable keys are passed through so the save reports them as
/// invalid ledger references.
fn resolve_lost_item(conn: &Connection, draft: &LogDraft, key: &str) -> Result<String> {
    let key = key.trim();
    if query::get_item(conn, key)?.is_some() {
        return Ok(key.to_string());
    }
    let Some(character_id) = draft.character_id.as_deref() else {
        return Ok(key.to_string());
    };

    let wanted = key.to_lowercase();
    let logs = query::load_character_logs(conn, character_id)?;
    let candidates: Vec<&LedgerItem> = logs
        .iter()
        .filter(|log| draft.id.as_deref() != Some(log.id.as_str()))
        .flat_map(|log| &log.gained)
        .filter(|item| item.log_lost_id.is_none() || item.log_lost_id == draft.id)
        .filter(|item| item.name.to_lowercase() == wanted)
        .collect();

    match candidates.as_slice() {
        [] => Ok(key.to_string()),
        [only] => Ok(only.id.clone()),
        [..] => Err(AlogError::validation(
            "lost_items",
            format!(
                "'{key}' matches {} held items; pass an item id instead",
                candidates.len()
            ),
        )
        .into()),
    }
}

fn render_saved(ctx: &Context, log: &Log) -> Result<()> {
    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    render_mode(ctx.output, log, render_log_text, |log, w| {
        render_log_human(log, None, w)
    })
}

fn render_log_text(log: &Log, w: &mut dyn Write) -> io::Result<()> {
    log.render_table(w)?;
    for item in &log.gained {
        writeln!(w, "gained\t{}\t{}\t{}", item.kind, item.id, item.name)?;
    }
    for item in &log.lost {
        writeln!(w, "lost\t{}\t{}\t{}", item.kind, item.id, item.name)?;
    }
    Ok(())
}

fn render_log_human(log: &Log, character_name: Option<&str>, w: &mut dyn Write) -> io::Result<()> {
    let heading = if log.is_dm_log {
        format!("{} (DM log)", log.name)
    } else {
        log.name.clone()
    };
    pretty_section(w, &heading)?;
    pretty_kv(w, "ID", &log.id)?;
    pretty_kv(w, "Type", log.log_type.as_str())?;
    pretty_kv(w, "Date", format_date(log.date_us))?;
    if let Some(applied) = log.applied_date_us {
        pretty_kv(w, "Applied", format_date(applied))?;
    }
    if let Some(name) = character_name {
        pretty_kv(w, "Character", name)?;
    } else if let Some(id) = &log.character_id {
        pretty_kv(w, "Character", id)?;
    }
    pretty_kv(w, "DM", or_dash(log.dm_name.as_deref()))?;
    pretty_kv(
        w,
        "Rewards",
        format!(
            "{} xp, {} acp, {} tcp, {:.2} gp, {} dtd",
            log.experience, log.acp, log.tcp, log.gold, log.dtd
        ),
    )?;
    if log.level > 0 {
        pretty_kv(w, "Levels", log.level.to_string())?;
    }
    if let Some(description) = &log.description {
        writeln!(w)?;
        writeln!(w, "{description}")?;
    }
    if !log.gained.is_empty() {
        writeln!(w)?;
        writeln!(w, "Gained:")?;
        for item in &log.gained {
            writeln!(w, "  + {} ({})  [{}]", item.name, item.kind, item.id)?;
        }
    }
    if !log.lost.is_empty() {
        writeln!(w)?;
        writeln!(w, "Lost:")?;
        for item in &log.lost {
            writeln!(w, "  - {} ({})  [{}]", item.name, item.kind, item.id)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alog_core::db::open_in_memory;
    use alog_core::model::{CharacterDraft, Role, UserDraft};

    #[test]
    fn draft_from_log_round_trips_through_save() {
        let mut conn = open_in_memory().expect("store");
        let user = write::create_user(
            &conn,
            &UserDraft {
                name: "Avery".into(),
                email: "avery@example.com".into(),
                role: Role::User,
            },
        )
        .expect("user");
        let character = write::create_character(
            &conn,
            &user,
            &CharacterDraft {
                name: "Brisk".into(),
                ..CharacterDraft::default()
            },
        )
        .expect("character");

        let mut draft = LogDraft {
            name: "Session one".into(),
            date_us: 1_000,
            character_id: Some(character.id.clone()),
            dm_name: Some("Rowan".into()),
            experience: 450,
            ..LogDraft::default()
        };
        apply_fields(
            &conn,
            &user,
            &LogFields {
                magic_items: vec!["Cloak of Elvenkind".into()],
                ..LogFields::default()
            },
            &mut draft,
        )
        .expect("fields");
        let saved = write::save_log(&mut conn, &user, &draft).expect("save");

        let resaved = write::save_log(&mut conn, &user, &draft_from_log(&saved)).expect("resave");
        assert_eq!(resaved.gained.len(), 1);
        assert_eq!(resaved.gained[0].id, saved.gained[0].id);
        assert_eq!(resaved.dm_name.as_deref(), Some("Rowan"));
        assert_eq!(resaved.experience, 450);
    }

    #[test]
    fn lost_items_resolve_by_name() {
        let mut conn = open_in_memory().expect("store");
        let user = write::create_user(
            &conn,
            &UserDraft {
                name: "Avery".into(),
                email: "avery@example.com".into(),
                role: Role::User,
            },
        )
        .expect("user");
        let character = write::create_character(
            &conn,
            &user,
            &CharacterDraft {
                name: "Brisk".into(),
                ..CharacterDraft::default()
            },
        )
        .expect("character");
        let gained = write::save_log(
            &mut conn,
            &user,
            &LogDraft {
                name: "Loot".into(),
                date_us: 1_000,
                character_id: Some(character.id.clone()),
                gained: ["Bag of Holding", "Ælfwine's Blade"]
                    .into_iter()
                    .map(|name| ItemDraft {
                        id: None,
                        kind: ItemKind::MagicItem,
                        name: name.into(),
                        description: None,
                    })
                    .collect(),
                ..LogDraft::default()
            },
        )
        .expect("gain");

        let draft = LogDraft {
            name: "Trade".into(),
            date_us: 2_000,
            character_id: Some(character.id),
            ..LogDraft::default()
        };
        let id = resolve_lost_item(&conn, &draft, "bag of holding").expect("resolve");
        assert_eq!(id, gained.gained[0].id);
        let blade = resolve_lost_item(&conn, &draft, "ælfwine's blade").expect("resolve unicode");
        assert_eq!(blade, gained.gained[1].id);
        assert_eq!(
            resolve_lost_item(&conn, &draft, "it-unknown").expect("passthrough"),
            "it-unknown"
        );
    }
}
