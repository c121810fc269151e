//! `alog character`: create, inspect, edit and delete characters.

use super::Context;
use crate::output::{
    Renderable, or_dash, pretty_kv, pretty_rule, pretty_section, render_list, render_mode,
    render_success,
};
use alog_core::db::{query, write};
use alog_core::ledger::{LedgerOptions, LogsSummary, summarize};
use alog_core::model::time::format_date;
use alog_core::model::{Character, CharacterDraft, Log};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Subcommand, Debug)]
pub enum CharacterCommand {
    /// Create a character.
    Create(CreateArgs),
    /// List the acting user's characters.
    List,
    /// Show a character with its totals and logs.
    Show(ShowArgs),
    /// Change a character's details.
    Update(UpdateArgs),
    /// Delete a character and its logs.
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    pub name: String,

    #[arg(long)]
    pub race: Option<String>,

    #[arg(long)]
    pub class: Option<String>,

    /// Campaign; defaults to `[characters] default_campaign`.
    #[arg(long)]
    pub campaign: Option<String>,

    #[arg(long)]
    pub sheet_url: Option<String>,

    #[arg(long)]
    pub image_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Character id or name.
    pub character: String,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Character id or name.
    pub character: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub race: Option<String>,

    #[arg(long)]
    pub class: Option<String>,

    #[arg(long)]
    pub campaign: Option<String>,

    #[arg(long)]
    pub sheet_url: Option<String>,

    #[arg(long)]
    pub image_url: Option<String>,

    /// Clear the named optional fields (race, class, campaign, sheet_url, image_url).
    #[arg(long, value_delimiter = ',')]
    pub clear: Vec<String>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Character id or name.
    pub character: String,
}

#[derive(Debug, Serialize)]
struct CharacterRow {
    #[serde(flatten)]
    character: Character,
    level: i64,
    tier: u8,
    log_count: usize,
}

impl Renderable for CharacterRow {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let c = &self.character;
        writeln!(
            w,
            "{:<28} L{:<3} T{} {:<24} {} logs",
            c.name,
            self.level,
            self.tier,
            describe(c),
            self.log_count
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let c = &self.character;
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            c.id,
            c.name,
            or_dash(c.race.as_deref()),
            or_dash(c.class.as_deref()),
            self.level,
            self.tier,
            self.log_count
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["id", "name", "race", "class", "level", "tier", "logs"]
    }
}

#[derive(Debug, Serialize)]
struct CharacterDetail {
    #[serde(flatten)]
    character: Character,
    summary: LogsSummary,
    logs: Vec<Log>,
}

#[derive(Debug, Serialize)]
struct DeleteReport {
    id: String,
    name: String,
    deleted: bool,
    detached_dm_logs: usize,
}

fn describe(c: &Character) -> String {
    let parts: Vec<&str> = [c.race.as_deref(), c.class.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(" ")
    }
}

fn trimmed(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// # Errors
///
/// Returns store, validation, lookup or permission errors.
pub fn run_character(command: &CharacterCommand, ctx: &Context) -> Result<()> {
    match command {
        CharacterCommand::Create(args) => run_create(args, ctx),
        CharacterCommand::List => run_list(ctx),
        CharacterCommand::Show(args) => run_show(args, ctx),
        CharacterCommand::Update(args) => run_update(args, ctx),
        CharacterCommand::Delete(args) => run_delete(args, ctx),
    }
}

fn run_create(args: &CreateArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let actor = ctx.acting_user(&conn)?;
    let draft = CharacterDraft {
        name: args.name.trim().to_string(),
        race: trimmed(args.race.as_ref()),
        class: trimmed(args.class.as_ref()),
        campaign: trimmed(args.campaign.as_ref())
            .or_else(|| ctx.config.project.characters.default_campaign.clone()),
        sheet_url: trimmed(args.sheet_url.as_ref()),
        image_url: trimmed(args.image_url.as_ref()),
    };
    let character = write::create_character(&conn, &actor, &draft)?;
    render_character(ctx, &character)
}

fn run_list(ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let owner = ctx.acting_user(&conn)?;
    let rows = query::list_characters(&conn, &owner.id)?
        .into_iter()
        .map(|character| {
            let logs = query::load_character_logs(&conn, &character.id)?;
            let summary = summarize(&logs, &LedgerOptions::default(), ctx.max_level());
            Ok(CharacterRow {
                level: summary.level(),
                tier: summary.tier,
                log_count: summary.log_count,
                character,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    render_list("Characters", &rows, ctx.output)
}

fn run_show(args: &ShowArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let owner = ctx.acting_user(&conn)?;
    let character = write::require_character(&conn, &owner, &args.character)?;
    let logs = query::load_character_logs(&conn, &character.id)?;
    let summary = summarize(&logs, &LedgerOptions::default(), ctx.max_level());
    let detail = CharacterDetail {
        character,
        summary,
        logs,
    };

    render_mode(ctx.output, &detail, render_detail_text, render_detail_human)
}

fn run_update(args: &UpdateArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let actor = ctx.acting_user(&conn)?;
    let current = write::require_character(&conn, &actor, &args.character)?;

    let clears = |field: &str| args.clear.iter().any(|c| c.trim() == field);
    let merge = |flag: Option<&String>, field: &str, existing: Option<String>| {
        if clears(field) {
            None
        } else {
            trimmed(flag).or(existing)
        }
    };

    let draft = CharacterDraft {
        name: trimmed(args.name.as_ref()).unwrap_or_else(|| current.name.clone()),
        race: merge(args.race.as_ref(), "race", current.race.clone()),
        class: merge(args.class.as_ref(), "class", current.class.clone()),
        campaign: merge(args.campaign.as_ref(), "campaign", current.campaign.clone()),
        sheet_url: merge(args.sheet_url.as_ref(), "sheet_url", current.sheet_url.clone()),
        image_url: merge(args.image_url.as_ref(), "image_url", current.image_url.clone()),
    };
    let updated = write::update_character(&conn, &actor, &current.id, &draft)?;
    render_character(ctx, &updated)
}

fn run_delete(args: &DeleteArgs, ctx: &Context) -> Result<()> {
    let mut conn = ctx.open_store()?;
    let actor = ctx.acting_user(&conn)?;
    let character = write::require_character(&conn, &actor, &args.character)?;
    let detached = write::delete_character(&mut conn, &actor, &character.id)?;

    if ctx.output.is_json() {
        let report = DeleteReport {
            id: character.id,
            name: character.name,
            deleted: true,
            detached_dm_logs: detached,
        };
        return render_mode(ctx.output, &report, |_, _| Ok(()), |_, _| Ok(()));
    }
    let message = if detached == 0 {
        format!("deleted {}", character.name)
    } else {
        format!("deleted {} ({detached} DM logs detached)", character.name)
    };
    render_success(ctx.output, ctx.quiet, &message)
}

fn render_character(ctx: &Context, character: &Character) -> Result<()> {
    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    render_mode(
        ctx.output,
        character,
        |c, w| writeln!(w, "{}\t{}", c.id, c.name),
        |c, w| {
            pretty_section(w, &c.name)?;
            pretty_kv(w, "ID", &c.id)?;
            pretty_kv(w, "Race", or_dash(c.race.as_deref()))?;
            pretty_kv(w, "Class", or_dash(c.class.as_deref()))?;
            pretty_kv(w, "Campaign", or_dash(c.campaign.as_deref()))
        },
    )
}

fn render_detail_text(d: &CharacterDetail, w: &mut dyn Write) -> io::Result<()> {
    let c = &d.character;
    let s = &d.summary;
    writeln!(w, "{}\t{}\tlevel={}\ttier={}", c.id, c.name, s.level(), s.tier)?;
    writeln!(
        w,
        "xp={}\tacp={}\ttcp={}\tgold={:.2}\tdtd={}",
        s.experience, s.acp, s.tcp, s.gold, s.dtd
    )?;
    for item in s.magic_items.iter().chain(&s.story_awards) {
        writeln!(w, "{}\t{}\t{}", item.kind.as_str(), item.id, item.name)?;
    }
    for log in &d.logs {
        writeln!(
            w,
            "log\t{}\t{}\t{}",
            log.id,
            format_date(log.effective_date_us()),
            log.name
        )?;
    }
    Ok(())
}

fn render_detail_human(d: &CharacterDetail, w: &mut dyn Write) -> io::Result<()> {
    let c = &d.character;
    let s = &d.summary;

    pretty_section(w, &format!("{}  (level {}, tier {})", c.name, s.level(), s.tier))?;
    pretty_kv(w, "ID", &c.id)?;
    pretty_kv(w, "Race", or_dash(c.race.as_deref()))?;
    pretty_kv(w, "Class", or_dash(c.class.as_deref()))?;
    pretty_kv(w, "Campaign", or_dash(c.campaign.as_deref()))?;
    if let Some(url) = &c.sheet_url {
        pretty_kv(w, "Sheet", url)?;
    }
    pretty_kv(w, "Experience", s.experience.to_string())?;
    pretty_kv(w, "ACP / TCP", format!("{} / {}", s.acp, s.tcp))?;
    pretty_kv(w, "Gold", format!("{:.2}", s.gold))?;
    pretty_kv(w, "Downtime", format!("{} days", s.dtd))?;
    pretty_kv(
        w,
        "Levels",
        format!(
            "{} xp + {} acp + {} logs",
            s.levels.from_xp, s.levels.from_acp, s.levels.from_logs
        ),
    )?;

    writeln!(w)?;
    pretty_section(w, &format!("Magic items ({})", s.magic_items.len()))?;
    for item in &s.magic_items {
        writeln!(w, "  {}  [{}]", item.name, item.id)?;
    }
    writeln!(w)?;
    pretty_section(w, &format!("Story awards ({})", s.story_awards.len()))?;
    for item in &s.story_awards {
        writeln!(w, "  {}  [{}]", item.name, item.id)?;
    }

    writeln!(w)?;
    pretty_section(w, &format!("Logs ({})", d.logs.len()))?;
    for log in &d.logs {
        let marker = if log.is_dm_log { " (DM)" } else { "" };
        writeln!(
            w,
            "  {}  {}{}  [{}]",
            format_date(log.effective_date_us()),
            log.name,
            marker,
            log.id
        )?;
    }
    pretty_rule(w)
}
