//! `alog summary`: a character's totals, level and tier.

use super::{Context, CutoffArgs};
use crate::output::{pretty_kv, pretty_section, render_mode};
use alog_core::db::{query, write};
use alog_core::ledger::{LedgerOptions, LogsSummary, summarize};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Character id or name.
    pub character: String,

    #[command(flatten)]
    pub at: CutoffArgs,
}

#[derive(Debug, Serialize)]
struct SummaryReport<'a> {
    character_id: &'a str,
    character: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    through: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    before: Option<&'a str>,
    level: i64,
    #[serde(flatten)]
    summary: LogsSummary,
}

/// Execute `alog summary <character>`.
///
/// # Errors
///
/// Returns store or lookup errors.
pub fn run_summary(args: &SummaryArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let owner = ctx.acting_user(&conn)?;
    let character = write::require_character(&conn, &owner, &args.character)?;
    let logs = query::load_character_logs(&conn, &character.id)?;

    let options = LedgerOptions {
        cutoff: args.at.cutoff(),
        exclude_dropped: false,
    };
    let summary = summarize(&logs, &options, ctx.max_level());

    let report = SummaryReport {
        character_id: &character.id,
        character: &character.name,
        through: args.at.through.as_deref(),
        before: args.at.before.as_deref(),
        level: summary.level(),
        summary,
    };
    render_mode(ctx.output, &report, render_text, render_human)
}

fn render_text(r: &SummaryReport<'_>, w: &mut dyn Write) -> io::Result<()> {
    let s = &r.summary;
    writeln!(
        w,
        "{}\t{}\tlevel={}\ttier={}\tlogs={}\txp={}\tacp={}\ttcp={}\tgold={:.2}\tdtd={}\tmagic_items={}\tstory_awards={}",
        r.character_id,
        r.character,
        r.level,
        s.tier,
        s.log_count,
        s.experience,
        s.acp,
        s.tcp,
        s.gold,
        s.dtd,
        s.magic_items.len(),
        s.story_awards.len()
    )
}

fn render_human(r: &SummaryReport<'_>, w: &mut dyn Write) -> io::Result<()> {
    let s = &r.summary;
    let heading = match (r.through, r.before) {
        (Some(id), _) => format!("{} as of {id}", r.character),
        (None, Some(id)) => format!("{} before {id}", r.character),
        (None, None) => r.character.to_string(),
    };
    pretty_section(w, &heading)?;
    pretty_kv(w, "Level", format!("{} (tier {})", r.level, s.tier))?;
    pretty_kv(
        w,
        "From",
        format!(
            "{} xp + {} acp + {} logs",
            s.levels.from_xp, s.levels.from_acp, s.levels.from_logs
        ),
    )?;
    pretty_kv(w, "Logs", s.log_count.to_string())?;
    pretty_kv(w, "Experience", s.experience.to_string())?;
    pretty_kv(w, "ACP / TCP", format!("{} / {}", s.acp, s.tcp))?;
    pretty_kv(w, "Gold", format!("{:.2}", s.gold))?;
    pretty_kv(w, "Downtime", format!("{} days", s.dtd))?;
    pretty_kv(w, "Magic items", s.magic_items.len().to_string())?;
    pretty_kv(w, "Story awards", s.story_awards.len().to_string())
}
