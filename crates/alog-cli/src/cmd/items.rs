//! `alog items`: what a character holds, optionally as of a past log.

use super::{Context, CutoffArgs};
use crate::output::{Renderable, render_list};
use alog_core::db::{query, write};
use alog_core::ledger::{Cutoff, LedgerOptions, held_items};
use alog_core::model::{ItemKind, LedgerItem};
use anyhow::Result;
use clap::Args;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct ItemsArgs {
    /// Character id or name.
    pub character: String,

    #[command(flatten)]
    pub at: CutoffArgs,

    /// List story awards instead of magic items.
    #[arg(long)]
    pub awards: bool,

    /// Hide items a later log lost, even when the cutoff predates the loss.
    #[arg(long)]
    pub exclude_dropped: bool,
}

impl ItemsArgs {
    pub fn options(&self) -> LedgerOptions<'_> {
        LedgerOptions {
            cutoff: self.at.cutoff(),
            exclude_dropped: self.exclude_dropped,
        }
    }

    const fn kind(&self) -> ItemKind {
        if self.awards {
            ItemKind::StoryAward
        } else {
            ItemKind::MagicItem
        }
    }
}

impl Renderable for LedgerItem {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let lost = if self.log_lost_id.is_some() { "  (later lost)" } else { "" };
        writeln!(w, "  {}  [{}]{lost}", self.name, self.id)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            self.id,
            self.kind,
            self.name,
            self.log_gained_id,
            self.log_lost_id.as_deref().unwrap_or("-")
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["id", "kind", "name", "gained_in", "lost_in"]
    }
}

/// Execute `alog items <character>`.
///
/// # Errors
///
/// Returns store or lookup errors.
pub fn run_items(args: &ItemsArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let owner = ctx.acting_user(&conn)?;
    let character = write::require_character(&conn, &owner, &args.character)?;
    let logs = query::load_character_logs(&conn, &character.id)?;

    let options = args.options();
    if let Some(Cutoff::Through(id) | Cutoff::Before(id)) = options.cutoff {
        if !logs.iter().any(|log| log.id == id) {
            tracing::warn!(log_id = id, character_id = %character.id, "cutoff log not in history; showing all logs");
        }
    }

    let items: Vec<LedgerItem> = held_items(&logs, args.kind(), &options)
        .into_iter()
        .cloned()
        .collect();
    let heading = match args.kind() {
        ItemKind::MagicItem => format!("Magic items of {}", character.name),
        ItemKind::StoryAward => format!("Story awards of {}", character.name),
    };
    render_list(&heading, &items, ctx.output)
}
