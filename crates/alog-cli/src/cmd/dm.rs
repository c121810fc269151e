//! `alog dm`: manage the list of dungeon masters you have played with.

use super::Context;
use crate::output::{
    Renderable, or_dash, pretty_kv, pretty_section, render_list, render_mode, render_success,
};
use alog_core::db::query::{self, DmWithCount};
use alog_core::db::write;
use alog_core::model::{DmDraft, DungeonMaster};
use anyhow::Result;
use clap::{Args, Subcommand};
use std::io::{self, Write};

#[derive(Subcommand, Debug)]
pub enum DmCommand {
    /// Add a dungeon master.
    Add(AddArgs),
    /// List your dungeon masters with their log counts.
    List,
    /// Rename a dungeon master or change their DCI.
    Update(UpdateArgs),
    /// Delete a dungeon master; their logs keep existing without one.
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub name: String,

    #[arg(long)]
    pub dci: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Dungeon master id or name.
    pub dm: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, conflicts_with = "clear_dci")]
    pub dci: Option<String>,

    #[arg(long)]
    pub clear_dci: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Dungeon master id or name.
    pub dm: String,
}

impl Renderable for DmWithCount {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let you = if self.dm.is_user { " (you)" } else { "" };
        writeln!(
            w,
            "{:<28} DCI {:<12} {} logs{}",
            self.dm.name,
            or_dash(self.dm.dci.as_deref()),
            self.log_count,
            you
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            self.dm.id,
            self.dm.name,
            or_dash(self.dm.dci.as_deref()),
            self.dm.is_user,
            self.log_count
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["id", "name", "dci", "self", "logs"]
    }
}

/// # Errors
///
/// Returns store, validation, lookup, permission or conflict errors.
pub fn run_dm(command: &DmCommand, ctx: &Context) -> Result<()> {
    match command {
        DmCommand::Add(args) => run_add(args, ctx),
        DmCommand::List => run_list(ctx),
        DmCommand::Update(args) => run_update(args, ctx),
        DmCommand::Delete(args) => run_delete(args, ctx),
    }
}

fn clean(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn run_add(args: &AddArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let actor = ctx.acting_user(&conn)?;
    let draft = DmDraft {
        name: args.name.trim().to_string(),
        dci: clean(args.dci.as_ref()),
    };
    let dm = write::create_dm(&conn, &actor, &draft)?;
    render_dm(ctx, &dm)
}

fn run_list(ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let owner = ctx.acting_user(&conn)?;
    let dms = query::list_dms(&conn, &owner.id)?;
    render_list("Dungeon masters", &dms, ctx.output)
}

fn run_update(args: &UpdateArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let actor = ctx.acting_user(&conn)?;
    let current = write::require_dm(&conn, &actor, &args.dm)?;
    let draft = DmDraft {
        name: clean(args.name.as_ref()).unwrap_or_else(|| current.name.clone()),
        dci: if args.clear_dci {
            None
        } else {
            clean(args.dci.as_ref()).or_else(|| current.dci.clone())
        },
    };
    let dm = write::update_dm(&conn, &actor, &current.id, &draft)?;
    render_dm(ctx, &dm)
}

fn run_delete(args: &DeleteArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let actor = ctx.acting_user(&conn)?;
    let dm = write::require_dm(&conn, &actor, &args.dm)?;
    write::delete_dm(&conn, &actor, &dm.id)?;
    render_success(ctx.output, ctx.quiet, &format!("deleted dungeon master {}", dm.name))
}

fn render_dm(ctx: &Context, dm: &DungeonMaster) -> Result<()> {
    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    render_mode(
        ctx.output,
        dm,
        |d, w| writeln!(w, "{}\t{}\t{}", d.id, d.name, or_dash(d.dci.as_deref())),
        |d, w| {
            pretty_section(w, &d.name)?;
            pretty_kv(w, "ID", &d.id)?;
            pretty_kv(w, "DCI", or_dash(d.dci.as_deref()))
        },
    )
}
