//! `alog user`: register and inspect accounts.

use super::Context;
use crate::output::{Renderable, pretty_kv, pretty_section, render_list, render_mode};
use alog_core::db::{query, write};
use alog_core::model::time::format_date;
use alog_core::model::{Role, User, UserDraft};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a user.
    Add(AddArgs),
    /// List registered users.
    List,
    /// Show a user (defaults to the acting user).
    Show(ShowArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    /// Grant the admin role (may modify other users' records).
    #[arg(long)]
    pub admin: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// User id or email.
    #[arg(value_name = "USER")]
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
struct UserRow<'a> {
    #[serde(flatten)]
    user: &'a User,
    characters: usize,
}

impl Renderable for UserRow<'_> {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{:<28} {:<32} {:<6} {} characters",
            self.user.name,
            self.user.email,
            self.user.role,
            self.characters
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            self.user.id, self.user.name, self.user.email, self.user.role, self.characters
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["id", "name", "email", "role", "characters"]
    }
}

/// # Errors
///
/// Returns store, validation or lookup errors.
pub fn run_user(command: &UserCommand, ctx: &Context) -> Result<()> {
    match command {
        UserCommand::Add(args) => run_add(args, ctx),
        UserCommand::List => run_list(ctx),
        UserCommand::Show(args) => run_show(args, ctx),
    }
}

fn run_add(args: &AddArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let draft = UserDraft {
        name: args.name.trim().to_string(),
        email: args.email.trim().to_string(),
        role: if args.admin { Role::Admin } else { Role::User },
    };
    let user = write::create_user(&conn, &draft)?;
    render_user(ctx, &user)
}

fn run_list(ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let users = query::list_users(&conn)?;
    let rows = users
        .iter()
        .map(|user| {
            Ok(UserRow {
                user,
                characters: query::list_characters(&conn, &user.id)?.len(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    render_list("Users", &rows, ctx.output)
}

fn run_show(args: &ShowArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let user = match args.key.as_deref() {
        Some(key) => write::require_user(&conn, key)?,
        None => ctx.acting_user(&conn)?,
    };
    render_user(ctx, &user)
}

fn render_user(ctx: &Context, user: &User) -> Result<()> {
    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    render_mode(
        ctx.output,
        user,
        |u, w| writeln!(w, "{}\t{}\t{}\t{}", u.id, u.name, u.email, u.role),
        |u, w| {
            pretty_section(w, &u.name)?;
            pretty_kv(w, "ID", &u.id)?;
            pretty_kv(w, "Email", &u.email)?;
            pretty_kv(w, "Role", u.role.as_str())?;
            pretty_kv(w, "Joined", format_date(u.created_at_us))
        },
    )
}
