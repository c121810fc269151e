//! `alog search`: ranked free-text search over your records.

use super::Context;
use crate::output::{pretty_section, render_mode};
use alog_search::{SearchHit, search_user};
use anyhow::Result;
use clap::Args;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query terms; wrap a phrase in double quotes.
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Maximum hits; defaults to `[search] limit`.
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

/// Execute `alog search <query…>`.
///
/// # Errors
///
/// Returns store errors.
pub fn run_search(args: &SearchArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let owner = ctx.acting_user(&conn)?;
    let query = args.query.join(" ");
    let limit = args.limit.unwrap_or(ctx.config.project.search.limit);

    let hits = search_user(&conn, &owner.id, &query, limit)?;
    tracing::debug!(query = %query, hits = hits.len(), "search finished");

    render_mode(
        ctx.output,
        &hits,
        |hits, w| render_text(hits, w),
        |hits, w| render_human(&query, hits, w),
    )
}

fn render_text(hits: &[SearchHit], w: &mut dyn Write) -> io::Result<()> {
    for hit in hits {
        writeln!(
            w,
            "{}\t{}\t{:.2}\t{}\t{}",
            hit.kind.as_str(),
            hit.id,
            hit.score,
            hit.title,
            hit.matched_fields.join(",")
        )?;
    }
    Ok(())
}

fn render_human(query: &str, hits: &[SearchHit], w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Results for \"{query}\" ({})", hits.len()))?;
    if hits.is_empty() {
        writeln!(w, "(no matches)")?;
    }
    for hit in hits {
        writeln!(w, "{:<10} {}  [{}]", hit.kind.as_str(), hit.title, hit.id)?;
        if let Some(subtitle) = &hit.subtitle {
            writeln!(w, "           {subtitle}")?;
        }
        writeln!(
            w,
            "           matched {}  (score {:.1})",
            hit.matched_fields.join(", "),
            hit.score
        )?;
    }
    Ok(())
}
