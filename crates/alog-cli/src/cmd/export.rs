//! `alog export`: everything you own as one JSON document.

use super::Context;
use alog_core::export::build_export;
use anyhow::{Context as _, Result};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Write to this file instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Single-line JSON regardless of `[export] pretty`.
    #[arg(long)]
    pub compact: bool,
}

/// Execute `alog export`. The document is always JSON.
///
/// # Errors
///
/// Returns store, serialization or write errors.
pub fn run_export(args: &ExportArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let owner = ctx.acting_user(&conn)?;
    let doc = build_export(&conn, &owner, ctx.max_level())?;

    let pretty = ctx.config.project.export.pretty && !args.compact;
    let mut body = if pretty {
        serde_json::to_string_pretty(&doc)
    } else {
        serde_json::to_string(&doc)
    }
    .context("serialize export")?;
    body.push('\n');

    match &args.output {
        Some(path) => {
            std::fs::write(path, &body)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), characters = doc.characters.len(), "wrote export");
            if !ctx.quiet && !ctx.output.is_json() {
                eprintln!("✓ exported {} characters to {}", doc.characters.len(), path.display());
            }
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            out.write_all(body.as_bytes()).context("write export to stdout")?;
        }
    }
    Ok(())
}
