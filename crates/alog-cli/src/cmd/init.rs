use crate::output::{OutputMode, render};
use alog_core::config;
use alog_core::db::{self, STORE_DIR, migrations};
use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {}

#[derive(Debug, Serialize)]
struct InitReport {
    store: String,
    created_store: bool,
    wrote_config: bool,
    schema_version: u32,
}

const GITIGNORE: &str = "alog.db\nalog.db-wal\nalog.db-shm\n";

/// Execute `alog init`. Creates the project skeleton:
///
/// ```text
/// .alog/
///   alog.db        (SQLite store, migrated to the latest schema)
///   config.toml    (default project config, kept if present)
///   .gitignore     (store files)
/// ```
///
/// Running it again only applies pending migrations.
///
/// # Errors
///
/// Returns an error if any filesystem or store operation fails.
pub fn run_init(_args: &InitArgs, project_root: &Path, output: OutputMode, quiet: bool) -> Result<()> {
    let store = db::store_path(project_root);
    let created_store = !store.exists();

    let conn = db::open_store(&store)?;
    let schema_version = migrations::current_schema_version(&conn).context("read schema version")?;
    let wrote_config = config::write_default_project_config(project_root)?;

    let gitignore = project_root.join(STORE_DIR).join(".gitignore");
    if !gitignore.exists() {
        std::fs::write(&gitignore, GITIGNORE)
            .with_context(|| format!("Failed to write {}", gitignore.display()))?;
    }

    tracing::info!(store = %store.display(), created_store, schema_version, "initialized project");

    let report = InitReport {
        store: store.display().to_string(),
        created_store,
        wrote_config,
        schema_version,
    };
    render(output, &report, |r, w| {
        if quiet {
            return Ok(());
        }
        if r.created_store {
            writeln!(w, "✓ Initialized {STORE_DIR}/ (schema v{})", r.schema_version)?;
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(w, "  alog user add --name \"Your Name\" --email you@example.com")?;
            writeln!(w, "  export ALOG_USER=you@example.com")?;
            writeln!(w, "  alog character create \"Brisk Underbough\" --class Rogue")?;
        } else {
            writeln!(w, "✓ {STORE_DIR}/ already initialized (schema v{})", r.schema_version)?;
        }
        Ok(())
    })
}
