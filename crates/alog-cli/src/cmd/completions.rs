//! `alog completions`: shell completion scripts for every subcommand.

use anyhow::{Context as _, Result};
use clap::Args;
use clap_complete::{Shell, generate};
use std::io::Write;

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `command` to `out`, registered under
/// the command's own name.
///
/// # Errors
///
/// Returns an error if flushing `out` fails.
pub fn write_completions(shell: Shell, command: &mut clap::Command, out: &mut dyn Write) -> Result<()> {
    let bin = command.get_name().to_string();
    generate(shell, command, bin, out);
    out.flush().context("flush completion script")
}

/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn run_completions(args: &CompletionsArgs, command: &mut clap::Command) -> Result<()> {
    tracing::debug!(shell = %args.shell, "generating completions");
    let stdout = std::io::stdout();
    write_completions(args.shell, command, &mut stdout.lock())
}
