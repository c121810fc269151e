//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: framed output for humans, compact rows for pipes, or stable
//! JSON.
//!
//! The mode itself is settled by `alog_core::config::resolve_config`
//! (`--format` > `--json` > `FORMAT` > user config > TTY detection); this
//! module only maps the resolved name onto [`OutputMode`].

use alog_core::AlogError;
use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, rules, aligned fields).
    Pretty,
    /// Tab-separated rows for scripts and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Map a resolved mode name onto a mode. Unknown names fall back to text.
    pub fn from_resolved(name: &str) -> Self {
        match name {
            "pretty" => Self::Pretty,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Implemented by list rows that render in all modes.
///
/// [`render_list`] dispatches to these methods based on [`OutputMode`].
pub trait Renderable: Serialize {
    /// Render for human consumption.
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Render as a single text row, columns matching [`Renderable::table_headers`].
    fn render_table(&self, w: &mut dyn Write) -> io::Result<()>;

    fn table_headers() -> &'static [&'static str]
    where
        Self: Sized,
    {
        &[]
    }
}

/// Render a list of [`Renderable`] rows to stdout.
///
/// - JSON mode writes one array.
/// - Text mode writes a header line and one row per item.
/// - Pretty mode renders items sequentially under a section heading.
pub fn render_list<R: Renderable>(heading: &str, items: &[R], mode: OutputMode) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, items)?;
            writeln!(out)?;
        }
        OutputMode::Text => {
            if !items.is_empty() {
                writeln!(out, "{}", R::table_headers().join("\t"))?;
            }
            for item in items {
                item.render_table(&mut out)?;
            }
        }
        OutputMode::Pretty => {
            pretty_section(&mut out, &format!("{heading} ({})", items.len()))?;
            if items.is_empty() {
                writeln!(out, "(none)")?;
            }
            for item in items {
                item.render_human(&mut out)?;
            }
        }
    }
    Ok(())
}

/// Render a serializable value with explicit text and pretty renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render a value whose text and pretty forms are the same.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
    } else {
        human_fn(value, &mut out)?;
    }
    Ok(())
}

/// A structured error with optional suggestion, code and form field.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Stable machine code (`E####`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// HTTP-like status of the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Input field the error is attached to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
            status: None,
            field: None,
        }
    }

    /// Build from any error, using the typed details when an [`AlogError`]
    /// is somewhere in the chain.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<AlogError>())
            .map_or_else(|| Self::new(format!("{err:#}")), Self::from)
    }
}

impl From<&AlogError> for CliError {
    fn from(err: &AlogError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: Some(err.suggestion()),
            error_code: Some(err.code().code().to_string()),
            status: Some(err.status()),
            field: err.field(),
        }
    }
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    if mode.is_json() {
        let wrapper = serde_json::json!({ "error": error });
        serde_json::to_writer_pretty(&mut out, &wrapper)?;
        writeln!(out)?;
    } else {
        match error.field {
            Some(field) => writeln!(out, "error: {} (field: {field})", error.message)?,
            None => writeln!(out, "error: {}", error.message)?,
        }
        if let Some(ref suggestion) = error.suggestion {
            writeln!(out, "  suggestion: {suggestion}")?;
        }
    }
    Ok(())
}

/// Render a success message to stdout. `--quiet` suppresses it outside JSON
/// mode.
pub fn render_success(mode: OutputMode, quiet: bool, message: &str) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if mode.is_json() {
        let wrapper = serde_json::json!({ "ok": true, "message": message });
        serde_json::to_writer_pretty(&mut out, &wrapper)?;
        writeln!(out)?;
    } else if !quiet {
        writeln!(out, "✓ {message}")?;
    }
    Ok(())
}

/// Placeholder for absent optional values in human output.
pub fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_names_map_to_modes() {
        assert_eq!(OutputMode::from_resolved("pretty"), OutputMode::Pretty);
        assert_eq!(OutputMode::from_resolved("json"), OutputMode::Json);
        assert_eq!(OutputMode::from_resolved("text"), OutputMode::Text);
        assert_eq!(OutputMode::from_resolved("bogus"), OutputMode::Text);
        for mode in [OutputMode::Pretty, OutputMode::Text, OutputMode::Json] {
            assert_eq!(OutputMode::from_resolved(mode.as_str()), mode);
        }
    }

    #[test]
    fn pretty_kv_aligns_keys() {
        let mut buf = Vec::new();
        pretty_kv(&mut buf, "Name", "Brisk").expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "Name:          Brisk\n");
    }

    #[test]
    fn validation_errors_carry_field_and_status() {
        let err = AlogError::validation("date", "is not a date");
        let cli = CliError::from(&err);
        assert_eq!(cli.field, Some("date"));
        assert_eq!(cli.status, Some(422));
        assert_eq!(cli.error_code.as_deref(), Some("E2002"));
    }

    #[test]
    fn typed_errors_survive_context_wrapping() {
        let err = anyhow::Error::new(AlogError::not_found("character", "Brisk"))
            .context("show character");
        let cli = CliError::from_anyhow(&err);
        assert_eq!(cli.status, Some(404));
        assert_eq!(cli.message, "character 'Brisk' not found");
        assert!(cli.suggestion.is_some_and(|s| s.contains("alog character list")));
    }

    #[test]
    fn untyped_errors_keep_their_chain() {
        let err = anyhow::anyhow!("disk full").context("write export");
        let cli = CliError::from_anyhow(&err);
        assert_eq!(cli.message, "write export: disk full");
        assert!(cli.error_code.is_none());
    }

    #[test]
    fn cli_error_json_omits_empty_fields() {
        let json = serde_json::to_value(CliError::new("boom")).expect("serialize");
        assert_eq!(json, serde_json::json!({ "message": "boom" }));
    }
}
