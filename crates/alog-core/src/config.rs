use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::db::STORE_DIR;
use crate::ledger::levels::MAX_LEVEL;

/// Project config file name inside [`STORE_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub characters: CharacterConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Level cap applied to summaries.
    #[serde(default = "default_max_level")]
    pub max_level: i64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_level: default_max_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of hits returned by `alog search`.
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_search_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterConfig {
    /// Campaign filled in when `character create` is given none.
    #[serde(default)]
    pub default_campaign: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pretty: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    /// Acting user (id or email) when neither `--user` nor `ALOG_USER` is set.
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

#[must_use]
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(STORE_DIR).join(CONFIG_FILE)
}

/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_config_path(project_root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write a default project config unless one already exists.
///
/// Returns `true` when a file was written.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_default_project_config(project_root: &Path) -> Result<bool> {
    let path = project_config_path(project_root);
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(&ProjectConfig::default())
        .context("Failed to serialize default config")?;
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("alog/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load both config layers and settle the output mode.
///
/// # Errors
///
/// Returns an error if either config file is unreadable.
pub fn resolve_config(
    project_root: &Path,
    cli_format: Option<&str>,
    cli_json: bool,
) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_format, cli_json, user.output.clone(), env_format);

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

/// Normalize an output mode name, accepting a few aliases.
#[must_use]
pub fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "plain" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

fn resolve_output(
    cli_format: Option<&str>,
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> String {
    if let Some(mode) = cli_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

const fn default_true() -> bool {
    true
}

const fn default_max_level() -> i64 {
    MAX_LEVEL
}

const fn default_search_limit() -> usize {
    20
}
