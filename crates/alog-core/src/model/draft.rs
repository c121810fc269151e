//! Submitted (not yet persisted) records and their field-level validation.
//!
//! Drafts are what a form or a CLI invocation produces. Validation runs before
//! any write and reports the first offending field.

use super::records::{ItemKind, LogType, Role};
use crate::error::{AlogError, Result};

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 5_000;
pub const MAX_ITEMS_PER_LOG: usize = 50;
pub const MAX_LEVEL_DELTA: i64 = 20;

#[derive(Debug, Clone, Default)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct CharacterDraft {
    pub name: String,
    pub race: Option<String>,
    pub class: Option<String>,
    pub campaign: Option<String>,
    pub sheet_url: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DmDraft {
    pub name: String,
    pub dci: Option<String>,
}

/// An item entered on a log. `id` is set when editing an existing entry.
#[derive(Debug, Clone)]
pub struct ItemDraft {
    pub id: Option<String>,
    pub kind: ItemKind,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LogDraft {
    /// Existing log to replace; `None` creates a new log.
    pub id: Option<String>,
    pub name: String,
    pub log_type: LogType,
    pub date_us: i64,
    pub applied_date_us: Option<i64>,
    pub is_dm_log: bool,
    pub character_id: Option<String>,
    /// DM by name; matched case-insensitively against the owner's DMs and
    /// created when absent. Ignored for DM logs, which use the self record.
    pub dm_name: Option<String>,
    pub dm_dci: Option<String>,
    pub experience: i64,
    pub acp: i64,
    pub tcp: i64,
    pub level: i64,
    pub gold: f64,
    pub dtd: i64,
    pub description: Option<String>,
    pub gained: Vec<ItemDraft>,
    /// IDs of previously gained items this log loses.
    pub lost_ids: Vec<String>,
}

fn validate_name(field: &'static str, s: &str) -> Result<()> {
    if s.trim().is_empty() {
        return Err(AlogError::validation(field, "must not be empty"));
    }
    if s.trim() != s {
        return Err(AlogError::validation(
            field,
            "must not start or end with whitespace",
        ));
    }
    if s.chars().count() > MAX_NAME_LEN {
        return Err(AlogError::validation(
            field,
            format!("must be <= {MAX_NAME_LEN} characters"),
        ));
    }
    if s.chars().any(char::is_control) {
        return Err(AlogError::validation(
            field,
            "must not contain control characters",
        ));
    }
    Ok(())
}

fn validate_optional_text(field: &'static str, s: Option<&str>, max: usize) -> Result<()> {
    if let Some(s) = s {
        if s.chars().count() > max {
            return Err(AlogError::validation(
                field,
                format!("must be <= {max} characters"),
            ));
        }
    }
    Ok(())
}

fn validate_url(field: &'static str, s: Option<&str>) -> Result<()> {
    if let Some(url) = s {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(AlogError::validation(field, "must be an http(s) URL"));
        }
    }
    Ok(())
}

impl UserDraft {
    /// # Errors
    ///
    /// Returns a validation error for an empty name or a malformed email.
    pub fn validate(&self) -> Result<()> {
        validate_name("name", &self.name)?;
        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !well_formed || email.chars().any(char::is_whitespace) {
            return Err(AlogError::validation("email", "must be an email address"));
        }
        Ok(())
    }
}

impl CharacterDraft {
    /// # Errors
    ///
    /// Returns a validation error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        validate_name("name", &self.name)?;
        validate_optional_text("race", self.race.as_deref(), MAX_NAME_LEN)?;
        validate_optional_text("class", self.class.as_deref(), MAX_NAME_LEN)?;
        validate_optional_text("campaign", self.campaign.as_deref(), MAX_NAME_LEN)?;
        validate_url("sheet_url", self.sheet_url.as_deref())?;
        validate_url("image_url", self.image_url.as_deref())
    }
}

impl DmDraft {
    /// # Errors
    ///
    /// Returns a validation error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        validate_name("name", &self.name)?;
        validate_optional_text("dci", self.dci.as_deref(), 32)
    }
}

impl LogDraft {
    /// # Errors
    ///
    /// Returns a validation error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        validate_name("name", &self.name)?;
        validate_optional_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)?;

        if !self.is_dm_log && self.character_id.is_none() {
            return Err(AlogError::validation(
                "character",
                "a character log must name its character",
            ));
        }
        if self.applied_date_us.is_some() && !self.is_dm_log {
            return Err(AlogError::validation(
                "applied_date",
                "only DM logs can be applied to a character",
            ));
        }
        if let Some(applied) = self.applied_date_us {
            if applied < self.date_us {
                return Err(AlogError::validation(
                    "applied_date",
                    "must not be earlier than the log date",
                ));
            }
        }
        if self.is_dm_log && self.character_id.is_none() && !self.lost_ids.is_empty() {
            return Err(AlogError::validation(
                "lost_items",
                "a DM log must be applied to a character before it can lose items",
            ));
        }

        for (field, value) in [
            ("experience", self.experience),
            ("acp", self.acp),
            ("tcp", self.tcp),
            ("dtd", self.dtd),
        ] {
            if value.abs() > 1_000_000 {
                return Err(AlogError::validation(field, "is out of range"));
            }
        }
        if !(0..=MAX_LEVEL_DELTA).contains(&self.level) {
            return Err(AlogError::validation(
                "level",
                format!("must be between 0 and {MAX_LEVEL_DELTA}"),
            ));
        }
        if !self.gold.is_finite() {
            return Err(AlogError::validation("gold", "must be a finite number"));
        }

        if self.gained.len() > MAX_ITEMS_PER_LOG {
            return Err(AlogError::validation(
                "gained_items",
                format!("at most {MAX_ITEMS_PER_LOG} items per log"),
            ));
        }
        for item in &self.gained {
            match item.kind {
                ItemKind::MagicItem => validate_name("magic_item", &item.name)?,
                ItemKind::StoryAward => validate_name("story_award", &item.name)?,
            }
            validate_optional_text("description", item.description.as_deref(), MAX_DESCRIPTION_LEN)?;
        }

        let mut seen = std::collections::HashSet::new();
        for id in &self.lost_ids {
            if !seen.insert(id.as_str()) {
                return Err(AlogError::validation(
                    "lost_items",
                    format!("item '{id}' listed twice"),
                ));
            }
        }
        Ok(())
    }
}
