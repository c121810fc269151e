use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Account role. Admins may modify records owned by other users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Whether a log records a played session or a between-session activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    #[default]
    Game,
    Nongame,
}

impl LogType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Nongame => "nongame",
        }
    }
}

/// The two sub-ledgers carried by every log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    MagicItem,
    StoryAward,
}

impl ItemKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MagicItem => "magic_item",
            Self::StoryAward => "story_award",
        }
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseEnumError {
                expected: "role",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for LogType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "game" => Ok(Self::Game),
            "nongame" | "non-game" => Ok(Self::Nongame),
            _ => Err(ParseEnumError {
                expected: "log type",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for ItemKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "magic_item" | "magic-item" | "item" => Ok(Self::MagicItem),
            "story_award" | "story-award" | "award" => Ok(Self::StoryAward),
            _ => Err(ParseEnumError {
                expected: "item kind",
                got: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at_us: i64,
}

impl User {
    /// Whether this user may modify a record owned by `owner_id`.
    #[must_use]
    pub fn can_modify(&self, owner_id: &str) -> bool {
        self.role == Role::Admin || self.id == owner_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub race: Option<String>,
    pub class: Option<String>,
    pub campaign: Option<String>,
    pub sheet_url: Option<String>,
    pub image_url: Option<String>,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonMaster {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub dci: Option<String>,
    /// Marks the owning user's own DM record.
    pub is_user: bool,
    pub created_at_us: i64,
}

/// A magic item or story award, tagged with the logs that gained and lost it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerItem {
    pub id: String,
    pub kind: ItemKind,
    pub name: String,
    pub description: Option<String>,
    pub log_gained_id: String,
    pub log_lost_id: Option<String>,
}

/// A dated journal entry for a character or a DM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub log_type: LogType,
    pub date_us: i64,
    /// Date a DM log was applied to a character; orders the log in that
    /// character's history.
    pub applied_date_us: Option<i64>,
    pub is_dm_log: bool,
    pub character_id: Option<String>,
    pub dm_id: Option<String>,
    pub dm_name: Option<String>,
    pub experience: i64,
    pub acp: i64,
    pub tcp: i64,
    pub level: i64,
    pub gold: f64,
    pub dtd: i64,
    pub description: Option<String>,
    /// Items first recorded by this log, in entry order.
    pub gained: Vec<LedgerItem>,
    /// Items whose `log_lost_id` points at this log.
    pub lost: Vec<LedgerItem>,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

impl Log {
    /// Date that places this log in a character's history.
    #[must_use]
    pub fn effective_date_us(&self) -> i64 {
        self.applied_date_us.unwrap_or(self.date_us)
    }

    /// Chronological sort key: effective date, then creation, then id.
    #[must_use]
    pub fn sort_key(&self) -> (i64, i64, &str) {
        (self.effective_date_us(), self.created_at_us, self.id.as_str())
    }

    pub fn gained_of(&self, kind: ItemKind) -> impl Iterator<Item = &LedgerItem> {
        self.gained.iter().filter(move |item| item.kind == kind)
    }

    pub fn lost_of(&self, kind: ItemKind) -> impl Iterator<Item = &LedgerItem> {
        self.lost.iter().filter(move |item| item.kind == kind)
    }
}

/// Sort logs into chronological order in place.
pub fn sort_chronologically(logs: &mut [Log]) {
    logs.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}
