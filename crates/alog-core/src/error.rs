use std::fmt;

/// Machine-readable error codes, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    UserRequired,
    NotFound,
    ValidationFailed,
    Forbidden,
    Conflict,
    InvalidLedger,
    StoreFailure,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::UserRequired => "E1003",
            Self::NotFound => "E2001",
            Self::ValidationFailed => "E2002",
            Self::Forbidden => "E2003",
            Self::Conflict => "E2004",
            Self::InvalidLedger => "E3001",
            Self::StoreFailure => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// HTTP-like status used when an error is surfaced to callers.
    #[must_use]
    pub const fn status(self) -> u16 {
        match self {
            Self::UserRequired => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::ValidationFailed | Self::InvalidLedger => 422,
            Self::NotInitialized
            | Self::ConfigParseError
            | Self::StoreFailure
            | Self::InternalUnexpected => 500,
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::UserRequired => "Acting user required",
            Self::NotFound => "Record not found",
            Self::ValidationFailed => "Validation failed",
            Self::Forbidden => "Not permitted",
            Self::Conflict => "Conflicting record state",
            Self::InvalidLedger => "Invalid item ledger reference",
            Self::StoreFailure => "Store read/write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to the user.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `alog init` in this directory first."),
            Self::ConfigParseError => Some("Fix syntax in .alog/config.toml and retry."),
            Self::UserRequired => Some("Pass --user, set ALOG_USER, or set `user` in the user config."),
            Self::NotFound => None,
            Self::ValidationFailed => Some("Correct the named field and retry."),
            Self::Forbidden => Some("Only the owner or an admin can change this record."),
            Self::Conflict => Some("Resolve the dependent records first."),
            Self::InvalidLedger => {
                Some("An item can only be lost by a log at or after the log that gained it.")
            }
            Self::StoreFailure => Some("Check that .alog/alog.db is writable and not corrupt."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by the service layer of `alog-core`.
#[derive(Debug, thiserror::Error)]
pub enum AlogError {
    #[error("no alog project found at {0}")]
    NotInitialized(String),

    #[error("{0}")]
    Config(String),

    #[error("an acting user is required for this command")]
    UserRequired,

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("user '{user_id}' may not modify {entity} '{id}'")]
    Forbidden {
        user_id: String,
        entity: &'static str,
        id: String,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("item '{item_id}' cannot be lost by log '{log_id}': {reason}")]
    InvalidLedger {
        item_id: String,
        log_id: String,
        reason: &'static str,
    },

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AlogError {
    /// Shorthand for a field-level validation failure.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Shorthand for a missing record.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized(_) => ErrorCode::NotInitialized,
            Self::Config(_) => ErrorCode::ConfigParseError,
            Self::UserRequired => ErrorCode::UserRequired,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::Conflict(_) => ErrorCode::Conflict,
            Self::InvalidLedger { .. } => ErrorCode::InvalidLedger,
            Self::Database(_) => ErrorCode::StoreFailure,
            Self::Other(_) => ErrorCode::StoreFailure,
        }
    }

    /// HTTP-like status for this error.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.code().status()
    }

    /// Form field the error is attached to, when it is field-level.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            Self::InvalidLedger { .. } => Some("lost_items"),
            _ => None,
        }
    }

    /// Remediation hint, falling back to the code's generic hint.
    #[must_use]
    pub fn suggestion(&self) -> String {
        match self {
            Self::NotFound { entity, .. } => format!("use `alog {entity} list` to see what exists"),
            _ => self
                .code()
                .hint()
                .unwrap_or_else(|| self.code().message())
                .to_string(),
        }
    }
}

pub type Result<T, E = AlogError> = std::result::Result<T, E>;
