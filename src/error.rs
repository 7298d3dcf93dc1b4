use std::{env::VarError, error::Error, num::ParseIntError};

use thiserror::Error;

/// Input the user can fix and resubmit. Nothing is mutated when one of
/// these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Session name cannot be empty")]
    EmptyName,

    #[error("Invalid date `{0}`, expected YYYY-MM-DD HH:MM")]
    InvalidDate(String),

    #[error("Invalid points value `{0}`, try something like 100, 4.3K or 2.5M")]
    InvalidPoints(String),

    #[error("Points are required when marking players present")]
    PointsRequired,

    #[error("No players selected")]
    EmptySelection,

    #[error("No attendance marked yet")]
    NothingMarked,

    #[error("Choose an event type first")]
    EventTypeRequired,

    #[error("Choose a legion (or none) for {0} first")]
    LegionRequired(String),

    #[error("{0} events do not have legions")]
    LegionNotApplicable(String),

    #[error("This can't be done while the session is {0}")]
    WrongState(String),

    #[error("Unknown {what} `{value}`")]
    UnknownValue { what: &'static str, value: String },
}

/// Coarse error categories, used by the command error handler to decide
/// what the user gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Permission,
    Storage,
    Internal,
}

#[derive(Error, Debug)]
pub enum DangerError {
    #[error("Database (diesel) error")]
    DbError (#[from] diesel::result::Error),

    #[error("Error connecting to database")]
    DbConnError (#[from] diesel::ConnectionError),

    #[error("Discord (serenity) error")]
    DiscordError (#[from] serenity::Error),

    #[error("Error retrieving environment variable `{key}`")]
    EnvVarError {
        key: String,
        #[source]
        source: VarError
    },

    #[error("Unable to convert `{snowflake}` into snowflake")]
    SnowflakeParseError {
        snowflake: String,
        source: ParseIntError,
    },

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Session `{0}` not found")]
    SessionNotFound(String),

    #[error("No attendance records found for `{0}`")]
    NoRecords(String),

    #[error("Alliance {0} not found")]
    AllianceNotFound(i64),

    #[error("Player {0} not found")]
    PlayerNotFound(i64),

    #[error("You don't have an attendance session in progress")]
    NoDraft,

    #[error("You don't have permission to manage alliance {0}")]
    NotAllianceAdmin(i64),

    #[error("Only global admins can do that")]
    NotGlobalAdmin,

    #[error("This command can only be used in a server")]
    GuildOnly,

    #[error("Stored value `{value}` is not a valid {column}")]
    InvalidStoredValue {
        column: &'static str,
        value: String,
    },

    #[error("Export error")]
    ExportError (#[from] csv::Error),

    #[error("Migration error")]
    MigrationError(Box<dyn Error + Send + Sync + 'static>),

    #[error("Other: {0}")]
    Other(String),
}

impl DangerError {
    pub fn kind(&self) -> ErrorKind {
        use DangerError::*;
        match self {
            Validation(_) => ErrorKind::Validation,
            SessionNotFound(_) | NoRecords(_) | AllianceNotFound(_) | PlayerNotFound(_) | NoDraft => {
                ErrorKind::NotFound
            }
            NotAllianceAdmin(_) | NotGlobalAdmin | GuildOnly => ErrorKind::Permission,
            DbError(_) | DbConnError(_) | MigrationError(_) | InvalidStoredValue { .. } => ErrorKind::Storage,
            DiscordError(_) | EnvVarError { .. } | SnowflakeParseError { .. } | ExportError(_) | Other(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Whether the message is safe and useful to show to the invoking user.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Permission
        )
    }
}

pub type Result<T> = core::result::Result<T, DangerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_user_facing() {
        let err = DangerError::from(ValidationError::InvalidPoints("abc".to_string()));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.is_user_facing());
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn storage_errors_are_not_user_facing() {
        let err = DangerError::from(diesel::result::Error::NotFound);
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!err.is_user_facing());
    }
}
