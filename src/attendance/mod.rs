//! Alliance attendance: sessions, per-player records and the reports built
//! from them.

pub mod drafts;
pub mod event;
pub mod export;
pub mod points;
pub mod report;
pub mod selection;
pub mod session;
pub mod sort;
pub mod store;

pub use drafts::DraftStore;
pub use event::{AttendanceStatus, EventType, Legion};
pub use selection::{Mark, Selection};
pub use session::{SessionDraft, SessionState};
pub use sort::SortOrder;

use chrono::NaiveDateTime;

use crate::error::{DangerError, Result};
use crate::models::DbRecord;

/// Who marked a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub user_id: i64,
    pub username: String,
}

/// A decoded attendance row. Session attributes are repeated on every row
/// of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub session_id: String,
    pub session_name: String,
    pub event_type: EventType,
    pub legion: Option<Legion>,
    pub event_date: Option<NaiveDateTime>,
    pub player_id: i64,
    pub player_name: String,
    pub alliance_id: i64,
    pub alliance_name: String,
    pub status: AttendanceStatus,
    pub points: i64,
    pub marked_at: NaiveDateTime,
    pub marked_by: Marker,
}

impl TryFrom<DbRecord> for AttendanceRecord {
    type Error = DangerError;

    fn try_from(row: DbRecord) -> Result<Self> {
        let event_type = row.event_type.parse::<EventType>().map_err(|_| DangerError::InvalidStoredValue {
            column: "event_type",
            value: row.event_type.clone(),
        })?;
        let legion = match row.event_subtype.as_deref() {
            Some(subtype) => Some(subtype.parse::<Legion>().map_err(|_| DangerError::InvalidStoredValue {
                column: "event_subtype",
                value: subtype.to_string(),
            })?),
            None => None,
        };
        let status = row.status.parse::<AttendanceStatus>().map_err(|_| DangerError::InvalidStoredValue {
            column: "status",
            value: row.status.clone(),
        })?;

        Ok(Self {
            session_id: row.session_id,
            session_name: row.session_name,
            event_type,
            legion,
            event_date: row.event_date,
            player_id: row.player_id,
            player_name: row.player_name,
            alliance_id: row.alliance_id,
            alliance_name: row.alliance_name,
            status,
            points: row.points,
            marked_at: row.marked_at,
            marked_by: Marker {
                user_id: row.marked_by,
                username: row.marked_by_username,
            },
        })
    }
}

/// One line of the session list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: String,
    pub session_name: String,
    pub event_type: EventType,
    pub legion: Option<Legion>,
    pub event_date: Option<NaiveDateTime>,
    pub present: usize,
    pub absent: usize,
    pub not_recorded: usize,
}

impl SessionSummary {
    /// "Foundry (Legion 1)" style label.
    pub fn event_label(&self) -> String {
        event_label(self.event_type, self.legion)
    }
}

pub fn event_label(event_type: EventType, legion: Option<Legion>) -> String {
    match legion {
        Some(legion) => format!("{} ({})", event_type, legion),
        None => event_type.to_string(),
    }
}
