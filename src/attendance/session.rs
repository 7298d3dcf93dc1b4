//! The in-progress side of an attendance session.
//!
//! A `SessionDraft` moves Draft -> EventTypeChosen -> Marking, or starts in
//! Editing when reopened from stored records. Each transition borrows the
//! draft and returns a new one, so a rejected step never disturbs the value
//! the caller already holds. Finalizing and deleting live in `store`.

use std::fmt;

use chrono::NaiveDateTime;

use crate::error::{DangerError, Result, ValidationError};
use crate::models::{Alliance, RosterMember};

use super::event::{parse_event_date, AttendanceStatus, EventType, Legion};
use super::selection::{Mark, Selection};
use super::AttendanceRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Name (and maybe date) collected, no event type yet.
    Draft,
    /// Event type chosen, still waiting on a legion.
    EventTypeChosen,
    Marking,
    /// A finalized session reopened for changes.
    Editing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Draft => "waiting for an event type",
            SessionState::EventTypeChosen => "waiting for a legion",
            SessionState::Marking => "being marked",
            SessionState::Editing => "being edited",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegionSlot {
    Unset,
    Chosen(Option<Legion>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftMode {
    New,
    Editing { session_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDraft {
    pub alliance: Alliance,
    pub name: String,
    pub event_date: Option<NaiveDateTime>,
    pub event_type: Option<EventType>,
    pub legion: LegionSlot,
    pub selection: Selection,
    pub mode: DraftMode,
}

/// Trims and checks a session name.
pub fn validate_name(name: &str) -> std::result::Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name.to_string())
}

/// Parses an optional user supplied date. Blank counts as not supplied.
pub fn validate_date(date: Option<&str>) -> std::result::Result<Option<NaiveDateTime>, ValidationError> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => parse_event_date(d).map(Some),
        None => Ok(None),
    }
}

impl SessionDraft {
    pub fn new(alliance: Alliance, name: &str, date: Option<&str>) -> Result<Self> {
        Ok(Self {
            alliance,
            name: validate_name(name)?,
            event_date: validate_date(date)?,
            event_type: None,
            legion: LegionSlot::Unset,
            selection: Selection::new(),
            mode: DraftMode::New,
        })
    }

    /// Reopens a finalized session. Present and absent records seed the
    /// selection; everything else stays unmarked.
    pub fn editing(alliance: Alliance, records: &[AttendanceRecord]) -> Result<Self> {
        let first = records
            .first()
            .ok_or_else(|| DangerError::NoRecords(alliance.name.clone()))?;

        let mut selection = Selection::new();
        for record in records.iter().filter(|r| r.status.is_marked()) {
            selection.insert(record.player_id, Mark {
                nickname: record.player_name.clone(),
                status: record.status,
                points: record.points,
            });
        }

        Ok(Self {
            alliance,
            name: first.session_name.clone(),
            event_date: first.event_date,
            event_type: Some(first.event_type),
            legion: LegionSlot::Chosen(first.legion),
            selection,
            mode: DraftMode::Editing { session_id: first.session_id.clone() },
        })
    }

    pub fn state(&self) -> SessionState {
        if let DraftMode::Editing { .. } = self.mode {
            return SessionState::Editing;
        }
        match (self.event_type, self.legion) {
            (None, _) => SessionState::Draft,
            (Some(t), LegionSlot::Unset) if t.needs_legion() => SessionState::EventTypeChosen,
            _ => SessionState::Marking,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match &self.mode {
            DraftMode::New => None,
            DraftMode::Editing { session_id } => Some(session_id),
        }
    }

    pub fn legion(&self) -> Option<Legion> {
        match self.legion {
            LegionSlot::Chosen(legion) => legion,
            LegionSlot::Unset => None,
        }
    }

    /// Picks the event type. Legion events go on to wait for a legion,
    /// everything else is ready for marking.
    pub fn with_event_type(&self, event_type: EventType) -> Result<Self> {
        match self.state() {
            SessionState::Editing => return Err(self.wrong_state()),
            SessionState::Marking if !self.selection.is_empty() => return Err(self.wrong_state()),
            _ => {}
        }

        let legion = if event_type.needs_legion() {
            LegionSlot::Unset
        } else {
            LegionSlot::Chosen(None)
        };

        Ok(Self {
            event_type: Some(event_type),
            legion,
            ..self.clone()
        })
    }

    /// Picks a legion, or explicitly none.
    pub fn with_legion(&self, legion: Option<Legion>) -> Result<Self> {
        let event_type = self.event_type.ok_or(ValidationError::EventTypeRequired)?;
        if !event_type.needs_legion() {
            return Err(ValidationError::LegionNotApplicable(event_type.to_string()).into());
        }
        if self.state() != SessionState::EventTypeChosen {
            return Err(self.wrong_state());
        }

        Ok(Self {
            legion: LegionSlot::Chosen(legion),
            ..self.clone()
        })
    }

    pub fn with_marks(
        &self,
        players: &[RosterMember],
        status: AttendanceStatus,
        points: Option<&str>,
    ) -> Result<Self> {
        self.ensure_marking()?;

        Ok(Self {
            selection: self.selection.mark(players, status, points)?,
            ..self.clone()
        })
    }

    pub fn without_mark(&self, player_id: i64) -> Result<Self> {
        self.ensure_marking()?;

        Ok(Self {
            selection: self.selection.unmark(player_id),
            ..self.clone()
        })
    }

    /// Checks the draft can be committed: marking is open and somebody has
    /// been marked present or absent.
    pub fn ensure_ready(&self) -> Result<()> {
        self.ensure_marking()?;
        if !self.selection.has_attendance() {
            return Err(ValidationError::NothingMarked.into());
        }
        Ok(())
    }

    fn ensure_marking(&self) -> Result<()> {
        match self.state() {
            SessionState::Marking | SessionState::Editing => Ok(()),
            SessionState::Draft => Err(ValidationError::EventTypeRequired.into()),
            SessionState::EventTypeChosen => Err(ValidationError::LegionRequired(
                self.event_type.map(|t| t.to_string()).unwrap_or_default(),
            )
            .into()),
        }
    }

    fn wrong_state(&self) -> DangerError {
        ValidationError::WrongState(self.state().to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alliance() -> Alliance {
        Alliance { alliance_id: 1, name: "DNG".to_string() }
    }

    fn members() -> Vec<RosterMember> {
        ["A", "B", "C"]
            .iter()
            .enumerate()
            .map(|(i, n)| RosterMember {
                player_id: i as i64 + 1,
                nickname: n.to_string(),
                furnace_level: 30,
                alliance_id: 1,
            })
            .collect()
    }

    fn validation(err: DangerError) -> ValidationError {
        match err {
            DangerError::Validation(v) => v,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_blank_names_and_bad_dates() {
        let err = SessionDraft::new(alliance(), "   ", None).unwrap_err();
        assert_eq!(validation(err), ValidationError::EmptyName);

        let err = SessionDraft::new(alliance(), "Foundry W1", Some("tomorrow")).unwrap_err();
        assert_eq!(validation(err), ValidationError::InvalidDate("tomorrow".to_string()));

        let draft = SessionDraft::new(alliance(), "  Foundry W1 ", Some("")).unwrap();
        assert_eq!(draft.name, "Foundry W1");
        assert_eq!(draft.event_date, None);
        assert_eq!(draft.state(), SessionState::Draft);
    }

    #[test]
    fn legion_events_wait_for_a_legion() {
        let draft = SessionDraft::new(alliance(), "Foundry", None)
            .unwrap()
            .with_event_type(EventType::Foundry)
            .unwrap();
        assert_eq!(draft.state(), SessionState::EventTypeChosen);

        let err = draft.with_marks(&members(), AttendanceStatus::Absent, None).unwrap_err();
        assert_eq!(validation(err), ValidationError::LegionRequired("Foundry".to_string()));

        let draft = draft.with_legion(None).unwrap();
        assert_eq!(draft.state(), SessionState::Marking);
        assert_eq!(draft.legion(), None);
        assert_eq!(draft.legion, LegionSlot::Chosen(None));
    }

    #[test]
    fn other_events_go_straight_to_marking() {
        let draft = SessionDraft::new(alliance(), "Joe", None)
            .unwrap()
            .with_event_type(EventType::CrazyJoe)
            .unwrap();
        assert_eq!(draft.state(), SessionState::Marking);

        let err = draft.with_legion(Some(Legion::One)).unwrap_err();
        assert_eq!(validation(err), ValidationError::LegionNotApplicable("Crazy Joe".to_string()));
    }

    #[test]
    fn cannot_mark_before_choosing_event_type() {
        let draft = SessionDraft::new(alliance(), "x", None).unwrap();
        let err = draft.with_marks(&members(), AttendanceStatus::Absent, None).unwrap_err();
        assert_eq!(validation(err), ValidationError::EventTypeRequired);
    }

    #[test]
    fn finalize_needs_at_least_one_mark() {
        let draft = SessionDraft::new(alliance(), "Trap", None)
            .unwrap()
            .with_event_type(EventType::BearTrap)
            .unwrap();
        assert_eq!(validation(draft.ensure_ready().unwrap_err()), ValidationError::NothingMarked);

        let draft = draft
            .with_marks(&members()[..1], AttendanceStatus::Present, Some("500"))
            .unwrap();
        assert!(draft.ensure_ready().is_ok());

        let draft = draft.without_mark(1).unwrap();
        assert_eq!(validation(draft.ensure_ready().unwrap_err()), ValidationError::NothingMarked);
    }

    #[test]
    fn event_type_is_locked_once_marking_started() {
        let draft = SessionDraft::new(alliance(), "Trap", None)
            .unwrap()
            .with_event_type(EventType::BearTrap)
            .unwrap()
            .with_marks(&members()[..1], AttendanceStatus::Absent, None)
            .unwrap();
        assert!(draft.with_event_type(EventType::CrazyJoe).is_err());
    }
}
