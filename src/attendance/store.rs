//! Persistence for finalized sessions.
//!
//! A session has no table of its own: its name, event type, legion and date
//! are repeated on every `attendance_records` row sharing its `session_id`.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DangerError, Result, ValidationError};
use crate::models::{DbRecord, NewDbRecord, RosterMember};
use crate::schema;

use super::event::{AttendanceStatus, EventType, Legion};
use super::session::{validate_date, validate_name, DraftMode, SessionDraft};
use super::{AttendanceRecord, Marker, SessionSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeOutcome {
    pub session_id: String,
    pub present: usize,
    pub absent: usize,
    pub not_recorded: usize,
    /// Rows inserted or changed.
    pub written: usize,
}

/// Commits a draft.
///
/// A new session gets a fresh id and one row per roster member: their
/// selected mark, or `not_recorded` with zero points. An edited session
/// only rewrites rows whose status or points changed, so untouched rows keep
/// their marker and timestamp. New and changed rows take the session name
/// and event details from the stored records.
pub fn finalize(
    conn: &mut SqliteConnection,
    draft: &SessionDraft,
    roster: &[RosterMember],
    marker: &Marker,
    now: NaiveDateTime,
) -> Result<FinalizeOutcome> {
    draft.ensure_ready()?;

    let event_type = draft.event_type.ok_or(ValidationError::EventTypeRequired)?;
    let legion = draft.legion();

    let (session_id, existing) = match &draft.mode {
        DraftMode::New => (Uuid::new_v4().to_string(), BTreeMap::new()),
        DraftMode::Editing { session_id } => {
            let existing: BTreeMap<i64, AttendanceRecord> = session_records(conn, session_id)?
                .into_iter()
                .map(|r| (r.player_id, r))
                .collect();
            if existing.is_empty() {
                return Err(DangerError::SessionNotFound(session_id.clone()));
            }
            (session_id.clone(), existing)
        }
    };

    // Every roster member and everyone already on record ends up with
    // exactly one row. Selected players who left the roster are dropped.
    let mut names: BTreeMap<i64, String> = BTreeMap::new();
    for (id, record) in &existing {
        names.insert(*id, record.player_name.clone());
    }
    for member in roster {
        names.insert(member.player_id, member.nickname.clone());
    }
    for (id, mark) in draft.selection.iter() {
        if !names.contains_key(&id) {
            warn!("Dropping mark for player {} ({}): no longer on the roster of {}", id, mark.nickname, draft.alliance.alliance_id);
        }
    }
    let marked = names
        .keys()
        .any(|id| draft.selection.get(*id).is_some_and(|mark| mark.status.is_marked()));
    if !marked {
        return Err(ValidationError::NothingMarked.into());
    }

    // Edited sessions keep the event details already stored, which may have
    // changed since the draft was opened.
    let (session_name, event_type, legion, event_date) = match existing.values().next() {
        Some(stored) => (stored.session_name.clone(), stored.event_type, stored.legion, stored.event_date),
        None => (draft.name.clone(), event_type, legion, draft.event_date.or(Some(now))),
    };

    let mut outcome = FinalizeOutcome {
        session_id: session_id.clone(),
        present: 0,
        absent: 0,
        not_recorded: 0,
        written: 0,
    };

    conn.transaction::<_, DangerError, _>(|conn| {
        for (player, name) in &names {
            let (status, points) = match draft.selection.get(*player) {
                Some(mark) => (mark.status, mark.points),
                None => (AttendanceStatus::NotRecorded, 0),
            };

            match status {
                AttendanceStatus::Present => outcome.present += 1,
                AttendanceStatus::Absent => outcome.absent += 1,
                AttendanceStatus::NotRecorded => outcome.not_recorded += 1,
            }

            if let Some(prev) = existing.get(player) {
                if prev.status == status && prev.points == points {
                    continue;
                }
            }

            let row = NewDbRecord {
                session_id: &session_id,
                session_name: &session_name,
                event_type: event_type.as_str(),
                event_subtype: legion.map(|l| l.as_str()),
                event_date,
                player_id: *player,
                player_name: name,
                alliance_id: draft.alliance.alliance_id,
                alliance_name: &draft.alliance.name,
                status: status.as_str(),
                points,
                marked_at: now,
                marked_by: marker.user_id,
                marked_by_username: &marker.username,
            };
            write_record(conn, &row)?;
            outcome.written += 1;
        }
        Ok(())
    })?;

    info!(
        "Finalized session {} ({}) for alliance {}: {} present, {} absent, {} not recorded",
        outcome.session_id,
        session_name,
        draft.alliance.alliance_id,
        outcome.present,
        outcome.absent,
        outcome.not_recorded
    );

    Ok(outcome)
}

/// Inserts a record, or updates the mark on the existing row for the same
/// session and player.
fn write_record(conn: &mut SqliteConnection, row: &NewDbRecord) -> Result<usize> {
    use schema::attendance_records::dsl::*;

    diesel::insert_into(attendance_records)
        .values(row)
        .on_conflict((session_id, player_id))
        .do_update()
        .set((
            player_name.eq(row.player_name),
            status.eq(row.status),
            points.eq(row.points),
            marked_at.eq(row.marked_at),
            marked_by.eq(row.marked_by),
            marked_by_username.eq(row.marked_by_username),
        ))
        .execute(conn)
        .map_err(DangerError::from)
}

/// Every record of a session, by player name.
pub fn session_records(conn: &mut SqliteConnection, sid: &str) -> Result<Vec<AttendanceRecord>> {
    use schema::attendance_records::dsl::*;

    attendance_records
        .filter(session_id.eq(sid))
        .order_by((player_name.asc(), player_id.asc()))
        .select(DbRecord::as_select())
        .load(conn)?
        .into_iter()
        .map(AttendanceRecord::try_from)
        .collect()
}

/// Finds a session of `alliance` by id, falling back to the most recent
/// session with that name.
pub fn resolve_session(conn: &mut SqliteConnection, alliance: i64, ident: &str) -> Result<String> {
    use schema::attendance_records::dsl::*;

    let ident = ident.trim();

    let by_id = attendance_records
        .filter(alliance_id.eq(alliance))
        .filter(session_id.eq(ident))
        .select(session_id)
        .first::<String>(conn)
        .optional()?;
    if let Some(sid) = by_id {
        return Ok(sid);
    }

    attendance_records
        .filter(alliance_id.eq(alliance))
        .filter(session_name.eq(ident))
        .order_by((event_date.desc(), marked_at.desc()))
        .select(session_id)
        .first::<String>(conn)
        .optional()?
        .ok_or_else(|| DangerError::SessionNotFound(ident.to_string()))
}

/// Sessions of an alliance with their status counts, newest first.
pub fn list_sessions(conn: &mut SqliteConnection, alliance: i64) -> Result<Vec<SessionSummary>> {
    use schema::attendance_records::dsl::*;

    let rows = attendance_records
        .filter(alliance_id.eq(alliance))
        .select((session_id, session_name, event_type, event_subtype, event_date, status))
        .load::<(String, String, String, Option<String>, Option<NaiveDateTime>, String)>(conn)?;

    let mut sessions: BTreeMap<String, SessionSummary> = BTreeMap::new();
    for (sid, name, etype, subtype, date, st) in rows {
        if !sessions.contains_key(&sid) {
            let (etype, legion) = decode_event(&etype, subtype.as_deref())?;
            sessions.insert(sid.clone(), SessionSummary {
                session_id: sid.clone(),
                session_name: name,
                event_type: etype,
                legion,
                event_date: date,
                present: 0,
                absent: 0,
                not_recorded: 0,
            });
        }

        if let Some(summary) = sessions.get_mut(&sid) {
            match st.as_str() {
                "present" => summary.present += 1,
                "absent" => summary.absent += 1,
                _ => summary.not_recorded += 1,
            }
        }
    }

    let mut sessions: Vec<SessionSummary> = sessions.into_values().collect();
    sessions.sort_by(|a, b| {
        b.event_date
            .cmp(&a.event_date)
            .then_with(|| a.session_name.cmp(&b.session_name))
    });
    Ok(sessions)
}

/// Changes to a finalized session's event details. `None` keeps the
/// current value.
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub event_type: Option<EventType>,
    /// `Some(None)` clears the legion.
    pub legion: Option<Option<Legion>>,
    pub event_date: Option<String>,
}

/// Applies an [`EventUpdate`] to every record of the session. Returns the
/// number of rows changed.
pub fn update_event(conn: &mut SqliteConnection, sid: &str, update: &EventUpdate) -> Result<usize> {
    use schema::attendance_records::dsl::*;

    let current = attendance_records
        .filter(session_id.eq(sid))
        .select(DbRecord::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| DangerError::SessionNotFound(sid.to_string()))
        .and_then(AttendanceRecord::try_from)?;

    let new_name = match &update.name {
        Some(n) => validate_name(n)?,
        None => current.session_name.clone(),
    };
    let new_date = match &update.event_date {
        Some(d) => validate_date(Some(d))?.or(current.event_date),
        None => current.event_date,
    };
    let new_type = update.event_type.unwrap_or(current.event_type);
    let new_legion = match update.legion {
        Some(Some(_)) if !new_type.needs_legion() => {
            return Err(ValidationError::LegionNotApplicable(new_type.to_string()).into());
        }
        Some(legion) => legion,
        None if new_type.needs_legion() => current.legion,
        None => None,
    };

    let changed = diesel::update(attendance_records.filter(session_id.eq(sid)))
        .set((
            session_name.eq(&new_name),
            event_type.eq(new_type.as_str()),
            event_subtype.eq(new_legion.map(|l| l.as_str())),
            event_date.eq(new_date),
        ))
        .execute(conn)?;

    info!("Updated event details of session {} ({} rows)", sid, changed);
    Ok(changed)
}

/// Deletes a session and all its records.
pub fn delete_session(conn: &mut SqliteConnection, sid: &str) -> Result<usize> {
    use schema::attendance_records::dsl::*;

    let deleted = diesel::delete(attendance_records.filter(session_id.eq(sid))).execute(conn)?;
    if deleted == 0 {
        return Err(DangerError::SessionNotFound(sid.to_string()));
    }

    info!("Deleted session {} ({} records)", sid, deleted);
    Ok(deleted)
}

/// The player's most recent record for the same event type and legion,
/// from another session held strictly before `before`.
pub fn previous_attendance(
    conn: &mut SqliteConnection,
    player: i64,
    etype: EventType,
    legion: Option<Legion>,
    exclude_session: &str,
    before: NaiveDateTime,
) -> Result<Option<AttendanceRecord>> {
    use schema::attendance_records::dsl::*;

    let mut query = attendance_records
        .filter(player_id.eq(player))
        .filter(event_type.eq(etype.as_str()))
        .filter(session_id.ne(exclude_session))
        .filter(event_date.lt(before))
        .into_boxed();

    query = match legion {
        Some(legion) => query.filter(event_subtype.eq(legion.as_str())),
        None => query.filter(event_subtype.is_null()),
    };

    let found = query
        .order_by(event_date.desc())
        .select(DbRecord::as_select())
        .first(conn)
        .optional()?;

    debug!("Previous {} attendance for player {}: {:?}", etype, player, found.as_ref().map(|r| &r.session_id));

    found.map(AttendanceRecord::try_from).transpose()
}

/// Whether the alliance held any event of this type and legion before
/// `before`, other than `exclude_session`.
pub fn has_earlier_event(
    conn: &mut SqliteConnection,
    alliance: i64,
    etype: EventType,
    legion: Option<Legion>,
    exclude_session: &str,
    before: NaiveDateTime,
) -> Result<bool> {
    use schema::attendance_records::dsl::*;

    let mut query = attendance_records
        .filter(alliance_id.eq(alliance))
        .filter(event_type.eq(etype.as_str()))
        .filter(session_id.ne(exclude_session))
        .filter(event_date.lt(before))
        .into_boxed();

    query = match legion {
        Some(legion) => query.filter(event_subtype.eq(legion.as_str())),
        None => query.filter(event_subtype.is_null()),
    };

    let found = query.select(id).first::<i32>(conn).optional()?;
    Ok(found.is_some())
}

fn decode_event(etype: &str, subtype: Option<&str>) -> Result<(EventType, Option<Legion>)> {
    let etype = etype.parse::<EventType>().map_err(|_| DangerError::InvalidStoredValue {
        column: "event_type",
        value: etype.to_string(),
    })?;
    let legion = subtype
        .map(|s| s.parse::<Legion>().map_err(|_| DangerError::InvalidStoredValue {
            column: "event_subtype",
            value: s.to_string(),
        }))
        .transpose()?;
    Ok((etype, legion))
}
