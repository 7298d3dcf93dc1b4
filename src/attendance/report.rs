use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use diesel::SqliteConnection;

use crate::error::{DangerError, Result, ValidationError};
use crate::models::RosterMember;

use super::event::{AttendanceStatus, EventType, Legion};
use super::selection::Selection;
use super::session::SessionDraft;
use super::store::{has_earlier_event, previous_attendance, resolve_session, session_records};

/// What the player did at the previous event of the same kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastAttendance {
    Previous {
        status: AttendanceStatus,
        points: i64,
        session_name: String,
        event_date: Option<NaiveDateTime>,
    },
    /// The alliance ran this event before, but this player has no record of it.
    NewPlayer,
    /// Nothing of this event type happened before.
    FirstEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub player_id: i64,
    pub player_name: String,
    pub status: AttendanceStatus,
    pub points: i64,
    /// Only looked up for present and absent rows.
    pub last_attendance: Option<LastAttendance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    pub total_members: usize,
    pub present: usize,
    pub absent: usize,
    pub not_recorded: usize,
}

impl Counts {
    /// `alliance_size` is the current roster size. Players nobody marked are
    /// derived from it rather than counted.
    fn tally(rows: &[ReportRow], alliance_size: usize) -> Self {
        let present = rows.iter().filter(|r| r.status == AttendanceStatus::Present).count();
        let absent = rows.iter().filter(|r| r.status == AttendanceStatus::Absent).count();
        let total_members = alliance_size.max(present + absent);

        Self {
            total_members,
            present,
            absent,
            not_recorded: total_members - present - absent,
        }
    }

    pub fn total_marked(&self) -> usize {
        self.present + self.absent
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// None for a session that hasn't been finalized yet.
    pub session_id: Option<String>,
    pub session_name: String,
    pub alliance_name: String,
    pub event_type: EventType,
    pub legion: Option<Legion>,
    pub event_date: Option<NaiveDateTime>,
    pub counts: Counts,
    /// Storage order. Sorting happens when rendering.
    pub rows: Vec<ReportRow>,
    /// Built from unsaved marks.
    pub in_progress: bool,
}

/// Report for a stored session, looked up by id or name within the
/// alliance. When `in_progress` is given, those marks replace the stored
/// ones (players missing from it count as not recorded).
pub fn build_report(
    conn: &mut SqliteConnection,
    roster: &[RosterMember],
    alliance_id: i64,
    ident: &str,
    in_progress: Option<&Selection>,
) -> Result<Report> {
    let sid = resolve_session(conn, alliance_id, ident)?;
    let records = session_records(conn, &sid)?;
    let first = records
        .first()
        .ok_or_else(|| DangerError::NoRecords(ident.to_string()))?
        .clone();

    let mut rows: BTreeMap<i64, ReportRow> = records
        .iter()
        .map(|r| (r.player_id, ReportRow {
            player_id: r.player_id,
            player_name: r.player_name.clone(),
            status: r.status,
            points: r.points,
            last_attendance: None,
        }))
        .collect();

    if let Some(selection) = in_progress {
        overlay(&mut rows, roster, selection);
    }

    let mut rows: Vec<ReportRow> = rows.into_values().collect();
    annotate(conn, alliance_id, first.event_type, first.legion, &sid, first.event_date, &mut rows)?;

    Ok(Report {
        session_id: Some(sid),
        session_name: first.session_name,
        alliance_name: first.alliance_name,
        event_type: first.event_type,
        legion: first.legion,
        event_date: first.event_date,
        counts: Counts::tally(&rows, alliance_size(roster, &rows)),
        rows,
        in_progress: in_progress.is_some(),
    })
}

/// Report for a draft that may not be stored yet. `now` stands in for a
/// missing event date.
pub fn draft_report(
    conn: &mut SqliteConnection,
    draft: &SessionDraft,
    roster: &[RosterMember],
    now: NaiveDateTime,
) -> Result<Report> {
    if let Some(sid) = draft.session_id() {
        let mut report = build_report(conn, roster, draft.alliance.alliance_id, sid, Some(&draft.selection))?;
        report.session_name = draft.name.clone();
        return Ok(report);
    }

    let event_type = draft.event_type.ok_or(ValidationError::EventTypeRequired)?;
    let legion = draft.legion();
    let event_date = draft.event_date.unwrap_or(now);

    let mut rows = BTreeMap::new();
    overlay(&mut rows, roster, &draft.selection);

    let mut rows: Vec<ReportRow> = rows.into_values().collect();
    annotate(conn, draft.alliance.alliance_id, event_type, legion, "", Some(event_date), &mut rows)?;

    Ok(Report {
        session_id: None,
        session_name: draft.name.clone(),
        alliance_name: draft.alliance.name.clone(),
        event_type,
        legion,
        event_date: Some(event_date),
        counts: Counts::tally(&rows, alliance_size(roster, &rows)),
        rows,
        in_progress: true,
    })
}

/// Replaces row statuses with the selection and adds a row for every roster
/// member and selected player that has none.
fn overlay(rows: &mut BTreeMap<i64, ReportRow>, roster: &[RosterMember], selection: &Selection) {
    for member in roster {
        rows.entry(member.player_id).or_insert_with(|| ReportRow {
            player_id: member.player_id,
            player_name: member.nickname.clone(),
            status: AttendanceStatus::NotRecorded,
            points: 0,
            last_attendance: None,
        });
    }

    for (id, mark) in selection.iter() {
        rows.entry(id).or_insert_with(|| ReportRow {
            player_id: id,
            player_name: mark.nickname.clone(),
            status: AttendanceStatus::NotRecorded,
            points: 0,
            last_attendance: None,
        });
    }

    for row in rows.values_mut() {
        match selection.get(row.player_id) {
            Some(mark) => {
                row.status = mark.status;
                row.points = mark.points;
            }
            None => {
                row.status = AttendanceStatus::NotRecorded;
                row.points = 0;
            }
        }
    }
}

fn alliance_size(roster: &[RosterMember], rows: &[ReportRow]) -> usize {
    if roster.is_empty() { rows.len() } else { roster.len() }
}

/// Fills in `last_attendance` on present and absent rows. Sessions without a
/// date have nothing to compare against and are left alone.
fn annotate(
    conn: &mut SqliteConnection,
    alliance_id: i64,
    event_type: EventType,
    legion: Option<Legion>,
    exclude_session: &str,
    event_date: Option<NaiveDateTime>,
    rows: &mut [ReportRow],
) -> Result<()> {
    let Some(before) = event_date else { return Ok(()) };

    let any_earlier = has_earlier_event(conn, alliance_id, event_type, legion, exclude_session, before)?;

    for row in rows.iter_mut().filter(|r| r.status.is_marked()) {
        if !any_earlier {
            row.last_attendance = Some(LastAttendance::FirstEvent);
            continue;
        }

        let previous = previous_attendance(conn, row.player_id, event_type, legion, exclude_session, before)?;
        row.last_attendance = Some(match previous {
            Some(record) => LastAttendance::Previous {
                status: record.status,
                points: record.points,
                session_name: record.session_name,
                event_date: record.event_date,
            },
            None => LastAttendance::NewPlayer,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: AttendanceStatus) -> ReportRow {
        ReportRow {
            player_id: 1,
            player_name: "x".to_string(),
            status,
            points: 0,
            last_attendance: None,
        }
    }

    #[test]
    fn counts_add_up_to_alliance_size() {
        let rows = vec![
            row(AttendanceStatus::Present),
            row(AttendanceStatus::Absent),
            row(AttendanceStatus::Absent),
        ];
        let counts = Counts::tally(&rows, 10);
        assert_eq!(counts.present, 1);
        assert_eq!(counts.absent, 2);
        assert_eq!(counts.not_recorded, 7);
        assert_eq!(counts.present + counts.absent + counts.not_recorded, counts.total_members);
        assert_eq!(counts.total_marked(), 3);
    }

    #[test]
    fn counts_never_go_negative_when_members_left() {
        let rows = vec![row(AttendanceStatus::Present), row(AttendanceStatus::Present)];
        let counts = Counts::tally(&rows, 1);
        assert_eq!(counts.total_members, 2);
        assert_eq!(counts.not_recorded, 0);
    }

    #[test]
    fn overlay_replaces_statuses_and_adds_roster() {
        let roster = vec![RosterMember {
            player_id: 2,
            nickname: "B".to_string(),
            furnace_level: 30,
            alliance_id: 1,
        }];
        let selection = Selection::new()
            .mark(&roster, AttendanceStatus::Present, Some("1K"))
            .unwrap();

        let mut rows = BTreeMap::new();
        rows.insert(1, ReportRow { points: 50, ..row(AttendanceStatus::Present) });
        overlay(&mut rows, &roster, &selection);

        assert_eq!(rows[&1].status, AttendanceStatus::NotRecorded);
        assert_eq!(rows[&1].points, 0);
        assert_eq!(rows[&2].status, AttendanceStatus::Present);
        assert_eq!(rows[&2].points, 1000);
    }
}
