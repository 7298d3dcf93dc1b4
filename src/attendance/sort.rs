use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::ValidationError;

use super::event::AttendanceStatus;
use super::report::{LastAttendance, ReportRow};

/// Characters players like to decorate their names with. Ignored when
/// comparing names.
const DECORATIONS: &[char] = &[
    '[', ']', '(', ')', '{', '}', '<', '>', '【', '】', '「', '」', '『', '』', '〔', '〕',
    '《', '》', '〈', '〉', '★', '☆', '✦', '✧', '✪', '♛', '♕', '♔', '♚', '❀', '✿', '❤',
    '♡', '•', '·', '|', '~', '*', '_', '-', '=', '#', '^', '`', '\'', '"', '.',
];

/// Lowercased, diacritic free form of `name` with decorations removed.
pub fn normalize_name(name: &str) -> String {
    name.nfkd()
        .filter(|c| !is_combining_mark(*c) && !DECORATIONS.contains(c))
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// How report rows are ordered. Applied at render time only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    PointsDesc,
    NameAsc,
    NameAscAll,
    LastAttendedFirst,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::PointsDesc,
        SortOrder::NameAsc,
        SortOrder::NameAscAll,
        SortOrder::LastAttendedFirst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::PointsDesc => "points_desc",
            SortOrder::NameAsc => "name_asc",
            SortOrder::NameAscAll => "name_asc_all",
            SortOrder::LastAttendedFirst => "last_attended_first",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::PointsDesc => "Points (high to low)",
            SortOrder::NameAsc => "Name (A-Z, marked first)",
            SortOrder::NameAscAll => "Name (A-Z)",
            SortOrder::LastAttendedFirst => "Last attended first",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownValue {
                what: "sort order",
                value: s.to_string(),
            })
    }
}

/// Present and absent rows come before rows nobody marked.
fn marked_group(row: &ReportRow) -> u8 {
    if row.status.is_marked() { 0 } else { 1 }
}

/// Six tiers from current status crossed with the previous event's status,
/// then everybody who wasn't marked.
fn attendance_tier(row: &ReportRow) -> u8 {
    let previous = match &row.last_attendance {
        Some(LastAttendance::Previous { status: AttendanceStatus::Present, .. }) => 0,
        Some(LastAttendance::Previous { status: AttendanceStatus::Absent, .. }) => 1,
        _ => 2,
    };

    match row.status {
        AttendanceStatus::Present => previous,
        AttendanceStatus::Absent => 3 + previous,
        AttendanceStatus::NotRecorded => 6,
    }
}

fn by_name(a: &ReportRow, b: &ReportRow) -> Ordering {
    normalize_name(&a.player_name).cmp(&normalize_name(&b.player_name))
}

/// Sorts `rows` in place. Every order ends with the player id, so the result
/// only depends on the rows themselves.
pub fn sort_rows(rows: &mut [ReportRow], order: SortOrder) {
    rows.sort_by(|a, b| {
        let primary = match order {
            SortOrder::PointsDesc => marked_group(a)
                .cmp(&marked_group(b))
                .then_with(|| b.points.cmp(&a.points))
                .then_with(|| by_name(a, b)),
            SortOrder::NameAsc => marked_group(a)
                .cmp(&marked_group(b))
                .then_with(|| by_name(a, b)),
            SortOrder::NameAscAll => by_name(a, b),
            SortOrder::LastAttendedFirst => attendance_tier(a)
                .cmp(&attendance_tier(b))
                .then_with(|| b.points.cmp(&a.points))
                .then_with(|| by_name(a, b)),
        };
        primary.then_with(|| a.player_id.cmp(&b.player_id))
    });
}
