use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::models::RosterMember;

use super::event::AttendanceStatus;
use super::points::parse_points;
use super::sort::normalize_name;

pub const ROSTER_PAGE_SIZE: usize = 20;

/// One player's pending mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub nickname: String,
    pub status: AttendanceStatus,
    pub points: i64,
}

/// The marks collected so far for a session, keyed by player id.
///
/// Operations never mutate in place: they return the updated selection, so a
/// rejected operation leaves the caller's value as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(BTreeMap<i64, Mark>);

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `status` to every player in the batch. Present marks need a
    /// points value, parsed once and given to the whole batch; absent marks
    /// always carry zero points. Clearing a mark goes through [`Self::unmark`].
    pub fn mark(
        &self,
        players: &[RosterMember],
        status: AttendanceStatus,
        points: Option<&str>,
    ) -> Result<Self, ValidationError> {
        if players.is_empty() {
            return Err(ValidationError::EmptySelection);
        }

        let points = match status {
            AttendanceStatus::Present => {
                parse_points(points.ok_or(ValidationError::PointsRequired)?)?
            }
            AttendanceStatus::Absent => 0,
            AttendanceStatus::NotRecorded => {
                return Err(ValidationError::UnknownValue {
                    what: "status",
                    value: status.as_str().to_string(),
                });
            }
        };

        let mut next = self.clone();
        for player in players {
            next.0.insert(player.player_id, Mark {
                nickname: player.nickname.clone(),
                status,
                points,
            });
        }

        Ok(next)
    }

    /// Drops a single player's pending mark, so finalize records them as
    /// not recorded.
    pub fn unmark(&self, player_id: i64) -> Self {
        let mut next = self.clone();
        next.0.remove(&player_id);
        next
    }

    pub fn insert(&mut self, player_id: i64, mark: Mark) {
        self.0.insert(player_id, mark);
    }

    pub fn get(&self, player_id: i64) -> Option<&Mark> {
        self.0.get(&player_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &Mark)> {
        self.0.iter().map(|(id, mark)| (*id, mark))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// (present, absent)
    pub fn counts(&self) -> (usize, usize) {
        self.0.values().fold((0, 0), |(present, absent), mark| match mark.status {
            AttendanceStatus::Present => (present + 1, absent),
            AttendanceStatus::Absent => (present, absent + 1),
            AttendanceStatus::NotRecorded => (present, absent),
        })
    }

    /// Whether anybody has been marked present or absent.
    pub fn has_attendance(&self) -> bool {
        self.0.values().any(|mark| mark.status.is_marked())
    }
}

/// A page of roster members, optionally filtered by name or player id.
#[derive(Debug, Clone)]
pub struct RosterPage<'a> {
    pub members: Vec<&'a RosterMember>,
    /// Zero based.
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
}

impl<'a> RosterPage<'a> {
    pub fn new(roster: &'a [RosterMember], filter: Option<&str>, page: usize) -> Self {
        let filter = filter.map(str::trim).filter(|f| !f.is_empty());
        let needle = filter.map(normalize_name);

        let matches: Vec<&RosterMember> = roster
            .iter()
            .filter(|m| match (filter, needle.as_deref()) {
                (Some(raw), Some(needle)) => {
                    m.player_id.to_string().starts_with(raw)
                        || normalize_name(&m.nickname).contains(needle)
                }
                _ => true,
            })
            .collect();

        let total_matches = matches.len();
        let total_pages = total_matches.div_ceil(ROSTER_PAGE_SIZE).max(1);
        let page = page.min(total_pages - 1);

        let members = matches
            .into_iter()
            .skip(page * ROSTER_PAGE_SIZE)
            .take(ROSTER_PAGE_SIZE)
            .collect();

        Self {
            members,
            page,
            total_pages,
            total_matches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> Vec<RosterMember> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| RosterMember {
                player_id: 1000 + i as i64,
                nickname: name.to_string(),
                furnace_level: 30,
                alliance_id: 1,
            })
            .collect()
    }

    #[test]
    fn present_batch_shares_points() {
        let players = roster(&["A", "B"]);
        let sel = Selection::new()
            .mark(&players, AttendanceStatus::Present, Some("4.3K"))
            .unwrap();

        assert_eq!(sel.len(), 2);
        assert!(sel.iter().all(|(_, m)| m.points == 4300 && m.status == AttendanceStatus::Present));
    }

    #[test]
    fn absent_forces_zero_points() {
        let players = roster(&["A"]);
        let sel = Selection::new()
            .mark(&players, AttendanceStatus::Absent, Some("900"))
            .unwrap();
        assert_eq!(sel.get(1000).unwrap().points, 0);
        assert_eq!(sel.counts(), (0, 1));
    }

    #[test]
    fn bad_points_leave_selection_untouched() {
        let players = roster(&["A", "B"]);
        let before = Selection::new()
            .mark(&players[..1], AttendanceStatus::Present, Some("100"))
            .unwrap();

        let err = before.mark(&players, AttendanceStatus::Present, Some("lots"));
        assert_eq!(err, Err(ValidationError::InvalidPoints("lots".to_string())));
        assert_eq!(before.len(), 1);
        assert_eq!(before.get(1000).unwrap().points, 100);

        let err = before.mark(&players, AttendanceStatus::Present, None);
        assert_eq!(err, Err(ValidationError::PointsRequired));
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert_eq!(
            Selection::new().mark(&[], AttendanceStatus::Absent, None),
            Err(ValidationError::EmptySelection)
        );
    }

    #[test]
    fn batches_cannot_be_cleared() {
        let players = roster(&["A"]);
        let before = Selection::new()
            .mark(&players, AttendanceStatus::Absent, None)
            .unwrap();
        assert_eq!(
            before.mark(&players, AttendanceStatus::NotRecorded, None),
            Err(ValidationError::UnknownValue { what: "status", value: "not_recorded".to_string() })
        );
        assert!(before.get(1000).is_some());
    }

    #[test]
    fn unmark_removes_only_that_player() {
        let players = roster(&["A", "B"]);
        let sel = Selection::new()
            .mark(&players, AttendanceStatus::Absent, None)
            .unwrap()
            .unmark(1000);
        assert!(sel.get(1000).is_none());
        assert!(sel.get(1001).is_some());
        assert!(sel.has_attendance());
        assert!(!sel.unmark(1001).has_attendance());
    }

    #[test]
    fn roster_pages_and_filters() {
        let names: Vec<String> = (0..45).map(|i| format!("Player{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let members = roster(&refs);

        let first = RosterPage::new(&members, None, 0);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.members.len(), ROSTER_PAGE_SIZE);

        let last = RosterPage::new(&members, None, 99);
        assert_eq!(last.page, 2);
        assert_eq!(last.members.len(), 5);

        let filtered = RosterPage::new(&members, Some("player4"), 0);
        // Player4 and Player40..Player44
        assert_eq!(filtered.total_matches, 6);

        let by_id = RosterPage::new(&members, Some("1044"), 0);
        assert_eq!(by_id.members[0].nickname, "Player44");

        let none = RosterPage::new(&members, Some("zzz"), 0);
        assert_eq!(none.total_pages, 1);
        assert!(none.members.is_empty());
    }
}
