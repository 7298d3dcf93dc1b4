use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::error::ValidationError;

pub const EVENT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Foundry,
    CanyonClash,
    CrazyJoe,
    BearTrap,
    CastleBattle,
    FrostdragonTyrant,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 7] = [
        EventType::Foundry,
        EventType::CanyonClash,
        EventType::CrazyJoe,
        EventType::BearTrap,
        EventType::CastleBattle,
        EventType::FrostdragonTyrant,
        EventType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Foundry => "Foundry",
            EventType::CanyonClash => "Canyon Clash",
            EventType::CrazyJoe => "Crazy Joe",
            EventType::BearTrap => "Bear Trap",
            EventType::CastleBattle => "Castle Battle",
            EventType::FrostdragonTyrant => "Frostdragon Tyrant",
            EventType::Other => "Other",
        }
    }

    /// Foundry and Canyon Clash are fought in two legions.
    pub fn needs_legion(&self) -> bool {
        matches!(self, EventType::Foundry | EventType::CanyonClash)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownValue {
                what: "event type",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Legion {
    One,
    Two,
}

impl Legion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Legion::One => "Legion 1",
            Legion::Two => "Legion 2",
        }
    }
}

impl fmt::Display for Legion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Legion {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Legion 1" | "1" => Ok(Legion::One),
            "Legion 2" | "2" => Ok(Legion::Two),
            other => Err(ValidationError::UnknownValue {
                what: "legion",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttendanceStatus {
    Present,
    Absent,
    NotRecorded,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::NotRecorded => "not_recorded",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::NotRecorded => "Not Recorded",
        }
    }

    /// Present or absent, i.e. somebody actually marked this player.
    pub fn is_marked(&self) -> bool {
        !matches!(self, AttendanceStatus::NotRecorded)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "not_recorded" => Ok(AttendanceStatus::NotRecorded),
            other => Err(ValidationError::UnknownValue {
                what: "attendance status",
                value: other.to_string(),
            }),
        }
    }
}

/// Parses a user supplied `YYYY-MM-DD HH:MM` event date.
pub fn parse_event_date(input: &str) -> Result<NaiveDateTime, ValidationError> {
    NaiveDateTime::parse_from_str(input.trim(), EVENT_DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}

/// Display label for a furnace level. Levels past 30 go through the
/// 30-1..30-4 steps, then Fire Crystal tiers of five levels each.
pub fn furnace_label(level: i32) -> String {
    match level {
        i32::MIN..=30 => level.to_string(),
        31..=34 => format!("30-{}", level - 30),
        _ => {
            let offset = level - 35;
            let tier = offset / 5 + 1;
            match offset % 5 {
                0 => format!("FC {}", tier),
                step => format!("FC {}-{}", tier, step),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types_round_trip_through_names() {
        for t in EventType::ALL {
            assert_eq!(t.as_str().parse::<EventType>().unwrap(), t);
        }
        assert_eq!("bear trap".parse::<EventType>().unwrap(), EventType::BearTrap);
        assert!("Raid".parse::<EventType>().is_err());
    }

    #[test]
    fn only_foundry_and_canyon_need_legions() {
        let legion: Vec<EventType> = EventType::ALL
            .into_iter()
            .filter(EventType::needs_legion)
            .collect();
        assert_eq!(legion, vec![EventType::Foundry, EventType::CanyonClash]);
    }

    #[test]
    fn event_dates_need_minutes() {
        let date = parse_event_date("2024-05-01 19:30").unwrap();
        assert_eq!(date.format(EVENT_DATE_FORMAT).to_string(), "2024-05-01 19:30");
        assert!(parse_event_date("2024-05-01").is_err());
        assert!(parse_event_date("01/05/2024 19:30").is_err());
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!("absent".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Absent);
        assert!("late".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn furnace_levels() {
        assert_eq!(furnace_label(25), "25");
        assert_eq!(furnace_label(30), "30");
        assert_eq!(furnace_label(31), "30-1");
        assert_eq!(furnace_label(34), "30-4");
        assert_eq!(furnace_label(35), "FC 1");
        assert_eq!(furnace_label(36), "FC 1-1");
        assert_eq!(furnace_label(40), "FC 2");
        assert_eq!(furnace_label(44), "FC 2-4");
    }
}
