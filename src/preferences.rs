//! Per-user report settings.

use std::fmt;
use std::str::FromStr;

use diesel::prelude::*;

use crate::attendance::SortOrder;
use crate::error::{DangerError, Result, ValidationError};
use crate::models::DbPreferences;
use crate::schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportType {
    #[default]
    Text,
    /// Stored as `matplotlib` for compatibility; rendered as a text chart.
    Chart,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Text => "text",
            ReportType::Chart => "matplotlib",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportType::Text => "text",
            ReportType::Chart => "a chart",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(ReportType::Text),
            "matplotlib" => Ok(ReportType::Chart),
            other => Err(ValidationError::UnknownValue {
                what: "report type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub report_type: ReportType,
    pub sort_order: SortOrder,
}

impl Preferences {
    /// Loads a user's preferences, falling back to the defaults.
    pub fn load(conn: &mut SqliteConnection, uid: u64) -> Result<Self> {
        use schema::user_preferences::dsl::*;

        let row = user_preferences
            .find(uid as i64)
            .select(DbPreferences::as_select())
            .first(conn)
            .optional()?;

        let Some(row) = row else { return Ok(Self::default()) };

        Ok(Self {
            report_type: row.report_type.parse::<ReportType>().map_err(|_| DangerError::InvalidStoredValue {
                column: "report_type",
                value: row.report_type.clone(),
            })?,
            sort_order: row.sort_preference.parse::<SortOrder>().map_err(|_| DangerError::InvalidStoredValue {
                column: "sort_preference",
                value: row.sort_preference.clone(),
            })?,
        })
    }

    /// Sets the report type, leaving the sort order alone.
    pub fn set_report_type(conn: &mut SqliteConnection, uid: u64, kind: ReportType) -> Result<()> {
        use schema::user_preferences::dsl::*;

        let new_row = DbPreferences {
            user_id: uid as i64,
            report_type: kind.as_str().to_string(),
            sort_preference: SortOrder::default().as_str().to_string(),
        };

        diesel::insert_into(user_preferences)
            .values(&new_row)
            .on_conflict(user_id)
            .do_update()
            .set(report_type.eq(kind.as_str()))
            .execute(conn)?;

        Ok(())
    }

    /// Sets the sort order, leaving the report type alone.
    pub fn set_sort_order(conn: &mut SqliteConnection, uid: u64, order: SortOrder) -> Result<()> {
        use schema::user_preferences::dsl::*;

        let new_row = DbPreferences {
            user_id: uid as i64,
            report_type: ReportType::default().as_str().to_string(),
            sort_preference: order.as_str().to_string(),
        };

        diesel::insert_into(user_preferences)
            .values(&new_row)
            .on_conflict(user_id)
            .do_update()
            .set(sort_preference.eq(order.as_str()))
            .execute(conn)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;

    #[test]
    fn defaults_without_a_row() {
        let conn = &mut memory_db().unwrap();
        let prefs = Preferences::load(conn, 1).unwrap();
        assert_eq!(prefs.report_type, ReportType::Text);
        assert_eq!(prefs.sort_order, SortOrder::PointsDesc);
    }

    #[test]
    fn setting_one_field_keeps_the_other() {
        let conn = &mut memory_db().unwrap();
        Preferences::set_sort_order(conn, 1, SortOrder::NameAscAll).unwrap();
        Preferences::set_report_type(conn, 1, ReportType::Chart).unwrap();

        let prefs = Preferences::load(conn, 1).unwrap();
        assert_eq!(prefs.report_type, ReportType::Chart);
        assert_eq!(prefs.sort_order, SortOrder::NameAscAll);

        Preferences::set_report_type(conn, 1, ReportType::Text).unwrap();
        assert_eq!(Preferences::load(conn, 1).unwrap().sort_order, SortOrder::NameAscAll);
        assert_eq!(Preferences::load(conn, 2).unwrap(), Preferences::default());
    }
}
