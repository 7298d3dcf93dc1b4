//! Per-guild report theme.
//!
//! Loaded once when a command starts and passed down to the renderer.

use diesel::prelude::*;

use crate::attendance::AttendanceStatus;
use crate::error::Result;
use crate::models::DbTheme;
use crate::schema;

pub const DEFAULT_ACCENT: u32 = 0x1F8B4C;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub present: String,
    pub absent: String,
    pub not_recorded: String,
    pub accent_color: u32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            present: "✅".to_string(),
            absent: "❌".to_string(),
            not_recorded: "❔".to_string(),
            accent_color: DEFAULT_ACCENT,
        }
    }
}

impl Theme {
    pub fn icon(&self, status: AttendanceStatus) -> &str {
        match status {
            AttendanceStatus::Present => &self.present,
            AttendanceStatus::Absent => &self.absent,
            AttendanceStatus::NotRecorded => &self.not_recorded,
        }
    }

    /// The guild's theme, or the default one if it never set any.
    pub fn load(conn: &mut SqliteConnection, gid: u64) -> Result<Self> {
        use schema::guild_themes::dsl::*;

        let row = guild_themes
            .find(gid as i64)
            .select(DbTheme::as_select())
            .first(conn)
            .optional()?;

        Ok(row.map(Self::from).unwrap_or_default())
    }

    pub fn save(&self, conn: &mut SqliteConnection, gid: u64) -> Result<()> {
        use schema::guild_themes::dsl::*;

        let row = DbTheme {
            guild_id: gid as i64,
            present_emoji: self.present.clone(),
            absent_emoji: self.absent.clone(),
            not_recorded_emoji: self.not_recorded.clone(),
            accent_color: (self.accent_color & 0xFF_FFFF) as i32,
        };

        diesel::insert_into(guild_themes)
            .values(&row)
            .on_conflict(guild_id)
            .do_update()
            .set(&row)
            .execute(conn)?;

        Ok(())
    }
}

impl From<DbTheme> for Theme {
    fn from(row: DbTheme) -> Self {
        Self {
            present: row.present_emoji,
            absent: row.absent_emoji,
            not_recorded: row.not_recorded_emoji,
            accent_color: row.accent_color as u32,
        }
    }
}

/// Parses `#1F8B4C`, `0x1F8B4C` or `1F8B4C`.
pub fn parse_color(input: &str) -> Option<u32> {
    let hex = input.trim();
    let hex = hex
        .strip_prefix('#')
        .or_else(|| hex.strip_prefix("0x"))
        .unwrap_or(hex);
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;

    #[test]
    fn guilds_without_theme_get_default() {
        let conn = &mut memory_db().unwrap();
        assert_eq!(Theme::load(conn, 1).unwrap(), Theme::default());
    }

    #[test]
    fn saved_theme_is_per_guild() {
        let conn = &mut memory_db().unwrap();
        let theme = Theme {
            present: "🟢".to_string(),
            accent_color: 0xFF0000,
            ..Theme::default()
        };
        theme.save(conn, 1).unwrap();

        assert_eq!(Theme::load(conn, 1).unwrap(), theme);
        assert_eq!(Theme::load(conn, 2).unwrap(), Theme::default());

        let updated = Theme { absent: "🔴".to_string(), ..theme.clone() };
        updated.save(conn, 1).unwrap();
        assert_eq!(Theme::load(conn, 1).unwrap().absent, "🔴");
        assert_eq!(Theme::load(conn, 1).unwrap().icon(AttendanceStatus::Present), "🟢");
    }

    #[test]
    fn colors() {
        assert_eq!(parse_color("#1F8B4C"), Some(0x1F8B4C));
        assert_eq!(parse_color("0xff0000"), Some(0xFF0000));
        assert_eq!(parse_color("abc"), None);
        assert_eq!(parse_color("zzzzzz"), None);
    }
}
