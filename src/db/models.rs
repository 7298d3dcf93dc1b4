use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::{
    admin_alliances, admins, alliances, attendance_records, guild_themes, roster, user_preferences,
};

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = alliances)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Alliance {
    pub alliance_id: i64,
    pub name: String,
}

#[derive(Insertable)]
#[diesel(table_name = alliances)]
pub struct NewAlliance<'a> {
    pub name: &'a str,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = roster)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RosterMember {
    pub player_id: i64,
    pub nickname: String,
    pub furnace_level: i32,
    pub alliance_id: i64,
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = admins)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Admin {
    pub user_id: i64,
    pub is_global: bool,
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = admin_alliances)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AdminAlliance {
    pub admin_id: i64,
    pub alliance_id: i64,
}

/// Raw attendance row. Decoded into `attendance::AttendanceRecord` by the store.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = attendance_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbRecord {
    pub id: i32,
    pub session_id: String,
    pub session_name: String,
    pub event_type: String,
    pub event_subtype: Option<String>,
    pub event_date: Option<NaiveDateTime>,
    pub player_id: i64,
    pub player_name: String,
    pub alliance_id: i64,
    pub alliance_name: String,
    pub status: String,
    pub points: i64,
    pub marked_at: NaiveDateTime,
    pub marked_by: i64,
    pub marked_by_username: String,
}

#[derive(Insertable)]
#[diesel(table_name = attendance_records)]
pub struct NewDbRecord<'a> {
    pub session_id: &'a str,
    pub session_name: &'a str,
    pub event_type: &'a str,
    pub event_subtype: Option<&'a str>,
    pub event_date: Option<NaiveDateTime>,
    pub player_id: i64,
    pub player_name: &'a str,
    pub alliance_id: i64,
    pub alliance_name: &'a str,
    pub status: &'a str,
    pub points: i64,
    pub marked_at: NaiveDateTime,
    pub marked_by: i64,
    pub marked_by_username: &'a str,
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = user_preferences)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbPreferences {
    pub user_id: i64,
    pub report_type: String,
    pub sort_preference: String,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = guild_themes)]
#[diesel(primary_key(guild_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbTheme {
    pub guild_id: i64,
    pub present_emoji: String,
    pub absent_emoji: String,
    pub not_recorded_emoji: String,
    pub accent_color: i32,
}
