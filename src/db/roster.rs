//! Alliance and player roster lookups.
//!
//! The attendance code only reads from here. The write helpers back the
//! small `/alliance` maintenance commands.

use diesel::prelude::*;

use crate::models::{Alliance, NewAlliance, RosterMember};
use crate::schema;
use crate::error::{DangerError, Result};

/// Gets alliance `id`. Returns None if it doesn't exist.
pub fn alliance(conn: &mut SqliteConnection, id: i64) -> Result<Option<Alliance>> {
    use schema::alliances::dsl::*;

    alliances
        .find(id)
        .select(Alliance::as_select())
        .first(conn)
        .optional()
        .map_err(DangerError::from)
}

/// Like [`alliance`], but a missing alliance is an error.
pub fn require_alliance(conn: &mut SqliteConnection, id: i64) -> Result<Alliance> {
    alliance(conn, id)?.ok_or(DangerError::AllianceNotFound(id))
}

pub fn all_alliances(conn: &mut SqliteConnection) -> Result<Vec<Alliance>> {
    use schema::alliances::dsl::*;

    alliances
        .order_by(name.asc())
        .select(Alliance::as_select())
        .load(conn)
        .map_err(DangerError::from)
}

/// All members of alliance `id`, highest furnace level first.
pub fn members(conn: &mut SqliteConnection, id: i64) -> Result<Vec<RosterMember>> {
    use schema::roster::dsl::*;

    roster
        .filter(alliance_id.eq(id))
        .order_by((furnace_level.desc(), nickname.asc()))
        .select(RosterMember::as_select())
        .load(conn)
        .map_err(DangerError::from)
}

pub fn member_count(conn: &mut SqliteConnection, id: i64) -> Result<i64> {
    use schema::roster::dsl::*;

    roster
        .filter(alliance_id.eq(id))
        .count()
        .get_result(conn)
        .map_err(DangerError::from)
}

/// The roster entry for `id`, in whichever alliance they are.
pub fn find_member(conn: &mut SqliteConnection, id: i64) -> Result<Option<RosterMember>> {
    use schema::roster::dsl::*;

    roster
        .find(id)
        .select(RosterMember::as_select())
        .first(conn)
        .optional()
        .map_err(DangerError::from)
}

/// Creates a new alliance and returns it with its assigned id.
pub fn create_alliance(conn: &mut SqliteConnection, alliance_name: &str) -> Result<Alliance> {
    use schema::alliances::dsl::*;

    diesel::insert_into(alliances)
        .values(&NewAlliance { name: alliance_name })
        .returning(Alliance::as_returning())
        .get_result(conn)
        .map_err(DangerError::from)
}

/// Adds a player to the roster, or moves/renames them if they already exist.
pub fn upsert_member(conn: &mut SqliteConnection, member: &RosterMember) -> Result<()> {
    use schema::roster::dsl::*;

    diesel::insert_into(roster)
        .values(member)
        .on_conflict(player_id)
        .do_update()
        .set((
            nickname.eq(&member.nickname),
            furnace_level.eq(member.furnace_level),
            alliance_id.eq(member.alliance_id),
        ))
        .execute(conn)?;

    Ok(())
}

/// Removes a player from an alliance roster. Their attendance history is kept.
pub fn remove_member(conn: &mut SqliteConnection, alliance: i64, id: i64) -> Result<()> {
    use schema::roster::dsl::*;

    let removed = diesel::delete(roster.filter(player_id.eq(id)).filter(alliance_id.eq(alliance)))
        .execute(conn)?;
    if removed == 0 {
        return Err(DangerError::PlayerNotFound(id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;

    fn member(id: i64, name: &str, level: i32, alliance: i64) -> RosterMember {
        RosterMember {
            player_id: id,
            nickname: name.to_string(),
            furnace_level: level,
            alliance_id: alliance,
        }
    }

    #[test]
    fn members_are_scoped_to_alliance() {
        let conn = &mut memory_db().unwrap();
        let a = create_alliance(conn, "DNG").unwrap();
        let b = create_alliance(conn, "Other").unwrap();

        upsert_member(conn, &member(1, "Alpha", 30, a.alliance_id)).unwrap();
        upsert_member(conn, &member(2, "Bravo", 35, a.alliance_id)).unwrap();
        upsert_member(conn, &member(3, "Charlie", 20, b.alliance_id)).unwrap();

        let found = members(conn, a.alliance_id).unwrap();
        let ids: Vec<i64> = found.iter().map(|m| m.player_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(member_count(conn, b.alliance_id).unwrap(), 1);
    }

    #[test]
    fn upsert_moves_player_between_alliances() {
        let conn = &mut memory_db().unwrap();
        let a = create_alliance(conn, "DNG").unwrap();
        let b = create_alliance(conn, "Other").unwrap();

        upsert_member(conn, &member(1, "Alpha", 30, a.alliance_id)).unwrap();
        upsert_member(conn, &member(1, "Alpha2", 31, b.alliance_id)).unwrap();

        assert!(members(conn, a.alliance_id).unwrap().is_empty());
        assert_eq!(members(conn, b.alliance_id).unwrap()[0].nickname, "Alpha2");
        assert_eq!(find_member(conn, 1).unwrap().map(|m| m.alliance_id), Some(b.alliance_id));
        assert_eq!(find_member(conn, 2).unwrap(), None);

        assert!(remove_member(conn, a.alliance_id, 1).is_err());
        remove_member(conn, b.alliance_id, 1).unwrap();
        assert_eq!(member_count(conn, b.alliance_id).unwrap(), 0);
    }

    #[test]
    fn removing_unknown_player_is_not_found() {
        let conn = &mut memory_db().unwrap();
        assert!(matches!(remove_member(conn, 1, 42), Err(DangerError::PlayerNotFound(42))));
        assert!(matches!(require_alliance(conn, 7), Err(DangerError::AllianceNotFound(7))));
    }
}
