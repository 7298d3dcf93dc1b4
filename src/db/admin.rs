use diesel::prelude::*;
use serenity::all::UserId;

use crate::models::{Admin, AdminAlliance};
use crate::schema;
use crate::error::{DangerError, Result};

/// What a Discord user is allowed to administer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminScope {
    Global,
    Alliances(Vec<i64>),
    None,
}

impl AdminScope {
    /// Looks up `user_id` in the admin tables. The configured bot owner is
    /// always a global admin.
    pub fn load(conn: &mut SqliteConnection, user: UserId, owner: Option<UserId>) -> Result<Self> {
        if owner == Some(user) {
            return Ok(Self::Global);
        }

        let uid = user.get() as i64;

        let admin = {
            use schema::admins::dsl::*;

            admins
                .find(uid)
                .select(Admin::as_select())
                .first(conn)
                .optional()?
        };

        let Some(admin) = admin else { return Ok(Self::None) };
        if admin.is_global {
            return Ok(Self::Global);
        }

        use schema::admin_alliances::dsl::*;

        let ids = admin_alliances
            .filter(admin_id.eq(uid))
            .select(alliance_id)
            .load::<i64>(conn)?;

        Ok(Self::Alliances(ids))
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    pub fn can_manage(&self, alliance: i64) -> bool {
        match self {
            Self::Global => true,
            Self::Alliances(ids) => ids.contains(&alliance),
            Self::None => false,
        }
    }

    pub fn require(&self, alliance: i64) -> Result<()> {
        if self.can_manage(alliance) {
            Ok(())
        } else {
            Err(DangerError::NotAllianceAdmin(alliance))
        }
    }

    /// Adding or moving a player touches the alliance they are in now as
    /// well as the one they join.
    pub fn require_member_move(&self, from: Option<i64>, to: i64) -> Result<()> {
        if let Some(from) = from {
            self.require(from)?;
        }
        self.require(to)
    }

    pub fn require_global(&self) -> Result<()> {
        if self.is_global() {
            Ok(())
        } else {
            Err(DangerError::NotGlobalAdmin)
        }
    }
}

/// Makes `user` an admin: of `alliance` when given, global otherwise.
pub fn grant(conn: &mut SqliteConnection, user: UserId, alliance: Option<i64>) -> Result<()> {
    let uid = user.get() as i64;

    conn.transaction::<_, DangerError, _>(|conn| {
        {
            use schema::admins::dsl::*;

            diesel::insert_into(admins)
                .values(&Admin { user_id: uid, is_global: alliance.is_none() })
                .on_conflict(user_id)
                .do_nothing()
                .execute(conn)?;

            if alliance.is_none() {
                diesel::update(admins.find(uid))
                    .set(is_global.eq(true))
                    .execute(conn)?;
            }
        }

        if let Some(aid) = alliance {
            use schema::admin_alliances::dsl::*;

            diesel::insert_into(admin_alliances)
                .values(&AdminAlliance { admin_id: uid, alliance_id: aid })
                .on_conflict((admin_id, alliance_id))
                .do_nothing()
                .execute(conn)?;
        }

        Ok(())
    })
}
