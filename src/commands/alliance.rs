use serenity::all::User;
use tracing::info;

use crate::attendance::event::furnace_label;
use crate::db::admin::grant;
use crate::db::roster::{all_alliances, create_alliance, find_member, member_count, remove_member, require_alliance, upsert_member};
use crate::error::{Result, ValidationError};
use crate::models::RosterMember;

use super::{conn, require_admin, scope, whisper, Context};

#[poise::command(
    slash_command,
    subcommands(
        "alliance_list",
        "alliance_create",
        "alliance_member_add",
        "alliance_member_remove",
        "alliance_grant",
    )
)]
pub async fn alliance(_: Context<'_>) -> Result<()> { Ok(()) }

/// Lists the alliances you can manage
#[poise::command(slash_command, rename = "list")]
async fn alliance_list(ctx: Context<'_>) -> Result<()> {
    let lines = {
        let conn = &mut conn(ctx)?;
        let scope = scope(conn, ctx)?;

        let mut lines = vec![];
        for alliance in all_alliances(conn)? {
            if !scope.can_manage(alliance.alliance_id) {
                continue;
            }
            let count = member_count(conn, alliance.alliance_id)?;
            lines.push(format!("`{}` **{}** | {} members", alliance.alliance_id, alliance.name, count));
        }
        lines
    };

    let reply = if lines.is_empty() {
        "You don't manage any alliances.".to_string()
    } else {
        lines.join("\n")
    };
    whisper(ctx, reply).await
}

/// Creates an alliance (global admins only)
#[poise::command(slash_command, rename = "create")]
async fn alliance_create(
    ctx: Context<'_>,
    #[description = "Alliance name"] name: String,
) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName.into());
    }

    let created = {
        let conn = &mut conn(ctx)?;
        scope(conn, ctx)?.require_global()?;
        create_alliance(conn, name)?
    };

    info!("{} created alliance {} ({})", ctx.author().id, created.name, created.alliance_id);
    whisper(ctx, format!("Created **{}** with id `{}`.", created.name, created.alliance_id)).await
}

/// Adds a player to an alliance roster, or updates them
#[poise::command(slash_command, rename = "member_add")]
async fn alliance_member_add(
    ctx: Context<'_>,
    #[description = "Alliance id"] alliance: i64,
    #[description = "In-game player id"] player_id: i64,
    #[description = "In-game nickname"] nickname: String,
    #[description = "Furnace level"]
    #[min = 1]
    #[max = 100]
    furnace_level: Option<i32>,
) -> Result<()> {
    let nickname = nickname.trim().to_string();
    if nickname.is_empty() {
        return Err(ValidationError::EmptyName.into());
    }

    let new_member = RosterMember {
        player_id,
        nickname,
        furnace_level: furnace_level.unwrap_or(1),
        alliance_id: alliance,
    };

    let alliance = {
        let conn = &mut conn(ctx)?;
        let current = find_member(conn, player_id)?.map(|m| m.alliance_id);
        scope(conn, ctx)?.require_member_move(current, alliance)?;
        let alliance = require_alliance(conn, alliance)?;
        upsert_member(conn, &new_member)?;
        alliance
    };

    whisper(ctx, format!(
        "**{}** (`{}`, {}) is now in **{}**.",
        new_member.nickname,
        new_member.player_id,
        furnace_label(new_member.furnace_level),
        alliance.name
    )).await
}

/// Removes a player from an alliance roster. Their history is kept.
#[poise::command(slash_command, rename = "member_remove")]
async fn alliance_member_remove(
    ctx: Context<'_>,
    #[description = "Alliance id"] alliance: i64,
    #[description = "In-game player id"] player_id: i64,
) -> Result<()> {
    {
        let conn = &mut conn(ctx)?;
        require_admin(conn, ctx, alliance)?;
        remove_member(conn, alliance, player_id)?;
    }

    whisper(ctx, format!("Removed `{}` from the roster.", player_id)).await
}

/// Makes someone an admin of an alliance, or of everything (global admins only)
#[poise::command(slash_command, rename = "grant")]
async fn alliance_grant(
    ctx: Context<'_>,
    #[description = "New admin"] user: User,
    #[description = "Alliance id, leave empty for a global admin"] alliance: Option<i64>,
) -> Result<()> {
    {
        let conn = &mut conn(ctx)?;
        scope(conn, ctx)?.require_global()?;
        if let Some(aid) = alliance {
            require_alliance(conn, aid)?;
        }
        grant(conn, user.id, alliance)?;
    }

    info!("{} granted admin to {} (alliance {:?})", ctx.author().id, user.id, alliance);
    let reply = match alliance {
        Some(aid) => format!("{} can now manage alliance `{}`.", user.name, aid),
        None => format!("{} is now a global admin.", user.name),
    };
    whisper(ctx, reply).await
}
