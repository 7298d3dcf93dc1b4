use std::fmt::Write;

use chrono::Utc;
use poise::CreateReply;
use serenity::builder::{CreateEmbed, CreateEmbedFooter};
use tracing::info;

use crate::attendance::event::furnace_label;
use crate::attendance::report::{build_report, draft_report};
use crate::attendance::selection::RosterPage;
use crate::attendance::session::SessionDraft;
use crate::attendance::store::{finalize, resolve_session, session_records};
use crate::attendance::{event_label, AttendanceStatus, EventType, SessionState};
use crate::db::roster::{members, require_alliance};
use crate::error::{DangerError, Result, ValidationError};
use crate::models::RosterMember;
use crate::preferences::Preferences;
use crate::render::report_embed;

use super::sessions::{
    attendance_delete, attendance_edit_event, attendance_export, attendance_report, attendance_sessions,
};
use super::{conn, marker, require_admin, theme, whisper, Context, EventTypeChoice, LegionChoice, StatusChoice};

#[poise::command(
    slash_command,
    subcommands(
        "attendance_start",
        "attendance_event",
        "attendance_roster",
        "attendance_mark",
        "attendance_unmark",
        "attendance_preview",
        "attendance_finalize",
        "attendance_cancel",
        "attendance_edit",
        "attendance_report",
        "attendance_sessions",
        "attendance_edit_event",
        "attendance_delete",
        "attendance_export",
    )
)]
pub async fn attendance(_: Context<'_>) -> Result<()> { Ok(()) }

/// Splits `"123, 456 789"` into player ids.
fn parse_player_ids(input: &str) -> Result<Vec<i64>> {
    let ids = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<i64>().map_err(|_| ValidationError::UnknownValue {
                what: "player id",
                value: token.to_string(),
            })
        })
        .collect::<std::result::Result<Vec<i64>, ValidationError>>()?;

    if ids.is_empty() {
        return Err(ValidationError::EmptySelection.into());
    }
    Ok(ids)
}

/// Looks every id up in the roster. Unknown ids fail the whole batch.
fn pick_players(roster: &[RosterMember], ids: &[i64]) -> Result<Vec<RosterMember>> {
    ids.iter()
        .map(|id| {
            roster
                .iter()
                .find(|m| m.player_id == *id)
                .cloned()
                .ok_or(DangerError::PlayerNotFound(*id))
        })
        .collect()
}

fn next_step(draft: &SessionDraft) -> String {
    match draft.state() {
        SessionState::Draft => "Next: pick the event type with `/attendance event`.".to_string(),
        SessionState::EventTypeChosen => format!(
            "Next: pick a legion for {} with `/attendance event`.",
            draft.event_type.map(|t| t.to_string()).unwrap_or_default()
        ),
        SessionState::Marking | SessionState::Editing => {
            let (present, absent) = draft.selection.counts();
            format!(
                "{} present, {} absent so far. Mark players with `/attendance mark`, then `/attendance finalize`.",
                present, absent
            )
        }
    }
}

/// Starts a new attendance session for an alliance
#[poise::command(slash_command, rename = "start")]
async fn attendance_start(
    ctx: Context<'_>,
    #[description = "Alliance id"] alliance: i64,
    #[description = "Session name"] name: String,
    #[description = "Event date, YYYY-MM-DD HH:MM"] date: Option<String>,
) -> Result<()> {
    let alliance = {
        let conn = &mut conn(ctx)?;
        require_admin(conn, ctx, alliance)?;
        require_alliance(conn, alliance)?
    };

    let draft = SessionDraft::new(alliance, &name, date.as_deref())?;
    let mut reply = format!("Started **{}** for **{}**.\n", draft.name, draft.alliance.name);
    reply.push_str(&next_step(&draft));

    if let Some(old) = ctx.data().drafts.put(ctx.author().id, draft).await {
        let _ = write!(reply, "\nYour unsaved session **{}** was discarded.", old.name);
    }

    whisper(ctx, reply).await
}

/// Picks the event type (and legion, for Foundry and Canyon Clash)
#[poise::command(slash_command, rename = "event")]
async fn attendance_event(
    ctx: Context<'_>,
    #[description = "Event type"] event_type: EventTypeChoice,
    #[description = "Legion (Foundry and Canyon Clash only)"] legion: Option<LegionChoice>,
) -> Result<()> {
    let event_type = EventType::from(event_type);

    let draft = ctx.data().drafts.update(ctx.author().id, |draft| {
        let draft = draft.with_event_type(event_type)?;
        match legion {
            Some(legion) => draft.with_legion(legion.into()),
            None => Ok(draft),
        }
    }).await?;

    let reply = format!(
        "Event set to **{}**.\n{}",
        event_label(event_type, draft.legion()),
        next_step(&draft)
    );
    whisper(ctx, reply).await
}

/// Shows the alliance roster with the marks made so far
#[poise::command(slash_command, rename = "roster")]
async fn attendance_roster(
    ctx: Context<'_>,
    #[description = "Filter by name or player id"] filter: Option<String>,
    #[description = "Page number"]
    #[min = 1]
    page: Option<u32>,
) -> Result<()> {
    let draft = ctx.data().drafts.get(ctx.author().id).await?;

    let (roster, theme) = {
        let conn = &mut conn(ctx)?;
        (members(conn, draft.alliance.alliance_id)?, theme(conn, ctx)?)
    };

    let page = RosterPage::new(&roster, filter.as_deref(), page.unwrap_or(1).saturating_sub(1) as usize);

    let mut body = String::new();
    for member in &page.members {
        let status = draft
            .selection
            .get(member.player_id)
            .map(|mark| mark.status)
            .unwrap_or(AttendanceStatus::NotRecorded);
        let _ = writeln!(
            body,
            "{} **{}** `{}` | {}",
            theme.icon(status),
            member.nickname,
            member.player_id,
            furnace_label(member.furnace_level)
        );
    }
    if body.is_empty() {
        body.push_str("No players match.");
    }

    let footer = format!(
        "Page {}/{} | {} players",
        page.page + 1,
        page.total_pages,
        page.total_matches
    );
    let embed = CreateEmbed::new()
        .title(format!("{} | {}", draft.alliance.name, draft.name))
        .description(body)
        .color(theme.accent_color)
        .footer(CreateEmbedFooter::new(footer));

    ctx.send(CreateReply::default().embed(embed).ephemeral(true)).await?;
    Ok(())
}

/// Marks players present or absent
#[poise::command(slash_command, rename = "mark")]
async fn attendance_mark(
    ctx: Context<'_>,
    #[description = "Player ids, separated by commas or spaces"] players: String,
    #[description = "Status"] status: StatusChoice,
    #[description = "Points for present players, e.g. 4.3K"] points: Option<String>,
) -> Result<()> {
    let status = AttendanceStatus::from(status);
    let ids = parse_player_ids(&players)?;

    let alliance_id = ctx.data().drafts.get(ctx.author().id).await?.alliance.alliance_id;
    let roster = {
        let conn = &mut conn(ctx)?;
        members(conn, alliance_id)?
    };
    let picked = pick_players(&roster, &ids)?;

    let draft = ctx.data().drafts.update(ctx.author().id, |draft| {
        draft.with_marks(&picked, status, points.as_deref())
    }).await?;

    let names: Vec<&str> = picked.iter().map(|p| p.nickname.as_str()).collect();
    let reply = format!(
        "Marked {} as **{}**.\n{}",
        names.join(", "),
        status.label(),
        next_step(&draft)
    );
    whisper(ctx, reply).await
}

/// Clears a player's mark
#[poise::command(slash_command, rename = "unmark")]
async fn attendance_unmark(
    ctx: Context<'_>,
    #[description = "Player id"] player: i64,
) -> Result<()> {
    let draft = ctx.data().drafts.update(ctx.author().id, |draft| {
        if draft.selection.get(player).is_none() {
            return Err(DangerError::PlayerNotFound(player));
        }
        draft.without_mark(player)
    }).await?;

    whisper(ctx, format!("Cleared the mark of {}.\n{}", player, next_step(&draft))).await
}

/// Shows the report as it would look if finalized now
#[poise::command(slash_command, rename = "preview")]
async fn attendance_preview(ctx: Context<'_>) -> Result<()> {
    let draft = ctx.data().drafts.get(ctx.author().id).await?;

    let embed = {
        let conn = &mut conn(ctx)?;
        let roster = members(conn, draft.alliance.alliance_id)?;
        let report = draft_report(conn, &draft, &roster, Utc::now().naive_utc())?;
        let prefs = Preferences::load(conn, ctx.author().id.get())?;
        report_embed(&report, &theme(conn, ctx)?, &prefs)
    };

    ctx.send(CreateReply::default().embed(embed).ephemeral(true)).await?;
    Ok(())
}

/// Saves the session. Unmarked roster members are recorded as not recorded.
#[poise::command(slash_command, rename = "finalize")]
async fn attendance_finalize(ctx: Context<'_>) -> Result<()> {
    let draft = ctx.data().drafts.get(ctx.author().id).await?;
    draft.ensure_ready()?;

    let (outcome, embed) = {
        let conn = &mut conn(ctx)?;
        let alliance_id = draft.alliance.alliance_id;
        require_admin(conn, ctx, alliance_id)?;

        let roster = members(conn, alliance_id)?;
        let outcome = finalize(conn, &draft, &roster, &marker(ctx), Utc::now().naive_utc())?;

        let report = build_report(conn, &roster, alliance_id, &outcome.session_id, None)?;
        let prefs = Preferences::load(conn, ctx.author().id.get())?;
        (outcome, report_embed(&report, &theme(conn, ctx)?, &prefs))
    };

    ctx.data().drafts.take(ctx.author().id).await;

    let content = format!(
        "Saved **{}**: {} present, {} absent, {} not recorded.",
        draft.name, outcome.present, outcome.absent, outcome.not_recorded
    );
    ctx.send(CreateReply::default().content(content).embed(embed)).await?;
    Ok(())
}

/// Throws away your unsaved session
#[poise::command(slash_command, rename = "cancel")]
async fn attendance_cancel(ctx: Context<'_>) -> Result<()> {
    let draft = ctx.data().drafts.take(ctx.author().id).await.ok_or(DangerError::NoDraft)?;
    info!("{} cancelled draft {}", ctx.author().id, draft.name);

    whisper(ctx, format!("Discarded **{}**. Nothing was saved.", draft.name)).await
}

/// Reopens a saved session to change its marks
#[poise::command(slash_command, rename = "edit")]
async fn attendance_edit(
    ctx: Context<'_>,
    #[description = "Alliance id"] alliance: i64,
    #[description = "Session id or name"] session: String,
) -> Result<()> {
    let draft = {
        let conn = &mut conn(ctx)?;
        require_admin(conn, ctx, alliance)?;
        let alliance = require_alliance(conn, alliance)?;
        let sid = resolve_session(conn, alliance.alliance_id, &session)?;
        let records = session_records(conn, &sid)?;
        SessionDraft::editing(alliance, &records)?
    };

    let mut reply = format!("Editing **{}**.\n{}", draft.name, next_step(&draft));
    if let Some(old) = ctx.data().drafts.put(ctx.author().id, draft).await {
        let _ = write!(reply, "\nYour unsaved session **{}** was discarded.", old.name);
    }

    whisper(ctx, reply).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<RosterMember> {
        vec![
            RosterMember { player_id: 11, nickname: "A".to_string(), furnace_level: 30, alliance_id: 1 },
            RosterMember { player_id: 22, nickname: "B".to_string(), furnace_level: 25, alliance_id: 1 },
        ]
    }

    #[test]
    fn player_ids_accept_commas_and_spaces() {
        assert_eq!(parse_player_ids("11, 22 33").unwrap(), vec![11, 22, 33]);
        assert_eq!(parse_player_ids(" 11 ").unwrap(), vec![11]);
        assert!(matches!(
            parse_player_ids("  ,"),
            Err(DangerError::Validation(ValidationError::EmptySelection))
        ));
        assert!(matches!(
            parse_player_ids("11, bob"),
            Err(DangerError::Validation(ValidationError::UnknownValue { .. }))
        ));
    }

    #[test]
    fn unknown_players_fail_the_batch() {
        let picked = pick_players(&roster(), &[22, 11]).unwrap();
        assert_eq!(picked.iter().map(|p| p.player_id).collect::<Vec<_>>(), vec![22, 11]);

        assert!(matches!(pick_players(&roster(), &[11, 99]), Err(DangerError::PlayerNotFound(99))));
    }
}
