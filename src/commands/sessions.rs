//! `/attendance` subcommands that work on saved sessions.

use std::fmt::Write;

use poise::CreateReply;
use serenity::builder::{CreateAttachment, CreateEmbed, CreateEmbedFooter};
use tracing::info;

use crate::attendance::event::EVENT_DATE_FORMAT;
use crate::attendance::export::{export_records, ExportFormat};
use crate::attendance::report::build_report;
use crate::attendance::store::{delete_session, list_sessions, resolve_session, session_records, update_event, EventUpdate};
use crate::db::roster::{members, require_alliance};
use crate::error::{DangerError, Result};
use crate::preferences::Preferences;
use crate::render::report_embed;

use super::{conn, require_admin, theme, whisper, Context, EventTypeChoice, ExportFormatChoice, LegionChoice};

const SESSIONS_PER_PAGE: usize = 10;

/// Shows the report of a saved session
#[poise::command(slash_command, rename = "report")]
pub(super) async fn attendance_report(
    ctx: Context<'_>,
    #[description = "Alliance id"] alliance: i64,
    #[description = "Session id or name"] session: String,
) -> Result<()> {
    let embed = {
        let conn = &mut conn(ctx)?;
        require_admin(conn, ctx, alliance)?;

        let roster = members(conn, alliance)?;
        let report = build_report(conn, &roster, alliance, &session, None)?;
        let prefs = Preferences::load(conn, ctx.author().id.get())?;
        report_embed(&report, &theme(conn, ctx)?, &prefs)
    };

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Lists an alliance's saved sessions, newest first
#[poise::command(slash_command, rename = "sessions")]
pub(super) async fn attendance_sessions(
    ctx: Context<'_>,
    #[description = "Alliance id"] alliance: i64,
    #[description = "Page number"]
    #[min = 1]
    page: Option<u32>,
) -> Result<()> {
    let (alliance, sessions, theme) = {
        let conn = &mut conn(ctx)?;
        require_admin(conn, ctx, alliance)?;
        (require_alliance(conn, alliance)?, list_sessions(conn, alliance)?, theme(conn, ctx)?)
    };

    let total_pages = sessions.len().div_ceil(SESSIONS_PER_PAGE).max(1);
    let page = (page.unwrap_or(1) as usize).clamp(1, total_pages);

    let mut fields = vec![];
    for summary in sessions.iter().skip((page - 1) * SESSIONS_PER_PAGE).take(SESSIONS_PER_PAGE) {
        let date = summary
            .event_date
            .map(|d| d.format(EVENT_DATE_FORMAT).to_string())
            .unwrap_or_else(|| "no date".to_string());

        let mut body = format!("{} | {}\n", summary.event_label(), date);
        let _ = write!(
            body,
            "{} {} | {} {} | {} {}\n`{}`",
            theme.present, summary.present,
            theme.absent, summary.absent,
            theme.not_recorded, summary.not_recorded,
            summary.session_id
        );
        fields.push((summary.session_name.clone(), body, false));
    }

    let mut embed = CreateEmbed::new()
        .title(format!("{} sessions", alliance.name))
        .color(theme.accent_color)
        .footer(CreateEmbedFooter::new(format!("Page {}/{} | {} sessions", page, total_pages, sessions.len())));
    if fields.is_empty() {
        embed = embed.description("No sessions recorded yet.");
    } else {
        embed = embed.fields(fields);
    }

    ctx.send(CreateReply::default().embed(embed).ephemeral(true)).await?;
    Ok(())
}

/// Renames a saved session or changes its event type, legion or date
#[poise::command(slash_command, rename = "edit_event")]
pub(super) async fn attendance_edit_event(
    ctx: Context<'_>,
    #[description = "Alliance id"] alliance: i64,
    #[description = "Session id or name"] session: String,
    #[description = "New name"] name: Option<String>,
    #[description = "New event type"] event_type: Option<EventTypeChoice>,
    #[description = "New legion"] legion: Option<LegionChoice>,
    #[description = "New date, YYYY-MM-DD HH:MM"] date: Option<String>,
) -> Result<()> {
    let update = EventUpdate {
        name,
        event_type: event_type.map(Into::into),
        legion: legion.map(Into::into),
        event_date: date,
    };

    let changed = {
        let conn = &mut conn(ctx)?;
        require_admin(conn, ctx, alliance)?;
        let sid = resolve_session(conn, alliance, &session)?;
        update_event(conn, &sid, &update)?
    };

    whisper(ctx, format!("Updated **{}** ({} records).", session, changed)).await
}

/// Deletes a saved session and all of its records
#[poise::command(slash_command, rename = "delete")]
pub(super) async fn attendance_delete(
    ctx: Context<'_>,
    #[description = "Alliance id"] alliance: i64,
    #[description = "Session id or name"] session: String,
    #[description = "Set to True to really delete, this can't be undone"] confirm: bool,
) -> Result<()> {
    if !confirm {
        return whisper(ctx, "Nothing deleted. Run the command again with `confirm: True`.").await;
    }

    let deleted = {
        let conn = &mut conn(ctx)?;
        require_admin(conn, ctx, alliance)?;
        let sid = resolve_session(conn, alliance, &session)?;
        delete_session(conn, &sid)?
    };

    info!("{} deleted session {} of alliance {}", ctx.author().id, session, alliance);
    whisper(ctx, format!("Deleted **{}** ({} records).", session, deleted)).await
}

/// Makes a file name safe for Discord attachments.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if stem.trim_matches('_').is_empty() {
        "attendance".to_string()
    } else {
        stem
    }
}

/// Downloads the records of a saved session
#[poise::command(slash_command, rename = "export")]
pub(super) async fn attendance_export(
    ctx: Context<'_>,
    #[description = "Alliance id"] alliance: i64,
    #[description = "Session id or name"] session: String,
    #[description = "File format"] format: Option<ExportFormatChoice>,
) -> Result<()> {
    let format = format.map(ExportFormat::from).unwrap_or(ExportFormat::Csv);

    let records = {
        let conn = &mut conn(ctx)?;
        require_admin(conn, ctx, alliance)?;
        let sid = resolve_session(conn, alliance, &session)?;
        session_records(conn, &sid)?
    };
    let first = records.first().ok_or_else(|| DangerError::NoRecords(session.clone()))?;

    let filename = format!("{}.{}", file_stem(&first.session_name), format.extension());
    let bytes = export_records(&records, format)?;

    let reply = CreateReply::default()
        .content(format!("{} records from **{}**", records.len(), first.session_name))
        .attachment(CreateAttachment::bytes(bytes, filename))
        .ephemeral(true);
    ctx.send(reply).await?;
    Ok(())
}
