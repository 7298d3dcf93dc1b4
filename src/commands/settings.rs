use poise::CreateReply;
use serenity::builder::CreateEmbed;

use crate::attendance::{AttendanceStatus, SortOrder};
use crate::error::{DangerError, Result, ValidationError};
use crate::preferences::{Preferences, ReportType};
use crate::theme::{parse_color, Theme};

use super::{conn, scope, theme, whisper, Context, ReportTypeChoice, SortChoice};

#[poise::command(
    slash_command,
    subcommands("settings_report", "settings_sort", "settings_theme", "settings_show")
)]
pub async fn settings(_: Context<'_>) -> Result<()> { Ok(()) }

/// Chooses how your reports are drawn
#[poise::command(slash_command, rename = "report")]
async fn settings_report(
    ctx: Context<'_>,
    #[description = "Report style"] style: ReportTypeChoice,
) -> Result<()> {
    let kind = ReportType::from(style);
    {
        let conn = &mut conn(ctx)?;
        Preferences::set_report_type(conn, ctx.author().id.get(), kind)?;
    }

    whisper(ctx, format!("Your reports will now be shown as {}.", kind.label())).await
}

/// Chooses how players are ordered in your reports
#[poise::command(slash_command, rename = "sort")]
async fn settings_sort(
    ctx: Context<'_>,
    #[description = "Sort order"] order: SortChoice,
) -> Result<()> {
    let order = SortOrder::from(order);
    {
        let conn = &mut conn(ctx)?;
        Preferences::set_sort_order(conn, ctx.author().id.get(), order)?;
    }

    whisper(ctx, format!("Reports will now be sorted by {}.", order.label())).await
}

/// Changes this server's report icons and color (global admins only)
#[poise::command(slash_command, guild_only, rename = "theme")]
async fn settings_theme(
    ctx: Context<'_>,
    #[description = "Icon for present players"] present: Option<String>,
    #[description = "Icon for absent players"] absent: Option<String>,
    #[description = "Icon for players nobody marked"] not_recorded: Option<String>,
    #[description = "Embed color, e.g. #1F8B4C"] color: Option<String>,
    #[description = "Go back to the default theme"] reset: Option<bool>,
) -> Result<()> {
    let Some(guild_id) = ctx.guild_id() else {
        return Err(DangerError::GuildOnly);
    };

    let accent = color
        .as_deref()
        .map(|c| {
            parse_color(c).ok_or_else(|| ValidationError::UnknownValue {
                what: "color",
                value: c.to_string(),
            })
        })
        .transpose()?;

    let updated = {
        let conn = &mut conn(ctx)?;
        scope(conn, ctx)?.require_global()?;

        let current = if reset.unwrap_or(false) {
            Theme::default()
        } else {
            Theme::load(conn, guild_id.get())?
        };
        let pick = |new: Option<String>, old: String| {
            new.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).unwrap_or(old)
        };

        let updated = Theme {
            present: pick(present, current.present),
            absent: pick(absent, current.absent),
            not_recorded: pick(not_recorded, current.not_recorded),
            accent_color: accent.unwrap_or(current.accent_color),
        };
        updated.save(conn, guild_id.get())?;
        updated
    };

    ctx.send(CreateReply::default().embed(theme_embed(&updated, "Theme updated")).ephemeral(true)).await?;
    Ok(())
}

/// Shows your report settings and this server's theme
#[poise::command(slash_command, rename = "show")]
async fn settings_show(ctx: Context<'_>) -> Result<()> {
    let (prefs, theme) = {
        let conn = &mut conn(ctx)?;
        (Preferences::load(conn, ctx.author().id.get())?, theme(conn, ctx)?)
    };

    let embed = theme_embed(&theme, "Settings")
        .field("Report style", prefs.report_type.label(), true)
        .field("Sort order", prefs.sort_order.label(), true);

    ctx.send(CreateReply::default().embed(embed).ephemeral(true)).await?;
    Ok(())
}

fn theme_embed(theme: &Theme, title: &str) -> CreateEmbed {
    let icons = [AttendanceStatus::Present, AttendanceStatus::Absent, AttendanceStatus::NotRecorded]
        .iter()
        .map(|s| format!("{} {}", theme.icon(*s), s.label()))
        .collect::<Vec<_>>()
        .join("\n");

    CreateEmbed::new()
        .title(title)
        .field("Icons", icons, false)
        .field("Color", format!("#{:06X}", theme.accent_color), false)
        .color(theme.accent_color)
}
