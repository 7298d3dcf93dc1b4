//! Slash commands and the poise framework that carries them.

mod alliance;
mod attendance;
mod sessions;
mod settings;

use std::collections::HashSet;

use diesel::SqliteConnection;
use poise::CreateReply;
use tracing::{error, info, warn};

use crate::attendance::{AttendanceStatus, DraftStore, EventType, Legion, Marker, SortOrder};
use crate::attendance::export::ExportFormat;
use crate::config::Config;
use crate::db::{db_conn, AdminScope};
use crate::error::{DangerError, Result};
use crate::preferences::ReportType;
use crate::theme::Theme;

pub struct Data {
    pub config: Config,
    pub drafts: DraftStore,
}

pub type Context<'a> = poise::Context<'a, Data, DangerError>;

/// Opens the connection a command uses for its unit of work.
fn conn(ctx: Context<'_>) -> Result<SqliteConnection> {
    db_conn(&ctx.data().config.database_url)
}

fn scope(conn: &mut SqliteConnection, ctx: Context<'_>) -> Result<AdminScope> {
    AdminScope::load(conn, ctx.author().id, ctx.data().config.owner_id)
}

/// Fails unless the invoking user may manage `alliance`.
fn require_admin(conn: &mut SqliteConnection, ctx: Context<'_>, alliance: i64) -> Result<()> {
    scope(conn, ctx)?.require(alliance)
}

fn marker(ctx: Context<'_>) -> Marker {
    Marker {
        user_id: ctx.author().id.get() as i64,
        username: ctx.author().name.clone(),
    }
}

/// The guild's theme, or the default one outside of guilds.
fn theme(conn: &mut SqliteConnection, ctx: Context<'_>) -> Result<Theme> {
    match ctx.guild_id() {
        Some(gid) => Theme::load(conn, gid.get()),
        None => Ok(Theme::default()),
    }
}

/// Replies only the invoking user can see.
async fn whisper(ctx: Context<'_>, content: impl Into<String>) -> Result<()> {
    ctx.send(CreateReply::default().content(content).ephemeral(true)).await?;
    Ok(())
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum EventTypeChoice {
    Foundry,
    #[name = "Canyon Clash"]
    CanyonClash,
    #[name = "Crazy Joe"]
    CrazyJoe,
    #[name = "Bear Trap"]
    BearTrap,
    #[name = "Castle Battle"]
    CastleBattle,
    #[name = "Frostdragon Tyrant"]
    FrostdragonTyrant,
    Other,
}

impl From<EventTypeChoice> for EventType {
    fn from(choice: EventTypeChoice) -> Self {
        match choice {
            EventTypeChoice::Foundry => EventType::Foundry,
            EventTypeChoice::CanyonClash => EventType::CanyonClash,
            EventTypeChoice::CrazyJoe => EventType::CrazyJoe,
            EventTypeChoice::BearTrap => EventType::BearTrap,
            EventTypeChoice::CastleBattle => EventType::CastleBattle,
            EventTypeChoice::FrostdragonTyrant => EventType::FrostdragonTyrant,
            EventTypeChoice::Other => EventType::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum LegionChoice {
    #[name = "Legion 1"]
    One,
    #[name = "Legion 2"]
    Two,
    #[name = "No legion"]
    NoLegion,
}

impl From<LegionChoice> for Option<Legion> {
    fn from(choice: LegionChoice) -> Self {
        match choice {
            LegionChoice::One => Some(Legion::One),
            LegionChoice::Two => Some(Legion::Two),
            LegionChoice::NoLegion => None,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum StatusChoice {
    Present,
    Absent,
}

impl From<StatusChoice> for AttendanceStatus {
    fn from(choice: StatusChoice) -> Self {
        match choice {
            StatusChoice::Present => AttendanceStatus::Present,
            StatusChoice::Absent => AttendanceStatus::Absent,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum SortChoice {
    #[name = "Points (high to low)"]
    PointsDesc,
    #[name = "Name (A-Z, marked first)"]
    NameAsc,
    #[name = "Name (A-Z)"]
    NameAscAll,
    #[name = "Last attended first"]
    LastAttendedFirst,
}

impl From<SortChoice> for SortOrder {
    fn from(choice: SortChoice) -> Self {
        match choice {
            SortChoice::PointsDesc => SortOrder::PointsDesc,
            SortChoice::NameAsc => SortOrder::NameAsc,
            SortChoice::NameAscAll => SortOrder::NameAscAll,
            SortChoice::LastAttendedFirst => SortOrder::LastAttendedFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ReportTypeChoice {
    Text,
    Chart,
}

impl From<ReportTypeChoice> for ReportType {
    fn from(choice: ReportTypeChoice) -> Self {
        match choice {
            ReportTypeChoice::Text => ReportType::Text,
            ReportTypeChoice::Chart => ReportType::Chart,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ExportFormatChoice {
    #[name = "CSV"]
    Csv,
    #[name = "TSV"]
    Tsv,
    #[name = "HTML"]
    Html,
}

impl From<ExportFormatChoice> for ExportFormat {
    fn from(choice: ExportFormatChoice) -> Self {
        match choice {
            ExportFormatChoice::Csv => ExportFormat::Csv,
            ExportFormatChoice::Tsv => ExportFormat::Tsv,
            ExportFormatChoice::Html => ExportFormat::Html,
        }
    }
}

/// Validation, not-found and permission errors go back to the user as is.
/// Anything else is logged and replaced by a generic message.
async fn on_error(error: poise::FrameworkError<'_, Data, DangerError>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            let command = ctx.command().qualified_name.clone();
            let reply = if error.is_user_facing() {
                warn!("/{} by {}: {}", command, ctx.author().id, error);
                error.to_string()
            } else {
                error!("/{} by {} failed: {:?}", command, ctx.author().id, error);
                "Something went wrong on our side, nothing was saved. Please try again later.".to_string()
            };
            if let Err(e) = whisper(ctx, reply).await {
                error!("Unable to send error message: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Wrapper for the framework building
pub fn danger_framework(config: Config) -> poise::Framework<Data, DangerError> {
    let mut owners = HashSet::new();
    if let Some(owner) = config.owner_id {
        owners.insert(owner);
    }

    let options = poise::FrameworkOptions {
        commands: vec![
            attendance::attendance(),
            settings::settings(),
            alliance::alliance(),
        ],
        owners,
        on_error: |error| Box::pin(on_error(error)),
        ..Default::default()
    };

    poise::Framework::builder()
        .options(options)
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                let commands = &framework.options().commands;
                match config.guild_id {
                    Some(guild_id) => {
                        info!("Registering commands in guild {}", guild_id);
                        poise::builtins::register_in_guild(ctx, commands, guild_id).await?;
                    }
                    None => {
                        info!("Registering commands globally");
                        poise::builtins::register_globally(ctx, commands).await?;
                    }
                }
                Ok(Data {
                    config,
                    drafts: DraftStore::new(),
                })
            })
        })
        .build()
}
