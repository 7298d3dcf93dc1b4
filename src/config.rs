use serenity::all::{GuildId, UserId};

use crate::error::Result;
use crate::{env_snowflake_opt, env_str};

/// Bot settings, read from the environment (and `.env`) once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub database_url: String,
    /// Commands are registered in this guild only when set, globally otherwise.
    pub guild_id: Option<GuildId>,
    /// Always treated as a global admin.
    pub owner_id: Option<UserId>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            bot_token: env_str("BOT_TOKEN")?,
            database_url: env_str("DATABASE_URL")?,
            guild_id: env_snowflake_opt("GUILD_ID")?,
            owner_id: env_snowflake_opt("OWNER_ID")?,
        })
    }
}
