use tracing::info;

use dangerbot::commands::danger_framework;
use dangerbot::config::Config;
use dangerbot::db::{db_conn, run_migrations};
use dangerbot::error::{DangerError, Result};
use serenity::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {

    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    info!("Running pending migrations");
    {
        let conn = &mut db_conn(&config.database_url)?;
        run_migrations(conn)?;
    }
    info!("Done");

    let bot_token = config.bot_token.clone();
    let intents = GatewayIntents::non_privileged();

    info!("Building poise framework");
    let framework = danger_framework(config);
    info!("Done");

    info!("Building serenity client");
    let mut client = Client::builder(&bot_token, intents)
        .framework(framework)
        .await?;
    info!("Done");

    info!("Now starting DANGER!");
    client.start()
        .await
        .map_err(DangerError::from)
}
