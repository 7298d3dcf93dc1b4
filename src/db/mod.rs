pub mod models;
pub mod schema;
pub mod roster;
pub mod admin;

mod migrations;

pub use migrations::run_migrations;
pub use admin::AdminScope;

use diesel::sqlite::SqliteConnection;
use diesel::prelude::*;

use crate::error::{DangerError, Result};

/// Opens a connection to the bot database. Every logical unit of work
/// gets its own connection, dropped when the work is done.
pub fn db_conn(database_url: &str) -> Result<SqliteConnection> {
    SqliteConnection::establish(database_url)
        .map_err(DangerError::from)
}

/// A migrated in-memory database, for tests.
pub fn memory_db() -> Result<SqliteConnection> {
    let mut conn = db_conn(":memory:")?;
    run_migrations(&mut conn)?;
    Ok(conn)
}
