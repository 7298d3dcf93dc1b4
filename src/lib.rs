pub mod db;
use db::{models, schema};

pub mod attendance;
pub mod commands;
pub mod config;
pub mod error;
pub mod preferences;
pub mod render;
pub mod theme;

use std::env;
use error::{DangerError, Result};

/// Convenience function for getting an optional type whose underlying
/// id data type is a snowflake (e.g a user id). Unset or blank is `None`.
pub fn env_snowflake_opt<T: From<u64>> (key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => parse_snowflake(key, &raw).map(Some),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(DangerError::EnvVarError {
            key: key.to_string(),
            source: e,
        }),
    }
}

fn parse_snowflake<T: From<u64>>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<u64>()
        .map(T::from)
        .map_err(|e|
                 DangerError::SnowflakeParseError {
                     snowflake: key.to_string(),
                     source: e
                 })
}

pub fn env_str(key: &str) -> Result<String> {
    env::var(key)
        .map_err(|e|
                 DangerError::EnvVarError {
                     key: key.to_string(),
                     source: e
                 })
}
