//! Runtime settings read from the environment (after `.env` is loaded).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serenity::model::id::GuildId;

use crate::commands::music::utils::music_manager::MusicError;

const DEFAULT_PREFIX: &str = ",";
const DEFAULT_YTDLP: &str = "yt-dlp";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_TRACKS: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// Prefix for prefix-style invocations (`,play ...`).
    pub command_prefix: String,
    /// Path or name of the yt-dlp executable.
    pub ytdlp_path: String,
    /// Upper bound for a voice connect or move.
    pub connect_timeout: Duration,
    /// Upper clamp for the track count of a single `play`.
    pub max_tracks_per_request: usize,
    /// Register commands in this guild only (fast iteration during development).
    pub dev_guild_id: Option<GuildId>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, MusicError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MusicError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let discord_token = get("DISCORD_TOKEN")
            .ok_or_else(|| MusicError::ConfigError("Missing DISCORD_TOKEN".to_string()))?;

        let connect_timeout_secs: u64 =
            parse_or(get("CONNECT_TIMEOUT_SECS"), "CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?;
        if connect_timeout_secs == 0 {
            return Err(MusicError::ConfigError(
                "CONNECT_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        let max_tracks_per_request: usize =
            parse_or(get("MAX_TRACKS_PER_REQUEST"), "MAX_TRACKS_PER_REQUEST", DEFAULT_MAX_TRACKS)?;

        let dev_guild_id = match get("DEV_GUILD_ID") {
            Some(raw) => {
                let id: u64 = parse_value(&raw, "DEV_GUILD_ID")?;
                if id == 0 {
                    return Err(MusicError::ConfigError("DEV_GUILD_ID must not be 0".to_string()));
                }
                Some(GuildId::new(id))
            }
            None => None,
        };

        Ok(Self {
            discord_token,
            command_prefix: get("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            ytdlp_path: get("YTDLP_PATH").unwrap_or_else(|| DEFAULT_YTDLP.to_string()),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            max_tracks_per_request: max_tracks_per_request.max(1),
            dev_guild_id,
        })
    }

    /// Clamps a requested track count into `[1, max_tracks_per_request]`.
    pub fn clamp_track_count(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(1).clamp(1, self.max_tracks_per_request)
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, MusicError> {
    match raw {
        Some(raw) => parse_value(&raw, key),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(raw: &str, key: &str) -> Result<T, MusicError> {
    raw.trim()
        .parse()
        .map_err(|_| MusicError::ConfigError(format!("Invalid value for {}: {:?}", key, raw)))
}
