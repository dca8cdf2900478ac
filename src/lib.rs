//! Guild music bot: a per-guild queue/player streaming tracks into one shared
//! voice connection, driven by slash and prefix commands.

use std::sync::Arc;

pub mod commands;
pub mod config;
pub mod events;

use commands::music::audio_sources::AudioApi;
use commands::music::utils::music_manager::MusicManager;
use config::Config;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// User data shared by every command invocation and event.
pub struct Data {
    pub config: Arc<Config>,
    /// Guild-keyed players and status displays.
    pub music: Arc<MusicManager>,
    /// Resolves queries and links into tracks.
    pub resolver: Arc<dyn AudioApi>,
    /// Client handed to songbird inputs when a track starts streaming.
    pub http_client: reqwest::Client,
    /// yt-dlp executable used by songbird to stream extracted tracks.
    pub ytdlp_program: &'static str,
}
