use serenity::async_trait;
use serenity::http::Http;
use serenity::model::id::{ChannelId, GuildId};
use songbird::error::{ControlError, JoinError};
use songbird::input::{HttpRequest, Input, YoutubeDl};
use songbird::tracks::TrackHandle;
use songbird::{Event, Songbird, TrackEvent};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::event_handlers::SongEndNotifier;
use super::music_manager::{MusicError, MusicManager, MusicResult};
use super::player::{PlaybackToken, VoiceTransport};
use crate::commands::music::audio_sources::track_metadata::{SourceKind, TrackMetadata};

/// Voice transport for one guild, backed by the songbird driver.
pub struct SongbirdTransport {
    songbird: Arc<Songbird>,
    guild_id: GuildId,
    http: Arc<Http>,
    http_client: reqwest::Client,
    ytdlp_program: &'static str,
    manager: Weak<MusicManager>,
    current: Mutex<Option<TrackHandle>>,
}

impl SongbirdTransport {
    pub fn new(
        songbird: Arc<Songbird>,
        guild_id: GuildId,
        http: Arc<Http>,
        http_client: reqwest::Client,
        ytdlp_program: &'static str,
        manager: Weak<MusicManager>,
    ) -> Self {
        Self {
            songbird,
            guild_id,
            http,
            http_client,
            ytdlp_program,
            manager,
            current: Mutex::new(None),
        }
    }

    fn input_for(&self, track: &TrackMetadata) -> Input {
        match track.kind {
            SourceKind::Extracted => YoutubeDl::new_ytdl_like(
                self.ytdlp_program,
                self.http_client.clone(),
                track.page_url.clone(),
            )
            .into(),
            SourceKind::Direct => {
                HttpRequest::new(self.http_client.clone(), track.source_url.clone()).into()
            }
        }
    }

    fn control_error(e: ControlError) -> MusicError {
        MusicError::PlaybackError(e.to_string())
    }
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    async fn connect(&self, channel_id: ChannelId) -> MusicResult<()> {
        match self.songbird.join(self.guild_id, channel_id).await {
            Ok(_) => {
                info!("Joined voice channel {} in guild {}", channel_id, self.guild_id);
                Ok(())
            }
            Err(JoinError::TimedOut) => Err(MusicError::ConnectTimeout(format!("<#{}>", channel_id))),
            Err(e) => Err(MusicError::JoinError(e.to_string())),
        }
    }

    async fn disconnect(&self) -> MusicResult<()> {
        self.current.lock().await.take();

        match self.songbird.remove(self.guild_id).await {
            Ok(()) | Err(JoinError::NoCall) => {
                info!("Left voice in guild {}", self.guild_id);
                Ok(())
            }
            Err(e) => Err(MusicError::JoinError(e.to_string())),
        }
    }

    async fn start(&self, track: &TrackMetadata, token: PlaybackToken) -> MusicResult<()> {
        let call = self
            .songbird
            .get(self.guild_id)
            .ok_or(MusicError::NotConnected)?;

        let handle = call.lock().await.play_input(self.input_for(track));

        for event in [TrackEvent::End, TrackEvent::Error] {
            handle
                .add_event(
                    Event::Track(event),
                    SongEndNotifier {
                        manager: Weak::clone(&self.manager),
                        http: Arc::clone(&self.http),
                        guild_id: self.guild_id,
                        token,
                    },
                )
                .map_err(Self::control_error)?;
        }

        debug!(
            "Started '{}' in guild {} (token {})",
            track.title, self.guild_id, token
        );
        *self.current.lock().await = Some(handle);
        Ok(())
    }

    async fn pause(&self) -> MusicResult<()> {
        match self.current.lock().await.as_ref() {
            Some(handle) => handle.pause().map_err(Self::control_error),
            None => Err(MusicError::PlaybackError("no active track".to_string())),
        }
    }

    async fn resume(&self) -> MusicResult<()> {
        match self.current.lock().await.as_ref() {
            Some(handle) => handle.play().map_err(Self::control_error),
            None => Err(MusicError::PlaybackError("no active track".to_string())),
        }
    }

    async fn stop(&self) -> MusicResult<()> {
        let Some(handle) = self.current.lock().await.take() else {
            return Ok(());
        };

        match handle.stop() {
            Ok(()) | Err(ControlError::Finished) => Ok(()),
            Err(e) => Err(Self::control_error(e)),
        }
    }
}
