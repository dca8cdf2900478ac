use dashmap::DashMap;
use serenity::http::Http;
use serenity::model::id::GuildId;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::player::{Player, PlayerSnapshot, PlaybackToken, SharedPlayer, Transition, VoiceTransport};
use crate::commands::music::audio_sources::track_metadata::TrackMetadata;
use super::status_display::StatusDisplay;

/// Errors that can occur during music operations.
///
/// Every variant's message is written for the person who ran the command.
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("This command only works in a server")]
    NotInGuild,

    #[error("I'm not connected to a voice channel")]
    NotConnected,

    #[error("Failed to get voice manager")]
    NoVoiceManager,

    #[error("No channel to join. Please either specify a valid channel or join one.")]
    UserNotInVoiceChannel,

    #[error("Connecting to channel {0} timed out.")]
    ConnectTimeout(String),

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Please upload an audio file. (Invalid file type: `{0}`)")]
    InvalidAttachment(String),

    #[error("Could not find a track at position {position} (the queue has {len})")]
    OutOfRange { position: usize, len: usize },

    #[error("The queue is empty")]
    EmptyQueue,

    #[error("Could not find a track for \"{0}\"")]
    NotFound(String),

    #[error("Playback error: {0}")]
    PlaybackError(String),

    #[error("The player for this server has already been shut down")]
    PlayerDiscarded,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// Guild-keyed registry of players and status displays.
///
/// Players are created lazily by the first command that needs one and removed on
/// `leave` or when the bot is disconnected from voice. Status displays live
/// independently and are only ever replaced.
#[derive(Default)]
pub struct MusicManager {
    players: DashMap<GuildId, SharedPlayer>,
    displays: DashMap<GuildId, Arc<StatusDisplay>>,
}

impl MusicManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self, guild_id: GuildId) -> Option<SharedPlayer> {
        self.players.get(&guild_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the guild's player, creating it around the transport built by
    /// `make_transport` when there is none yet.
    pub fn get_or_create_player<F>(
        &self,
        guild_id: GuildId,
        connect_timeout: Duration,
        make_transport: F,
    ) -> SharedPlayer
    where
        F: FnOnce() -> Arc<dyn VoiceTransport>,
    {
        let entry = self.players.entry(guild_id).or_insert_with(|| {
            debug!("Creating player for guild {}", guild_id);
            Player::shared(guild_id, make_transport(), connect_timeout)
        });
        Arc::clone(entry.value())
    }

    /// The guild's player, if it holds a voice connection.
    pub async fn connected_player(&self, guild_id: GuildId) -> MusicResult<SharedPlayer> {
        let player = self.player(guild_id).ok_or(MusicError::NotConnected)?;
        let connected = player.lock().await.is_connected();
        if connected {
            Ok(player)
        } else {
            Err(MusicError::NotConnected)
        }
    }

    /// Makes the guild's player leave voice and forgets it. Does nothing when
    /// the guild has no player.
    pub async fn teardown(&self, guild_id: GuildId) {
        let Some(player) = self.player(guild_id) else {
            return;
        };

        player.lock().await.leave().await;

        // A fresh player may have been registered while this one was leaving.
        self.players
            .remove_if(&guild_id, |_, current| Arc::ptr_eq(current, &player));
        info!("Removed player for guild {}", guild_id);
    }

    /// Feeds a track-end event to the guild's player. Returns whether the
    /// player moved on.
    pub async fn handle_track_end(&self, guild_id: GuildId, token: PlaybackToken) -> Transition {
        match self.player(guild_id) {
            Some(player) => player.lock().await.on_track_end(token).await,
            None => {
                debug!("Track end for guild {} without a player", guild_id);
                Transition::Ignored
            }
        }
    }

    /// Current playback state of the guild, idle when it has no player.
    pub async fn snapshot(&self, guild_id: GuildId) -> PlayerSnapshot {
        match self.player(guild_id) {
            Some(player) => player.lock().await.snapshot(),
            None => PlayerSnapshot::idle(),
        }
    }

    /// Queues `tracks` on `player` in a task nobody has to wait for, then runs
    /// `on_queued`. A player that left before the task ran drops the tracks and
    /// `on_queued` is skipped.
    pub fn enqueue_detached<F, Fut>(
        player: SharedPlayer,
        tracks: Vec<TrackMetadata>,
        on_queued: F,
    ) -> JoinHandle<MusicResult<usize>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(async move {
            let queued = player.lock().await.enqueue_many(tracks).await;
            match &queued {
                Ok(count) => {
                    debug!("Queued {} tracks in the background", count);
                    on_queued().await;
                }
                Err(MusicError::PlayerDiscarded) => {
                    debug!("Player left before background tracks were queued");
                }
                Err(e) => warn!("Failed to queue tracks in the background: {}", e),
            }
            queued
        })
    }

    pub fn display(&self, guild_id: GuildId) -> Option<Arc<StatusDisplay>> {
        self.displays.get(&guild_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Installs `display` for the guild and returns the one it replaces.
    pub fn set_display(
        &self,
        guild_id: GuildId,
        display: StatusDisplay,
    ) -> Option<Arc<StatusDisplay>> {
        self.displays.insert(guild_id, Arc::new(display))
    }

    /// Re-renders the guild's status display, if it has one. Failures are
    /// logged and otherwise ignored.
    pub async fn refresh_display(&self, http: &Http, guild_id: GuildId) {
        let Some(display) = self.display(guild_id) else {
            return;
        };

        let snapshot = self.snapshot(guild_id).await;
        if let Err(e) = display.refresh(http, &snapshot).await {
            warn!(
                "Error updating status display for guild {}: {}",
                guild_id, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::music::audio_sources::track_metadata::{Requester, TrackMetadata};
    use crate::commands::music::utils::player::{MockVoiceTransport, PlayerState};
    use assert_matches::assert_matches;
    use serenity::model::id::{ChannelId, UserId};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn transport() -> Arc<dyn VoiceTransport> {
        let mut transport = MockVoiceTransport::new();
        transport.expect_connect().returning(|_| Ok(()));
        transport.expect_disconnect().returning(|| Ok(()));
        transport.expect_start().returning(|_, _| Ok(()));
        transport.expect_stop().returning(|| Ok(()));
        Arc::new(transport)
    }

    fn track(title: &str) -> TrackMetadata {
        TrackMetadata::from_attachment(
            title,
            "https://media.example/a.mp3",
            Requester::new(UserId::new(1), "tester"),
        )
    }

    #[tokio::test]
    async fn players_are_created_once_per_guild() {
        let manager = MusicManager::new();
        let guild = GuildId::new(1);

        let first = manager.get_or_create_player(guild, TIMEOUT, transport);
        let second = manager.get_or_create_player(guild, TIMEOUT, || {
            panic!("transport must not be rebuilt for an existing player")
        });

        assert!(Arc::ptr_eq(&first, &second));
        assert!(manager.player(GuildId::new(2)).is_none());
    }

    #[tokio::test]
    async fn connected_player_requires_a_connection() {
        let manager = MusicManager::new();
        let guild = GuildId::new(1);

        assert_matches!(manager.connected_player(guild).await, Err(MusicError::NotConnected));

        let player = manager.get_or_create_player(guild, TIMEOUT, transport);
        assert_matches!(manager.connected_player(guild).await, Err(MusicError::NotConnected));

        player.lock().await.join(ChannelId::new(5)).await.unwrap();
        assert!(manager.connected_player(guild).await.is_ok());
    }

    #[tokio::test]
    async fn teardown_discards_the_player() {
        let manager = MusicManager::new();
        let guild = GuildId::new(1);
        let player = manager.get_or_create_player(guild, TIMEOUT, transport);
        player.lock().await.join(ChannelId::new(5)).await.unwrap();

        manager.teardown(guild).await;

        assert!(manager.player(guild).is_none());
        let old = player.lock().await;
        assert!(!old.is_active());
        assert_eq!(old.state(), PlayerState::Idle);
    }

    #[tokio::test]
    async fn teardown_without_player_is_a_no_op() {
        let manager = MusicManager::new();
        manager.teardown(GuildId::new(9)).await;
        assert!(manager.player(GuildId::new(9)).is_none());
    }

    #[tokio::test]
    async fn track_end_is_routed_to_the_guild_player() {
        let manager = MusicManager::new();
        let guild = GuildId::new(1);
        let player = manager.get_or_create_player(guild, TIMEOUT, transport);
        {
            let mut player = player.lock().await;
            player.join(ChannelId::new(5)).await.unwrap();
            player.enqueue_many(vec![track("A"), track("B")]).await.unwrap();
        }
        let token = player.lock().await.current_token();

        assert_eq!(manager.handle_track_end(guild, token).await, Transition::Applied);
        assert_eq!(
            manager.snapshot(guild).await.now_playing.map(|t| t.title),
            Some("B".to_string())
        );
        assert_eq!(
            manager.handle_track_end(GuildId::new(2), token).await,
            Transition::Ignored
        );
    }

    #[tokio::test]
    async fn snapshot_of_unknown_guild_is_idle() {
        let manager = MusicManager::new();
        assert_eq!(manager.snapshot(GuildId::new(3)).await, PlayerSnapshot::idle());
    }
}
