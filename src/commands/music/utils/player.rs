//! Per-guild player: owns the playback queue and the now-playing track, and
//! drives a [`VoiceTransport`] through the `Idle` / `ConnectedSilent` /
//! `Playing` / `Paused` state machine.

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use serenity::model::mention::Mentionable;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::music_manager::{MusicError, MusicResult};
use super::queue_manager::PlaybackQueue;
use crate::commands::music::audio_sources::track_metadata::TrackMetadata;

/// Identifies one started track. Completion events carrying an older token
/// belong to a track that was already skipped or replaced.
pub type PlaybackToken = u64;

/// A guild player shared between commands, buttons and track-end events.
pub type SharedPlayer = Arc<Mutex<Player>>;

/// The voice connection and audio sink of one guild.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// Connects to `channel_id`, or moves an existing connection there.
    async fn connect(&self, channel_id: ChannelId) -> MusicResult<()>;

    /// Drops the voice connection. Succeeds when it is already gone.
    async fn disconnect(&self) -> MusicResult<()>;

    /// Starts streaming `track`. The transport must report the end of this
    /// track back to the player with `token`.
    async fn start(&self, track: &TrackMetadata, token: PlaybackToken) -> MusicResult<()>;

    async fn pause(&self) -> MusicResult<()>;

    async fn resume(&self) -> MusicResult<()>;

    /// Stops the current track.
    async fn stop(&self) -> MusicResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No voice connection.
    Idle,
    /// Connected, nothing streaming.
    ConnectedSilent,
    Playing,
    Paused,
}

/// Outcome of an operation that is a no-op outside some states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored,
}

/// Read-only copy of a player, taken for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub state: PlayerState,
    pub now_playing: Option<TrackMetadata>,
    pub queue: Vec<TrackMetadata>,
    pub queued_duration: Duration,
}

impl PlayerSnapshot {
    /// What a guild without a player looks like.
    pub fn idle() -> Self {
        Self {
            state: PlayerState::Idle,
            now_playing: None,
            queue: Vec::new(),
            queued_duration: Duration::ZERO,
        }
    }
}

pub struct Player {
    guild_id: GuildId,
    queue: PlaybackQueue,
    now_playing: Option<TrackMetadata>,
    state: PlayerState,
    channel_id: Option<ChannelId>,
    transport: Arc<dyn VoiceTransport>,
    connect_timeout: Duration,
    token: PlaybackToken,
    // Cleared by `leave`; late enqueues and completions are dropped afterwards.
    active: bool,
}

#[cfg(test)]
impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("guild_id", &self.guild_id)
            .field("queue", &self.queue)
            .field("now_playing", &self.now_playing)
            .field("state", &self.state)
            .field("channel_id", &self.channel_id)
            .field("connect_timeout", &self.connect_timeout)
            .field("token", &self.token)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl Player {
    pub fn new(
        guild_id: GuildId,
        transport: Arc<dyn VoiceTransport>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            guild_id,
            queue: PlaybackQueue::new(),
            now_playing: None,
            state: PlayerState::Idle,
            channel_id: None,
            transport,
            connect_timeout,
            token: 0,
            active: true,
        }
    }

    pub fn shared(
        guild_id: GuildId,
        transport: Arc<dyn VoiceTransport>,
        connect_timeout: Duration,
    ) -> SharedPlayer {
        Arc::new(Mutex::new(Self::new(guild_id, transport, connect_timeout)))
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state != PlayerState::Idle
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn channel_id(&self) -> Option<ChannelId> {
        self.channel_id
    }

    pub fn now_playing(&self) -> Option<&TrackMetadata> {
        self.now_playing.as_ref()
    }

    /// Token of the track currently streaming (or last started).
    pub fn current_token(&self) -> PlaybackToken {
        self.token
    }

    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut PlaybackQueue {
        &mut self.queue
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            state: self.state,
            now_playing: self.now_playing.clone(),
            queue: self.queue.snapshot(),
            queued_duration: self.queue.total_duration(),
        }
    }

    /// Connects to `channel_id`, moving the connection when it is elsewhere.
    /// Joining the channel the player is already in does nothing.
    pub async fn join(&mut self, channel_id: ChannelId) -> MusicResult<Transition> {
        if !self.active {
            return Err(MusicError::PlayerDiscarded);
        }
        if self.is_connected() && self.channel_id == Some(channel_id) {
            debug!("Guild {} already connected to {}", self.guild_id, channel_id);
            return Ok(Transition::Ignored);
        }

        let moving = self.is_connected();
        match tokio::time::timeout(self.connect_timeout, self.transport.connect(channel_id)).await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                warn!(
                    "Voice {} for guild {} to {} timed out after {:?}",
                    if moving { "move" } else { "connect" },
                    self.guild_id,
                    channel_id,
                    self.connect_timeout
                );
                return Err(MusicError::ConnectTimeout(channel_id.mention().to_string()));
            }
        }

        self.channel_id = Some(channel_id);
        if self.state == PlayerState::Idle {
            self.state = PlayerState::ConnectedSilent;
        }
        info!("Guild {} joined voice channel {}", self.guild_id, channel_id);
        Ok(Transition::Applied)
    }

    /// Appends `tracks`; starts the first one if nothing is streaming.
    /// Returns how many tracks were queued.
    pub async fn enqueue_many(&mut self, tracks: Vec<TrackMetadata>) -> MusicResult<usize> {
        if !self.active {
            debug!(
                "Dropping {} late track(s) for discarded player of guild {}",
                tracks.len(),
                self.guild_id
            );
            return Err(MusicError::PlayerDiscarded);
        }

        let count = tracks.len();
        for track in tracks {
            self.queue.enqueue(track);
        }
        debug!("Queued {} track(s) for guild {}", count, self.guild_id);

        if self.state == PlayerState::ConnectedSilent {
            self.advance().await;
        }
        Ok(count)
    }

    /// Completion of the track started with `token`.
    pub async fn on_track_end(&mut self, token: PlaybackToken) -> Transition {
        let streaming = matches!(self.state, PlayerState::Playing | PlayerState::Paused);
        if !self.active || !streaming || token != self.token {
            debug!(
                "Ignoring stale track end {} for guild {} (current {}, {:?})",
                token, self.guild_id, self.token, self.state
            );
            return Transition::Ignored;
        }

        info!("Track ended for guild {}", self.guild_id);
        self.advance().await;
        Transition::Applied
    }

    pub async fn pause(&mut self) -> Transition {
        match self.state {
            PlayerState::Playing => match self.transport.pause().await {
                Ok(()) => {
                    self.state = PlayerState::Paused;
                    Transition::Applied
                }
                Err(e) => {
                    warn!("Failed to pause guild {}: {}", self.guild_id, e);
                    Transition::Ignored
                }
            },
            PlayerState::Idle | PlayerState::ConnectedSilent | PlayerState::Paused => {
                Transition::Ignored
            }
        }
    }

    pub async fn resume(&mut self) -> Transition {
        match self.state {
            PlayerState::Paused => match self.transport.resume().await {
                Ok(()) => {
                    self.state = PlayerState::Playing;
                    Transition::Applied
                }
                Err(e) => {
                    warn!("Failed to resume guild {}: {}", self.guild_id, e);
                    Transition::Ignored
                }
            },
            PlayerState::Idle | PlayerState::ConnectedSilent | PlayerState::Playing => {
                Transition::Ignored
            }
        }
    }

    /// Stops the current track (playing or paused) and moves on as if it had
    /// finished.
    pub async fn skip(&mut self) -> Transition {
        match self.state {
            PlayerState::Playing | PlayerState::Paused => {
                if let Err(e) = self.transport.stop().await {
                    warn!("Failed to stop current track in guild {}: {}", self.guild_id, e);
                }
                self.advance().await;
                Transition::Applied
            }
            PlayerState::Idle | PlayerState::ConnectedSilent => Transition::Ignored,
        }
    }

    /// Stops playback, forgets the queue and releases the voice connection.
    /// The player is unusable afterwards; leaving again does nothing.
    pub async fn leave(&mut self) {
        if !self.active {
            return;
        }
        if matches!(self.state, PlayerState::Playing | PlayerState::Paused) {
            if let Err(e) = self.transport.stop().await {
                debug!("Stop during leave failed for guild {}: {}", self.guild_id, e);
            }
        }
        if let Err(e) = self.transport.disconnect().await {
            debug!("Disconnect during leave failed for guild {}: {}", self.guild_id, e);
        }

        self.queue.clear();
        self.now_playing = None;
        self.channel_id = None;
        self.state = PlayerState::Idle;
        self.token += 1;
        self.active = false;
        info!("Player for guild {} left voice", self.guild_id);
    }

    /// Starts the next startable track, or goes silent when the queue runs dry.
    /// Tracks the transport refuses are skipped.
    async fn advance(&mut self) {
        self.now_playing = None;

        while let Some(track) = self.queue.dequeue_head() {
            self.token += 1;
            match self.transport.start(&track, self.token).await {
                Ok(()) => {
                    info!("Now playing '{}' in guild {}", track.title, self.guild_id);
                    self.now_playing = Some(track);
                    self.state = PlayerState::Playing;
                    return;
                }
                Err(e) => {
                    warn!(
                        "Skipping '{}' in guild {}, failed to start: {}",
                        track.title, self.guild_id, e
                    );
                }
            }
        }

        info!("No more tracks in queue for guild {}", self.guild_id);
        self.state = PlayerState::ConnectedSilent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::music::audio_sources::track_metadata::Requester;
    use assert_matches::assert_matches;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;
    use serenity::model::id::UserId;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn guild() -> GuildId {
        GuildId::new(10)
    }

    fn channel(id: u64) -> ChannelId {
        ChannelId::new(id)
    }

    fn track(title: &str) -> TrackMetadata {
        TrackMetadata::from_attachment(
            title,
            &format!("https://media.example/{}.mp3", title),
            Requester::new(UserId::new(3), "listener"),
        )
    }

    /// A transport that accepts everything.
    fn permissive() -> MockVoiceTransport {
        let mut transport = MockVoiceTransport::new();
        transport.expect_connect().returning(|_| Ok(()));
        transport.expect_disconnect().returning(|| Ok(()));
        transport.expect_start().returning(|_, _| Ok(()));
        transport.expect_pause().returning(|| Ok(()));
        transport.expect_resume().returning(|| Ok(()));
        transport.expect_stop().returning(|| Ok(()));
        transport
    }

    async fn connected(transport: MockVoiceTransport) -> Player {
        let mut player = Player::new(guild(), Arc::new(transport), TIMEOUT);
        assert_eq!(player.join(channel(1)).await.unwrap(), Transition::Applied);
        assert_eq!(player.state(), PlayerState::ConnectedSilent);
        player
    }

    fn queued_titles(player: &Player) -> Vec<String> {
        player.queue().snapshot().into_iter().map(|t| t.title).collect()
    }

    fn playing_title(player: &Player) -> Option<&str> {
        player.now_playing().map(|t| t.title.as_str())
    }

    #[tokio::test]
    async fn new_player_is_idle() {
        let player = Player::new(guild(), Arc::new(MockVoiceTransport::new()), TIMEOUT);
        assert_eq!(player.state(), PlayerState::Idle);
        assert!(!player.is_connected());
        assert!(player.is_active());
        assert_eq!(player.snapshot().queue.len(), 0);
    }

    #[tokio::test]
    async fn joining_the_current_channel_is_a_no_op() {
        let mut transport = MockVoiceTransport::new();
        transport.expect_connect().times(1).returning(|_| Ok(()));
        let mut player = connected(transport).await;

        assert_eq!(player.join(channel(1)).await.unwrap(), Transition::Ignored);
        assert_eq!(player.channel_id(), Some(channel(1)));
    }

    #[tokio::test]
    async fn joining_another_channel_moves_and_keeps_playback() {
        let mut transport = MockVoiceTransport::new();
        transport
            .expect_connect()
            .withf(|c| *c == ChannelId::new(1) || *c == ChannelId::new(2))
            .times(2)
            .returning(|_| Ok(()));
        transport.expect_start().returning(|_, _| Ok(()));
        let mut player = connected(transport).await;
        player.enqueue_many(vec![track("A")]).await.unwrap();

        assert_eq!(player.join(channel(2)).await.unwrap(), Transition::Applied);

        assert_eq!(player.channel_id(), Some(channel(2)));
        assert_eq!(player.state(), PlayerState::Playing);
        assert_eq!(playing_title(&player), Some("A"));
    }

    #[tokio::test]
    async fn transport_join_failure_leaves_player_idle() {
        let mut transport = MockVoiceTransport::new();
        transport
            .expect_connect()
            .returning(|_| Err(MusicError::JoinError("gateway closed".into())));
        let mut player = Player::new(guild(), Arc::new(transport), TIMEOUT);

        assert_matches!(player.join(channel(1)).await, Err(MusicError::JoinError(_)));
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(player.channel_id(), None);
    }

    struct StalledTransport;

    #[async_trait]
    impl VoiceTransport for StalledTransport {
        async fn connect(&self, _channel_id: ChannelId) -> MusicResult<()> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
        async fn disconnect(&self) -> MusicResult<()> {
            Ok(())
        }
        async fn start(&self, _track: &TrackMetadata, _token: PlaybackToken) -> MusicResult<()> {
            Ok(())
        }
        async fn pause(&self) -> MusicResult<()> {
            Ok(())
        }
        async fn resume(&self) -> MusicResult<()> {
            Ok(())
        }
        async fn stop(&self) -> MusicResult<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_connect_times_out() {
        let mut player = Player::new(guild(), Arc::new(StalledTransport), TIMEOUT);

        let result = player.join(channel(1)).await;

        assert_matches!(result, Err(MusicError::ConnectTimeout(ref mention)) if mention == "<#1>");
        assert_eq!(player.state(), PlayerState::Idle);
    }

    #[tokio::test]
    async fn enqueue_while_silent_starts_the_head() {
        let mut transport = MockVoiceTransport::new();
        transport.expect_connect().returning(|_| Ok(()));
        transport
            .expect_start()
            .withf(|track, token| track.title == "T" && *token == 1)
            .times(1)
            .returning(|_, _| Ok(()));
        let mut player = connected(transport).await;

        let queued = player.enqueue_many(vec![track("T")]).await.unwrap();

        assert_eq!(queued, 1);
        assert_eq!(player.state(), PlayerState::Playing);
        assert_eq!(playing_title(&player), Some("T"));
        assert_eq!(player.queue().len(), 0);
    }

    #[tokio::test]
    async fn enqueue_while_idle_only_queues() {
        let mut player = Player::new(guild(), Arc::new(MockVoiceTransport::new()), TIMEOUT);

        player.enqueue_many(vec![track("A")]).await.unwrap();

        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(queued_titles(&player), vec!["A"]);
        assert_eq!(player.now_playing(), None);
    }

    #[tokio::test]
    async fn completions_walk_through_the_queue() {
        let mut player = connected(permissive()).await;

        player.enqueue_many(vec![track("X"), track("Y")]).await.unwrap();
        assert_eq!(playing_title(&player), Some("X"));
        assert_eq!(queued_titles(&player), vec!["Y"]);

        let x = player.current_token();
        assert_eq!(player.on_track_end(x).await, Transition::Applied);
        assert_eq!(playing_title(&player), Some("Y"));
        assert!(player.queue().is_empty());

        let y = player.current_token();
        assert_eq!(player.on_track_end(y).await, Transition::Applied);
        assert_eq!(player.state(), PlayerState::ConnectedSilent);
        assert_eq!(player.now_playing(), None);
    }

    #[tokio::test]
    async fn stale_completion_changes_nothing() {
        let mut player = connected(permissive()).await;
        player.enqueue_many(vec![track("X"), track("Y")]).await.unwrap();
        let stale = player.current_token() - 1;

        assert_eq!(player.on_track_end(stale).await, Transition::Ignored);

        assert_eq!(playing_title(&player), Some("X"));
        assert_eq!(queued_titles(&player), vec!["Y"]);
    }

    #[tokio::test]
    async fn completion_while_silent_is_ignored() {
        let mut player = connected(permissive()).await;
        let token = player.current_token();
        assert_eq!(player.on_track_end(token).await, Transition::Ignored);
        assert_eq!(player.state(), PlayerState::ConnectedSilent);
    }

    #[tokio::test]
    async fn failed_start_skips_to_the_next_track() {
        let mut transport = MockVoiceTransport::new();
        transport.expect_connect().returning(|_| Ok(()));
        let mut seq = Sequence::new();
        transport
            .expect_start()
            .withf(|track, _| track.title == "broken")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(MusicError::PlaybackError("no codec".into())));
        transport
            .expect_start()
            .withf(|track, _| track.title == "fine")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        let mut player = connected(transport).await;

        player
            .enqueue_many(vec![track("broken"), track("fine")])
            .await
            .unwrap();

        assert_eq!(player.state(), PlayerState::Playing);
        assert_eq!(playing_title(&player), Some("fine"));
        assert!(player.queue().is_empty());
    }

    #[tokio::test]
    async fn pause_then_resume_keeps_track_and_queue() {
        let mut player = connected(permissive()).await;
        player.enqueue_many(vec![track("A"), track("B")]).await.unwrap();

        assert_eq!(player.pause().await, Transition::Applied);
        assert_eq!(player.state(), PlayerState::Paused);
        assert_eq!(player.resume().await, Transition::Applied);

        assert_eq!(player.state(), PlayerState::Playing);
        assert_eq!(playing_title(&player), Some("A"));
        assert_eq!(queued_titles(&player), vec!["B"]);
    }

    #[tokio::test]
    async fn pause_and_resume_outside_their_states_are_ignored() {
        let mut transport = MockVoiceTransport::new();
        transport.expect_connect().returning(|_| Ok(()));
        transport.expect_start().returning(|_, _| Ok(()));
        transport.expect_pause().never();
        transport.expect_resume().never();
        let mut player = connected(transport).await;

        assert_eq!(player.pause().await, Transition::Ignored);
        assert_eq!(player.resume().await, Transition::Ignored);

        player.enqueue_many(vec![track("A")]).await.unwrap();
        assert_eq!(player.resume().await, Transition::Ignored);
        assert_eq!(player.state(), PlayerState::Playing);
    }

    #[tokio::test]
    async fn failed_pause_keeps_playing() {
        let mut transport = MockVoiceTransport::new();
        transport.expect_connect().returning(|_| Ok(()));
        transport.expect_start().returning(|_, _| Ok(()));
        transport
            .expect_pause()
            .returning(|| Err(MusicError::PlaybackError("track gone".into())));
        let mut player = connected(transport).await;
        player.enqueue_many(vec![track("A")]).await.unwrap();

        assert_eq!(player.pause().await, Transition::Ignored);
        assert_eq!(player.state(), PlayerState::Playing);
    }

    #[tokio::test]
    async fn skip_while_paused_advances() {
        let mut player = connected(permissive()).await;
        player.enqueue_many(vec![track("A"), track("B")]).await.unwrap();
        player.pause().await;

        assert_eq!(player.skip().await, Transition::Applied);

        assert_eq!(player.state(), PlayerState::Playing);
        assert_eq!(playing_title(&player), Some("B"));
    }

    #[tokio::test]
    async fn skip_last_track_goes_silent_and_ignores_its_late_end() {
        let mut player = connected(permissive()).await;
        player.enqueue_many(vec![track("A")]).await.unwrap();
        let a = player.current_token();

        assert_eq!(player.skip().await, Transition::Applied);
        assert_eq!(player.state(), PlayerState::ConnectedSilent);

        // songbird still reports the end of the stopped track
        assert_eq!(player.on_track_end(a).await, Transition::Ignored);
        assert_eq!(player.state(), PlayerState::ConnectedSilent);
    }

    #[tokio::test]
    async fn skip_when_silent_is_ignored() {
        let mut transport = MockVoiceTransport::new();
        transport.expect_connect().returning(|_| Ok(()));
        transport.expect_stop().never();
        let mut player = connected(transport).await;

        assert_eq!(player.skip().await, Transition::Ignored);
    }

    #[tokio::test]
    async fn leave_resets_and_deactivates() {
        let mut transport = MockVoiceTransport::new();
        transport.expect_connect().returning(|_| Ok(()));
        transport.expect_start().returning(|_, _| Ok(()));
        transport.expect_stop().times(1).returning(|| Ok(()));
        transport.expect_disconnect().times(1).returning(|| Ok(()));
        let mut player = connected(transport).await;
        player.enqueue_many(vec![track("A"), track("B")]).await.unwrap();

        player.leave().await;

        assert_eq!(player.state(), PlayerState::Idle);
        assert!(!player.is_active());
        assert!(player.queue().is_empty());
        assert_eq!(player.now_playing(), None);
        assert_eq!(player.channel_id(), None);
    }

    #[tokio::test]
    async fn second_leave_does_not_touch_the_transport() {
        let mut transport = MockVoiceTransport::new();
        transport.expect_connect().returning(|_| Ok(()));
        transport.expect_disconnect().times(1).returning(|| Ok(()));
        let mut player = connected(transport).await;

        player.leave().await;
        let token = player.current_token();
        player.leave().await;

        assert_eq!(player.current_token(), token);
        assert!(!player.is_active());
    }

    #[tokio::test]
    async fn leave_tolerates_a_missing_connection() {
        let mut transport = MockVoiceTransport::new();
        transport
            .expect_disconnect()
            .returning(|| Err(MusicError::NotConnected));
        let mut player = Player::new(guild(), Arc::new(transport), TIMEOUT);

        player.leave().await;

        assert_eq!(player.state(), PlayerState::Idle);
        assert!(!player.is_active());
    }

    #[tokio::test]
    async fn late_work_after_leave_is_dropped() {
        let mut player = connected(permissive()).await;
        player.enqueue_many(vec![track("A")]).await.unwrap();
        let token = player.current_token();
        player.leave().await;

        assert_matches!(
            player.enqueue_many(vec![track("late")]).await,
            Err(MusicError::PlayerDiscarded)
        );
        assert_eq!(player.on_track_end(token).await, Transition::Ignored);
        assert_matches!(player.join(channel(1)).await, Err(MusicError::PlayerDiscarded));
        assert!(player.queue().is_empty());
    }

    #[tokio::test]
    async fn snapshot_reflects_state() {
        let mut player = connected(permissive()).await;
        let mut b = track("B");
        b.duration = Some(Duration::from_secs(30));
        player.enqueue_many(vec![track("A"), b]).await.unwrap();

        let snapshot = player.snapshot();

        assert_eq!(snapshot.state, PlayerState::Playing);
        assert_eq!(snapshot.now_playing.map(|t| t.title), Some("A".to_string()));
        assert_eq!(snapshot.queue.len(), 1);
        assert_eq!(snapshot.queued_duration, Duration::from_secs(30));
    }
}
