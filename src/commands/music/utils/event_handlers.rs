use serenity::async_trait;
use serenity::http::Http;
use serenity::model::id::GuildId;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

use super::music_manager::MusicManager;
use super::player::{PlaybackToken, Transition};

/// Event handler for when a song ends or fails.
///
/// Carries the token of the playback it was attached to, so events from
/// tracks that were already skipped or stopped do not advance the queue.
pub struct SongEndNotifier {
    pub manager: Weak<MusicManager>,
    pub http: Arc<Http>,
    pub guild_id: GuildId,
    pub token: PlaybackToken,
}

#[async_trait]
impl songbird::EventHandler for SongEndNotifier {
    async fn act(&self, ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(tracks) = ctx {
            for (state, _) in tracks.iter() {
                if let songbird::tracks::PlayMode::Errored(e) = &state.playing {
                    warn!("Track errored in guild {}: {:?}", self.guild_id, e);
                }
            }
            self.handle_track_end().await;
        }
        None
    }
}

impl SongEndNotifier {
    async fn handle_track_end(&self) {
        let Some(manager) = self.manager.upgrade() else {
            return;
        };

        match manager.handle_track_end(self.guild_id, self.token).await {
            Transition::Applied => manager.refresh_display(&self.http, self.guild_id).await,
            Transition::Ignored => debug!(
                "Ignoring stale track end for guild {} (token {})",
                self.guild_id, self.token
            ),
        }
    }
}
