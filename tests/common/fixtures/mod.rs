//! Sample guilds, channels and tracks used across the integration tests

use jukebox::commands::music::audio_sources::track_metadata::{Requester, TrackMetadata};
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::time::Duration;

pub const SAMPLE_USER_ID: u64 = 123456789;
pub const SAMPLE_CHANNEL_ID: u64 = 987654321;
pub const SAMPLE_GUILD_ID: u64 = 555555555;

pub fn guild() -> GuildId {
    GuildId::new(SAMPLE_GUILD_ID)
}

pub fn voice_channel() -> ChannelId {
    ChannelId::new(SAMPLE_CHANNEL_ID)
}

pub fn requester() -> Requester {
    Requester::new(UserId::new(SAMPLE_USER_ID), "listener")
}

/// A direct-media track named `title`, one minute long.
pub fn track(title: &str) -> TrackMetadata {
    let mut track = TrackMetadata::from_attachment(
        title,
        &format!("https://media.example/{}.mp3", title),
        requester(),
    );
    track.duration = Some(Duration::from_secs(60));
    track
}

pub fn tracks(titles: &[&str]) -> Vec<TrackMetadata> {
    titles.iter().map(|title| track(title)).collect()
}

pub fn titles(tracks: &[TrackMetadata]) -> Vec<String> {
    tracks.iter().map(|track| track.title.clone()).collect()
}
