//! Hand-written fake for the voice transport

use jukebox::commands::music::audio_sources::track_metadata::TrackMetadata;
use jukebox::commands::music::utils::music_manager::{MusicError, MusicResult};
use jukebox::commands::music::utils::player::{PlaybackToken, VoiceTransport};
use serenity::async_trait;
use serenity::model::id::ChannelId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One call made against a `RecordingTransport`.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Connect(ChannelId),
    Disconnect,
    Start(String, PlaybackToken),
    Pause,
    Resume,
    Stop,
}

/// Records every call; can be told to refuse some tracks or stall connects.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
    broken_titles: HashSet<String>,
    connect_delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A transport whose `start` fails for the given titles.
    pub fn refusing(titles: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            broken_titles: titles.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        })
    }

    /// A transport whose `connect` takes `delay` before succeeding.
    pub fn slow_connect(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            connect_delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Titles passed to `start`, in order.
    pub fn started(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Start(title, _) => Some(title),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VoiceTransport for RecordingTransport {
    async fn connect(&self, channel_id: ChannelId) -> MusicResult<()> {
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        self.record(TransportCall::Connect(channel_id));
        Ok(())
    }

    async fn disconnect(&self) -> MusicResult<()> {
        self.record(TransportCall::Disconnect);
        Ok(())
    }

    async fn start(&self, track: &TrackMetadata, token: PlaybackToken) -> MusicResult<()> {
        self.record(TransportCall::Start(track.title.clone(), token));
        if self.broken_titles.contains(&track.title) {
            return Err(MusicError::PlaybackError(format!("cannot open {}", track.title)));
        }
        Ok(())
    }

    async fn pause(&self) -> MusicResult<()> {
        self.record(TransportCall::Pause);
        Ok(())
    }

    async fn resume(&self) -> MusicResult<()> {
        self.record(TransportCall::Resume);
        Ok(())
    }

    async fn stop(&self) -> MusicResult<()> {
        self.record(TransportCall::Stop);
        Ok(())
    }
}
