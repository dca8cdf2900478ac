//! This module defines the interface for resolving user input (search terms or
//! links) into playable tracks, and the `yt-dlp` backed implementation.

/// Submodule defining the `TrackMetadata` struct used across audio sources.
pub mod track_metadata;
/// Submodule implementing the `AudioApi` trait with `yt-dlp`.
pub mod youtube;

use crate::commands::music::utils::music_manager::MusicResult;
use serenity::async_trait;
use track_metadata::{Requester, TrackMetadata};
use url::Url;

/// Resolves a search query or URL into tracks.
/// Requires `Send + Sync` to be shared through the framework data.
#[async_trait]
pub trait AudioApi: Send + Sync {
    /// Fetches up to `count` tracks for `query`, tagging each with `requester`.
    ///
    /// Fails with `MusicError::NotFound` when nothing matches or the extractor
    /// fails; the extractor's own output is only logged.
    async fn resolve(
        &self,
        query: &str,
        requester: &Requester,
        count: usize,
    ) -> MusicResult<Vec<TrackMetadata>>;
}

/// A utility struct providing general helper functions related to audio sources.
pub struct AudioSource;

impl AudioSource {
    /// True when `input` is an absolute http(s) link rather than a search phrase.
    pub fn is_url(input: &str) -> bool {
        Url::parse(input.trim())
            .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
            .unwrap_or(false)
    }

    /// True when an attachment's MIME type can be streamed as audio.
    pub fn is_audio_content_type(content_type: Option<&str>) -> bool {
        content_type.is_some_and(|mime| mime.trim().to_ascii_lowercase().starts_with("audio"))
    }
}
