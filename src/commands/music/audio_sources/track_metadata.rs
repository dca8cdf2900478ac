//! Defines `TrackMetadata`, the unified description of one queued track, and the
//! conversion from `yt-dlp` JSON entries.

use serde::Deserialize;
use serenity::model::id::UserId;
use serenity::model::mention::{Mention, Mentionable};
use serenity::model::user::User;
use std::fmt;
use std::time::Duration;

/// The user who asked for a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub id: UserId,
    pub name: String,
}

impl Requester {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn mention(&self) -> Mention {
        self.id.mention()
    }
}

impl From<&User> for Requester {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.display_name())
    }
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// How the voice layer turns a track into an audio input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Resolved by the extractor; streamed by re-resolving `page_url` at play time.
    Extracted,
    /// A direct media URL (uploaded attachment); streamed from `source_url`.
    Direct,
}

/// Metadata and playable reference for one track. Immutable once queued.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    /// The title of the track.
    pub title: String,
    /// Playable media URL.
    pub source_url: String,
    /// Human-facing link shown in listings.
    pub page_url: String,
    /// Who queued the track.
    pub requester: Requester,
    /// The duration of the track, if known.
    pub duration: Option<Duration>,
    /// URL to a thumbnail image, if available.
    pub thumbnail: Option<String>,
    pub kind: SourceKind,
}

impl TrackMetadata {
    /// A track streamed straight from an uploaded file.
    pub fn from_attachment(filename: &str, url: &str, requester: Requester) -> Self {
        Self {
            title: filename.to_string(),
            source_url: url.to_string(),
            page_url: url.to_string(),
            requester,
            duration: None,
            thumbnail: None,
            kind: SourceKind::Direct,
        }
    }

    /// `[title](page_url)` for embed descriptions.
    pub fn markdown_link(&self) -> String {
        format!("[{}]({})", escape_markdown_title(&self.title), self.page_url)
    }
}

/// Square brackets in titles would break the markdown link.
fn escape_markdown_title(title: &str) -> String {
    title.replace('[', "(").replace(']', ")")
}

/// The subset of a `yt-dlp -j` entry this bot uses.
#[derive(Debug, Deserialize)]
pub(crate) struct YtDlpEntry {
    title: Option<String>,
    /// Direct stream URL for the selected format.
    url: Option<String>,
    webpage_url: Option<String>,
    original_url: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
}

impl YtDlpEntry {
    /// Converts the entry, or `None` when it has no usable link at all.
    pub(crate) fn into_metadata(self, requester: &Requester) -> Option<TrackMetadata> {
        let page_url = self
            .webpage_url
            .or(self.original_url)
            .or_else(|| self.url.clone())?;
        let source_url = self.url.unwrap_or_else(|| page_url.clone());

        Some(TrackMetadata {
            title: self.title.unwrap_or_else(|| "Unknown Title".to_string()),
            source_url,
            page_url,
            requester: requester.clone(),
            duration: self
                .duration
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
            thumbnail: self.thumbnail,
            kind: SourceKind::Extracted,
        })
    }
}
