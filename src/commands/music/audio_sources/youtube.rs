//! Implements the `AudioApi` trait with the `yt-dlp` command-line tool.

use serenity::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use super::track_metadata::{Requester, TrackMetadata, YtDlpEntry};
use super::{AudioApi, AudioSource};
use crate::commands::music::utils::music_manager::{MusicError, MusicResult};

/// Resolves searches and links by running `yt-dlp -j`.
#[derive(Debug, Clone)]
pub struct YoutubeApi {
    ytdlp_path: String,
}

impl Default for YoutubeApi {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YoutubeApi {
    pub fn new(ytdlp_path: impl Into<String>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
        }
    }

    /// Arguments for one resolution. Links may expand to a playlist (capped at
    /// `count` entries); anything else becomes a `ytsearch<count>:` query.
    pub(crate) fn build_args(query: &str, count: usize) -> Vec<String> {
        let count = count.max(1);
        let mut args = vec![
            "-j".to_string(),           // One JSON object per entry
            "--no-warnings".to_string(),
            "-f".to_string(),
            "bestaudio/best".to_string(),
        ];

        let query = query.trim();
        if AudioSource::is_url(query) {
            args.push("--playlist-end".to_string());
            args.push(count.to_string());
            args.push(query.to_string());
        } else {
            args.push(format!("ytsearch{}:{}", count, query));
        }

        args
    }

    /// Parses `yt-dlp -j` output. Malformed lines are logged and skipped.
    pub(crate) fn parse_entries(stdout: &str, requester: &Requester) -> Vec<TrackMetadata> {
        stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| match serde_json::from_str::<YtDlpEntry>(line) {
                Ok(entry) => entry.into_metadata(requester),
                Err(e) => {
                    warn!("Skipping unparsable yt-dlp entry: {}", e);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl AudioApi for YoutubeApi {
    async fn resolve(
        &self,
        query: &str,
        requester: &Requester,
        count: usize,
    ) -> MusicResult<Vec<TrackMetadata>> {
        info!("Resolving '{}' ({} track(s)) for {}", query, count, requester);

        let output = match Command::new(&self.ytdlp_path)
            .args(Self::build_args(query, count))
            .kill_on_drop(true)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                error!("Failed to execute {}: {}", self.ytdlp_path, e);
                return Err(MusicError::NotFound(query.to_string()));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut tracks = Self::parse_entries(&stdout, requester);

        if tracks.is_empty() {
            if !output.status.success() {
                warn!(
                    "yt-dlp exited with {} for '{}': {}",
                    output.status,
                    query,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            return Err(MusicError::NotFound(query.to_string()));
        }

        tracks.truncate(count.max(1));
        debug!("Resolved {} track(s) for '{}'", tracks.len(), query);
        Ok(tracks)
    }
}
