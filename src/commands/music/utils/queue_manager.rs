use rand::seq::SliceRandom;
use std::collections::VecDeque;
use std::time::Duration;

use super::music_manager::{MusicError, MusicResult};
use crate::commands::music::audio_sources::track_metadata::TrackMetadata;

/// Ordered list of tracks waiting to be played for one guild.
///
/// Order is arrival order unless the queue was shuffled or a position removed.
#[derive(Debug, Default, Clone)]
pub struct PlaybackQueue {
    items: VecDeque<TrackMetadata>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a track to the end of the queue
    pub fn enqueue(&mut self, track: TrackMetadata) {
        self.items.push_back(track);
    }

    /// Remove and return the first track
    pub fn dequeue_head(&mut self) -> Option<TrackMetadata> {
        self.items.pop_front()
    }

    /// Randomly permute every queued track in place.
    pub fn shuffle(&mut self) {
        self.items.make_contiguous().shuffle(&mut rand::rng());
    }

    /// Remove the track at a 1-based `position`.
    /// The queue is left untouched when the position is out of range.
    pub fn remove_at(&mut self, position: usize) -> MusicResult<TrackMetadata> {
        let len = self.items.len();
        if position == 0 || position > len {
            return Err(MusicError::OutOfRange { position, len });
        }

        self.items
            .remove(position - 1)
            .ok_or(MusicError::OutOfRange { position, len })
    }

    /// Remove the most recently queued track.
    pub fn remove_last(&mut self) -> MusicResult<TrackMetadata> {
        self.items.pop_back().ok_or(MusicError::EmptyQueue)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Copy of the queued tracks, front first, for display.
    pub fn snapshot(&self) -> Vec<TrackMetadata> {
        self.items.iter().cloned().collect()
    }

    /// Sum of the known track durations.
    pub fn total_duration(&self) -> Duration {
        self.items.iter().filter_map(|track| track.duration).sum()
    }
}
