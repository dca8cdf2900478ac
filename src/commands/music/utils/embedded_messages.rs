use poise::CreateReply;
use serenity::all::{ChannelId, CreateEmbed, Mentionable};
use std::fmt::Display;

use super::format_duration;
use super::player::{PlayerSnapshot, PlayerState};
use crate::commands::music::audio_sources::track_metadata::{Requester, TrackMetadata};

const GREEN: u32 = 0x00ff00;
const RED: u32 = 0xff0000;

/// Discord rejects embed descriptions longer than this.
const DESCRIPTION_LIMIT: usize = 4096;
/// Room kept free for the footer lines appended after a listing.
const LISTING_RESERVE: usize = 512;
/// Upcoming tracks shown on the status display.
const STATUS_UP_NEXT: usize = 10;

fn duration_or_live(track: &TrackMetadata) -> String {
    track
        .duration
        .map(format_duration)
        .unwrap_or_else(|| "--:--".to_string())
}

/// Numbered `1. [title](url)` lines, truncated with a "more" line once
/// `budget` characters or `max_items` entries are used up.
fn numbered_tracks(queue: &[TrackMetadata], budget: usize, max_items: usize) -> String {
    let mut listing = String::new();

    for (index, track) in queue.iter().enumerate() {
        let line = format!(
            "`{}.` {} | `{}` | `Requested by: {}`\n",
            index + 1,
            track.markdown_link(),
            duration_or_live(track),
            track.requester
        );

        if index >= max_items || listing.chars().count() + line.chars().count() > budget {
            listing.push_str(&format!("*...and {} more*\n", queue.len() - index));
            break;
        }
        listing.push_str(&line);
    }

    listing
}

/// Create an error reply shown to the command author
pub fn error(err: impl Display) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(err.to_string())
                .color(RED),
        )
        .ephemeral(true)
}

/// Create an embed for when the bot joins a voice channel
pub fn joined(channel_id: ChannelId) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("Joined")
            .description(format!("Joined {}", channel_id.mention()))
            .color(GREEN),
    )
}

/// Create an embed listing the tracks a request put in the queue
pub fn queued(tracks: &[TrackMetadata], requester: &Requester) -> CreateReply {
    let listing = tracks
        .iter()
        .map(TrackMetadata::markdown_link)
        .collect::<Vec<_>>()
        .join("\n");

    let mut description = format!("Queued\n{}", listing);
    if description.chars().count() > DESCRIPTION_LIMIT - LISTING_RESERVE {
        description = format!("Queued {} tracks", tracks.len());
    }
    description.push_str(&format!("\n[{}]", requester.mention()));

    let mut embed = CreateEmbed::new().description(description).color(GREEN);
    if let [single] = tracks {
        if let Some(thumbnail) = &single.thumbnail {
            embed = embed.thumbnail(thumbnail);
        }
    }

    CreateReply::default().embed(embed)
}

/// Create an embed for when the queue has been shuffled
pub fn shuffled() -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("Queue")
            .description("There is a slight mess in the queue. 🎲")
            .color(GREEN),
    )
}

/// Create an embed for when a track is paused
pub fn paused(track: Option<&TrackMetadata>) -> CreateReply {
    let mut embed = CreateEmbed::new().title("⏸️ Paused").color(GREEN);
    if let Some(track) = track {
        embed = embed.description(format!("Paused {}", track.markdown_link()));
    }
    CreateReply::default().embed(embed)
}

/// Create an embed for when a track is resumed
pub fn resumed(track: Option<&TrackMetadata>) -> CreateReply {
    let mut embed = CreateEmbed::new().title("▶️ Resuming").color(GREEN);
    if let Some(track) = track {
        embed = embed.description(format!("Resumed {}", track.markdown_link()));
    }
    CreateReply::default().embed(embed)
}

/// Create an embed for when pause finds nothing playing
pub fn nothing_playing() -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .description("I am currently not playing anything")
                .color(GREEN),
        )
        .ephemeral(true)
}

/// Create an embed for when resume finds nothing paused
pub fn nothing_paused() -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .description("Nothing is paused right now")
                .color(GREEN),
        )
        .ephemeral(true)
}

/// Create an embed for when a track is skipped
pub fn skipped(track: Option<&TrackMetadata>) -> CreateReply {
    let description = match track {
        Some(track) => format!("Skipped {}. Let's play something else", track.markdown_link()),
        None => "Let's play something else".to_string(),
    };

    CreateReply::default().embed(
        CreateEmbed::new()
            .title("⏭️ Skipping")
            .description(description)
            .color(GREEN),
    )
}

/// Create an embed for when there is no track to skip
pub fn no_track_to_skip() -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .description("There is nothing to skip")
                .color(GREEN),
        )
        .ephemeral(true)
}

/// Create an embed for when a track is removed from the queue
pub fn track_removed(track: &TrackMetadata) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🗑️ Track Removed")
            .description(format!(
                "Removed {} [{}]",
                track.markdown_link(),
                track.requester.mention()
            ))
            .color(GREEN),
    )
}

/// Create an embed for when the queue is cleared
pub fn cleared() -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("Cleared")
            .description("Queue cleared ♻️")
            .color(GREEN),
    )
}

/// Create an embed for the music queue
pub fn music_queue(guild_name: &str, snapshot: &PlayerSnapshot) -> CreateEmbed {
    if snapshot.now_playing.is_none() && snapshot.queue.is_empty() {
        return CreateEmbed::new().description("queue is empty").color(GREEN);
    }

    let mut description = String::new();

    match &snapshot.now_playing {
        Some(track) => description.push_str(&format!(
            "__Now Playing__{}:\n{} | `{}` | `Requested by: {}`\n\n",
            if snapshot.state == PlayerState::Paused { " (paused)" } else { "" },
            track.markdown_link(),
            duration_or_live(track),
            track.requester
        )),
        None => description.push_str("__Now Playing__:\nNothing\n\n"),
    }

    description.push_str("__Up Next:__\n");
    let budget = DESCRIPTION_LIMIT - LISTING_RESERVE - description.chars().count().min(LISTING_RESERVE);
    description.push_str(&numbered_tracks(&snapshot.queue, budget, usize::MAX));

    description.push_str(&format!("\n**{} songs in queue**", snapshot.queue.len()));
    if !snapshot.queued_duration.is_zero() {
        description.push_str(&format!(
            " • Total Length: `{}`",
            format_duration(snapshot.queued_duration)
        ));
    }

    CreateEmbed::new()
        .title(format!("Queue for {}", guild_name))
        .description(description)
        .color(GREEN)
}

/// Create the status display embed
pub fn status_display(snapshot: &PlayerSnapshot) -> CreateEmbed {
    let status = match snapshot.state {
        PlayerState::Idle => "🔇 Not connected",
        PlayerState::ConnectedSilent => "💤 Waiting for tracks",
        PlayerState::Playing => "▶️ Playing",
        PlayerState::Paused => "⏸️ Paused",
    };

    let mut description = format!("**{}**\n\n", status);
    if let Some(track) = &snapshot.now_playing {
        description.push_str(&format!(
            "**🎵 Now Playing**\n{} `{}`\nRequested by {}\n\n",
            track.markdown_link(),
            duration_or_live(track),
            track.requester.mention()
        ));
    }

    if snapshot.queue.is_empty() {
        description.push_str("**📭 Queue is empty**");
    } else {
        description.push_str(&format!("**📋 Up Next - {} tracks**\n", snapshot.queue.len()));
        let budget = DESCRIPTION_LIMIT - LISTING_RESERVE - description.chars().count().min(LISTING_RESERVE);
        description.push_str(&numbered_tracks(&snapshot.queue, budget, STATUS_UP_NEXT));
        if !snapshot.queued_duration.is_zero() {
            description.push_str(&format!(
                "\n**⏱️ Total Duration:** `{}`",
                format_duration(snapshot.queued_duration)
            ));
        }
    }

    let mut embed = CreateEmbed::new()
        .title("🎵 Music Player")
        .description(description)
        .color(if snapshot.state == PlayerState::Idle { RED } else { GREEN });

    if let Some(thumbnail) = snapshot.now_playing.as_ref().and_then(|t| t.thumbnail.as_ref()) {
        embed = embed.thumbnail(thumbnail);
    }

    embed
}

/// Create an embed for when the bot leaves a voice channel
pub fn left_voice_channel() -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("Disconnected")
            .description("Successfully disconnected 👋")
            .color(GREEN),
    )
}
