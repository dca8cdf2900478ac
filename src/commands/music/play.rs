use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::info;

use super::audio_sources::AudioSource;
use super::audio_sources::track_metadata::{Requester, TrackMetadata};
use super::utils::embedded_messages;
use super::utils::music_manager::{MusicError, MusicManager};
use super::{connected_player, refresh_display};
use crate::{CommandResult, Context};

/// Search for a track or play a link, queueing up to `count` results
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"] query: String,
    #[description = "How many results to queue"]
    #[min = 1]
    count: Option<usize>,
) -> CommandResult {
    let (guild_id, player) = connected_player(ctx).await?;

    // yt-dlp can take a few seconds
    ctx.defer().await?;

    let requester = Requester::from(ctx.author());
    let count = ctx.data().config.clamp_track_count(count);
    info!(
        "Resolving '{}' ({} tracks) for {} in guild {}",
        query, count, requester, guild_id
    );

    let tracks = ctx.data().resolver.resolve(&query, &requester, count).await?;

    ctx.send(embedded_messages::queued(&tracks, &requester)).await?;

    // The reply is already out; nobody waits for the tracks to land.
    let music = Arc::clone(&ctx.data().music);
    let http = Arc::clone(&ctx.serenity_context().http);
    MusicManager::enqueue_detached(player, tracks, move || async move {
        music.refresh_display(&http, guild_id).await;
    });

    Ok(())
}

/// Play an uploaded audio file
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn play_file(
    ctx: Context<'_>,
    #[description = "Audio file to play"] attachment: serenity::Attachment,
) -> CommandResult {
    let (guild_id, player) = connected_player(ctx).await?;

    if !AudioSource::is_audio_content_type(attachment.content_type.as_deref()) {
        return Err(MusicError::InvalidAttachment(
            attachment
                .content_type
                .unwrap_or_else(|| "unknown".to_string()),
        )
        .into());
    }

    let requester = Requester::from(ctx.author());
    let track = TrackMetadata::from_attachment(&attachment.filename, &attachment.url, requester);

    ctx.send(embedded_messages::queued(
        std::slice::from_ref(&track),
        &track.requester,
    ))
    .await?;

    player.lock().await.enqueue_many(vec![track]).await?;
    refresh_display(ctx, guild_id).await;

    Ok(())
}
