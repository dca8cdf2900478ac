use serenity::model::id::GuildId;

use super::audio_sources::track_metadata::TrackMetadata;
use super::utils::embedded_messages;
use super::utils::music_manager::MusicManager;
use super::utils::player::Transition;
use super::{refresh_display, require_guild};
use crate::{CommandResult, Context};

/// Pause the current track
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let guild_id = require_guild(ctx)?;

    match pause_player(&ctx.data().music, guild_id).await {
        (Transition::Applied, track) => {
            ctx.send(embedded_messages::paused(track.as_ref())).await?;
            refresh_display(ctx, guild_id).await;
        }
        (Transition::Ignored, _) => {
            ctx.send(embedded_messages::nothing_playing()).await?;
        }
    }

    Ok(())
}

/// Resume the paused track
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn resume(ctx: Context<'_>) -> CommandResult {
    let guild_id = require_guild(ctx)?;

    match resume_player(&ctx.data().music, guild_id).await {
        (Transition::Applied, track) => {
            ctx.send(embedded_messages::resumed(track.as_ref())).await?;
            refresh_display(ctx, guild_id).await;
        }
        (Transition::Ignored, _) => {
            ctx.send(embedded_messages::nothing_paused()).await?;
        }
    }

    Ok(())
}

/// Pauses the guild's player. Without a voice connection there is nothing to
/// pause, which is reported like any other no-op.
pub(crate) async fn pause_player(
    music: &MusicManager,
    guild_id: GuildId,
) -> (Transition, Option<TrackMetadata>) {
    let Ok(player) = music.connected_player(guild_id).await else {
        return (Transition::Ignored, None);
    };

    let mut player = player.lock().await;
    let transition = player.pause().await;
    (transition, player.now_playing().cloned())
}

/// Resumes the guild's player; see [`pause_player`].
pub(crate) async fn resume_player(
    music: &MusicManager,
    guild_id: GuildId,
) -> (Transition, Option<TrackMetadata>) {
    let Ok(player) = music.connected_player(guild_id).await else {
        return (Transition::Ignored, None);
    };

    let mut player = player.lock().await;
    let transition = player.resume().await;
    (transition, player.now_playing().cloned())
}
