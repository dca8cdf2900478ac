use super::utils::embedded_messages;
use super::utils::player::Transition;
use super::{connected_player, refresh_display};
use crate::{CommandResult, Context};

/// Skip to the next track in the queue
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let (guild_id, player) = connected_player(ctx).await?;

    let (transition, skipped) = {
        let mut player = player.lock().await;
        let skipped = player.now_playing().cloned();
        (player.skip().await, skipped)
    };

    match transition {
        Transition::Applied => {
            ctx.send(embedded_messages::skipped(skipped.as_ref())).await?;
            refresh_display(ctx, guild_id).await;
        }
        Transition::Ignored => {
            ctx.send(embedded_messages::no_track_to_skip()).await?;
        }
    }

    Ok(())
}
