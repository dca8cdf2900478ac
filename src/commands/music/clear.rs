use super::utils::embedded_messages;
use super::{connected_player, refresh_display};
use crate::{CommandResult, Context};

/// Clear the entire queue
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn clear(ctx: Context<'_>) -> CommandResult {
    let (guild_id, player) = connected_player(ctx).await?;

    player.lock().await.queue_mut().clear();

    ctx.send(embedded_messages::cleared()).await?;
    refresh_display(ctx, guild_id).await;

    Ok(())
}
