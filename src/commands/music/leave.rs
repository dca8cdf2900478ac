use super::utils::embedded_messages;
use super::{connected_player, refresh_display};
use crate::{CommandResult, Context};

/// Stop playing, clear the queue and leave the voice channel
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn leave(ctx: Context<'_>) -> CommandResult {
    let (guild_id, _) = connected_player(ctx).await?;

    ctx.data().music.teardown(guild_id).await;

    ctx.send(embedded_messages::left_voice_channel()).await?;
    refresh_display(ctx, guild_id).await;

    Ok(())
}
