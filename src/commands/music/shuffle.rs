use super::join::join_channel;
use super::utils::embedded_messages;
use super::{get_user_voice_channel, refresh_display, require_guild};
use crate::{CommandResult, Context};

/// Make a mess of the queue. Joins your voice channel first if needed.
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn shuffle(ctx: Context<'_>) -> CommandResult {
    let guild_id = require_guild(ctx)?;

    let player = match ctx.data().music.connected_player(guild_id).await {
        Ok(player) => player,
        Err(_) => {
            let channel_id = get_user_voice_channel(ctx.cache(), guild_id, ctx.author().id)?;
            let player = join_channel(ctx, guild_id, channel_id).await?;
            ctx.send(embedded_messages::joined(channel_id)).await?;
            player
        }
    };

    player.lock().await.queue_mut().shuffle();

    ctx.send(embedded_messages::shuffled()).await?;
    refresh_display(ctx, guild_id).await;

    Ok(())
}
