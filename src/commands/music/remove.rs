use super::utils::embedded_messages;
use super::{connected_player, refresh_display};
use crate::{CommandResult, Context};

/// Remove a track from the queue (the last one when no position is given)
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Position in the queue, starting at 1"] position: Option<usize>,
) -> CommandResult {
    let (guild_id, player) = connected_player(ctx).await?;

    let removed = {
        let mut player = player.lock().await;
        match position {
            Some(position) => player.queue_mut().remove_at(position),
            None => player.queue_mut().remove_last(),
        }
    }?;

    ctx.send(embedded_messages::track_removed(&removed)).await?;
    refresh_display(ctx, guild_id).await;

    Ok(())
}
