use poise::CreateReply;

use super::connected_player;
use super::utils::embedded_messages;
use crate::{CommandResult, Context};

/// View the current music queue
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let (_, player) = connected_player(ctx).await?;

    let snapshot = player.lock().await.snapshot();
    let guild_name = ctx
        .guild()
        .map(|guild| guild.name.clone())
        .unwrap_or_else(|| "this server".to_string());

    ctx.send(CreateReply::default().embed(embedded_messages::music_queue(&guild_name, &snapshot)))
        .await?;

    Ok(())
}
