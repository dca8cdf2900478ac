use tracing::{debug, warn};

use super::utils::status_display::StatusDisplay;
use super::require_guild;
use crate::{CommandResult, Context};

/// Show a live player in this channel, replacing any earlier one
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn ui(ctx: Context<'_>) -> CommandResult {
    let guild_id = require_guild(ctx)?;
    let music = &ctx.data().music;

    let snapshot = music.snapshot(guild_id).await;
    let reply = ctx.send(StatusDisplay::render(&snapshot)).await?;
    let message = reply.message().await?;

    let display = StatusDisplay::new(message.channel_id, message.id);
    if let Some(previous) = music.set_display(guild_id, display) {
        debug!("Replacing status display for guild {}", guild_id);
        if let Err(e) = previous
            .channel_id
            .delete_message(ctx.serenity_context(), previous.message_id)
            .await
        {
            warn!("Failed to delete old status display: {}", e);
        }
    }

    Ok(())
}
