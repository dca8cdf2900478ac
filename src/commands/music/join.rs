use poise::serenity_prelude as serenity;
use serenity::{ChannelId, GuildId};
use tracing::debug;

use super::utils::embedded_messages;
use super::utils::music_manager::{MusicError, MusicResult};
use super::utils::player::SharedPlayer;
use super::{get_or_create_player, get_user_voice_channel, refresh_display, require_guild};
use crate::{CommandResult, Context};

/// Connect to a voice channel, or move there if already connected
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn join(
    ctx: Context<'_>,
    #[description = "Voice channel to join (defaults to your current one)"]
    #[channel_types("Voice", "Stage")]
    channel: Option<serenity::GuildChannel>,
) -> CommandResult {
    let guild_id = require_guild(ctx)?;
    let channel_id = match channel {
        Some(channel) => channel.id,
        None => get_user_voice_channel(ctx.cache(), guild_id, ctx.author().id)?,
    };

    ctx.defer().await?;
    join_channel(ctx, guild_id, channel_id).await?;

    ctx.send(embedded_messages::joined(channel_id)).await?;
    refresh_display(ctx, guild_id).await;

    Ok(())
}

/// Make the guild's player connect to `channel_id`, creating the player if
/// needed. A player torn down while this ran is replaced once.
pub(crate) async fn join_channel(
    ctx: Context<'_>,
    guild_id: GuildId,
    channel_id: ChannelId,
) -> MusicResult<SharedPlayer> {
    let player = get_or_create_player(ctx.serenity_context(), ctx.data(), guild_id).await?;
    let joined = player.lock().await.join(channel_id).await;

    match joined {
        Ok(transition) => {
            debug!("Join {} in guild {}: {:?}", channel_id, guild_id, transition);
            Ok(player)
        }
        Err(MusicError::PlayerDiscarded) => {
            let player =
                get_or_create_player(ctx.serenity_context(), ctx.data(), guild_id).await?;
            player.lock().await.join(channel_id).await?;
            Ok(player)
        }
        Err(e) => Err(e),
    }
}
