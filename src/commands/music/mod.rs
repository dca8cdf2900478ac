pub mod clear;
pub mod join;
pub mod leave;
pub mod pause;
pub mod play;
pub mod queue;
pub mod remove;
pub mod shuffle;
pub mod skip;
pub mod ui;

pub mod audio_sources;
pub mod utils;

use poise::serenity_prelude as serenity;
use serenity::{Cache, ChannelId, GuildId, UserId};
use songbird::Songbird;
use std::sync::Arc;

use crate::{Context, Data};
use utils::music_manager::{MusicError, MusicResult};
use utils::player::SharedPlayer;
use utils::songbird_transport::SongbirdTransport;

/// The guild the command was invoked in.
pub(crate) fn require_guild(ctx: Context<'_>) -> MusicResult<GuildId> {
    ctx.guild_id().ok_or(MusicError::NotInGuild)
}

/// Get the Songbird voice client from the context
pub(crate) async fn get_songbird(ctx: &serenity::Context) -> MusicResult<Arc<Songbird>> {
    songbird::get(ctx).await.ok_or(MusicError::NoVoiceManager)
}

/// Get the voice channel ID that the user is currently in
pub(crate) fn get_user_voice_channel(
    cache: &Cache,
    guild_id: GuildId,
    user_id: UserId,
) -> MusicResult<ChannelId> {
    let guild = cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or(MusicError::UserNotInVoiceChannel)
}

/// The guild's player, created around a songbird transport if it has none.
pub(crate) async fn get_or_create_player(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: GuildId,
) -> MusicResult<SharedPlayer> {
    let songbird = get_songbird(ctx).await?;

    Ok(data.music.get_or_create_player(
        guild_id,
        data.config.connect_timeout,
        || {
            Arc::new(SongbirdTransport::new(
                songbird,
                guild_id,
                Arc::clone(&ctx.http),
                data.http_client.clone(),
                data.ytdlp_program,
                Arc::downgrade(&data.music),
            ))
        },
    ))
}

/// The guild's player, which must hold a voice connection.
pub(crate) async fn connected_player(ctx: Context<'_>) -> MusicResult<(GuildId, SharedPlayer)> {
    let guild_id = require_guild(ctx)?;
    let player = ctx.data().music.connected_player(guild_id).await?;
    Ok((guild_id, player))
}

/// Re-render the guild's status display after a mutation.
pub(crate) async fn refresh_display(ctx: Context<'_>, guild_id: GuildId) {
    ctx.data()
        .music
        .refresh_display(&ctx.serenity_context().http, guild_id)
        .await;
}
