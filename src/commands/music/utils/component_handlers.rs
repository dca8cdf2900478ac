use poise::serenity_prelude::{self as serenity, Context};
use serenity::{ComponentInteraction, CreateInteractionResponseFollowup, GuildId};
use tracing::{debug, error, info};

use super::button_controls::{LEAVE_ID, PLAY_PAUSE_ID, SHUFFLE_ID, SKIP_ID};
use super::embedded_messages;
use super::music_manager::{MusicError, MusicResult};
use super::player::{PlayerState, Transition};
use crate::{Data, Error};

type ButtonInteractionResult = Result<(), Error>;

/// Handle a button press on a status display
pub async fn handle_interaction(
    ctx: &Context,
    data: &Data,
    interaction: &ComponentInteraction,
) -> ButtonInteractionResult {
    // Acknowledge now; the display is edited once the action is done
    interaction.defer(ctx).await?;

    let Some(guild_id) = interaction.guild_id else {
        return error_followup(ctx, interaction, MusicError::NotInGuild).await;
    };

    let outcome = match interaction.data.custom_id.as_str() {
        PLAY_PAUSE_ID => handle_play_pause(data, guild_id).await,
        SKIP_ID => handle_skip(data, guild_id).await,
        SHUFFLE_ID => handle_shuffle(data, guild_id).await,
        LEAVE_ID => handle_leave(data, guild_id).await,
        unknown => {
            error!("Unknown button ID: {}", unknown);
            Ok(Transition::Ignored)
        }
    };

    match outcome {
        Ok(transition) => {
            debug!(
                "Button {} in guild {}: {:?}",
                interaction.data.custom_id, guild_id, transition
            );
            data.music.refresh_display(&ctx.http, guild_id).await;
            Ok(())
        }
        Err(e) => error_followup(ctx, interaction, e).await,
    }
}

/// Handler for alternating Play/Pause button
async fn handle_play_pause(data: &Data, guild_id: GuildId) -> MusicResult<Transition> {
    let player = data.music.connected_player(guild_id).await?;
    let mut player = player.lock().await;

    Ok(match player.state() {
        PlayerState::Playing => player.pause().await,
        PlayerState::Paused => player.resume().await,
        _ => Transition::Ignored,
    })
}

async fn handle_skip(data: &Data, guild_id: GuildId) -> MusicResult<Transition> {
    let player = data.music.connected_player(guild_id).await?;
    let transition = player.lock().await.skip().await;
    Ok(transition)
}

async fn handle_shuffle(data: &Data, guild_id: GuildId) -> MusicResult<Transition> {
    let player = data.music.connected_player(guild_id).await?;
    player.lock().await.queue_mut().shuffle();
    Ok(Transition::Applied)
}

async fn handle_leave(data: &Data, guild_id: GuildId) -> MusicResult<Transition> {
    data.music.connected_player(guild_id).await?;
    data.music.teardown(guild_id).await;
    info!("Left voice in guild {} via button", guild_id);
    Ok(Transition::Applied)
}

/// Send an ephemeral error followup message for failed interactions
async fn error_followup(
    ctx: &Context,
    interaction: &ComponentInteraction,
    err: MusicError,
) -> ButtonInteractionResult {
    let reply = embedded_messages::error(err);
    interaction
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new()
                .embeds(reply.embeds)
                .ephemeral(true),
        )
        .await?;
    Ok(())
}
