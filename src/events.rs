//! Gateway events the music commands care about outside of command invocations.

use poise::serenity_prelude as serenity;
use serenity::{ChannelId, ComponentInteraction, FullEvent, Interaction, VoiceState};
use tracing::{debug, error, info};

use crate::commands::music::utils::button_controls::CUSTOM_ID_PREFIX;
use crate::commands::music::utils::component_handlers;
use crate::{Data, Error};

/// poise `event_handler` hook
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        FullEvent::Ready { data_about_bot } => {
            info!("{} is connected", data_about_bot.user.name);
        }
        FullEvent::InteractionCreate {
            interaction: Interaction::Component(component),
        } if component.data.custom_id.starts_with(CUSTOM_ID_PREFIX) => {
            music_component_interaction(ctx, data, component).await;
        }
        FullEvent::VoiceStateUpdate { old, new } => {
            bot_voice_state_update(ctx, data, old.as_ref(), new).await;
        }
        _ => (),
    }

    Ok(())
}

/// Handle component interactions for components with identities starting with "music_"
async fn music_component_interaction(
    ctx: &serenity::Context,
    data: &Data,
    component: &ComponentInteraction,
) {
    if let Err(e) = component_handlers::handle_interaction(ctx, data, component).await {
        error!("Error handling component interaction: {}", e);
    }
}

/// Drops the guild's player when the bot was disconnected from voice by
/// someone else (kicked, channel deleted).
async fn bot_voice_state_update(
    ctx: &serenity::Context,
    data: &Data,
    old: Option<&VoiceState>,
    new: &VoiceState,
) {
    if new.user_id != ctx.cache.current_user().id {
        return;
    }
    let Some(guild_id) = new.guild_id else {
        return;
    };
    let Some(player) = data.music.player(guild_id) else {
        return;
    };

    let connected_to = player.lock().await.channel_id();
    let left = old.and_then(|state| state.channel_id);
    if !disconnects_player(connected_to, left, new.channel_id) {
        debug!(
            "Voice state {:?} -> {:?} does not concern the player in guild {} ({:?})",
            left, new.channel_id, guild_id, connected_to
        );
        return;
    }

    info!("Disconnected from voice in guild {}, tearing down", guild_id);
    data.music.teardown(guild_id).await;
    data.music.refresh_display(&ctx.http, guild_id).await;
}

/// True when a bot voice-state change from `left` to `joined` cuts the
/// connection the player holds to `connected_to`. Players still connecting
/// and echoes of an earlier connection are left alone.
fn disconnects_player(
    connected_to: Option<ChannelId>,
    left: Option<ChannelId>,
    joined: Option<ChannelId>,
) -> bool {
    match (connected_to, joined) {
        (Some(current), None) => left.is_none_or(|channel| channel == current),
        _ => false,
    }
}
