use poise::CreateReply;
use serenity::all::{ChannelId, EditMessage, MessageId};
use serenity::http::Http;

use super::player::PlayerSnapshot;
use super::{button_controls, embedded_messages};

/// A message that mirrors a guild's player and is edited in place whenever
/// the player changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDisplay {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

impl StatusDisplay {
    pub fn new(channel_id: ChannelId, message_id: MessageId) -> Self {
        Self {
            channel_id,
            message_id,
        }
    }

    /// The initial message body, sent before the display is registered.
    pub fn render(snapshot: &PlayerSnapshot) -> CreateReply {
        CreateReply::default()
            .embed(embedded_messages::status_display(snapshot))
            .components(button_controls::create_music_control_buttons(snapshot))
    }

    /// Edit the display message to show `snapshot`.
    pub async fn refresh(
        &self,
        http: &Http,
        snapshot: &PlayerSnapshot,
    ) -> Result<(), serenity::Error> {
        let message = EditMessage::new()
            .embed(embedded_messages::status_display(snapshot))
            .components(button_controls::create_music_control_buttons(snapshot));

        self.channel_id
            .edit_message(http, self.message_id, message)
            .await?;
        Ok(())
    }
}
