use serenity::all::{ButtonStyle, CreateActionRow, CreateButton, ReactionType};

use super::player::{PlayerSnapshot, PlayerState};

pub const PLAY_PAUSE_ID: &str = "music_play_pause";
pub const SKIP_ID: &str = "music_skip";
pub const SHUFFLE_ID: &str = "music_shuffle";
pub const LEAVE_ID: &str = "music_leave";

/// Every custom id handled by the control row shares this prefix.
pub const CUSTOM_ID_PREFIX: &str = "music_";

/// Which controls make sense for a given player state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub is_playing: bool,
    pub can_toggle: bool,
    pub can_skip: bool,
    pub can_shuffle: bool,
    pub can_leave: bool,
}

impl ControlState {
    pub fn from_snapshot(snapshot: &PlayerSnapshot) -> Self {
        let streaming = matches!(snapshot.state, PlayerState::Playing | PlayerState::Paused);
        Self {
            is_playing: snapshot.state == PlayerState::Playing,
            can_toggle: streaming,
            can_skip: streaming,
            can_shuffle: snapshot.queue.len() > 1,
            can_leave: snapshot.state != PlayerState::Idle,
        }
    }
}

/// Creates the row of music control buttons for the status display
pub fn create_music_control_buttons(snapshot: &PlayerSnapshot) -> Vec<CreateActionRow> {
    let state = ControlState::from_snapshot(snapshot);

    let play_pause = CreateButton::new(PLAY_PAUSE_ID)
        .emoji(ReactionType::Unicode(
            if state.is_playing { "⏸️" } else { "▶️" }.to_string(),
        ))
        .style(ButtonStyle::Primary)
        .label(if state.is_playing { "Pause" } else { "Resume" })
        .disabled(!state.can_toggle);

    let skip = CreateButton::new(SKIP_ID)
        .emoji(ReactionType::Unicode("⏭️".to_string()))
        .style(ButtonStyle::Secondary)
        .label("Skip")
        .disabled(!state.can_skip);

    let shuffle = CreateButton::new(SHUFFLE_ID)
        .emoji(ReactionType::Unicode("🔀".to_string()))
        .style(ButtonStyle::Secondary)
        .label("Shuffle")
        .disabled(!state.can_shuffle);

    let leave = CreateButton::new(LEAVE_ID)
        .emoji(ReactionType::Unicode("⏏️".to_string()))
        .style(ButtonStyle::Danger)
        .label("Leave")
        .disabled(!state.can_leave);

    vec![CreateActionRow::Buttons(vec![play_pause, skip, shuffle, leave])]
}
