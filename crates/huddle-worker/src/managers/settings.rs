//! Session-level settings pushed on start/join.

use huddle_core::MeetingOptions;

/// Engine-facing switches that outlive a single meeting screen.
#[derive(Debug, Default)]
pub struct SettingsManager {
    audio_ains_enabled: bool,
    show_member_tag: bool,
    show_remaining_tip: bool,
}

impl SettingsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the switches carried by a start/join request.
    pub fn apply(&mut self, options: &MeetingOptions) {
        self.audio_ains_enabled = options.audio_ains_enabled;
        self.show_member_tag = options.show_member_tag;
        self.show_remaining_tip = options.show_remaining_tip;
    }

    /// AI noise suppression on the audio path.
    pub fn audio_ains_enabled(&self) -> bool {
        self.audio_ains_enabled
    }

    /// Member tags in the participant list.
    pub fn show_member_tag(&self) -> bool {
        self.show_member_tag
    }

    /// The "meeting ends soon" tip.
    pub fn show_remaining_tip(&self) -> bool {
        self.show_remaining_tip
    }
}
