//! Injected menu item model plus the built-in toolbar/more presets.
//!
//! The hosting application may replace the in-meeting toolbar and "more"
//! menu with its own items. Built-in items occupy ids below
//! [`FIRST_INJECTED_MENU_ID`]; application items must stay at or above it.
//! The acceptance rules themselves (uniqueness, counts, title limits) are a
//! dispatcher concern and live in the worker crate.

use serde::{Deserialize, Serialize};

/// Built-in microphone toggle.
pub const MIC_MENU_ID: i32 = 0;
/// Built-in camera toggle.
pub const CAMERA_MENU_ID: i32 = 1;
/// Built-in screen share entry.
pub const SCREEN_SHARE_MENU_ID: i32 = 2;
/// Built-in participants list.
pub const PARTICIPANTS_MENU_ID: i32 = 3;
/// Built-in participant management (host side).
pub const MANAGE_PARTICIPANTS_MENU_ID: i32 = 4;
/// Built-in invite entry.
pub const INVITE_MENU_ID: i32 = 5;
/// Built-in chat entry.
pub const CHAT_MENU_ID: i32 = 6;
/// Built-in gallery/focus view switch.
pub const VIEW_MENU_ID: i32 = 7;
/// Built-in whiteboard entry.
pub const WHITEBOARD_MENU_ID: i32 = 8;

/// Lowest id available to injected (application-defined) items.
pub const FIRST_INJECTED_MENU_ID: i32 = 100;

/// Longest permitted item title, counted in characters.
pub const MENU_TITLE_LIMIT: usize = 10;

/// Built-in ids that may never appear in the "more" menu.
pub const MORE_MENU_EXCLUDED_IDS: [i32; 4] = [
    MIC_MENU_ID,
    CAMERA_MENU_ID,
    MANAGE_PARTICIPANTS_MENU_ID,
    CHAT_MENU_ID,
];

/// Who gets to see a menu item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MenuVisibility {
    /// Every participant.
    #[default]
    Always,
    /// Everyone except the host.
    ExcludeHost,
    /// Host only.
    HostOnly,
}

impl MenuVisibility {
    /// Decodes a wire integer, clamping unknown values to [`Self::Always`].
    #[must_use]
    pub fn from_wire(value: i32) -> Self {
        match value {
            1 => Self::ExcludeHost,
            2 => Self::HostOnly,
            _ => Self::Always,
        }
    }

    /// The integer this visibility travels as.
    #[must_use]
    pub fn as_wire(self) -> i32 {
        match self {
            Self::Always => 0,
            Self::ExcludeHost => 1,
            Self::HostOnly => 2,
        }
    }

    /// Whether an item with this visibility shows up for the host.
    #[must_use]
    pub fn visible_to_host(self) -> bool {
        matches!(self, Self::Always | Self::HostOnly)
    }

    /// Whether an item with this visibility shows up for ordinary members.
    #[must_use]
    pub fn visible_to_member(self) -> bool {
        matches!(self, Self::Always | Self::ExcludeHost)
    }
}

/// One toolbar or "more"-menu entry.
///
/// `item_visibility` stays a raw integer on this type; callers clamp it via
/// [`MenuVisibility::from_wire`]. The guid is assigned by the worker when an
/// injected item is accepted and is echoed back on click notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Worker-assigned identity for injected items.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub item_guid: String,

    /// Numeric id, unique across toolbar + more menu.
    #[serde(default)]
    pub item_id: i32,

    /// Primary title.
    #[serde(default)]
    pub item_title: String,

    /// Primary icon path.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub item_image: String,

    /// Secondary title for two-state items.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub item_title2: String,

    /// Secondary icon path for two-state items.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub item_image2: String,

    /// Raw visibility class, see [`MenuVisibility`].
    #[serde(default)]
    pub item_visibility: i32,

    /// Which state a two-state item currently shows.
    #[serde(default)]
    pub item_checked_index: i32,
}

impl MenuItem {
    /// Creates an item with the given id and primary title.
    pub fn new(item_id: i32, title: impl Into<String>) -> Self {
        Self {
            item_id,
            item_title: title.into(),
            ..Self::default()
        }
    }

    /// Builder: set the primary icon path.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.item_image = image.into();
        self
    }

    /// Builder: set the secondary title/icon pair.
    #[must_use]
    pub fn with_secondary(mut self, title2: impl Into<String>, image2: impl Into<String>) -> Self {
        self.item_title2 = title2.into();
        self.item_image2 = image2.into();
        self
    }

    /// Builder: set the visibility class.
    #[must_use]
    pub fn with_visibility(mut self, visibility: MenuVisibility) -> Self {
        self.item_visibility = visibility.as_wire();
        self
    }

    /// True for items carrying a built-in id.
    #[must_use]
    pub fn is_built_in(&self) -> bool {
        self.item_id < FIRST_INJECTED_MENU_ID
    }

    /// True when the secondary title/icon state is present.
    #[must_use]
    pub fn has_secondary(&self) -> bool {
        !self.item_title2.is_empty() && !self.item_image2.is_empty()
    }
}

/// The toolbar the worker falls back to when the hosting side injects none.
#[must_use]
pub fn default_toolbar_items() -> Vec<MenuItem> {
    vec![
        MenuItem::new(MIC_MENU_ID, "Mic"),
        MenuItem::new(CAMERA_MENU_ID, "Camera"),
        MenuItem::new(SCREEN_SHARE_MENU_ID, "Share"),
        MenuItem::new(PARTICIPANTS_MENU_ID, "Participants")
            .with_visibility(MenuVisibility::ExcludeHost),
        MenuItem::new(MANAGE_PARTICIPANTS_MENU_ID, "Manage").with_visibility(MenuVisibility::HostOnly),
        MenuItem::new(INVITE_MENU_ID, "Invite"),
        MenuItem::new(CHAT_MENU_ID, "Chat"),
    ]
}

/// The "more" menu the worker falls back to when the hosting side injects
/// none.
#[must_use]
pub fn default_more_items() -> Vec<MenuItem> {
    vec![
        MenuItem::new(VIEW_MENU_ID, "View"),
        MenuItem::new(WHITEBOARD_MENU_ID, "Whiteboard"),
    ]
}
