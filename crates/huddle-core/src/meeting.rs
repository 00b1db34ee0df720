//! Meeting request parameters, option flags, and meeting info snapshots.
//!
//! These structs are the payload halves of the wire protocol: every field
//! carries `#[serde(default)]` so a document missing a key decodes to the
//! zero value instead of failing. No validation happens here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::menu::MenuItem;

/// Parameters for creating a meeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartMeetingParams {
    /// Name shown to other participants.
    #[serde(default)]
    pub display_name: String,

    /// Personal meeting id to start under; empty means a server-assigned id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub meeting_id: String,

    /// Optional numeric password; empty means none.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,

    /// Free-form member tag shown next to the display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,

    /// Opaque data handed through to every participant.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extra_data: String,

    /// Scene template selector understood by the engine.
    #[serde(default)]
    pub scene_code: i32,

    /// Display-name → role assignments applied at join time.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub role_binds: BTreeMap<String, i32>,

    /// Per-role capacity configuration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_types: Vec<RoleConfig>,

    /// Room-level controls active when the meeting opens.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controls: Vec<RoomControl>,
}

/// Parameters for joining an existing meeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinMeetingParams {
    /// Name shown to other participants.
    #[serde(default)]
    pub display_name: String,

    /// Id of the meeting to join.
    #[serde(default)]
    pub meeting_id: String,

    /// Password, if the meeting requires one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,

    /// Free-form member tag shown next to the display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,

    /// Join without an authenticated account; the worker performs an
    /// anonymous login first.
    #[serde(default)]
    pub anonymous: bool,
}

/// Capacity configuration for one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Role selector understood by the engine.
    #[serde(default)]
    pub role_type: i32,

    /// Maximum number of members holding this role.
    #[serde(default)]
    pub max_count: i32,

    /// Members pre-assigned to this role.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_list: Vec<RoleUser>,
}

/// One member entry inside a [`RoleConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleUser {
    /// Account id of the member.
    #[serde(default)]
    pub user_id: String,
}

/// A room-level control (for example "everyone joins muted").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomControl {
    /// Attendee-off mode understood by the engine.
    #[serde(default)]
    pub attendee_off: i32,

    /// Which device class the control applies to.
    #[serde(default)]
    pub control_type: i32,
}

/// In-meeting chatroom capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatroomConfig {
    /// Allow file attachments in chat.
    #[serde(default)]
    pub enable_file_message: bool,

    /// Allow image attachments in chat.
    #[serde(default)]
    pub enable_image_message: bool,
}

/// UI and behavior switches pushed into the worker on start/join.
///
/// The `no_*` flags hide or disable a piece of in-meeting UI; they default
/// to false (feature enabled) when absent from the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingOptions {
    #[serde(default)]
    pub no_audio: bool,
    #[serde(default)]
    pub no_video: bool,
    #[serde(default)]
    pub no_chat: bool,
    #[serde(default)]
    pub no_invite: bool,
    #[serde(default)]
    pub no_screen_share: bool,
    #[serde(default)]
    pub no_view: bool,
    #[serde(default)]
    pub no_whiteboard: bool,
    #[serde(default)]
    pub no_rename: bool,
    #[serde(default)]
    pub no_sip: bool,
    #[serde(default)]
    pub no_mute_all_video: bool,
    #[serde(default)]
    pub no_mute_all_audio: bool,
    #[serde(default)]
    pub no_cloud_record: bool,

    /// Show member tags in the participant list.
    #[serde(default)]
    pub show_member_tag: bool,

    /// Show the "meeting ends soon" tip.
    #[serde(default)]
    pub show_remaining_tip: bool,

    /// Enable audio AI noise suppression.
    #[serde(default)]
    pub audio_ains_enabled: bool,

    /// Initial window mode selector.
    #[serde(default)]
    pub default_window_mode: i32,

    /// How the meeting id is presented in the title bar.
    #[serde(default)]
    pub meeting_id_display: i32,

    /// Join timeout in milliseconds; values ≤ 0 fall back to the worker
    /// default.
    #[serde(default)]
    pub join_timeout_ms: i32,

    /// Chatroom capabilities.
    #[serde(default)]
    pub chatroom: ChatroomConfig,

    /// Replacement toolbar; empty keeps the built-in preset.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toolbar_items: Vec<MenuItem>,

    /// Replacement "more" menu; empty keeps the built-in preset.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub more_items: Vec<MenuItem>,
}

/// Snapshot of the running meeting, answered to `get_meeting_info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingInfo {
    /// Whether the local account hosts this meeting.
    #[serde(default)]
    pub is_host: bool,

    /// Whether the meeting is locked against new joins.
    #[serde(default)]
    pub is_locked: bool,

    /// Public meeting id.
    #[serde(default)]
    pub meeting_id: String,

    /// Short meeting id, when the server assigned one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub short_id: String,

    /// SIP dial-in id, when available.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sip_id: String,

    /// Server-unique numeric meeting identity.
    #[serde(default)]
    pub meeting_unique_id: i64,

    /// Meeting subject.
    #[serde(default)]
    pub subject: String,

    /// Meeting password; empty when none.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,

    /// Account id of the host.
    #[serde(default)]
    pub host_user_id: String,

    /// Scheduled window start, epoch milliseconds; 0 for ad-hoc meetings.
    #[serde(default)]
    pub schedule_start_time: i64,

    /// Scheduled window end, epoch milliseconds; 0 for ad-hoc meetings.
    #[serde(default)]
    pub schedule_end_time: i64,

    /// Actual start, epoch milliseconds.
    #[serde(default)]
    pub start_time: i64,

    /// Seconds elapsed since the actual start.
    #[serde(default)]
    pub duration_secs: i64,

    /// Opaque data the starter attached.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extra_data: String,

    /// Account id of the meeting creator.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub creator_id: String,

    /// Display name of the meeting creator.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub creator_name: String,

    /// Current members.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MeetingMember>,
}

/// One entry in the member list of a [`MeetingInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingMember {
    /// Account id.
    #[serde(default)]
    pub user_id: String,

    /// Display name.
    #[serde(default)]
    pub user_name: String,

    /// Member tag, when tags are enabled.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_params_decode_missing_fields_to_zero_values() {
        let params: StartMeetingParams =
            serde_json::from_str(r#"{"display_name":"amy"}"#).unwrap();
        assert_eq!(params.display_name, "amy");
        assert!(params.meeting_id.is_empty());
        assert!(params.password.is_empty());
        assert_eq!(params.scene_code, 0);
        assert!(params.role_binds.is_empty());
        assert!(params.role_types.is_empty());
        assert!(params.controls.is_empty());
    }

    #[test]
    fn start_params_nested_collections_roundtrip() {
        let mut role_binds = BTreeMap::new();
        role_binds.insert("amy".to_string(), 1);
        role_binds.insert("bob".to_string(), 2);

        let params = StartMeetingParams {
            display_name: "amy".into(),
            role_binds,
            role_types: vec![RoleConfig {
                role_type: 2,
                max_count: 4,
                user_list: vec![RoleUser {
                    user_id: "u-9".into(),
                }],
            }],
            controls: vec![RoomControl {
                attendee_off: 1,
                control_type: 0,
            }],
            ..StartMeetingParams::default()
        };

        let json = serde_json::to_string(&params).unwrap();
        // Nested structures stay structured, never flattened into strings.
        assert!(json.contains(r#""role_binds":{"amy":1,"bob":2}"#));
        assert!(json.contains(r#""user_list":[{"user_id":"u-9"}]"#));

        let parsed: StartMeetingParams = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn options_decode_empty_document() {
        let options: MeetingOptions = serde_json::from_str("{}").unwrap();
        assert!(!options.no_audio);
        assert!(!options.audio_ains_enabled);
        assert_eq!(options.join_timeout_ms, 0);
        assert!(!options.chatroom.enable_file_message);
        assert!(options.toolbar_items.is_empty());
        assert!(options.more_items.is_empty());
    }

    #[test]
    fn options_roundtrip_with_menu_items() {
        let options = MeetingOptions {
            no_video: true,
            show_member_tag: true,
            join_timeout_ms: 30_000,
            toolbar_items: vec![MenuItem::new(101, "Rate us")],
            ..MeetingOptions::default()
        };

        let json = serde_json::to_string(&options).unwrap();
        let parsed: MeetingOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn meeting_info_roundtrip() {
        let info = MeetingInfo {
            is_host: true,
            meeting_id: "123456789".into(),
            meeting_unique_id: 42,
            subject: "Weekly sync".into(),
            host_user_id: "u-1".into(),
            start_time: 1_722_000_000_000,
            duration_secs: 95,
            members: vec![MeetingMember {
                user_id: "u-1".into(),
                user_name: "amy".into(),
                tag: "eng".into(),
            }],
            ..MeetingInfo::default()
        };

        let json = serde_json::to_string(&info).unwrap();
        let parsed: MeetingInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, info);
    }
}
