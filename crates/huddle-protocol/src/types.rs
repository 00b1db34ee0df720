//! Request, response, and notification types for the huddle protocol.

use huddle_core::{
    AccountInfo, JoinMeetingParams, MeetingInfo, MeetingOptions, MenuItem, RpcCode,
    StartMeetingParams,
};
use serde::{Deserialize, Serialize};

use crate::PROTOCOL_VERSION;

/// Message envelope wrapping all protocol messages.
///
/// Every data frame carries exactly one envelope. The version field allows
/// the two processes to detect a mismatched installation; the message is
/// flattened so the wire document stays a single object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Protocol version (always "1" for v1).
    pub protocol_version: String,
    /// The actual message.
    #[serde(flatten)]
    pub message: Message,
}

impl Envelope {
    /// Creates an envelope with the current protocol version.
    pub fn new(message: Message) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            message,
        }
    }

    /// Creates a request envelope.
    pub fn request(request: Request) -> Self {
        Self::new(Message::Request(request))
    }

    /// Creates a response envelope.
    pub fn response(response: Response) -> Self {
        Self::new(Message::Response(response))
    }

    /// Creates a notification envelope.
    pub fn notification(notification: Notification) -> Self {
        Self::new(Message::Notification(notification))
    }

    /// Checks if this envelope uses a compatible protocol version.
    pub fn is_compatible(&self) -> bool {
        self.protocol_version == PROTOCOL_VERSION
    }
}

/// The three message classes carried by the protocol.
///
/// Requests expect exactly one response of the same kind; notifications are
/// one-way in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Message {
    /// Hosting → worker call.
    Request(Request),
    /// Worker → hosting answer.
    Response(Response),
    /// One-way event, either direction.
    Notification(Notification),
}

/// Requests sent from the hosting process to the worker.
///
/// Absent fields decode to their zero values; an absent or unknown `type`
/// tag is a hard decode error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Create a meeting and join it as host.
    StartMeeting {
        #[serde(default)]
        param: StartMeetingParams,
        #[serde(default)]
        options: MeetingOptions,
    },

    /// Join an existing meeting.
    JoinMeeting {
        #[serde(default)]
        param: JoinMeetingParams,
        #[serde(default)]
        options: MeetingOptions,
    },

    /// Leave the running meeting; `finish` ends it for everyone.
    LeaveMeeting {
        #[serde(default)]
        finish: bool,
    },

    /// Snapshot of the running meeting.
    GetMeetingInfo,

    /// Registered built-in menu items for the given ids (all when empty).
    GetPresetMenuItems {
        #[serde(default)]
        item_ids: Vec<i32>,
    },

    /// Subscribe or unsubscribe remote audio streams.
    SubscribeAudioStreams {
        #[serde(default)]
        account_ids: Vec<String>,
        #[serde(default)]
        subscribe: bool,
    },

    /// Authenticate the worker's engine session.
    Login {
        #[serde(default)]
        account_id: String,
        #[serde(default)]
        token: String,
    },

    /// End the engine session; `cleanup` also drops cached credentials.
    Logout {
        #[serde(default)]
        cleanup: bool,
    },

    /// The logged-in account, if any.
    GetAccountInfo,
}

impl Request {
    /// Creates a StartMeeting request.
    pub fn start_meeting(param: StartMeetingParams, options: MeetingOptions) -> Self {
        Self::StartMeeting { param, options }
    }

    /// Creates a JoinMeeting request.
    pub fn join_meeting(param: JoinMeetingParams, options: MeetingOptions) -> Self {
        Self::JoinMeeting { param, options }
    }

    /// Creates a LeaveMeeting request.
    pub fn leave_meeting(finish: bool) -> Self {
        Self::LeaveMeeting { finish }
    }

    /// Creates a Login request.
    pub fn login(account_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self::Login {
            account_id: account_id.into(),
            token: token.into(),
        }
    }

    /// Creates a Logout request.
    pub fn logout(cleanup: bool) -> Self {
        Self::Logout { cleanup }
    }

    /// The kind used for correlation and in-flight tracking.
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::StartMeeting { .. } => RequestKind::StartMeeting,
            Self::JoinMeeting { .. } => RequestKind::JoinMeeting,
            Self::LeaveMeeting { .. } => RequestKind::LeaveMeeting,
            Self::GetMeetingInfo => RequestKind::GetMeetingInfo,
            Self::GetPresetMenuItems { .. } => RequestKind::GetPresetMenuItems,
            Self::SubscribeAudioStreams { .. } => RequestKind::SubscribeAudioStreams,
            Self::Login { .. } => RequestKind::Login,
            Self::Logout { .. } => RequestKind::Logout,
            Self::GetAccountInfo => RequestKind::GetAccountInfo,
        }
    }
}

/// Request/response kind, the correlation key of the protocol.
///
/// The wire has no request ids: the hosting side keeps at most one request
/// of each kind in flight and matches the response by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    StartMeeting,
    JoinMeeting,
    LeaveMeeting,
    GetMeetingInfo,
    GetPresetMenuItems,
    SubscribeAudioStreams,
    Login,
    Logout,
    GetAccountInfo,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::StartMeeting => "start_meeting",
            Self::JoinMeeting => "join_meeting",
            Self::LeaveMeeting => "leave_meeting",
            Self::GetMeetingInfo => "get_meeting_info",
            Self::GetPresetMenuItems => "get_preset_menu_items",
            Self::SubscribeAudioStreams => "subscribe_audio_streams",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::GetAccountInfo => "get_account_info",
        };
        f.write_str(name)
    }
}

/// Result carried by every response: a code plus a human-readable message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResult {
    /// Outcome code; [`RpcCode::SUCCESS`] when the operation worked.
    #[serde(default)]
    pub code: RpcCode,

    /// Error detail; empty on success.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl RpcResult {
    /// Creates a result from a code and message.
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// A successful result with no message.
    pub fn success() -> Self {
        Self::default()
    }

    /// A generic failure with the given message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(RpcCode::FAILED, message)
    }

    /// A validation failure with the given aggregated message.
    pub fn param_error(message: impl Into<String>) -> Self {
        Self::new(RpcCode::PARAM_ERROR, message)
    }

    /// Returns true when the code is [`RpcCode::SUCCESS`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}

/// Responses sent from the worker back to the hosting process.
///
/// Every variant flattens an [`RpcResult`]; payload-bearing variants add
/// their payload next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    StartMeeting {
        #[serde(flatten)]
        result: RpcResult,
    },

    JoinMeeting {
        #[serde(flatten)]
        result: RpcResult,
    },

    LeaveMeeting {
        #[serde(flatten)]
        result: RpcResult,
    },

    GetMeetingInfo {
        #[serde(flatten)]
        result: RpcResult,
        #[serde(default)]
        info: MeetingInfo,
    },

    GetPresetMenuItems {
        #[serde(flatten)]
        result: RpcResult,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        items: Vec<MenuItem>,
    },

    SubscribeAudioStreams {
        #[serde(flatten)]
        result: RpcResult,
    },

    Login {
        #[serde(flatten)]
        result: RpcResult,
    },

    Logout {
        #[serde(flatten)]
        result: RpcResult,
    },

    GetAccountInfo {
        #[serde(flatten)]
        result: RpcResult,
        #[serde(default)]
        account: AccountInfo,
    },
}

impl Response {
    /// Builds the payload-free response of the given kind; payload-bearing
    /// kinds get their zero-value payload.
    pub fn from_result(kind: RequestKind, result: RpcResult) -> Self {
        match kind {
            RequestKind::StartMeeting => Self::StartMeeting { result },
            RequestKind::JoinMeeting => Self::JoinMeeting { result },
            RequestKind::LeaveMeeting => Self::LeaveMeeting { result },
            RequestKind::GetMeetingInfo => Self::GetMeetingInfo {
                result,
                info: MeetingInfo::default(),
            },
            RequestKind::GetPresetMenuItems => Self::GetPresetMenuItems {
                result,
                items: Vec::new(),
            },
            RequestKind::SubscribeAudioStreams => Self::SubscribeAudioStreams { result },
            RequestKind::Login => Self::Login { result },
            RequestKind::Logout => Self::Logout { result },
            RequestKind::GetAccountInfo => Self::GetAccountInfo {
                result,
                account: AccountInfo::default(),
            },
        }
    }

    /// The kind used for correlation.
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::StartMeeting { .. } => RequestKind::StartMeeting,
            Self::JoinMeeting { .. } => RequestKind::JoinMeeting,
            Self::LeaveMeeting { .. } => RequestKind::LeaveMeeting,
            Self::GetMeetingInfo { .. } => RequestKind::GetMeetingInfo,
            Self::GetPresetMenuItems { .. } => RequestKind::GetPresetMenuItems,
            Self::SubscribeAudioStreams { .. } => RequestKind::SubscribeAudioStreams,
            Self::Login { .. } => RequestKind::Login,
            Self::Logout { .. } => RequestKind::Logout,
            Self::GetAccountInfo { .. } => RequestKind::GetAccountInfo,
        }
    }

    /// The result every variant carries.
    #[must_use]
    pub fn result(&self) -> &RpcResult {
        match self {
            Self::StartMeeting { result }
            | Self::JoinMeeting { result }
            | Self::LeaveMeeting { result }
            | Self::GetMeetingInfo { result, .. }
            | Self::GetPresetMenuItems { result, .. }
            | Self::SubscribeAudioStreams { result }
            | Self::Login { result }
            | Self::Logout { result }
            | Self::GetAccountInfo { result, .. } => result,
        }
    }

    /// Returns true when the carried result is a success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result().is_success()
    }
}

/// One-way events.
///
/// Statuses travel as raw integers (see `huddle_core::status`); receivers
/// clamp unknown values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Worker → hosting: the meeting status machine moved.
    MeetingStatusChanged {
        #[serde(default)]
        status: i32,
        #[serde(default)]
        code: i32,
    },

    /// Worker → hosting: the auth session ended outside a logout call.
    AuthEvent {
        #[serde(default)]
        event: AuthEventKind,
    },

    /// Worker → hosting: an injected menu item was clicked.
    MenuItemClicked {
        #[serde(default)]
        item: MenuItem,
    },

    /// Hosting → worker: new checked state for a clicked two-state item.
    MenuItemState {
        #[serde(default)]
        item_id: i32,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        item_guid: String,
        #[serde(default)]
        checked_index: i32,
    },
}

/// Session-ending auth events pushed without a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventKind {
    /// The token expired; the user must log in again.
    #[default]
    Expired,
    /// The session was taken over from another device.
    KickedOut,
}
