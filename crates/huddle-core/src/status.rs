//! Meeting and auth status machines shared by both processes.
//!
//! Statuses cross the IPC boundary as raw integers; conversion back into the
//! enums lives here so that both sides clamp unknown values the same way.

/// Coarse meeting lifecycle observed by the dispatcher and reported to the
/// hosting process.
///
/// Transitions: Idle → Connecting/Preparing → Connected → Ended → Idle, with
/// ConnectFailed reachable from any pre-Connected state and
/// Reconnecting/Reconnected during an established meeting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MeetingStatus {
    #[default]
    Idle,
    Connecting,
    Preparing,
    Connected,
    Reconnecting,
    Reconnected,
    Ended,
    ConnectFailed,
}

impl MeetingStatus {
    /// Decodes a wire integer; unknown values yield `None` and are clamped by
    /// the caller.
    #[must_use]
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Connecting),
            2 => Some(Self::Preparing),
            3 => Some(Self::Connected),
            4 => Some(Self::Reconnecting),
            5 => Some(Self::Reconnected),
            6 => Some(Self::Ended),
            7 => Some(Self::ConnectFailed),
            _ => None,
        }
    }

    /// The integer this status travels as.
    #[must_use]
    pub fn as_wire(self) -> i32 {
        match self {
            Self::Idle => 0,
            Self::Connecting => 1,
            Self::Preparing => 2,
            Self::Connected => 3,
            Self::Reconnecting => 4,
            Self::Reconnected => 5,
            Self::Ended => 6,
            Self::ConnectFailed => 7,
        }
    }

    /// In-meeting operations (leave, get-info, audio subscriptions) are legal
    /// only in these states.
    #[must_use]
    pub fn is_in_meeting(self) -> bool {
        matches!(self, Self::Connected | Self::Reconnected)
    }
}

/// Authentication lifecycle driving the login/logout pending slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthStatus {
    #[default]
    Idle,
    Processing,
    LoggedIn,
    LoginFailed,
    LoggedOut,
    LogoutFailed,
    Expired,
    KickedOut,
}

impl AuthStatus {
    /// Decodes a wire integer; unknown values yield `None`.
    #[must_use]
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Processing),
            2 => Some(Self::LoggedIn),
            3 => Some(Self::LoginFailed),
            4 => Some(Self::LoggedOut),
            5 => Some(Self::LogoutFailed),
            6 => Some(Self::Expired),
            7 => Some(Self::KickedOut),
            _ => None,
        }
    }

    /// The integer this status travels as.
    #[must_use]
    pub fn as_wire(self) -> i32 {
        match self {
            Self::Idle => 0,
            Self::Processing => 1,
            Self::LoggedIn => 2,
            Self::LoginFailed => 3,
            Self::LoggedOut => 4,
            Self::LogoutFailed => 5,
            Self::Expired => 6,
            Self::KickedOut => 7,
        }
    }

    /// True once a login has completed and not been undone.
    #[must_use]
    pub fn is_logged_in(self) -> bool {
        matches!(self, Self::LoggedIn)
    }
}
