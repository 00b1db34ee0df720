//! Engine seams: the meeting/RTC backend behind trait objects.
//!
//! The real engine lives outside this repository. The dispatcher drives it
//! through [`MeetingEngine`] and [`AuthEngine`] and hears back only through
//! [`EngineEvent`]s on a channel: a call returning `Ok` means the engine
//! accepted the operation, not that it completed.

use huddle_core::{
    AccountInfo, AuthStatus, JoinMeetingParams, MeetingInfo, MeetingMember, MeetingOptions,
    MeetingStatus, MenuItem, StartMeetingParams,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::WorkerResult;

/// Completion and push events emitted by the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The meeting status machine moved.
    MeetingStatus {
        status: MeetingStatus,
        /// Engine extended code (0/200 success, 3100 already-in-meeting, ...).
        code: i32,
        message: String,
        /// Populated on `Connected`.
        info: Option<MeetingInfo>,
    },

    /// The auth status machine moved.
    AuthStatus {
        status: AuthStatus,
        code: i32,
        message: String,
        /// Populated on `LoggedIn`.
        account: Option<AccountInfo>,
    },

    /// An injected menu item was clicked in the meeting UI.
    MenuItemClicked { item: MenuItem },
}

/// Meeting-side engine operations.
///
/// Start/join/leave complete asynchronously via
/// [`EngineEvent::MeetingStatus`]; only audio subscriptions complete on
/// return.
pub trait MeetingEngine: Send {
    /// Creates a room and enters it as host.
    fn create_room(
        &mut self,
        params: &StartMeetingParams,
        options: &MeetingOptions,
    ) -> WorkerResult<()>;

    /// Joins an existing room.
    fn join_room(
        &mut self,
        params: &JoinMeetingParams,
        options: &MeetingOptions,
    ) -> WorkerResult<()>;

    /// Leaves the current room; `finish` ends the meeting for everyone.
    fn leave_room(&mut self, finish: bool) -> WorkerResult<()>;

    /// Subscribes or unsubscribes the given members' audio streams.
    fn subscribe_remote_audio(&mut self, account_ids: &[String], subscribe: bool)
    -> WorkerResult<()>;
}

/// Auth-side engine operations, completing via [`EngineEvent::AuthStatus`].
pub trait AuthEngine: Send {
    /// Authenticates with an account id and token.
    fn login(&mut self, account_id: &str, token: &str) -> WorkerResult<()>;

    /// Creates a throw-away anonymous session.
    fn login_anonymous(&mut self) -> WorkerResult<()>;

    /// Ends the current session.
    fn logout(&mut self) -> WorkerResult<()>;
}

/// In-process engine stand-in.
///
/// Emits the same status sequences the real engine would, synchronously on
/// each call, so dispatcher and end-to-end tests can drive every resolution
/// path. Failure injection is one-shot: the next create/join or login fails
/// with the given code and message.
pub struct MockEngine {
    events: mpsc::UnboundedSender<EngineEvent>,
    account: Option<AccountInfo>,
    fail_connect: Option<(i32, String)>,
    fail_login: Option<(i32, String)>,
}

impl MockEngine {
    /// Creates the engine and the event receiver the runtime loop drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                events,
                account: None,
                fail_connect: None,
                fail_login: None,
            },
            rx,
        )
    }

    /// Makes the next create/join end in `ConnectFailed` with this outcome.
    pub fn fail_next_connect(&mut self, code: i32, message: impl Into<String>) {
        self.fail_connect = Some((code, message.into()));
    }

    /// Makes the next login end in `LoginFailed` with this outcome.
    pub fn fail_next_login(&mut self, code: i32, message: impl Into<String>) {
        self.fail_login = Some((code, message.into()));
    }

    /// Simulates a click on an in-meeting menu item.
    pub fn click_menu_item(&mut self, item: MenuItem) {
        self.emit(EngineEvent::MenuItemClicked { item });
    }

    /// Simulates the session token expiring server-side.
    pub fn expire_session(&mut self) {
        self.account = None;
        self.emit_auth(AuthStatus::Expired, 0, "", None);
    }

    /// Simulates the session being taken over from another device.
    pub fn kick_out(&mut self) {
        self.account = None;
        self.emit_auth(AuthStatus::KickedOut, 0, "", None);
    }

    fn emit(&self, event: EngineEvent) {
        // Receiver gone means the runtime loop ended; nothing left to notify.
        let _ = self.events.send(event);
    }

    fn emit_meeting(&self, status: MeetingStatus, code: i32, message: &str, info: Option<MeetingInfo>) {
        self.emit(EngineEvent::MeetingStatus {
            status,
            code,
            message: message.to_owned(),
            info,
        });
    }

    fn emit_auth(&self, status: AuthStatus, code: i32, message: &str, account: Option<AccountInfo>) {
        self.emit(EngineEvent::AuthStatus {
            status,
            code,
            message: message.to_owned(),
            account,
        });
    }

    fn local_member(&self, display_name: &str, tag: &str) -> MeetingMember {
        MeetingMember {
            user_id: self
                .account
                .as_ref()
                .map(|account| account.account_id.clone())
                .unwrap_or_else(|| "guest".to_owned()),
            user_name: display_name.to_owned(),
            tag: tag.to_owned(),
        }
    }
}

impl MeetingEngine for MockEngine {
    fn create_room(
        &mut self,
        params: &StartMeetingParams,
        _options: &MeetingOptions,
    ) -> WorkerResult<()> {
        self.emit_meeting(MeetingStatus::Connecting, 0, "", None);
        if let Some((code, message)) = self.fail_connect.take() {
            self.emit_meeting(MeetingStatus::ConnectFailed, code, &message, None);
            self.emit_meeting(MeetingStatus::Idle, 0, "", None);
            return Ok(());
        }

        let local = self.local_member(&params.display_name, &params.tag);
        let meeting_id = if params.meeting_id.is_empty() {
            synthesize_meeting_id()
        } else {
            params.meeting_id.clone()
        };
        let info = MeetingInfo {
            is_host: true,
            meeting_id,
            meeting_unique_id: 1,
            subject: format!("{}'s meeting", params.display_name),
            password: params.password.clone(),
            host_user_id: local.user_id.clone(),
            start_time: chrono::Utc::now().timestamp_millis(),
            extra_data: params.extra_data.clone(),
            members: vec![local],
            ..MeetingInfo::default()
        };
        self.emit_meeting(MeetingStatus::Connected, 200, "", Some(info));
        Ok(())
    }

    fn join_room(
        &mut self,
        params: &JoinMeetingParams,
        _options: &MeetingOptions,
    ) -> WorkerResult<()> {
        self.emit_meeting(MeetingStatus::Connecting, 0, "", None);
        if let Some((code, message)) = self.fail_connect.take() {
            self.emit_meeting(MeetingStatus::ConnectFailed, code, &message, None);
            self.emit_meeting(MeetingStatus::Idle, 0, "", None);
            return Ok(());
        }

        let local = self.local_member(&params.display_name, &params.tag);
        let host = MeetingMember {
            user_id: "host-1".to_owned(),
            user_name: "Host".to_owned(),
            tag: String::new(),
        };
        let info = MeetingInfo {
            meeting_id: params.meeting_id.clone(),
            meeting_unique_id: 2,
            subject: "Joined meeting".to_owned(),
            password: params.password.clone(),
            host_user_id: host.user_id.clone(),
            start_time: chrono::Utc::now().timestamp_millis(),
            members: vec![host, local],
            ..MeetingInfo::default()
        };
        self.emit_meeting(MeetingStatus::Connected, 200, "", Some(info));
        Ok(())
    }

    fn leave_room(&mut self, _finish: bool) -> WorkerResult<()> {
        self.emit_meeting(MeetingStatus::Ended, 0, "", None);
        self.emit_meeting(MeetingStatus::Idle, 0, "", None);
        Ok(())
    }

    fn subscribe_remote_audio(
        &mut self,
        _account_ids: &[String],
        _subscribe: bool,
    ) -> WorkerResult<()> {
        Ok(())
    }
}

impl AuthEngine for MockEngine {
    fn login(&mut self, account_id: &str, token: &str) -> WorkerResult<()> {
        self.emit_auth(AuthStatus::Processing, 0, "", None);
        if let Some((code, message)) = self.fail_login.take() {
            self.emit_auth(AuthStatus::LoginFailed, code, &message, None);
            return Ok(());
        }

        let account = AccountInfo {
            account_id: account_id.to_owned(),
            account_token: token.to_owned(),
            nickname: account_id.to_owned(),
            personal_room_id: synthesize_personal_room_id(account_id),
            anonymous: false,
        };
        self.account = Some(account.clone());
        self.emit_auth(AuthStatus::LoggedIn, 200, "", Some(account));
        Ok(())
    }

    fn login_anonymous(&mut self) -> WorkerResult<()> {
        self.emit_auth(AuthStatus::Processing, 0, "", None);
        if let Some((code, message)) = self.fail_login.take() {
            self.emit_auth(AuthStatus::LoginFailed, code, &message, None);
            return Ok(());
        }

        let account = AccountInfo {
            account_id: format!("guest-{}", Uuid::new_v4().simple()),
            nickname: "Guest".to_owned(),
            anonymous: true,
            ..AccountInfo::default()
        };
        self.account = Some(account.clone());
        self.emit_auth(AuthStatus::LoggedIn, 200, "", Some(account));
        Ok(())
    }

    fn logout(&mut self) -> WorkerResult<()> {
        self.account = None;
        self.emit_auth(AuthStatus::LoggedOut, 0, "", None);
        Ok(())
    }
}

/// Nine decimal digits, the shape of a server-assigned meeting id.
fn synthesize_meeting_id() -> String {
    format!("{:09}", Uuid::new_v4().as_u128() % 1_000_000_000)
}

/// Deterministic ten-digit personal room id derived from the account id.
fn synthesize_personal_room_id(account_id: &str) -> String {
    let mut hash: u64 = 0;
    for byte in account_id.bytes() {
        hash = hash.wrapping_mul(31).wrapping_add(u64::from(byte));
    }
    format!("{:010}", hash % 10_000_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn create_room_emits_connecting_then_connected() {
        let (mut engine, mut rx) = MockEngine::new();
        let params = StartMeetingParams {
            display_name: "amy".into(),
            ..StartMeetingParams::default()
        };
        engine.create_room(&params, &MeetingOptions::default()).unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            EngineEvent::MeetingStatus {
                status: MeetingStatus::Connecting,
                ..
            }
        ));
        match &events[1] {
            EngineEvent::MeetingStatus {
                status: MeetingStatus::Connected,
                code: 200,
                info: Some(info),
                ..
            } => {
                assert!(info.is_host);
                assert_eq!(info.meeting_id.len(), 9);
                assert_eq!(info.members.len(), 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn injected_connect_failure_ends_in_idle() {
        let (mut engine, mut rx) = MockEngine::new();
        engine.fail_next_connect(3104, "room not exist");
        engine
            .join_room(&JoinMeetingParams::default(), &MeetingOptions::default())
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[1],
            EngineEvent::MeetingStatus {
                status: MeetingStatus::ConnectFailed,
                code: 3104,
                ..
            }
        ));
        assert!(matches!(
            events[2],
            EngineEvent::MeetingStatus {
                status: MeetingStatus::Idle,
                ..
            }
        ));

        // One-shot injection: the next join succeeds.
        engine
            .join_room(&JoinMeetingParams::default(), &MeetingOptions::default())
            .unwrap();
        let events = drain(&mut rx);
        assert!(matches!(
            events[1],
            EngineEvent::MeetingStatus {
                status: MeetingStatus::Connected,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn login_produces_account_with_personal_room_id() {
        let (mut engine, mut rx) = MockEngine::new();
        engine.login("user-1", "tok").unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        match &events[1] {
            EngineEvent::AuthStatus {
                status: AuthStatus::LoggedIn,
                account: Some(account),
                ..
            } => {
                assert_eq!(account.account_id, "user-1");
                assert_eq!(account.personal_room_id.len(), 10);
                assert!(!account.anonymous);
                // Deterministic derivation.
                assert_eq!(
                    account.personal_room_id,
                    synthesize_personal_room_id("user-1")
                );
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn anonymous_login_has_no_personal_room() {
        let (mut engine, mut rx) = MockEngine::new();
        engine.login_anonymous().unwrap();

        let events = drain(&mut rx);
        match &events[1] {
            EngineEvent::AuthStatus {
                account: Some(account),
                ..
            } => {
                assert!(account.anonymous);
                assert!(account.personal_room_id.is_empty());
                assert!(account.account_id.starts_with("guest-"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
