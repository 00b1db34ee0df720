//! Meeting-side request handlers and the meeting status machine.

use chrono::Utc;
use huddle_core::{
    JoinMeetingParams, MeetingInfo, MeetingOptions, MeetingStatus, RpcCode, StartMeetingParams,
};
use huddle_protocol::{Envelope, Notification, Response, RpcResult};
use tokio::time::Instant;
use tracing::debug;

use super::validate::{aggregate_message, menu_violations, password_violation};
use super::{Dispatcher, SlotKind};
use crate::engine::{AuthEngine, MeetingEngine};

/// Connect-failure reasons the engine has already surfaced to the user; the
/// pending request is acknowledged as handled instead of failed a second
/// time.
const HANDLED_CONNECT_FAILURES: [&str; 5] = [
    "join timeout",
    "room not exist",
    "sync data error",
    "rtc init error",
    "join channel error",
];

impl<E> Dispatcher<E>
where
    E: MeetingEngine + AuthEngine,
{
    pub(super) fn handle_start(
        &mut self,
        param: StartMeetingParams,
        options: MeetingOptions,
        replies: &mut Vec<Envelope>,
    ) {
        let mut violations = menu_violations(&options.toolbar_items, &options.more_items);
        if let Some(violation) = password_violation(&param.password) {
            violations.push(violation);
        }
        if !violations.is_empty() {
            replies.push(Envelope::response(Response::StartMeeting {
                result: RpcResult::param_error(aggregate_message(&violations)),
            }));
            return;
        }

        if self.slots.is_occupied(SlotKind::StartMeeting) {
            replies.push(Envelope::response(Response::StartMeeting {
                result: RpcResult::failed("Frequent operation, please try again later"),
            }));
            return;
        }
        if self.meeting.status() != MeetingStatus::Idle {
            replies.push(Envelope::response(Response::StartMeeting {
                result: RpcResult::new(
                    RpcCode::ALREADY_IN_MEETING,
                    "The last meeting is not end yet.",
                ),
            }));
            return;
        }
        if !param.meeting_id.is_empty() && !self.is_personal_meeting_id(&param.meeting_id) {
            replies.push(Envelope::response(Response::StartMeeting {
                result: RpcResult::param_error("Only supports personal meeting ID."),
            }));
            return;
        }

        // Free per the slot check above; handlers run to completion.
        self.slots.try_occupy(SlotKind::StartMeeting, Instant::now());
        self.seed_meeting_state(&options);
        if let Err(error) = self.engine.create_room(&param, &options) {
            self.resolve_slot(
                SlotKind::StartMeeting,
                RpcResult::failed(error.to_string()),
                replies,
            );
        }
    }

    pub(super) fn handle_join(
        &mut self,
        param: JoinMeetingParams,
        options: MeetingOptions,
        replies: &mut Vec<Envelope>,
    ) {
        let violations = menu_violations(&options.toolbar_items, &options.more_items);
        if !violations.is_empty() {
            replies.push(Envelope::response(Response::JoinMeeting {
                result: RpcResult::param_error(aggregate_message(&violations)),
            }));
            return;
        }

        if self.slots.is_occupied(SlotKind::JoinMeeting) {
            replies.push(Envelope::response(Response::JoinMeeting {
                result: RpcResult::failed("Frequent operation, please try again later"),
            }));
            return;
        }
        if self.meeting.status() != MeetingStatus::Idle {
            replies.push(Envelope::response(Response::JoinMeeting {
                result: RpcResult::new(
                    RpcCode::ALREADY_IN_MEETING,
                    "The last meeting is not end yet.",
                ),
            }));
            return;
        }

        // Free per the slot check above; handlers run to completion.
        self.slots.try_occupy(SlotKind::JoinMeeting, Instant::now());

        if param.anonymous && !self.auth.is_logged_in() {
            // Log in first; `LoggedIn` picks the join back up.
            debug!("deferring join behind an anonymous login");
            self.pending_anonymous_join = Some((param, options));
            if let Err(error) = self.engine.login_anonymous() {
                self.pending_anonymous_join = None;
                self.resolve_slot(
                    SlotKind::JoinMeeting,
                    RpcResult::failed(error.to_string()),
                    replies,
                );
            }
            return;
        }

        self.seed_meeting_state(&options);
        if let Err(error) = self.engine.join_room(&param, &options) {
            self.resolve_slot(
                SlotKind::JoinMeeting,
                RpcResult::failed(error.to_string()),
                replies,
            );
        }
    }

    pub(super) fn handle_leave(&mut self, finish: bool, replies: &mut Vec<Envelope>) {
        if self.slots.is_occupied(SlotKind::LeaveMeeting) {
            replies.push(Envelope::response(Response::LeaveMeeting {
                result: RpcResult::failed("Frequent operation, please try again later"),
            }));
            return;
        }
        if !self.meeting.is_in_meeting() {
            replies.push(Envelope::response(Response::LeaveMeeting {
                result: RpcResult::failed("The meeting has not yet started."),
            }));
            return;
        }
        if finish {
            // Ending for everyone takes a real account with the host role.
            let account = self.auth.account().filter(|account| !account.anonymous);
            let Some(account) = account else {
                replies.push(Envelope::response(Response::LeaveMeeting {
                    result: RpcResult::failed("Did not logged in."),
                }));
                return;
            };
            if !self.meeting.is_host(&account.account_id) {
                replies.push(Envelope::response(Response::LeaveMeeting {
                    result: RpcResult::failed("You have no permission"),
                }));
                return;
            }
        }

        // Free per the slot check above; handlers run to completion.
        self.slots.try_occupy(SlotKind::LeaveMeeting, Instant::now());
        if let Err(error) = self.engine.leave_room(finish) {
            self.resolve_slot(
                SlotKind::LeaveMeeting,
                RpcResult::failed(error.to_string()),
                replies,
            );
        }
    }

    pub(super) fn handle_get_meeting_info(&mut self, replies: &mut Vec<Envelope>) {
        let account_id = self
            .auth
            .account()
            .map(|account| account.account_id.clone());
        let Some(account_id) = account_id else {
            replies.push(Envelope::response(Response::GetMeetingInfo {
                result: RpcResult::failed(""),
                info: MeetingInfo::default(),
            }));
            return;
        };
        if !self.meeting.is_in_meeting() {
            replies.push(Envelope::response(Response::GetMeetingInfo {
                result: RpcResult::failed(""),
                info: MeetingInfo::default(),
            }));
            return;
        }
        replies.push(Envelope::response(Response::GetMeetingInfo {
            result: RpcResult::success(),
            info: self.meeting.snapshot(&account_id, Utc::now()),
        }));
    }

    pub(super) fn handle_get_preset_menu_items(
        &mut self,
        item_ids: &[i32],
        replies: &mut Vec<Envelope>,
    ) {
        replies.push(Envelope::response(Response::GetPresetMenuItems {
            result: RpcResult::success(),
            items: self.menus.preset_items(item_ids),
        }));
    }

    pub(super) fn handle_subscribe_audio(
        &mut self,
        account_ids: &[String],
        subscribe: bool,
        replies: &mut Vec<Envelope>,
    ) {
        let result = match self.check_subscribe_audio(account_ids) {
            Some(rejection) => rejection,
            None => match self.engine.subscribe_remote_audio(account_ids, subscribe) {
                Ok(()) => RpcResult::success(),
                Err(error) => RpcResult::failed(error.to_string()),
            },
        };
        replies.push(Envelope::response(Response::SubscribeAudioStreams {
            result,
        }));
    }

    /// Applies one engine meeting-status event.
    ///
    /// The notification goes out first so the hosting side observes the
    /// transition before any request resolves on it; non-terminal statuses
    /// resolve nothing.
    pub(super) fn handle_meeting_status(
        &mut self,
        status: MeetingStatus,
        code: i32,
        message: String,
        info: Option<MeetingInfo>,
        replies: &mut Vec<Envelope>,
    ) {
        debug!(status = ?status, code, "meeting status changed");
        replies.push(Envelope::notification(Notification::MeetingStatusChanged {
            status: status.as_wire(),
            code,
        }));
        self.meeting.set_status(status);
        self.persist_meeting_status(status);

        match status {
            MeetingStatus::Idle
            | MeetingStatus::Connecting
            | MeetingStatus::Preparing
            | MeetingStatus::Reconnecting
            | MeetingStatus::Reconnected => {}
            MeetingStatus::Connected => {
                if let Some(info) = info {
                    self.meeting.mark_connected(info, Utc::now());
                }
                self.resolve_meeting_slots(RpcCode::from_extended(code), &message, replies);
            }
            MeetingStatus::Ended => {
                self.meeting.reset();
                self.resolve_meeting_slots(RpcCode::from_extended(code), &message, replies);
            }
            MeetingStatus::ConnectFailed => {
                self.meeting.reset();
                if HANDLED_CONNECT_FAILURES.contains(&message.as_str()) {
                    // Already surfaced in-process; acknowledge as handled.
                    self.resolve_slot(SlotKind::StartMeeting, RpcResult::success(), replies);
                    self.resolve_slot(SlotKind::JoinMeeting, RpcResult::success(), replies);
                } else {
                    self.resolve_meeting_slots(RpcCode::from_extended(code), &message, replies);
                }
            }
        }
    }

    /// Start, join and leave are checked together on every terminal status.
    fn resolve_meeting_slots(&mut self, code: RpcCode, message: &str, replies: &mut Vec<Envelope>) {
        for kind in [
            SlotKind::StartMeeting,
            SlotKind::JoinMeeting,
            SlotKind::LeaveMeeting,
        ] {
            self.resolve_slot(kind, RpcResult::new(code, message), replies);
        }
    }

    /// Pushes the request's option flags and menu lists into the managers.
    pub(super) fn seed_meeting_state(&mut self, options: &MeetingOptions) {
        self.meeting.apply_options(options);
        self.settings.apply(options);
        self.menus.install_toolbar(&options.toolbar_items);
        self.menus.install_more(&options.more_items);
    }

    /// Whether `meeting_id` is the logged-in account's personal room id.
    fn is_personal_meeting_id(&self, meeting_id: &str) -> bool {
        self.auth.account().is_some_and(|account| {
            !account.personal_room_id.is_empty() && account.personal_room_id == meeting_id
        })
    }

    /// Pre-flight checks for audio subscription changes.
    fn check_subscribe_audio(&self, account_ids: &[String]) -> Option<RpcResult> {
        if !self.meeting.is_in_meeting() {
            return Some(RpcResult::new(
                RpcCode(2200),
                "The meeting is not in progress",
            ));
        }
        if account_ids.is_empty() {
            return Some(RpcResult::new(RpcCode(300), "accountId list is null"));
        }
        let own_id = self
            .auth
            .account()
            .map(|account| account.account_id.as_str())
            .unwrap_or_default();
        for account_id in account_ids {
            if account_id == own_id {
                return Some(RpcResult::new(
                    RpcCode(2101),
                    "You can't subscribe to your own audio",
                ));
            }
            let known = self
                .meeting
                .info()
                .members
                .iter()
                .any(|member| member.user_id == *account_id);
            if !known {
                return Some(RpcResult::new(RpcCode(2101), "The member does not exist"));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use huddle_core::{
        JoinMeetingParams, MeetingOptions, MeetingStatus, MenuItem, RpcCode, StartMeetingParams,
    };
    use huddle_protocol::{Envelope, Message, Notification, Request, Response};
    use tokio::sync::mpsc;

    use crate::dispatch::Dispatcher;
    use crate::engine::{EngineEvent, MockEngine};
    use crate::managers::ConfigStore;

    fn dispatcher() -> (Dispatcher<MockEngine>, mpsc::UnboundedReceiver<EngineEvent>) {
        let (engine, events) = MockEngine::new();
        (Dispatcher::new(ConfigStore::in_memory(), engine), events)
    }

    fn request(
        dispatcher: &mut Dispatcher<MockEngine>,
        request: Request,
        replies: &mut Vec<Envelope>,
    ) {
        let payload = serde_json::to_vec(&Envelope::request(request)).unwrap();
        let _ = dispatcher.handle_payload(&payload, replies);
    }

    fn pump(
        dispatcher: &mut Dispatcher<MockEngine>,
        events: &mut mpsc::UnboundedReceiver<EngineEvent>,
        replies: &mut Vec<Envelope>,
    ) {
        while let Ok(event) = events.try_recv() {
            dispatcher.handle_engine_event(event, replies);
        }
    }

    fn responses(replies: &[Envelope]) -> Vec<&Response> {
        replies
            .iter()
            .filter_map(|envelope| match &envelope.message {
                Message::Response(response) => Some(response),
                _ => None,
            })
            .collect()
    }

    fn start_request() -> Request {
        Request::start_meeting(
            StartMeetingParams {
                display_name: "amy".into(),
                ..StartMeetingParams::default()
            },
            MeetingOptions::default(),
        )
    }

    fn join_request() -> Request {
        Request::join_meeting(
            JoinMeetingParams {
                display_name: "amy".into(),
                meeting_id: "123456789".into(),
                ..JoinMeetingParams::default()
            },
            MeetingOptions::default(),
        )
    }

    fn login(
        dispatcher: &mut Dispatcher<MockEngine>,
        events: &mut mpsc::UnboundedReceiver<EngineEvent>,
    ) {
        let mut replies = Vec::new();
        request(dispatcher, Request::login("user-1", "tok"), &mut replies);
        pump(dispatcher, events, &mut replies);
        assert!(dispatcher.auth_status().is_logged_in());
    }

    /// Runs a start through Connected so in-meeting handlers have a meeting.
    fn start_connected(
        dispatcher: &mut Dispatcher<MockEngine>,
        events: &mut mpsc::UnboundedReceiver<EngineEvent>,
    ) {
        let mut replies = Vec::new();
        request(dispatcher, start_request(), &mut replies);
        pump(dispatcher, events, &mut replies);
        assert_eq!(dispatcher.meeting_status(), MeetingStatus::Connected);
    }

    #[tokio::test]
    async fn start_resolves_exactly_once_on_connected() {
        let (mut dispatcher, mut events) = dispatcher();
        login(&mut dispatcher, &mut events);

        let mut replies = Vec::new();
        request(&mut dispatcher, start_request(), &mut replies);
        assert!(replies.is_empty(), "start must not answer synchronously");

        pump(&mut dispatcher, &mut events, &mut replies);
        let responses = responses(&replies);
        assert_eq!(responses.len(), 1);
        match responses[0] {
            Response::StartMeeting { result } => assert!(result.is_success()),
            other => panic!("unexpected response: {other:?}"),
        }

        // The slot is free again: a second start reaches the status check
        // instead of the frequent-operation rejection.
        replies.clear();
        request(&mut dispatcher, start_request(), &mut replies);
        match self::responses(&replies)[0] {
            Response::StartMeeting { result } => {
                assert_eq!(result.code, RpcCode::ALREADY_IN_MEETING);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn overlapping_start_answers_frequent_operation() {
        let (mut dispatcher, mut events) = dispatcher();
        let mut replies = Vec::new();
        request(&mut dispatcher, start_request(), &mut replies);

        request(&mut dispatcher, start_request(), &mut replies);
        match responses(&replies)[0] {
            Response::StartMeeting { result } => {
                assert_eq!(result.code, RpcCode::FAILED);
                assert_eq!(result.message, "Frequent operation, please try again later");
            }
            other => panic!("unexpected response: {other:?}"),
        }

        // The first start still resolves exactly once.
        replies.clear();
        pump(&mut dispatcher, &mut events, &mut replies);
        assert_eq!(responses(&replies).len(), 1);
    }

    #[tokio::test]
    async fn validation_failure_answers_without_touching_the_engine() {
        let (mut dispatcher, mut events) = dispatcher();
        let options = MeetingOptions {
            toolbar_items: vec![
                MenuItem::new(100, "A").with_image("a.png"),
                MenuItem::new(100, "B").with_image("b.png"),
            ],
            ..MeetingOptions::default()
        };
        let start = Request::start_meeting(
            StartMeetingParams {
                password: "12a4".into(),
                ..StartMeetingParams::default()
            },
            options,
        );

        let mut replies = Vec::new();
        request(&mut dispatcher, start, &mut replies);
        match responses(&replies)[0] {
            Response::StartMeeting { result } => {
                assert_eq!(result.code, RpcCode::PARAM_ERROR);
                assert!(result.message.starts_with("Invalid params:\n"));
                assert!(result.message.contains("cannot be duplicated"));
                assert!(result.message.contains("at least 4 digits"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
        assert!(events.try_recv().is_err(), "engine must stay untouched");

        // Zero state mutation: a well-formed start now proceeds.
        replies.clear();
        request(&mut dispatcher, start_request(), &mut replies);
        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn start_accepts_only_the_personal_meeting_id() {
        let (mut dispatcher, mut events) = dispatcher();
        login(&mut dispatcher, &mut events);
        let personal = dispatcher.auth.account().unwrap().personal_room_id.clone();

        let foreign = Request::start_meeting(
            StartMeetingParams {
                meeting_id: "000000000".into(),
                ..StartMeetingParams::default()
            },
            MeetingOptions::default(),
        );
        let mut replies = Vec::new();
        request(&mut dispatcher, foreign, &mut replies);
        match responses(&replies)[0] {
            Response::StartMeeting { result } => {
                assert_eq!(result.code, RpcCode::PARAM_ERROR);
                assert_eq!(result.message, "Only supports personal meeting ID.");
            }
            other => panic!("unexpected response: {other:?}"),
        }

        let own = Request::start_meeting(
            StartMeetingParams {
                meeting_id: personal.clone(),
                ..StartMeetingParams::default()
            },
            MeetingOptions::default(),
        );
        replies.clear();
        request(&mut dispatcher, own, &mut replies);
        assert!(replies.is_empty());
        pump(&mut dispatcher, &mut events, &mut replies);
        match responses(&replies)[0] {
            Response::StartMeeting { result } => assert!(result.is_success()),
            other => panic!("unexpected response: {other:?}"),
        }
        assert_eq!(dispatcher.meeting.info().meeting_id, personal);
    }

    #[tokio::test]
    async fn join_resolves_on_connected_with_remote_host() {
        let (mut dispatcher, mut events) = dispatcher();
        login(&mut dispatcher, &mut events);

        let mut replies = Vec::new();
        request(&mut dispatcher, join_request(), &mut replies);
        pump(&mut dispatcher, &mut events, &mut replies);

        match responses(&replies)[0] {
            Response::JoinMeeting { result } => assert!(result.is_success()),
            other => panic!("unexpected response: {other:?}"),
        }
        assert_eq!(dispatcher.meeting.info().host_user_id, "host-1");
        assert!(!dispatcher.meeting.info().is_host);
    }

    #[tokio::test]
    async fn leave_when_idle_fails_without_touching_the_engine() {
        let (mut dispatcher, mut events) = dispatcher();
        let mut replies = Vec::new();
        request(&mut dispatcher, Request::leave_meeting(false), &mut replies);

        match responses(&replies)[0] {
            Response::LeaveMeeting { result } => {
                assert_eq!(result.code, RpcCode::FAILED);
                assert_eq!(result.message, "The meeting has not yet started.");
            }
            other => panic!("unexpected response: {other:?}"),
        }
        assert!(events.try_recv().is_err(), "engine must stay untouched");
    }

    #[tokio::test]
    async fn finish_requires_a_logged_in_host() {
        let (mut dispatcher, mut events) = dispatcher();
        login(&mut dispatcher, &mut events);
        // Joined meetings are hosted by someone else.
        let mut replies = Vec::new();
        request(&mut dispatcher, join_request(), &mut replies);
        pump(&mut dispatcher, &mut events, &mut replies);

        replies.clear();
        request(&mut dispatcher, Request::leave_meeting(true), &mut replies);
        match responses(&replies)[0] {
            Response::LeaveMeeting { result } => {
                assert_eq!(result.message, "You have no permission");
            }
            other => panic!("unexpected response: {other:?}"),
        }

        // Leaving without finishing stays allowed.
        replies.clear();
        request(&mut dispatcher, Request::leave_meeting(false), &mut replies);
        pump(&mut dispatcher, &mut events, &mut replies);
        match responses(&replies)[0] {
            Response::LeaveMeeting { result } => assert!(result.is_success()),
            other => panic!("unexpected response: {other:?}"),
        }
        assert_eq!(dispatcher.meeting_status(), MeetingStatus::Idle);
    }

    #[tokio::test]
    async fn finish_without_an_account_is_rejected() {
        let (mut dispatcher, mut events) = dispatcher();
        start_connected(&mut dispatcher, &mut events);

        let mut replies = Vec::new();
        request(&mut dispatcher, Request::leave_meeting(true), &mut replies);
        match responses(&replies)[0] {
            Response::LeaveMeeting { result } => {
                assert_eq!(result.message, "Did not logged in.");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn handled_connect_failure_acknowledges_the_request() {
        let (mut dispatcher, mut events) = dispatcher();
        dispatcher.engine_mut().fail_next_connect(3104, "room not exist");

        let mut replies = Vec::new();
        request(&mut dispatcher, join_request(), &mut replies);
        pump(&mut dispatcher, &mut events, &mut replies);

        match responses(&replies)[0] {
            Response::JoinMeeting { result } => {
                assert!(result.is_success());
                assert!(result.message.is_empty());
            }
            other => panic!("unexpected response: {other:?}"),
        }
        // The failure itself still reaches the hosting side as a status.
        assert!(replies.iter().any(|envelope| matches!(
            envelope.message,
            Message::Notification(Notification::MeetingStatusChanged {
                status,
                code: 3104,
            }) if status == MeetingStatus::ConnectFailed.as_wire()
        )));
        assert_eq!(dispatcher.meeting_status(), MeetingStatus::Idle);
    }

    #[tokio::test]
    async fn unhandled_connect_failure_carries_the_engine_outcome() {
        let (mut dispatcher, mut events) = dispatcher();
        dispatcher.engine_mut().fail_next_connect(3101, "room is full");

        let mut replies = Vec::new();
        request(&mut dispatcher, join_request(), &mut replies);
        pump(&mut dispatcher, &mut events, &mut replies);

        match responses(&replies)[0] {
            Response::JoinMeeting { result } => {
                assert_eq!(result.code, RpcCode(3101));
                assert_eq!(result.message, "room is full");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_notifications_precede_the_resolution() {
        let (mut dispatcher, mut events) = dispatcher();
        let mut replies = Vec::new();
        request(&mut dispatcher, start_request(), &mut replies);
        pump(&mut dispatcher, &mut events, &mut replies);

        let shapes: Vec<&str> = replies
            .iter()
            .map(|envelope| match &envelope.message {
                Message::Notification(Notification::MeetingStatusChanged { .. }) => "status",
                Message::Response(Response::StartMeeting { .. }) => "start",
                _ => "other",
            })
            .collect();
        assert_eq!(shapes, vec!["status", "status", "start"]);
    }

    #[tokio::test]
    async fn get_meeting_info_requires_login_and_a_meeting() {
        let (mut dispatcher, mut events) = dispatcher();

        let mut replies = Vec::new();
        request(&mut dispatcher, Request::GetMeetingInfo, &mut replies);
        match responses(&replies)[0] {
            Response::GetMeetingInfo { result, .. } => {
                assert_eq!(result.code, RpcCode::FAILED);
                assert!(result.message.is_empty());
            }
            other => panic!("unexpected response: {other:?}"),
        }

        login(&mut dispatcher, &mut events);
        replies.clear();
        request(&mut dispatcher, Request::GetMeetingInfo, &mut replies);
        match responses(&replies)[0] {
            Response::GetMeetingInfo { result, .. } => assert_eq!(result.code, RpcCode::FAILED),
            other => panic!("unexpected response: {other:?}"),
        }

        start_connected(&mut dispatcher, &mut events);
        replies.clear();
        request(&mut dispatcher, Request::GetMeetingInfo, &mut replies);
        match responses(&replies)[0] {
            Response::GetMeetingInfo { result, info } => {
                assert!(result.is_success());
                assert!(info.is_host);
                assert_eq!(info.members.len(), 1);
                assert!(info.duration_secs >= 0);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn subscribe_audio_rejections() {
        let (mut dispatcher, mut events) = dispatcher();

        let subscribe = |ids: &[&str]| Request::SubscribeAudioStreams {
            account_ids: ids.iter().map(|id| (*id).to_owned()).collect(),
            subscribe: true,
        };

        let mut replies = Vec::new();
        request(&mut dispatcher, subscribe(&["host-1"]), &mut replies);
        match responses(&replies)[0] {
            Response::SubscribeAudioStreams { result } => {
                assert_eq!(result.code, RpcCode(2200));
                assert_eq!(result.message, "The meeting is not in progress");
            }
            other => panic!("unexpected response: {other:?}"),
        }

        login(&mut dispatcher, &mut events);
        let mut scratch = Vec::new();
        request(&mut dispatcher, join_request(), &mut scratch);
        pump(&mut dispatcher, &mut events, &mut scratch);

        replies.clear();
        request(&mut dispatcher, subscribe(&[]), &mut replies);
        match responses(&replies)[0] {
            Response::SubscribeAudioStreams { result } => {
                assert_eq!(result.code, RpcCode(300));
                assert_eq!(result.message, "accountId list is null");
            }
            other => panic!("unexpected response: {other:?}"),
        }

        replies.clear();
        request(&mut dispatcher, subscribe(&["user-1"]), &mut replies);
        match responses(&replies)[0] {
            Response::SubscribeAudioStreams { result } => {
                assert_eq!(result.code, RpcCode(2101));
                assert_eq!(result.message, "You can't subscribe to your own audio");
            }
            other => panic!("unexpected response: {other:?}"),
        }

        replies.clear();
        request(&mut dispatcher, subscribe(&["nobody"]), &mut replies);
        match responses(&replies)[0] {
            Response::SubscribeAudioStreams { result } => {
                assert_eq!(result.code, RpcCode(2101));
                assert_eq!(result.message, "The member does not exist");
            }
            other => panic!("unexpected response: {other:?}"),
        }

        replies.clear();
        request(&mut dispatcher, subscribe(&["host-1"]), &mut replies);
        match responses(&replies)[0] {
            Response::SubscribeAudioStreams { result } => assert!(result.is_success()),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn ended_meeting_clears_the_stored_info() {
        let (mut dispatcher, mut events) = dispatcher();
        login(&mut dispatcher, &mut events);
        start_connected(&mut dispatcher, &mut events);
        assert!(!dispatcher.meeting.info().meeting_id.is_empty());

        let mut replies = Vec::new();
        request(&mut dispatcher, Request::leave_meeting(false), &mut replies);
        pump(&mut dispatcher, &mut events, &mut replies);

        assert_eq!(responses(&replies).len(), 1);
        assert_eq!(dispatcher.meeting_status(), MeetingStatus::Idle);
        assert!(dispatcher.meeting.info().meeting_id.is_empty());
    }
}
