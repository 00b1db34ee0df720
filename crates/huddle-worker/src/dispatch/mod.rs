//! Request dispatch for the worker process.
//!
//! One [`Dispatcher`] owns every piece of worker-side state: the auth,
//! meeting, settings and menu managers, the pending-slot table, the persisted
//! store, and the engine seams. The runtime loop feeds it inbound frame
//! payloads and engine events; the dispatcher appends outbound envelopes to a
//! reply buffer and never touches the socket itself.

mod auth;
mod meeting;
mod slots;
mod validate;

pub use slots::{PendingSlots, SlotKind};

use std::time::Duration;

use chrono::Utc;
use huddle_core::{AuthStatus, JoinMeetingParams, MeetingOptions, MeetingStatus};
use huddle_protocol::{
    Envelope, Message, Notification, Request, Response, RpcResult, decode_message,
};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::engine::{AuthEngine, EngineEvent, MeetingEngine};
use crate::managers::store::{LAST_EXCEPTION_AT_KEY, LAST_MEETING_STATUS_KEY};
use crate::managers::{AuthManager, ConfigStore, MeetingManager, MenuItemManager, SettingsManager};

/// What to do with inbound payloads that fail to decode.
///
/// Framing corruption below this layer already tears the connection down; a
/// payload that unframes but does not decode is a peer bug, and this policy
/// decides how patient the worker is with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeErrorPolicy {
    /// Log and drop the payload, keep the connection.
    #[default]
    Drop,
    /// Drop payloads, but ask for a close once this many have failed.
    CloseAfter(u32),
}

/// Verdict handed back to the runtime loop after each unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum DispatchControl {
    /// Keep serving.
    Continue,
    /// Tear the connection down.
    Close,
}

/// Routes inbound messages to their handlers and engine events to the slots
/// they resolve.
pub struct Dispatcher<E> {
    auth: AuthManager,
    meeting: MeetingManager,
    menus: MenuItemManager,
    settings: SettingsManager,
    store: ConfigStore,
    slots: PendingSlots,
    engine: E,
    decode_policy: DecodeErrorPolicy,
    decode_failures: u32,
    /// Join deferred behind an anonymous login; fires on `LoggedIn`.
    pending_anonymous_join: Option<(JoinMeetingParams, MeetingOptions)>,
}

impl<E> Dispatcher<E>
where
    E: MeetingEngine + AuthEngine,
{
    /// Creates a dispatcher over the given store and engine.
    pub fn new(store: ConfigStore, engine: E) -> Self {
        Self {
            auth: AuthManager::new(),
            meeting: MeetingManager::new(),
            menus: MenuItemManager::new(),
            settings: SettingsManager::new(),
            store,
            slots: PendingSlots::new(None),
            engine,
            decode_policy: DecodeErrorPolicy::default(),
            decode_failures: 0,
            pending_anonymous_join: None,
        }
    }

    /// Builder: bound the wait on every pending slot.
    #[must_use]
    pub fn with_slot_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.slots = PendingSlots::new(deadline);
        self
    }

    /// Builder: pick the reaction to undecodable payloads.
    #[must_use]
    pub fn with_decode_policy(mut self, policy: DecodeErrorPolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    /// The engine, for composition-root wiring and tests.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Meeting status as last reported by the engine.
    pub fn meeting_status(&self) -> MeetingStatus {
        self.meeting.status()
    }

    /// Auth status as last reported by the engine.
    pub fn auth_status(&self) -> AuthStatus {
        self.auth.status()
    }

    /// Handles one inbound data-frame payload.
    ///
    /// Outbound envelopes are appended to `replies` in send order:
    /// notifications describing a state change come before the responses that
    /// change resolves.
    pub fn handle_payload(
        &mut self,
        payload: &[u8],
        replies: &mut Vec<Envelope>,
    ) -> DispatchControl {
        let envelope: Envelope = match decode_message(payload) {
            Ok(envelope) => envelope,
            Err(error) => {
                self.decode_failures += 1;
                warn!(%error, failures = self.decode_failures, "dropping undecodable payload");
                if let DecodeErrorPolicy::CloseAfter(limit) = self.decode_policy
                    && self.decode_failures >= limit
                {
                    return DispatchControl::Close;
                }
                return DispatchControl::Continue;
            }
        };
        if !envelope.is_compatible() {
            warn!(
                version = %envelope.protocol_version,
                "dropping envelope with unsupported protocol version"
            );
            return DispatchControl::Continue;
        }

        match envelope.message {
            Message::Request(request) => self.handle_request(request, replies),
            Message::Notification(notification) => self.handle_notification(notification),
            Message::Response(response) => {
                warn!(kind = %response.kind(), "ignoring response addressed to the worker");
            }
        }
        DispatchControl::Continue
    }

    /// Applies one engine event: updates managers, resolves waiting slots,
    /// and forwards the matching notification.
    pub fn handle_engine_event(&mut self, event: EngineEvent, replies: &mut Vec<Envelope>) {
        match event {
            EngineEvent::MeetingStatus {
                status,
                code,
                message,
                info,
            } => self.handle_meeting_status(status, code, message, info, replies),
            EngineEvent::AuthStatus {
                status,
                code,
                message,
                account,
            } => self.handle_auth_status(status, code, message, account, replies),
            EngineEvent::MenuItemClicked { item } => {
                debug!(item_id = item.item_id, "forwarding menu click");
                replies.push(Envelope::notification(Notification::MenuItemClicked {
                    item,
                }));
            }
        }
    }

    /// Fails every slot that outlived the configured deadline.
    pub fn expire_slots(&mut self, now: Instant, replies: &mut Vec<Envelope>) {
        for kind in self.slots.take_expired(now) {
            warn!(slot = kind.name(), "pending operation timed out");
            if kind == SlotKind::JoinMeeting {
                self.pending_anonymous_join = None;
            }
            replies.push(Envelope::response(Response::from_result(
                kind.request_kind(),
                RpcResult::failed("operation timed out"),
            )));
        }
    }

    /// Stamps the store so the next run can tell this one ended abnormally.
    pub fn record_exception(&mut self, reason: &str) {
        warn!(reason, "recording abnormal close");
        self.store.set(LAST_EXCEPTION_AT_KEY, Utc::now().to_rfc3339());
        if let Err(error) = self.store.save() {
            warn!(%error, "failed to persist exception marker");
        }
    }

    /// Surfaces and clears the markers a previous run may have left behind.
    pub fn recover_previous_run(&mut self) {
        let raw_status = self.store.remove(LAST_MEETING_STATUS_KEY);
        let exception = self.store.remove(LAST_EXCEPTION_AT_KEY);
        if raw_status.is_none() && exception.is_none() {
            return;
        }

        if let Some(status) = raw_status
            .as_deref()
            .and_then(|raw| raw.parse::<i32>().ok())
            .and_then(MeetingStatus::from_wire)
            && !matches!(
                status,
                MeetingStatus::Idle | MeetingStatus::Ended | MeetingStatus::ConnectFailed
            )
        {
            warn!(status = ?status, "previous run ended while a meeting was active");
        }
        if let Some(at) = &exception {
            warn!(%at, "previous run closed abnormally");
        }
        if let Err(error) = self.store.save() {
            warn!(%error, "failed to clear previous-run markers");
        }
    }

    fn handle_request(&mut self, request: Request, replies: &mut Vec<Envelope>) {
        debug!(kind = %request.kind(), "dispatching request");
        match request {
            Request::StartMeeting { param, options } => self.handle_start(param, options, replies),
            Request::JoinMeeting { param, options } => self.handle_join(param, options, replies),
            Request::LeaveMeeting { finish } => self.handle_leave(finish, replies),
            Request::GetMeetingInfo => self.handle_get_meeting_info(replies),
            Request::GetPresetMenuItems { item_ids } => {
                self.handle_get_preset_menu_items(&item_ids, replies);
            }
            Request::SubscribeAudioStreams {
                account_ids,
                subscribe,
            } => self.handle_subscribe_audio(&account_ids, subscribe, replies),
            Request::Login { account_id, token } => self.handle_login(&account_id, &token, replies),
            Request::Logout { cleanup } => self.handle_logout(cleanup, replies),
            Request::GetAccountInfo => self.handle_get_account_info(replies),
        }
    }

    fn handle_notification(&mut self, notification: Notification) {
        match notification {
            Notification::MenuItemState {
                item_id,
                item_guid,
                checked_index,
            } => {
                if !self.menus.modify_item(item_id, &item_guid, checked_index) {
                    debug!(item_id, "checked-state update for an unknown menu item");
                }
            }
            other => {
                debug!(?other, "ignoring inbound notification");
            }
        }
    }

    /// Answers `kind` if its slot is still pending; the first resolution wins.
    fn resolve_slot(&mut self, kind: SlotKind, result: RpcResult, replies: &mut Vec<Envelope>) {
        if self.slots.resolve(kind) {
            replies.push(Envelope::response(Response::from_result(
                kind.request_kind(),
                result,
            )));
        }
    }

    fn persist_meeting_status(&mut self, status: MeetingStatus) {
        self.store
            .set(LAST_MEETING_STATUS_KEY, status.as_wire().to_string());
        if let Err(error) = self.store.save() {
            warn!(%error, "failed to persist meeting status");
        }
    }
}
