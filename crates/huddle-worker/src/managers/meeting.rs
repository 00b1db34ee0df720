//! Meeting state owned by the dispatcher.

use chrono::{DateTime, Utc};
use huddle_core::{MeetingInfo, MeetingOptions, MeetingStatus};

/// Join timeout applied when the hosting side passes none (milliseconds).
pub const DEFAULT_JOIN_TIMEOUT_MS: i32 = 45_000;

/// Tracks the meeting status machine, the active meeting's info snapshot and
/// the UI option flags pushed on start/join.
#[derive(Debug, Default)]
pub struct MeetingManager {
    status: MeetingStatus,
    info: MeetingInfo,
    options: MeetingOptions,
    join_timeout_ms: i32,
    connected_at: Option<DateTime<Utc>>,
}

impl MeetingManager {
    pub fn new() -> Self {
        Self {
            join_timeout_ms: DEFAULT_JOIN_TIMEOUT_MS,
            ..Self::default()
        }
    }

    /// The current meeting status.
    pub fn status(&self) -> MeetingStatus {
        self.status
    }

    pub fn set_status(&mut self, status: MeetingStatus) {
        self.status = status;
    }

    /// True in the states where leave/get-info/audio operations are legal.
    pub fn is_in_meeting(&self) -> bool {
        self.status.is_in_meeting()
    }

    /// The stored meeting info, as delivered by the engine.
    pub fn info(&self) -> &MeetingInfo {
        &self.info
    }

    /// The UI option flags of the active (or starting) meeting.
    pub fn options(&self) -> &MeetingOptions {
        &self.options
    }

    /// The normalized join timeout in milliseconds.
    pub fn join_timeout_ms(&self) -> i32 {
        self.join_timeout_ms
    }

    /// Stores the option flags for a starting meeting, normalizing the join
    /// timeout.
    pub fn apply_options(&mut self, options: &MeetingOptions) {
        self.join_timeout_ms = if options.join_timeout_ms <= 0 {
            DEFAULT_JOIN_TIMEOUT_MS
        } else {
            options.join_timeout_ms
        };
        self.options = options.clone();
    }

    /// Records the engine's meeting info once the meeting connects.
    pub fn mark_connected(&mut self, info: MeetingInfo, now: DateTime<Utc>) {
        self.info = info;
        self.connected_at = Some(now);
    }

    /// Drops the meeting info when the meeting ends or fails to connect.
    pub fn reset(&mut self) {
        self.info = MeetingInfo::default();
        self.connected_at = None;
    }

    /// Whether `account_id` hosts the stored meeting.
    pub fn is_host(&self, account_id: &str) -> bool {
        !self.info.host_user_id.is_empty()
            && self.info.host_user_id.eq_ignore_ascii_case(account_id)
    }

    /// Info snapshot for `get_meeting_info`: host flag recomputed against the
    /// caller's account, elapsed duration recomputed against `now`.
    pub fn snapshot(&self, account_id: &str, now: DateTime<Utc>) -> MeetingInfo {
        let mut info = self.info.clone();
        if !info.host_user_id.is_empty() {
            info.is_host = self.is_host(account_id);
        }
        if let Some(connected_at) = self.connected_at {
            info.duration_secs = (now - connected_at).num_seconds().max(0);
        }
        info
    }
}
