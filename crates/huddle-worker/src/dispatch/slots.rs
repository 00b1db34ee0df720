//! Pending callback slots: at most one in-flight operation per kind.

use std::time::Duration;

use huddle_protocol::RequestKind;
use tokio::time::Instant;

/// The operation kinds that complete asynchronously and therefore own a
/// slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    StartMeeting,
    JoinMeeting,
    LeaveMeeting,
    Login,
    Logout,
}

impl SlotKind {
    /// The request kind the slot's deferred response answers.
    pub fn request_kind(self) -> RequestKind {
        match self {
            Self::StartMeeting => RequestKind::StartMeeting,
            Self::JoinMeeting => RequestKind::JoinMeeting,
            Self::LeaveMeeting => RequestKind::LeaveMeeting,
            Self::Login => RequestKind::Login,
            Self::Logout => RequestKind::Logout,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::StartMeeting => "start_meeting",
            Self::JoinMeeting => "join_meeting",
            Self::LeaveMeeting => "leave_meeting",
            Self::Login => "login",
            Self::Logout => "logout",
        }
    }
}

/// One occupancy flag per slotted operation, with an optional deadline.
///
/// A slot records when it was occupied; with a deadline configured,
/// [`PendingSlots::take_expired`] clears and reports slots that outlived it
/// so the dispatcher can fail them instead of leaving the caller hanging.
#[derive(Debug)]
pub struct PendingSlots {
    deadline: Option<Duration>,
    start: Option<Instant>,
    join: Option<Instant>,
    leave: Option<Instant>,
    login: Option<Instant>,
    logout: Option<Instant>,
}

impl PendingSlots {
    pub fn new(deadline: Option<Duration>) -> Self {
        Self {
            deadline,
            start: None,
            join: None,
            leave: None,
            login: None,
            logout: None,
        }
    }

    fn slot_mut(&mut self, kind: SlotKind) -> &mut Option<Instant> {
        match kind {
            SlotKind::StartMeeting => &mut self.start,
            SlotKind::JoinMeeting => &mut self.join,
            SlotKind::LeaveMeeting => &mut self.leave,
            SlotKind::Login => &mut self.login,
            SlotKind::Logout => &mut self.logout,
        }
    }

    fn slot(&self, kind: SlotKind) -> Option<Instant> {
        match kind {
            SlotKind::StartMeeting => self.start,
            SlotKind::JoinMeeting => self.join,
            SlotKind::LeaveMeeting => self.leave,
            SlotKind::Login => self.login,
            SlotKind::Logout => self.logout,
        }
    }

    /// Whether an operation of this kind is in flight.
    pub fn is_occupied(&self, kind: SlotKind) -> bool {
        self.slot(kind).is_some()
    }

    /// Occupies the slot; false when already occupied.
    pub fn try_occupy(&mut self, kind: SlotKind, now: Instant) -> bool {
        let slot = self.slot_mut(kind);
        if slot.is_some() {
            return false;
        }
        *slot = Some(now);
        true
    }

    /// Clears the slot; true when it was occupied.
    ///
    /// The caller sends the deferred response only on true, which is what
    /// makes resolution exactly-once.
    pub fn resolve(&mut self, kind: SlotKind) -> bool {
        self.slot_mut(kind).take().is_some()
    }

    /// Clears and returns the kinds whose slots outlived the deadline.
    pub fn take_expired(&mut self, now: Instant) -> Vec<SlotKind> {
        let Some(deadline) = self.deadline else {
            return Vec::new();
        };
        let mut expired = Vec::new();
        for kind in [
            SlotKind::StartMeeting,
            SlotKind::JoinMeeting,
            SlotKind::LeaveMeeting,
            SlotKind::Login,
            SlotKind::Logout,
        ] {
            if let Some(occupied_at) = self.slot(kind)
                && now.duration_since(occupied_at) >= deadline
            {
                *self.slot_mut(kind) = None;
                expired.push(kind);
            }
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupy_resolve_cycle() {
        let mut slots = PendingSlots::new(None);
        let now = Instant::now();

        assert!(slots.try_occupy(SlotKind::StartMeeting, now));
        assert!(slots.is_occupied(SlotKind::StartMeeting));
        assert!(!slots.try_occupy(SlotKind::StartMeeting, now));

        // Other kinds are independent.
        assert!(slots.try_occupy(SlotKind::Login, now));

        assert!(slots.resolve(SlotKind::StartMeeting));
        assert!(!slots.resolve(SlotKind::StartMeeting), "resolve is one-shot");
        assert!(slots.try_occupy(SlotKind::StartMeeting, now));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_clears_only_overdue_slots() {
        let mut slots = PendingSlots::new(Some(Duration::from_secs(10)));

        slots.try_occupy(SlotKind::StartMeeting, Instant::now());
        tokio::time::advance(Duration::from_secs(6)).await;
        slots.try_occupy(SlotKind::Logout, Instant::now());

        tokio::time::advance(Duration::from_secs(4)).await;
        let expired = slots.take_expired(Instant::now());
        assert_eq!(expired, vec![SlotKind::StartMeeting]);
        assert!(!slots.is_occupied(SlotKind::StartMeeting));
        assert!(slots.is_occupied(SlotKind::Logout));

        tokio::time::advance(Duration::from_secs(6)).await;
        let expired = slots.take_expired(Instant::now());
        assert_eq!(expired, vec![SlotKind::Logout]);
    }

    #[tokio::test(start_paused = true)]
    async fn no_deadline_means_slots_never_expire() {
        let mut slots = PendingSlots::new(None);
        slots.try_occupy(SlotKind::JoinMeeting, Instant::now());

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(slots.take_expired(Instant::now()).is_empty());
        assert!(slots.is_occupied(SlotKind::JoinMeeting));
    }
}
