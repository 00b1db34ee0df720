//! Auth state owned by the dispatcher.

use huddle_core::{AccountInfo, AuthStatus};

/// Tracks the auth status machine and the logged-in account.
///
/// Status moves only from engine events routed through the dispatcher; the
/// manager itself never talks to the engine.
#[derive(Debug, Default)]
pub struct AuthManager {
    status: AuthStatus,
    account: Option<AccountInfo>,
}

impl AuthManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current auth status.
    pub fn status(&self) -> AuthStatus {
        self.status
    }

    pub fn set_status(&mut self, status: AuthStatus) {
        self.status = status;
    }

    /// True once a login has completed and not been undone.
    pub fn is_logged_in(&self) -> bool {
        self.status.is_logged_in()
    }

    /// The logged-in account, if any.
    pub fn account(&self) -> Option<&AccountInfo> {
        self.account.as_ref()
    }

    /// Stores the account delivered with a `LoggedIn` event.
    pub fn store_account(&mut self, account: AccountInfo) {
        self.account = Some(account);
    }

    /// Drops the account on logout, expiry or kick-out.
    pub fn clear_account(&mut self) {
        self.account = None;
    }

    /// Whether `account_id`/`token` match the logged-in account,
    /// case-insensitively.
    pub fn matches_credentials(&self, account_id: &str, token: &str) -> bool {
        self.account
            .as_ref()
            .is_some_and(|account| account.matches_credentials(account_id, token))
    }
}
