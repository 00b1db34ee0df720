//! Account identity as seen by the dispatcher and the hosting facade.

use serde::{Deserialize, Serialize};

/// The logged-in account, answered to `get_account_info` and consulted by
/// permission checks (finish-meeting, personal meeting id).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Stable account id.
    #[serde(default)]
    pub account_id: String,

    /// Session token. Never logged.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account_token: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nickname: String,

    /// The account's personal meeting id; the only id it may start under.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub personal_room_id: String,

    /// True for throw-away anonymous sessions.
    #[serde(default)]
    pub anonymous: bool,
}

impl AccountInfo {
    /// Case-insensitive credential comparison used by repeated-login checks.
    #[must_use]
    pub fn matches_credentials(&self, account_id: &str, token: &str) -> bool {
        self.account_id.eq_ignore_ascii_case(account_id)
            && self.account_token.eq_ignore_ascii_case(token)
    }
}
