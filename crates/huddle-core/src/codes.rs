//! Result codes carried on every RPC response.

use serde::{Deserialize, Serialize};

/// Numeric result code attached to every response envelope.
///
/// Codes travel as raw integers so that engine codes outside the well-known
/// set pass through the IPC boundary unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RpcCode(pub i32);

impl RpcCode {
    /// Operation completed.
    pub const SUCCESS: Self = Self(0);
    /// Generic failure.
    pub const FAILED: Self = Self(-1);
    /// Request rejected during parameter validation.
    pub const PARAM_ERROR: Self = Self(-2);
    /// Start/join refused because a meeting is already running (soft conflict).
    pub const ALREADY_IN_MEETING: Self = Self(-3);

    /// Engine extended code that also means success.
    const EXT_OK: i32 = 200;
    /// Engine extended code for "a meeting is already running".
    const EXT_ALREADY_IN_MEETING: i32 = 3100;

    /// Translates an engine extended code into a public code.
    ///
    /// `0` and `200` mean success, `3100` means a meeting is already running;
    /// every other value passes through untouched.
    #[must_use]
    pub fn from_extended(code: i32) -> Self {
        match code {
            0 | Self::EXT_OK => Self::SUCCESS,
            Self::EXT_ALREADY_IN_MEETING => Self::ALREADY_IN_MEETING,
            other => Self(other),
        }
    }

    /// Returns true for [`RpcCode::SUCCESS`].
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl std::fmt::Display for RpcCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extended_code_translation() {
        assert_eq!(RpcCode::from_extended(0), RpcCode::SUCCESS);
        assert_eq!(RpcCode::from_extended(200), RpcCode::SUCCESS);
        assert_eq!(RpcCode::from_extended(3100), RpcCode::ALREADY_IN_MEETING);
    }

    #[test]
    fn unmapped_codes_pass_through() {
        assert_eq!(RpcCode::from_extended(3104), RpcCode(3104));
        assert_eq!(RpcCode::from_extended(-7), RpcCode(-7));
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&RpcCode::ALREADY_IN_MEETING).unwrap();
        assert_eq!(json, "-3");

        let parsed: RpcCode = serde_json::from_str("3100").unwrap();
        assert_eq!(parsed, RpcCode(3100));
    }

    #[test]
    fn success_predicate() {
        assert!(RpcCode::SUCCESS.is_success());
        assert!(!RpcCode::FAILED.is_success());
        assert!(!RpcCode(42).is_success());
    }
}
