//! Auth-side request handlers and the auth status machine.

use huddle_core::{AccountInfo, AuthStatus, RpcCode};
use huddle_protocol::{AuthEventKind, Envelope, Notification, Response, RpcResult};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{Dispatcher, SlotKind};
use crate::engine::{AuthEngine, MeetingEngine};

impl<E> Dispatcher<E>
where
    E: MeetingEngine + AuthEngine,
{
    pub(super) fn handle_login(
        &mut self,
        account_id: &str,
        token: &str,
        replies: &mut Vec<Envelope>,
    ) {
        if self.auth.status() != AuthStatus::Idle {
            // Re-login with the active credentials is a no-op; anything else
            // needs a logout first.
            let result = if self.auth.matches_credentials(account_id, token) {
                RpcResult::success()
            } else {
                RpcResult::failed("Failed to login to the conference server")
            };
            replies.push(Envelope::response(Response::Login { result }));
            return;
        }
        if self.slots.is_occupied(SlotKind::Login) {
            replies.push(Envelope::response(Response::Login {
                result: RpcResult::failed("Frequent operation, please try again later"),
            }));
            return;
        }

        // Free per the slot check above; handlers run to completion.
        self.slots.try_occupy(SlotKind::Login, Instant::now());
        if let Err(error) = self.engine.login(account_id, token) {
            self.resolve_slot(
                SlotKind::Login,
                RpcResult::failed(error.to_string()),
                replies,
            );
        }
    }

    pub(super) fn handle_logout(&mut self, cleanup: bool, replies: &mut Vec<Envelope>) {
        if self.auth.status() == AuthStatus::Idle {
            // Nothing to end.
            replies.push(Envelope::response(Response::Logout {
                result: RpcResult::success(),
            }));
            return;
        }
        if self.slots.is_occupied(SlotKind::Logout) {
            replies.push(Envelope::response(Response::Logout {
                result: RpcResult::failed("Frequent operation, please try again later"),
            }));
            return;
        }

        if cleanup {
            self.store.clear_cached_login();
            if let Err(error) = self.store.save() {
                warn!(%error, "failed to drop cached credentials");
            }
        }

        // Free per the slot check above; handlers run to completion.
        self.slots.try_occupy(SlotKind::Logout, Instant::now());
        if let Err(error) = self.engine.logout() {
            self.resolve_slot(
                SlotKind::Logout,
                RpcResult::failed(error.to_string()),
                replies,
            );
        }
    }

    pub(super) fn handle_get_account_info(&mut self, replies: &mut Vec<Envelope>) {
        let response = match self.auth.account() {
            Some(account) if self.auth.is_logged_in() => Response::GetAccountInfo {
                result: RpcResult::success(),
                account: account.clone(),
            },
            _ => Response::GetAccountInfo {
                result: RpcResult::failed("Not logged in"),
                account: AccountInfo::default(),
            },
        };
        replies.push(Envelope::response(response));
    }

    /// Applies one engine auth-status event.
    ///
    /// Login and logout slots resolve here; `Expired` and `KickedOut` carry
    /// no pending request and go out as notifications instead.
    pub(super) fn handle_auth_status(
        &mut self,
        status: AuthStatus,
        code: i32,
        message: String,
        account: Option<AccountInfo>,
        replies: &mut Vec<Envelope>,
    ) {
        debug!(status = ?status, code, "auth status changed");
        match status {
            AuthStatus::Idle | AuthStatus::Processing => {
                self.auth.set_status(status);
            }
            AuthStatus::LoggedIn => {
                self.auth.set_status(AuthStatus::LoggedIn);
                if let Some(account) = account {
                    if !account.anonymous {
                        self.store
                            .set_cached_login(&account.account_id, &account.account_token);
                        if let Err(error) = self.store.save() {
                            warn!(%error, "failed to cache credentials");
                        }
                    }
                    self.auth.store_account(account);
                }
                self.resolve_slot(
                    SlotKind::Login,
                    RpcResult::new(RpcCode::from_extended(code), message),
                    replies,
                );
                self.fire_pending_join(replies);
            }
            AuthStatus::LoginFailed => {
                self.auth.clear_account();
                self.auth.set_status(AuthStatus::Idle);
                let result = RpcResult::new(RpcCode::from_extended(code), message);
                self.resolve_slot(SlotKind::Login, result.clone(), replies);
                if self.pending_anonymous_join.take().is_some() {
                    // The deferred join cannot proceed without its session.
                    self.resolve_slot(SlotKind::JoinMeeting, result, replies);
                }
            }
            AuthStatus::LoggedOut => {
                self.auth.clear_account();
                self.auth.set_status(AuthStatus::Idle);
                self.resolve_slot(
                    SlotKind::Logout,
                    RpcResult::new(RpcCode::from_extended(code), message),
                    replies,
                );
            }
            AuthStatus::LogoutFailed => {
                // The session survives a failed logout.
                self.auth.set_status(AuthStatus::LoggedIn);
                self.resolve_slot(
                    SlotKind::Logout,
                    RpcResult::new(RpcCode::from_extended(code), message),
                    replies,
                );
            }
            AuthStatus::Expired => {
                self.auth.clear_account();
                self.auth.set_status(AuthStatus::Idle);
                self.store.clear_cached_login();
                if let Err(error) = self.store.save() {
                    warn!(%error, "failed to drop cached credentials");
                }
                replies.push(Envelope::notification(Notification::AuthEvent {
                    event: AuthEventKind::Expired,
                }));
            }
            AuthStatus::KickedOut => {
                self.auth.clear_account();
                self.auth.set_status(AuthStatus::Idle);
                replies.push(Envelope::notification(Notification::AuthEvent {
                    event: AuthEventKind::KickedOut,
                }));
            }
        }
    }

    /// Continues a join that was parked behind an anonymous login.
    fn fire_pending_join(&mut self, replies: &mut Vec<Envelope>) {
        let Some((param, options)) = self.pending_anonymous_join.take() else {
            return;
        };
        debug!("resuming join after anonymous login");
        self.seed_meeting_state(&options);
        if let Err(error) = self.engine.join_room(&param, &options) {
            self.resolve_slot(
                SlotKind::JoinMeeting,
                RpcResult::failed(error.to_string()),
                replies,
            );
        }
    }
}
