//! Business managers owned by the dispatcher.
//!
//! Each manager is plain owned state with synchronous accessors; all
//! mutation happens from the dispatcher's single execution context, so none
//! of them lock.

pub mod auth;
pub mod meeting;
pub mod menu;
pub mod settings;
pub mod store;

pub use auth::AuthManager;
pub use meeting::{DEFAULT_JOIN_TIMEOUT_MS, MeetingManager};
pub use menu::MenuItemManager;
pub use settings::SettingsManager;
pub use store::ConfigStore;
