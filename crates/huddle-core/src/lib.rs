//! Core types shared by the hosting (launcher) and worker (meeting UI)
//! processes: status machines, result codes, meeting/menu/account models,
//! and the tracing bootstrap.

pub mod auth;
pub mod codes;
pub mod meeting;
pub mod menu;
pub mod status;
pub mod tracing;

pub use auth::AccountInfo;
pub use codes::RpcCode;
pub use meeting::{
    ChatroomConfig, JoinMeetingParams, MeetingInfo, MeetingMember, MeetingOptions, RoleConfig,
    RoleUser, RoomControl, StartMeetingParams,
};
pub use menu::{
    CAMERA_MENU_ID, CHAT_MENU_ID, FIRST_INJECTED_MENU_ID, INVITE_MENU_ID,
    MANAGE_PARTICIPANTS_MENU_ID, MENU_TITLE_LIMIT, MIC_MENU_ID, MORE_MENU_EXCLUDED_IDS,
    MenuItem, MenuVisibility, PARTICIPANTS_MENU_ID, SCREEN_SHARE_MENU_ID, VIEW_MENU_ID,
    WHITEBOARD_MENU_ID, default_more_items, default_toolbar_items,
};
pub use status::{AuthStatus, MeetingStatus};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
