pub mod app_settings;
pub mod app_state;
pub mod debounce;
pub mod live;
pub mod messages;
pub mod network;
pub mod session;
pub mod sync;
