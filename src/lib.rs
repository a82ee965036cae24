// Modules the integration tests drive headlessly. The App, its screens
// and key handling are bin-only and live in main.rs.
pub mod app_dirs;
pub mod engine;
pub mod history;
pub mod preset;
pub mod runtime;
pub mod share;
pub mod store;
pub mod theme;
pub mod time;
pub mod timing_mode;
