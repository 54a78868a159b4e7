//! Onboarding forms: configurable multi-page signup with an admin layout editor.

pub mod client;
pub mod config;
pub mod error;
pub mod forms;
pub mod onboarding;
pub mod server;
pub mod store;
pub mod users;
