//! Session-held state for the dashboard.

pub mod session;

pub use session::{Flash, FlashKind, HeldCredentials, SessionState, Theme, keys as session_keys};
