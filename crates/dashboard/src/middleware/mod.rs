//! HTTP middleware stack for the dashboard.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `CatchPanicLayer` (render the error page instead of dropping the connection)
//! 3. `TraceLayer` (request span with status and latency)
//! 4. Request ID (record in span, Sentry tag, response header)
//! 5. Session layer (tower-sessions, in-memory store)
//!
//! Route guards are extractors in [`auth`].

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{AuthRejection, CurrentSession, RequireAdmin, RequireTenant};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
