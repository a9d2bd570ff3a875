//! Per-request credentials for backend calls.
//!
//! Nothing is stored on the client: every call states how it authenticates.
//! Tenant flows send Basic auth; admin flows forward the backend's session
//! cookie that was captured at login.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// How a single backend request authenticates.
#[derive(Clone, Default)]
pub enum Credentials {
    /// No credentials (public endpoints such as tenant lookup).
    #[default]
    Anonymous,
    /// HTTP Basic auth, used by tenant users.
    Basic {
        username: String,
        password: SecretString,
    },
    /// Backend session cookie (`name=value` pairs), used by admins.
    Session(SecretString),
}

impl Credentials {
    /// Basic credentials from a username and password.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Session-cookie credentials.
    #[must_use]
    pub fn session(cookie: impl Into<String>) -> Self {
        Self::Session(SecretString::from(cookie.into()))
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Attach these credentials to an outgoing request.
    pub(crate) fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Anonymous => request,
            Self::Basic { username, password } => {
                request.basic_auth(username, Some(password.expose_secret()))
            }
            Self::Session(cookie) => request.header(reqwest::header::COOKIE, cookie.expose_secret()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::Session(_) => f.debug_tuple("Session").field(&"[REDACTED]").finish(),
        }
    }
}

/// Tenant-user login held for the lifetime of a browser session.
///
/// Lives only in the server-side session store; the browser cookie carries
/// the session ID, never the password. `Debug` redacts the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantCredential {
    pub email: String,
    password: String,
}

impl TenantCredential {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Per-request Basic credentials for this login.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::basic(self.email.clone(), self.password.clone())
    }
}

impl std::fmt::Debug for TenantCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantCredential")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let basic = Credentials::basic("owner@acme.test", "hunter2");
        let rendered = format!("{basic:?}");
        assert!(rendered.contains("owner@acme.test"));
        assert!(!rendered.contains("hunter2"));

        let session = Credentials::session("sid=abc123");
        assert!(!format!("{session:?}").contains("abc123"));

        let held = TenantCredential::new("owner@acme.test", "hunter2");
        assert!(!format!("{held:?}").contains("hunter2"));
    }

    #[test]
    fn test_default_is_anonymous() {
        assert!(Credentials::default().is_anonymous());
        assert!(!TenantCredential::new("a@b.c", "x").credentials().is_anonymous());
    }
}
