//! Types stored in the browser session.
//!
//! The session lives in server memory; the browser only carries its ID.

use serde::{Deserialize, Serialize};
use storepulse_core::Identity;

use crate::api::{Credentials, TenantCredential};

/// Backend credentials held on behalf of the browser.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldCredentials {
    /// Backend admin session cookie captured at admin login.
    admin_session: Option<String>,
    /// Tenant-user login used for Basic auth.
    tenant: Option<TenantCredential>,
}

impl HeldCredentials {
    pub fn set_admin_session(&mut self, cookie: String) {
        self.admin_session = Some(cookie);
    }

    pub fn set_tenant(&mut self, credential: TenantCredential) {
        self.tenant = Some(credential);
    }

    pub fn clear_tenant(&mut self) {
        self.tenant = None;
    }

    #[must_use]
    pub const fn has_admin_session(&self) -> bool {
        self.admin_session.is_some()
    }

    /// Credentials for admin endpoints.
    #[must_use]
    pub fn admin(&self) -> Credentials {
        self.admin_session
            .as_ref()
            .map_or(Credentials::Anonymous, |cookie| {
                Credentials::session(cookie.clone())
            })
    }

    /// Credentials for tenant endpoints: Basic when a tenant login is held,
    /// otherwise the admin session.
    #[must_use]
    pub fn tenant(&self) -> Credentials {
        self.tenant
            .as_ref()
            .map_or_else(|| self.admin(), TenantCredential::credentials)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.admin_session.is_none() && self.tenant.is_none()
    }
}

impl std::fmt::Debug for HeldCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeldCredentials")
            .field(
                "admin_session",
                &self.admin_session.as_ref().map(|_| "[REDACTED]"),
            )
            .field("tenant", &self.tenant)
            .finish()
    }
}

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Info,
    Error,
}

impl FlashKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// Everything the dashboard knows about a browser session, loaded once per
/// request.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub credentials: HeldCredentials,
    pub theme: Theme,
    /// The first identity probe of this session found nobody.
    pub first_time: bool,
    /// Whether the identity has been probed at least once.
    pub probed: bool,
}

/// Session keys for dashboard state.
pub mod keys {
    /// Current [`storepulse_core::Identity`].
    pub const IDENTITY: &str = "identity";

    /// Held backend credentials.
    pub const CREDENTIALS: &str = "credentials";

    /// Tenant connect/login flow.
    pub const CONNECT_FLOW: &str = "connect_flow";

    /// Light/dark preference.
    pub const THEME: &str = "theme";

    /// One-shot flash message.
    pub const FLASH: &str = "flash";

    /// Set once the identity was probed; holds the `first_time` flag.
    pub const FIRST_TIME: &str = "first_time";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_login_wins_for_tenant_calls() {
        let mut held = HeldCredentials::default();
        assert!(held.is_empty());
        assert!(held.tenant().is_anonymous());

        held.set_admin_session("sid=1".to_owned());
        assert!(matches!(held.tenant(), Credentials::Session(_)));

        held.set_tenant(TenantCredential::new("owner@acme.test", "hunter2"));
        assert!(matches!(held.tenant(), Credentials::Basic { .. }));
        assert!(matches!(held.admin(), Credentials::Session(_)));
    }

    #[test]
    fn test_debug_hides_admin_cookie() {
        let mut held = HeldCredentials::default();
        held.set_admin_session("sid=topsecret".to_owned());
        assert!(!format!("{held:?}").contains("topsecret"));
    }

    #[test]
    fn test_theme_toggle_and_parse() {
        assert_eq!(Theme::default().toggled(), Theme::Dark);
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse("sepia"), None);
    }
}
