//! Per-request context every page template receives.

use storepulse_core::Identity;
use tower_sessions::Session;

use crate::middleware::auth::take_flash;
use crate::models::{Flash, SessionState, Theme};

/// Navigation entry in the page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
}

const ADMIN_NAV: &[NavItem] = &[NavItem {
    label: "Tenants",
    href: "/admin/tenants",
}];

const TENANT_NAV: &[NavItem] = &[NavItem {
    label: "Dashboard",
    href: "/dashboard",
}];

/// Theme, identity and the pending flash message, passed explicitly to
/// every page template.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub theme: Theme,
    pub identity: Option<Identity>,
    pub flash: Option<Flash>,
    /// Path of the page being rendered, for the theme toggle's return trip.
    pub path: String,
}

impl PageContext {
    #[must_use]
    pub fn new(theme: Theme, identity: Option<Identity>, path: impl Into<String>) -> Self {
        Self {
            theme,
            identity,
            flash: None,
            path: path.into(),
        }
    }

    /// Build the context from loaded session state, consuming the flash.
    pub async fn load(session: &Session, state: &SessionState, path: impl Into<String>) -> Self {
        Self {
            flash: take_flash(session).await,
            ..Self::new(state.theme, state.identity.clone(), path)
        }
    }

    #[must_use]
    pub fn with_flash(mut self, flash: Flash) -> Self {
        self.flash = Some(flash);
        self
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.email().as_str())
    }

    #[must_use]
    pub const fn panel_name(&self) -> &'static str {
        match &self.identity {
            Some(Identity::Admin(_)) => "Admin",
            Some(Identity::Tenant(_)) => "Tenant",
            None => "StorePulse",
        }
    }

    #[must_use]
    pub const fn nav(&self) -> &'static [NavItem] {
        match &self.identity {
            Some(Identity::Admin(_)) => ADMIN_NAV,
            Some(Identity::Tenant(_)) => TENANT_NAV,
            None => &[],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storepulse_core::{AdminId, AdminIdentity, Email};

    use super::*;

    #[test]
    fn test_nav_follows_identity() {
        let anonymous = PageContext::new(Theme::Dark, None, "/login");
        assert!(anonymous.nav().is_empty());
        assert_eq!(anonymous.email(), None);

        let admin = PageContext::new(
            Theme::Light,
            Some(Identity::Admin(AdminIdentity {
                id: AdminId::new("a-1"),
                email: Email::parse("root@platform.test").unwrap(),
            })),
            "/admin/tenants",
        );
        assert_eq!(admin.panel_name(), "Admin");
        assert_eq!(admin.nav().first().map(|n| n.href), Some("/admin/tenants"));
        assert_eq!(admin.email(), Some("root@platform.test"));
    }
}
