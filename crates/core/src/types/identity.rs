//! Session identities.
//!
//! A browser session is signed in as at most one principal: a platform
//! admin or a tenant user. The backend's two "who am I" endpoints are merged
//! into [`Identity`]; there is no shared struct with optional fields.

use serde::{Deserialize, Serialize};

use super::{AdminId, Email, ShopDomain, TenantId, UserId};

/// A platform administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub id: AdminId,
    pub email: Email,
}

/// A user belonging to one tenant shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantIdentity {
    pub id: UserId,
    pub email: Email,
    pub tenant_id: TenantId,
    pub shop_domain: ShopDomain,
    /// Whether the backend holds a Shopify access token for the tenant.
    pub has_access_token: bool,
}

/// Who the current session is signed in as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    Admin(AdminIdentity),
    Tenant(TenantIdentity),
}

impl Identity {
    /// Email of the signed-in principal.
    #[must_use]
    pub const fn email(&self) -> &Email {
        match self {
            Self::Admin(admin) => &admin.email,
            Self::Tenant(user) => &user.email,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }

    /// Tenant the session is scoped to, for tenant users.
    #[must_use]
    pub const fn tenant_id(&self) -> Option<&TenantId> {
        match self {
            Self::Admin(_) => None,
            Self::Tenant(user) => Some(&user.tenant_id),
        }
    }

    /// Whether this identity may read data belonging to `tenant`.
    ///
    /// Admins may read every tenant; tenant users only their own.
    #[must_use]
    pub fn can_view_tenant(&self, tenant: &TenantId) -> bool {
        match self {
            Self::Admin(_) => true,
            Self::Tenant(user) => &user.tenant_id == tenant,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tenant_user(tenant: &str) -> Identity {
        Identity::Tenant(TenantIdentity {
            id: UserId::new("u-1"),
            email: Email::parse("owner@acme.test").unwrap(),
            tenant_id: TenantId::new(tenant),
            shop_domain: ShopDomain::normalize("acme").unwrap(),
            has_access_token: true,
        })
    }

    #[test]
    fn test_tenant_user_scoped_to_own_tenant() {
        let user = tenant_user("t-1");
        assert!(user.can_view_tenant(&TenantId::new("t-1")));
        assert!(!user.can_view_tenant(&TenantId::new("t-2")));
        assert_eq!(user.tenant_id(), Some(&TenantId::new("t-1")));
    }

    #[test]
    fn test_admin_sees_every_tenant() {
        let admin = Identity::Admin(AdminIdentity {
            id: AdminId::new("a-1"),
            email: Email::parse("root@platform.test").unwrap(),
        });
        assert!(admin.is_admin());
        assert!(admin.can_view_tenant(&TenantId::new("anything")));
        assert_eq!(admin.tenant_id(), None);
    }

    #[test]
    fn test_identity_serializes_with_kind_tag() {
        let json = serde_json::to_value(tenant_user("t-9")).unwrap();
        assert_eq!(json["kind"], "tenant");
        assert_eq!(json["tenant_id"], "t-9");
    }
}
