//! Session identity: who the browser is signed in as.
//!
//! The backend decides. The dashboard probes `GET /admin/me`, then
//! `GET /tenant/me`, and remembers the answer in the session until the next
//! login, logout, or recheck.

use storepulse_core::{AdminIdentity, Email, Identity, TenantIdentity};
use tower_sessions::Session;
use tracing::{debug, info, instrument, warn};

use crate::api::types::{AdminMe, TenantMe};
use crate::api::{ApiClient, ApiError, Credentials};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::auth::{load_state, store_credentials, store_identity};
use crate::models::{HeldCredentials, session_keys};

/// Probe the backend for the identity behind `held`.
///
/// Admin first, then tenant. A failing probe means "not that identity".
#[instrument(skip_all)]
pub async fn detect(api: &ApiClient, held: &HeldCredentials) -> Option<Identity> {
    if held.has_admin_session() {
        match api.admin_me(&held.admin()).await {
            Ok(me) => {
                if let Some(admin) = admin_identity(&me) {
                    return Some(Identity::Admin(admin));
                }
            }
            Err(e) => debug!(error = %e, "Admin probe failed"),
        }
    }

    let tenant_credentials = held.tenant();
    if tenant_credentials.is_anonymous() {
        return None;
    }
    match api.tenant_me(&tenant_credentials).await {
        Ok(me) => tenant_identity(me).map(Identity::Tenant),
        Err(e) => {
            debug!(error = %e, "Tenant probe failed");
            None
        }
    }
}

fn admin_identity(me: &AdminMe) -> Option<AdminIdentity> {
    let user = me.user.as_ref()?;
    match Email::parse(&user.email) {
        Ok(email) => Some(AdminIdentity {
            id: user.id.clone().into(),
            email,
        }),
        Err(e) => {
            warn!(error = %e, "Backend returned an admin with an unusable email");
            None
        }
    }
}

fn tenant_identity(me: TenantMe) -> Option<TenantIdentity> {
    let email = match Email::parse(&me.user.email) {
        Ok(email) => email,
        Err(e) => {
            warn!(error = %e, "Backend returned a tenant user with an unusable email");
            return None;
        }
    };
    Some(TenantIdentity {
        id: me.user_id(),
        email,
        tenant_id: me.tenant.id,
        shop_domain: me.tenant.shop_domain,
        has_access_token: me.tenant.has_access_token,
    })
}

/// Re-probe the identity for this session and store the result.
///
/// The first probe of a session that finds nobody marks the session as
/// `first_time`, which the landing page uses to suggest bootstrapping.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn refresh(
    api: &ApiClient,
    session: &Session,
) -> Result<Option<Identity>, tower_sessions::session::Error> {
    let state = load_state(session).await?;
    let identity = detect(api, &state.credentials).await;

    store_identity(session, identity.as_ref()).await?;
    if !state.probed || identity.is_some() {
        let first_time = !state.probed && identity.is_none();
        session.insert(session_keys::FIRST_TIME, first_time).await?;
    }

    match &identity {
        Some(identity) => set_sentry_user(identity.email(), Some(identity.email().as_str())),
        None => clear_sentry_user(),
    }
    Ok(identity)
}

/// Probe once per session; later calls reuse the stored answer.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn ensure_probed(
    api: &ApiClient,
    session: &Session,
) -> Result<Option<Identity>, tower_sessions::session::Error> {
    let state = load_state(session).await?;
    if state.probed {
        return Ok(state.identity);
    }
    refresh(api, session).await
}

/// Errors from admin sign-in.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] tower_sessions::session::Error),
    /// The backend accepted the login but does not recognise the session.
    #[error("Signed in, but the session could not be confirmed. Please try again.")]
    NotConfirmed,
}

impl LoginError {
    /// Message to show on the login form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) if e.is_unauthorized() && matches!(e, ApiError::Http { body: None, .. }) => {
                "Invalid email or password.".to_owned()
            }
            Self::Api(e) => e.user_message(),
            Self::Session(_) => "Something went wrong. Please try again.".to_owned(),
            Self::NotConfirmed => self.to_string(),
        }
    }
}

/// Sign in as a platform admin and hold the backend session.
///
/// Any tenant login held by this browser is dropped.
///
/// # Errors
///
/// Returns an error if the backend rejects the login or the session store
/// fails.
#[instrument(skip(api, session, password))]
pub async fn login_admin(
    api: &ApiClient,
    session: &Session,
    email: &str,
    password: &str,
) -> Result<Identity, LoginError> {
    let cookie = api.admin_login(email.trim(), password).await?;
    let Credentials::Session(secret) = cookie else {
        return Err(LoginError::NotConfirmed);
    };

    let mut held = HeldCredentials::default();
    held.set_admin_session(secrecy::ExposeSecret::expose_secret(&secret).to_owned());
    store_credentials(session, &held).await?;
    session.cycle_id().await?;

    match refresh(api, session).await? {
        Some(identity) if identity.is_admin() => {
            info!(email = %identity.email(), "Admin signed in");
            Ok(identity)
        }
        _ => Err(LoginError::NotConfirmed),
    }
}

/// Create the first admin account, then sign in with it.
///
/// # Errors
///
/// Returns an error if bootstrapping or the follow-up login fails.
#[instrument(skip(api, session, password))]
pub async fn bootstrap_admin(
    api: &ApiClient,
    session: &Session,
    email: &str,
    password: &str,
) -> Result<Identity, LoginError> {
    api.admin_bootstrap(email.trim(), password).await?;
    info!("First admin account created");
    login_admin(api, session, email, password).await
}

/// Drop the tenant login held by this browser after a rejected sign-in.
///
/// A signed-in tenant identity goes with it; an admin session is kept.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip_all)]
pub async fn forget_tenant_login(session: &Session) -> Result<(), tower_sessions::session::Error> {
    let mut state = load_state(session).await?;
    state.credentials.clear_tenant();
    store_credentials(session, &state.credentials).await?;

    if matches!(state.identity, Some(Identity::Tenant(_))) {
        store_identity(session, None).await?;
        clear_sentry_user();
        info!("Tenant login dropped after a failed sign-in");
    }
    Ok(())
}

/// Drop every credential and the identity held by this browser.
///
/// The backend admin session is ended on a best-effort basis; failures are
/// ignored. Tenant-scoped cache entries are left alone.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip_all)]
pub async fn logout(api: &ApiClient, session: &Session) -> Result<(), tower_sessions::session::Error> {
    let state = load_state(session).await?;
    if state.credentials.has_admin_session()
        && let Err(e) = api.admin_logout(&state.credentials.admin()).await
    {
        debug!(error = %e, "Backend logout failed, ignoring");
    }

    session.remove::<HeldCredentials>(session_keys::CREDENTIALS).await?;
    session.remove::<crate::connect::ConnectFlow>(session_keys::CONNECT_FLOW).await?;
    store_identity(session, None).await?;
    session.cycle_id().await?;
    clear_sentry_user();
    info!("Signed out");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use mockito::{Matcher, Server};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::api::TenantCredential;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_no_credentials_means_no_backend_calls() {
        let mut server = Server::new_async().await;
        let any = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let api = ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap();

        assert!(detect(&api, &HeldCredentials::default()).await.is_none());
        any.assert_async().await;
    }

    #[tokio::test]
    async fn test_admin_probe_wins() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/admin/me")
            .match_header("cookie", "sid=1")
            .with_body(r#"{"user":{"id":"a-1","email":"root@platform.test"}}"#)
            .create_async()
            .await;
        let api = ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap();

        let mut held = HeldCredentials::default();
        held.set_admin_session("sid=1".to_owned());
        let identity = detect(&api, &held).await.unwrap();
        assert!(identity.is_admin());
    }

    #[tokio::test]
    async fn test_falls_back_to_tenant_probe() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/tenant/me")
            .with_body(
                r#"{"user":{"id":"u-1","email":"owner@acme.test"},"tenant":{"id":"t-1","shop_domain":"acme.myshopify.com","has_access_token":true}}"#,
            )
            .create_async()
            .await;
        let api = ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap();

        let mut held = HeldCredentials::default();
        held.set_tenant(TenantCredential::new("owner@acme.test", "hunter2"));
        let identity = detect(&api, &held).await.unwrap();
        assert_eq!(identity.tenant_id().unwrap().as_str(), "t-1");
    }

    #[tokio::test]
    async fn test_forget_tenant_login_signs_tenant_out() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/tenant/me")
            .with_body(
                r#"{"user":{"id":"u-1","email":"owner@acme.test"},"tenant":{"id":"t-1","shop_domain":"acme.myshopify.com","has_access_token":true}}"#,
            )
            .create_async()
            .await;
        let api = ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let session = session();

        let mut held = HeldCredentials::default();
        held.set_tenant(TenantCredential::new("owner@acme.test", "hunter2"));
        store_credentials(&session, &held).await.unwrap();
        assert!(refresh(&api, &session).await.unwrap().is_some());

        forget_tenant_login(&session).await.unwrap();
        let state = load_state(&session).await.unwrap();
        assert!(state.identity.is_none());
        assert!(state.credentials.is_empty());
        assert!(state.credentials.tenant().is_anonymous());
    }

    #[tokio::test]
    async fn test_forget_tenant_login_keeps_admin() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/admin/me")
            .match_header("cookie", "sid=1")
            .with_body(r#"{"user":{"id":"a-1","email":"root@platform.test"}}"#)
            .create_async()
            .await;
        let api = ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let session = session();

        let mut held = HeldCredentials::default();
        held.set_admin_session("sid=1".to_owned());
        store_credentials(&session, &held).await.unwrap();
        refresh(&api, &session).await.unwrap();

        forget_tenant_login(&session).await.unwrap();
        let state = load_state(&session).await.unwrap();
        assert!(state.identity.is_some_and(|identity| identity.is_admin()));
        assert!(state.credentials.has_admin_session());
    }

    #[tokio::test]
    async fn test_first_probe_without_identity_is_first_time() {
        let server = Server::new_async().await;
        let api = ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let session = session();

        assert!(ensure_probed(&api, &session).await.unwrap().is_none());
        let state = load_state(&session).await.unwrap();
        assert!(state.probed);
        assert!(state.first_time);

        // A later empty probe does not reset the flag.
        refresh(&api, &session).await.unwrap();
        assert!(load_state(&session).await.unwrap().first_time);
    }

    #[tokio::test]
    async fn test_admin_login_then_logout() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/admin/login")
            .with_header("set-cookie", "sid=abc; HttpOnly")
            .with_body("{}")
            .create_async()
            .await;
        server
            .mock("GET", "/admin/me")
            .match_header("cookie", "sid=abc")
            .with_body(r#"{"user":{"id":"a-1","email":"root@platform.test"}}"#)
            .create_async()
            .await;
        let logout_call = server
            .mock("POST", "/admin/logout")
            .match_header("cookie", "sid=abc")
            .with_status(500)
            .create_async()
            .await;
        let api = ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let session = session();

        let identity = login_admin(&api, &session, "root@platform.test", "pw")
            .await
            .unwrap();
        assert!(identity.is_admin());
        assert!(!load_state(&session).await.unwrap().first_time);

        logout(&api, &session).await.unwrap();
        logout_call.assert_async().await;
        let state = load_state(&session).await.unwrap();
        assert!(state.identity.is_none());
        assert!(state.credentials.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_admin_login_message() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/admin/login")
            .with_status(401)
            .create_async()
            .await;
        let api = ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap();

        let err = login_admin(&api, &session(), "root@platform.test", "bad")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid email or password.");
    }
}
