//! Session extractors and route guards.
//!
//! The backend is the authority on who may do what; these guards only keep
//! signed-out browsers and the wrong kind of principal away from pages that
//! could not render for them anyway.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use storepulse_core::{AdminIdentity, Identity, TenantIdentity};
use tower_sessions::Session;

use crate::api::Credentials;
use crate::models::{Flash, HeldCredentials, SessionState, Theme, session_keys};

/// Rejection for guarded routes.
#[derive(Debug)]
pub enum AuthRejection {
    /// Nobody is signed in.
    RedirectToLogin,
    /// Signed in, but as the other kind of principal.
    RedirectHome,
    /// The session layer is missing or the store failed.
    SessionUnavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::RedirectHome => Redirect::to("/").into_response(),
            Self::SessionUnavailable => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

fn session_from_parts(parts: &Parts) -> Result<Session, AuthRejection> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or(AuthRejection::SessionUnavailable)
}

/// Load everything the dashboard keeps in a session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_state(session: &Session) -> Result<SessionState, tower_sessions::session::Error> {
    let identity = session.get::<Identity>(session_keys::IDENTITY).await?;
    let credentials = session
        .get::<HeldCredentials>(session_keys::CREDENTIALS)
        .await?
        .unwrap_or_default();
    let theme = session
        .get::<Theme>(session_keys::THEME)
        .await?
        .unwrap_or_default();
    let first_time = session.get::<bool>(session_keys::FIRST_TIME).await?;

    Ok(SessionState {
        identity,
        credentials,
        theme,
        first_time: first_time.unwrap_or(false),
        probed: first_time.is_some(),
    })
}

/// Store (or clear) the signed-in identity.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn store_identity(
    session: &Session,
    identity: Option<&Identity>,
) -> Result<(), tower_sessions::session::Error> {
    match identity {
        Some(identity) => session.insert(session_keys::IDENTITY, identity).await,
        None => session
            .remove::<Identity>(session_keys::IDENTITY)
            .await
            .map(drop),
    }
}

/// Store the held backend credentials.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn store_credentials(
    session: &Session,
    credentials: &HeldCredentials,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::CREDENTIALS, credentials)
        .await
}

/// Queue a message for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn set_flash(session: &Session, flash: Flash) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::FLASH, flash).await
}

/// Take the queued message, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

/// The browser session and its loaded state. Never rejects a signed-out
/// browser.
pub struct CurrentSession {
    pub session: Session,
    pub state: SessionState,
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts)?;
        let state = load_state(&session).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to load session");
            AuthRejection::SessionUnavailable
        })?;
        Ok(Self { session, state })
    }
}

/// Extractor that requires a platform admin.
///
/// # Example
///
/// ```rust,ignore
/// async fn tenants(RequireAdmin { admin, credentials, .. }: RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdmin {
    pub admin: AdminIdentity,
    /// Forwarded backend admin session.
    pub credentials: Credentials,
    pub session: Session,
    pub theme: Theme,
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentSession { session, state } =
            CurrentSession::from_request_parts(parts, state).await?;

        match state.identity {
            Some(Identity::Admin(admin)) => Ok(Self {
                admin,
                credentials: state.credentials.admin(),
                session,
                theme: state.theme,
            }),
            Some(Identity::Tenant(_)) => Err(AuthRejection::RedirectHome),
            None => Err(AuthRejection::RedirectToLogin),
        }
    }
}

/// Extractor that requires a tenant user.
pub struct RequireTenant {
    pub user: TenantIdentity,
    /// Basic credentials of the signed-in tenant user.
    pub credentials: Credentials,
    pub session: Session,
    pub theme: Theme,
}

impl<S> FromRequestParts<S> for RequireTenant
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentSession { session, state } =
            CurrentSession::from_request_parts(parts, state).await?;

        match state.identity {
            Some(Identity::Tenant(user)) => Ok(Self {
                user,
                credentials: state.credentials.tenant(),
                session,
                theme: state.theme,
            }),
            Some(Identity::Admin(_)) => Err(AuthRejection::RedirectHome),
            None => Err(AuthRejection::RedirectToLogin),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use storepulse_core::{AdminId, Email};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_fresh_session_is_unprobed() {
        let state = load_state(&session()).await.unwrap();
        assert!(state.identity.is_none());
        assert!(!state.probed);
        assert!(state.credentials.is_empty());
        assert_eq!(state.theme, Theme::Light);
    }

    #[tokio::test]
    async fn test_identity_round_trip() {
        let session = session();
        let admin = Identity::Admin(AdminIdentity {
            id: AdminId::new("a-1"),
            email: Email::parse("root@platform.test").unwrap(),
        });
        store_identity(&session, Some(&admin)).await.unwrap();
        assert_eq!(load_state(&session).await.unwrap().identity, Some(admin));

        store_identity(&session, None).await.unwrap();
        assert!(load_state(&session).await.unwrap().identity.is_none());
    }

    #[tokio::test]
    async fn test_flash_is_taken_once() {
        let session = session();
        set_flash(&session, Flash::success("Tenant created")).await.unwrap();
        assert_eq!(take_flash(&session).await, Some(Flash::success("Tenant created")));
        assert_eq!(take_flash(&session).await, None);
    }
}
