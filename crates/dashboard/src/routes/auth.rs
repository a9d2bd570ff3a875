//! Landing, sign-in and sign-out handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use storepulse_core::Identity;
use tracing::{instrument, warn};

use super::connect::{ConnectView, load_flow};
use crate::auth::{self, LoginError};
use crate::components::PageContext;
use crate::error::Result;
use crate::filters;
use crate::middleware::auth::{CurrentSession, load_state, set_flash};
use crate::models::Flash;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Admin login and bootstrap form data.
#[derive(Debug, Deserialize)]
pub struct AdminForm {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Auth landing: admin sign-in plus the tenant connect flow.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub connect: ConnectView,
    pub admin_error: Option<String>,
    pub admin_email: String,
    /// Nobody has ever signed in from this browser session; suggest bootstrap.
    pub first_time: bool,
}

fn home_for(identity: &Identity) -> &'static str {
    match identity {
        Identity::Admin(_) => "/admin/tenants",
        Identity::Tenant(_) => "/dashboard",
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Send the browser wherever its identity belongs.
pub async fn index(State(state): State<AppState>, current: CurrentSession) -> Result<Redirect> {
    let identity = auth::ensure_probed(state.api(), &current.session).await?;
    Ok(Redirect::to(identity.as_ref().map_or("/login", home_for)))
}

async fn render_login(
    current: CurrentSession,
    admin_error: Option<String>,
    admin_email: String,
) -> Result<LoginTemplate> {
    let flow = load_flow(&current.session).await?;
    let page = PageContext::load(&current.session, &current.state, "/login").await;
    Ok(LoginTemplate {
        page,
        connect: ConnectView::from_flow(&flow),
        admin_error,
        admin_email,
        first_time: current.state.first_time,
    })
}

/// Display the auth landing page.
///
/// A signed-in browser is sent home unless the connect flow has an error to
/// show.
pub async fn login_page(State(state): State<AppState>, current: CurrentSession) -> Result<Response> {
    if let Some(identity) = auth::ensure_probed(state.api(), &current.session).await?
        && load_flow(&current.session).await?.error().is_none()
    {
        return Ok(Redirect::to(home_for(&identity)).into_response());
    }
    // Re-read so a fresh first probe is reflected.
    let refreshed = CurrentSession {
        state: load_state(&current.session).await?,
        session: current.session,
    };
    Ok(render_login(refreshed, None, String::new())
        .await?
        .into_response())
}

async fn admin_result(
    current: CurrentSession,
    email: String,
    result: std::result::Result<Identity, LoginError>,
) -> Result<Response> {
    match result {
        Ok(identity) => Ok(Redirect::to(home_for(&identity)).into_response()),
        Err(LoginError::Session(e)) => Err(e.into()),
        Err(e) => {
            warn!(error = %e, "Admin sign-in failed");
            let status = match &e {
                LoginError::Api(api) if api.is_unauthorized() => StatusCode::UNAUTHORIZED,
                _ => StatusCode::OK,
            };
            let page = render_login(current, Some(e.user_message()), email).await?;
            Ok((status, page).into_response())
        }
    }
}

/// Handle the admin login form.
#[instrument(skip_all)]
pub async fn admin_login(
    State(state): State<AppState>,
    current: CurrentSession,
    Form(form): Form<AdminForm>,
) -> Result<Response> {
    let result = auth::login_admin(state.api(), &current.session, &form.email, &form.password).await;
    admin_result(current, form.email, result).await
}

/// Create the first admin account and sign in with it.
#[instrument(skip_all)]
pub async fn admin_bootstrap(
    State(state): State<AppState>,
    current: CurrentSession,
    Form(form): Form<AdminForm>,
) -> Result<Response> {
    let result =
        auth::bootstrap_admin(state.api(), &current.session, &form.email, &form.password).await;
    admin_result(current, form.email, result).await
}

/// Sign out of every identity held by this browser.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, current: CurrentSession) -> Result<Redirect> {
    auth::logout(state.api(), &current.session).await?;
    set_flash(&current.session, Flash::info("You have been signed out.")).await?;
    Ok(Redirect::to("/login"))
}
