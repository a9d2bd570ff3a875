//! Tenant connect/login flow handlers.
//!
//! The flow lives in the browser session between requests. Every handler
//! loads it, runs one step, stores it back, and then either redirects to the
//! login page (which renders the flow) or finishes the sign-in. A rejected
//! tenant login also drops whatever tenant login the session already held.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::auth;
use crate::components::PageContext;
use crate::connect::{ConnectFlow, ConnectStage, FlowOutcome, FlowState};
use crate::error::Result;
use crate::filters;
use crate::middleware::auth::{CurrentSession, set_flash, store_credentials};
use crate::models::{Flash, HeldCredentials, session_keys};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LookupForm {
    pub shop: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub access_token: String,
}

// =============================================================================
// Session storage
// =============================================================================

/// Load this browser's connect flow.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_flow(session: &Session) -> Result<ConnectFlow> {
    Ok(session
        .get::<ConnectFlow>(session_keys::CONNECT_FLOW)
        .await?
        .unwrap_or_default())
}

async fn store_flow(session: &Session, flow: &ConnectFlow) -> Result<()> {
    session.insert(session_keys::CONNECT_FLOW, flow).await?;
    Ok(())
}

// =============================================================================
// View
// =============================================================================

/// Flat view of the flow for the login template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectView {
    /// One of `idle`, `searching`, `not_found`, `found`, `awaiting_login`,
    /// `ready_to_connect`, `pending_recheck`.
    pub step: &'static str,
    pub shop: Option<String>,
    pub authorize_url: Option<String>,
    pub error: Option<String>,
    pub signed_in: bool,
}

impl ConnectView {
    #[must_use]
    pub fn from_flow(flow: &ConnectFlow) -> Self {
        let (step, shop, authorize_url) = match flow.state() {
            FlowState::Idle => ("idle", None, None),
            FlowState::Searching { shop } => ("searching", Some(shop.to_string()), None),
            FlowState::NotFound { shop } => ("not_found", Some(shop.to_string()), None),
            FlowState::Found { tenant } => ("found", Some(tenant.shop_domain.to_string()), None),
            FlowState::NeedsConnect { tenant, stage } => {
                let shop = Some(tenant.shop_domain.to_string());
                match stage {
                    ConnectStage::AwaitingLogin => ("awaiting_login", shop, None),
                    ConnectStage::ReadyToConnect => ("ready_to_connect", shop, None),
                    ConnectStage::PendingRecheck { authorize_url } => {
                        ("pending_recheck", shop, Some(authorize_url.clone()))
                    }
                }
            }
        };
        Self {
            step,
            shop,
            authorize_url,
            error: flow.error().map(str::to_owned),
            signed_in: flow.credential().is_some(),
        }
    }

    #[must_use]
    pub fn shows_login(&self) -> bool {
        matches!(self.step, "found" | "awaiting_login")
    }
}

/// Page that hands the Shopify authorization URL to a new tab.
#[derive(Template, WebTemplate)]
#[template(path = "connect/authorize.html")]
pub struct AuthorizeTemplate {
    pub page: PageContext,
    pub shop: String,
    pub authorize_url: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Turn a step's outcome into a response.
async fn finish(
    state: &AppState,
    session: &Session,
    page: PageContext,
    mut flow: ConnectFlow,
    outcome: FlowOutcome,
) -> Result<Response> {
    match outcome {
        FlowOutcome::Stay => {
            store_flow(session, &flow).await?;
            Ok(Redirect::to("/login").into_response())
        }
        FlowOutcome::OpenAuthorizeUrl(authorize_url) => {
            store_flow(session, &flow).await?;
            let shop = ConnectView::from_flow(&flow).shop.unwrap_or_default();
            Ok(AuthorizeTemplate {
                page,
                shop,
                authorize_url,
            }
            .into_response())
        }
        FlowOutcome::Authenticated { tenant_id } => {
            let mut held = HeldCredentials::default();
            if let Some(credential) = flow.take_credential() {
                held.set_tenant(credential);
            }
            store_credentials(session, &held).await?;
            session.cycle_id().await?;
            flow.reset();
            store_flow(session, &flow).await?;

            match auth::refresh(state.api(), session).await? {
                Some(identity) if identity.tenant_id() == Some(&tenant_id) => {
                    info!(tenant_id = %tenant_id, "Tenant user signed in");
                    Ok(Redirect::to("/dashboard").into_response())
                }
                _ => {
                    warn!(tenant_id = %tenant_id, "Tenant sign-in could not be confirmed");
                    set_flash(
                        session,
                        Flash::error("Signed in, but the session could not be confirmed. Please log in again."),
                    )
                    .await?;
                    Ok(Redirect::to("/login").into_response())
                }
            }
        }
    }
}

fn page_for(current: &CurrentSession) -> PageContext {
    PageContext::new(current.state.theme, current.state.identity.clone(), "/login")
}

/// Look up a shop by domain or store name.
#[instrument(skip_all)]
pub async fn lookup(
    State(state): State<AppState>,
    current: CurrentSession,
    Form(form): Form<LookupForm>,
) -> Result<Response> {
    let mut flow = load_flow(&current.session).await?;
    let outcome = flow.lookup(state.api(), &form.shop).await;
    finish(&state, &current.session, page_for(&current), flow, outcome).await
}

/// Sign in as a tenant user of the looked-up shop.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    current: CurrentSession,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let mut flow = load_flow(&current.session).await?;
    let outcome = flow
        .login(state.api(), state.cache(), &form.email, &form.password)
        .await;
    if flow.error().is_some() {
        auth::forget_tenant_login(&current.session).await?;
    }
    finish(&state, &current.session, page_for(&current), flow, outcome).await
}

/// Start Shopify authorization.
#[instrument(skip_all)]
pub async fn shopify(State(state): State<AppState>, current: CurrentSession) -> Result<Response> {
    let mut flow = load_flow(&current.session).await?;
    let outcome = flow.connect(state.api()).await;
    finish(&state, &current.session, page_for(&current), flow, outcome).await
}

/// Check whether Shopify authorization has finished.
#[instrument(skip_all)]
pub async fn recheck(State(state): State<AppState>, current: CurrentSession) -> Result<Response> {
    let mut flow = load_flow(&current.session).await?;
    let outcome = flow.recheck(state.api(), state.cache()).await;
    finish(&state, &current.session, page_for(&current), flow, outcome).await
}

/// Attach an access token by hand.
#[instrument(skip_all)]
pub async fn token(
    State(state): State<AppState>,
    current: CurrentSession,
    Form(form): Form<TokenForm>,
) -> Result<Response> {
    let mut flow = load_flow(&current.session).await?;
    let outcome = flow
        .set_token(state.api(), state.cache(), &form.access_token)
        .await;
    finish(&state, &current.session, page_for(&current), flow, outcome).await
}

/// Start over.
pub async fn reset(current: CurrentSession) -> Result<Redirect> {
    let mut flow = load_flow(&current.session).await?;
    flow.reset();
    store_flow(&current.session, &flow).await?;
    Ok(Redirect::to("/login"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_view() {
        let view = ConnectView::from_flow(&ConnectFlow::new());
        assert_eq!(view.step, "idle");
        assert!(view.shop.is_none());
        assert!(!view.shows_login());
        assert!(!view.signed_in);
    }

    #[test]
    fn test_view_reads_serialized_flow() {
        let flow: ConnectFlow = serde_json::from_value(serde_json::json!({
            "state": {
                "state": "needs_connect",
                "tenant": {"id": "t-1", "shop_domain": "acme.myshopify.com", "has_access_token": false},
                "stage": {"stage": "pending_recheck", "authorize_url": "https://acme.myshopify.com/admin/oauth/authorize"}
            },
            "error": "Still not connected.",
            "credential": null
        }))
        .unwrap();

        let view = ConnectView::from_flow(&flow);
        assert_eq!(view.step, "pending_recheck");
        assert_eq!(view.shop.as_deref(), Some("acme.myshopify.com"));
        assert_eq!(
            view.authorize_url.as_deref(),
            Some("https://acme.myshopify.com/admin/oauth/authorize")
        );
        assert_eq!(view.error.as_deref(), Some("Still not connected."));
    }
}
