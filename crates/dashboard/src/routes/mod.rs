//! HTTP route handlers for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//! GET  /health/ready           - Backend readiness
//!
//! # Auth
//! GET  /                       - Redirect by identity
//! GET  /login                  - Auth landing (admin + tenant)
//! POST /admin/login            - Admin sign-in
//! POST /admin/bootstrap        - Create the first admin, then sign in
//! POST /logout                 - Sign out
//!
//! # Tenant connect flow
//! POST /connect/lookup         - Find a shop
//! POST /connect/login          - Tenant user sign-in (Basic)
//! POST /connect/shopify        - Open Shopify authorization
//! POST /connect/recheck        - Check authorization finished
//! POST /connect/token          - Attach an access token by hand
//! POST /connect/reset          - Start over
//!
//! # Admin (platform admin only)
//! GET  /admin/tenants                              - Tenant list
//! POST /admin/tenants                              - Create tenant
//! POST /admin/tenants/init                         - Create tenant + first user
//! GET  /admin/tenants/{id}                         - Tenant details (?users=1)
//! POST /admin/tenants/{id}/ingest                  - Trigger ingestion
//! POST /admin/tenants/{id}/api-keys                - Issue API key
//! POST /admin/tenants/{id}/api-keys/{key_id}/revoke - Revoke API key
//! GET  /admin/tenants/{id}/analytics               - Tenant dashboard (?days=)
//!
//! # Tenant
//! GET  /dashboard              - Own dashboard (?days=)
//!
//! # Preferences
//! POST /preferences/theme      - Light/dark toggle
//! ```

pub mod analytics;
pub mod api_keys;
pub mod auth;
pub mod connect;
pub mod health;
pub mod preferences;
pub mod tenants;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the connect flow router.
pub fn connect_routes() -> Router<AppState> {
    Router::new()
        .route("/lookup", post(connect::lookup))
        .route("/login", post(connect::login))
        .route("/shopify", post(connect::shopify))
        .route("/recheck", post(connect::recheck))
        .route("/token", post(connect::token))
        .route("/reset", post(connect::reset))
}

/// Create the admin tenant router.
pub fn tenant_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(tenants::index).post(tenants::create))
        .route("/init", post(tenants::init))
        .route("/{id}", get(tenants::show))
        .route("/{id}/ingest", post(tenants::ingest))
        .route("/{id}/api-keys", post(api_keys::issue))
        .route("/{id}/api-keys/{key_id}/revoke", post(api_keys::revoke))
        .route("/{id}/analytics", get(analytics::tenant_analytics))
}

/// Create all routes for the dashboard.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Auth
        .route("/", get(auth::index))
        .route("/login", get(auth::login_page))
        .route("/admin/login", post(auth::admin_login))
        .route("/admin/bootstrap", post(auth::admin_bootstrap))
        .route("/logout", post(auth::logout))
        // Tenant connect flow
        .nest("/connect", connect_routes())
        // Admin
        .nest("/admin/tenants", tenant_routes())
        // Tenant
        .route("/dashboard", get(analytics::dashboard))
        // Preferences
        .route("/preferences/theme", post(preferences::theme))
}
