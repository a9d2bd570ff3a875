//! Admin tenant management handlers.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use storepulse_core::{ShopDomain, TenantId};
use tracing::{info, instrument, warn};

use crate::api::types::{
    ApiKeyMeta, DataType, SyncLog, TenantSummary, TenantTotals, TenantUser,
};
use crate::api::{ApiError, Credentials};
use crate::cache::{Audience, QueryKey};
use crate::components::PageContext;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::auth::{RequireAdmin, set_flash, take_flash};
use crate::models::Flash;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Onboard a shop that already has an access token.
#[derive(Debug, Deserialize)]
pub struct CreateTenantForm {
    pub shop_domain: String,
    pub access_token: String,
}

/// Create a tenant together with its first user.
#[derive(Debug, Deserialize)]
pub struct InitTenantForm {
    pub shop_domain: String,
    pub email: String,
    pub password: String,
}

/// Ingestion trigger. Each present checkbox limits the run to that data set;
/// none means everything.
#[derive(Debug, Default, Deserialize)]
pub struct IngestForm {
    pub customers: Option<String>,
    pub products: Option<String>,
    pub orders: Option<String>,
}

impl IngestForm {
    fn data_types(&self) -> Vec<DataType> {
        [
            (DataType::Customers, &self.customers),
            (DataType::Products, &self.products),
            (DataType::Orders, &self.orders),
        ]
        .into_iter()
        .filter(|(_, checked)| checked.is_some())
        .map(|(data_type, _)| data_type)
        .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    pub users: Option<String>,
}

impl DetailQuery {
    fn show_users(&self) -> bool {
        matches!(self.users.as_deref(), Some("1" | "true" | "on"))
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "tenants/index.html")]
pub struct TenantsTemplate {
    pub page: PageContext,
    pub tenants: Vec<TenantSummary>,
    pub load_error: Option<String>,
}

/// A section of the detail page: loaded rows or an inline error.
pub struct Section<T> {
    pub rows: Vec<T>,
    pub error: Option<String>,
}

impl<T: Clone> Section<T> {
    fn from_result(result: std::result::Result<Arc<Vec<T>>, ApiError>) -> Self {
        match result {
            Ok(rows) => Self {
                rows: rows.as_ref().clone(),
                error: None,
            },
            Err(e) => Self {
                rows: Vec::new(),
                error: Some(e.user_message()),
            },
        }
    }
}

/// The raw value of a just-issued key, rendered exactly once.
pub struct IssuedKeyView {
    pub label: Option<String>,
    pub value: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "tenants/detail.html")]
pub struct TenantDetailTemplate {
    pub page: PageContext,
    pub tenant_id: TenantId,
    pub shop_domain: Option<String>,
    pub has_access_token: Option<bool>,
    pub totals: Option<TenantTotals>,
    pub totals_error: Option<String>,
    pub logs: Section<SyncLog>,
    pub keys: Section<ApiKeyMeta>,
    pub users: Option<Section<TenantUser>>,
    pub issued_key: Option<IssuedKeyView>,
}

// =============================================================================
// Shared loaders
// =============================================================================

pub(crate) async fn cached_tenants(
    state: &AppState,
    credentials: &Credentials,
) -> std::result::Result<Arc<Vec<TenantSummary>>, ApiError> {
    state
        .cache()
        .get_or_fetch(
            Audience::Admin,
            QueryKey::Tenants,
            state.api().list_tenants(credentials),
        )
        .await
}

/// Render the tenant detail page.
///
/// `issued_key` is only ever passed straight from the issuing request.
pub(crate) async fn render_detail(
    state: &AppState,
    admin: RequireAdmin,
    tenant_id: TenantId,
    show_users: bool,
    issued_key: Option<IssuedKeyView>,
) -> Result<TenantDetailTemplate> {
    let RequireAdmin {
        admin,
        credentials,
        session,
        theme,
    } = admin;
    let cache = state.cache();
    let api = state.api();

    let users = async {
        if show_users {
            Some(
                cache
                    .get_or_fetch(
                        Audience::Admin,
                        QueryKey::TenantUsers(tenant_id.clone()),
                        api.tenant_users(&credentials, &tenant_id),
                    )
                    .await,
            )
        } else {
            None
        }
    };

    let (tenants, totals, logs, keys, users) = tokio::join!(
        cached_tenants(state, &credentials),
        cache.get_or_fetch(
            Audience::Admin,
            QueryKey::TenantTotals(tenant_id.clone()),
            api.tenant_totals(&credentials, &tenant_id),
        ),
        cache.get_or_fetch(
            Audience::Admin,
            QueryKey::SyncLogs(tenant_id.clone()),
            api.tenant_logs(&credentials, &tenant_id),
        ),
        cache.get_or_fetch(
            Audience::Admin,
            QueryKey::ApiKeys(tenant_id.clone()),
            api.list_api_keys(&credentials, &tenant_id),
        ),
        users,
    );

    // A freshly issued key is rendered even when the tenant list lags behind.
    let summary = match tenants {
        Ok(list) => match list.iter().find(|t| t.id == tenant_id) {
            Some(tenant) => Some(tenant.clone()),
            None if issued_key.is_some() => {
                warn!(tenant_id = %tenant_id, "Issued key for a tenant missing from the list");
                None
            }
            None => return Err(AppError::NotFound(format!("tenant {tenant_id}"))),
        },
        Err(e) => {
            warn!(error = %e, "Tenant list unavailable for detail page");
            None
        }
    };

    let (totals, totals_error) = match totals {
        Ok(totals) => (Some(totals.as_ref().clone()), None),
        Err(e) => (None, Some(e.user_message())),
    };

    let page = PageContext {
        flash: take_flash(&session).await,
        ..PageContext::new(
            theme,
            Some(storepulse_core::Identity::Admin(admin)),
            format!("/admin/tenants/{tenant_id}"),
        )
    };

    Ok(TenantDetailTemplate {
        page,
        shop_domain: summary.as_ref().map(|t| t.shop_domain.to_string()),
        has_access_token: summary.as_ref().map(|t| t.has_access_token),
        tenant_id,
        totals,
        totals_error,
        logs: Section::from_result(logs),
        keys: Section::from_result(keys),
        users: users.map(Section::from_result),
        issued_key,
    })
}

fn detail_path(tenant_id: &TenantId) -> String {
    format!("/admin/tenants/{tenant_id}")
}

// =============================================================================
// Handlers
// =============================================================================

/// List tenants with the create and init forms.
pub async fn index(State(state): State<AppState>, admin: RequireAdmin) -> Result<TenantsTemplate> {
    let (tenants, load_error) = match cached_tenants(&state, &admin.credentials).await {
        Ok(list) => (list.as_ref().clone(), None),
        Err(e) => (Vec::new(), Some(e.user_message())),
    };

    let page = PageContext {
        flash: take_flash(&admin.session).await,
        ..PageContext::new(
            admin.theme,
            Some(storepulse_core::Identity::Admin(admin.admin)),
            "/admin/tenants",
        )
    };

    Ok(TenantsTemplate {
        page,
        tenants,
        load_error,
    })
}

/// Onboard a shop with an existing access token.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Form(form): Form<CreateTenantForm>,
) -> Result<Redirect> {
    let shop = match ShopDomain::normalize(&form.shop_domain) {
        Ok(shop) => shop,
        Err(e) => {
            set_flash(&admin.session, Flash::error(e.to_string())).await?;
            return Ok(Redirect::to("/admin/tenants"));
        }
    };
    let access_token = form.access_token.trim();
    if access_token.is_empty() {
        set_flash(&admin.session, Flash::error("Please input the access token.")).await?;
        return Ok(Redirect::to("/admin/tenants"));
    }

    match state
        .api()
        .create_tenant(&admin.credentials, &shop, access_token)
        .await
    {
        Ok(tenant) => {
            state.cache().invalidate(&QueryKey::Tenants).await;
            info!(tenant_id = %tenant.id, shop = %tenant.shop_domain, "Tenant created");
            set_flash(&admin.session, Flash::success("Tenant created successfully!")).await?;
            Ok(Redirect::to(&detail_path(&tenant.id)))
        }
        Err(e) => {
            warn!(error = %e, shop = %shop, "Tenant creation failed");
            set_flash(&admin.session, Flash::error(format!("Error: {}", e.user_message()))).await?;
            Ok(Redirect::to("/admin/tenants"))
        }
    }
}

/// Create a tenant and its first user in one step.
#[instrument(skip_all)]
pub async fn init(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Form(form): Form<InitTenantForm>,
) -> Result<Redirect> {
    let shop = match ShopDomain::normalize(&form.shop_domain) {
        Ok(shop) => shop,
        Err(e) => {
            set_flash(&admin.session, Flash::error(e.to_string())).await?;
            return Ok(Redirect::to("/admin/tenants"));
        }
    };
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        set_flash(&admin.session, Flash::error("Enter the first user's email and password.")).await?;
        return Ok(Redirect::to("/admin/tenants"));
    }

    match state
        .api()
        .init_tenant(&admin.credentials, &shop, email, &form.password)
        .await
    {
        Ok(created) => {
            state.cache().invalidate(&QueryKey::Tenants).await;
            info!(tenant_id = %created.tenant.id, shop = %created.tenant.shop_domain, "Tenant initialized");
            let message = created.user.map_or_else(
                || "Tenant initialized.".to_owned(),
                |user| format!("Tenant initialized with user {}.", user.email),
            );
            set_flash(&admin.session, Flash::success(message)).await?;
            Ok(Redirect::to(&detail_path(&created.tenant.id)))
        }
        Err(e) => {
            warn!(error = %e, shop = %shop, "Tenant init failed");
            set_flash(&admin.session, Flash::error(format!("Error: {}", e.user_message()))).await?;
            Ok(Redirect::to("/admin/tenants"))
        }
    }
}

/// Tenant details: totals, sync logs, API keys and (on demand) users.
pub async fn show(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(tenant_id): Path<TenantId>,
    Query(query): Query<DetailQuery>,
) -> Result<TenantDetailTemplate> {
    render_detail(&state, admin, tenant_id, query.show_users(), None).await
}

/// Trigger an ingestion run for a tenant.
#[instrument(skip_all)]
pub async fn ingest(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(tenant_id): Path<TenantId>,
    Form(form): Form<IngestForm>,
) -> Result<Response> {
    let data_types = form.data_types();
    let flash = match state
        .api()
        .ingest(&admin.credentials, &tenant_id, &data_types)
        .await
    {
        Ok(accepted) => {
            let cache = state.cache();
            cache.invalidate(&QueryKey::TenantTotals(tenant_id.clone())).await;
            cache.invalidate(&QueryKey::SyncLogs(tenant_id.clone())).await;
            info!(tenant_id = %tenant_id, data_types = ?data_types, "Ingestion triggered");
            Flash::success(
                accepted
                    .message
                    .unwrap_or_else(|| "Ingestion started.".to_owned()),
            )
        }
        Err(e) => {
            warn!(tenant_id = %tenant_id, error = %e, "Ingestion trigger failed");
            Flash::error(format!("Ingestion failed: {}", e.user_message()))
        }
    };
    set_flash(&admin.session, flash).await?;
    Ok(Redirect::to(&detail_path(&tenant_id)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_form_data_types() {
        assert!(IngestForm::default().data_types().is_empty());

        let form = IngestForm {
            customers: Some("on".to_owned()),
            products: None,
            orders: Some("on".to_owned()),
        };
        assert_eq!(form.data_types(), vec![DataType::Customers, DataType::Orders]);
    }

    #[test]
    fn test_users_shown_on_demand() {
        assert!(!DetailQuery::default().show_users());
        assert!(
            DetailQuery {
                users: Some("1".to_owned())
            }
            .show_users()
        );
    }
}
