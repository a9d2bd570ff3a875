//! Per-tenant API key handlers.
//!
//! A newly issued key's raw value comes back once from the backend and is
//! rendered straight into the response of the issuing request. It is never
//! cached, stored in the session, or logged.

use axum::{
    Form,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use storepulse_core::{ApiKeyId, TenantId};
use tracing::{info, instrument, warn};

use super::tenants::{IssuedKeyView, render_detail};
use crate::cache::QueryKey;
use crate::error::Result;
use crate::middleware::auth::{RequireAdmin, set_flash};
use crate::models::Flash;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IssueKeyForm {
    pub label: Option<String>,
}

impl IssueKeyForm {
    fn label(&self) -> Option<&str> {
        self.label.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// Issue a new key and show its raw value this one time.
#[instrument(skip_all)]
pub async fn issue(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(tenant_id): Path<TenantId>,
    Form(form): Form<IssueKeyForm>,
) -> Result<Response> {
    let issued = state
        .api()
        .issue_api_key(&admin.credentials, &tenant_id, form.label())
        .await;

    match issued {
        Ok(key) => {
            let cache = state.cache();
            cache.invalidate(&QueryKey::ApiKeys(tenant_id.clone())).await;
            cache.invalidate(&QueryKey::Tenants).await;
            info!(tenant_id = %tenant_id, key_id = ?key.id, "API key issued");
            let view = IssuedKeyView {
                label: key.label.clone(),
                value: key.api_key.expose_secret().to_owned(),
            };
            let page = render_detail(&state, admin, tenant_id, false, Some(view)).await?;
            Ok((
                [(header::CACHE_CONTROL, "no-store")],
                page,
            )
                .into_response())
        }
        Err(e) => {
            warn!(tenant_id = %tenant_id, error = %e, "API key issue failed");
            set_flash(
                &admin.session,
                Flash::error(format!("Could not issue key: {}", e.user_message())),
            )
            .await?;
            Ok(Redirect::to(&format!("/admin/tenants/{tenant_id}")).into_response())
        }
    }
}

/// Revoke a key.
#[instrument(skip_all)]
pub async fn revoke(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path((tenant_id, key_id)): Path<(TenantId, ApiKeyId)>,
) -> Result<Redirect> {
    let flash = match state
        .api()
        .revoke_api_key(&admin.credentials, &tenant_id, &key_id)
        .await
    {
        Ok(()) => {
            state
                .cache()
                .invalidate(&QueryKey::ApiKeys(tenant_id.clone()))
                .await;
            info!(tenant_id = %tenant_id, key_id = %key_id, "API key revoked");
            Flash::success("API key revoked.")
        }
        Err(e) => {
            warn!(tenant_id = %tenant_id, key_id = %key_id, error = %e, "API key revoke failed");
            Flash::error(format!("Could not revoke key: {}", e.user_message()))
        }
    };
    set_flash(&admin.session, flash).await?;
    Ok(Redirect::to(&format!("/admin/tenants/{tenant_id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_label_is_omitted() {
        assert_eq!(IssueKeyForm::default().label(), None);
        let blank = IssueKeyForm {
            label: Some("   ".to_owned()),
        };
        assert_eq!(blank.label(), None);
        let named = IssueKeyForm {
            label: Some(" ci ".to_owned()),
        };
        assert_eq!(named.label(), Some("ci"));
    }
}
