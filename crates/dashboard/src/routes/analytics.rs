//! Analytics dashboard handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use storepulse_core::{AnalyticsWindow, Identity, TenantId};

use crate::api::Credentials;
use crate::cache::{Audience, QueryKey};
use crate::components::{ChartCard, ChartKind, KpiPanel, PageContext};
use crate::error::Result;
use crate::filters;
use crate::middleware::auth::{RequireAdmin, RequireTenant, take_flash};
use crate::state::AppState;

use super::tenants::cached_tenants;

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub days: Option<String>,
}

impl WindowQuery {
    fn window(&self) -> AnalyticsWindow {
        AnalyticsWindow::from_query(self.days.as_deref())
    }
}

/// Window selector entry.
pub struct WindowOption {
    pub days: u32,
    pub selected: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "analytics/dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub heading: String,
    /// Path the window selector links back to.
    pub base_path: String,
    pub back_link: Option<String>,
    pub windows: Vec<WindowOption>,
    pub kpis: KpiPanel,
    pub charts: Vec<ChartCard>,
}

/// Fetch every widget of the dashboard concurrently through the cache.
///
/// A failing read only affects its own card.
async fn load_cards(
    state: &AppState,
    audience: Audience,
    credentials: &Credentials,
    tenant: &TenantId,
    window: AnalyticsWindow,
) -> (KpiPanel, Vec<ChartCard>) {
    let cache = state.cache();
    let api = state.api();

    let (kpis, revenue, customers, products, funnel) = tokio::join!(
        cache.get_or_fetch(
            audience,
            QueryKey::Kpis(tenant.clone(), window),
            api.kpis(credentials, tenant, window),
        ),
        cache.get_or_fetch(
            audience,
            QueryKey::RevenueOverTime(tenant.clone(), window),
            api.revenue_over_time(credentials, tenant, window),
        ),
        cache.get_or_fetch(
            audience,
            QueryKey::CustomerGrowth(tenant.clone(), window),
            api.customer_growth(credentials, tenant, window),
        ),
        cache.get_or_fetch(
            audience,
            QueryKey::ProductGrowth(tenant.clone(), window),
            api.product_growth(credentials, tenant, window),
        ),
        cache.get_or_fetch(
            audience,
            QueryKey::EventsSummary(tenant.clone(), window),
            api.events_summary(credentials, tenant, window),
        ),
    );

    let panel = KpiPanel::from_result(&kpis, &state.config().currency_symbol);
    let charts = vec![
        ChartCard::from_result(ChartKind::Revenue, &revenue),
        ChartCard::from_result(ChartKind::CustomerGrowth, &customers),
        ChartCard::from_result(ChartKind::ProductGrowth, &products),
        ChartCard::from_result(ChartKind::Funnel, &funnel),
    ];
    (panel, charts)
}

fn window_options(window: AnalyticsWindow) -> Vec<WindowOption> {
    AnalyticsWindow::presets()
        .map(|w| WindowOption {
            days: w.days(),
            selected: w == window,
        })
        .collect()
}

/// The signed-in tenant user's own dashboard.
pub async fn dashboard(
    State(state): State<AppState>,
    tenant: RequireTenant,
    Query(query): Query<WindowQuery>,
) -> Result<DashboardTemplate> {
    let window = query.window();
    let RequireTenant {
        user,
        credentials,
        session,
        theme,
    } = tenant;

    let (kpis, charts) =
        load_cards(&state, Audience::Tenant, &credentials, &user.tenant_id, window).await;
    let heading = user.shop_domain.to_string();

    Ok(DashboardTemplate {
        page: PageContext {
            flash: take_flash(&session).await,
            ..PageContext::new(theme, Some(Identity::Tenant(user)), "/dashboard")
        },
        heading,
        base_path: "/dashboard".to_owned(),
        back_link: None,
        windows: window_options(window),
        kpis,
        charts,
    })
}

/// An admin's view of any tenant's dashboard.
pub async fn tenant_analytics(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(tenant_id): Path<TenantId>,
    Query(query): Query<WindowQuery>,
) -> Result<DashboardTemplate> {
    let window = query.window();
    let ((kpis, charts), tenants) = tokio::join!(
        load_cards(&state, Audience::Admin, &admin.credentials, &tenant_id, window),
        cached_tenants(&state, &admin.credentials),
    );
    let heading = tenants
        .ok()
        .and_then(|list| {
            list.iter()
                .find(|t| t.id == tenant_id)
                .map(|t| t.shop_domain.to_string())
        })
        .unwrap_or_else(|| format!("Tenant {tenant_id}"));

    let detail = format!("/admin/tenants/{tenant_id}");
    let base_path = format!("{detail}/analytics");
    Ok(DashboardTemplate {
        page: PageContext {
            flash: take_flash(&admin.session).await,
            ..PageContext::new(admin.theme, Some(Identity::Admin(admin.admin)), base_path.clone())
        },
        heading,
        base_path,
        back_link: Some(detail),
        windows: window_options(window),
        kpis,
        charts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_window_falls_back_to_default() {
        let query = WindowQuery {
            days: Some("45".to_owned()),
        };
        assert_eq!(query.window().days(), 30);
        let options = window_options(query.window());
        assert_eq!(options.len(), 4);
        assert_eq!(
            options.iter().filter(|o| o.selected).map(|o| o.days).collect::<Vec<_>>(),
            vec![30]
        );
    }
}
