//! Tenant commands: listing, onboarding, ingestion and shop lookup.

use storepulse_core::{ShopDomain, TenantId};
use storepulse_dashboard::api::types::DataType;

use super::{Backend, CliError};

/// Print every tenant, one per line.
///
/// # Errors
///
/// Returns an error if sign-in or the request fails.
#[allow(clippy::print_stdout)]
pub async fn list(backend: &Backend) -> Result<(), CliError> {
    let credentials = backend.admin_session().await?;
    let tenants = backend.api().list_tenants(&credentials).await;
    backend.end_session(&credentials).await;
    let tenants = tenants?;

    if tenants.is_empty() {
        tracing::info!("No tenants yet");
        return Ok(());
    }
    for tenant in &tenants {
        let token = if tenant.has_access_token {
            "connected"
        } else {
            "no token"
        };
        println!("{}\t{}\t{token}", tenant.id, tenant.shop_domain);
    }
    Ok(())
}

/// Onboard a shop that already has an access token.
///
/// # Errors
///
/// Returns an error if the shop is invalid, sign-in fails, or the backend
/// rejects the tenant.
pub async fn create(backend: &Backend, shop: &str, access_token: &str) -> Result<(), CliError> {
    let shop = ShopDomain::normalize(shop)?;
    let credentials = backend.admin_session().await?;
    let created = backend
        .api()
        .create_tenant(&credentials, &shop, access_token.trim())
        .await;
    backend.end_session(&credentials).await;
    let tenant = created?;

    tracing::info!("Tenant created successfully! ID: {}, Shop: {}", tenant.id, tenant.shop_domain);
    Ok(())
}

/// Create a tenant together with its first user.
///
/// # Errors
///
/// Returns an error if the shop is invalid, sign-in fails, or the backend
/// rejects the tenant.
pub async fn init(backend: &Backend, shop: &str, email: &str, password: &str) -> Result<(), CliError> {
    let shop = ShopDomain::normalize(shop)?;
    let credentials = backend.admin_session().await?;
    let created = backend
        .api()
        .init_tenant(&credentials, &shop, email.trim(), password)
        .await;
    backend.end_session(&credentials).await;
    let created = created?;

    tracing::info!(
        "Tenant initialized! ID: {}, Shop: {}",
        created.tenant.id,
        created.tenant.shop_domain
    );
    if let Some(user) = created.user {
        tracing::info!("  First user: {} ({})", user.email, user.id);
    }
    tracing::info!("The user can now connect the shop from the dashboard login page.");
    Ok(())
}

/// Parse `--type` values; none means every data set.
fn parse_types(types: &[String]) -> Result<Vec<DataType>, CliError> {
    types
        .iter()
        .map(|t| {
            let t = t.trim().to_ascii_lowercase();
            DataType::parse(&t).ok_or(CliError::InvalidDataType(t))
        })
        .collect()
}

/// Start an ingestion run.
///
/// # Errors
///
/// Returns an error on an unknown data type, or if sign-in or the request
/// fails.
pub async fn ingest(backend: &Backend, tenant_id: &str, types: &[String]) -> Result<(), CliError> {
    let data_types = parse_types(types)?;
    let tenant = TenantId::new(tenant_id.trim());

    let credentials = backend.admin_session().await?;
    let accepted = backend
        .api()
        .ingest(&credentials, &tenant, &data_types)
        .await;
    backend.end_session(&credentials).await;
    let accepted = accepted?;

    tracing::info!(
        "{}",
        accepted
            .message
            .unwrap_or_else(|| "Ingestion started.".to_owned())
    );
    Ok(())
}

/// Report whether a shop is onboarded and connected.
///
/// # Errors
///
/// Returns an error if the shop is invalid or the request fails.
#[allow(clippy::print_stdout)]
pub async fn lookup(backend: &Backend, shop: &str) -> Result<(), CliError> {
    let shop = ShopDomain::normalize(shop)?;
    let lookup = backend.api().lookup_tenant(&shop).await?;

    match lookup.tenant.filter(|_| lookup.exists) {
        Some(tenant) if tenant.has_access_token => {
            println!("{shop}: tenant {} (connected)", tenant.id);
        }
        Some(tenant) => {
            println!("{shop}: tenant {} (needs Shopify connection)", tenant.id);
        }
        None => println!("{shop}: not found"),
    }
    Ok(())
}
