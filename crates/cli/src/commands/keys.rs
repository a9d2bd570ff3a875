//! Tenant API key commands.

use secrecy::ExposeSecret;
use storepulse_core::{ApiKeyId, TenantId};

use super::{Backend, CliError};

/// Print a tenant's keys.
///
/// # Errors
///
/// Returns an error if sign-in or the request fails.
#[allow(clippy::print_stdout)]
pub async fn list(backend: &Backend, tenant_id: &str) -> Result<(), CliError> {
    let tenant = TenantId::new(tenant_id.trim());
    let credentials = backend.admin_session().await?;
    let keys = backend.api().list_api_keys(&credentials, &tenant).await;
    backend.end_session(&credentials).await;

    for key in keys? {
        let status = key
            .revoked_at
            .as_deref()
            .map_or_else(|| "active".to_owned(), |at| format!("revoked {at}"));
        println!(
            "{}\t{}\tcreated {}\t{status}",
            key.id,
            key.label.as_deref().unwrap_or("-"),
            key.created_at
        );
    }
    Ok(())
}

/// Issue a key and print its raw value. The backend never returns it again.
///
/// # Errors
///
/// Returns an error if sign-in or the request fails.
#[allow(clippy::print_stdout)]
pub async fn issue(backend: &Backend, tenant_id: &str, label: Option<&str>) -> Result<(), CliError> {
    let tenant = TenantId::new(tenant_id.trim());
    let label = label.map(str::trim).filter(|l| !l.is_empty());

    let credentials = backend.admin_session().await?;
    let issued = backend
        .api()
        .issue_api_key(&credentials, &tenant, label)
        .await;
    backend.end_session(&credentials).await;
    let issued = issued?;

    tracing::info!("API key issued for tenant {tenant}. Copy it now; it will not be shown again.");
    println!("{}", issued.api_key.expose_secret());
    Ok(())
}

/// Revoke a key.
///
/// # Errors
///
/// Returns an error if sign-in or the request fails.
pub async fn revoke(backend: &Backend, tenant_id: &str, key_id: &str) -> Result<(), CliError> {
    let tenant = TenantId::new(tenant_id.trim());
    let key = ApiKeyId::new(key_id.trim());

    let credentials = backend.admin_session().await?;
    let revoked = backend
        .api()
        .revoke_api_key(&credentials, &tenant, &key)
        .await;
    backend.end_session(&credentials).await;
    revoked?;

    tracing::info!("API key {key} revoked");
    Ok(())
}
