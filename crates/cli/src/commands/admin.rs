//! Platform admin account commands.
//!
//! # Usage
//!
//! ```bash
//! sp-cli admin bootstrap -e admin@example.com -p 'secret'
//! ```

use storepulse_core::Email;

use super::{Backend, CliError};

/// Create the first admin account, then confirm it can sign in.
///
/// # Errors
///
/// Returns an error if an admin already exists or the request fails.
pub async fn bootstrap(backend: &Backend, email: &str, password: &str) -> Result<(), CliError> {
    if Email::parse(email).is_err() {
        tracing::warn!("{email} does not look like an email address; sending anyway");
    }

    tracing::info!("Creating first admin: {email}");
    backend.api().admin_bootstrap(email, password).await?;

    let credentials = backend.api().admin_login(email, password).await?;
    backend.end_session(&credentials).await;

    tracing::info!("Admin created successfully! Sign in at /login with {email}");
    Ok(())
}
