//! CLI command implementations.

pub mod admin;
pub mod keys;
pub mod tenants;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use storepulse_dashboard::api::{ApiClient, ApiError, Credentials};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The backend rejected or failed the request.
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    /// An admin command ran without admin credentials.
    #[error("Admin credentials required: set SP_ADMIN_EMAIL and SP_ADMIN_PASSWORD")]
    MissingAdminCredentials,

    /// A shop domain could not be normalized.
    #[error("Invalid shop: {0}")]
    InvalidShop(#[from] storepulse_core::ShopDomainError),

    /// Unknown ingestion data set.
    #[error("Unknown data type: {0}. Valid types: customers, products, orders")]
    InvalidDataType(String),
}

/// The backend client plus the admin sign-in used by admin commands.
pub struct Backend {
    api: ApiClient,
    admin_email: Option<String>,
    admin_password: Option<SecretString>,
}

impl Backend {
    /// # Errors
    ///
    /// Returns an error if the backend URL is invalid.
    pub fn new(
        backend_url: &str,
        timeout_secs: u64,
        admin_email: Option<String>,
        admin_password: Option<String>,
    ) -> Result<Self, CliError> {
        let api = ApiClient::new(backend_url, Duration::from_secs(timeout_secs))?;
        Ok(Self {
            api,
            admin_email,
            admin_password: admin_password.map(SecretString::from),
        })
    }

    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Sign in as the configured admin and return the session credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if no admin credentials are configured or the
    /// backend rejects them.
    pub async fn admin_session(&self) -> Result<Credentials, CliError> {
        let (Some(email), Some(password)) = (&self.admin_email, &self.admin_password) else {
            return Err(CliError::MissingAdminCredentials);
        };
        tracing::debug!(email = %email, "Signing in as admin");
        Ok(self.api.admin_login(email, password.expose_secret()).await?)
    }

    /// Best-effort sign out; a failure only leaves a backend session to expire.
    pub async fn end_session(&self, credentials: &Credentials) {
        if let Err(e) = self.api.admin_logout(credentials).await {
            tracing::debug!(error = %e, "Admin logout failed");
        }
    }
}
