//! Analytics backend client.
//!
//! This module provides:
//! - [`ApiClient`] with one method per backend endpoint
//! - [`Credentials`] attached per request (Basic auth or forwarded session)
//! - [`ApiError`], the single error shape for every failed call
//! - Request/response bodies in [`types`]

mod client;
mod credentials;
mod error;
pub mod types;

pub use client::ApiClient;
pub use credentials::{Credentials, TenantCredential};
pub use error::ApiError;
