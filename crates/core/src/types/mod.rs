//! Core types for StorePulse.
//!
//! This module provides type-safe wrappers for the backend's domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod shop;
pub mod window;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::{AdminIdentity, Identity, TenantIdentity};
pub use shop::{SHOPIFY_DOMAIN_SUFFIX, ShopDomain, ShopDomainError};
pub use window::AnalyticsWindow;
