//! Shopify shop domain handling.
//!
//! Tenants are identified by their `*.myshopify.com` domain. Users type all
//! sorts of things into the shop field ("acme", "ACME.myshopify.com ",
//! "shop.acme.com"), so input goes through [`ShopDomain::normalize`] first.
//! Flows that need a canonical tenant domain then call
//! [`ShopDomain::require_canonical`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// Domain suffix every canonical Shopify shop carries.
pub const SHOPIFY_DOMAIN_SUFFIX: &str = ".myshopify.com";

/// Errors produced while interpreting a shop identifier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// Nothing was entered.
    #[error("Enter a shop domain")]
    Empty,
    /// The domain does not end with `.myshopify.com`.
    #[error("Shop domain must end with .myshopify.com")]
    NotShopify,
}

/// A normalized (trimmed, lowercased) shop domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Normalize raw user input into a shop domain.
    ///
    /// Rules, applied after trimming and lowercasing:
    /// - already ends with `.myshopify.com`: kept as is
    /// - contains any other dot: passed through unchanged (custom domain)
    /// - bare store name: `.myshopify.com` is appended
    ///
    /// ```
    /// use storepulse_core::ShopDomain;
    ///
    /// assert_eq!(ShopDomain::normalize("mystore").unwrap().as_str(), "mystore.myshopify.com");
    /// assert_eq!(
    ///     ShopDomain::normalize("mystore.myshopify.com").unwrap().as_str(),
    ///     "mystore.myshopify.com"
    /// );
    /// assert_eq!(ShopDomain::normalize("shop.acme.com").unwrap().as_str(), "shop.acme.com");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ShopDomainError::Empty`] if nothing remains after trimming.
    pub fn normalize(raw: &str) -> Result<Self, ShopDomainError> {
        let value = raw.trim().to_lowercase();
        if value.is_empty() {
            return Err(ShopDomainError::Empty);
        }
        if value.ends_with(SHOPIFY_DOMAIN_SUFFIX) || value.contains('.') {
            return Ok(Self(value));
        }
        Ok(Self(format!("{value}{SHOPIFY_DOMAIN_SUFFIX}")))
    }

    /// Normalize and require the canonical `.myshopify.com` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`ShopDomainError::Empty`] for blank input and
    /// [`ShopDomainError::NotShopify`] for custom domains.
    pub fn require_canonical(raw: &str) -> Result<Self, ShopDomainError> {
        let shop = Self::normalize(raw)?;
        if shop.is_canonical() {
            Ok(shop)
        } else {
            Err(ShopDomainError::NotShopify)
        }
    }

    /// Whether this domain carries the canonical Shopify suffix with a
    /// non-empty store name in front of it.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.store_name().is_some()
    }

    /// The store handle (`acme` for `acme.myshopify.com`), if canonical.
    #[must_use]
    pub fn store_name(&self) -> Option<&str> {
        self.0
            .strip_suffix(SHOPIFY_DOMAIN_SUFFIX)
            .filter(|name| !name.is_empty())
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
