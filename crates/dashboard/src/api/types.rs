//! Request and response bodies of the analytics backend.
//!
//! Shapes follow the backend's JSON. Aggregate endpoints sometimes encode
//! numbers as strings (`"12"`, `"0.35"`), so numeric fields go through the
//! lenient deserializers in [`lenient`].

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use storepulse_core::{AdminId, ApiKeyId, ShopDomain, TenantId, UserId};

// =============================================================================
// Identity
// =============================================================================

/// User record embedded in `/admin/me` and `/tenant/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct MeUser {
    pub id: String,
    pub email: String,
}

/// Response of `GET /admin/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminMe {
    pub user: Option<MeUser>,
}

impl AdminMe {
    /// Admin ID of the session user, if any.
    #[must_use]
    pub fn admin_id(&self) -> Option<AdminId> {
        self.user.as_ref().map(|u| AdminId::new(u.id.clone()))
    }
}

/// Response of `GET /tenant/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantMe {
    pub user: MeUser,
    pub tenant: TenantSummary,
}

impl TenantMe {
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::new(self.user.id.clone())
    }
}

// =============================================================================
// Tenants
// =============================================================================

/// A tenant as returned by lookup, `/tenant/me`, and the tenant list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSummary {
    pub id: TenantId,
    pub shop_domain: ShopDomain,
    #[serde(default)]
    pub has_access_token: bool,
}

/// Response of `GET /tenant/lookup?shop=`.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantLookup {
    pub exists: bool,
    #[serde(default)]
    pub tenant: Option<TenantSummary>,
}

/// Body of `POST /tenants` (admin onboarding).
#[derive(Debug, Serialize)]
pub struct NewTenant<'a> {
    pub shop_domain: &'a str,
    pub access_token: &'a str,
}

/// Body of `POST /tenants/init` (tenant plus its first user, no token yet).
#[derive(Debug, Serialize)]
pub struct InitTenant<'a> {
    pub shop_domain: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `POST /tenants/init`.
#[derive(Debug, Clone, Deserialize)]
pub struct InitTenantResponse {
    pub tenant: TenantSummary,
    #[serde(default)]
    pub user: Option<TenantUser>,
}

/// Body of `POST /tenant/set-token`.
#[derive(Debug, Serialize)]
pub struct SetToken<'a> {
    pub access_token: &'a str,
}

/// A user account belonging to a tenant.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantUser {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One line of a tenant's ingestion log.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncLog {
    pub timestamp: String,
    pub level: String,
    pub message: String,
}

/// Entity totals for a tenant (`GET /tenants/:id/analytics`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantTotals {
    #[serde(default, deserialize_with = "lenient::u64")]
    pub total_customers: u64,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub total_products: u64,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub total_orders: u64,
}

/// Data sets an ingestion run can be limited to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Customers,
    Products,
    Orders,
}

impl DataType {
    pub const ALL: [Self; 3] = [Self::Customers, Self::Products, Self::Orders];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Products => "products",
            Self::Orders => "orders",
        }
    }

    /// Parse a form value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

/// Body of `POST /tenants/:id/ingest`.
#[derive(Debug, Serialize)]
pub struct IngestRequest<'a> {
    #[serde(skip_serializing_if = "<[DataType]>::is_empty")]
    pub data_types: &'a [DataType],
}

/// Response of `POST /tenants/:id/ingest`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestAccepted {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// API keys
// =============================================================================

/// Stored metadata of a tenant API key. Never contains the raw key.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyMeta {
    pub id: ApiKeyId,
    #[serde(default)]
    pub label: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub last_used_at: Option<String>,
    #[serde(default)]
    pub revoked_at: Option<String>,
}

impl ApiKeyMeta {
    #[must_use]
    pub const fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// Body of `POST /tenants/:id/api-keys`.
#[derive(Debug, Serialize)]
pub struct IssueApiKey<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'a str>,
}

/// A freshly issued key. The raw value exists only here, once.
#[derive(Debug, Deserialize)]
#[serde(from = "IssuedApiKeyBody")]
pub struct IssuedApiKey {
    pub id: Option<ApiKeyId>,
    pub label: Option<String>,
    pub api_key: SecretString,
}

#[derive(Deserialize)]
struct IssuedApiKeyBody {
    #[serde(default)]
    id: Option<ApiKeyId>,
    #[serde(default)]
    label: Option<String>,
    api_key: String,
}

impl From<IssuedApiKeyBody> for IssuedApiKey {
    fn from(body: IssuedApiKeyBody) -> Self {
        Self {
            id: body.id,
            label: body.label,
            api_key: SecretString::from(body.api_key),
        }
    }
}

// =============================================================================
// Auth & OAuth
// =============================================================================

/// Body of `POST /admin/login` and `POST /admin/bootstrap`.
#[derive(Debug, Serialize)]
pub struct AdminCredentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `GET /shopify/install?shop=`.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallLink {
    pub authorize_url: String,
    #[serde(default)]
    pub normalized_shop_domain: Option<String>,
}

// =============================================================================
// Analytics aggregates
// =============================================================================

/// Headline KPIs for a window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Kpis {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub total_revenue: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub total_orders: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub total_customers: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub average_order_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub new_customers: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub repeat_customer_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenuePoint {
    pub day: String,
    #[serde(deserialize_with = "lenient::f64")]
    pub revenue: f64,
    #[serde(deserialize_with = "lenient::f64")]
    pub orders: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub aov: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerGrowthPoint {
    pub day: String,
    #[serde(deserialize_with = "lenient::f64")]
    pub new_customers: f64,
    #[serde(deserialize_with = "lenient::f64")]
    pub cumulative_customers: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductGrowthPoint {
    pub day: String,
    #[serde(deserialize_with = "lenient::f64")]
    pub new_products: f64,
    #[serde(deserialize_with = "lenient::f64")]
    pub cumulative_products: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelPoint {
    pub day: String,
    #[serde(deserialize_with = "lenient::f64")]
    pub checkout_started: f64,
    #[serde(deserialize_with = "lenient::f64")]
    pub cart_abandoned: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub abandonment_rate: f64,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub conversion_rate: f64,
}

/// A daily series, as every metrics endpoint returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "P: Deserialize<'de>"))]
pub struct DailySeries<P> {
    #[serde(default)]
    pub daily: Vec<P>,
}

impl<P> DailySeries<P> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }
}

pub type RevenueOverTime = DailySeries<RevenuePoint>;
pub type CustomerGrowth = DailySeries<CustomerGrowthPoint>;
pub type ProductGrowth = DailySeries<ProductGrowthPoint>;
pub type EventsSummary = DailySeries<FunnelPoint>;

/// Deserializers that accept numbers, numeric strings, or null.
pub mod lenient {
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberLike {
        Number(f64),
        Text(String),
    }

    fn parse<E: Error>(value: NumberLike) -> Result<f64, E> {
        match value {
            NumberLike::Number(n) => Ok(n),
            NumberLike::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("expected a number, got {s:?}"))),
        }
    }

    /// Optional number; `null` and missing both become `None`.
    ///
    /// # Errors
    ///
    /// Fails on strings that are not numbers.
    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Option::<NumberLike>::deserialize(d)?.map(parse).transpose()
    }

    /// Number; `null` becomes `0`.
    ///
    /// # Errors
    ///
    /// Fails on strings that are not numbers.
    pub fn f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(opt_f64(d)?.unwrap_or_default())
    }

    /// Non-negative count; `null` becomes `0`, fractions are truncated.
    ///
    /// # Errors
    ///
    /// Fails on strings that are not numbers or on negative values.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let value = f64(d)?;
        if value < 0.0 {
            return Err(D::Error::custom(format!("expected a count, got {value}")));
        }
        Ok(value as u64)
    }
}
