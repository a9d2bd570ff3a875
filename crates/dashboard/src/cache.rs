//! In-process query cache for backend reads.
//!
//! Every cached read is named by a [`QueryKey`] and scoped to an
//! [`Audience`], so an admin looking at a tenant and the tenant's own user
//! never share entries. Concurrent loads of the same key are coalesced by
//! `moka`; failed loads are not cached.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use storepulse_core::{AnalyticsWindow, TenantId};
use tracing::{debug, error};

use crate::api::ApiError;
use crate::api::types::{
    ApiKeyMeta, CustomerGrowth, EventsSummary, Kpis, ProductGrowth, RevenueOverTime, SyncLog,
    TenantSummary, TenantTotals, TenantUser,
};

/// Who a cached response was fetched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Audience {
    Admin,
    Tenant,
}

/// A cacheable backend read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Tenants,
    TenantTotals(TenantId),
    SyncLogs(TenantId),
    ApiKeys(TenantId),
    TenantUsers(TenantId),
    Kpis(TenantId, AnalyticsWindow),
    RevenueOverTime(TenantId, AnalyticsWindow),
    CustomerGrowth(TenantId, AnalyticsWindow),
    ProductGrowth(TenantId, AnalyticsWindow),
    EventsSummary(TenantId, AnalyticsWindow),
}

impl QueryKey {
    /// Tenant this read belongs to, if it is tenant-scoped.
    #[must_use]
    pub const fn tenant(&self) -> Option<&TenantId> {
        match self {
            Self::Tenants => None,
            Self::TenantTotals(t)
            | Self::SyncLogs(t)
            | Self::ApiKeys(t)
            | Self::TenantUsers(t)
            | Self::Kpis(t, _)
            | Self::RevenueOverTime(t, _)
            | Self::CustomerGrowth(t, _)
            | Self::ProductGrowth(t, _)
            | Self::EventsSummary(t, _) => Some(t),
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Tenants => "tenants",
            Self::TenantTotals(_) => "tenant-totals",
            Self::SyncLogs(_) => "sync-logs",
            Self::ApiKeys(_) => "api-keys",
            Self::TenantUsers(_) => "tenant-users",
            Self::Kpis(..) => "kpis",
            Self::RevenueOverTime(..) => "revenue-over-time",
            Self::CustomerGrowth(..) => "customer-growth",
            Self::ProductGrowth(..) => "product-growth",
            Self::EventsSummary(..) => "events-summary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    audience: Audience,
    query: QueryKey,
}

/// Cached response bodies.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Tenants(Arc<Vec<TenantSummary>>),
    TenantTotals(Arc<TenantTotals>),
    SyncLogs(Arc<Vec<SyncLog>>),
    ApiKeys(Arc<Vec<ApiKeyMeta>>),
    TenantUsers(Arc<Vec<TenantUser>>),
    Kpis(Arc<Kpis>),
    RevenueOverTime(Arc<RevenueOverTime>),
    CustomerGrowth(Arc<CustomerGrowth>),
    ProductGrowth(Arc<ProductGrowth>),
    EventsSummary(Arc<EventsSummary>),
}

/// A response type that can live in the [`QueryCache`].
pub trait Cacheable: Sized {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: CachedValue) -> Option<Arc<Self>>;
}

macro_rules! cacheable {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl Cacheable for $ty {
                fn into_cached(self) -> CachedValue {
                    CachedValue::$variant(Arc::new(self))
                }

                fn from_cached(value: CachedValue) -> Option<Arc<Self>> {
                    match value {
                        CachedValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )+
    };
}

cacheable! {
    Vec<TenantSummary> => Tenants,
    TenantTotals => TenantTotals,
    Vec<SyncLog> => SyncLogs,
    Vec<ApiKeyMeta> => ApiKeys,
    Vec<TenantUser> => TenantUsers,
    Kpis => Kpis,
    RevenueOverTime => RevenueOverTime,
    CustomerGrowth => CustomerGrowth,
    ProductGrowth => ProductGrowth,
    EventsSummary => EventsSummary,
}

/// Keyed fetch-and-cache for backend reads.
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<CacheKey, CachedValue>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl QueryCache {
    /// Create a cache holding at most `capacity` responses for `ttl` each.
    #[must_use]
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();
        Self { inner }
    }

    /// Return the cached response for `key`, or run `loader` and cache its
    /// result.
    ///
    /// # Errors
    ///
    /// Returns the loader's error. Errors are shared with every caller that
    /// was waiting on the same load and are not cached.
    pub async fn get_or_fetch<T, F>(
        &self,
        audience: Audience,
        key: QueryKey,
        loader: F,
    ) -> Result<Arc<T>, ApiError>
    where
        T: Cacheable,
        F: Future<Output = Result<T, ApiError>>,
    {
        let name = key.name();
        let value = self
            .inner
            .try_get_with(CacheKey { audience, query: key }, async move {
                debug!(query = name, ?audience, "Query cache miss");
                loader.await.map(T::into_cached)
            })
            .await
            .map_err(|e| (*e).clone())?;

        T::from_cached(value).ok_or_else(|| {
            error!(query = name, "Cached value has unexpected type");
            ApiError::Decode(format!("cached {name} entry has unexpected type"))
        })
    }

    /// Drop `key` for both audiences.
    pub async fn invalidate(&self, key: &QueryKey) {
        for audience in [Audience::Admin, Audience::Tenant] {
            self.inner
                .invalidate(&CacheKey {
                    audience,
                    query: key.clone(),
                })
                .await;
        }
        debug!(query = key.name(), "Query invalidated");
    }

    /// Drop every tenant-scoped entry for `tenant`, for both audiences.
    pub fn invalidate_tenant(&self, tenant: &TenantId) {
        let tenant = tenant.clone();
        let id = tenant.to_string();
        if let Err(e) = self
            .inner
            .invalidate_entries_if(move |key, _| key.query.tenant() == Some(&tenant))
        {
            // Only fails when closures are unsupported; fall back to a full flush.
            error!(error = %e, tenant_id = %id, "Tenant invalidation failed, clearing cache");
            self.invalidate_all();
            return;
        }
        debug!(tenant_id = %id, "Tenant queries invalidated");
    }

    /// Drop everything.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn cache() -> QueryCache {
        QueryCache::new(100, Duration::from_secs(60))
    }

    fn totals(orders: u64) -> TenantTotals {
        TenantTotals {
            total_orders: orders,
            ..TenantTotals::default()
        }
    }

    async fn load_totals(
        cache: &QueryCache,
        audience: Audience,
        tenant: &str,
        calls: &AtomicUsize,
    ) -> Arc<TenantTotals> {
        cache
            .get_or_fetch(audience, QueryKey::TenantTotals(TenantId::new(tenant)), async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok(totals(n as u64))
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_second_read_is_cached() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        load_totals(&cache, Audience::Tenant, "t-1", &calls).await;
        let again = load_totals(&cache, Audience::Tenant, "t-1", &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(again.total_orders, 0);
    }

    #[tokio::test]
    async fn test_audiences_do_not_share_entries() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        load_totals(&cache, Audience::Tenant, "t-1", &calls).await;
        load_totals(&cache, Audience::Admin, "t-1", &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_loads_are_coalesced() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let load = || {
            cache.get_or_fetch(Audience::Tenant, QueryKey::Tenants, async {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(Vec::<TenantSummary>::new())
            })
        };
        let (a, b) = tokio::join!(load(), load());
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = cache();
        let err = cache
            .get_or_fetch::<TenantTotals, _>(
                Audience::Admin,
                QueryKey::TenantTotals(TenantId::new("t-1")),
                async { Err(ApiError::Network("refused".to_owned())) },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));

        let calls = AtomicUsize::new(0);
        load_totals(&cache, Audience::Admin, "t-1", &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_tenant_clears_both_audiences_only_for_that_tenant() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        load_totals(&cache, Audience::Tenant, "t-1", &calls).await;
        load_totals(&cache, Audience::Admin, "t-1", &calls).await;
        load_totals(&cache, Audience::Admin, "t-2", &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cache.invalidate_tenant(&TenantId::new("t-1"));

        load_totals(&cache, Audience::Tenant, "t-1", &calls).await;
        load_totals(&cache, Audience::Admin, "t-1", &calls).await;
        load_totals(&cache, Audience::Admin, "t-2", &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_invalidate_single_key() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        load_totals(&cache, Audience::Admin, "t-1", &calls).await;
        cache
            .invalidate(&QueryKey::TenantTotals(TenantId::new("t-1")))
            .await;
        load_totals(&cache, Audience::Admin, "t-1", &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        load_totals(&cache, Audience::Admin, "t-1", &calls).await;
        load_totals(&cache, Audience::Tenant, "t-2", &calls).await;
        cache.invalidate_all();
        load_totals(&cache, Audience::Admin, "t-1", &calls).await;
        load_totals(&cache, Audience::Tenant, "t-2", &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_tenant_scope_of_keys() {
        let tenant = TenantId::new("t-1");
        assert_eq!(QueryKey::Tenants.tenant(), None);
        assert_eq!(
            QueryKey::Kpis(tenant.clone(), AnalyticsWindow::default()).tenant(),
            Some(&tenant)
        );
    }
}
