//! Tenant connect/login flow.
//!
//! A tenant user finds their shop, signs in with the credentials their admin
//! gave them and, if the shop has no Shopify access token yet, authorizes
//! the app on Shopify. The flow lives in the browser's session between
//! requests; each operation takes the backend client and cache explicitly.
//!
//! ```text
//! Idle -> Searching -> NotFound
//!                   -> Found ------------------------------> (login) Authenticated
//!                   -> NeedsConnect(AwaitingLogin)
//!                        -> (login)   NeedsConnect(ReadyToConnect)
//!                        -> (connect) NeedsConnect(PendingRecheck)
//!                        -> (recheck, token present) Authenticated
//! ```

use serde::{Deserialize, Serialize};
use storepulse_core::{ShopDomain, TenantId};
use tracing::{info, instrument, warn};

use crate::api::types::TenantSummary;
use crate::api::{ApiClient, ApiError, TenantCredential};
use crate::cache::QueryCache;

/// Shown when a recheck finds the shop still without a token.
pub const STILL_NOT_CONNECTED: &str =
    "Still not connected. Finish the Shopify authorization then click Recheck.";

/// Where the tenant is in connecting their shop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    Idle,
    Searching {
        shop: ShopDomain,
    },
    /// No tenant exists for the shop. Only a new lookup leaves this state.
    NotFound {
        shop: ShopDomain,
    },
    /// The tenant exists and already holds an access token.
    Found {
        tenant: TenantSummary,
    },
    /// The tenant exists but has no access token yet.
    NeedsConnect {
        tenant: TenantSummary,
        stage: ConnectStage,
    },
}

/// Progress through connecting a token-less tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ConnectStage {
    AwaitingLogin,
    ReadyToConnect,
    /// Shopify authorization was launched; completion is confirmed by a recheck.
    PendingRecheck {
        authorize_url: String,
    },
}

/// What the caller should do after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Re-render the flow.
    Stay,
    /// Open the Shopify authorization URL in a new browsing context.
    OpenAuthorizeUrl(String),
    /// The tenant user is signed in to a connected shop.
    Authenticated { tenant_id: TenantId },
}

/// Connect/login flow for one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectFlow {
    state: FlowState,
    error: Option<String>,
    credential: Option<TenantCredential>,
}

impl ConnectFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &FlowState {
        &self.state
    }

    /// The last operation's user-facing error, if it failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Login held for follow-up calls (connect, recheck, set token).
    #[must_use]
    pub const fn credential(&self) -> Option<&TenantCredential> {
        self.credential.as_ref()
    }

    /// Hand over the held login once the flow is complete.
    pub const fn take_credential(&mut self) -> Option<TenantCredential> {
        self.credential.take()
    }

    /// The tenant found by the last lookup.
    #[must_use]
    pub const fn tenant(&self) -> Option<&TenantSummary> {
        match &self.state {
            FlowState::Found { tenant } | FlowState::NeedsConnect { tenant, .. } => Some(tenant),
            _ => None,
        }
    }

    /// Whether the login form applies to the current state.
    #[must_use]
    pub const fn can_login(&self) -> bool {
        matches!(
            self.state,
            FlowState::Found { .. } | FlowState::NeedsConnect { .. }
        )
    }

    fn fail(&mut self, message: impl Into<String>) -> FlowOutcome {
        self.error = Some(message.into());
        FlowOutcome::Stay
    }

    /// Find the tenant for a shop.
    ///
    /// Input is normalized and must end up as a `*.myshopify.com` domain. A
    /// new lookup discards any login held from a previous one.
    #[instrument(skip(self, api))]
    pub async fn lookup(&mut self, api: &ApiClient, raw_shop: &str) -> FlowOutcome {
        self.error = None;
        self.credential = None;

        let shop = match ShopDomain::require_canonical(raw_shop) {
            Ok(shop) => shop,
            Err(e) => {
                self.state = FlowState::Idle;
                return self.fail(e.to_string());
            }
        };

        self.state = FlowState::Searching { shop: shop.clone() };
        match api.lookup_tenant(&shop).await {
            Ok(lookup) if !lookup.exists => {
                self.state = FlowState::NotFound { shop };
                FlowOutcome::Stay
            }
            Ok(lookup) => match lookup.tenant {
                Some(tenant) if tenant.has_access_token => {
                    self.state = FlowState::Found { tenant };
                    FlowOutcome::Stay
                }
                Some(tenant) => {
                    self.state = FlowState::NeedsConnect {
                        tenant,
                        stage: ConnectStage::AwaitingLogin,
                    };
                    FlowOutcome::Stay
                }
                None => {
                    warn!(shop = %shop, "Lookup reported an existing tenant without details");
                    self.state = FlowState::Idle;
                    self.fail("Lookup failed")
                }
            },
            Err(e) => {
                self.state = FlowState::Idle;
                self.fail(e.user_message())
            }
        }
    }

    /// Sign in as a tenant user with Basic credentials.
    ///
    /// On failure the held login is dropped and the state is unchanged.
    #[instrument(skip(self, api, cache, password))]
    pub async fn login(
        &mut self,
        api: &ApiClient,
        cache: &QueryCache,
        email: &str,
        password: &str,
    ) -> FlowOutcome {
        self.error = None;
        if !self.can_login() {
            return self.fail("Look up your shop first.");
        }
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            self.credential = None;
            return self.fail("Enter your email and password.");
        }

        let credential = TenantCredential::new(email, password);
        let me = match api.tenant_me(&credential.credentials()).await {
            Ok(me) => me,
            Err(e) => {
                self.credential = None;
                return self.fail(login_failure(&e));
            }
        };

        cache.invalidate_tenant(&me.tenant.id);
        self.credential = Some(credential);
        info!(tenant_id = %me.tenant.id, "Tenant user signed in");

        if me.tenant.has_access_token {
            let tenant_id = me.tenant.id.clone();
            self.state = FlowState::Found { tenant: me.tenant };
            FlowOutcome::Authenticated { tenant_id }
        } else {
            self.state = FlowState::NeedsConnect {
                tenant: me.tenant,
                stage: ConnectStage::ReadyToConnect,
            };
            FlowOutcome::Stay
        }
    }

    /// Start Shopify authorization for a token-less tenant.
    ///
    /// Does not wait for the user to finish on Shopify; completion is picked
    /// up by [`ConnectFlow::recheck`].
    #[instrument(skip(self, api))]
    pub async fn connect(&mut self, api: &ApiClient) -> FlowOutcome {
        self.error = None;
        let FlowState::NeedsConnect { tenant, stage } = &mut self.state else {
            return self.fail("This shop does not need connecting.");
        };

        match api.shopify_install(&tenant.shop_domain).await {
            Ok(link) => {
                *stage = ConnectStage::PendingRecheck {
                    authorize_url: link.authorize_url.clone(),
                };
                FlowOutcome::OpenAuthorizeUrl(link.authorize_url)
            }
            Err(e) => self.fail(e.user_message()),
        }
    }

    /// Check whether Shopify authorization has completed.
    #[instrument(skip(self, api, cache))]
    pub async fn recheck(&mut self, api: &ApiClient, cache: &QueryCache) -> FlowOutcome {
        self.error = None;
        if !matches!(
            self.state,
            FlowState::NeedsConnect {
                stage: ConnectStage::PendingRecheck { .. },
                ..
            }
        ) {
            return self.fail("Connect with Shopify before rechecking.");
        }
        let Some(credential) = &self.credential else {
            return self.fail("Log in before rechecking.");
        };

        match api.tenant_me(&credential.credentials()).await {
            Ok(me) if me.tenant.has_access_token => {
                cache.invalidate_tenant(&me.tenant.id);
                info!(tenant_id = %me.tenant.id, "Shopify connection confirmed");
                let tenant_id = me.tenant.id.clone();
                self.state = FlowState::Found { tenant: me.tenant };
                FlowOutcome::Authenticated { tenant_id }
            }
            Ok(_) => self.fail(STILL_NOT_CONNECTED),
            Err(e) => self.fail(e.user_message()),
        }
    }

    /// Attach an access token by hand instead of going through Shopify
    /// authorization.
    #[instrument(skip(self, api, cache, access_token))]
    pub async fn set_token(
        &mut self,
        api: &ApiClient,
        cache: &QueryCache,
        access_token: &str,
    ) -> FlowOutcome {
        self.error = None;
        let FlowState::NeedsConnect { tenant, .. } = &self.state else {
            return self.fail("This shop does not need connecting.");
        };
        let Some(credential) = &self.credential else {
            return self.fail("Log in before setting a token.");
        };
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return self.fail("Enter an access token.");
        }

        match api.set_token(&credential.credentials(), access_token).await {
            Ok(()) => {
                let mut tenant = tenant.clone();
                cache.invalidate_tenant(&tenant.id);
                info!(tenant_id = %tenant.id, "Access token attached");
                tenant.has_access_token = true;
                let tenant_id = tenant.id.clone();
                self.state = FlowState::Found { tenant };
                FlowOutcome::Authenticated { tenant_id }
            }
            Err(e) => self.fail(e.user_message()),
        }
    }

    /// Start over.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn login_failure(err: &ApiError) -> String {
    if err.is_unauthorized() && matches!(err, ApiError::Http { body: None, .. }) {
        "Invalid email or password.".to_owned()
    } else {
        err.user_message()
    }
}
