// SPDX-License-Identifier: MIT

//! Client-side session store.
//!
//! Holds the current authenticated identity plus a cached projection of
//! subscription tier and usage counters, and notifies dependent views
//! through a watch channel. Transitions are driven exclusively by the
//! identity provider's auth-state-change events.

use crate::models::SubscriptionTier;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Identity as seen by the client session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Auth-state-change notification from the identity provider.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(SessionIdentity),
    SignedOut,
}

/// Cached usage counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageCounters {
    pub used: u32,
    pub limit: u32,
    pub unlimited: bool,
}

/// Profile + usage projection fetched from the API.
#[derive(Debug, Clone, PartialEq)]
pub struct UserData {
    pub tier: SubscriptionTier,
    pub usage: UsageCounters,
}

/// Observable session state.
///
/// After a sign-in and before the user-data fetch resolves, `tier` and
/// `usage` hold the provisional "free tier, zero usage" defaults; they
/// are a display fallback, not an authorization decision.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub loading: bool,
    pub identity: Option<SessionIdentity>,
    pub tier: SubscriptionTier,
    pub usage: UsageCounters,
}

impl SessionSnapshot {
    /// State before the first auth-state event arrives.
    pub fn initial() -> Self {
        Self {
            loading: true,
            identity: None,
            tier: SubscriptionTier::Free,
            usage: UsageCounters::default(),
        }
    }

    fn unauthenticated() -> Self {
        Self {
            loading: false,
            ..Self::initial()
        }
    }
}

/// Fetches the caller's profile/usage projection from the API.
pub trait UserDataSource: Send + Sync {
    fn fetch_user_data(&self, uid: &str) -> BoxFuture<'static, anyhow::Result<UserData>>;
}

/// Provider-side session operations.
pub trait AuthGateway: Send + Sync {
    fn sign_out(&self) -> BoxFuture<'static, anyhow::Result<()>>;
}

/// Client session store.
pub struct SessionStore {
    source: Arc<dyn UserDataSource>,
    gateway: Arc<dyn AuthGateway>,
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    pub fn new(source: Arc<dyn UserDataSource>, gateway: Arc<dyn AuthGateway>) -> Arc<Self> {
        let (tx, _) = watch::channel(SessionSnapshot::initial());
        Arc::new(Self {
            source,
            gateway,
            tx,
        })
    }

    /// Subscribe to session-state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Drive the store from provider auth-state events.
    ///
    /// Returns when the event stream closes (the provider subscription
    /// was torn down); dropping the sender is the unsubscribe.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<AuthEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
    }

    /// Apply one auth-state event.
    pub fn handle_event(self: &Arc<Self>, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(identity) => {
                self.tx.send_modify(|state| {
                    state.loading = false;
                    state.identity = Some(identity);
                    // Provisional until the fetch below resolves.
                    state.tier = SubscriptionTier::Free;
                    state.usage = UsageCounters::default();
                });

                let store = self.clone();
                tokio::spawn(async move {
                    if let Err(e) = store.refresh_user_data().await {
                        tracing::warn!(error = %e, "User data fetch failed");
                    }
                });
            }
            AuthEvent::SignedOut => {
                self.tx
                    .send_modify(|state| *state = SessionSnapshot::unauthenticated());
            }
        }
    }

    /// Re-fetch the profile/usage projection for the current identity.
    ///
    /// Idempotent and safe to call repeatedly. Concurrent calls race
    /// benignly: each applies its result only if the identity that
    /// started the fetch is still signed in, and the last writer wins.
    pub async fn refresh_user_data(&self) -> anyhow::Result<()> {
        let Some(identity) = self.snapshot().identity else {
            return Ok(());
        };

        let data = self.source.fetch_user_data(&identity.uid).await?;

        self.tx.send_modify(|state| {
            if state.identity.as_ref().map(|i| i.uid.as_str()) == Some(identity.uid.as_str()) {
                state.tier = data.tier;
                state.usage = data.usage;
            }
        });

        Ok(())
    }

    /// Sign out at the provider and reset local state.
    ///
    /// The local reset is unconditional: a failed provider call must
    /// not leave the UI stuck in a signed-in state.
    pub async fn sign_out(&self) {
        if let Err(e) = self.gateway.sign_out().await {
            tracing::warn!(error = %e, "Provider sign-out failed");
        }

        self.tx
            .send_modify(|state| *state = SessionSnapshot::unauthenticated());
    }
}
