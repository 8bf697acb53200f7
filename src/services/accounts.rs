// SPDX-License-Identifier: MIT

//! Identity provider account administration.
//!
//! Writes role/tier custom claims through the provider's REST admin
//! surface. Access tokens come from the instance metadata server and
//! are cached until shortly before expiry.

use crate::error::AppError;
use crate::models::{SubscriptionStatus, SubscriptionTier};
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
// Refresh slightly before the token actually expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Custom claims written onto an identity by the role updater.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleClaims {
    pub role: SubscriptionStatus,
    pub tier: SubscriptionTier,
    /// When the claims were written (RFC3339)
    pub updated_at: String,
    /// uid of the admin who wrote them
    pub updated_by: String,
}

struct CachedAccessToken {
    token: String,
    expires_at: Instant,
}

/// Admin client for the identity provider.
pub struct IdentityAdmin {
    project_id: String,
    http: reqwest::Client,
    token_cache: RwLock<Option<CachedAccessToken>>,
    /// In-memory claims store used instead of the provider in tests.
    mock_claims: Option<Arc<DashMap<String, RoleClaims>>>,
}

impl IdentityAdmin {
    /// Create a live admin client for the given project.
    pub fn new(project_id: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| anyhow::anyhow!("failed building admin HTTP client: {}", e))?;

        Ok(Self {
            project_id: project_id.to_string(),
            http,
            token_cache: RwLock::new(None),
            mock_claims: None,
        })
    }

    /// Create a mock admin client backed by an in-memory claims map.
    pub fn new_mock() -> Self {
        Self {
            project_id: "mock-project".to_string(),
            http: reqwest::Client::new(),
            token_cache: RwLock::new(None),
            mock_claims: Some(Arc::new(DashMap::new())),
        }
    }

    /// Claims recorded by the mock, if this is a mock client.
    ///
    /// Tests use this to assert that failed requests never mutate claims.
    pub fn recorded_claims(&self, uid: &str) -> Option<RoleClaims> {
        self.mock_claims
            .as_ref()
            .and_then(|claims| claims.get(uid).map(|entry| entry.value().clone()))
    }

    /// Number of identities with recorded claims (mock only).
    pub fn recorded_claims_count(&self) -> usize {
        self.mock_claims.as_ref().map(|c| c.len()).unwrap_or(0)
    }

    /// Set role/tier custom claims on an identity.
    ///
    /// Safe to re-run with the same values: the provider overwrites the
    /// claim set wholesale, so a retry converges on the same state.
    pub async fn set_role_claims(&self, uid: &str, claims: &RoleClaims) -> Result<(), AppError> {
        if let Some(mock) = &self.mock_claims {
            mock.insert(uid.to_string(), claims.clone());
            return Ok(());
        }

        let custom_attributes = serde_json::json!({
            "role": claims.role.as_str(),
            "tier": claims.tier.as_str(),
            "updated_at": claims.updated_at,
            "updated_by": claims.updated_by,
        })
        .to_string();

        let body = serde_json::json!({
            "localId": uid,
            "customAttributes": custom_attributes,
        });

        let url = format!(
            "{}/projects/{}/accounts:update",
            IDENTITY_TOOLKIT_URL, self.project_id
        );

        let access_token = self.access_token().await?;

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("accounts:update failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::IdentityProvider(format!(
                "accounts:update returned status {}",
                response.status()
            )));
        }

        tracing::info!(
            uid = %uid,
            role = %claims.role,
            tier = %claims.tier,
            updated_by = %claims.updated_by,
            "Custom claims updated"
        );

        Ok(())
    }

    /// Fetch (or reuse) a service-account access token from the
    /// metadata server.
    async fn access_token(&self) -> Result<String, AppError> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache
                .as_ref()
                .filter(|entry| entry.expires_at > Instant::now())
            {
                return Ok(cached.token.clone());
            }
        }

        let response = self
            .http
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| {
                AppError::IdentityProvider(format!("metadata token request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::IdentityProvider(format!(
                "metadata token request returned status {}",
                response.status()
            )));
        }

        let token: MetadataToken = response.json().await.map_err(|e| {
            AppError::IdentityProvider(format!("invalid metadata token JSON: {}", e))
        })?;

        let lifetime = Duration::from_secs(token.expires_in)
            .saturating_sub(TOKEN_EXPIRY_MARGIN);

        *self.token_cache.write().await = Some(CachedAccessToken {
            token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        tracing::debug!(expires_in = token.expires_in, "Access token refreshed");

        Ok(token.access_token)
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_utils::format_utc_rfc3339;

    fn claims(role: SubscriptionStatus, tier: SubscriptionTier) -> RoleClaims {
        RoleClaims {
            role,
            tier,
            updated_at: format_utc_rfc3339(chrono::Utc::now()),
            updated_by: "admin-1".to_string(),
        }
    }

    #[tokio::test]
    async fn mock_records_claims() {
        let admin = IdentityAdmin::new_mock();
        let wanted = claims(SubscriptionStatus::Active, SubscriptionTier::Pro);

        admin.set_role_claims("user-1", &wanted).await.unwrap();

        assert_eq!(admin.recorded_claims("user-1"), Some(wanted));
        assert_eq!(admin.recorded_claims("user-2"), None);
    }

    #[tokio::test]
    async fn rerun_with_same_values_converges() {
        let admin = IdentityAdmin::new_mock();
        let wanted = claims(SubscriptionStatus::Founder, SubscriptionTier::Founder);

        admin.set_role_claims("user-1", &wanted).await.unwrap();
        admin.set_role_claims("user-1", &wanted).await.unwrap();

        assert_eq!(admin.recorded_claims_count(), 1);
        assert_eq!(admin.recorded_claims("user-1"), Some(wanted));
    }
}
