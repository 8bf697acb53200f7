// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - User profiles (subscription state)
//! - Usage records (prompt counters)
//!
//! The application never holds the authoritative copy of either record;
//! Firestore owns them and is responsible for concurrency control.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{SubscriptionStatus, SubscriptionTier, UsageRecord, UserProfile};
use crate::time_utils::format_utc_rfc3339;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Profile Operations ─────────────────────────────────

    /// Get a user profile by uid.
    ///
    /// `None` is a legitimate outcome: the account may exist at the
    /// identity provider before the first profile write lands.
    pub async fn get_user_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user profile.
    pub async fn upsert_user_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Mirror role/tier claims into the stored profile.
    ///
    /// Fetch-modify-write is acceptable here: the admin mutation path is
    /// low-frequency and idempotent, unlike the prompt counters.
    pub async fn mirror_profile_role(
        &self,
        uid: &str,
        status: SubscriptionStatus,
        tier: SubscriptionTier,
    ) -> Result<(), AppError> {
        let mut profile = self.get_user_profile(uid).await?.ok_or_else(|| {
            AppError::NotFound(format!("User profile {} not found", uid))
        })?;

        profile.subscription_status = status;
        profile.subscription_tier = tier;

        self.upsert_user_profile(&profile).await
    }

    // ─── Usage Record Operations ─────────────────────────────────

    /// Get the usage record for a user.
    pub async fn get_usage(&self, uid: &str) -> Result<Option<UsageRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USAGE)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a usage record (new account, window rollover).
    pub async fn set_usage(&self, record: &UsageRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USAGE)
            .document_id(&record.uid)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Atomically increment a user's consumed-prompt counter.
    ///
    /// This is a server-side field transform, never a read-modify-write
    /// round trip, so two concurrent requests from the same user (e.g.
    /// multiple tabs) both land: the counter increases by two.
    pub async fn increment_prompts_used(&self, uid: &str) -> Result<(), AppError> {
        let db = self.get_client()?;
        let writer = db
            .create_simple_batch_writer()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let mut batch = writer.new_batch();
        db.fluent()
            .update()
            .in_col(collections::USAGE)
            .document_id(uid)
            .transforms(|t| t.fields([t.field("prompts_used").increment(1)]))
            .only_transform()
            .add_to_batch(&mut batch)
            .map_err(|e| AppError::Database(e.to_string()))?;
        batch
            .write()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Refresh the last-login timestamp on an existing profile.
    pub async fn touch_last_login(&self, profile: &UserProfile) -> Result<UserProfile, AppError> {
        let mut updated = profile.clone();
        updated.last_login_at = format_utc_rfc3339(chrono::Utc::now());
        self.upsert_user_profile(&updated).await?;
        Ok(updated)
    }
}
