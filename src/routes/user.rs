// SPDX-License-Identifier: MIT

//! API routes for the authenticated user's own profile and usage.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{SubscriptionStatus, SubscriptionTier, TrialInfo, UsageRecord, UsageView, UserProfile};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

/// User routes (require authentication).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user/profile", get(get_profile))
        .route("/api/user/profile/init", post(init_profile))
        .route("/api/user/usage/consume", post(consume_prompt))
}

// ─── Profile ─────────────────────────────────────────────────

/// Profile portion of the response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUser {
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_tier: SubscriptionTier,
    pub trial: TrialInfo,
}

/// Combined profile + usage response.
#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: ProfileUser,
    /// Absent when no usage record has been written yet
    pub usage: Option<UsageView>,
}

fn profile_response(profile: UserProfile, usage: Option<UsageRecord>) -> ProfileResponse {
    let now = Utc::now();
    let tier = profile.subscription_tier;

    ProfileResponse {
        usage: usage.map(|record| UsageView::project(&record, tier, now)),
        user: ProfileUser {
            email: profile.email.clone(),
            display_name: profile.display_name.clone(),
            photo_url: profile.photo_url.clone(),
            subscription_status: profile.subscription_status,
            subscription_tier: profile.subscription_tier,
            trial: profile.trial_info(now),
        },
    }
}

/// Get the caller's profile and usage view.
///
/// A missing profile is a 404, never a zero-valued default: the client
/// reacts by running profile init, and a silent default would mask a
/// failed first-login write.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .db
        .get_user_profile(user.uid())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User profile {} not found", user.uid())))?;

    let usage = state.db.get_usage(user.uid()).await?;

    Ok(Json(profile_response(profile, usage)))
}

/// Create the caller's profile and usage record on first login.
///
/// Idempotent: an existing profile only gets its last-login timestamp
/// refreshed and is returned unchanged otherwise.
async fn init_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let uid = user.uid();

    if let Some(existing) = state.db.get_user_profile(uid).await? {
        let profile = state.db.touch_last_login(&existing).await?;

        let usage = match state.db.get_usage(uid).await? {
            Some(record) => Some(record),
            None => {
                // Profile without a usage record: a previous init was
                // interrupted between the two writes. Complete it.
                let record = UsageRecord::new_window(
                    uid,
                    state.config.default_prompt_limit,
                    Utc::now(),
                );
                state.db.set_usage(&record).await?;
                Some(record)
            }
        };

        return Ok(Json(profile_response(profile, usage)));
    }

    let now = Utc::now();
    let profile = UserProfile {
        uid: uid.to_string(),
        email: user.identity.email.clone(),
        display_name: user.identity.display_name.clone(),
        photo_url: user.identity.photo_url.clone(),
        subscription_status: SubscriptionStatus::Trial,
        subscription_tier: SubscriptionTier::Free,
        trial_start: Some(format_utc_rfc3339(now)),
        trial_end: Some(format_utc_rfc3339(now + Duration::days(state.config.trial_days))),
        payment_failed_at: None,
        payment_grace_period_end: None,
        created_at: format_utc_rfc3339(now),
        last_login_at: format_utc_rfc3339(now),
    };

    state.db.upsert_user_profile(&profile).await?;

    let record = UsageRecord::new_window(uid, state.config.default_prompt_limit, now);
    state.db.set_usage(&record).await?;

    tracing::info!(uid = %uid, "User profile initialized");

    Ok(Json(profile_response(profile, Some(record))))
}

// ─── Usage Consumption ───────────────────────────────────────

/// Consume one prompt from the caller's quota.
///
/// The increment is a server-side atomic transform so concurrent
/// requests from the same user never lose an update. The quota check
/// runs before the increment; founder-tier callers skip it entirely.
async fn consume_prompt(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UsageView>> {
    let uid = user.uid();

    let profile = state
        .db
        .get_user_profile(uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User profile {} not found", uid)))?;

    let record = state
        .db
        .get_usage(uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Usage record {} not found", uid)))?;

    let tier = profile.subscription_tier;
    let now = Utc::now();

    if record.reset_due(now) {
        // The stored window has closed; open a fresh one and count this
        // prompt as its first use.
        let mut fresh = UsageRecord::new_window(uid, record.prompt_limit, now);
        fresh.prompts_used = 1;
        state.db.set_usage(&fresh).await?;

        return Ok(Json(UsageView::project(&fresh, tier, now)));
    }

    let view = UsageView::project(&record, tier, now);
    if !view.has_quota() {
        tracing::debug!(uid = %uid, used = view.used, limit = view.limit, "Prompt limit reached");
        return Err(AppError::LimitReached);
    }

    state.db.increment_prompts_used(uid).await?;

    let mut after = record;
    after.prompts_used += 1;

    Ok(Json(UsageView::project(&after, tier, now)))
}
