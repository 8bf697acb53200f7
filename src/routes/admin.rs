// SPDX-License-Identifier: MIT

//! Privileged admin routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{SubscriptionStatus, SubscriptionTier};
use crate::services::accounts::RoleClaims;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{extract::State, routing::post, Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Admin routes (require authentication plus the admin check below).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/admin/set-user-role", post(set_user_role))
}

/// Role-update request body.
///
/// All fields optional at the serde layer so each can get its own
/// validation message instead of a generic deserialization error.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUserRoleRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
}

#[derive(Serialize)]
pub struct SetUserRoleResponse {
    pub success: bool,
    pub message: String,
}

/// Set a user's subscription role and tier.
///
/// Two-phase, non-transactional: custom claims land on the identity
/// provider first, then role/tier are mirrored into the stored profile.
/// If the mirror fails the operation reports failure even though the
/// claims were written; re-running with the same values is safe and
/// completes the mirror.
async fn set_user_role(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SetUserRoleRequest>,
) -> Result<Json<SetUserRoleResponse>> {
    if !user.is_admin(&state.config) {
        tracing::warn!(caller = %user.uid(), "Blocked role update from non-admin");
        return Err(AppError::Forbidden);
    }

    let (user_id, role, tier) = validate_request(&req)?;

    // Nothing to mirror into means nothing to do; refuse before the
    // provider write so a failed request leaves no partial effect.
    if state.db.get_user_profile(user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    let claims = RoleClaims {
        role,
        tier,
        updated_at: format_utc_rfc3339(Utc::now()),
        updated_by: user.uid().to_string(),
    };

    // Phase 1: custom claims on the identity provider.
    state.identity_admin.set_role_claims(user_id, &claims).await?;

    // Phase 2: mirror into the profile. On failure the error propagates
    // and the caller retries the whole operation.
    state.db.mirror_profile_role(user_id, role, tier).await?;

    tracing::info!(
        caller = %user.uid(),
        target = %user_id,
        role = %role,
        tier = %tier,
        "User role updated"
    );

    Ok(Json(SetUserRoleResponse {
        success: true,
        message: format!("User {} set to role '{}', tier '{}'", user_id, role, tier),
    }))
}

fn validate_request(
    req: &SetUserRoleRequest,
) -> Result<(&str, SubscriptionStatus, SubscriptionTier)> {
    let user_id = req
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing required field: userId".to_string()))?;

    let role = req
        .role
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Missing required field: role".to_string()))?
        .parse::<SubscriptionStatus>()
        .map_err(|_| {
            AppError::BadRequest(
                "Invalid role: must be one of inactive, active, trial, expired, founder"
                    .to_string(),
            )
        })?;

    let tier = req
        .tier
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Missing required field: tier".to_string()))?
        .parse::<SubscriptionTier>()
        .map_err(|_| {
            AppError::BadRequest("Invalid tier: must be one of free, pro, founder".to_string())
        })?;

    Ok((user_id, role, tier))
}
