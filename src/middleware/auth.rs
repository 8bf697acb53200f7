// SPDX-License-Identifier: MIT

//! Bearer-token authentication middleware.

use crate::config::Config;
use crate::services::identity::{VerifiedIdentity, VerifyError};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user extracted from a verified ID token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: VerifiedIdentity,
}

impl AuthUser {
    pub fn uid(&self) -> &str {
        &self.identity.uid
    }

    /// Admin custom claim, or the designated break-glass address.
    ///
    /// The email path requires a verified email so an unverified signup
    /// cannot squat on the super-admin address.
    pub fn is_admin(&self, config: &Config) -> bool {
        if self.identity.admin {
            return true;
        }

        self.identity.email_verified
            && self.identity.email.as_deref() == Some(config.super_admin_email.as_str())
    }
}

/// Middleware that requires a valid bearer ID token.
///
/// Every failure mode (absent, rejected, provider unreachable) maps to
/// the same 401 so callers cannot probe why a credential was refused.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request.headers().get(header::AUTHORIZATION);

    let identity = match state.identity_verifier.verify_id_token(auth_header).await {
        Ok(identity) => identity,
        Err(VerifyError::Absent) => {
            tracing::debug!("Request without bearer credential");
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(VerifyError::Rejected(reason)) => {
            tracing::warn!(reason = %reason, "Bearer token rejected");
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(VerifyError::Transient(reason)) => {
            tracing::error!(reason = %reason, "Token verification unavailable");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    request.extensions_mut().insert(AuthUser { identity });

    Ok(next.run(request).await)
}
