// SPDX-License-Identifier: MIT

use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use studylens_api::config::Config;
use studylens_api::db::FirestoreDb;
use studylens_api::routes::create_router;
use studylens_api::services::{IdentityAdmin, IdentityVerifier};
use studylens_api::AppState;

/// Symmetric signing key shared by the test verifier and token minting.
#[allow(dead_code)]
pub const TEST_SIGNING_KEY: &[u8] = b"studylens_test_signing_key_32b!!";

#[allow(dead_code)]
pub const TEST_KID: &str = "test-key";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

fn test_state(db: FirestoreDb) -> Arc<AppState> {
    let config = Config::test_default();

    let identity_verifier = Arc::new(
        IdentityVerifier::new_with_static_key(
            &config.gcp_project_id,
            TEST_KID,
            DecodingKey::from_secret(TEST_SIGNING_KEY),
            Algorithm::HS256,
        )
        .expect("static verifier"),
    );

    Arc::new(AppState {
        config,
        db,
        identity_verifier,
        identity_admin: IdentityAdmin::new_mock(),
    })
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = test_state(FirestoreDb::new_mock());
    (create_router(state.clone()), state)
}

/// Create a test app backed by the Firestore emulator.
#[allow(dead_code)]
pub async fn create_emulator_test_app() -> (axum::Router, Arc<AppState>) {
    let db = FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator");
    let state = test_state(db);
    (create_router(state.clone()), state)
}

#[derive(Serialize)]
struct TestClaims {
    sub: String,
    aud: String,
    iss: String,
    exp: usize,
    iat: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin: Option<bool>,
}

fn now_secs() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

fn sign(claims: &TestClaims) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(TEST_KID.to_string());

    encode(&header, claims, &EncodingKey::from_secret(TEST_SIGNING_KEY)).unwrap()
}

/// Mint a test ID token for the given user.
#[allow(dead_code)]
pub fn mint_token(uid: &str, email: Option<&str>, admin: bool) -> String {
    let now = now_secs();

    sign(&TestClaims {
        sub: uid.to_string(),
        aud: "test-project".to_string(),
        iss: "https://securetoken.google.com/test-project".to_string(),
        exp: now + 3600,
        iat: now,
        email: email.map(String::from),
        email_verified: email.map(|_| true),
        name: Some("Test User".to_string()),
        admin: admin.then_some(true),
    })
}

/// Token for an ordinary user.
#[allow(dead_code)]
pub fn user_token(uid: &str) -> String {
    mint_token(uid, Some("user@example.com"), false)
}

/// Token carrying the admin custom claim.
#[allow(dead_code)]
pub fn admin_token(uid: &str) -> String {
    mint_token(uid, Some("admin@example.com"), true)
}

/// Token for the break-glass super-admin address (no admin claim).
#[allow(dead_code)]
pub fn super_admin_token(uid: &str) -> String {
    mint_token(uid, Some(studylens_api::config::SUPER_ADMIN_EMAIL), false)
}

/// Token that expired an hour ago.
#[allow(dead_code)]
pub fn expired_token(uid: &str) -> String {
    let now = now_secs();

    sign(&TestClaims {
        sub: uid.to_string(),
        aud: "test-project".to_string(),
        iss: "https://securetoken.google.com/test-project".to_string(),
        exp: now - 3600,
        iat: now - 7200,
        email: Some("user@example.com".to_string()),
        email_verified: Some(true),
        name: None,
        admin: None,
    })
}

/// Token minted for a different project (wrong audience and issuer).
#[allow(dead_code)]
pub fn wrong_audience_token(uid: &str) -> String {
    let now = now_secs();

    sign(&TestClaims {
        sub: uid.to_string(),
        aud: "other-project".to_string(),
        iss: "https://securetoken.google.com/other-project".to_string(),
        exp: now + 3600,
        iat: now,
        email: Some("user@example.com".to_string()),
        email_verified: Some(true),
        name: None,
        admin: None,
    })
}

/// A uid unlikely to collide across test runs against a shared emulator.
#[allow(dead_code)]
pub fn fresh_uid(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
