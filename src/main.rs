// SPDX-License-Identifier: MIT

//! StudyLens API Server
//!
//! Serves profile, usage-limit, and subscription-role management for
//! the StudyLens study assistant, backed by the identity provider for
//! authentication and Firestore for persistence.

use std::sync::Arc;
use studylens_api::{
    config::Config,
    db::FirestoreDb,
    services::{IdentityAdmin, IdentityVerifier},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting StudyLens API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    let identity_verifier = Arc::new(
        IdentityVerifier::new(&config.gcp_project_id)
            .expect("Failed to initialize ID-token verifier"),
    );

    let identity_admin = IdentityAdmin::new(&config.gcp_project_id)
        .expect("Failed to initialize identity admin client");
    tracing::info!("Identity admin client initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        identity_verifier,
        identity_admin,
    });

    // Build router
    let app = studylens_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("studylens_api=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
