// SPDX-License-Identifier: MIT

//! StudyLens: study-assistant SaaS backend.
//!
//! This crate provides the API for user profile, usage-limit, and
//! subscription-role management, plus the client-side session state
//! machinery (session store and route guard).

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{IdentityAdmin, IdentityVerifier};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub identity_verifier: Arc<IdentityVerifier>,
    pub identity_admin: IdentityAdmin,
}
