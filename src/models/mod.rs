// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod usage;
pub mod user;

pub use usage::{UsageRecord, UsageView};
pub use user::{SubscriptionStatus, SubscriptionTier, TrialInfo, UserProfile};
