// SPDX-License-Identifier: MIT

//! User profile model for storage and API.

use crate::time_utils::days_until_ceil;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Inactive,
    Active,
    Trial,
    Expired,
    Founder,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Founder => "founder",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inactive" => Ok(SubscriptionStatus::Inactive),
            "active" => Ok(SubscriptionStatus::Active),
            "trial" => Ok(SubscriptionStatus::Trial),
            "expired" => Ok(SubscriptionStatus::Expired),
            "founder" => Ok(SubscriptionStatus::Founder),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription tier. Founder tier is exempt from usage limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Pro,
    Founder,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Founder => "founder",
        }
    }

    /// Founder accounts have no prompt quota.
    pub fn is_unlimited(&self) -> bool {
        matches!(self, SubscriptionTier::Founder)
    }
}

impl FromStr for SubscriptionTier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SubscriptionTier::Free),
            "pro" => Ok(SubscriptionTier::Pro),
            "founder" => Ok(SubscriptionTier::Founder),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User profile stored in Firestore, keyed by identity provider uid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identity provider uid (also used as document ID)
    pub uid: String,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    /// Display name
    pub display_name: Option<String>,
    /// Profile picture URL
    pub photo_url: Option<String>,
    /// Current subscription state
    pub subscription_status: SubscriptionStatus,
    /// Current subscription tier
    pub subscription_tier: SubscriptionTier,
    /// Trial window start (RFC3339), set when status is trial
    pub trial_start: Option<String>,
    /// Trial window end (RFC3339), only meaningful when status is trial
    pub trial_end: Option<String>,
    /// Last failed payment, if any (RFC3339)
    pub payment_failed_at: Option<String>,
    /// End of the post-payment-failure grace period (RFC3339)
    pub payment_grace_period_end: Option<String>,
    /// When the profile was first created (RFC3339)
    pub created_at: String,
    /// Last login timestamp (RFC3339)
    pub last_login_at: String,
}

/// Trial window derived from a profile at read time.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrialInfo {
    pub is_in_trial: bool,
    pub days_left: i64,
    pub trial_start_date: Option<String>,
    pub trial_end_date: Option<String>,
}

impl UserProfile {
    /// Compute the trial view for this profile as of `now`.
    ///
    /// Days left round up, so a trial with 36 hours remaining shows 2
    /// days. A trial whose end has passed shows zero, never negative.
    pub fn trial_info(&self, now: DateTime<Utc>) -> TrialInfo {
        let trial_end = self
            .trial_end
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let days_left = match (self.subscription_status, trial_end) {
            (SubscriptionStatus::Trial, Some(end)) => days_until_ceil(end, now),
            _ => 0,
        };

        TrialInfo {
            is_in_trial: self.subscription_status == SubscriptionStatus::Trial && days_left > 0,
            days_left,
            trial_start_date: self.trial_start.clone(),
            trial_end_date: self.trial_end.clone(),
        }
    }
}
