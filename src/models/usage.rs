// SPDX-License-Identifier: MIT

//! Usage ledger model and read-time projection.

use crate::config::USAGE_RESET_PERIOD_DAYS;
use crate::models::user::SubscriptionTier;
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Per-user usage counters stored in Firestore, keyed by uid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Identity provider uid (also used as document ID)
    pub uid: String,
    /// Prompts consumed in the current window
    pub prompts_used: u32,
    /// Prompt quota for the current window
    pub prompt_limit: u32,
    /// When the current window closes (RFC3339)
    pub reset_date: String,
    /// Last write to this record (RFC3339)
    pub last_updated: String,
}

impl UsageRecord {
    /// Fresh record for a new account or a new window.
    pub fn new_window(uid: &str, prompt_limit: u32, now: DateTime<Utc>) -> Self {
        Self {
            uid: uid.to_string(),
            prompts_used: 0,
            prompt_limit,
            reset_date: format_utc_rfc3339(now + Duration::days(USAGE_RESET_PERIOD_DAYS)),
            last_updated: format_utc_rfc3339(now),
        }
    }

    /// True once the stored window has closed as of `now`.
    ///
    /// An unparseable reset date counts as due, so a corrupt record
    /// heals into a fresh window instead of blocking the user forever.
    pub fn reset_due(&self, now: DateTime<Utc>) -> bool {
        match DateTime::parse_from_rfc3339(&self.reset_date) {
            Ok(reset) => reset.with_timezone(&Utc) <= now,
            Err(_) => true,
        }
    }
}

/// Client-facing view of a usage record.
///
/// The window reset is applied here at read time; there is no
/// background job rolling counters over.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageView {
    pub used: u32,
    pub limit: u32,
    pub reset_date: String,
    pub unlimited: bool,
}

impl UsageView {
    /// Project a stored record through the subscription tier as of `now`.
    pub fn project(record: &UsageRecord, tier: SubscriptionTier, now: DateTime<Utc>) -> Self {
        let unlimited = tier.is_unlimited();

        if record.reset_due(now) {
            return Self {
                used: 0,
                limit: record.prompt_limit,
                reset_date: format_utc_rfc3339(now + Duration::days(USAGE_RESET_PERIOD_DAYS)),
                unlimited,
            };
        }

        Self {
            used: record.prompts_used,
            limit: record.prompt_limit,
            reset_date: record.reset_date.clone(),
            unlimited,
        }
    }

    /// True when another prompt may be consumed.
    pub fn has_quota(&self) -> bool {
        self.unlimited || self.used < self.limit
    }
}
