// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod accounts;
pub mod identity;

pub use accounts::{IdentityAdmin, RoleClaims};
pub use identity::{IdentityVerifier, VerifiedIdentity, VerifyError};
