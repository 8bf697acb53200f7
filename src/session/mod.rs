// SPDX-License-Identifier: MIT

//! Client-side session state: store plus route guard.

pub mod guard;
pub mod store;

pub use guard::{GuardAction, RouteGuard};
pub use store::{
    AuthEvent, AuthGateway, SessionIdentity, SessionSnapshot, SessionStore, UsageCounters,
    UserData, UserDataSource,
};
