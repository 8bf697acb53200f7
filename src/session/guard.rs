// SPDX-License-Identifier: MIT

//! Route guard for authenticated views.
//!
//! The one correctness property this type exists to enforce: no
//! redirect decision is made while the session store is still loading,
//! so a page refresh never flickers through the sign-in route.

use crate::session::store::SessionSnapshot;

/// Decision produced by one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardAction {
    /// Render a placeholder; no decision yet (or navigation already issued).
    Wait,
    /// Navigate to the given route. Issued at most once per guard.
    Navigate(String),
    /// Render the protected view.
    Render,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GuardState {
    Pending,
    Redirecting,
    Rendering,
}

/// Guards a protected view against unauthenticated access.
#[derive(Debug)]
pub struct RouteGuard {
    entry_route: String,
    state: GuardState,
}

impl RouteGuard {
    pub fn new(entry_route: impl Into<String>) -> Self {
        Self {
            entry_route: entry_route.into(),
            state: GuardState::Pending,
        }
    }

    /// Evaluate the guard against the current session snapshot.
    ///
    /// Call on every session-state change. Once a navigation has been
    /// issued the guard stays quiet; the router owns the rest.
    pub fn evaluate(&mut self, session: &SessionSnapshot) -> GuardAction {
        if self.state == GuardState::Redirecting {
            return GuardAction::Wait;
        }

        if session.loading {
            return GuardAction::Wait;
        }

        if session.identity.is_none() {
            self.state = GuardState::Redirecting;
            return GuardAction::Navigate(self.entry_route.clone());
        }

        self.state = GuardState::Rendering;
        GuardAction::Render
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::{SessionIdentity, SessionSnapshot};

    fn loading() -> SessionSnapshot {
        SessionSnapshot::initial()
    }

    fn unauthenticated() -> SessionSnapshot {
        let mut s = SessionSnapshot::initial();
        s.loading = false;
        s
    }

    fn authenticated() -> SessionSnapshot {
        let mut s = SessionSnapshot::initial();
        s.loading = false;
        s.identity = Some(SessionIdentity {
            uid: "user-1".to_string(),
            email: None,
            display_name: None,
            photo_url: None,
        });
        s
    }

    #[test]
    fn no_redirect_while_loading() {
        let mut guard = RouteGuard::new("/");

        // Identity absent but still loading: no navigation may happen.
        assert_eq!(guard.evaluate(&loading()), GuardAction::Wait);
        assert_eq!(guard.evaluate(&loading()), GuardAction::Wait);
    }

    #[test]
    fn exactly_one_navigation_when_unauthenticated() {
        let mut guard = RouteGuard::new("/");

        assert_eq!(guard.evaluate(&loading()), GuardAction::Wait);
        assert_eq!(
            guard.evaluate(&unauthenticated()),
            GuardAction::Navigate("/".to_string())
        );
        // Further evaluations render nothing and never navigate again.
        assert_eq!(guard.evaluate(&unauthenticated()), GuardAction::Wait);
        assert_eq!(guard.evaluate(&unauthenticated()), GuardAction::Wait);
    }

    #[test]
    fn renders_once_authenticated() {
        let mut guard = RouteGuard::new("/");

        assert_eq!(guard.evaluate(&loading()), GuardAction::Wait);
        assert_eq!(guard.evaluate(&authenticated()), GuardAction::Render);
        assert_eq!(guard.evaluate(&authenticated()), GuardAction::Render);
    }

    #[test]
    fn sign_out_after_render_navigates_once() {
        let mut guard = RouteGuard::new("/");

        assert_eq!(guard.evaluate(&authenticated()), GuardAction::Render);
        assert_eq!(
            guard.evaluate(&unauthenticated()),
            GuardAction::Navigate("/".to_string())
        );
        assert_eq!(guard.evaluate(&unauthenticated()), GuardAction::Wait);
    }
}
