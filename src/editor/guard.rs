//! Navigation guard for unsaved work
//!
//! Intercepts route changes (including window close, modeled as the
//! [`Route::Exit`](super::Route::Exit) destination) and decides whether
//! they may proceed. Only a dirty document blocks; every other save
//! status lets navigation through untouched.
//!
//! The guard never navigates by itself. It parks the requested
//! destination, the app shows the unsaved-changes dialog, and one of
//! [`NavigationGuard::allow_navigation`] or
//! [`NavigationGuard::cancel_navigation`] resolves the attempt. Allowing
//! arms a one-shot latch for the destination, so when the app re-issues
//! the same navigation it passes through instead of being blocked again.

use super::Route;
use crate::editor::save::SaveStatus;

/// Verdict for a single navigation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Navigation may happen now
    Proceed,
    /// Navigation is parked until the user decides
    Blocked,
}

/// Arbitrates between navigation attempts and unsaved work
pub struct NavigationGuard {
    /// Destination parked while the user is being asked
    pending: Option<Route>,
    /// One-shot pass for a destination that was just allowed
    allowed: Option<Route>,
    on_allowed: Vec<Box<dyn FnMut(&Route)>>,
}

impl std::fmt::Debug for NavigationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationGuard")
            .field("pending", &self.pending)
            .field("allowed", &self.allowed)
            .field("on_allowed", &self.on_allowed.len())
            .finish()
    }
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationGuard {
    pub fn new() -> Self {
        Self {
            pending: None,
            allowed: None,
            on_allowed: Vec::new(),
        }
    }

    /// Register an observer fired whenever a parked navigation is allowed
    pub fn on_allowed(&mut self, observer: impl FnMut(&Route) + 'static) {
        self.on_allowed.push(Box::new(observer));
    }

    /// Destination currently awaiting a user decision
    pub fn pending(&self) -> Option<&Route> {
        self.pending.as_ref()
    }

    /// True while a navigation attempt is parked
    pub fn is_blocking(&self) -> bool {
        self.pending.is_some()
    }

    /// Arbitrate a navigation attempt
    ///
    /// Rules, in order:
    /// - a missing destination always proceeds
    /// - a destination that was just allowed proceeds (the latch is
    ///   consumed by this call, matching or not)
    /// - anything proceeds unless the document is dirty
    /// - while an attempt is already parked, later attempts are blocked
    ///   without replacing it (first one wins)
    /// - otherwise the destination is parked and the attempt blocked
    pub fn intercept(&mut self, destination: Option<&Route>, status: SaveStatus) -> GuardDecision {
        let allowed = self.allowed.take();

        let Some(destination) = destination else {
            return GuardDecision::Proceed;
        };

        if allowed.as_ref() == Some(destination) {
            return GuardDecision::Proceed;
        }

        if status != SaveStatus::Dirty {
            return GuardDecision::Proceed;
        }

        if self.pending.is_some() {
            return GuardDecision::Blocked;
        }

        tracing::debug!(?destination, "Navigation blocked by unsaved changes");
        self.pending = Some(destination.clone());
        GuardDecision::Blocked
    }

    /// Release the parked navigation
    ///
    /// Arms the one-shot latch for the destination, fires the
    /// `on_allowed` observers, and hands the destination back so the
    /// caller can re-issue it.
    pub fn allow_navigation(&mut self) -> Option<Route> {
        let destination = self.pending.take()?;
        self.allowed = Some(destination.clone());
        for observer in &mut self.on_allowed {
            observer(&destination);
        }
        tracing::debug!(?destination, "Navigation allowed");
        Some(destination)
    }

    /// Drop the parked navigation and stay put
    pub fn cancel_navigation(&mut self) {
        if let Some(destination) = self.pending.take() {
            tracing::debug!(?destination, "Navigation cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_clean_document_never_blocks() {
        let mut guard = NavigationGuard::new();
        for status in [
            SaveStatus::Clean,
            SaveStatus::Draft,
            SaveStatus::Saving,
            SaveStatus::Error,
        ] {
            assert_eq!(
                guard.intercept(Some(&Route::Monitor), status),
                GuardDecision::Proceed
            );
            assert!(!guard.is_blocking());
        }
    }

    #[test]
    fn test_dirty_document_parks_destination() {
        let mut guard = NavigationGuard::new();
        let decision = guard.intercept(Some(&Route::Settings), SaveStatus::Dirty);
        assert_eq!(decision, GuardDecision::Blocked);
        assert_eq!(guard.pending(), Some(&Route::Settings));
    }

    #[test]
    fn test_missing_destination_always_proceeds() {
        let mut guard = NavigationGuard::new();
        assert_eq!(
            guard.intercept(None, SaveStatus::Dirty),
            GuardDecision::Proceed
        );
        assert!(!guard.is_blocking());
    }

    #[test]
    fn test_first_pending_navigation_wins() {
        let mut guard = NavigationGuard::new();
        guard.intercept(Some(&Route::Monitor), SaveStatus::Dirty);
        let second = guard.intercept(Some(&Route::Settings), SaveStatus::Dirty);

        assert_eq!(second, GuardDecision::Blocked);
        assert_eq!(guard.pending(), Some(&Route::Monitor));
    }

    #[test]
    fn test_allow_arms_one_shot_latch() {
        let mut guard = NavigationGuard::new();
        guard.intercept(Some(&Route::Monitor), SaveStatus::Dirty);

        let destination = guard.allow_navigation().unwrap();
        assert_eq!(destination, Route::Monitor);
        assert!(!guard.is_blocking());

        // Re-issued navigation passes even though the document is still dirty
        assert_eq!(
            guard.intercept(Some(&Route::Monitor), SaveStatus::Dirty),
            GuardDecision::Proceed
        );
        // The latch is one-shot
        assert_eq!(
            guard.intercept(Some(&Route::Monitor), SaveStatus::Dirty),
            GuardDecision::Blocked
        );
    }

    #[test]
    fn test_latch_does_not_cover_other_destinations() {
        let mut guard = NavigationGuard::new();
        guard.intercept(Some(&Route::Monitor), SaveStatus::Dirty);
        guard.allow_navigation();

        assert_eq!(
            guard.intercept(Some(&Route::Settings), SaveStatus::Dirty),
            GuardDecision::Blocked
        );
    }

    #[test]
    fn test_cancel_keeps_save_state_and_clears_pending() {
        let mut guard = NavigationGuard::new();
        guard.intercept(Some(&Route::Exit), SaveStatus::Dirty);
        guard.cancel_navigation();

        assert!(!guard.is_blocking());
        // Still dirty, so the next attempt blocks again
        assert_eq!(
            guard.intercept(Some(&Route::Exit), SaveStatus::Dirty),
            GuardDecision::Blocked
        );
    }

    #[test]
    fn test_allow_without_pending_is_a_no_op() {
        let mut guard = NavigationGuard::new();
        assert!(guard.allow_navigation().is_none());
    }

    #[test]
    fn test_allowed_observer_fires_on_allow_only() {
        let seen: Rc<RefCell<Vec<Route>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();

        let mut guard = NavigationGuard::new();
        guard.on_allowed(move |route| sink.borrow_mut().push(route.clone()));

        guard.intercept(Some(&Route::Monitor), SaveStatus::Dirty);
        guard.cancel_navigation();
        assert!(seen.borrow().is_empty());

        guard.intercept(Some(&Route::Monitor), SaveStatus::Dirty);
        guard.allow_navigation();
        assert_eq!(*seen.borrow(), vec![Route::Monitor]);
    }
}
