//! Save lifecycle for the open flow document
//!
//! The [`SaveCoordinator`] is the single writer of the document's save
//! status. Every UI surface that cares about unsaved work (status bar,
//! navigation guard, deploy gating) reads from here, and every mutation
//! funnels through [`SaveCoordinator::mark_dirty`]; nothing else assigns
//! the status.
//!
//! ```text
//!             mark_dirty                begin_save
//!   Clean ───────────────► Dirty ─────────────────► Saving
//!     ▲                      ▲  ▲                     │
//!     │ success, no errors   │  │ edits during save   │
//!     ├──────────────────────┼──┴─────────────────────┤
//!     │ success, errors      │        failure         │
//!   Draft ◄──────────────────┘        Error ◄─────────┘
//!     │                                 │
//!     └────────── mark_dirty ───────────┘
//! ```
//!
//! A save that resolves after further edits were made must not launder
//! those edits into a `Clean` status. Each edit bumps a sequence number,
//! the ticket issued by [`SaveCoordinator::begin_save`] captures it, and
//! completion compares the two.

use crate::flow::ValidationResult;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Document save status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    /// No unsaved changes; the last save succeeded without validation errors
    #[default]
    Clean,
    /// Local edits exist that the backend has not seen
    Dirty,
    /// Persisted, but the backend reported validation errors
    Draft,
    /// A save request is in flight
    Saving,
    /// The last save attempt failed
    Error,
}

impl std::fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveStatus::Clean => write!(f, "Saved"),
            SaveStatus::Dirty => write!(f, "Unsaved changes"),
            SaveStatus::Draft => write!(f, "Draft"),
            SaveStatus::Saving => write!(f, "Saving..."),
            SaveStatus::Error => write!(f, "Save failed"),
        }
    }
}

/// Snapshot handed to subscribers on every transition
#[derive(Debug, Clone, PartialEq)]
pub struct SaveState {
    pub status: SaveStatus,
    pub last_saved: Option<DateTime<Utc>>,
    /// Present only while `status` is [`SaveStatus::Error`]
    pub error: Option<String>,
}

/// Matches an in-flight save to its completion
///
/// The ticket records which edit the save captured; a completion whose
/// ticket is no longer current is dropped instead of overwriting newer
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTicket {
    seq: u64,
}

/// Terminal result of a save attempt
#[derive(Debug, Clone)]
pub enum SaveOutcome {
    Success {
        saved_at: DateTime<Utc>,
        validation: Option<ValidationResult>,
    },
    Failure {
        message: String,
    },
}

/// Owns the save status of the open document
pub struct SaveCoordinator {
    status: SaveStatus,
    /// Bumped on every local edit, including edits made while saving
    edit_seq: u64,
    /// Sequence captured by the save currently in flight
    in_flight: Option<u64>,
    last_saved: Option<DateTime<Utc>>,
    error_message: Option<String>,
    /// Verdict from the most recent completed save
    validation: Option<ValidationResult>,
    /// When the most recent edit happened; drives the autosave delay
    dirty_since: Option<Instant>,
    subscribers: Vec<Box<dyn FnMut(&SaveState)>>,
}

impl std::fmt::Debug for SaveCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveCoordinator")
            .field("status", &self.status)
            .field("edit_seq", &self.edit_seq)
            .field("in_flight", &self.in_flight)
            .field("last_saved", &self.last_saved)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for SaveCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveCoordinator {
    pub fn new() -> Self {
        Self {
            status: SaveStatus::Clean,
            edit_seq: 0,
            in_flight: None,
            last_saved: None,
            error_message: None,
            validation: None,
            dirty_since: None,
            subscribers: Vec::new(),
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Error text from the last failed save; `None` unless the status is
    /// [`SaveStatus::Error`]
    pub fn error(&self) -> Option<&str> {
        match self.status {
            SaveStatus::Error => self.error_message.as_deref(),
            _ => None,
        }
    }

    /// Verdict from the most recent completed save
    pub fn validation(&self) -> Option<&ValidationResult> {
        self.validation.as_ref()
    }

    /// True when local edits exist that the backend has not accepted
    pub fn is_dirty(&self) -> bool {
        self.status == SaveStatus::Dirty
    }

    pub fn snapshot(&self) -> SaveState {
        SaveState {
            status: self.status,
            last_saved: self.last_saved,
            error: self.error().map(|s| s.to_string()),
        }
    }

    /// Register a subscriber called after every status transition
    pub fn subscribe(&mut self, subscriber: impl FnMut(&SaveState) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Record a local edit
    ///
    /// Transitions `Clean`, `Draft`, and `Error` to `Dirty`. Already-dirty
    /// documents stay dirty, and an in-flight save keeps its `Saving`
    /// status; in both cases the edit still counts against the in-flight
    /// ticket and restarts the autosave delay.
    pub fn mark_dirty(&mut self) {
        self.edit_seq += 1;
        self.dirty_since = Some(Instant::now());

        match self.status {
            SaveStatus::Clean | SaveStatus::Draft | SaveStatus::Error => {
                self.status = SaveStatus::Dirty;
                self.error_message = None;
                self.notify();
            }
            SaveStatus::Dirty | SaveStatus::Saving => {}
        }
    }

    /// Start a save attempt
    ///
    /// Returns a ticket when there is something to persist, i.e. the
    /// status is `Dirty` or a failed save is being retried from `Error`.
    /// Requests from `Clean`, `Draft`, or `Saving` are harmless no-ops
    /// that return `None`.
    pub fn begin_save(&mut self) -> Option<SaveTicket> {
        match self.status {
            SaveStatus::Dirty | SaveStatus::Error => {
                self.status = SaveStatus::Saving;
                self.error_message = None;
                self.in_flight = Some(self.edit_seq);
                self.notify();
                Some(SaveTicket { seq: self.edit_seq })
            }
            SaveStatus::Clean | SaveStatus::Draft | SaveStatus::Saving => None,
        }
    }

    /// Resolve the save attempt identified by `ticket`
    ///
    /// Completions whose ticket does not match the in-flight save are
    /// ignored. A success records `last_saved` and the validation verdict
    /// even when edits arrived mid-save, but the status then returns to
    /// `Dirty` instead of `Clean`.
    pub fn complete_save(&mut self, ticket: SaveTicket, outcome: SaveOutcome) {
        if self.in_flight != Some(ticket.seq) {
            tracing::debug!(seq = ticket.seq, "Ignoring stale save completion");
            return;
        }
        self.in_flight = None;

        match outcome {
            SaveOutcome::Success {
                saved_at,
                validation,
            } => {
                self.last_saved = Some(saved_at);
                let has_errors = validation.as_ref().is_some_and(|v| v.has_errors());
                self.validation = validation;
                self.error_message = None;

                self.status = if self.edit_seq > ticket.seq {
                    SaveStatus::Dirty
                } else if has_errors {
                    SaveStatus::Draft
                } else {
                    SaveStatus::Clean
                };
            }
            SaveOutcome::Failure { message } => {
                tracing::warn!("Save failed: {message}");
                self.status = SaveStatus::Error;
                self.error_message = Some(message);
            }
        }
        self.notify();
    }

    /// Forget the current document's save history, e.g. after a different
    /// flow was loaded
    ///
    /// Any in-flight save is orphaned and its completion will be ignored.
    pub fn reset(&mut self) {
        self.edit_seq += 1;
        self.in_flight = None;
        self.status = SaveStatus::Clean;
        self.last_saved = None;
        self.error_message = None;
        self.validation = None;
        self.dirty_since = None;
        self.notify();
    }

    /// True when the autosave delay has elapsed since the last edit
    pub fn autosave_due(&self, now: Instant, delay: Duration) -> bool {
        if self.status != SaveStatus::Dirty {
            return false;
        }
        self.dirty_since
            .is_some_and(|since| now.duration_since(since) >= delay)
    }

    fn notify(&mut self) {
        let state = SaveState {
            status: self.status,
            last_saved: self.last_saved,
            error: match self.status {
                SaveStatus::Error => self.error_message.clone(),
                _ => None,
            },
        };
        for subscriber in &mut self.subscribers {
            subscriber(&state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{IssueSeverity, ValidationIssue};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn success(validation: Option<ValidationResult>) -> SaveOutcome {
        SaveOutcome::Success {
            saved_at: Utc::now(),
            validation,
        }
    }

    fn validation_with_error() -> ValidationResult {
        let mut result = ValidationResult::default();
        result.push(ValidationIssue::new(
            "missing_required",
            IssueSeverity::Error,
            "UDP Input",
            "port is required",
        ));
        result
    }

    #[test]
    fn test_mark_dirty_is_idempotent() {
        let mut coordinator = SaveCoordinator::new();
        coordinator.mark_dirty();
        coordinator.mark_dirty();
        coordinator.mark_dirty();
        assert_eq!(coordinator.status(), SaveStatus::Dirty);
    }

    #[test]
    fn test_clean_save_cycle() {
        let mut coordinator = SaveCoordinator::new();
        assert!(coordinator.begin_save().is_none());

        coordinator.mark_dirty();
        let ticket = coordinator.begin_save().unwrap();
        assert_eq!(coordinator.status(), SaveStatus::Saving);

        coordinator.complete_save(ticket, success(None));
        assert_eq!(coordinator.status(), SaveStatus::Clean);
        assert!(coordinator.last_saved().is_some());
        assert!(coordinator.error().is_none());
    }

    #[test]
    fn test_validation_errors_leave_draft() {
        let mut coordinator = SaveCoordinator::new();
        coordinator.mark_dirty();
        let ticket = coordinator.begin_save().unwrap();

        coordinator.complete_save(ticket, success(Some(validation_with_error())));
        assert_eq!(coordinator.status(), SaveStatus::Draft);
        assert!(coordinator.last_saved().is_some());
        assert!(coordinator.validation().unwrap().has_errors());

        // Nothing new to persist from a draft
        assert!(coordinator.begin_save().is_none());
        // But fresh edits make it dirty again
        coordinator.mark_dirty();
        assert_eq!(coordinator.status(), SaveStatus::Dirty);
    }

    #[test]
    fn test_failure_then_retry() {
        let mut coordinator = SaveCoordinator::new();
        coordinator.mark_dirty();
        let ticket = coordinator.begin_save().unwrap();

        coordinator.complete_save(
            ticket,
            SaveOutcome::Failure {
                message: "backend returned 500".into(),
            },
        );
        assert_eq!(coordinator.status(), SaveStatus::Error);
        assert_eq!(coordinator.error(), Some("backend returned 500"));
        assert!(coordinator.last_saved().is_none());

        // Retry straight from the error state
        let retry = coordinator.begin_save().unwrap();
        assert_eq!(coordinator.status(), SaveStatus::Saving);
        assert!(coordinator.error().is_none());

        coordinator.complete_save(retry, success(None));
        assert_eq!(coordinator.status(), SaveStatus::Clean);
    }

    #[test]
    fn test_no_concurrent_saves() {
        let mut coordinator = SaveCoordinator::new();
        coordinator.mark_dirty();
        let _ticket = coordinator.begin_save().unwrap();
        assert!(coordinator.begin_save().is_none());
    }

    #[test]
    fn test_edits_during_save_return_to_dirty() {
        let mut coordinator = SaveCoordinator::new();
        coordinator.mark_dirty();
        let ticket = coordinator.begin_save().unwrap();

        // User keeps editing while the request is in flight
        coordinator.mark_dirty();
        assert_eq!(coordinator.status(), SaveStatus::Saving);

        coordinator.complete_save(ticket, success(None));
        assert_eq!(coordinator.status(), SaveStatus::Dirty);
        // The save itself still happened
        assert!(coordinator.last_saved().is_some());
    }

    #[test]
    fn test_stale_completion_ignored() {
        let mut coordinator = SaveCoordinator::new();
        coordinator.mark_dirty();
        let first = coordinator.begin_save().unwrap();
        coordinator.complete_save(first, success(None));
        assert_eq!(coordinator.status(), SaveStatus::Clean);

        // The same completion delivered twice must not change anything
        coordinator.mark_dirty();
        coordinator.complete_save(first, success(None));
        assert_eq!(coordinator.status(), SaveStatus::Dirty);
    }

    #[test]
    fn test_error_only_visible_in_error_status() {
        let mut coordinator = SaveCoordinator::new();
        coordinator.mark_dirty();
        let ticket = coordinator.begin_save().unwrap();
        coordinator.complete_save(
            ticket,
            SaveOutcome::Failure {
                message: "timeout".into(),
            },
        );
        assert!(coordinator.error().is_some());

        coordinator.mark_dirty();
        assert_eq!(coordinator.status(), SaveStatus::Dirty);
        assert!(coordinator.error().is_none());
    }

    #[test]
    fn test_subscribers_see_transitions() {
        let seen: Rc<RefCell<Vec<SaveStatus>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();

        let mut coordinator = SaveCoordinator::new();
        coordinator.subscribe(move |state| sink.borrow_mut().push(state.status));

        coordinator.mark_dirty();
        coordinator.mark_dirty(); // no transition, no notification
        let ticket = coordinator.begin_save().unwrap();
        coordinator.complete_save(ticket, success(None));

        assert_eq!(
            *seen.borrow(),
            vec![SaveStatus::Dirty, SaveStatus::Saving, SaveStatus::Clean]
        );
    }

    #[test]
    fn test_reset_orphans_in_flight_save() {
        let mut coordinator = SaveCoordinator::new();
        coordinator.mark_dirty();
        let ticket = coordinator.begin_save().unwrap();

        coordinator.reset();
        assert_eq!(coordinator.status(), SaveStatus::Clean);

        // The orphaned completion must not resurrect the old document's state
        coordinator.complete_save(ticket, success(None));
        assert_eq!(coordinator.status(), SaveStatus::Clean);
        assert!(coordinator.last_saved().is_none());
    }

    #[test]
    fn test_autosave_due_after_delay() {
        let mut coordinator = SaveCoordinator::new();
        let delay = Duration::from_secs(3);

        assert!(!coordinator.autosave_due(Instant::now(), delay));

        coordinator.mark_dirty();
        let now = Instant::now();
        assert!(!coordinator.autosave_due(now, delay));
        assert!(coordinator.autosave_due(now + delay, delay));

        // Saving suspends the autosave check
        let _ticket = coordinator.begin_save().unwrap();
        assert!(!coordinator.autosave_due(now + delay, delay));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            MarkDirty,
            BeginSave,
            CompleteSuccess,
            CompleteWithErrors,
            CompleteFailure,
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::MarkDirty),
                Just(Op::BeginSave),
                Just(Op::CompleteSuccess),
                Just(Op::CompleteWithErrors),
                Just(Op::CompleteFailure),
            ]
        }

        proptest! {
            #[test]
            fn save_invariants_hold(ops in proptest::collection::vec(op_strategy(), 1..40)) {
                let mut coordinator = SaveCoordinator::new();
                let mut pending: Option<SaveTicket> = None;

                for op in ops {
                    match op {
                        Op::MarkDirty => coordinator.mark_dirty(),
                        Op::BeginSave => {
                            let before = coordinator.status();
                            let ticket = coordinator.begin_save();
                            match before {
                                SaveStatus::Dirty | SaveStatus::Error => {
                                    prop_assert!(ticket.is_some());
                                    pending = ticket;
                                }
                                _ => prop_assert!(ticket.is_none()),
                            }
                        }
                        Op::CompleteSuccess => {
                            if let Some(ticket) = pending.take() {
                                coordinator.complete_save(ticket, success(None));
                            }
                        }
                        Op::CompleteWithErrors => {
                            if let Some(ticket) = pending.take() {
                                coordinator
                                    .complete_save(ticket, success(Some(validation_with_error())));
                            }
                        }
                        Op::CompleteFailure => {
                            if let Some(ticket) = pending.take() {
                                coordinator.complete_save(
                                    ticket,
                                    SaveOutcome::Failure { message: "boom".into() },
                                );
                            }
                        }
                    }

                    // Error text is only exposed in the error status
                    if coordinator.status() != SaveStatus::Error {
                        prop_assert!(coordinator.error().is_none());
                    }
                    // Saving exactly while a ticket is outstanding
                    prop_assert_eq!(
                        coordinator.status() == SaveStatus::Saving,
                        pending.is_some()
                    );
                }
            }
        }
    }
}
