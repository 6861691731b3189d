//! Practice session controller.
//!
//! A single timed practice attempt modelled as a state machine:
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --resume--> Running
//!  ^                 |                  |
//!  +------stop-------+-------stop-------+
//! Running --(remaining hits 0)--> Completed --configure--> Idle
//! ```
//!
//! Time advances only through [`PracticeSession::tick`], driven by the caller's
//! once-per-second schedule. Each `start`/`resume` hands out a [`TickToken`];
//! any transition out of `Running` invalidates every token issued before it, so
//! a tick that was already scheduled can never decrement a paused, stopped,
//! reconfigured or completed session.

use crate::error::PersistenceWarning;
use crate::{Error, ExerciseMetadata, Result, SessionRecord, SessionSink};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Lifecycle of a practice session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Configured but not started (or stopped)
    Idle,
    Running,
    Paused,
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Authorises scheduled ticks for one uninterrupted run period
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickToken {
    epoch: u64,
}

/// Result of delivering one tick
#[derive(Debug)]
pub enum TickOutcome {
    /// Token was stale or the session was not running; nothing changed
    Ignored,
    /// One second counted
    Counted { remaining: u32 },
    /// The last second counted and the session completed
    Completed(Completion),
}

/// Emitted exactly once per naturally completed attempt
#[derive(Debug)]
pub struct Completion {
    pub record: SessionRecord,
    /// Set when the sink rejected the record; the session is complete regardless
    pub warning: Option<PersistenceWarning>,
}

/// Timer state machine for one practice attempt
pub struct PracticeSession<S: SessionSink> {
    user_id: String,
    sink: S,
    exercise: ExerciseMetadata,
    total_seconds: u32,
    remaining_seconds: u32,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    epoch: u64,
}

/// Check that a requested duration is a positive number of seconds
fn validate_duration(duration_seconds: i64) -> Result<u32> {
    if duration_seconds <= 0 {
        return Err(Error::InvalidDuration(duration_seconds));
    }
    u32::try_from(duration_seconds).map_err(|_| Error::InvalidDuration(duration_seconds))
}

impl<S: SessionSink> PracticeSession<S> {
    /// Create a controller configured for its first attempt
    pub fn new(
        user_id: impl Into<String>,
        sink: S,
        duration_seconds: i64,
        exercise: ExerciseMetadata,
    ) -> Result<Self> {
        let total_seconds = validate_duration(duration_seconds)?;
        Ok(Self {
            user_id: user_id.into(),
            sink,
            exercise,
            total_seconds,
            remaining_seconds: total_seconds,
            state: SessionState::Idle,
            started_at: None,
            epoch: 0,
        })
    }

    /// Set up a new attempt.
    ///
    /// Rejected while running. On success the session is `Idle` with the full
    /// duration remaining and no start timestamp.
    pub fn configure(&mut self, duration_seconds: i64, exercise: ExerciseMetadata) -> Result<()> {
        if self.state == SessionState::Running {
            return Err(Error::SessionBusy { state: self.state });
        }
        let total_seconds = validate_duration(duration_seconds)?;

        self.invalidate_ticks();
        self.exercise = exercise;
        self.total_seconds = total_seconds;
        self.remaining_seconds = total_seconds;
        self.started_at = None;
        self.state = SessionState::Idle;

        tracing::debug!(
            "Configured '{}' for {} seconds",
            self.exercise.name,
            total_seconds
        );
        Ok(())
    }

    /// Begin running from `Idle`.
    ///
    /// The start timestamp is recorded only on the first start of a
    /// configuration. Returns `None` from any other state.
    pub fn start(&mut self, now: DateTime<Utc>) -> Option<TickToken> {
        if self.state != SessionState::Idle {
            tracing::debug!("Ignoring start while {}", self.state);
            return None;
        }
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.state = SessionState::Running;
        tracing::info!("Started '{}' ({} s remaining)", self.exercise.name, self.remaining_seconds);
        Some(self.issue_token())
    }

    /// Suspend a running session. Returns whether a transition happened.
    pub fn pause(&mut self) -> bool {
        if self.state != SessionState::Running {
            tracing::debug!("Ignoring pause while {}", self.state);
            return false;
        }
        self.invalidate_ticks();
        self.state = SessionState::Paused;
        tracing::debug!("Paused with {} s remaining", self.remaining_seconds);
        true
    }

    /// Continue a paused session with a fresh token
    pub fn resume(&mut self) -> Option<TickToken> {
        if self.state != SessionState::Paused {
            tracing::debug!("Ignoring resume while {}", self.state);
            return None;
        }
        self.state = SessionState::Running;
        tracing::debug!("Resumed with {} s remaining", self.remaining_seconds);
        Some(self.issue_token())
    }

    /// Abandon the current run. No record is emitted.
    pub fn stop(&mut self) -> bool {
        if !self.is_active() {
            tracing::debug!("Ignoring stop while {}", self.state);
            return false;
        }
        self.invalidate_ticks();
        self.state = SessionState::Idle;
        self.remaining_seconds = self.total_seconds;
        tracing::info!("Stopped '{}' before completion", self.exercise.name);
        true
    }

    /// Count one elapsed second.
    ///
    /// Stale tokens and non-running states are ignored. When the last second
    /// is counted the session completes and its record is appended to the sink.
    pub fn tick(&mut self, token: TickToken, now: DateTime<Utc>) -> TickOutcome {
        if token.epoch != self.epoch || self.state != SessionState::Running {
            return TickOutcome::Ignored;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return TickOutcome::Counted {
                remaining: self.remaining_seconds,
            };
        }

        TickOutcome::Completed(self.complete(now))
    }

    fn complete(&mut self, now: DateTime<Utc>) -> Completion {
        self.invalidate_ticks();
        self.state = SessionState::Completed;

        let record = SessionRecord {
            id: Uuid::new_v4(),
            user_id: self.user_id.clone(),
            exercise_name: self.exercise.name.clone(),
            duration_seconds: self.total_seconds,
            started_at: self.started_at,
            completed_at: now,
            category: self.exercise.category.clone(),
        };

        let warning = match self.sink.append(&record) {
            Ok(()) => {
                tracing::info!(
                    "Completed '{}' ({} s), record {}",
                    record.exercise_name,
                    record.duration_seconds,
                    record.id
                );
                None
            }
            Err(source) => {
                let warning = PersistenceWarning {
                    record_id: record.id,
                    source,
                };
                tracing::warn!("{}", warning);
                Some(warning)
            }
        };

        Completion { record, warning }
    }

    fn issue_token(&self) -> TickToken {
        TickToken { epoch: self.epoch }
    }

    fn invalidate_ticks(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn exercise(&self) -> &ExerciseMetadata {
        &self.exercise
    }

    pub fn total_duration(&self) -> u32 {
        self.total_seconds
    }

    pub fn remaining(&self) -> u32 {
        self.remaining_seconds
    }

    /// Seconds spent running in this attempt
    pub fn elapsed(&self) -> u32 {
        self.total_seconds - self.remaining_seconds
    }

    /// Elapsed fraction of the total, clamped to [0, 1]
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        (f64::from(self.elapsed()) / f64::from(self.total_seconds)).clamp(0.0, 1.0)
    }

    /// Running or paused
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Running | SessionState::Paused)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

/// Render seconds as `MM:SS`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    /// In-memory sink capturing every appended record
    #[derive(Default)]
    struct VecSink {
        records: Vec<SessionRecord>,
    }

    impl SessionSink for VecSink {
        fn append(&mut self, record: &SessionRecord) -> Result<()> {
            self.records.push(record.clone());
            Ok(())
        }
    }

    struct FailingSink {
        attempts: usize,
    }

    impl SessionSink for FailingSink {
        fn append(&mut self, _record: &SessionRecord) -> Result<()> {
            self.attempts += 1;
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only storage",
            )))
        }
    }

    fn pose() -> ExerciseMetadata {
        ExerciseMetadata::new("Tree Pose (Vrikshasana)").with_category("depression")
    }

    fn session(duration: i64) -> PracticeSession<VecSink> {
        PracticeSession::new("user-1", VecSink::default(), duration, pose()).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    /// Deliver `n` ticks one second apart, returning the completion if one occurred
    fn run_ticks(
        s: &mut PracticeSession<VecSink>,
        token: TickToken,
        from: DateTime<Utc>,
        n: u32,
    ) -> Option<Completion> {
        let mut completion = None;
        for i in 1..=n {
            if let TickOutcome::Completed(c) = s.tick(token, from + Duration::seconds(i64::from(i))) {
                completion = Some(c);
            }
        }
        completion
    }

    #[test]
    fn test_runs_to_completion_and_emits_one_record() {
        crate::logging::init_test();
        let mut s = session(300);
        let token = s.start(t0()).unwrap();

        let completion = run_ticks(&mut s, token, t0(), 300).expect("should complete");

        assert_eq!(s.state(), SessionState::Completed);
        assert_eq!(s.sink().records.len(), 1);
        assert!(completion.warning.is_none());
        let record = &completion.record;
        assert_eq!(record.duration_seconds, 300);
        assert_eq!(record.exercise_name, "Tree Pose (Vrikshasana)");
        assert_eq!(record.category, "depression");
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.started_at, Some(t0()));
        assert_eq!(record.completed_at, t0() + Duration::seconds(300));
    }

    #[test]
    fn test_completed_session_never_emits_twice() {
        let mut s = session(5);
        let token = s.start(t0()).unwrap();
        run_ticks(&mut s, token, t0(), 5).unwrap();

        assert!(matches!(s.tick(token, t0()), TickOutcome::Ignored));
        assert!(s.start(t0()).is_none());
        assert!(s.resume().is_none());
        assert!(!s.pause());
        assert!(!s.stop());
        assert_eq!(s.state(), SessionState::Completed);
        assert_eq!(s.sink().records.len(), 1);
    }

    #[test]
    fn test_pause_does_not_count_toward_elapsed() {
        let mut s = session(60);
        let token = s.start(t0()).unwrap();
        assert!(run_ticks(&mut s, token, t0(), 10).is_none());

        assert!(s.pause());
        assert_eq!(s.state(), SessionState::Paused);

        // Ticks that were already scheduled arrive while paused
        for i in 0..500 {
            let outcome = s.tick(token, t0() + Duration::seconds(10 + i));
            assert!(matches!(outcome, TickOutcome::Ignored));
        }
        assert_eq!(s.elapsed(), 10);

        let resumed = s.resume().unwrap();
        let later = t0() + Duration::hours(2);
        let completion = run_ticks(&mut s, resumed, later, 50).expect("should complete");

        assert_eq!(s.state(), SessionState::Completed);
        assert_eq!(s.elapsed(), 60);
        assert_eq!(completion.record.duration_seconds, 60);
        assert_eq!(s.sink().records.len(), 1);
    }

    #[test]
    fn test_rapid_pause_resume_is_idempotent() {
        let mut s = session(30);
        let mut token = s.start(t0()).unwrap();
        run_ticks(&mut s, token, t0(), 5);

        for _ in 0..20 {
            s.pause();
            s.pause();
            token = s.resume().unwrap();
            assert!(s.resume().is_none());
        }

        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.elapsed(), 5);
        assert!(run_ticks(&mut s, token, t0(), 25).is_some());
    }

    #[test]
    fn test_stop_resets_without_record() {
        let mut s = session(120);
        let token = s.start(t0()).unwrap();
        run_ticks(&mut s, token, t0(), 45);

        assert!(s.stop());
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.remaining(), 120);
        assert!(s.sink().records.is_empty());

        // A tick scheduled before the stop cannot resurrect the session
        assert!(matches!(s.tick(token, t0()), TickOutcome::Ignored));
        assert_eq!(s.remaining(), 120);
    }

    #[test]
    fn test_stop_from_paused() {
        let mut s = session(20);
        let token = s.start(t0()).unwrap();
        run_ticks(&mut s, token, t0(), 3);
        s.pause();

        assert!(s.stop());
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.remaining(), 20);
    }

    #[test]
    fn test_restart_after_stop_keeps_first_start_timestamp() {
        let mut s = session(10);
        let token = s.start(t0()).unwrap();
        run_ticks(&mut s, token, t0(), 2);
        s.stop();

        let later = t0() + Duration::minutes(5);
        let token = s.start(later).unwrap();
        assert_eq!(s.started_at(), Some(t0()));

        let completion = run_ticks(&mut s, token, later, 10).unwrap();
        assert_eq!(completion.record.started_at, Some(t0()));
    }

    #[test]
    fn test_configure_while_running_is_rejected() {
        let mut s = session(60);
        let token = s.start(t0()).unwrap();
        run_ticks(&mut s, token, t0(), 7);

        let err = s.configure(300, pose()).unwrap_err();
        assert!(matches!(err, Error::SessionBusy { state: SessionState::Running }));
        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.remaining(), 53);
        assert_eq!(s.total_duration(), 60);

        // The original run continues undisturbed
        assert!(matches!(s.tick(token, t0()), TickOutcome::Counted { remaining: 52 }));
    }

    #[test]
    fn test_non_positive_duration_is_rejected() {
        let mut s = session(60);

        assert!(matches!(s.configure(0, pose()), Err(Error::InvalidDuration(0))));
        assert!(matches!(s.configure(-5, pose()), Err(Error::InvalidDuration(-5))));
        let too_long = i64::from(u32::MAX) + 1;
        assert!(matches!(
            s.configure(too_long, pose()),
            Err(Error::InvalidDuration(d)) if d == too_long
        ));
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.total_duration(), 60);

        let fresh = PracticeSession::new("user-1", VecSink::default(), 0, pose());
        assert!(matches!(fresh, Err(Error::InvalidDuration(0))));
    }

    #[test]
    fn test_configure_while_paused_resets_attempt() {
        let mut s = session(60);
        let token = s.start(t0()).unwrap();
        run_ticks(&mut s, token, t0(), 20);
        s.pause();

        s.configure(90, ExerciseMetadata::new("Boat Pose (Navasana)"))
            .unwrap();

        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.remaining(), 90);
        assert_eq!(s.started_at(), None);
        assert_eq!(s.exercise().category, "general");
        assert!(s.resume().is_none());
    }

    #[test]
    fn test_configure_after_completion_allows_new_record() {
        let mut s = session(3);
        let token = s.start(t0()).unwrap();
        run_ticks(&mut s, token, t0(), 3).unwrap();

        s.configure(2, pose()).unwrap();
        let token = s.start(t0()).unwrap();
        run_ticks(&mut s, token, t0(), 2).unwrap();

        let records = &s.sink().records;
        assert_eq!(records.len(), 2);
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn test_persistence_failure_keeps_completed_state() {
        let mut s =
            PracticeSession::new("user-1", FailingSink { attempts: 0 }, 2, pose()).unwrap();
        let token = s.start(t0()).unwrap();
        s.tick(token, t0());

        let TickOutcome::Completed(completion) = s.tick(token, t0()) else {
            panic!("expected completion");
        };
        let warning = completion.warning.expect("warning expected");
        assert_eq!(warning.record_id, completion.record.id);
        assert_eq!(s.state(), SessionState::Completed);
        assert_eq!(s.progress(), 1.0);

        assert!(matches!(s.tick(token, t0()), TickOutcome::Ignored));
        assert_eq!(s.sink().attempts, 1);
    }

    #[test]
    fn test_idle_operations_are_noops() {
        let mut s = session(10);
        assert!(!s.pause());
        assert!(s.resume().is_none());
        assert!(!s.stop());
        assert!(!s.is_active());
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_derived_queries() {
        let mut s = session(40);
        assert_eq!(s.progress(), 0.0);

        let token = s.start(t0()).unwrap();
        run_ticks(&mut s, token, t0(), 10);

        assert!(s.is_active());
        assert_eq!(s.elapsed(), 10);
        assert_eq!(s.remaining(), 30);
        assert!((s.progress() - 0.25).abs() < f64::EPSILON);

        s.pause();
        assert!(s.is_active());
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(300), "05:00");
        assert_eq!(format_clock(1805), "30:05");
    }
}
