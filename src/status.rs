//! Pure status-transition and timestamp-bookkeeping engine for subtasks.
//!
//! The engine maps a requested target status onto new lifecycle timestamps
//! without touching the store, so every null-vs-preserve-vs-overwrite rule
//! can be tested field by field.

use crate::types::Status;
use chrono::{DateTime, Utc};

/// Lifecycle timestamps carried by a subtask row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleStamps {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Compute the timestamps resulting from transitioning to `target` at `now`.
///
/// Rules, per target:
/// - Pending: full reset, both lifecycle timestamps cleared.
/// - In progress: keep an existing start time, otherwise stamp it now;
///   completion time is always cleared.
/// - Completed: backfill a missing start time so a completed subtask is
///   always started; completion time is refreshed even if already set.
///
/// `updated_at` advances to `now` on every transition.
pub fn apply_transition(
    prior: &LifecycleStamps,
    target: Status,
    now: DateTime<Utc>,
) -> LifecycleStamps {
    match target {
        Status::Pending => LifecycleStamps {
            started_at: None,
            completed_at: None,
            updated_at: now,
        },
        Status::InProgress => LifecycleStamps {
            started_at: prior.started_at.or(Some(now)),
            completed_at: None,
            updated_at: now,
        },
        Status::Completed => LifecycleStamps {
            started_at: prior.started_at.or(Some(now)),
            completed_at: Some(now),
            updated_at: now,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn fresh(updated: i64) -> LifecycleStamps {
        LifecycleStamps {
            started_at: None,
            completed_at: None,
            updated_at: ts(updated),
        }
    }

    #[test]
    fn pending_resets_everything() {
        let prior = LifecycleStamps {
            started_at: Some(ts(10)),
            completed_at: Some(ts(20)),
            updated_at: ts(20),
        };
        let next = apply_transition(&prior, Status::Pending, ts(30));
        assert_eq!(next.started_at, None);
        assert_eq!(next.completed_at, None);
        assert_eq!(next.updated_at, ts(30));
    }

    #[test]
    fn in_progress_stamps_start_when_missing() {
        let next = apply_transition(&fresh(0), Status::InProgress, ts(15));
        assert_eq!(next.started_at, Some(ts(15)));
        assert_eq!(next.completed_at, None);
        assert_eq!(next.updated_at, ts(15));
    }

    #[test]
    fn in_progress_preserves_existing_start() {
        let prior = LifecycleStamps {
            started_at: Some(ts(5)),
            completed_at: None,
            updated_at: ts(5),
        };
        let next = apply_transition(&prior, Status::InProgress, ts(25));
        assert_eq!(next.started_at, Some(ts(5)));
        assert_eq!(next.updated_at, ts(25));
    }

    #[test]
    fn in_progress_clears_completion() {
        let prior = LifecycleStamps {
            started_at: Some(ts(5)),
            completed_at: Some(ts(10)),
            updated_at: ts(10),
        };
        let next = apply_transition(&prior, Status::InProgress, ts(20));
        assert_eq!(next.started_at, Some(ts(5)));
        assert_eq!(next.completed_at, None);
    }

    #[test]
    fn completed_backfills_start_for_never_started() {
        let next = apply_transition(&fresh(0), Status::Completed, ts(40));
        assert_eq!(next.started_at, Some(ts(40)));
        assert_eq!(next.completed_at, Some(ts(40)));
        assert!(next.started_at.unwrap() <= next.completed_at.unwrap());
    }

    #[test]
    fn completed_keeps_existing_start() {
        let prior = LifecycleStamps {
            started_at: Some(ts(7)),
            completed_at: None,
            updated_at: ts(7),
        };
        let next = apply_transition(&prior, Status::Completed, ts(50));
        assert_eq!(next.started_at, Some(ts(7)));
        assert_eq!(next.completed_at, Some(ts(50)));
    }

    #[test]
    fn repeated_completion_refreshes_completed_at_only() {
        let first = apply_transition(&fresh(0), Status::Completed, ts(100));
        let second = apply_transition(&first, Status::Completed, ts(200));
        assert_eq!(second.started_at, first.started_at);
        assert_eq!(second.completed_at, Some(ts(200)));
        assert!(second.completed_at > first.completed_at);
    }

    #[test]
    fn every_transition_advances_updated_at() {
        let prior = LifecycleStamps {
            started_at: Some(ts(1)),
            completed_at: Some(ts(2)),
            updated_at: ts(2),
        };
        for target in [Status::Pending, Status::InProgress, Status::Completed] {
            let next = apply_transition(&prior, target, ts(99));
            assert_eq!(next.updated_at, ts(99));
        }
    }

    #[test]
    fn round_trip_pending_then_completed_restamps_start() {
        let started = apply_transition(&fresh(0), Status::InProgress, ts(10));
        let reset = apply_transition(&started, Status::Pending, ts(20));
        assert_eq!(reset.started_at, None);
        let done = apply_transition(&reset, Status::Completed, ts(30));
        assert_eq!(done.started_at, Some(ts(30)));
        assert_eq!(done.completed_at, Some(ts(30)));
    }
}
