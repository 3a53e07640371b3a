//! Stored row types.

use time::OffsetDateTime;

use govee_types::SyncStatus;

/// Bookkeeping row for a named sync job.
///
/// The scheduling gate reads this to decide whether a run is due, and the
/// run reports back through it. Invariant: `last_status == Success` implies
/// `last_success_at` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    pub job_name: String,
    pub last_attempt_at: Option<OffsetDateTime>,
    pub last_success_at: Option<OffsetDateTime>,
    pub last_status: SyncStatus,
    pub last_error: String,
    pub updated_at: OffsetDateTime,
}

impl SyncState {
    /// When the job is next due, given the configured interval.
    /// `None` means it has never succeeded and is due immediately.
    pub fn next_due(&self, interval: time::Duration) -> Option<OffsetDateTime> {
        self.last_success_at.map(|at| at + interval)
    }

    /// Whether a run is due at `now` for the given interval.
    pub fn is_due(&self, now: OffsetDateTime, interval: time::Duration) -> bool {
        match self.next_due(interval) {
            Some(due_at) => now >= due_at,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(last_success_at: Option<OffsetDateTime>) -> SyncState {
        SyncState {
            job_name: "history-sync".to_string(),
            last_attempt_at: None,
            last_success_at,
            last_status: last_success_at
                .map(|_| SyncStatus::Success)
                .unwrap_or(SyncStatus::Never),
            last_error: String::new(),
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_never_succeeded_is_due() {
        let now = OffsetDateTime::UNIX_EPOCH + time::Duration::days(100);
        assert!(state(None).is_due(now, time::Duration::days(4)));
        assert!(state(None).next_due(time::Duration::days(4)).is_none());
    }

    #[test]
    fn test_due_only_after_interval() {
        let success = OffsetDateTime::UNIX_EPOCH + time::Duration::days(100);
        let state = state(Some(success));
        let interval = time::Duration::days(4);

        assert!(!state.is_due(success + time::Duration::days(3), interval));
        assert!(state.is_due(success + time::Duration::days(4), interval));
        assert!(state.is_due(success + time::Duration::days(10), interval));
        assert_eq!(state.next_due(interval), Some(success + interval));
    }
}
