use chrono::{DateTime, Duration, Utc};

/// Safety-net save schedule with a single pending deadline.
///
/// Any save, manual or automatic, calls [`AutoSaveTimer::reschedule`], so at
/// most one automatic save is ever pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSaveTimer {
    interval: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl AutoSaveTimer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Replace any pending deadline with `now + interval`.
    ///
    /// A deadline past the representable range leaves nothing pending.
    pub fn reschedule(&mut self, now: DateTime<Utc>) {
        self.deadline = now.checked_add_signed(self.interval);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}
