//! Sources of "now" for the scheduler.
//!
//! The dispatcher only ever asks two things of a clock: what second it is, and
//! how long a bounded wait for a deadline should last. [`SystemClock`] answers
//! from the wall clock; [`ManualClock`] lets tests move time by hand and then
//! [`wake`](crate::Coordinator::wake) the dispatcher so it looks again.

use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::Utc;

use crate::alarm::Deadline;

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Deadline;

    /// how long until `deadline`, zero once it has passed
    ///
    /// `None` means the deadline is too far out to put a bound on the wait.
    fn remaining(&self, deadline: Deadline) -> Option<Duration>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Deadline {
        Deadline::from_secs(Utc::now().timestamp())
    }

    fn remaining(&self, deadline: Deadline) -> Option<Duration> {
        let at = deadline.to_datetime()?;
        Some((at - Utc::now()).to_std().unwrap_or(Duration::ZERO))
    }
}

/// a clock that only moves when told to
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    secs: Arc<AtomicI64>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: Deadline) -> Self {
        Self {
            secs: Arc::new(AtomicI64::new(start.as_secs())),
        }
    }

    pub fn advance(&self, secs: i64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Deadline {
        Deadline::from_secs(self.secs.load(Ordering::SeqCst))
    }

    fn remaining(&self, deadline: Deadline) -> Option<Duration> {
        let secs = deadline.as_secs().saturating_sub(self.now().as_secs());
        Some(Duration::from_secs(u64::try_from(secs).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new(Deadline::from_secs(50));
        let other = clock.clone();
        other.advance(5);
        assert_eq!(clock.now(), Deadline::from_secs(55));
        assert_eq!(
            clock.remaining(Deadline::from_secs(60)),
            Some(Duration::from_secs(5))
        );
        assert_eq!(clock.remaining(Deadline::from_secs(10)), Some(Duration::ZERO));
    }

    #[test]
    fn system_clock_waits_for_future_deadlines_only() {
        let clock = SystemClock;
        let now = clock.now();
        assert!(clock.remaining(now.after(3)) > Some(Duration::from_secs(1)));
        assert_eq!(clock.remaining(Deadline::from_secs(0)), Some(Duration::ZERO));
    }

    #[test]
    fn system_clock_leaves_unrepresentable_deadlines_unbounded() {
        let clock = SystemClock;
        let far = clock.now().after(10_000_000_000_000);
        assert!(far > clock.now());
        assert_eq!(clock.remaining(far), None);
        assert_eq!(clock.remaining(Deadline::from_secs(i64::MAX)), None);
    }
}
