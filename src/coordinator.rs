//! The one lock everything shares.
//!
//! [`Coordinator`] owns the [`AlarmStore`] and the [`DispatcherState`] behind a
//! single mutex so they are always read and written together, plus the condvar
//! the dispatcher sleeps on. Producers go through [`Coordinator::submit`]; the
//! dispatcher is the only caller of the waiting half.

use chrono::Local;
use crossbeam_channel::Sender;
use log::{debug, warn};
use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::{
    alarm::{AlarmRecord, Deadline},
    clock::{Clock, SystemClock},
    communication::Event,
    request::Request,
    store::{AlarmStore, InsertOutcome},
    validator::{self, ValidationError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatcherState {
    /// not waiting on any particular alarm
    #[default]
    Idle,
    /// asleep until this deadline
    Armed(Deadline),
}

impl DispatcherState {
    /// whether an alarm due at `deadline` has to interrupt the dispatcher
    #[must_use]
    pub fn is_preempted_by(self, deadline: Deadline) -> bool {
        match self {
            Self::Idle => true,
            Self::Armed(armed) => deadline < armed,
        }
    }
}

/// everything guarded by the coordinator's lock
#[derive(Debug, Default)]
pub struct Schedule {
    pub(crate) store: AlarmStore,
    pub(crate) state: DispatcherState,
}

impl Schedule {
    #[must_use]
    pub const fn store(&self) -> &AlarmStore {
        &self.store
    }

    #[must_use]
    pub const fn state(&self) -> DispatcherState {
        self.state
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitOutcome {
    TimedOut,
    Woken,
}

#[derive(Debug)]
pub struct Coordinator<C = SystemClock> {
    schedule: Mutex<Schedule>,
    wake: Condvar,
    clock: C,
    events: Sender<Event>,
}

impl<C: Clock> Coordinator<C> {
    #[must_use]
    pub fn new(clock: C, events: Sender<Event>) -> Self {
        Self {
            schedule: Mutex::new(Schedule::default()),
            wake: Condvar::new(),
            clock,
            events,
        }
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// runs `f` with the store and dispatcher state locked
    ///
    /// The lock is released however `f` exits. It is not reentrant, so `f` must
    /// not call back into the coordinator.
    pub fn with_exclusive_access<R>(&self, f: impl FnOnce(&mut Schedule) -> R) -> R {
        f(&mut self.schedule.lock())
    }

    #[must_use]
    pub fn state(&self) -> DispatcherState {
        self.schedule.lock().state
    }

    /// nudges the dispatcher into looking at the clock and the store again
    ///
    /// Takes the lock first so the signal cannot slip in between the
    /// dispatcher reading the clock and going to sleep.
    pub fn wake(&self) {
        let _schedule = self.schedule.lock();
        self.wake.notify_one();
    }

    /// validates and inserts `request` as one critical section, waking the
    /// dispatcher if the new alarm is due before the one it is waiting on
    ///
    /// # Errors
    /// the [`ValidationError`] the request broke; nothing is inserted
    pub fn submit(&self, request: Request) -> Result<InsertOutcome, ValidationError> {
        self.with_exclusive_access(|schedule| -> Result<_, ValidationError> {
            validator::validate(&request, &schedule.store)?;
            let record = AlarmRecord::new(request, self.clock.now());
            let (kind, message_number, deadline) =
                (record.kind, record.message_number, record.deadline);
            let outcome = schedule.store.insert(record);
            if schedule.state.is_preempted_by(deadline) {
                debug!("waking dispatcher for {deadline} (was {:?})", schedule.state);
                schedule.state = DispatcherState::Armed(deadline);
                self.wake.notify_one();
            }
            // still under the lock so events come out in insertion order
            self.notify(Event::Inserted {
                kind,
                message_number,
                outcome,
                timestamp: Local::now(),
            });
            Ok(outcome)
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Schedule> {
        self.schedule.lock()
    }

    /// sleeps until woken, releasing the lock meanwhile
    pub(crate) fn wait(&self, schedule: &mut MutexGuard<'_, Schedule>) {
        self.wake.wait(schedule);
    }

    /// sleeps until woken or until `deadline`, releasing the lock meanwhile
    ///
    /// A deadline the clock can't measure a wait for only ends on a wake.
    pub(crate) fn wait_until(
        &self,
        schedule: &mut MutexGuard<'_, Schedule>,
        deadline: Deadline,
    ) -> WaitOutcome {
        let Some(timeout) = self.clock.remaining(deadline) else {
            self.wait(schedule);
            return WaitOutcome::Woken;
        };
        if self.wake.wait_for(schedule, timeout).timed_out() {
            WaitOutcome::TimedOut
        } else {
            WaitOutcome::Woken
        }
    }

    pub(crate) fn notify(&self, event: Event) {
        if self.events.send(event).is_err() {
            warn!("no one is listening for alarm events");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{alarm::AlarmKind, clock::ManualClock};

    fn coordinator() -> (Coordinator<ManualClock>, crossbeam_channel::Receiver<Event>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let clock = ManualClock::new(Deadline::from_secs(1_000));
        (Coordinator::new(clock, sender), receiver)
    }

    #[test]
    fn idle_dispatcher_is_always_preempted() {
        assert!(DispatcherState::Idle.is_preempted_by(Deadline::from_secs(i64::MAX)));
        let armed = DispatcherState::Armed(Deadline::from_secs(10));
        assert!(armed.is_preempted_by(Deadline::from_secs(9)));
        assert!(!armed.is_preempted_by(Deadline::from_secs(10)));
        assert!(!armed.is_preempted_by(Deadline::from_secs(11)));
    }

    #[test]
    fn submit_arms_only_for_earlier_deadlines() {
        let (coordinator, _events) = coordinator();
        coordinator
            .submit(Request::create(10, 1, 1, "later".to_string()))
            .unwrap();
        assert_eq!(
            coordinator.state(),
            DispatcherState::Armed(Deadline::from_secs(1_010))
        );
        coordinator
            .submit(Request::create(20, 1, 2, "even later".to_string()))
            .unwrap();
        assert_eq!(
            coordinator.state(),
            DispatcherState::Armed(Deadline::from_secs(1_010))
        );
        coordinator
            .submit(Request::create(2, 1, 3, "sooner".to_string()))
            .unwrap();
        assert_eq!(
            coordinator.state(),
            DispatcherState::Armed(Deadline::from_secs(1_002))
        );
    }

    #[test]
    fn replacement_is_reported() {
        let (coordinator, events) = coordinator();
        let first = coordinator.submit(Request::create(5, 1, 1, "a".to_string()));
        let second = coordinator.submit(Request::create(10, 1, 1, "b".to_string()));
        assert_eq!(first, Ok(InsertOutcome::Appended));
        assert_eq!(second, Ok(InsertOutcome::Replaced));

        let outcomes: Vec<_> = events
            .try_iter()
            .map(|event| match event {
                Event::Inserted { outcome, .. } => outcome,
                Event::Fired { .. } => panic!("nothing should fire"),
            })
            .collect();
        assert_eq!(outcomes, [InsertOutcome::Appended, InsertOutcome::Replaced]);

        coordinator.with_exclusive_access(|schedule| {
            let ones: Vec<_> = schedule.store().find_all(|r| r.is_create(1)).collect();
            assert_eq!(ones.len(), 1);
            assert_eq!(ones[0].deadline, Deadline::from_secs(1_010));
            assert_eq!(ones[0].payload, "b");
        });
    }

    #[test]
    fn rejected_cancel_changes_nothing() {
        let (coordinator, events) = coordinator();
        let before = coordinator.state();
        assert_eq!(
            coordinator.submit(Request::cancel(9)),
            Err(ValidationError::NoMatchingAlarm(9))
        );
        assert_eq!(coordinator.state(), before);
        assert!(coordinator.with_exclusive_access(|schedule| schedule.store().is_empty()));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn control_records_are_due_now() {
        let (coordinator, events) = coordinator();
        coordinator
            .submit(Request::create(30, 2, 4, "x".to_string()))
            .unwrap();
        coordinator.submit(Request::cancel(4)).unwrap();
        assert_eq!(
            coordinator.state(),
            DispatcherState::Armed(Deadline::from_secs(1_000))
        );
        let kinds: Vec<_> = events
            .try_iter()
            .filter_map(|event| match event {
                Event::Inserted { kind, .. } => Some(kind),
                Event::Fired { .. } => None,
            })
            .collect();
        assert_eq!(kinds, [AlarmKind::Create, AlarmKind::Cancel]);
    }

    #[test]
    fn events_without_a_listener_are_dropped() {
        let (coordinator, events) = coordinator();
        drop(events);
        assert!(coordinator
            .submit(Request::generic(1, "nobody hears".to_string()))
            .is_ok());
    }

    #[test]
    fn unmeasurable_deadline_waits_for_a_wake() {
        use std::{
            sync::Arc,
            thread,
            time::{Duration, Instant},
        };

        let (sender, _events) = crossbeam_channel::unbounded();
        let coordinator = Arc::new(Coordinator::new(SystemClock, sender));
        let far = coordinator.clock().now().after(10_000_000_000_000);

        let waker = Arc::clone(&coordinator);
        let started = Instant::now();
        let mut schedule = coordinator.lock();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            waker.wake();
        });
        assert_eq!(
            coordinator.wait_until(&mut schedule, far),
            WaitOutcome::Woken
        );
        assert!(started.elapsed() >= Duration::from_millis(100));
    }
}
