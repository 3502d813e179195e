//! The timer thread.
//!
//! ```text
//!            store empty: wait
//!   Idle ─────────────────────────► Idle
//!    │ earliest not due yet
//!    ▼
//!   Armed(d) ── woken, state changed ──► Idle   (an earlier alarm arrived)
//!    │  │
//!    │  └─ woken, state unchanged ─► Armed(d)  (spurious, wait again)
//!    │ d reached
//!    ▼
//!   fire earliest ──► Idle
//! ```
//!
//! The awaited alarm stays in the store while the dispatcher sleeps on it, so
//! a preempting arrival simply competes with it on the next pass and cancels
//! or replacements always see it.

use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
};

use log::{debug, info, trace, warn};
use parking_lot::MutexGuard;

use crate::{
    alarm::{AlarmKind, AlarmRecord, Deadline},
    clock::{Clock, SystemClock},
    communication::Event,
    coordinator::{Coordinator, DispatcherState, Schedule},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wakeup {
    Expired,
    Preempted,
}

#[derive(Debug)]
pub struct Dispatcher<C: Clock = SystemClock> {
    coordinator: Arc<Coordinator<C>>,
}

impl<C: Clock> Dispatcher<C> {
    #[must_use]
    pub const fn new(coordinator: Arc<Coordinator<C>>) -> Self {
        Self { coordinator }
    }

    /// runs the dispatcher on its own thread, it lives until the process exits
    ///
    /// # Errors
    /// if the thread could not be spawned
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("alarm-dispatcher".to_string())
            .spawn(move || self.run())
    }

    pub fn run(&self) -> ! {
        let mut schedule = self.coordinator.lock();
        info!("alarm dispatcher started");
        loop {
            schedule.state = DispatcherState::Idle;
            while schedule.store.is_empty() {
                trace!("no alarms, waiting");
                self.coordinator.wait(&mut schedule);
            }
            let Some(deadline) = schedule.store.earliest_deadline() else {
                continue;
            };
            if deadline > self.coordinator.clock().now() {
                schedule.state = DispatcherState::Armed(deadline);
                if self.await_deadline(&mut schedule, deadline) == Wakeup::Preempted {
                    continue;
                }
            }
            self.fire_expired(&mut schedule);
        }
    }

    fn await_deadline(
        &self,
        schedule: &mut MutexGuard<'_, Schedule>,
        deadline: Deadline,
    ) -> Wakeup {
        loop {
            trace!("armed for {deadline}");
            let outcome = self.coordinator.wait_until(schedule, deadline);
            if schedule.state != DispatcherState::Armed(deadline) {
                debug!("preempted while waiting for {deadline} by {:?}", schedule.state);
                return Wakeup::Preempted;
            }
            if self.coordinator.clock().now() >= deadline {
                return Wakeup::Expired;
            }
            trace!("{outcome:?} before {deadline}");
        }
    }

    fn fire_expired(&self, schedule: &mut Schedule) {
        let now = self.coordinator.clock().now();
        match schedule.store.earliest_deadline() {
            Some(deadline) if deadline <= now => {
                if let Some(record) = schedule.store.pop_earliest() {
                    self.fire(schedule, record);
                }
            }
            // what we waited on was replaced by a later one
            _ => debug!("nothing due at {now}"),
        }
    }

    fn fire(&self, schedule: &mut Schedule, record: AlarmRecord) {
        let record = match record.kind {
            AlarmKind::Create => match schedule.store.hold(record) {
                Ok(()) => return,
                Err(record) => record,
            },
            AlarmKind::Cancel => {
                match schedule.store.cancel(record.message_number) {
                    Some(canceled) => info!("canceled {canceled}"),
                    None => info!(
                        "alarm {} was gone before it could be canceled",
                        record.message_number
                    ),
                }
                record
            }
            AlarmKind::PauseThread => {
                if schedule.store.pause(record.message_type) {
                    info!("paused message type {}", record.message_type);
                } else {
                    warn!("message type {} was already paused", record.message_type);
                }
                record
            }
            AlarmKind::ResumeThread => {
                let released = schedule.store.resume(record.message_type);
                info!(
                    "resumed message type {}, releasing {} held alarms",
                    record.message_type,
                    released.len()
                );
                self.emit(record);
                released.into_iter().for_each(|held| self.emit(held));
                return;
            }
            AlarmKind::Generic => record,
        };
        self.emit(record);
    }

    fn emit(&self, record: AlarmRecord) {
        info!("firing {record}");
        self.coordinator.notify(Event::Fired {
            kind: record.kind,
            message_number: record.message_number,
            seconds_requested: record.seconds_from_now,
            payload: record.payload,
        });
    }
}
