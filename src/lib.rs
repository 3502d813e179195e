#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(
    clippy::use_self,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::missing_panics_doc
)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

//! An alarm scheduler: any number of producer threads submit timed alarms and
//! a single dispatcher thread fires them in deadline order, waking early when
//! a producer submits something due sooner than what it is waiting on.

pub mod alarm;
pub mod clock;
pub mod communication;
pub mod config;
pub mod coordinator;
/// the timer thread
pub mod dispatcher;
pub mod request;
pub mod store;
pub mod validator;

pub use alarm::{AlarmKind, AlarmRecord, Deadline};
pub use clock::{Clock, ManualClock, SystemClock};
pub use communication::Event;
pub use coordinator::{Coordinator, DispatcherState, Schedule};
pub use dispatcher::Dispatcher;
pub use request::{ParseError, Request};
pub use store::{AlarmStore, InsertOutcome};
pub use validator::ValidationError;
