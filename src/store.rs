//! The ordered set of pending alarms.
//!
//! Alarms are keyed by `(deadline, arrival)` so iteration order is firing
//! order and equal deadlines fire first come first served. Creates are also
//! indexed by message number so a replacement finds its predecessor without a
//! scan.
//!
//! Besides the pending alarms the store keeps the message types that are
//! currently paused, along with the creates that came due while their type was
//! paused.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::alarm::{AlarmKind, AlarmRecord, Deadline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Appended,
    /// an earlier create with the same message number was dropped
    Replaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Slot {
    deadline: Deadline,
    arrival: u64,
}

#[derive(Debug, Default)]
pub struct AlarmStore {
    pending: BTreeMap<Slot, AlarmRecord>,
    creates: HashMap<u32, Slot>,
    /// paused message types and the creates held back for them
    paused: BTreeMap<u32, Vec<AlarmRecord>>,
    arrivals: u64,
}

impl AlarmStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// adds `record` in deadline order, replacing any create with the same message number
    pub fn insert(&mut self, record: AlarmRecord) -> InsertOutcome {
        let outcome = if record.kind == AlarmKind::Create
            && self.remove_create(record.message_number).is_some()
        {
            InsertOutcome::Replaced
        } else {
            InsertOutcome::Appended
        };

        let slot = Slot {
            deadline: record.deadline,
            arrival: self.arrivals,
        };
        self.arrivals += 1;
        if record.kind == AlarmKind::Create {
            self.creates.insert(record.message_number, slot);
        }
        debug!("{outcome:?} {record}");
        self.pending.insert(slot, record);
        outcome
    }

    pub fn pop_earliest(&mut self) -> Option<AlarmRecord> {
        let (_, record) = self.pending.pop_first()?;
        if record.kind == AlarmKind::Create {
            self.creates.remove(&record.message_number);
        }
        Some(record)
    }

    #[must_use]
    pub fn earliest_deadline(&self) -> Option<Deadline> {
        self.pending.first_key_value().map(|(slot, _)| slot.deadline)
    }

    /// every alarm the store still owns matching `predicate`: pending ones in
    /// firing order, then held ones
    pub fn find_all<'a, P>(&'a self, mut predicate: P) -> impl Iterator<Item = &'a AlarmRecord> + 'a
    where
        P: FnMut(&AlarmRecord) -> bool + 'a,
    {
        self.pending
            .values()
            .chain(self.paused.values().flatten())
            .filter(move |record| predicate(*record))
    }

    /// the pending alarms in firing order
    pub fn iter(&self) -> impl Iterator<Item = &AlarmRecord> {
        self.pending.values()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// removes the create with `message_number`, whether pending or held
    pub fn cancel(&mut self, message_number: u32) -> Option<AlarmRecord> {
        self.remove_create(message_number)
    }

    /// returns false if `message_type` was already paused
    pub fn pause(&mut self, message_type: u32) -> bool {
        if self.paused.contains_key(&message_type) {
            return false;
        }
        self.paused.insert(message_type, Vec::new());
        true
    }

    #[must_use]
    pub fn is_paused(&self, message_type: u32) -> bool {
        self.paused.contains_key(&message_type)
    }

    /// keeps an expired create until its type is resumed
    ///
    /// # Errors
    /// gives the record back if its type is not paused
    pub fn hold(&mut self, record: AlarmRecord) -> Result<(), AlarmRecord> {
        match self.paused.get_mut(&record.message_type) {
            Some(held) => {
                debug!("holding {record}");
                held.push(record);
                Ok(())
            }
            None => Err(record),
        }
    }

    /// unpauses `message_type`, handing back what was held for it
    pub fn resume(&mut self, message_type: u32) -> Vec<AlarmRecord> {
        self.paused.remove(&message_type).unwrap_or_default()
    }

    fn remove_create(&mut self, message_number: u32) -> Option<AlarmRecord> {
        if let Some(slot) = self.creates.remove(&message_number) {
            return self.pending.remove(&slot);
        }
        self.paused.values_mut().find_map(|held| {
            let at = held
                .iter()
                .position(|record| record.is_create(message_number))?;
            Some(held.remove(at))
        })
    }
}
