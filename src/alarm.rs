use std::fmt;

use chrono::{DateTime, Utc};

use crate::request::Request;

/// longest payload an alarm keeps, in characters
pub const MAX_PAYLOAD_LEN: usize = 128;

/// an absolute point in time with whole second granularity
/// (seconds since the unix epoch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Deadline(i64);

impl Deadline {
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    #[must_use]
    pub const fn as_secs(self) -> i64 {
        self.0
    }

    /// the deadline `secs` seconds after this one
    #[must_use]
    pub fn after(self, secs: u64) -> Self {
        Self(self.0.saturating_add(i64::try_from(secs).unwrap_or(i64::MAX)))
    }

    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.0, 0)
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(time) => write!(f, "{}", time.format("%Y-%m-%d %H:%M:%S UTC")),
            None => write!(f, "{}s", self.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmKind {
    /// a numbered message alarm, replaced by a later create with the same number
    Create,
    Cancel,
    PauseThread,
    ResumeThread,
    /// a plain delayed message without type or number
    Generic,
}

impl AlarmKind {
    /// control kinds only carry an effect and fire as soon as they are inserted
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, Self::Cancel | Self::PauseThread | Self::ResumeThread)
    }
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => stringify!(Create),
            Self::Cancel => stringify!(Cancel),
            Self::PauseThread => stringify!(PauseThread),
            Self::ResumeThread => stringify!(ResumeThread),
            Self::Generic => stringify!(Generic),
        })
    }
}

/// represents one scheduled alarm
/// the store orders alarms only by `deadline`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmRecord {
    pub kind: AlarmKind,
    pub message_type: u32,
    pub message_number: u32,
    /// what was asked for at submission, only used when the alarm fires
    pub seconds_from_now: u64,
    pub deadline: Deadline,
    pub payload: String,
}

impl AlarmRecord {
    /// builds the record for a request submitted at `now`
    #[must_use]
    pub fn new(request: Request, now: Deadline) -> Self {
        let Request {
            kind,
            message_type,
            message_number,
            seconds_from_now,
            mut payload,
        } = request;
        if let Some((cut, _)) = payload.char_indices().nth(MAX_PAYLOAD_LEN) {
            payload.truncate(cut);
        }
        Self {
            kind,
            message_type,
            message_number,
            seconds_from_now,
            deadline: now.after(seconds_from_now),
            payload,
        }
    }

    #[must_use]
    pub fn is_create(&self, message_number: u32) -> bool {
        self.kind == AlarmKind::Create && self.message_number == message_number
    }
}

impl fmt::Display for AlarmRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} type {} #{} at {} ({}s): {}",
            self.kind,
            self.message_type,
            self.message_number,
            self.deadline,
            self.seconds_from_now,
            self.payload
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_is_submission_plus_delay() {
        let record = AlarmRecord::new(
            Request::create(5, 1, 7, "wake up".to_string()),
            Deadline::from_secs(100),
        );
        assert_eq!(record.deadline, Deadline::from_secs(105));
        assert_eq!(record.seconds_from_now, 5);
        assert_eq!(record.payload, "wake up");
    }

    #[test]
    fn control_records_are_due_at_submission() {
        let record = AlarmRecord::new(Request::cancel(7), Deadline::from_secs(100));
        assert_eq!(record.deadline, Deadline::from_secs(100));
        assert!(record.kind.is_control());
    }

    #[test]
    fn payload_is_truncated_on_char_boundary() {
        let long = "é".repeat(MAX_PAYLOAD_LEN + 10);
        let record = AlarmRecord::new(Request::generic(1, long), Deadline::default());
        assert_eq!(record.payload.chars().count(), MAX_PAYLOAD_LEN);
    }

    #[test]
    fn huge_delay_saturates() {
        let deadline = Deadline::from_secs(10).after(u64::MAX);
        assert_eq!(deadline.as_secs(), i64::MAX);
    }
}
