use chrono::{DateTime, Local};

use crate::{alarm::AlarmKind, store::InsertOutcome};

/// what the scheduler reports to whoever displays its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Inserted {
        kind: AlarmKind,
        message_number: u32,
        outcome: InsertOutcome,
        timestamp: DateTime<Local>,
    },
    Fired {
        kind: AlarmKind,
        message_number: u32,
        seconds_requested: u64,
        payload: String,
    },
}

impl Event {
    /// one line of output, `time_format` is a chrono format string
    #[must_use]
    pub fn render(&self, time_format: &str) -> String {
        match self {
            Self::Inserted {
                kind,
                message_number,
                outcome: InsertOutcome::Appended,
                timestamp,
            } => format!(
                "{kind} alarm {message_number} inserted at {}",
                timestamp.format(time_format)
            ),
            Self::Inserted {
                kind,
                message_number,
                outcome: InsertOutcome::Replaced,
                timestamp,
            } => format!(
                "{kind} alarm {message_number} replaced at {}",
                timestamp.format(time_format)
            ),
            Self::Fired {
                seconds_requested,
                payload,
                ..
            } => format!("({seconds_requested}) {payload}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn renders_events() {
        let timestamp = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let inserted = Event::Inserted {
            kind: AlarmKind::Create,
            message_number: 7,
            outcome: InsertOutcome::Replaced,
            timestamp,
        };
        assert_eq!(
            inserted.render("%H:%M:%S"),
            "Create alarm 7 replaced at 03:04:05"
        );

        let fired = Event::Fired {
            kind: AlarmKind::Generic,
            message_number: 0,
            seconds_requested: 10,
            payload: "tea".to_string(),
        };
        assert_eq!(fired.render("%H:%M:%S"), "(10) tea");
    }
}
