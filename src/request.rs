//! Structured requests and the line grammar the interactive front end accepts.
//!
//! ```text
//! <secs> Message(<type>, <number>) <text>   create
//! Cancel: Message(<number>)                 cancel
//! Pause_Thread: MessageType(<type>)         pause
//! Resume_Thread: MessageType(<type>)        resume
//! <secs> <text>                             generic
//! ```

use std::str::FromStr;

use thiserror::Error;

use crate::alarm::AlarmKind;

/// a request after parsing, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub kind: AlarmKind,
    pub message_type: u32,
    pub message_number: u32,
    pub seconds_from_now: u64,
    pub payload: String,
}

impl Request {
    #[must_use]
    pub const fn create(
        seconds_from_now: u64,
        message_type: u32,
        message_number: u32,
        payload: String,
    ) -> Self {
        Self {
            kind: AlarmKind::Create,
            message_type,
            message_number,
            seconds_from_now,
            payload,
        }
    }

    #[must_use]
    pub fn cancel(message_number: u32) -> Self {
        Self {
            kind: AlarmKind::Cancel,
            message_type: 0,
            message_number,
            seconds_from_now: 0,
            payload: format!("Cancel: Message({message_number})"),
        }
    }

    #[must_use]
    pub fn pause(message_type: u32) -> Self {
        Self {
            kind: AlarmKind::PauseThread,
            message_type,
            message_number: 0,
            seconds_from_now: 0,
            payload: format!("Pause_Thread: MessageType({message_type})"),
        }
    }

    #[must_use]
    pub fn resume(message_type: u32) -> Self {
        Self {
            kind: AlarmKind::ResumeThread,
            message_type,
            message_number: 0,
            seconds_from_now: 0,
            payload: format!("Resume_Thread: MessageType({message_type})"),
        }
    }

    #[must_use]
    pub const fn generic(seconds_from_now: u64, payload: String) -> Self {
        Self {
            kind: AlarmKind::Generic,
            message_type: 0,
            message_number: 0,
            seconds_from_now,
            payload,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty request")]
    Empty,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("`{0}` is not a valid number")]
    BadNumber(String),
    #[error("expected {0}")]
    Malformed(&'static str),
    #[error("alarm has no message")]
    MissingMessage,
}

impl FromStr for Request {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }
        if let Some(rest) = line.strip_prefix("Cancel:") {
            return parse_call(rest, "Message", "Cancel: Message(<number>)").map(Self::cancel);
        }
        if let Some(rest) = line.strip_prefix("Pause_Thread:") {
            return parse_call(rest, "MessageType", "Pause_Thread: MessageType(<type>)")
                .map(Self::pause);
        }
        if let Some(rest) = line.strip_prefix("Resume_Thread:") {
            return parse_call(rest, "MessageType", "Resume_Thread: MessageType(<type>)")
                .map(Self::resume);
        }

        let (secs, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let secs = secs
            .parse::<u64>()
            .map_err(|_| ParseError::UnknownCommand(line.to_string()))?;
        let rest = rest.trim_start();
        if rest.is_empty() {
            return Err(ParseError::MissingMessage);
        }

        let Some(args) = rest.strip_prefix("Message(") else {
            return Ok(Self::generic(secs, rest.to_string()));
        };
        let (args, text) = args
            .split_once(')')
            .ok_or(ParseError::Malformed("Message(<type>, <number>)"))?;
        let (message_type, message_number) = args
            .split_once(',')
            .ok_or(ParseError::Malformed("Message(<type>, <number>)"))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseError::MissingMessage);
        }
        Ok(Self::create(
            secs,
            parse_number(message_type)?,
            parse_number(message_number)?,
            text.to_string(),
        ))
    }
}

/// parses ` Name(<number>)`
fn parse_call(rest: &str, name: &str, shape: &'static str) -> Result<u32, ParseError> {
    let inner = rest
        .trim()
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or(ParseError::Malformed(shape))?;
    parse_number(inner)
}

fn parse_number(number: &str) -> Result<u32, ParseError> {
    let number = number.trim();
    number
        .parse()
        .map_err(|_| ParseError::BadNumber(number.to_string()))
}
