use thiserror::Error;

use crate::{alarm::AlarmKind, request::Request, store::AlarmStore};

/// why a control request was turned away; the store is left as it was
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no alarm request with message number {0} to cancel")]
    NoMatchingAlarm(u32),
    #[error("alarm request with message number {0} is already being canceled")]
    DuplicateCancel(u32),
    #[error("no alarm request with message type {0}")]
    NoMatchingMessageType(u32),
    #[error("message type {0} is already paused")]
    DuplicatePause(u32),
    #[error("message type {0} is not paused")]
    NothingToResume(u32),
    #[error("message type {0} is already being resumed")]
    DuplicateResume(u32),
}

/// checks `request` against what the store currently holds
///
/// Must be called with exclusive access to the store, and the request inserted
/// under the same access, or another producer can invalidate the answer.
///
/// # Errors
/// the first rule the request breaks
pub fn validate(request: &Request, store: &AlarmStore) -> Result<(), ValidationError> {
    match request.kind {
        AlarmKind::Create | AlarmKind::Generic => Ok(()),
        AlarmKind::Cancel => validate_cancel(request.message_number, store),
        AlarmKind::PauseThread => validate_pause(request.message_type, store),
        AlarmKind::ResumeThread => validate_resume(request.message_type, store),
    }
}

fn validate_cancel(message_number: u32, store: &AlarmStore) -> Result<(), ValidationError> {
    if !any(store, |kind, _, number| {
        kind == AlarmKind::Create && number == message_number
    }) {
        return Err(ValidationError::NoMatchingAlarm(message_number));
    }
    if any(store, |kind, _, number| {
        kind == AlarmKind::Cancel && number == message_number
    }) {
        return Err(ValidationError::DuplicateCancel(message_number));
    }
    Ok(())
}

fn validate_pause(message_type: u32, store: &AlarmStore) -> Result<(), ValidationError> {
    if !any(store, |kind, ty, _| {
        kind == AlarmKind::Create && ty == message_type
    }) {
        return Err(ValidationError::NoMatchingMessageType(message_type));
    }
    if store.is_paused(message_type)
        || any(store, |kind, ty, _| {
            kind == AlarmKind::PauseThread && ty == message_type
        })
    {
        return Err(ValidationError::DuplicatePause(message_type));
    }
    Ok(())
}

fn validate_resume(message_type: u32, store: &AlarmStore) -> Result<(), ValidationError> {
    // a pause that has not fired yet still counts
    let paused = store.is_paused(message_type)
        || any(store, |kind, ty, _| {
            kind == AlarmKind::PauseThread && ty == message_type
        });
    if !paused {
        return Err(ValidationError::NothingToResume(message_type));
    }
    if any(store, |kind, ty, _| {
        kind == AlarmKind::ResumeThread && ty == message_type
    }) {
        return Err(ValidationError::DuplicateResume(message_type));
    }
    Ok(())
}

/// one short circuiting pass over everything the store owns
fn any(store: &AlarmStore, matches: impl Fn(AlarmKind, u32, u32) -> bool) -> bool {
    store
        .find_all(|record| matches(record.kind, record.message_type, record.message_number))
        .next()
        .is_some()
}
