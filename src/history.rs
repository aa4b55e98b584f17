//! History ingestion: paired operations and call/return event streams.

use std::collections::{HashMap, HashSet};
use std::fmt;

/// A completed client operation with its real-time bounds.
///
/// Identity is positional: within a (sub)history, operations are referred
/// to by index. Timestamps are opaque orderable integers, and an
/// operation's invocation is expected to precede its response.
#[derive(Clone, Debug)]
pub struct Operation<In, Out> {
    /// Client that issued the operation. Only used for diagnostics.
    pub client_id: usize,
    /// Argument carried by the invocation.
    pub input: In,
    /// Invocation timestamp.
    pub call: i64,
    /// Value carried by the response.
    pub output: Out,
    /// Response timestamp.
    pub ret: i64,
}

/// One half of an operation, as captured from a log of invocations and
/// responses.
///
/// Each id must occur exactly twice: first as a [`EventKind::Call`], later
/// as a [`EventKind::Return`].
#[derive(Clone, Debug)]
pub struct Event<In, Out> {
    pub kind: EventKind<In, Out>,
    /// Pairs the event with its other half.
    pub id: usize,
    /// Client that issued the operation.
    pub client_id: usize,
}

/// Distinguishes invocations from responses.
#[derive(Clone, Debug)]
pub enum EventKind<In, Out> {
    Call(In),
    Return(Out),
}

/// Ways in which an event history can be malformed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HistoryError {
    /// A return event had no earlier matching call.
    UnmatchedReturn { id: usize },
    /// A call event was still pending at the end of the history.
    UnmatchedCall { id: usize },
    /// An id was reused for a second call/return pair.
    DuplicateId { id: usize },
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::UnmatchedReturn { id } => {
                write!(f, "return event {} has no matching call", id)
            }
            HistoryError::UnmatchedCall { id } => {
                write!(f, "call event {} never returned", id)
            }
            HistoryError::DuplicateId { id } => {
                write!(f, "event id {} is used by more than one operation", id)
            }
        }
    }
}

impl std::error::Error for HistoryError {}

/// Verifies that every id is used by exactly one call/return pair, call
/// first. Validation runs over the whole input so that malformed histories
/// fail before any partitioning.
pub(crate) fn validate_events<In, Out>(events: &[Event<In, Out>]) -> Result<(), HistoryError> {
    let mut pending = HashSet::new();
    let mut done = HashSet::new();
    for event in events {
        match event.kind {
            EventKind::Call(_) => {
                if pending.contains(&event.id) || done.contains(&event.id) {
                    return Err(HistoryError::DuplicateId { id: event.id });
                }
                pending.insert(event.id);
            }
            EventKind::Return(_) => {
                if !pending.remove(&event.id) {
                    return Err(HistoryError::UnmatchedReturn { id: event.id });
                }
                done.insert(event.id);
            }
        }
    }
    if let Some(&id) = pending.iter().min() {
        return Err(HistoryError::UnmatchedCall { id });
    }
    Ok(())
}

/// Pairs call events with their returns, producing operations whose
/// invocation and response timestamps are the events' positions within the
/// scanned sequence.
pub(crate) fn pair_events<In, Out>(
    events: Vec<Event<In, Out>>,
) -> Result<Vec<Operation<In, Out>>, HistoryError> {
    let mut operations = Vec::with_capacity(events.len() / 2);
    let mut pending: HashMap<usize, (i64, In, usize)> = HashMap::new();
    let mut done = HashSet::new();
    for (position, event) in events.into_iter().enumerate() {
        match event.kind {
            EventKind::Call(input) => {
                if pending.contains_key(&event.id) || done.contains(&event.id) {
                    return Err(HistoryError::DuplicateId { id: event.id });
                }
                pending.insert(event.id, (position as i64, input, event.client_id));
            }
            EventKind::Return(output) => {
                let (call, input, client_id) = pending
                    .remove(&event.id)
                    .ok_or(HistoryError::UnmatchedReturn { id: event.id })?;
                done.insert(event.id);
                operations.push(Operation {
                    client_id,
                    input,
                    call,
                    output,
                    ret: position as i64,
                });
            }
        }
    }
    if let Some(&id) = pending.keys().min() {
        return Err(HistoryError::UnmatchedCall { id });
    }
    Ok(operations)
}
