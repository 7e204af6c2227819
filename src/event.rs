//! Lifecycle events delivered to subscribers.

use crate::error::ErrorEvent;

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured data parsed from the raw body.
    Json(serde_json::Value),

    /// The raw body passed through unchanged.
    Raw(String),
}

impl Payload {
    /// The parsed value, if this is a JSON payload.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(v) => Some(v),
            Payload::Raw(_) => None,
        }
    }

    /// The raw body, if this is a raw payload.
    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Payload::Json(_) => None,
            Payload::Raw(v) => Some(v),
        }
    }
}

/// Payload of a `success` event.
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessEvent {
    /// The decoded response body.
    pub response: Payload,
    /// HTTP status of the exchange, in 200-399.
    pub status: u16,
    /// The transport's status text.
    pub status_text: String,
}

/// One lifecycle notification.
///
/// Each request emits `LoadStart` first, then `LoadEnd` and exactly one
/// of `Success`/`Error` in the same completion turn. A request cancelled
/// by a later `send()` emits nothing after its `LoadStart`.
#[derive(Debug)]
pub enum Event {
    /// The request is about to be dispatched.
    LoadStart,

    /// The request settled, whatever the outcome.
    LoadEnd,

    /// The request completed and the body decoded.
    Success(SuccessEvent),

    /// The request failed; see [`ErrorKind`][crate::ErrorKind].
    Error(ErrorEvent),
}

impl Event {
    /// The registration key this event is routed under.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::LoadStart => EventKind::LoadStart,
            Event::LoadEnd => EventKind::LoadEnd,
            Event::Success(_) => EventKind::Success,
            Event::Error(_) => EventKind::Error,
        }
    }
}

/// The four named events handlers can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `loadstart`
    LoadStart,
    /// `loadend`
    LoadEnd,
    /// `success`
    Success,
    /// `error`
    Error,
}

impl EventKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            EventKind::LoadStart => "loadstart",
            EventKind::LoadEnd => "loadend",
            EventKind::Success => "success",
            EventKind::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_routing() {
        assert_eq!(Event::LoadStart.kind(), EventKind::LoadStart);
        assert_eq!(Event::LoadEnd.kind(), EventKind::LoadEnd);
        assert_eq!(EventKind::Success.name(), "success");
        assert_eq!(EventKind::Error.name(), "error");
    }

    #[test]
    fn payload_accessors() {
        let json = Payload::Json(serde_json::json!({"a": 1}));
        assert!(json.as_json().is_some());
        assert!(json.as_raw().is_none());

        let raw = Payload::Raw("body".to_string());
        assert_eq!(raw.as_raw(), Some("body"));
        assert!(raw.as_json().is_none());
    }
}
