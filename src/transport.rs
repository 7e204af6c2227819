//! The transport capability.
//!
//! A [`Transport`] is one network exchange: open, configure, dispatch,
//! maybe abort. The manager is polymorphic over any implementation,
//! whether a real network stack or a deterministic test double, and
//! obtains a fresh one per request from an injected [`Connector`].
//!
//! Opening sockets, TLS and the actual wire protocol are out of scope
//! here, exactly as they are for the rest of the crate.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use http::{HeaderMap, HeaderName, Method};

/// A settled exchange as reported by a transport.
#[derive(Debug)]
pub struct TransportResponse {
    /// Final HTTP status.
    pub status: u16,
    /// Status text accompanying the status line.
    pub status_text: String,
    /// Raw response body.
    pub body: String,
    /// Response headers.
    pub headers: HeaderMap,
}

/// The ways a transport settles.
#[derive(Debug)]
pub enum TransportEvent {
    /// A response arrived, whatever its status.
    Complete(TransportResponse),

    /// The configured timeout elapsed first.
    TimedOut {
        /// Status at the time of the timeout, usually `0`.
        status: u16,
    },

    /// The exchange could not complete.
    NetworkError {
        /// Status at the time of the failure, usually `0`.
        status: u16,
        /// The transport's own description, may be empty.
        status_text: String,
    },
}

/// One-shot handle a transport uses to report its terminal outcome.
///
/// Consumed on first use, so an exchange can settle at most once. A
/// transport that is aborted before settling simply drops the handle.
pub struct Completion {
    settle: Box<dyn FnOnce(TransportEvent)>,
}

impl Completion {
    /// Wrap a settle function.
    pub fn new(settle: impl FnOnce(TransportEvent) + 'static) -> Completion {
        Completion {
            settle: Box::new(settle),
        }
    }

    /// A response arrived.
    pub fn complete(self, response: TransportResponse) {
        (self.settle)(TransportEvent::Complete(response));
    }

    /// The exchange timed out.
    pub fn timed_out(self, status: u16) {
        (self.settle)(TransportEvent::TimedOut { status });
    }

    /// The exchange failed below the HTTP layer.
    pub fn network_error(self, status: u16, status_text: impl Into<String>) {
        (self.settle)(TransportEvent::NetworkError {
            status,
            status_text: status_text.into(),
        });
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Completion")
    }
}

/// One request/response exchange.
///
/// The value handed out by a [`Connector`] is a *handle* to the
/// exchange: dropping it must not tear down a dispatch already under
/// way; only [`abort`][Transport::abort] cancels.
///
/// Implementations must not invoke the [`Completion`] from inside
/// [`send`][Transport::send]; completion belongs to a later callback
/// turn.
pub trait Transport {
    /// Set method and URL for the exchange.
    fn open(&mut self, method: Method, url: &str);

    /// Add a request header.
    fn set_header(&mut self, name: HeaderName, value: String);

    /// Arm the transport's own timeout timer.
    fn set_timeout(&mut self, timeout: Duration);

    /// Dispatch the exchange with an optional body.
    fn send(&mut self, body: Option<String>, completion: Completion);

    /// Request cooperative cancellation. Best effort; a completion that
    /// still fires afterwards is the caller's to suppress.
    fn abort(&mut self);
}

/// Creates one transport per request.
pub trait Connector {
    /// A fresh, unopened transport.
    fn connect(&self) -> Box<dyn Transport>;
}

impl<C: Connector + ?Sized> Connector for Rc<C> {
    fn connect(&self) -> Box<dyn Transport> {
        (**self).connect()
    }
}
