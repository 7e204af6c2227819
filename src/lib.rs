//! Single-flight HTTP request manager with lifecycle events.
//!
//! A [`RequestManager`] issues one outstanding request at a time. It
//! encodes parameters differently for read and write methods, decodes
//! the response body, classifies the outcome and reports it through a
//! small, well-ordered set of lifecycle events: `loadstart`, `loadend`
//! and exactly one of `success`/`error` per request.
//!
//! The actual network exchange is behind the [`Transport`] capability,
//! obtained per request from an injected [`Connector`]. That keeps the
//! lifecycle deterministic and testable: a fake transport can drive
//! every terminal outcome synchronously. See the [manager
//! docs][RequestManager] for the state graph.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! use reqcycle::http::{HeaderMap, HeaderName, Method};
//! use reqcycle::{
//!     Completion, Connector, Event, EventKind, ManagerOptions, Params,
//!     RequestManager, RequestMethod, SendOptions, Transport, TransportResponse,
//! };
//!
//! // A transport the example settles by hand. A real implementation
//! // would hand the exchange to a network stack.
//! #[derive(Default)]
//! struct Exchange {
//!     completion: RefCell<Option<Completion>>,
//! }
//!
//! struct Handle(Rc<Exchange>);
//!
//! impl Transport for Handle {
//!     fn open(&mut self, _method: Method, _url: &str) {}
//!     fn set_header(&mut self, _name: HeaderName, _value: String) {}
//!     fn set_timeout(&mut self, _timeout: Duration) {}
//!     fn send(&mut self, _body: Option<String>, completion: Completion) {
//!         *self.0.completion.borrow_mut() = Some(completion);
//!     }
//!     fn abort(&mut self) {}
//! }
//!
//! #[derive(Default)]
//! struct Loopback {
//!     exchanges: RefCell<Vec<Rc<Exchange>>>,
//! }
//!
//! impl Connector for Loopback {
//!     fn connect(&self) -> Box<dyn Transport> {
//!         let exchange = Rc::new(Exchange::default());
//!         self.exchanges.borrow_mut().push(Rc::clone(&exchange));
//!         Box::new(Handle(exchange))
//!     }
//! }
//!
//! let connector = Rc::new(Loopback::default());
//! let manager = RequestManager::new(Rc::clone(&connector), ManagerOptions::default());
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = Rc::clone(&seen);
//! manager.on(EventKind::Success, move |event| {
//!     if let Event::Success(e) = event {
//!         log.borrow_mut().push(e.response.clone());
//!     }
//! });
//!
//! manager.send(
//!     "http://example.test/items",
//!     &Params::new().with("page", 2),
//!     RequestMethod::Get,
//!     SendOptions::default(),
//! );
//!
//! // Drive the exchange to completion.
//! let exchange = connector.exchanges.borrow()[0].clone();
//! let completion = exchange.completion.borrow_mut().take().unwrap();
//! completion.complete(TransportResponse {
//!     status: 200,
//!     status_text: "OK".into(),
//!     body: r#"{"items": []}"#.into(),
//!     headers: HeaderMap::new(),
//! });
//!
//! assert_eq!(seen.borrow().len(), 1);
//! ```
//!
//! # In scope:
//!
//! * One-at-a-time request lifecycle with supersede/abort policy
//! * GET query-string and POST form-body parameter encoding
//! * JSON or raw response decoding with a strict error taxonomy
//! * One-shot [`oneshot::get`]/[`oneshot::post`] helpers and a
//!   [`cors::fetch_allow_origin`] probe
//!
//! # Out of scope:
//!
//! * Opening/closing sockets
//! * Connection pooling, retries, request queuing
//! * Streaming responses
//!
//! # The http crate
//!
//! Method and header types come from the
//! [http crate](https://crates.io/crates/http) - a unified HTTP API
//! for Rust.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
extern crate log;

mod encode;
mod error;
mod event;
mod manager;
mod transport;

pub mod cors;
pub mod oneshot;

pub use http;

pub use encode::{Params, Scalar};
pub use error::{ErrorEvent, ErrorKind};
pub use event::{Event, EventKind, Payload, SuccessEvent};
pub use manager::{
    DecodeMode, HandlerId, ManagerOptions, RequestManager, RequestMethod, SendOptions,
};
pub use transport::{Completion, Connector, Transport, TransportEvent, TransportResponse};
