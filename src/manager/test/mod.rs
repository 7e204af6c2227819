//! Deterministic fake transport for driving the lifecycle.
//!
//! The fake records everything the manager does to it and lets a test
//! settle the exchange by hand, so every terminal outcome can be driven
//! synchronously.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use http::{HeaderMap, HeaderName, Method};

use crate::encode::Params;
use crate::error::ErrorKind;
use crate::event::{Event, EventKind, Payload};
use crate::manager::{ManagerOptions, RequestManager, RequestMethod, SendOptions};
use crate::transport::{Completion, Connector, Transport, TransportResponse};


/// Everything one fake transport observed.
pub(crate) struct FakeExchange {
    index: usize,
    opened: Option<(Method, String)>,
    headers: Vec<(HeaderName, String)>,
    timeout: Option<Duration>,
    /// `Some` once dispatched; the inner value is the request body.
    body: Option<Option<String>>,
    completion: Option<Completion>,
    aborted: bool,
    ops: Rc<RefCell<Vec<String>>>,
}

pub(crate) struct FakeTransport(Rc<RefCell<FakeExchange>>);

impl Transport for FakeTransport {
    fn open(&mut self, method: Method, url: &str) {
        let mut x = self.0.borrow_mut();
        let op = format!("open {}", x.index);
        x.ops.borrow_mut().push(op);
        x.opened = Some((method, url.to_string()));
    }

    fn set_header(&mut self, name: HeaderName, value: String) {
        self.0.borrow_mut().headers.push((name, value));
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.0.borrow_mut().timeout = Some(timeout);
    }

    fn send(&mut self, body: Option<String>, completion: Completion) {
        let mut x = self.0.borrow_mut();
        let op = format!("send {}", x.index);
        x.ops.borrow_mut().push(op);
        x.body = Some(body);
        x.completion = Some(completion);
    }

    fn abort(&mut self) {
        let mut x = self.0.borrow_mut();
        let op = format!("abort {}", x.index);
        x.ops.borrow_mut().push(op);
        x.aborted = true;
    }
}

/// Hands out fake transports and keeps a handle to every one of them.
#[derive(Default)]
pub(crate) struct FakeConnector {
    exchanges: RefCell<Vec<Rc<RefCell<FakeExchange>>>>,
    ops: Rc<RefCell<Vec<String>>>,
}

impl FakeConnector {
    pub fn count(&self) -> usize {
        self.exchanges.borrow().len()
    }

    pub fn exchange(&self, index: usize) -> ExchangeHandle {
        ExchangeHandle(Rc::clone(&self.exchanges.borrow()[index]))
    }

    /// The open/send/abort calls across all exchanges, in order.
    pub fn ops(&self) -> Vec<String> {
        self.ops.borrow().clone()
    }
}

impl Connector for FakeConnector {
    fn connect(&self) -> Box<dyn Transport> {
        let mut exchanges = self.exchanges.borrow_mut();
        let exchange = Rc::new(RefCell::new(FakeExchange {
            index: exchanges.len(),
            opened: None,
            headers: Vec::new(),
            timeout: None,
            body: None,
            completion: None,
            aborted: false,
            ops: Rc::clone(&self.ops),
        }));
        exchanges.push(Rc::clone(&exchange));
        Box::new(FakeTransport(exchange))
    }
}

/// Test-side handle to one fake exchange.
#[derive(Clone)]
pub(crate) struct ExchangeHandle(Rc<RefCell<FakeExchange>>);

impl ExchangeHandle {
    pub fn complete(&self, status: u16, status_text: &str, body: &str) {
        self.complete_with_headers(status, status_text, body, HeaderMap::new());
    }

    pub fn complete_with_headers(
        &self,
        status: u16,
        status_text: &str,
        body: &str,
        headers: HeaderMap,
    ) {
        self.take_completion().complete(TransportResponse {
            status,
            status_text: status_text.to_string(),
            body: body.to_string(),
            headers,
        });
    }

    pub fn time_out(&self) {
        self.take_completion().timed_out(0);
    }

    pub fn fail(&self) {
        self.take_completion().network_error(0, "");
    }

    fn take_completion(&self) -> Completion {
        self.0
            .borrow_mut()
            .completion
            .take()
            .expect("exchange not dispatched")
    }

    pub fn method(&self) -> Method {
        self.0.borrow().opened.clone().expect("exchange not opened").0
    }

    pub fn url(&self) -> String {
        self.0.borrow().opened.clone().expect("exchange not opened").1
    }

    pub fn header(&self, name: &HeaderName) -> Option<String> {
        self.0
            .borrow()
            .headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.0.borrow().timeout
    }

    pub fn dispatched(&self) -> bool {
        self.0.borrow().body.is_some()
    }

    pub fn body(&self) -> Option<String> {
        self.0.borrow().body.clone().expect("exchange not dispatched")
    }

    pub fn aborted(&self) -> bool {
        self.0.borrow().aborted
    }
}

/// Compact record of one emitted event.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Logged {
    LoadStart,
    LoadEnd,
    Success {
        status: u16,
        response: Payload,
    },
    Error {
        kind: ErrorKind,
        status: u16,
        status_text: String,
        has_cause: bool,
    },
}

impl Logged {
    fn from_event(event: &Event) -> Logged {
        match event {
            Event::LoadStart => Logged::LoadStart,
            Event::LoadEnd => Logged::LoadEnd,
            Event::Success(e) => Logged::Success {
                status: e.status,
                response: e.response.clone(),
            },
            Event::Error(e) => Logged::Error {
                kind: e.kind,
                status: e.status,
                status_text: e.status_text.clone(),
                has_cause: e.cause.is_some(),
            },
        }
    }
}

/// Subscribe to all four events and record them in emission order.
pub(crate) fn record(manager: &RequestManager) -> Rc<RefCell<Vec<Logged>>> {
    let events = Rc::new(RefCell::new(Vec::new()));

    for kind in [
        EventKind::LoadStart,
        EventKind::LoadEnd,
        EventKind::Success,
        EventKind::Error,
    ] {
        let log = Rc::clone(&events);
        manager.on(kind, move |event| {
            log.borrow_mut().push(Logged::from_event(event));
        });
    }

    events
}

/// A manager wired to a fake connector with a full event recording.
pub(crate) struct Scenario {
    pub connector: Rc<FakeConnector>,
    pub manager: RequestManager,
    pub events: Rc<RefCell<Vec<Logged>>>,
}

impl Scenario {
    pub fn new() -> Scenario {
        Scenario::with_options(ManagerOptions::default())
    }

    pub fn with_options(options: ManagerOptions) -> Scenario {
        let connector = Rc::new(FakeConnector::default());
        let manager = RequestManager::new(Rc::clone(&connector), options);
        let events = record(&manager);

        Scenario {
            connector,
            manager,
            events,
        }
    }

    pub fn send_get(&self, url: &str) {
        self.manager
            .send(url, &Params::new(), RequestMethod::Get, SendOptions::default());
    }

    pub fn exchange(&self, index: usize) -> ExchangeHandle {
        self.connector.exchange(index)
    }

    pub fn logged(&self) -> Vec<Logged> {
        self.events.borrow().clone()
    }
}
