//! Request lifecycle manager.
//!
//! A [`RequestManager`] coordinates one outstanding request at a time.
//! Per logical request the lifecycle is:
//!
//! ```text
//! ┌──────────────────┐
//! │       Idle       │◀───────────────────────────┐
//! └──────────────────┘                            │
//!           │ send()                              │
//!           ▼                                     │
//! ┌──────────────────┐  settles   ┌──────────────────────────┐
//! │     Sending      │───────────▶│ Success     │ HttpError  │
//! └──────────────────┘            │ NetworkError│ TimedOut   │
//!           ┆                     │ ParseError               │
//!           ┆ aborted by a        └──────────────────────────┘
//!           ▼ newer send()
//!   (no further events)
//! ```
//!
//! Entering `Sending` emits `loadstart`. Every settled request emits
//! `loadend` plus exactly one terminal `success`/`error` in the same
//! completion turn. The dashed edge is the one way a request leaves the
//! machine without settling: a newer `send()` aborted it, and any late
//! completion the transport still produces is suppressed by a
//! generation check instead of clobbering the newer request's state.
//!
//! `send()` never blocks and never fails synchronously; every outcome,
//! including malformed input and decode failure, arrives as an `error`
//! event.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use http::{header, Method};

use crate::encode::{encode_uri, form_urlencode, query_string, Params};
use crate::error::ErrorEvent;
use crate::event::{Event, EventKind, Payload, SuccessEvent};
use crate::transport::{Completion, Connector, Transport, TransportEvent, TransportResponse};

#[cfg(test)]
pub(crate) mod test;

/// The method domain of [`RequestManager::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    /// Parameters travel in the query string, no body.
    Get,

    /// Parameters travel as a form-encoded body, no query string.
    Post,
}

impl RequestMethod {
    fn as_http(&self) -> Method {
        match self {
            RequestMethod::Get => Method::GET,
            RequestMethod::Post => Method::POST,
        }
    }
}

/// How a successful response body becomes a [`Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Parse the raw body as JSON. The default.
    #[default]
    Json,

    /// Pass the raw body through unchanged.
    Raw,
}

/// Options fixed at manager construction.
#[derive(Debug, Default)]
pub struct ManagerOptions {
    /// Credentials as `user:pass`. When set, every request carries an
    /// `Authorization: Basic` header with the base64 of this string.
    pub auth: Option<String>,

    /// Expected response decoding, [`DecodeMode::Json`] by default.
    pub decode_mode: DecodeMode,
}

/// Per-call options. Constructed fresh for every `send()`.
#[derive(Debug, Clone)]
pub struct SendOptions {
    /// Percent-encode the URL once before appending any query string.
    /// Default `true`.
    pub encode: bool,

    /// Cancel a still-pending prior request before starting this one.
    /// Default `true`. With `false` the prior request is left to settle
    /// independently and emits its own events when it does.
    pub abort: bool,

    /// Timeout applied to the transport. Default none.
    pub timeout: Option<Duration>,
}

impl Default for SendOptions {
    fn default() -> Self {
        SendOptions {
            encode: true,
            abort: true,
            timeout: None,
        }
    }
}

/// Identifies a handler registered with [`RequestManager::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

type Handler = Rc<RefCell<dyn FnMut(&Event)>>;

#[derive(Default)]
struct Registry {
    handlers: Vec<(HandlerId, EventKind, Handler)>,
    next_id: u64,
}

struct ActiveRequest {
    transport: Box<dyn Transport>,
    generation: u64,
}

#[derive(Default)]
struct LifecycleState {
    /// The most recently started request, if still in flight.
    active: Option<ActiveRequest>,

    /// Requests superseded with `abort: false`. They settle on their
    /// own and must not touch the active slot.
    superseded: Vec<ActiveRequest>,

    generations: u64,
}

struct Shared {
    auth: Option<String>,
    decode_mode: DecodeMode,
    connector: Box<dyn Connector>,
    state: RefCell<LifecycleState>,
    registry: RefCell<Registry>,
}

/// Coordinates one outstanding request and reports its lifecycle.
///
/// Cloning is cheap and yields a handle to the same manager, which is
/// how a completion handler gets to call [`send`][RequestManager::send]
/// again reentrantly.
pub struct RequestManager {
    shared: Rc<Shared>,
}

impl Clone for RequestManager {
    fn clone(&self) -> Self {
        RequestManager {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl RequestManager {
    /// New manager dispatching through `connector`.
    pub fn new(connector: impl Connector + 'static, options: ManagerOptions) -> RequestManager {
        RequestManager {
            shared: Rc::new(Shared {
                auth: options.auth,
                decode_mode: options.decode_mode,
                connector: Box::new(connector),
                state: RefCell::new(LifecycleState::default()),
                registry: RefCell::new(Registry::default()),
            }),
        }
    }

    /// Register a handler for one of the four named events.
    pub fn on(&self, kind: EventKind, handler: impl FnMut(&Event) + 'static) -> HandlerId {
        let mut registry = self.shared.registry.borrow_mut();
        let id = HandlerId(registry.next_id);
        registry.next_id += 1;
        registry
            .handlers
            .push((id, kind, Rc::new(RefCell::new(handler))));
        id
    }

    /// Unregister a handler. Returns whether it was registered.
    pub fn off(&self, id: HandlerId) -> bool {
        let mut registry = self.shared.registry.borrow_mut();
        let before = registry.handlers.len();
        registry.handlers.retain(|(h, _, _)| *h != id);
        registry.handlers.len() != before
    }

    /// Issue a request, superseding any still-pending one.
    ///
    /// Returns as soon as the exchange is dispatched; the outcome
    /// arrives via the registered handlers. See the [module
    /// docs][self] for the lifecycle contract.
    pub fn send(&self, url: &str, data: &Params, method: RequestMethod, options: SendOptions) {
        let shared = &self.shared;

        // Encode URL if required, before any query string is appended.
        let mut url = if options.encode {
            encode_uri(url)
        } else {
            url.to_string()
        };

        // Parameters: query string for GET, form body for POST.
        let mut body = None;
        match method {
            RequestMethod::Get => url.push_str(&query_string(data)),
            RequestMethod::Post => body = Some(form_urlencode(data)),
        }

        // Supersede the previous request.
        let (generation, prior) = {
            let mut state = shared.state.borrow_mut();
            state.generations += 1;
            (state.generations, state.active.take())
        };

        if let Some(mut prior) = prior {
            if options.abort {
                debug!("abort #{}", prior.generation);
                prior.transport.abort();
            } else {
                debug!("detach #{}", prior.generation);
                shared.state.borrow_mut().superseded.push(prior);
            }
        }

        let mut transport = shared.connector.connect();
        transport.open(method.as_http(), &url);
        if let Some(timeout) = options.timeout {
            transport.set_timeout(timeout);
        }
        if let Some(auth) = &shared.auth {
            let creds = BASE64_STANDARD.encode(auth);
            transport.set_header(header::AUTHORIZATION, format!("Basic {}", creds));
        }
        if method == RequestMethod::Post {
            transport.set_header(
                header::CONTENT_TYPE,
                "application/x-www-form-urlencoded".to_string(),
            );
        }

        debug!("send #{} {} {}", generation, method.as_http(), url);
        trace!("send #{} body {:?}", generation, body);

        // Store before loadstart so subscribers observe a pending
        // request, then dispatch.
        shared.state.borrow_mut().active = Some(ActiveRequest {
            transport,
            generation,
        });

        shared.emit(&Event::LoadStart);

        let completion = {
            let shared = Rc::clone(shared);
            Completion::new(move |event| shared.settle(generation, event))
        };

        // A loadstart handler may have called send() again, in which
        // case this request is already superseded: dispatch it from
        // wherever it ended up, or not at all if it was aborted.
        let mut state = shared.state.borrow_mut();
        let slot = if state.active.as_ref().map(|a| a.generation) == Some(generation) {
            state.active.as_mut()
        } else {
            state
                .superseded
                .iter_mut()
                .find(|a| a.generation == generation)
        };
        match slot {
            Some(active) => active.transport.send(body, completion),
            None => debug!("request #{} cancelled before dispatch", generation),
        }
    }
}

impl Shared {
    /// Deliver an event to every handler registered for its kind.
    ///
    /// Handlers run with no internal borrow held, so they are free to
    /// call back into the manager.
    fn emit(&self, event: &Event) {
        let kind = event.kind();

        let matching: Vec<Handler> = self
            .registry
            .borrow()
            .handlers
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| Rc::clone(h))
            .collect();

        for handler in matching {
            match handler.try_borrow_mut() {
                Ok(mut f) => (&mut *f)(event),
                // The handler is already running further up the stack.
                Err(_) => debug!("skip reentrant {} handler", kind.name()),
            }
        }
    }

    fn settle(&self, generation: u64, event: TransportEvent) {
        // Locate this generation: the active slot, the detached list,
        // or nowhere at all because it was aborted.
        let found = {
            let mut state = self.state.borrow_mut();
            if state.active.as_ref().map(|a| a.generation) == Some(generation) {
                state.active = None;
                true
            } else if let Some(i) = state
                .superseded
                .iter()
                .position(|a| a.generation == generation)
            {
                state.superseded.remove(i);
                true
            } else {
                false
            }
        };

        if !found {
            debug!("suppress stale completion #{}", generation);
            return;
        }

        debug!("settle #{}", generation);

        self.emit(&Event::LoadEnd);

        match event {
            TransportEvent::Complete(response) => self.classify(response),
            TransportEvent::TimedOut { status } => {
                self.emit(&Event::Error(ErrorEvent::timeout(status)));
            }
            TransportEvent::NetworkError {
                status,
                status_text,
            } => {
                self.emit(&Event::Error(ErrorEvent::network(status, status_text)));
            }
        }
    }

    fn classify(&self, response: TransportResponse) {
        let TransportResponse {
            status,
            status_text,
            body,
            ..
        } = response;

        if !(200..400).contains(&status) {
            self.emit(&Event::Error(ErrorEvent::http_status(status, status_text)));
            return;
        }

        // Decode failure takes priority over reporting success.
        match decode(self.decode_mode, body) {
            Ok(payload) => self.emit(&Event::Success(SuccessEvent {
                response: payload,
                status,
                status_text,
            })),
            Err(e) => self.emit(&Event::Error(ErrorEvent::parse(e))),
        }
    }
}

fn decode(mode: DecodeMode, body: String) -> Result<Payload, serde_json::Error> {
    match mode {
        DecodeMode::Json => serde_json::from_str(&body).map(Payload::Json),
        DecodeMode::Raw => Ok(Payload::Raw(body)),
    }
}
