//! One-shot request helpers.
//!
//! Each helper constructs a [`RequestManager`], wires single-use
//! callbacks and issues exactly one request. The manager handle goes
//! out of scope immediately; its state stays alive until the exchange
//! settles, so the callbacks still fire.

use crate::encode::Params;
use crate::error::ErrorEvent;
use crate::event::{Event, EventKind, SuccessEvent};
use crate::manager::{ManagerOptions, RequestManager, RequestMethod, SendOptions};
use crate::transport::Connector;

/// Options for [`get`] and [`post`].
#[derive(Default)]
pub struct FetchOptions {
    /// Parameters to send.
    pub data: Params,

    /// Manager construction options.
    pub manager: ManagerOptions,

    /// Per-call options.
    pub send: SendOptions,

    /// Invoked on the `success` event.
    pub on_success: Option<Box<dyn FnMut(&SuccessEvent)>>,

    /// Invoked on the `error` event.
    pub on_error: Option<Box<dyn FnMut(&ErrorEvent)>>,
}

/// Issue a single GET request.
pub fn get(connector: impl Connector + 'static, url: &str, options: FetchOptions) {
    fetch(connector, url, RequestMethod::Get, options);
}

/// Issue a single POST request.
pub fn post(connector: impl Connector + 'static, url: &str, options: FetchOptions) {
    fetch(connector, url, RequestMethod::Post, options);
}

fn fetch(
    connector: impl Connector + 'static,
    url: &str,
    method: RequestMethod,
    options: FetchOptions,
) {
    let FetchOptions {
        data,
        manager,
        send,
        on_success,
        on_error,
    } = options;

    let manager = RequestManager::new(connector, manager);

    if let Some(mut callback) = on_success {
        manager.on(EventKind::Success, move |event| {
            if let Event::Success(e) = event {
                callback(e);
            }
        });
    }
    if let Some(mut callback) = on_error {
        manager.on(EventKind::Error, move |event| {
            if let Event::Error(e) = event {
                callback(e);
            }
        });
    }

    manager.send(url, &data, method, send);
}
