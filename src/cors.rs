//! Cross-origin allow-origin probe.

use http::header;
use http::Method;

use crate::transport::{Completion, Connector, TransportEvent};

/// Request `url` with a bare GET for the sole purpose of reading the
/// `Access-Control-Allow-Origin` response header, and hand that
/// header's value to `callback`.
///
/// The callback receives `None` when the header is missing or not
/// readable as a string. It is not invoked at all when the exchange
/// fails below the HTTP layer.
pub fn fetch_allow_origin(
    connector: &dyn Connector,
    url: &str,
    callback: impl FnOnce(Option<String>) + 'static,
) {
    let mut transport = connector.connect();
    transport.open(Method::GET, url);
    transport.send(
        None,
        Completion::new(move |event| {
            if let TransportEvent::Complete(response) = event {
                let allow_origin = response
                    .headers
                    .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                callback(allow_origin);
            }
        }),
    );
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use http::{HeaderMap, HeaderValue};

    use super::*;
    use crate::manager::test::FakeConnector;

    fn probe(connector: &FakeConnector) -> Rc<RefCell<Option<Option<String>>>> {
        let got = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&got);
        fetch_allow_origin(connector, "http://x.test/", move |value| {
            *sink.borrow_mut() = Some(value);
        });
        got
    }

    #[test]
    fn reads_allow_origin_header() {
        let connector = FakeConnector::default();
        let got = probe(&connector);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        connector
            .exchange(0)
            .complete_with_headers(200, "OK", "", headers);

        assert_eq!(*got.borrow(), Some(Some("*".to_string())));
    }

    #[test]
    fn absent_header_yields_none() {
        let connector = FakeConnector::default();
        let got = probe(&connector);

        connector.exchange(0).complete(200, "OK", "");

        assert_eq!(*got.borrow(), Some(None));
    }

    #[test]
    fn callback_not_invoked_on_network_error() {
        let connector = FakeConnector::default();
        let got = probe(&connector);

        connector.exchange(0).fail();

        assert_eq!(*got.borrow(), None);
    }

    #[test]
    fn probe_sends_bare_get() {
        let connector = FakeConnector::default();
        let _got = probe(&connector);

        let exchange = connector.exchange(0);
        assert_eq!(exchange.method(), Method::GET);
        assert_eq!(exchange.body(), None);
        assert_eq!(exchange.header(&header::AUTHORIZATION), None);
    }
}
