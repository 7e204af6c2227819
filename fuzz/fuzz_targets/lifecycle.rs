#![no_main]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use reqcycle::http::{HeaderMap, HeaderName, Method};
use reqcycle::{
    Completion, Connector, DecodeMode, EventKind, ManagerOptions, Params, RequestManager,
    RequestMethod, SendOptions, Transport, TransportResponse,
};

#[derive(Default)]
struct Exchange {
    completion: RefCell<Option<Completion>>,
}

struct Handle(Rc<Exchange>);

impl Transport for Handle {
    fn open(&mut self, _method: Method, _url: &str) {}
    fn set_header(&mut self, _name: HeaderName, _value: String) {}
    fn set_timeout(&mut self, _timeout: Duration) {}
    fn send(&mut self, _body: Option<String>, completion: Completion) {
        *self.0.completion.borrow_mut() = Some(completion);
    }
    fn abort(&mut self) {}
}

#[derive(Default)]
struct Loopback {
    exchanges: RefCell<Vec<Rc<Exchange>>>,
}

impl Connector for Loopback {
    fn connect(&self) -> Box<dyn Transport> {
        let exchange = Rc::new(Exchange::default());
        self.exchanges.borrow_mut().push(Rc::clone(&exchange));
        Box::new(Handle(exchange))
    }
}

// Whatever URL, parameters, options, status and body the fuzzer comes
// up with, a dispatched request must settle with exactly one loadstart,
// one loadend and one terminal event.
fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let status = u16::from_le_bytes([data[0], data[1]]);
    let flags = data[2];
    let split = data[3] as usize;

    let Ok(text) = std::str::from_utf8(&data[4..]) else {
        return;
    };
    let split = split.min(text.len());
    if !text.is_char_boundary(split) {
        return;
    }
    let (url, body) = text.split_at(split);

    let connector = Rc::new(Loopback::default());
    let manager = RequestManager::new(
        Rc::clone(&connector),
        ManagerOptions {
            auth: (flags & 1 != 0).then(|| "user:pass".to_string()),
            decode_mode: if flags & 2 != 0 {
                DecodeMode::Raw
            } else {
                DecodeMode::Json
            },
        },
    );

    let counts = Rc::new(RefCell::new([0u32; 3]));
    for (slot, kind) in [
        (0usize, EventKind::LoadStart),
        (1, EventKind::LoadEnd),
        (2, EventKind::Success),
        (2, EventKind::Error),
    ] {
        let counts = Rc::clone(&counts);
        manager.on(kind, move |_| counts.borrow_mut()[slot] += 1);
    }

    let method = if flags & 4 != 0 {
        RequestMethod::Post
    } else {
        RequestMethod::Get
    };

    let params = Params::new()
        .with("q", body)
        .with_opt("skip", None::<i64>)
        .with("n", 1);

    manager.send(
        url,
        &params,
        method,
        SendOptions {
            encode: flags & 8 == 0,
            abort: flags & 16 == 0,
            timeout: Some(Duration::from_millis(10)),
        },
    );

    let exchange = connector.exchanges.borrow()[0].clone();
    let completion = exchange.completion.borrow_mut().take().expect("dispatched");

    match flags & 0x60 {
        0x20 => completion.timed_out(0),
        0x40 => completion.network_error(0, "boom"),
        _ => completion.complete(TransportResponse {
            status,
            status_text: String::new(),
            body: body.to_string(),
            headers: HeaderMap::new(),
        }),
    }

    assert_eq!(*counts.borrow(), [1, 1, 1]);
});
