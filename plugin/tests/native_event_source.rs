use std::cell::RefCell;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use bevy_event_source::sse::{
    EventListener, EventSource, EventSourceEvent, EventSourceInit, NativeEventSource,
    NativeEventSourceConfig, NativeEventSourceFactory, ReadyState,
};

/// Serve `responses` to consecutive connections on a local port. Returns
/// the address and the request heads as they arrive.
fn serve(responses: Vec<String>) -> (String, Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
    let address = listener.local_addr().expect("local address");
    let (requests, received) = mpsc::channel();

    thread::spawn(move || {
        for response in responses {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            let mut line = String::new();
            while reader.read_line(&mut line).is_ok_and(|read| read > 0) {
                if line == "\r\n" {
                    break;
                }
                head.push_str(&line);
                line.clear();
            }
            let _ = requests.send(head);

            let mut stream = reader.into_inner();
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    (format!("http://{address}/events"), received)
}

fn response(status: &str, headers: &str, body: &str) -> String {
    format!("HTTP/1.1 {status}\r\n{headers}Cache-Control: no-store\r\nConnection: close\r\n\r\n{body}")
}

/// Serve one response with the given content type.
fn serve_once(content_type: &str, body: &str) -> String {
    let headers = format!("Content-Type: {content_type}\r\n");
    serve(vec![response("200 OK", &headers, body)]).0
}

fn record(source: &NativeEventSource, types: &[&str]) -> Rc<RefCell<Vec<EventSourceEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let listener = {
        let seen = seen.clone();
        EventListener::new(move |event| seen.borrow_mut().push(event.clone()))
    };
    for ty in types {
        source.add_event_listener(ty, &listener);
    }
    seen
}

/// Pump signals until `done` holds or the deadline passes.
fn pump_until(factory: &NativeEventSourceFactory, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        factory.dispatch_pending();
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn streams_open_messages_and_named_events() {
    let url = serve_once(
        "text/event-stream; charset=utf-8",
        ": keep-alive\n\ndata: hello\n\nevent: ping\nid: 7\ndata: a\ndata: b\n\n",
    );
    let factory = NativeEventSourceFactory::new(NativeEventSourceConfig::default());
    let source = factory.connect(&url, &EventSourceInit::default());
    let seen = record(&source, &["open", "message", "ping", "error"]);

    assert!(pump_until(&factory, || seen
        .borrow()
        .iter()
        .any(|event| event.event_type == "error")));

    let seen = seen.borrow();
    let types: Vec<&str> = seen.iter().map(|event| event.event_type.as_str()).collect();
    assert_eq!(types, vec!["open", "message", "ping", "error"]);
    assert_eq!(seen[1].data, "hello");
    assert_eq!(seen[1].origin, url.trim_end_matches("/events"));
    assert_eq!(seen[2].data, "a\nb");
    assert_eq!(seen[2].last_event_id, "7");
    assert_eq!(source.ready_state(), ReadyState::Closed);
}

#[test]
fn wrong_content_type_fails_without_opening() {
    let url = serve_once("text/plain", "data: nope\n\n");
    let factory = NativeEventSourceFactory::new(NativeEventSourceConfig::default());
    let source = factory.connect(&url, &EventSourceInit::default());
    let seen = record(&source, &["open", "message", "error"]);

    assert!(pump_until(&factory, || !seen.borrow().is_empty()));

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].event_type, "error");
    assert!(seen[0].data.contains("content type"), "{}", seen[0].data);
}

#[test]
fn invalid_address_fails() {
    let factory = NativeEventSourceFactory::new(NativeEventSourceConfig::default());
    let source = factory.connect("not a url", &EventSourceInit::default());
    let seen = record(&source, &["error"]);

    assert!(pump_until(&factory, || !seen.borrow().is_empty()));
    assert!(seen.borrow()[0].data.contains("invalid URL"));
    assert_eq!(source.ready_state(), ReadyState::Closed);
}

#[test]
fn closed_source_receives_nothing() {
    let url = serve_once("text/event-stream", "data: late\n\n");
    let factory = NativeEventSourceFactory::new(NativeEventSourceConfig::default());
    let source = factory.connect(&url, &EventSourceInit::default());
    let seen = record(&source, &["open", "message", "error"]);

    source.close();
    assert_eq!(factory.live_sources(), 0);

    thread::sleep(Duration::from_millis(200));
    factory.dispatch_pending();
    assert!(seen.borrow().is_empty());
}

#[test]
fn non_ok_status_fails_without_opening() {
    let (url, _requests) = serve(vec![response("204 No Content", "", "")]);
    let factory = NativeEventSourceFactory::new(NativeEventSourceConfig::default());
    let source = factory.connect(&url, &EventSourceInit::default());
    let seen = record(&source, &["open", "message", "error"]);

    assert!(pump_until(&factory, || !seen.borrow().is_empty()));
    thread::sleep(Duration::from_millis(100));
    factory.dispatch_pending();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].event_type, "error");
    assert!(seen[0].data.contains("204"), "{}", seen[0].data);
    assert_eq!(source.ready_state(), ReadyState::Closed);
}

/// Open a source and wait until its stream has ended.
fn run_to_end(factory: &Rc<NativeEventSourceFactory>, url: &str, with_credentials: bool) {
    let source = factory.connect(url, &EventSourceInit { with_credentials });
    let seen = record(&source, &["error"]);
    assert!(pump_until(factory, || !seen.borrow().is_empty()));
}

fn sends_cookie(head: &str) -> bool {
    head.lines().any(|line| {
        line.to_ascii_lowercase().starts_with("cookie:") && line.contains("session=abc")
    })
}

#[test]
fn credentialed_sources_send_stored_cookies() {
    let set_cookie = "Content-Type: text/event-stream\r\nSet-Cookie: session=abc; Path=/\r\n";
    let plain = "Content-Type: text/event-stream\r\n";
    let (url, requests) = serve(vec![
        response("200 OK", set_cookie, "data: one\n\n"),
        response("200 OK", plain, "data: two\n\n"),
        response("200 OK", set_cookie, "data: one\n\n"),
        response("200 OK", plain, "data: two\n\n"),
    ]);
    let wait = Duration::from_secs(10);

    let credentialed = NativeEventSourceFactory::new(NativeEventSourceConfig::default());
    run_to_end(&credentialed, &url, true);
    run_to_end(&credentialed, &url, true);
    let first = requests.recv_timeout(wait).expect("first request");
    let second = requests.recv_timeout(wait).expect("second request");
    assert!(!sends_cookie(&first));
    assert!(sends_cookie(&second), "{second}");

    let anonymous = NativeEventSourceFactory::new(NativeEventSourceConfig::default());
    run_to_end(&anonymous, &url, false);
    run_to_end(&anonymous, &url, false);
    let _ = requests.recv_timeout(wait).expect("third request");
    let fourth = requests.recv_timeout(wait).expect("fourth request");
    assert!(!sends_cookie(&fourth), "{fourth}");
}
