//! Session state machine tests.

use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use render_config::Severity;
use render_wire::Props;
use rstest::{fixture, rstest};

use crate::dispatch::{Dispatcher, RenderError, RenderFn};
use crate::logger::{BufferSink, LogSink, Logger};
use crate::registry::Registry;

use super::*;

struct Fixture {
    sink: Arc<BufferSink>,
    dispatcher: Dispatcher<String>,
}

impl Fixture {
    fn with_render(render: Arc<RenderFn<String>>) -> Self {
        let sink = Arc::new(BufferSink::new());
        let registry = Arc::new(Registry::new());
        registry.register("gunnar", String::from("gunnar"));
        let logger = Logger::new(
            Severity::Debug,
            false,
            Arc::clone(&sink) as Arc<dyn LogSink>,
        );
        Self {
            sink,
            dispatcher: Dispatcher::new(registry, render, logger),
        }
    }

    fn serve(&self, input: &str) -> (SessionReport, SharedOutbound) {
        self.serve_reader(Cursor::new(input.as_bytes().to_vec()))
    }

    fn serve_reader<R: Read>(&self, reader: R) -> (SessionReport, SharedOutbound) {
        let outbound = SharedOutbound::new();
        let report = StreamSession::new(&self.dispatcher).run(reader, outbound.clone());
        (report, outbound)
    }
}

fn greet(component: &String, props: &Props) -> Result<String, RenderError> {
    match props.get_str("fail") {
        Some("error") => Err(RenderError::new("render exploded")),
        Some("panic") => panic!("render panicked"),
        _ => {
            let suffix = if props.flag("exclamate") { "!" } else { "." };
            Ok(format!("hello {component}{suffix}"))
        }
    }
}

#[fixture]
fn fixture() -> Fixture {
    Fixture::with_render(Arc::new(greet))
}

fn content_for(outbound: &SharedOutbound, key: &str) -> Option<String> {
    let responses = outbound.responses();
    let matching: Vec<_> = responses
        .iter()
        .filter(|response| response.request_key == key)
        .collect();
    assert_eq!(matching.len(), 1, "expected one response for {key}");
    matching.first().and_then(|response| response.content.clone())
}

#[rstest]
fn answers_every_request_with_its_key(fixture: Fixture) {
    let input = concat!(
        "{\"request_key\":\"a\",\"name\":\"test\",\"props\":null}\n",
        "{\"request_key\":\"b\",\"name\":\"gunnar\",\"props\":{\"exclamate\":false}}\n",
        "{\"request_key\":\"c\",\"name\":\"gunnar\",\"props\":{\"exclamate\":true}}\n",
        "{\"request_key\":\"d\",\"name\":\"gunnar\",\"props\":{\"exclamate\":true}}\n",
        "{\"request_key\":\"e\",\"name\":\"gunnar\",\"props\":{\"exclamate\":true}}\n",
        "{\"request_key\":\"f\",\"name\":\"gunnar\",\"props\":{\"exclamate\":true}}\n",
    );
    let (report, outbound) = fixture.serve(input);

    assert!(report.is_graceful());
    assert_eq!(report.state, SessionState::Closed);
    assert_eq!(report.requests, 6);
    assert_eq!(report.responses, 6);
    assert_eq!(content_for(&outbound, "a"), None);
    assert_eq!(content_for(&outbound, "b").as_deref(), Some("hello gunnar."));
    for key in ["c", "d", "e", "f"] {
        assert_eq!(content_for(&outbound, key).as_deref(), Some("hello gunnar!"));
    }
    assert!(outbound.is_closed(), "end of output should be signalled");
}

#[rstest]
fn unregistered_name_keeps_the_session_open(fixture: Fixture) {
    let input = concat!(
        "{\"request_key\":\"1\",\"name\":\"test\"}\n",
        "{\"request_key\":\"2\",\"name\":\"gunnar\"}\n",
    );
    let (report, outbound) = fixture.serve(input);

    assert!(report.is_graceful());
    assert_eq!(content_for(&outbound, "1"), None);
    assert_eq!(content_for(&outbound, "2").as_deref(), Some("hello gunnar."));
    assert!(
        fixture
            .sink
            .contains(Severity::Warning, "Name \"test\" not registered")
    );
}

#[rstest]
#[case::error("error", "render exploded")]
#[case::panic("panic", "render panicked")]
fn render_failures_answer_null(
    fixture: Fixture,
    #[case] mode: &str,
    #[case] logged: &str,
) {
    let input = format!(
        "{{\"request_key\":\"bad\",\"name\":\"gunnar\",\"props\":{{\"fail\":\"{mode}\"}}}}\n\
         {{\"request_key\":\"good\",\"name\":\"gunnar\"}}\n"
    );
    let (report, outbound) = fixture.serve(&input);

    assert!(report.is_graceful());
    assert_eq!(report.responses, 2);
    assert_eq!(content_for(&outbound, "bad"), None);
    assert_eq!(content_for(&outbound, "good").as_deref(), Some("hello gunnar."));
    assert!(fixture.sink.contains(Severity::Error, logged));
}

#[rstest]
fn end_of_input_closes_once(fixture: Fixture) {
    let (report, outbound) = fixture.serve("");

    assert!(report.is_graceful());
    assert_eq!(report.responses, 0);
    assert!(outbound.is_closed());
    assert_eq!(fixture.sink.count(Severity::Info), 1);
    assert!(fixture.sink.contains(Severity::Info, "Closed connection"));
}

#[rstest]
fn blank_lines_are_ignored(fixture: Fixture) {
    let (report, outbound) = fixture.serve("\n   \n{\"request_key\":\"x\",\"name\":\"gunnar\"}\n");

    assert_eq!(report.requests, 1);
    assert_eq!(outbound.responses().len(), 1);
}

#[rstest]
fn malformed_request_with_key_is_answered_with_null(fixture: Fixture) {
    let (report, outbound) = fixture.serve("{\"request_key\":\"k\",\"props\":{}}\n");

    assert!(report.is_graceful());
    assert_eq!(report.requests, 1);
    assert_eq!(content_for(&outbound, "k"), None);
    assert!(fixture.sink.contains(Severity::Warning, "Rejected request \"k\""));
}

#[rstest]
fn unreadable_request_is_discarded(fixture: Fixture) {
    let (report, outbound) = fixture.serve("not json\n");

    assert!(report.is_graceful());
    assert_eq!(report.requests, 0);
    assert!(outbound.responses().is_empty());
    assert!(
        fixture
            .sink
            .contains(Severity::Warning, "Discarded unreadable request")
    );
}

#[rstest]
fn read_failure_ends_the_session_abruptly(fixture: Fixture) {
    let input = Cursor::new(b"{\"request_key\":\"a\",\"name\":\"gunnar\"}\n".to_vec());
    let (report, outbound) = fixture.serve_reader(input.chain(FailingReader));

    assert!(matches!(
        report.outcome,
        SessionOutcome::Failed(SessionError::Io(_))
    ));
    assert_eq!(report.state, SessionState::Closed);
    assert_eq!(report.requests, 1);
    assert!(!outbound.is_closed(), "no end of output after a failure");
    assert!(fixture.sink.contains(Severity::Error, "Connection failed"));
    assert!(!fixture.sink.contains(Severity::Info, "Closed connection"));
}

#[rstest]
fn oversized_line_ends_the_session(fixture: Fixture) {
    let input = format!(
        "{{\"request_key\":\"a\",\"name\":\"gunnar\"}}\n{}\n",
        "x".repeat(128)
    );
    let outbound = SharedOutbound::new();
    let lines = LineReader::with_limit(Cursor::new(input.into_bytes()), 64);
    let report = StreamSession::new(&fixture.dispatcher).run_lines(lines, outbound.clone());

    assert!(matches!(
        report.outcome,
        SessionOutcome::Failed(SessionError::RequestTooLarge { .. })
    ));
    assert_eq!(report.requests, 1);
    assert!(!outbound.is_closed());
}

#[rstest]
fn write_failure_ends_the_session(fixture: Fixture) {
    let writer = FailingWriter::default();
    let input = Cursor::new(b"{\"request_key\":\"a\",\"name\":\"gunnar\"}\n".to_vec());
    let report = StreamSession::new(&fixture.dispatcher).run(input, writer.clone());

    assert!(matches!(
        report.outcome,
        SessionOutcome::Failed(SessionError::Io(_))
    ));
    assert_eq!(report.responses, 0);
    assert!(!writer.was_closed());
}

#[test]
fn slow_render_does_not_hold_back_later_requests() {
    let (release, gate) = mpsc::channel::<()>();
    let release = Mutex::new(release);
    let gate = Mutex::new(gate);
    let render: Arc<RenderFn<String>> = Arc::new(move |component: &String, props: &Props| -> Result<String, RenderError> {
        if props.flag("slow") {
            gate.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recv_timeout(Duration::from_secs(5))
                .map_err(|_| RenderError::new("fast request never rendered"))?;
            Ok(format!("slow {component}"))
        } else {
            release
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .send(())
                .map_err(|_| RenderError::new("slow request gone"))?;
            Ok(format!("fast {component}"))
        }
    });
    let fixture = Fixture::with_render(render);
    let input = concat!(
        "{\"request_key\":\"slow\",\"name\":\"gunnar\",\"props\":{\"slow\":true}}\n",
        "{\"request_key\":\"fast\",\"name\":\"gunnar\"}\n",
    );

    let (report, outbound) = fixture.serve(input);

    assert!(report.is_graceful());
    assert_eq!(report.responses, 2);
    assert_eq!(content_for(&outbound, "fast").as_deref(), Some("fast gunnar"));
    assert_eq!(content_for(&outbound, "slow").as_deref(), Some("slow gunnar"));
}

fn keyed_requests(count: usize) -> String {
    (0..count)
        .map(|index| format!("{{\"request_key\":\"{index}\",\"name\":\"gunnar\"}}\n"))
        .collect()
}

#[test]
fn pipelined_requests_stay_within_the_worker_limit() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let render: Arc<RenderFn<String>> = {
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);
        Arc::new(move |component: &String, _props: &Props| -> Result<String, RenderError> {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            running.fetch_sub(1, Ordering::SeqCst);
            Ok(format!("hello {component}"))
        })
    };
    let fixture = Fixture::with_render(render);
    let (report, outbound) = fixture.serve(&keyed_requests(MAX_IN_FLIGHT * 4));

    assert!(report.is_graceful());
    assert_eq!(report.requests, MAX_IN_FLIGHT * 4);
    assert_eq!(report.responses, MAX_IN_FLIGHT * 4);
    assert!(peak.load(Ordering::SeqCst) <= MAX_IN_FLIGHT);
    assert!(outbound.is_closed());
}

#[test]
fn requests_render_inline_without_workers() {
    let threads = Arc::new(Mutex::new(Vec::new()));
    let render: Arc<RenderFn<String>> = {
        let threads = Arc::clone(&threads);
        Arc::new(move |component: &String, _props: &Props| -> Result<String, RenderError> {
            threads
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(thread::current().id());
            Ok(format!("hello {component}"))
        })
    };
    let fixture = Fixture::with_render(render);
    let outbound = SharedOutbound::new();
    let report = StreamSession::new(&fixture.dispatcher)
        .with_worker_limit(0)
        .run(Cursor::new(keyed_requests(3).into_bytes()), outbound.clone());

    assert!(report.is_graceful());
    assert_eq!(report.responses, 3);
    assert_eq!(content_for(&outbound, "1").as_deref(), Some("hello gunnar"));
    let session_thread = thread::current().id();
    let threads = threads.lock().unwrap_or_else(PoisonError::into_inner);
    assert_eq!(threads.len(), 3);
    assert!(threads.iter().all(|id| *id == session_thread));
}
