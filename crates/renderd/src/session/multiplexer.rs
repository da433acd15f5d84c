//! Duplex session state machine.

use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SendError};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, Scope};

use render_wire::{RenderRequest, RenderResponse, WireError};

use crate::dispatch::{CallMode, Dispatcher};

use super::errors::SessionError;
use super::reader::LineReader;
use super::writer::{OutboundHalf, ResponseWriter};

/// Upper bound on renders running concurrently within one session.
pub const MAX_IN_FLIGHT: usize = 32;

const WORKER_THREAD_NAME: &str = "render-dispatch";

/// Lifecycle state of a duplex session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepting requests and writing responses.
    Open,
    /// The peer ended its input; in-flight dispatches are draining.
    Closing,
    /// Terminal; nothing more is read or written.
    Closed,
}

/// How a session reached [`SessionState::Closed`].
#[derive(Debug)]
pub enum SessionOutcome {
    /// The peer ended its input and end-of-output was signalled.
    Graceful,
    /// The transport failed; end-of-output was not signalled.
    Failed(SessionError),
}

/// Summary of a finished session.
#[derive(Debug)]
pub struct SessionReport {
    /// Final state; always [`SessionState::Closed`] once `run` returns.
    pub state: SessionState,
    /// Requests that were answered or owed an answer.
    pub requests: usize,
    /// Responses written to the peer.
    pub responses: usize,
    /// Whether the session ended gracefully.
    pub outcome: SessionOutcome,
}

impl SessionReport {
    /// Whether the peer ended the session and end-of-output was sent.
    pub fn is_graceful(&self) -> bool {
        matches!(self.outcome, SessionOutcome::Graceful)
    }
}

/// Multiplexes keyed render requests over one duplex connection.
///
/// Inbound requests are handed to a pool of scoped worker threads while the
/// session keeps reading, so a slow render never holds up later requests.
/// The pool grows on demand up to [`MAX_IN_FLIGHT`] workers; beyond that the
/// session stops reading until a worker frees up. Responses are written in
/// completion order through a shared writer; each carries the `request_key`
/// of the request it answers.
pub struct StreamSession<'a, T> {
    dispatcher: &'a Dispatcher<T>,
    worker_limit: usize,
}

/// Session-side view of the worker pool.
///
/// Only the session thread reserves idle workers and only workers release
/// them, so every queued request has a worker that is or will become free.
struct Workers<'q> {
    queue: mpsc::SyncSender<RenderRequest>,
    receiver: &'q Mutex<Receiver<RenderRequest>>,
    idle: &'q AtomicUsize,
    spawned: usize,
}

impl Workers<'_> {
    fn reserve_idle(&self) -> bool {
        if self.idle.load(Ordering::Acquire) == 0 {
            return false;
        }
        self.idle.fetch_sub(1, Ordering::AcqRel);
        true
    }
}

struct Outbound<W> {
    writer: Mutex<ResponseWriter<W>>,
    failure: Mutex<Option<SessionError>>,
}

impl<W: OutboundHalf> Outbound<W> {
    fn has_failed(&self) -> bool {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn record_failure(&self, error: SessionError) {
        let mut slot = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(error);
        }
    }

    fn send(&self, response: &RenderResponse) {
        if self.has_failed() {
            return;
        }
        let result = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write_response(response);
        if let Err(error) = result {
            self.record_failure(error);
        }
    }
}

impl<'a, T: Send + Sync> StreamSession<'a, T> {
    /// Creates a session dispatching through `dispatcher`.
    pub fn new(dispatcher: &'a Dispatcher<T>) -> Self {
        Self {
            dispatcher,
            worker_limit: MAX_IN_FLIGHT,
        }
    }

    /// Caps the worker pool at `limit` threads. With a limit of zero every
    /// request is rendered on the session thread.
    #[cfg(test)]
    pub(crate) fn with_worker_limit(mut self, limit: usize) -> Self {
        self.worker_limit = limit;
        self
    }

    /// Serves the session until the peer ends its input or the transport
    /// fails, then returns a summary.
    pub fn run<R: Read, W: OutboundHalf>(&self, reader: R, writer: W) -> SessionReport {
        self.run_lines(LineReader::new(reader), writer)
    }

    pub(crate) fn run_lines<R: Read, W: OutboundHalf>(
        &self,
        mut lines: LineReader<R>,
        writer: W,
    ) -> SessionReport {
        let logger = self.dispatcher.logger();
        let outbound = Outbound {
            writer: Mutex::new(ResponseWriter::new(writer)),
            failure: Mutex::new(None),
        };
        let mut state = SessionState::Open;
        let mut requests = 0_usize;
        let (queue, receiver) = mpsc::sync_channel(self.worker_limit.max(1));
        let receiver = Mutex::new(receiver);
        let idle = AtomicUsize::new(0);

        thread::scope(|scope| {
            let mut workers = Workers {
                queue,
                receiver: &receiver,
                idle: &idle,
                spawned: 0,
            };
            while state == SessionState::Open && !outbound.has_failed() {
                match lines.next_line() {
                    Ok(Some(line)) => match RenderRequest::parse(&line) {
                        Ok(request) => {
                            requests += 1;
                            self.submit(scope, &mut workers, request, &outbound);
                        }
                        Err(WireError::Empty) => {}
                        Err(error) => {
                            if self.reject(&line, &error, &outbound) {
                                requests += 1;
                            }
                        }
                    },
                    Ok(None) => {
                        logger.info("Closed connection");
                        state = SessionState::Closing;
                    }
                    Err(error) => outbound.record_failure(error),
                }
            }
            drop(workers);
        });

        let Outbound { writer, failure } = outbound;
        let mut writer = writer.into_inner().unwrap_or_else(PoisonError::into_inner);
        let failure = failure.into_inner().unwrap_or_else(PoisonError::into_inner);
        let failure = match failure {
            Some(error) => Some(error),
            None => writer.finish().err(),
        };
        let outcome = match failure {
            Some(error) => {
                logger.error(&format!("Connection failed: {error}"));
                SessionOutcome::Failed(error)
            }
            None => SessionOutcome::Graceful,
        };

        SessionReport {
            state: SessionState::Closed,
            requests,
            responses: writer.written(),
            outcome,
        }
    }

    /// Hands `request` to an idle worker, spawning one when none is free and
    /// the pool has room. Renders inline when no worker can be obtained.
    fn submit<'scope, 'env, W>(
        &'env self,
        scope: &'scope Scope<'scope, 'env>,
        workers: &mut Workers<'env>,
        request: RenderRequest,
        outbound: &'env Outbound<W>,
    ) where
        W: OutboundHalf + Send,
        T: 'env,
    {
        if !workers.reserve_idle() && workers.spawned < self.worker_limit {
            let receiver = workers.receiver;
            let idle = workers.idle;
            let spawned = thread::Builder::new()
                .name(WORKER_THREAD_NAME.to_owned())
                .spawn_scoped(scope, move || self.work(receiver, idle, outbound));
            match spawned {
                Ok(_) => workers.spawned += 1,
                Err(error) => self
                    .dispatcher
                    .logger()
                    .warning(&format!("Rendering inline, worker unavailable: {error}")),
            }
        }

        if workers.spawned == 0 {
            self.answer(request, outbound);
        } else if let Err(SendError(request)) = workers.queue.send(request) {
            self.answer(request, outbound);
        }
    }

    fn work<W: OutboundHalf>(
        &self,
        receiver: &Mutex<Receiver<RenderRequest>>,
        idle: &AtomicUsize,
        outbound: &Outbound<W>,
    ) {
        loop {
            let next = receiver
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recv();
            let Ok(request) = next else {
                break;
            };
            self.answer(request, outbound);
            idle.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn answer<W: OutboundHalf>(&self, request: RenderRequest, outbound: &Outbound<W>) {
        let RenderRequest {
            request_key,
            name,
            props,
        } = request;
        let content = self
            .dispatcher
            .dispatch(&name, props.as_ref(), CallMode::Streaming)
            .ok();
        outbound.send(&RenderResponse {
            request_key,
            content,
        });
    }

    /// Handles a line that is not a valid request. Returns whether a
    /// response was owed for it.
    fn reject<W: OutboundHalf>(
        &self,
        line: &[u8],
        error: &WireError,
        outbound: &Outbound<W>,
    ) -> bool {
        let logger = self.dispatcher.logger();
        match RenderRequest::recover_request_key(line) {
            Some(request_key) => {
                logger.warning(&format!("Rejected request \"{request_key}\": {error}"));
                outbound.send(&RenderResponse::empty(request_key));
                true
            }
            None => {
                logger.warning(&format!("Discarded unreadable request: {error}"));
                false
            }
        }
    }
}
