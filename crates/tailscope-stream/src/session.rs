use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tailscope_logs::RingBuffer;
use tailscope_remote::{ConnectionDirectory, RemoteError, RemoteExecutor};
use tailscope_types::{LogBatch, StreamEvent};

use crate::command::tail_command;
use crate::error::StreamError;
use crate::sink::EventSink;

/// Backlog lines requested when a live tail starts
pub const DEFAULT_TAIL_BACKLOG: u32 = 100;

/// Flush thresholds for pending batches.
///
/// A batch goes out once `max_lines` are pending or `max_delay` has passed
/// since the last flush, whichever happens first.
#[derive(Clone, Copy, Debug)]
pub struct BatchPolicy {
    pub max_lines: usize,
    pub max_delay: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            max_lines: 10,
            max_delay: Duration::from_millis(500),
        }
    }
}

/// Collaborators a session's read loop runs against.
#[derive(Clone)]
pub struct StreamContext {
    pub executor: Arc<dyn RemoteExecutor>,
    pub directory: Arc<dyn ConnectionDirectory>,
    pub sink: Arc<dyn EventSink>,
    pub policy: BatchPolicy,
    pub backlog: u32,
}

/// Lifecycle states of a stream session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
}

/// State shared between the session handle and its read task
struct SessionShared {
    stopped: AtomicBool,
    cancel: CancellationToken,
    buffer: RingBuffer,
}

/// One live tail: owns the remote read loop, its replay buffer, and its
/// batching state.
pub struct StreamSession {
    session_id: String,
    target: String,
    shared: Arc<SessionShared>,
    handle: Option<JoinHandle<()>>,
    state: SessionState,
}

impl StreamSession {
    /// Create a session in the Idle state. `capacity` is clamped by the
    /// replay buffer to its hard ceiling.
    pub fn new(session_id: impl Into<String>, target: impl Into<String>, capacity: usize) -> Self {
        Self {
            session_id: session_id.into(),
            target: target.into(),
            shared: Arc::new(SessionShared {
                stopped: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                buffer: RingBuffer::new(capacity),
            }),
            handle: None,
            state: SessionState::Idle,
        }
    }

    /// Spawn the read loop. Only an Idle session starts; anything else is a
    /// no-op.
    pub fn start(&mut self, ctx: &StreamContext) {
        if self.state != SessionState::Idle {
            return;
        }
        self.state = SessionState::Running;
        let read_loop = ReadLoop {
            session_id: self.session_id.clone(),
            target: self.target.clone(),
            shared: Arc::clone(&self.shared),
            ctx: ctx.clone(),
        };
        self.handle = Some(tokio::spawn(read_loop.run()));
    }

    /// Stop the session. Idempotent and safe from any state; returns without
    /// waiting for the remote side. Once this returns, no further events for
    /// the session are emitted.
    pub fn stop(&mut self) {
        if self.shared.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.state = SessionState::Stopped;
        debug!(session_id = %self.session_id, "log stream stopped");
    }

    /// Request a stop without aborting the task, so a shutdown drain can
    /// give it a grace period to wind down.
    pub(crate) fn signal_stop(&mut self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        self.shared.cancel.cancel();
        self.state = SessionState::Stopped;
    }

    pub(crate) fn take_handle(&mut self) -> Option<JoinHandle<()>> {
        self.handle.take()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if the read task is still live
    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Replay buffer, readable by diagnostic callers while the loop writes
    pub fn buffer(&self) -> &RingBuffer {
        &self.shared.buffer
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The per-session read loop, run as one dedicated task.
struct ReadLoop {
    session_id: String,
    target: String,
    shared: Arc<SessionShared>,
    ctx: StreamContext,
}

impl ReadLoop {
    async fn run(mut self) {
        match self.tail().await {
            Ok(()) => {}
            Err(StreamError::ConnectionUnavailable(session_id)) => {
                warn!(session_id = %session_id, "no connection available; log stream was never started");
            }
            Err(err) => {
                if self.shared.stopped.load(Ordering::SeqCst) {
                    // Expected noise from force-closing the channel
                    debug!(session_id = %self.session_id, error = %err, "suppressing stream error after stop");
                } else {
                    warn!(session_id = %self.session_id, error = %err, "log stream failed");
                    self.emit(StreamEvent::Error {
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    async fn tail(&mut self) -> Result<(), StreamError> {
        let conn = self
            .ctx
            .directory
            .lookup(&self.session_id)
            .ok_or_else(|| StreamError::ConnectionUnavailable(self.session_id.clone()))?;

        let command = tail_command(&self.target, self.ctx.backlog);
        let mut stream = self.ctx.executor.open_stream(&conn, &command).await?;
        debug!(session_id = %self.session_id, target = %self.target, "log stream opened");

        let cancel = self.shared.cancel.clone();
        let mut pending: Vec<String> = Vec::new();
        let mut next_flush = Instant::now() + self.ctx.policy.max_delay;

        let reached_eof = loop {
            tokio::select! {
                _ = cancel.cancelled() => break false,

                _ = tokio::time::sleep_until(next_flush) => {
                    self.flush(&mut pending, false);
                    next_flush = Instant::now() + self.ctx.policy.max_delay;
                }

                line = stream.next_line() => match line {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        self.shared.buffer.push(line.clone());
                        pending.push(line);
                        if pending.len() >= self.ctx.policy.max_lines {
                            self.flush(&mut pending, false);
                            next_flush = Instant::now() + self.ctx.policy.max_delay;
                        }
                    }
                    Ok(None) => break true,
                    Err(err) => {
                        self.flush(&mut pending, true);
                        return Err(RemoteError::Io(err).into());
                    }
                }
            }
        };

        self.flush(&mut pending, true);
        if reached_eof {
            debug!(session_id = %self.session_id, "log stream closed by remote side");
            self.emit(StreamEvent::Closed);
        }
        Ok(())
    }

    fn flush(&self, pending: &mut Vec<String>, is_final: bool) {
        if pending.is_empty() {
            return;
        }
        let batch = LogBatch {
            session_id: self.session_id.clone(),
            target: self.target.clone(),
            total_lines: self.shared.buffer.len(),
            timestamp: Utc::now(),
            is_real_time: true,
            is_final,
            lines: std::mem::take(pending),
        };
        self.emit(StreamEvent::Batch(batch));
    }

    fn emit(&self, event: StreamEvent) {
        // Nothing may reach subscribers once a stop was requested
        if self.shared.stopped.load(Ordering::SeqCst) {
            return;
        }
        self.ctx.sink.emit(&self.session_id, event);
    }
}
