use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future;
use parking_lot::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use tailscope_remote::{ConnectionDirectory, RemoteExecutor};

use crate::session::{BatchPolicy, DEFAULT_TAIL_BACKLOG, StreamContext, StreamSession};
use crate::sink::EventSink;

/// Process-wide owner of the active stream sessions.
///
/// Guarantees at most one active tail per session identifier: starting a
/// stream for an identifier that is already live stops the previous session
/// fully before the new one starts, all under one map lock.
pub struct StreamRegistry {
    sessions: Mutex<HashMap<String, StreamSession>>,
    ctx: StreamContext,
}

impl StreamRegistry {
    pub fn new(
        executor: Arc<dyn RemoteExecutor>,
        directory: Arc<dyn ConnectionDirectory>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self::with_context(StreamContext {
            executor,
            directory,
            sink,
            policy: BatchPolicy::default(),
            backlog: DEFAULT_TAIL_BACKLOG,
        })
    }

    pub fn with_context(ctx: StreamContext) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ctx,
        }
    }

    /// Start tailing `target` under `session_id`, replacing any previous
    /// session for that identifier. `max_lines` sizes the replay buffer and
    /// is clamped to the buffer's hard ceiling.
    pub fn start_log_stream(&self, session_id: &str, target: &str, max_lines: usize) {
        let mut sessions = self.sessions.lock();
        if let Some(mut previous) = sessions.remove(session_id) {
            debug!(session_id, "replacing active log stream");
            previous.stop();
        }

        let mut session = StreamSession::new(session_id, target, max_lines);
        session.start(&self.ctx);
        info!(
            session_id,
            target,
            capacity = session.buffer().capacity(),
            "log stream started"
        );
        sessions.insert(session_id.to_string(), session);
    }

    /// Stop and remove the session if present. Returns whether one existed.
    pub fn stop_log_stream(&self, session_id: &str) -> bool {
        let removed = self.sessions.lock().remove(session_id);
        match removed {
            Some(mut session) => {
                session.stop();
                info!(session_id, "log stream removed");
                true
            }
            None => false,
        }
    }

    /// Number of registered sessions
    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Check if a session's read task is still live
    pub fn is_streaming(&self, session_id: &str) -> bool {
        self.sessions
            .lock()
            .get(session_id)
            .is_some_and(|s| s.is_running())
    }

    /// Replay-buffer occupancy of a session
    pub fn buffered_lines(&self, session_id: &str) -> Option<usize> {
        self.sessions
            .lock()
            .get(session_id)
            .map(|s| s.buffer().len())
    }

    /// Replay-buffer capacity of a session
    pub fn buffer_capacity(&self, session_id: &str) -> Option<usize> {
        self.sessions
            .lock()
            .get(session_id)
            .map(|s| s.buffer().capacity())
    }

    /// Snapshot of a session's replay cache, oldest first
    pub fn replay(&self, session_id: &str) -> Option<Vec<String>> {
        self.sessions
            .lock()
            .get(session_id)
            .map(|s| s.buffer().all())
    }

    /// Stop every session and drain their tasks, waiting up to `grace` for
    /// them to finish before force-cancelling. Returns the number of tasks
    /// that had to be force-cancelled.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        let mut drained: Vec<StreamSession> = {
            let mut sessions = self.sessions.lock();
            sessions.drain().map(|(_, session)| session).collect()
        };
        if drained.is_empty() {
            return 0;
        }
        info!(sessions = drained.len(), "shutting down log streams");

        let mut handles = Vec::new();
        for session in &mut drained {
            session.signal_stop();
            if let Some(handle) = session.take_handle() {
                handles.push(handle);
            }
        }

        let joined = future::join_all(handles.iter_mut().map(|handle| timeout(grace, handle))).await;

        let mut forced = 0;
        for (result, handle) in joined.iter().zip(handles.iter()) {
            if result.is_err() {
                handle.abort();
                forced += 1;
            }
        }
        if forced > 0 {
            warn!(forced, "forcibly cancelled streaming tasks during shutdown");
        }
        forced
    }
}
