//! In-crate fakes for exercising the streaming core without a container
//! engine: a scripted executor, a collecting sink, and wait helpers.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadBuf};

use tailscope_remote::{
    ConnectionDirectory, ConnectionHandle, ExecOutput, LogStream, RemoteError, RemoteExecutor,
};
use tailscope_types::{LogBatch, StreamEvent};

use crate::session::{BatchPolicy, StreamContext};
use crate::sink::EventSink;

/// Behavior of one scripted `open_stream` call
pub(crate) enum StreamScript {
    /// Emit the lines, then EOF
    Lines(Vec<String>),
    /// Emit the lines, then keep the channel open
    StayOpen(Vec<String>),
    /// Emit the lines, then fail with an i/o error
    FailAfter(Vec<String>),
    /// Never finish opening the channel
    NeverOpen,
}

/// Executor whose streams and one-shot results are scripted by tests.
pub(crate) struct ScriptedExecutor {
    scripts: Mutex<VecDeque<StreamScript>>,
    exec_output: Mutex<Option<ExecOutput>>,
    commands: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
    // Keeps StayOpen write halves alive so their readers never see EOF
    writers: Mutex<Vec<DuplexStream>>,
}

impl ScriptedExecutor {
    pub fn new(scripts: Vec<StreamScript>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            exec_output: Mutex::new(None),
            commands: Mutex::new(Vec::new()),
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            writers: Mutex::new(Vec::new()),
        })
    }

    pub fn single(script: StreamScript) -> Arc<Self> {
        Self::new(vec![script])
    }

    pub fn with_exec(output: ExecOutput) -> Arc<Self> {
        let executor = Self::new(vec![]);
        *executor.exec_output.lock() = Some(output);
        executor
    }

    /// Streams successfully opened so far
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Streams whose channel guard has been dropped
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Command strings received, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }
}

#[async_trait]
impl RemoteExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        _conn: &ConnectionHandle,
        command: &str,
    ) -> Result<ExecOutput, RemoteError> {
        self.commands.lock().push(command.to_string());
        self.exec_output
            .lock()
            .clone()
            .ok_or_else(|| RemoteError::Spawn(io::Error::other("no scripted output")))
    }

    async fn open_stream(
        &self,
        _conn: &ConnectionHandle,
        command: &str,
    ) -> Result<LogStream, RemoteError> {
        self.commands.lock().push(command.to_string());
        let script = self
            .scripts
            .lock()
            .pop_front()
            .unwrap_or(StreamScript::Lines(Vec::new()));

        if matches!(script, StreamScript::NeverOpen) {
            std::future::pending::<()>().await;
            unreachable!();
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        let guard = CloseTracker(self.closed.clone());
        match script {
            StreamScript::Lines(lines) => Ok(LogStream::with_guard(
                std::io::Cursor::new(script_bytes(&lines)),
                guard,
            )),
            StreamScript::StayOpen(lines) => {
                let (mut tx, rx) = tokio::io::duplex(64 * 1024);
                tx.write_all(&script_bytes(&lines)).await.unwrap();
                self.writers.lock().push(tx);
                Ok(LogStream::with_guard(BufReader::new(rx), guard))
            }
            StreamScript::FailAfter(lines) => {
                let reader = std::io::Cursor::new(script_bytes(&lines)).chain(ErrReader);
                Ok(LogStream::with_guard(BufReader::new(reader), guard))
            }
            StreamScript::NeverOpen => unreachable!(),
        }
    }
}

fn script_bytes(lines: &[String]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for line in lines {
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
    }
    bytes
}

/// Increments a counter when the channel guard is dropped
struct CloseTracker(Arc<AtomicUsize>);

impl Drop for CloseTracker {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Reader that fails on the first poll
struct ErrReader;

impl AsyncRead for ErrReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "remote channel reset",
        )))
    }
}

/// Sink that records every emitted event
#[derive(Default)]
pub(crate) struct CollectingSink {
    events: Mutex<Vec<(String, StreamEvent)>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(String, StreamEvent)> {
        self.events.lock().clone()
    }

    pub fn batches(&self) -> Vec<LogBatch> {
        self.events
            .lock()
            .iter()
            .filter_map(|(_, event)| match event {
                StreamEvent::Batch(batch) => Some(batch.clone()),
                _ => None,
            })
            .collect()
    }

    /// Wait until at least `count` events have been emitted
    pub async fn wait_for(&self, count: usize) {
        wait_until(|| self.events.lock().len() >= count).await;
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, session_id: &str, event: StreamEvent) {
        self.events.lock().push((session_id.to_string(), event));
    }
}

/// Directory that never resolves a connection
pub(crate) struct NullDirectory;

impl ConnectionDirectory for NullDirectory {
    fn lookup(&self, _session_id: &str) -> Option<ConnectionHandle> {
        None
    }
}

/// Stream context wired to the given fakes, with default policy
pub(crate) fn context(
    executor: &Arc<ScriptedExecutor>,
    sink: &Arc<CollectingSink>,
) -> StreamContext {
    StreamContext {
        executor: executor.clone(),
        directory: Arc::new(tailscope_remote::StaticDirectory::new(
            ConnectionHandle::local(),
        )),
        sink: sink.clone(),
        policy: BatchPolicy::default(),
        backlog: 100,
    }
}

/// Poll a condition until it holds, panicking after a bounded number of
/// scheduler passes
pub(crate) async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
