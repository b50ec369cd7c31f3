use std::io;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::directory::ConnectionHandle;

/// Errors from the remote command channel
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to launch remote command: {0}")]
    Spawn(#[source] io::Error),

    #[error("remote channel i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Captured result of a one-shot remote command
#[derive(Clone, Debug)]
pub struct ExecOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    /// Check for a zero exit status
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Line-oriented handle to a continuously tailing remote command.
///
/// Dropping the stream drops its guard, which closes the underlying channel
/// (for the process adapter, the child is killed).
pub struct LogStream {
    lines: Lines<Box<dyn AsyncBufRead + Send + Unpin>>,
    _guard: Option<Box<dyn Send>>,
}

impl LogStream {
    /// Wrap a buffered reader with no attached guard
    pub fn new(reader: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
        let reader: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(reader);
        Self {
            lines: reader.lines(),
            _guard: None,
        }
    }

    /// Wrap a buffered reader with a guard dropped when the stream closes
    pub fn with_guard(
        reader: impl AsyncBufRead + Send + Unpin + 'static,
        guard: impl Send + 'static,
    ) -> Self {
        let reader: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(reader);
        Self {
            lines: reader.lines(),
            _guard: Some(Box::new(guard)),
        }
    }

    /// Read the next line, without its trailing newline.
    ///
    /// Returns `Ok(None)` once the remote side closes the stream. Safe to
    /// race in a `select!`: a partially received line is kept for the next
    /// call rather than dropped.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

/// Capability to run commands over an established remote connection.
///
/// The core treats command strings as opaque and output as newline-delimited
/// text; how the connection is established and authenticated is the
/// implementor's concern.
#[async_trait]
pub trait RemoteExecutor: Send + Sync + 'static {
    /// Run a one-shot command and capture its output
    async fn execute(
        &self,
        conn: &ConnectionHandle,
        command: &str,
    ) -> Result<ExecOutput, RemoteError>;

    /// Open a continuously streaming command
    async fn open_stream(
        &self,
        conn: &ConnectionHandle,
        command: &str,
    ) -> Result<LogStream, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_next_line_strips_newlines() {
        let mut stream = LogStream::new(std::io::Cursor::new(b"one\ntwo\r\n\nthree".to_vec()));
        assert_eq!(stream.next_line().await.unwrap(), Some("one".to_string()));
        assert_eq!(stream.next_line().await.unwrap(), Some("two".to_string()));
        assert_eq!(stream.next_line().await.unwrap(), Some(String::new()));
        assert_eq!(stream.next_line().await.unwrap(), Some("three".to_string()));
        assert_eq!(stream.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_guard_dropped_with_stream() {
        struct Tracker(std::sync::Arc<std::sync::atomic::AtomicBool>);
        impl Drop for Tracker {
            fn drop(&mut self) {
                self.0.store(true, std::sync::atomic::Ordering::SeqCst);
            }
        }

        let dropped = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let stream = LogStream::with_guard(
            std::io::Cursor::new(Vec::new()),
            Tracker(dropped.clone()),
        );
        assert!(!dropped.load(std::sync::atomic::Ordering::SeqCst));
        drop(stream);
        assert!(dropped.load(std::sync::atomic::Ordering::SeqCst));
    }
}
