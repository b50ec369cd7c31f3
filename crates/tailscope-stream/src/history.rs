use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use tailscope_logs::{LevelFilter, MAX_BUFFER_LINES};
use tailscope_remote::{ConnectionHandle, RemoteExecutor};
use tailscope_types::HistoryResult;

use crate::command::history_command;
use crate::error::StreamError;

/// One-shot retrieval of a bounded log backlog, independent of any active
/// tail. Fetch size shares the replay buffer's hard ceiling.
pub struct HistoryFetcher {
    executor: Arc<dyn RemoteExecutor>,
    conn: ConnectionHandle,
}

impl HistoryFetcher {
    pub fn new(executor: Arc<dyn RemoteExecutor>, conn: ConnectionHandle) -> Self {
        Self { executor, conn }
    }

    /// Fetch the last `lines` lines of `target`, filtered by `level`.
    ///
    /// A non-zero exit status from the remote command is surfaced as an
    /// error, never swallowed.
    pub async fn get_history_logs(
        &self,
        target: &str,
        lines: usize,
        level: Option<&str>,
    ) -> Result<HistoryResult, StreamError> {
        let requested = lines.clamp(1, MAX_BUFFER_LINES);
        let command = history_command(target, requested);
        let output = self.executor.execute(&self.conn, &command).await?;

        if !output.success() {
            return Err(StreamError::RemoteCommand {
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }

        let filter = LevelFilter::new(level)?;
        let selected = filter.apply(output.stdout.lines().filter(|l| !l.trim().is_empty()));
        debug!(
            target,
            requested,
            returned = selected.len(),
            "history fetch complete"
        );

        Ok(HistoryResult {
            target: target.to_string(),
            total_lines: selected.len(),
            lines: selected,
            timestamp: Utc::now(),
            is_real_time: false,
        })
    }
}
