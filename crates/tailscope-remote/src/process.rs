use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::BufReader;
use tokio::process::Command;
use tracing::debug;

use crate::directory::ConnectionHandle;
use crate::executor::{ExecOutput, LogStream, RemoteError, RemoteExecutor};

/// Executor that runs command strings as child processes.
///
/// Local connections go through `sh -c`; ssh connections pass the command
/// string to `ssh <host>` and let the remote shell interpret it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }

    fn command_for(conn: &ConnectionHandle, command: &str) -> Command {
        match &conn.host {
            Some(host) => {
                let mut cmd = Command::new("ssh");
                cmd.arg(host).arg(command);
                cmd
            }
            None => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(command);
                cmd
            }
        }
    }
}

#[async_trait]
impl RemoteExecutor for ProcessExecutor {
    async fn execute(
        &self,
        conn: &ConnectionHandle,
        command: &str,
    ) -> Result<ExecOutput, RemoteError> {
        debug!(connection = %conn.id, command, "running one-shot command");
        let output = Self::command_for(conn, command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(RemoteError::Spawn)?;

        Ok(ExecOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn open_stream(
        &self,
        conn: &ConnectionHandle,
        command: &str,
    ) -> Result<LogStream, RemoteError> {
        debug!(connection = %conn.id, command, "opening streaming command");
        let mut child = Self::command_for(conn, command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(RemoteError::Spawn)?;

        let stdout = child.stdout.take().ok_or_else(|| {
            RemoteError::Spawn(std::io::Error::other("child stdout not captured"))
        })?;

        // The child rides along as the stream guard: dropping the stream
        // kills it, closing the remote channel.
        Ok(LogStream::with_guard(BufReader::new(stdout), child))
    }
}
