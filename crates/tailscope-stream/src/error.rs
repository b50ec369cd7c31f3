use thiserror::Error;

use tailscope_remote::RemoteError;

/// Errors surfaced by the streaming core.
#[derive(Debug, Error)]
pub enum StreamError {
    /// No connection resolvable for the session; nothing was started
    #[error("no connection available for session {0}")]
    ConnectionUnavailable(String),

    /// The remote channel failed
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A one-shot remote command exited non-zero
    #[error("remote command exited with status {status}: {stderr}")]
    RemoteCommand { status: i32, stderr: String },

    /// The requested level token did not compile into a filter
    #[error("invalid level filter: {0}")]
    Filter(#[from] regex::Error),
}
