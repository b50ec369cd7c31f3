/// An established, authenticated connection to a container host.
///
/// `host = None` addresses the local engine; `Some(host)` goes through ssh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionHandle {
    /// Stable identifier for logging
    pub id: String,

    /// Remote host to reach via ssh, or `None` for the local engine
    pub host: Option<String>,
}

impl ConnectionHandle {
    /// Handle for the local container engine
    pub fn local() -> Self {
        Self {
            id: "local".to_string(),
            host: None,
        }
    }

    /// Handle for an ssh-reachable host
    pub fn ssh(host: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            id: host.clone(),
            host: Some(host),
        }
    }
}

/// Resolves a session identifier to the connection its logs are read over.
pub trait ConnectionDirectory: Send + Sync + 'static {
    /// Look up the connection for a session; `None` if unresolvable
    fn lookup(&self, session_id: &str) -> Option<ConnectionHandle>;
}

/// Directory serving one fixed connection for every session.
pub struct StaticDirectory {
    handle: ConnectionHandle,
}

impl StaticDirectory {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self { handle }
    }
}

impl ConnectionDirectory for StaticDirectory {
    fn lookup(&self, _session_id: &str) -> Option<ConnectionHandle> {
        Some(self.handle.clone())
    }
}
