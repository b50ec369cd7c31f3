//! Remote command execution for tailscope
//!
//! This crate defines the boundary to the remote command channel: one-shot
//! execution with captured output, and line-oriented streaming with a
//! closeable handle. The default adapter spawns the command locally or over
//! ssh.

mod directory;
mod executor;
mod process;

pub use directory::{ConnectionDirectory, ConnectionHandle, StaticDirectory};
pub use executor::{ExecOutput, LogStream, RemoteError, RemoteExecutor};
pub use process::ProcessExecutor;
