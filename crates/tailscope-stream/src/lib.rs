//! Streaming core for tailscope
//!
//! This crate owns the live-tail state machine: per-session read loops with
//! bounded batching, the process-wide session registry, and the one-shot
//! history path.

mod command;
mod error;
mod history;
mod registry;
mod session;
mod sink;
#[cfg(test)]
mod testutil;

pub use command::{history_command, tail_command};
pub use error::StreamError;
pub use history::HistoryFetcher;
pub use registry::StreamRegistry;
pub use session::{
    BatchPolicy, DEFAULT_TAIL_BACKLOG, SessionState, StreamContext, StreamSession,
};
pub use sink::{EventSink, PublishSink, Publisher, stream_topic};

// Re-export types used in our public API
pub use tailscope_types::{HistoryResult, LogBatch, StreamEvent};
