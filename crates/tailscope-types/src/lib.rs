//! Shared types for tailscope
//!
//! This crate contains the data structures exchanged between the streaming
//! core and its transport adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A group of log lines emitted together by a live stream session.
///
/// Batches are transient: produced, published, and dropped. Lines keep their
/// raw form, including any leading timestamp the remote engine prepended.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogBatch {
    /// Session the batch belongs to (also the publish-topic suffix)
    pub session_id: String,

    /// Target container the lines came from
    pub target: String,

    /// Lines in the exact order received from the remote channel
    pub lines: Vec<String>,

    /// Replay-buffer occupancy at the time of emission
    pub total_lines: usize,

    /// Emission timestamp
    pub timestamp: DateTime<Utc>,

    /// True for live-tail batches, false for history results
    pub is_real_time: bool,

    /// True for the last batch of a terminated stream
    pub is_final: bool,
}

/// Result of a one-shot history fetch, independent of any live session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryResult {
    /// Target container the lines came from
    pub target: String,

    /// Lines in log order, already level-filtered
    pub lines: Vec<String>,

    /// Number of lines after filtering
    pub total_lines: usize,

    /// Fetch timestamp
    pub timestamp: DateTime<Utc>,

    /// Always false; present so subscribers can treat both payloads uniformly
    pub is_real_time: bool,
}

/// Typed event emitted by a stream session.
///
/// Transport adapters subscribe to these instead of being called back
/// directly, keeping the core independent of the delivery mechanism.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A batch of log lines
    Batch(LogBatch),

    /// The stream failed while running
    Error { message: String },

    /// The remote side closed the stream (EOF)
    Closed,
}
