use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

/// Hard ceiling on replay-buffer capacity. History fetches are clamped to
/// the same limit.
pub const MAX_BUFFER_LINES: usize = 5000;

/// Thread-safe ring buffer holding the most recent log lines of a session.
///
/// One lock guards every operation: the read loop is the only writer,
/// diagnostic callers may read concurrently. Eviction is strictly FIFO.
#[derive(Clone)]
pub struct RingBuffer {
    /// Internal storage
    lines: Arc<RwLock<VecDeque<String>>>,

    /// Maximum capacity
    capacity: usize,
}

impl RingBuffer {
    /// Create a new ring buffer, clamping capacity to `1..=MAX_BUFFER_LINES`
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_BUFFER_LINES);
        Self {
            lines: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Push a new line, evicting the oldest if at capacity
    pub fn push(&self, line: String) {
        let mut lines = self.lines.write();
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Snapshot of all buffered lines in insertion order
    pub fn all(&self) -> Vec<String> {
        self.lines.read().iter().cloned().collect()
    }

    /// Current line count
    pub fn len(&self) -> usize {
        self.lines.read().len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.lines.read().is_empty()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
