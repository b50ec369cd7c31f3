//! Replay buffering and level filtering for tailscope
//!
//! This crate provides the fixed-capacity replay cache each stream session
//! owns, and the stateless level predicate shared by the history path.

mod buffer;
mod filter;

pub use buffer::{MAX_BUFFER_LINES, RingBuffer};
pub use filter::LevelFilter;
