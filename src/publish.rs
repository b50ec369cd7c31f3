use std::io::Write;

use tailscope_stream::Publisher;

/// Publisher that writes each event to stdout, one line per payload,
/// prefixed with its topic. Stands in for the real messaging transport.
#[derive(Default)]
pub struct StdoutPublisher;

impl StdoutPublisher {
    pub fn new() -> Self {
        Self
    }
}

impl Publisher for StdoutPublisher {
    fn publish(&self, topic: &str, payload: Vec<u8>) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{topic}\t{}", String::from_utf8_lossy(&payload));
    }
}
