//! Command shapes sent to the remote executor.

/// Container engine binary invoked on the remote side
const ENGINE: &str = "docker";

/// Command for a continuous tail: bounded initial backlog, timestamps on
pub fn tail_command(target: &str, backlog: u32) -> String {
    format!("{ENGINE} logs --follow --tail {backlog} --timestamps {target}")
}

/// Command for a one-shot bounded backlog fetch
pub fn history_command(target: &str, lines: usize) -> String {
    format!("{ENGINE} logs --tail {lines} --timestamps {target}")
}
