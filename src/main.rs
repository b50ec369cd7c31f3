use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tailscope_remote::{
    ConnectionDirectory, ConnectionHandle, ProcessExecutor, RemoteExecutor, StaticDirectory,
};
use tailscope_stream::{
    BatchPolicy, EventSink, HistoryFetcher, PublishSink, StreamContext, StreamRegistry,
};

use crate::config::Config;
use crate::publish::StdoutPublisher;

mod config;
mod publish;

/// Tailscope - live tailing of remote container logs
#[derive(Parser, Debug)]
#[command(name = "tailscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (defaults to ./tailscope.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reach the container engine over ssh instead of locally
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Tail a container's logs until interrupted
    Tail {
        /// Target container
        target: String,

        /// Session identifier (registry key and topic suffix)
        #[arg(long, default_value = "local")]
        session_id: String,

        /// Replay buffer capacity in lines
        #[arg(long, default_value_t = 1000)]
        max_lines: usize,
    },
    /// Fetch a bounded backlog of historical logs
    History {
        /// Target container
        target: String,

        /// Number of lines to fetch
        #[arg(long, default_value_t = 100)]
        lines: usize,

        /// Level token to filter by ("all" for everything)
        #[arg(long)]
        level: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let conn = match &args.host {
        Some(host) => ConnectionHandle::ssh(host.clone()),
        None => ConnectionHandle::local(),
    };
    let executor: Arc<dyn RemoteExecutor> = Arc::new(ProcessExecutor::new());

    match args.command {
        CliCommand::Tail {
            target,
            session_id,
            max_lines,
        } => {
            let directory: Arc<dyn ConnectionDirectory> = Arc::new(StaticDirectory::new(conn));
            let sink: Arc<dyn EventSink> = Arc::new(PublishSink::new(StdoutPublisher::new()));
            let registry = StreamRegistry::with_context(StreamContext {
                executor,
                directory,
                sink,
                policy: BatchPolicy {
                    max_lines: config.batch_max_lines,
                    max_delay: Duration::from_millis(config.batch_max_delay_ms),
                },
                backlog: config.tail_backlog,
            });

            registry.start_log_stream(&session_id, &target, max_lines);

            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for ctrl-c")?;
            let forced = registry
                .shutdown(Duration::from_millis(config.shutdown_grace_ms))
                .await;
            if forced > 0 {
                eprintln!("{forced} streaming task(s) did not stop within the grace period");
            }
        }

        CliCommand::History {
            target,
            lines,
            level,
        } => {
            let fetcher = HistoryFetcher::new(executor, conn);
            let history = fetcher
                .get_history_logs(&target, lines, level.as_deref())
                .await
                .context("history fetch failed")?;
            for line in &history.lines {
                println!("{line}");
            }
            eprintln!("{} line(s) from {}", history.total_lines, history.target);
        }
    }

    Ok(())
}
