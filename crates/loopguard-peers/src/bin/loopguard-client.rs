//! loopguard-client - reference controller client
//!
//! Connects to the watchdog, reads each observation, and answers with a
//! proportional control law of four `f32` actuation commands.

#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use loopguard_peers::{ClientConfig, ReferenceClient};
use tokio::net::TcpStream;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "loopguard-client")]
#[command(about = "Reference controller client for the loopguard watchdog")]
#[command(version)]
struct Cli {
    /// Watchdog host name or address
    watchdog_host: String,

    /// Watchdog client port
    watchdog_port: u16,

    /// Simulated computation time per cycle, in milliseconds
    #[arg(long)]
    compute_ms: Option<u64>,

    /// Proportional gain
    #[arg(long, default_value_t = 0.5)]
    gain: f32,

    /// Stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Stop answering after this many cycles and wait for the watchdog to close
    #[arg(long)]
    stall_after: Option<u64>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("loopguard_peers={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let endpoint = format!("{}:{}", cli.watchdog_host, cli.watchdog_port);
    let mut stream = TcpStream::connect((cli.watchdog_host.as_str(), cli.watchdog_port))
        .await
        .with_context(|| format!("failed to connect to watchdog at {endpoint}"))?;
    stream.set_nodelay(true).context("failed to set TCP_NODELAY")?;
    info!(%endpoint, "connected to watchdog");

    let mut client = ReferenceClient::new(ClientConfig {
        gain: cli.gain,
        compute_delay: cli.compute_ms.map(Duration::from_millis),
        stall_after: cli.stall_after,
        max_cycles: cli.cycles,
    });
    let stats = client.serve(&mut stream).await?;

    info!(
        cycles = stats.cycles,
        bytes_sent = stats.bytes_sent,
        bytes_received = stats.bytes_received,
        "client stopped"
    );
    if stats.closed_by_remote {
        anyhow::bail!("watchdog stopped the connection after {} cycles", stats.cycles);
    }
    Ok(())
}
