//! loopguard-sensor-sim - simulated sensor rig
//!
//! Listens for the watchdog, then serves observations assembled from
//! simulated GPS and camera peripherals, waiting for each control law before
//! the next observation.

#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use loopguard_peers::{SensorConfig, SensorSimulator};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "loopguard-sensor-sim")]
#[command(about = "Simulated sensor rig speaking the loopguard relay protocol")]
#[command(version)]
struct Cli {
    /// Port to accept the watchdog on
    listen_port: u16,

    /// Address to accept the watchdog on
    #[arg(long, default_value = "0.0.0.0")]
    listen_address: IpAddr,

    /// Pause between cycles, in milliseconds
    #[arg(long)]
    period_ms: Option<u64>,

    /// Stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,

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

    let addr = SocketAddr::new(cli.listen_address, cli.listen_port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "waiting for watchdog");

    let (mut stream, peer) = listener
        .accept()
        .await
        .context("failed to accept watchdog")?;
    stream.set_nodelay(true).context("failed to set TCP_NODELAY")?;
    info!(%peer, "watchdog connected");

    let mut sensor = SensorSimulator::start(SensorConfig {
        period: cli.period_ms.map(Duration::from_millis),
        max_cycles: cli.cycles,
        ..SensorConfig::default()
    });
    let stats = sensor.serve(&mut stream).await?;
    sensor.stop();

    info!(
        cycles = stats.cycles,
        bytes_sent = stats.bytes_sent,
        bytes_received = stats.bytes_received,
        "sensor simulator stopped"
    );
    if stats.closed_by_remote {
        anyhow::bail!("watchdog stopped the connection after {} cycles", stats.cycles);
    }
    Ok(())
}
