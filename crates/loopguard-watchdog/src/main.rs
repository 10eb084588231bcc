//! loopguard-watchdog - deadline-enforcing control-loop relay
//!
//! Connects to a sensor rig, accepts one controller client, and relays
//! observations and control laws between them until the first failure.
//! Always exits with status 1: a session only ends by failing safe.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use loopguard_watchdog::{establish, LogReporter, WatchdogConfig, DEFAULT_CYCLE_DEADLINE_MS};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "loopguard-watchdog")]
#[command(about = "Relay a closed control loop between a sensor rig and a controller, failing safe on any deadline miss")]
#[command(version)]
struct Cli {
    /// Sensor rig host name or address
    sensor_host: String,

    /// Sensor rig TCP port
    sensor_port: u16,

    /// Port to accept the controller client on
    listen_port: u16,

    /// Upper bound on one relay cycle, in milliseconds
    #[arg(long, default_value_t = DEFAULT_CYCLE_DEADLINE_MS)]
    deadline_ms: u64,

    /// Address to accept the controller client on
    #[arg(long, default_value = "0.0.0.0")]
    listen_address: String,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> loopguard_watchdog::WatchdogResult<WatchdogConfig> {
        WatchdogConfig::builder()
            .sensor_host(&self.sensor_host)
            .sensor_port(self.sensor_port)
            .listen_address(&self.listen_address)
            .listen_port(self.listen_port)
            .cycle_deadline_ms(self.deadline_ms)
            .build()
    }
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("loopguard_watchdog={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            if let Err(io) = err.print() {
                eprintln!("failed to print usage: {io}");
            }
            return code;
        }
    };

    init_logging(cli.verbose);

    let config = match cli.config() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid arguments");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async {
        let session = match establish(&config, Arc::new(LogReporter)).await {
            Ok(session) => session,
            Err(err) => {
                error!(error = %err, "startup failed");
                return ExitCode::FAILURE;
            }
        };

        let report = session.run().await;
        info!(
            cause = %report.cause,
            final_stage = %report.final_stage,
            cycles_completed = report.cycles_completed(),
            bytes_to_client = report.stats.bytes_to_client,
            bytes_to_sensor = report.stats.bytes_to_sensor,
            "watchdog stopped"
        );
        ExitCode::FAILURE
    })
}
