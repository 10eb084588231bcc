//! End-to-end runs over TCP loopback with the reference peers.

use std::sync::Arc;
use std::time::Duration;

use loopguard_peers::prelude::*;
use loopguard_watchdog::prelude::*;
use tokio::net::{TcpListener, TcpStream};

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// A session connected to a sensor listener and a client socket, plus the
/// peer ends of both connections.
struct Loopback {
    session: Session<TcpStream>,
    sensor: TcpStream,
    client: TcpStream,
    reporter: RecordingReporter,
}

async fn loopback(deadline: Duration) -> Result<Loopback, Box<dyn std::error::Error>> {
    let sensor_listener = TcpListener::bind("127.0.0.1:0").await?;
    let sensor_port = sensor_listener.local_addr()?.port();

    let config = WatchdogConfig::builder()
        .sensor_host("127.0.0.1")
        .sensor_port(sensor_port)
        .listen_address("127.0.0.1")
        .listen_port(0)
        .cycle_deadline(deadline)
        .build()?;

    let (to_sensor, accepted) = tokio::join!(connect_sensor(&config), sensor_listener.accept());
    let to_sensor = to_sensor?;
    let (sensor, _) = accepted?;

    let client_listener = bind_client_listener(&config).await?;
    let client_addr = client_listener.local_addr()?;
    let (client, to_client) = tokio::join!(
        TcpStream::connect(client_addr),
        accept_client(&client_listener, &config)
    );
    let client = client?;
    let to_client = to_client?;

    let reporter = RecordingReporter::new();
    let session = Session::from_config(to_sensor, to_client, &config, Arc::new(reporter.clone()));
    Ok(Loopback {
        session,
        sensor,
        client,
        reporter,
    })
}

#[tokio::test]
async fn fifty_cycles_then_sensor_hangs_up() -> TestResult {
    let Loopback {
        session,
        mut sensor,
        mut client,
        reporter,
    } = loopback(Duration::from_millis(500)).await?;

    let mut simulator = SensorSimulator::start(SensorConfig {
        max_cycles: Some(50),
        ..SensorConfig::default()
    });
    let mut controller = ReferenceClient::new(ClientConfig::default());

    let sensor_side = async move {
        let stats = simulator.serve(&mut sensor).await;
        drop(sensor);
        stats
    };

    let (report, sensor_stats, client_stats) = tokio::join!(
        session.run(),
        sensor_side,
        controller.serve(&mut client)
    );
    let sensor_stats = sensor_stats?;
    let client_stats = client_stats?;

    assert_eq!(sensor_stats.cycles, 50);
    assert_eq!(client_stats.cycles, 50);
    assert!(client_stats.closed_by_remote);
    assert_eq!(report.cycles_completed(), 50);
    assert_eq!(report.stats.bytes_to_client, 50 * 32);
    assert_eq!(
        report.stats.bytes_to_sensor,
        50 * (8 + CONTROL_LAW_BYTES as u64)
    );
    assert!(
        matches!(
            report.cause,
            WatchdogError::Transport {
                stage: RelayStage::ReadSensor,
                ..
            }
        ),
        "unexpected cause: {}",
        report.cause
    );
    assert_eq!(reporter.count(), 1);
    Ok(())
}

#[tokio::test]
async fn stalled_client_is_cut_off_by_the_deadline() -> TestResult {
    let Loopback {
        session,
        mut sensor,
        mut client,
        reporter,
    } = loopback(Duration::from_millis(50)).await?;

    let mut simulator = SensorSimulator::start(SensorConfig::default());
    let mut controller = ReferenceClient::new(ClientConfig {
        stall_after: Some(5),
        ..ClientConfig::default()
    });

    let (report, sensor_stats, client_stats) = tokio::join!(
        session.run(),
        simulator.serve(&mut sensor),
        controller.serve(&mut client)
    );
    let sensor_stats = sensor_stats?;
    let client_stats = client_stats?;

    assert!(
        matches!(
            report.cause,
            WatchdogError::DeadlineMiss {
                cycles_completed: 5,
                ..
            }
        ),
        "unexpected cause: {}",
        report.cause
    );
    assert_eq!(client_stats.cycles, 5);
    assert!(client_stats.closed_by_remote);
    assert!(sensor_stats.closed_by_remote);
    assert_eq!(reporter.count(), 1);
    assert_eq!(
        reporter.last().map(|event| event.cause),
        Some(StopCause::DeadlineMiss)
    );
    Ok(())
}

#[tokio::test]
async fn establish_without_sensor_is_a_connect_failure() -> TestResult {
    let probe = TcpListener::bind("127.0.0.1:0").await?;
    let port = probe.local_addr()?.port();
    drop(probe);

    let config = WatchdogConfig::builder()
        .sensor_host("127.0.0.1")
        .sensor_port(port)
        .listen_address("127.0.0.1")
        .listen_port(0)
        .build()?;
    let reporter = RecordingReporter::new();

    let result = establish(&config, Arc::new(reporter.clone())).await;

    let err = result.err();
    assert!(
        matches!(err, Some(ref e) if e.is_startup_failure()),
        "expected startup failure, got {err:?}"
    );
    assert_eq!(reporter.count(), 0, "no session, no safety stop");
    Ok(())
}
