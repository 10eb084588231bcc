//! Integration-level unit tests for the watchdog.

use std::io;
use std::time::Duration;

use loopguard_protocol::{decode_header, decode_observation, encode_observation};
use loopguard_test_helpers::prelude::*;
use loopguard_watchdog::prelude::*;
use tokio::io::AsyncReadExt;

type TestResult = Result<(), Box<dyn std::error::Error>>;

mod concrete_scenario {
    use super::*;

    /// One cycle: a 32-byte observation, an 8-byte header declaring 16, and
    /// a 16-byte body.
    #[tokio::test(start_paused = true)]
    async fn one_cycle_moves_32_then_24_bytes() -> TestResult {
        let SessionRig {
            session,
            mut sensor,
            mut client,
            reporter,
        } = SessionRig::new(Duration::from_millis(5));
        let observation = concrete_observation();
        let control_law = concrete_control_law();

        let peers = async move {
            send_observation(&mut sensor, &observation).await?;

            let mut to_client = [0u8; 32];
            client.read_exact(&mut to_client).await?;
            answer_control_law(&mut client, &control_law).await?;

            let to_sensor = read_control_law(&mut sensor).await?;
            drop(sensor);
            Ok::<_, io::Error>((to_client, to_sensor, client))
        };

        let (report, peers) = tokio::join!(session.run(), peers);
        let (to_client, to_sensor, _client) = peers?;

        assert_eq!(to_client, encode_observation(&observation));
        assert_eq!(decode_observation(&to_client)?, observation);

        assert_eq!(to_sensor.len(), 24);
        let (header, body) = to_sensor.split_at(8);
        assert_eq!(header, &16u64.to_le_bytes());
        assert_eq!(decode_header(header)?.size_of_control_law, 16);
        assert_eq!(body, &control_law);

        assert_eq!(report.cycles_completed(), 1);
        assert_eq!(report.stats.bytes_from_sensor, 32);
        assert_eq!(report.stats.bytes_to_client, 32);
        assert_eq!(report.stats.bytes_from_client, 24);
        assert_eq!(report.stats.bytes_to_sensor, 24);
        assert_eq!(report.final_stage, RelayStage::ReadSensor);
        assert_eq!(reporter.count(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn empty_control_law_forwards_header_only() -> TestResult {
        let SessionRig {
            session,
            mut sensor,
            mut client,
            ..
        } = SessionRig::new(Duration::from_millis(5));

        let peers = async move {
            send_observation(&mut sensor, &concrete_observation()).await?;
            read_observation(&mut client).await?;
            answer_control_law(&mut client, &[]).await?;
            let to_sensor = read_control_law(&mut sensor).await?;
            Ok::<_, io::Error>(to_sensor)
        };

        let (report, to_sensor) = tokio::join!(session.run(), peers);
        assert_eq!(to_sensor?, vec![0u8; 8]);
        assert_eq!(report.cycles_completed(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn maximum_control_law_fills_the_buffer() -> TestResult {
        let SessionRig {
            session,
            mut sensor,
            mut client,
            ..
        } = SessionRig::new(Duration::from_millis(5));
        let body = vec![0x5Au8; loopguard_protocol::MAX_CONTROL_LAW_SIZE];
        let expected = body.clone();

        let peers = async move {
            send_observation(&mut sensor, &concrete_observation()).await?;
            read_observation(&mut client).await?;
            answer_control_law(&mut client, &body).await?;
            let to_sensor = read_control_law(&mut sensor).await?;
            Ok::<_, io::Error>(to_sensor)
        };

        let (report, to_sensor) = tokio::join!(session.run(), peers);
        let to_sensor = to_sensor?;
        assert_eq!(to_sensor.len(), loopguard_protocol::BUFFER_CAPACITY);
        assert_eq!(to_sensor.get(8..), Some(expected.as_slice()));
        assert_eq!(report.stats.bytes_to_sensor, 1024);
        Ok(())
    }
}

mod reporting {
    use super::*;

    #[tokio::test]
    async fn stop_event_carries_final_stats() {
        let rig = SessionRig::new(Duration::from_millis(5));
        let reporter = rig.reporter.clone();
        drop(rig);

        let event = must_some(reporter.last(), "drop should report");
        assert_eq!(event.cause, StopCause::Dropped);
        assert_eq!(event.stats, RelayStats::default());
        assert!(!event.cause.is_fault());
    }

    #[test]
    fn stop_causes_map_from_errors() {
        let err = WatchdogError::transport(
            RelayStage::ReadHeader,
            io::Error::new(io::ErrorKind::UnexpectedEof, "eof"),
        );
        assert_eq!(err.stop_cause(), StopCause::Transport(RelayStage::ReadHeader));
        assert!(err.is_session_failure());
    }
}
