//! Property-based tests for the relay wire codec.

use loopguard_protocol::prelude::*;
use proptest::prelude::*;

fn any_reading() -> impl Strategy<Value = f32> {
    any::<u32>().prop_map(f32::from_bits)
}

fn any_observation() -> impl Strategy<Value = Observation> {
    (
        any::<u64>(),
        any::<u64>(),
        prop::array::uniform4(any_reading()),
    )
        .prop_map(|(sequence, timestamp_us, readings)| {
            Observation::new(sequence, timestamp_us, readings)
        })
}

proptest! {
    #[test]
    fn prop_observation_roundtrip(observation in any_observation()) {
        let frame = encode_observation(&observation);
        let decoded = decode_observation(&frame).expect("decode should succeed");
        prop_assert!(decoded.bitwise_eq(&observation));
    }

    #[test]
    fn prop_observation_reencode_is_identity(bytes in prop::array::uniform32(any::<u8>())) {
        let decoded = decode_observation(&bytes).expect("decode should succeed");
        prop_assert_eq!(encode_observation(&decoded), bytes);
    }

    #[test]
    fn prop_header_roundtrip(size in 0u64..=MAX_CONTROL_LAW_SIZE as u64) {
        let header = ControlLawHeader::new(size);
        let decoded = decode_header(&encode_header(&header)).expect("decode should succeed");
        prop_assert_eq!(decoded, header);
    }

    #[test]
    fn prop_body_roundtrip(bytes in prop::collection::vec(any::<u8>(), 0..=MAX_CONTROL_LAW_SIZE)) {
        let body = ControlLawBody::from_slice(&bytes).expect("body within ceiling");
        let decoded = decode_body(body.as_bytes(), bytes.len() as u64).expect("decode should succeed");
        prop_assert_eq!(decoded.as_bytes(), bytes.as_slice());
    }

    #[test]
    fn prop_body_rejects_declared_size_over_ceiling(
        declared in (MAX_CONTROL_LAW_SIZE as u64 + 1)..=u64::MAX,
        bytes in prop::collection::vec(any::<u8>(), 0..2048),
    ) {
        let result = decode_body(&bytes, declared);
        let is_too_large = matches!(result, Err(ProtocolError::BodyTooLarge { .. }));
        prop_assert!(is_too_large);
    }

    #[test]
    fn prop_body_rejects_length_mismatch(
        declared in 0usize..=MAX_CONTROL_LAW_SIZE,
        actual in 0usize..=MAX_CONTROL_LAW_SIZE,
    ) {
        prop_assume!(declared != actual);
        let bytes = vec![0u8; actual];
        let result = decode_body(&bytes, declared as u64);
        let is_mismatch = matches!(result, Err(ProtocolError::BodyLengthMismatch { .. }));
        prop_assert!(is_mismatch);
    }

    #[test]
    fn prop_fixed_decoders_reject_wrong_lengths(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        prop_assert_eq!(decode_observation(&bytes).is_ok(), bytes.len() == OBSERVATION_SIZE);
        prop_assert_eq!(decode_header(&bytes).is_ok(), bytes.len() == CONTROL_LAW_HEADER_SIZE);
    }

    #[test]
    fn prop_header_and_body_frame_is_contiguous(
        bytes in prop::collection::vec(any::<u8>(), 0..=MAX_CONTROL_LAW_SIZE),
    ) {
        let body = ControlLawBody::from_slice(&bytes).expect("body within ceiling");
        let header = ControlLawHeader::for_body(&body);
        let mut buffer = [0u8; BUFFER_CAPACITY];

        let written = encode_header_and_body(&header, &body, &mut buffer).expect("encode should succeed");

        prop_assert_eq!(written, CONTROL_LAW_HEADER_SIZE + bytes.len());
        let (head, tail) = buffer.split_at(CONTROL_LAW_HEADER_SIZE);
        prop_assert_eq!(decode_header(head).expect("header decodes"), header);
        prop_assert_eq!(&tail[..bytes.len()], bytes.as_slice());
    }
}
