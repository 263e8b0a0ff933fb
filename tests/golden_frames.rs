//! Reference uplinks cross-checked against an independent AES/CMAC implementation

use lora_sx127x::lorawan::{
    calculate_mic, decode_uplink, encode_uplink, AesKey, DevAddr, Region, Session,
    FRAME_BUFFER_SIZE, HEADER_LEN, MAX_PAYLOAD_LEN, MIC_LEN,
};
use lora_sx127x::LoRaError;

const RFC_KEY_HEX: &str = "2b7e151628aed2a6abf7158809cf4f3c";

const AB_ZERO_KEYS_HEX: &str = "400100000000000001ded02e2348a1";
const EMPTY_ZERO_KEYS_HEX: &str = "40010000000000000151942ef9";
const HELLO_FCNT42_HEX: &str = "40da1b0126002a0001c25722e0f5c9b3efe2545c3f99f33ad5";
const HELLO_FPORT7_HEX: &str = "40da1b0126002a0007c25722e0f5c9b3efe2545c3f6c33e4ad";
const SEVEN_BYTES_FCNT7_HEX: &str = "40da1b012600070001947c7f68d858920531a8d0";
const FULL_FRAME_HEX: &str = "400403020100ffff0109b4ff4f103f02d02fa88d6bbc71d43c1828b66c31e4d265d7c913056a3a47ac23e13cede9544b40bb82e04af6295be7bec131202d00d1";
const FULL_FRAME_FPORT0_HEX: &str = "400403020100ffff0009b4ff4f103f02d02fa88d6bbc71d43c1828b66c31e4d265d7c913056a3a47ac23e13cede9544b40bb82e04af6295be7bec1316169b322";

fn zero_key_session() -> Session {
    Session::new(
        DevAddr::new([0, 0, 0, 1]),
        AesKey::new([0; 16]),
        AesKey::new([0; 16]),
        Region::Eu868,
    )
}

fn rfc_key_session() -> Session {
    let key = AesKey::from_hex(RFC_KEY_HEX).unwrap();
    let dev_addr = DevAddr::from_hex("26011BDA").unwrap();
    Session::with_region_code(dev_addr, key.clone(), key, "EU").unwrap()
}

fn split_key_session() -> Session {
    Session::new(
        DevAddr::new([1, 2, 3, 4]),
        AesKey::from_hex(RFC_KEY_HEX).unwrap(),
        AesKey::new([0; 16]),
        Region::Us915,
    )
}

#[test]
fn test_two_byte_payload_field_layout() {
    let frame = encode_uplink(&zero_key_session(), b"AB", 0).unwrap();
    assert_eq!(frame.len(), 15);

    assert_eq!(frame[0], 0x40, "MHDR");
    assert_eq!(&frame[1..5], &[0x01, 0x00, 0x00, 0x00], "DevAddr, reversed");
    assert_eq!(frame[5], 0x00, "FCtrl");
    assert_eq!(&frame[6..8], &[0x00, 0x00], "FCnt");
    assert_eq!(frame[8], 0x01, "FPort");
    assert_eq!(&frame[9..11], &[0xde, 0xd0], "FRMPayload");
    assert_eq!(&frame[11..], &[0x2e, 0x23, 0x48, 0xa1], "MIC");
    assert_eq!(hex::encode(&frame), AB_ZERO_KEYS_HEX);
}

#[test]
fn test_empty_payload() {
    let frame = encode_uplink(&zero_key_session(), b"", 0).unwrap();
    assert_eq!(frame.len(), HEADER_LEN + MIC_LEN);
    assert_eq!(hex::encode(&frame), EMPTY_ZERO_KEYS_HEX);
}

#[test]
fn test_hello_uplink() {
    let frame = encode_uplink(&rfc_key_session(), b"Hello, LoRa!", 42).unwrap();
    assert_eq!(hex::encode(&frame), HELLO_FCNT42_HEX);
}

#[test]
fn test_fport_changes_only_port_and_mic() {
    let session = rfc_key_session().with_fport(7);
    let frame = encode_uplink(&session, b"Hello, LoRa!", 42).unwrap();
    assert_eq!(hex::encode(&frame), HELLO_FPORT7_HEX);
    // Ciphertext is independent of FPort
    assert_eq!(HELLO_FCNT42_HEX[18..42], HELLO_FPORT7_HEX[18..42]);
}

#[test]
fn test_sixteen_byte_mic_input() {
    let frame = encode_uplink(&rfc_key_session(), b"1234567", 7).unwrap();
    assert_eq!(hex::encode(&frame), SEVEN_BYTES_FCNT7_HEX);
}

#[test]
fn test_full_frame_with_split_keys() {
    let payload: Vec<u8> = (0..MAX_PAYLOAD_LEN as u8).collect();
    let frame = encode_uplink(&split_key_session(), &payload, u16::MAX).unwrap();
    assert_eq!(frame.len(), FRAME_BUFFER_SIZE);
    assert_eq!(hex::encode(&frame), FULL_FRAME_HEX);
}

#[test]
fn test_fport_zero_still_uses_app_key() {
    let payload: Vec<u8> = (0..MAX_PAYLOAD_LEN as u8).collect();
    let session = split_key_session().with_fport(0);
    let frame = encode_uplink(&session, &payload, u16::MAX).unwrap();
    assert_eq!(hex::encode(&frame), FULL_FRAME_FPORT0_HEX);
}

#[test]
fn test_encoded_length_for_every_payload_size() {
    let session = rfc_key_session();
    for n in 0..=MAX_PAYLOAD_LEN {
        let frame = encode_uplink(&session, &vec![0xA5; n], 1).unwrap();
        assert_eq!(frame.len(), HEADER_LEN + n + MIC_LEN);
    }
    assert!(matches!(
        encode_uplink(&session, &[0; MAX_PAYLOAD_LEN + 1], 1),
        Err(LoRaError::PayloadTooLarge { .. })
    ));
}

#[test]
fn test_trailing_mic_matches_calculation() {
    let session = rfc_key_session();
    let frame = encode_uplink(&session, b"Hello, LoRa!", 42).unwrap();
    let body = &frame[..frame.len() - MIC_LEN];
    let mic = calculate_mic(body, session.nwk_skey(), session.dev_addr(), 42);
    assert_eq!(mic.as_bytes(), &frame[frame.len() - MIC_LEN..]);
}

#[test]
fn test_decode_golden_frames() {
    let session = rfc_key_session();

    let decoded = decode_uplink(&session, &hex::decode(HELLO_FCNT42_HEX).unwrap()).unwrap();
    assert_eq!(decoded.dev_addr, *session.dev_addr());
    assert_eq!(decoded.fctrl, 0);
    assert_eq!(decoded.fcnt, 42);
    assert_eq!(decoded.fport, Some(1));
    assert_eq!(decoded.payload.as_slice(), b"Hello, LoRa!");
    assert_eq!(decoded.mic.to_string(), "99f33ad5");

    let frame = hex::decode(FULL_FRAME_HEX).unwrap();
    let decoded = decode_uplink(&split_key_session(), &frame).unwrap();
    assert_eq!(decoded.fcnt, u16::MAX);
    let expected: Vec<u8> = (0..MAX_PAYLOAD_LEN as u8).collect();
    assert_eq!(decoded.payload.as_slice(), expected.as_slice());
}

#[test]
fn test_decode_empty_payload() {
    let decoded =
        decode_uplink(&zero_key_session(), &hex::decode(EMPTY_ZERO_KEYS_HEX).unwrap()).unwrap();
    assert_eq!(decoded.fport, Some(1));
    assert!(decoded.payload.is_empty());
}

#[test]
fn test_decode_rejects_malformed_input() {
    let session = rfc_key_session();
    let frame = hex::decode(HELLO_FCNT42_HEX).unwrap();

    assert!(matches!(
        decode_uplink(&session, &frame[..10]),
        Err(LoRaError::MalformedFrame(_))
    ));

    let mut confirmed = frame.clone();
    confirmed[0] = 0x80;
    assert!(matches!(
        decode_uplink(&session, &confirmed),
        Err(LoRaError::MalformedFrame(_))
    ));

    assert!(matches!(
        decode_uplink(&zero_key_session(), &frame),
        Err(LoRaError::MalformedFrame(_))
    ));

    let mut fopts_overrun = hex::decode(EMPTY_ZERO_KEYS_HEX).unwrap();
    fopts_overrun[5] = 0x0F;
    assert!(matches!(
        decode_uplink(&zero_key_session(), &fopts_overrun),
        Err(LoRaError::MalformedFrame(_))
    ));
}
