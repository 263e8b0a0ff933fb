#![no_main]

use libfuzzer_sys::fuzz_target;
use lora_sx127x::lorawan::{decode_uplink, AesKey, DevAddr, Region, Session};

fuzz_target!(|data: &[u8]| {
    let session = Session::new(
        DevAddr::new([0x26, 0x01, 0x1B, 0xDA]),
        AesKey::new([0x11; 16]),
        AesKey::new([0x22; 16]),
        Region::Eu868,
    );

    // Arbitrary input must never panic
    let _ = decode_uplink(&session, data);

    // Force the header to match so the FOpts and payload paths are reached
    if data.len() >= 8 {
        let mut frame = data.to_vec();
        frame[0] = 0x40;
        frame[1..5].copy_from_slice(&[0xDA, 0x1B, 0x01, 0x26]);
        let _ = decode_uplink(&session, &frame);
    }
});
