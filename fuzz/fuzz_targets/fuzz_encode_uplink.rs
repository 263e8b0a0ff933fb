#![no_main]

use libfuzzer_sys::fuzz_target;
use lora_sx127x::lorawan::{decode_uplink, encode_uplink, AesKey, DevAddr, Region, Session};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let fcnt = u16::from_le_bytes([data[0], data[1]]);
    let fport = data[2];
    let payload = &data[3..];

    let session = Session::new(
        DevAddr::new([0x01, 0x02, 0x03, 0x04]),
        AesKey::new([0x33; 16]),
        AesKey::new([0x44; 16]),
        Region::Us915,
    )
    .with_fport(fport);

    if let Ok(frame) = encode_uplink(&session, payload, fcnt) {
        let decoded = decode_uplink(&session, &frame).expect("encoded frame must decode");
        assert_eq!(decoded.fcnt, fcnt);
        assert_eq!(decoded.payload.as_slice(), payload);
    }
});
