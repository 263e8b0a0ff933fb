//! # LoRaWAN Uplink Frame Codec
//!
//! Builds unconfirmed data-up PHYPayloads:
//!
//! ```text
//! | MHDR | DevAddr (LE) | FCtrl | FCnt (LE) | FPort | FRMPayload | MIC |
//! |  1   |      4       |   1   |     2     |   1   |   0..51    |  4  |
//! ```
//!
//! FRMPayload is encrypted with the AppSKey keystream and the MIC is computed with
//! the NwkSKey over everything before it, both under the same frame counter that
//! is written into FCnt.
//!
//! [`decode_uplink`] reverses the framing for a peer sharing the session. It
//! decrypts the payload but does not verify the MIC.

use crate::error::LoRaError;
use crate::lorawan::crypto::{calculate_mic, decrypt_payload, encrypt_payload, Mic, MIC_LEN};
use crate::lorawan::session::{DevAddr, Session};
use crate::util::buffer::{FrameBuffer, RxBuffer, FRAME_CAPACITY};
use crate::util::logging::log_frame_hex;
use log::debug;

/// MHDR of an unconfirmed data uplink (MType 010, LoRaWAN R1)
pub const MHDR_UNCONFIRMED_UP: u8 = 0x40;

/// FCtrl sent with every uplink: no ADR, no ACK, no FOpts
pub const FCTRL_UPLINK: u8 = 0x00;

/// Capacity of the transmit frame buffer
pub const FRAME_BUFFER_SIZE: usize = FRAME_CAPACITY;

/// MHDR + FHDR + FPort
pub const HEADER_LEN: usize = 9;

/// MHDR + FHDR (DevAddr, FCtrl, FCnt)
const FHDR_END: usize = 8;

/// Largest FRMPayload that fits the frame buffer
pub const MAX_PAYLOAD_LEN: usize = FRAME_BUFFER_SIZE - HEADER_LEN - MIC_LEN;

const FOPTS_LEN_MASK: u8 = 0x0F;

/// Encode and encrypt `payload` as an unconfirmed uplink using `fcnt`.
///
/// The session's frame counter is not touched; the caller advances it after a
/// successful send.
///
/// # Errors
/// [`LoRaError::PayloadTooLarge`] when the frame would exceed 64 bytes.
pub fn encode_uplink(
    session: &Session,
    payload: &[u8],
    fcnt: u16,
) -> Result<FrameBuffer, LoRaError> {
    let frame_len = HEADER_LEN + payload.len() + MIC_LEN;
    if frame_len > FRAME_BUFFER_SIZE {
        return Err(LoRaError::PayloadTooLarge {
            len: frame_len,
            max: FRAME_BUFFER_SIZE,
        });
    }

    let overflow = || LoRaError::PayloadTooLarge {
        len: frame_len,
        max: FRAME_BUFFER_SIZE,
    };

    let mut frame = FrameBuffer::new();
    frame.push(MHDR_UNCONFIRMED_UP).map_err(|_| overflow())?;
    frame
        .extend_from_slice(&session.dev_addr().wire_bytes())
        .map_err(|_| overflow())?;
    frame.push(FCTRL_UPLINK).map_err(|_| overflow())?;
    frame
        .extend_from_slice(&fcnt.to_le_bytes())
        .map_err(|_| overflow())?;
    frame.push(session.fport()).map_err(|_| overflow())?;
    frame.extend_from_slice(payload).map_err(|_| overflow())?;

    encrypt_payload(
        &mut frame.as_mut_slice()[HEADER_LEN..],
        session.dev_addr(),
        session.app_skey(),
        fcnt,
    );

    let mic = calculate_mic(frame.as_slice(), session.nwk_skey(), session.dev_addr(), fcnt);
    frame
        .extend_from_slice(mic.as_bytes())
        .map_err(|_| overflow())?;

    debug!(
        "Encoded uplink: DevAddr={} FCnt={} FPort={} payload={} bytes MIC={}",
        session.dev_addr(),
        fcnt,
        session.fport(),
        payload.len(),
        mic
    );
    log_frame_hex("PHYPayload", frame.as_slice());

    Ok(frame)
}

/// A decoded uplink
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub dev_addr: DevAddr,
    pub fctrl: u8,
    pub fcnt: u16,
    /// Absent when the frame carries no FRMPayload
    pub fport: Option<u8>,
    /// Decrypted FRMPayload
    pub payload: RxBuffer,
    /// MIC as received, not verified
    pub mic: Mic,
}

/// Parse and decrypt an unconfirmed uplink produced under `session`.
pub fn decode_uplink(session: &Session, phy: &[u8]) -> Result<DecodedFrame, LoRaError> {
    if phy.len() < FHDR_END + MIC_LEN {
        return Err(LoRaError::MalformedFrame(format!(
            "frame too short: {} bytes",
            phy.len()
        )));
    }

    if phy[0] != MHDR_UNCONFIRMED_UP {
        return Err(LoRaError::MalformedFrame(format!(
            "unsupported MHDR 0x{:02X}",
            phy[0]
        )));
    }

    let dev_addr = DevAddr::from_wire_bytes([phy[1], phy[2], phy[3], phy[4]]);
    if &dev_addr != session.dev_addr() {
        return Err(LoRaError::MalformedFrame(format!(
            "DevAddr {dev_addr} does not match session {}",
            session.dev_addr()
        )));
    }

    let fctrl = phy[5];
    let fcnt = u16::from_le_bytes([phy[6], phy[7]]);
    let mic_start = phy.len() - MIC_LEN;
    let fopts_end = FHDR_END + (fctrl & FOPTS_LEN_MASK) as usize;

    if fopts_end > mic_start {
        return Err(LoRaError::MalformedFrame(format!(
            "FOpts length {} overruns frame",
            fctrl & FOPTS_LEN_MASK
        )));
    }

    let mut mic = [0u8; MIC_LEN];
    mic.copy_from_slice(&phy[mic_start..]);

    let (fport, payload) = if fopts_end == mic_start {
        (None, RxBuffer::new())
    } else {
        let body = &phy[fopts_end + 1..mic_start];
        let mut payload = RxBuffer::from_slice(body).map_err(|_| {
            LoRaError::MalformedFrame(format!("FRMPayload of {} bytes", body.len()))
        })?;
        decrypt_payload(payload.as_mut_slice(), &dev_addr, session.app_skey(), fcnt);
        (Some(phy[fopts_end]), payload)
    };

    debug!(
        "Decoded uplink: DevAddr={} FCnt={} FPort={:?} payload={} bytes",
        dev_addr,
        fcnt,
        fport,
        payload.len()
    );

    Ok(DecodedFrame {
        dev_addr,
        fctrl,
        fcnt,
        fport,
        payload,
        mic: Mic(mic),
    })
}
