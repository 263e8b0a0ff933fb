//! # LoRaWAN Uplink Layer
//!
//! ABP session context, regional channel plans, the AES-128 core with the payload
//! cipher and MIC built on it, and the unconfirmed-uplink frame codec.
//!
//! Only what a class A end device needs to emit data frames is implemented: no
//! join procedure, MAC commands or downlink MIC verification.

pub mod aes;
pub mod crypto;
pub mod frame;
pub mod region;
pub mod session;

pub use crypto::{calculate_mic, decrypt_payload, encrypt_payload, generate_subkeys, Mic, MIC_LEN};
pub use frame::{
    decode_uplink, encode_uplink, DecodedFrame, FRAME_BUFFER_SIZE, HEADER_LEN, MAX_PAYLOAD_LEN,
    MHDR_UNCONFIRMED_UP,
};
pub use region::{Channel, Region, CHANNELS_PER_REGION};
pub use session::{AesKey, DevAddr, Session, DEFAULT_FPORT};
