//! # lora-sx127x - A Rust Crate for SX127x LoRa Radios and LoRaWAN Uplinks
//!
//! The lora-sx127x crate drives a Semtech SX1276/77/78/79 transceiver over SPI and
//! builds encrypted, authenticated LoRaWAN 1.0 unconfirmed data uplinks for
//! activation-by-personalisation (ABP) devices.
//!
//! ## Features
//!
//! - Radio bring-up: reset, version probe, modem configuration, mode control
//! - Transmit with a bus lock and TX_DONE timeout; polling and DIO0 interrupt receive
//! - LoRaWAN frame encoding and decoding with payload encryption and AES-CMAC MIC
//! - Regional channel plans (EU868, US915, AU915, AS923) with precomputed FRF values
//! - A hardware abstraction trait with a Raspberry Pi implementation (`raspberry-pi` feature)
//! - JSON configuration, jittered send scheduling, logging and error handling
//!
//! ## Usage
//!
//! ```rust
//! use lora_sx127x::lorawan::{encode_uplink, AesKey, DevAddr, Region, Session};
//!
//! let session = Session::new(
//!     DevAddr::new([0x26, 0x01, 0x1B, 0xDA]),
//!     AesKey::new([0; 16]),
//!     AesKey::new([0; 16]),
//!     Region::Eu868,
//! );
//! let frame = encode_uplink(&session, b"21.5C", 0).unwrap();
//! assert_eq!(frame.len(), 9 + 5 + 4);
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod lorawan;
pub mod radio;
pub mod schedule;
pub mod util;

pub use crate::error::LoRaError;
pub use crate::logging::{init_logger, log_info};

// Configuration
pub use config::{AppConfig, DeviceConfig, SessionConfig};
pub use schedule::{ScheduleConfig, SendScheduler};

// Radio driver
pub use radio::{Hal, HalError, RadioConfig, RadioStats, Sx127xDriver};

// LoRaWAN layer
pub use lorawan::{
    decode_uplink, encode_uplink, AesKey, DecodedFrame, DevAddr, Mic, Region, Session,
};
