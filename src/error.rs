//! # LoRa Error Handling
//!
//! This module defines the `LoRaError` enum, which represents the different error
//! types that can occur in the lora-sx127x crate, from radio bring-up through
//! frame encoding and transmission.

use crate::radio::hal::HalError;
use thiserror::Error;

/// Represents the different error types that can occur in the LoRa crate.
#[derive(Debug, Error)]
pub enum LoRaError {
    /// The version register never returned the SX127x signature.
    #[error("SX127x not found: version register reads 0x{version:02X}")]
    DeviceNotFound { version: u8 },

    /// Indicates a failure on the SPI bus or a control pin.
    #[error("Bus transfer error: {0}")]
    Bus(#[from] HalError),

    /// TX_DONE was not raised before the send deadline.
    #[error("Transmit timed out after {timeout_ms} ms")]
    TxTimeout { timeout_ms: u64 },

    /// The region code has no channel plan.
    #[error("Unsupported region: {0}")]
    UnsupportedRegion(String),

    /// The frame does not fit the transmit buffer.
    #[error("Payload too large: {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { len: usize, max: usize },

    /// A received packet failed the payload CRC check.
    #[error("Payload CRC error")]
    CrcError,

    /// The bus lock is held by the receive handler.
    #[error("Radio busy")]
    Busy,

    /// Indicates an invalid radio or session parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Indicates a received PHYPayload that cannot be parsed.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Indicates a configuration file that cannot be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}
