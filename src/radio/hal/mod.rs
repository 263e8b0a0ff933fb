//! # Hardware Abstraction Layer for Radio Hardware
//!
//! This module defines the HAL trait that the SX127x driver consumes: a single-byte
//! full-duplex SPI exchange, digital pin control, the DIO0 rising-edge interrupt and
//! a monotonic millisecond clock. One implementation exists per target platform.

use thiserror::Error;

/// Errors that can occur during HAL operations
#[derive(Debug, Error)]
pub enum HalError {
    #[error("SPI communication error")]
    Spi,

    #[error("GPIO operation error")]
    Gpio,

    #[error("Interrupt configuration error")]
    Interrupt,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Digital pins wired between the host and the radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pin {
    /// NRESET (output, active low)
    Reset,
    /// NSS chip select (output, active low)
    ChipSelect,
    /// DIO0 (input, RxDone/TxDone)
    Dio0,
    /// Status LED (output, optional on most boards)
    Led,
}

/// Hardware Abstraction Layer trait for SX127x radio control
pub trait Hal {
    /// Shift one byte out on MOSI while shifting one byte in from MISO.
    ///
    /// Chip select is not touched; the register transport frames each exchange.
    fn spi_transfer(&mut self, byte: u8) -> Result<u8, HalError>;

    /// Drive an output pin high (`true`) or low (`false`).
    fn gpio_write(&mut self, pin: Pin, high: bool) -> Result<(), HalError>;

    /// Read the level of a pin.
    fn gpio_read(&mut self, pin: Pin) -> Result<bool, HalError>;

    /// Enable or disable the DIO0 rising-edge interrupt.
    fn set_rx_interrupt(&mut self, enabled: bool) -> Result<(), HalError>;

    /// Returns `true` once for every DIO0 rising edge latched since the last call.
    fn take_rx_interrupt(&mut self) -> Result<bool, HalError>;

    /// Block for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Monotonic milliseconds since an arbitrary epoch.
    fn millis(&mut self) -> u64;
}

// Platform implementations
#[cfg(feature = "raspberry-pi")]
pub mod raspberry_pi;

#[cfg(feature = "raspberry-pi")]
pub use raspberry_pi::{GpioPins, RaspberryPiHal};
