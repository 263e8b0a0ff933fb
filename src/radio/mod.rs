//! # SX127x Radio
//!
//! Register map, SPI framing, modem parameters and the driver state machine for the
//! Semtech SX127x LoRa transceiver. Platform access goes through the [`Hal`] trait.

pub mod driver;
pub mod hal;
pub mod lock;
pub mod params;
pub mod registers;
pub mod transport;

pub use driver::{RadioStats, ReceiveCallback, Sx127xDriver};
pub use hal::{Hal, HalError, Pin};
pub use lock::{BusGuard, BusLock};
pub use params::{Bandwidth, ChannelParams, ChipMode, PaOutput, RadioConfig};
pub use registers::IrqFlags;
pub use transport::RegisterTransport;
