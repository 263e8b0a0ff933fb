//! # SX127x Register Definitions and Constants
//!
//! Register addresses, operating modes and bit fields for the Semtech SX1276/77/78/79
//! (and HopeRF RFM95/96/98 modules) in LoRa mode. Only the subset the driver touches
//! is listed.
//!
//! ## Register Map (LoRa mode)
//!
//! - 0x00-0x0F: FIFO, operating mode, RF carrier, PA and FIFO pointers
//! - 0x10-0x1F: IRQ flags, received packet status, modem configuration
//! - 0x20-0x3F: preamble, payload length, detection and sync word
//! - 0x40-0x42: DIO mapping and silicon version

use bitflags::bitflags;

// =============================================================================
// Register Addresses
// =============================================================================

/// FIFO read/write access
pub const REG_FIFO: u8 = 0x00;

/// Operating mode and LoRa/FSK selection
pub const REG_OP_MODE: u8 = 0x01;

/// RF carrier frequency (MSB)
pub const REG_FRF_MSB: u8 = 0x06;

/// RF carrier frequency (MID)
pub const REG_FRF_MID: u8 = 0x07;

/// RF carrier frequency (LSB)
pub const REG_FRF_LSB: u8 = 0x08;

/// PA selection and output power
pub const REG_PA_CONFIG: u8 = 0x09;

/// LNA gain and boost
pub const REG_LNA: u8 = 0x0C;

/// SPI interface address pointer in FIFO data buffer
pub const REG_FIFO_ADDR_PTR: u8 = 0x0D;

/// Write base address in FIFO for TX
pub const REG_FIFO_TX_BASE_ADDR: u8 = 0x0E;

/// Read base address in FIFO for RX
pub const REG_FIFO_RX_BASE_ADDR: u8 = 0x0F;

/// Start address of the last packet received
pub const REG_FIFO_RX_CURRENT_ADDR: u8 = 0x10;

/// Optional IRQ flag mask
pub const REG_IRQ_FLAGS_MASK: u8 = 0x11;

/// IRQ flags (write 1 to clear)
pub const REG_IRQ_FLAGS: u8 = 0x12;

/// Number of payload bytes of the last packet received
pub const REG_RX_NB_BYTES: u8 = 0x13;

/// SNR estimate of the last packet (two's complement, 0.25 dB steps)
pub const REG_PKT_SNR_VALUE: u8 = 0x19;

/// RSSI of the last packet
pub const REG_PKT_RSSI_VALUE: u8 = 0x1A;

/// Bandwidth, coding rate, implicit header
pub const REG_MODEM_CONFIG_1: u8 = 0x1D;

/// Spreading factor, CRC enable
pub const REG_MODEM_CONFIG_2: u8 = 0x1E;

/// Preamble length (MSB)
pub const REG_PREAMBLE_MSB: u8 = 0x20;

/// Preamble length (LSB)
pub const REG_PREAMBLE_LSB: u8 = 0x21;

/// Payload length (implicit header, and TX)
pub const REG_PAYLOAD_LENGTH: u8 = 0x22;

/// Current value of the RX databuffer pointer
pub const REG_FIFO_RX_BYTE_ADDR: u8 = 0x25;

/// LowDataRateOptimize, AGC auto
pub const REG_MODEM_CONFIG_3: u8 = 0x26;

/// Wideband RSSI measurement
pub const REG_RSSI_WIDEBAND: u8 = 0x2C;

/// LoRa detection optimize
pub const REG_DETECTION_OPTIMIZE: u8 = 0x31;

/// I/Q inversion
pub const REG_INVERTIQ: u8 = 0x33;

/// LoRa detection threshold
pub const REG_DETECTION_THRESHOLD: u8 = 0x37;

/// LoRa sync word
pub const REG_SYNC_WORD: u8 = 0x39;

/// I/Q inversion (second register)
pub const REG_INVERTIQ2: u8 = 0x3B;

/// Mapping of pins DIO0 to DIO3
pub const REG_DIO_MAPPING_1: u8 = 0x40;

/// Silicon revision
pub const REG_VERSION: u8 = 0x42;

/// Number of addressable registers (0x00-0x7F)
pub const REGISTER_COUNT: usize = 128;

// =============================================================================
// SPI access
// =============================================================================

/// Address bit selecting a write access
pub const SPI_WRITE: u8 = 0x80;

/// Mask selecting the register address for a read access
pub const SPI_READ_MASK: u8 = 0x7F;

// =============================================================================
// Operating Modes
// =============================================================================

/// Bit 7 of REG_OP_MODE: LoRa (long range) mode
pub const MODE_LONG_RANGE_MODE: u8 = 0x80;

pub const MODE_SLEEP: u8 = 0x00;
pub const MODE_STDBY: u8 = 0x01;
pub const MODE_TX: u8 = 0x03;
pub const MODE_RX_CONTINUOUS: u8 = 0x05;
pub const MODE_RX_SINGLE: u8 = 0x06;

/// Mask of the mode bits in REG_OP_MODE
pub const MODE_MASK: u8 = 0x07;

// =============================================================================
// Bit fields
// =============================================================================

/// REG_PA_CONFIG: route output through PA_BOOST
pub const PA_BOOST: u8 = 0x80;

/// REG_PA_CONFIG: max power setting used with the RFO pin
pub const PA_RFO_MAX_POWER: u8 = 0x70;

/// REG_LNA: boost on (150% LNA current)
pub const LNA_BOOST_HF: u8 = 0x03;

/// REG_MODEM_CONFIG_3: AGC auto on
pub const MODEM_CONFIG3_AGC_AUTO: u8 = 0x04;

/// REG_MODEM_CONFIG_3: low data rate optimize
pub const MODEM_CONFIG3_LOW_DATA_RATE: u8 = 0x08;

/// REG_MODEM_CONFIG_1: implicit header mode
pub const MODEM_CONFIG1_IMPLICIT_HEADER: u8 = 0x01;

/// REG_MODEM_CONFIG_2: RX payload CRC on
pub const MODEM_CONFIG2_RX_CRC_ON: u8 = 0x04;

pub const RFLR_INVERTIQ_RX_MASK: u8 = 0xBF;
pub const RFLR_INVERTIQ_RX_OFF: u8 = 0x00;
pub const RFLR_INVERTIQ_RX_ON: u8 = 0x40;
pub const RFLR_INVERTIQ_TX_MASK: u8 = 0xFE;
pub const RFLR_INVERTIQ_TX_OFF: u8 = 0x01;
pub const RFLR_INVERTIQ_TX_ON: u8 = 0x00;

pub const RFLR_INVERTIQ2_ON: u8 = 0x19;
pub const RFLR_INVERTIQ2_OFF: u8 = 0x1D;

/// REG_DIO_MAPPING_1 value routing RxDone to DIO0
pub const DIO0_RX_DONE: u8 = 0x00;

// =============================================================================
// Chip constants
// =============================================================================

/// REG_VERSION value of the SX1276/77/78/79
pub const SX127X_VERSION: u8 = 0x12;

/// Crystal oscillator frequency
pub const FXOSC_HZ: u64 = 32_000_000;

/// FRF register resolution: Fstep = FXOSC / 2^19
pub const FRF_SHIFT: u32 = 19;

/// Largest value the 24-bit FRF register holds
pub const FRF_MAX: u64 = 0xFF_FFFF;

/// FIFO base used for both TX and RX
pub const FIFO_TX_BASE_ADDR: u8 = 0x00;
pub const FIFO_RX_BASE_ADDR: u8 = 0x00;

/// Largest packet the modem accepts
pub const MAX_PKT_LENGTH: usize = 255;

bitflags! {
    /// REG_IRQ_FLAGS bits (LoRa mode)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqFlags: u8 {
        const CAD_DETECTED = 0x01;
        const FHSS_CHANGE_CHANNEL = 0x02;
        const CAD_DONE = 0x04;
        const TX_DONE = 0x08;
        const VALID_HEADER = 0x10;
        const PAYLOAD_CRC_ERROR = 0x20;
        const RX_DONE = 0x40;
        const RX_TIMEOUT = 0x80;
    }
}
