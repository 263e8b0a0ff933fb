//! LoRa modem parameters for the SX127x
//!
//! `RadioConfig` carries the physical-layer settings applied at driver start-up.
//! Clamping to the ranges the modem accepts happens here, before anything reaches
//! a register.

use crate::radio::registers::{
    MODE_MASK, MODE_RX_CONTINUOUS, MODE_RX_SINGLE, MODE_SLEEP, MODE_STDBY, MODE_TX,
};
use serde::{Deserialize, Serialize};

/// Operating modes of the SX127x (REG_OP_MODE bits 2-0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipMode {
    Sleep,
    Standby,
    Tx,
    RxContinuous,
    RxSingle,
}

impl ChipMode {
    /// Mode bits written to REG_OP_MODE (without the LoRa bit)
    pub fn bits(self) -> u8 {
        match self {
            ChipMode::Sleep => MODE_SLEEP,
            ChipMode::Standby => MODE_STDBY,
            ChipMode::Tx => MODE_TX,
            ChipMode::RxContinuous => MODE_RX_CONTINUOUS,
            ChipMode::RxSingle => MODE_RX_SINGLE,
        }
    }

    /// Decode REG_OP_MODE. Transitional modes (FSTX, FSRX, CAD) yield `None`.
    pub fn from_register(value: u8) -> Option<Self> {
        match value & MODE_MASK {
            MODE_SLEEP => Some(ChipMode::Sleep),
            MODE_STDBY => Some(ChipMode::Standby),
            MODE_TX => Some(ChipMode::Tx),
            MODE_RX_CONTINUOUS => Some(ChipMode::RxContinuous),
            MODE_RX_SINGLE => Some(ChipMode::RxSingle),
            _ => None,
        }
    }
}

/// LoRa signal bandwidth (REG_MODEM_CONFIG_1 bits 7-4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bandwidth {
    BW7_8 = 0,
    BW10_4 = 1,
    BW15_6 = 2,
    BW20_8 = 3,
    BW31_25 = 4,
    BW41_7 = 5,
    BW62_5 = 6,
    BW125 = 7,
    BW250 = 8,
    BW500 = 9,
}

const BANDWIDTH_TABLE: [(Bandwidth, u32); 10] = [
    (Bandwidth::BW7_8, 7_800),
    (Bandwidth::BW10_4, 10_400),
    (Bandwidth::BW15_6, 15_600),
    (Bandwidth::BW20_8, 20_800),
    (Bandwidth::BW31_25, 31_250),
    (Bandwidth::BW41_7, 41_700),
    (Bandwidth::BW62_5, 62_500),
    (Bandwidth::BW125, 125_000),
    (Bandwidth::BW250, 250_000),
    (Bandwidth::BW500, 500_000),
];

impl Bandwidth {
    /// Interpret a configured bandwidth.
    ///
    /// Values below 10 are register codes; anything else is a bandwidth in Hz,
    /// rounded up to the next supported step (500 kHz above 250 kHz).
    pub fn from_config_value(value: u32) -> Self {
        if value < 10 {
            return BANDWIDTH_TABLE[value as usize].0;
        }
        BANDWIDTH_TABLE
            .iter()
            .find(|(_, hz)| value <= *hz)
            .map(|(bw, _)| *bw)
            .unwrap_or(Bandwidth::BW500)
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn hz(self) -> u32 {
        BANDWIDTH_TABLE[self as usize].1
    }
}

/// Power amplifier output pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaOutput {
    /// RFO pin, 0..=14
    Rfo,
    /// PA_BOOST pin, 2..=17
    #[default]
    PaBoost,
}

impl PaOutput {
    /// Clamp a requested level to the range of this output
    pub fn clamp_level(self, level: i8) -> u8 {
        match self {
            PaOutput::Rfo => level.clamp(0, 14) as u8,
            PaOutput::PaBoost => level.clamp(2, 17) as u8,
        }
    }
}

pub const MIN_SPREADING_FACTOR: u8 = 6;
pub const MAX_SPREADING_FACTOR: u8 = 12;
pub const MIN_CODING_RATE: u8 = 5;
pub const MAX_CODING_RATE: u8 = 8;

/// Radio configuration applied by the driver at start-up
///
/// Defaults follow the common SX127x breakout setup: 868 MHz, SF8, 125 kHz, 4/5,
/// private sync word 0x12.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Carrier frequency in Hz (ignored when a LoRaWAN channel is selected)
    pub frequency_hz: u32,
    /// Channel index into the session's regional plan
    pub channel: Option<u8>,
    /// Pick a pseudorandom plan channel before every LoRaWAN send
    pub multi_channel: bool,
    /// Output power level before clamping
    pub tx_power_level: i8,
    /// PA output pin
    pub pa_output: PaOutput,
    /// Bandwidth as a register code (0-9) or in Hz
    pub signal_bandwidth: u32,
    pub spreading_factor: u8,
    /// Coding rate denominator (4/x)
    pub coding_rate: u8,
    pub preamble_length: u16,
    pub implicit_header: bool,
    pub sync_word: u8,
    pub enable_crc: bool,
    pub invert_iq: bool,
    /// TX_DONE deadline for a single send
    pub tx_timeout_ms: u64,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 868_000_000,
            channel: None,
            multi_channel: false,
            tx_power_level: 2,
            pa_output: PaOutput::PaBoost,
            signal_bandwidth: 125_000,
            spreading_factor: 8,
            coding_rate: 5,
            preamble_length: 8,
            implicit_header: false,
            sync_word: 0x12,
            enable_crc: false,
            invert_iq: false,
            tx_timeout_ms: 5_000,
        }
    }
}

impl RadioConfig {
    pub fn bandwidth(&self) -> Bandwidth {
        Bandwidth::from_config_value(self.signal_bandwidth)
    }

    pub fn clamped_spreading_factor(&self) -> u8 {
        clamp_spreading_factor(self.spreading_factor)
    }

    /// LowDataRateOptimize is mandated once a symbol lasts longer than 16 ms
    pub fn low_data_rate_optimize(&self) -> bool {
        let symbol_us =
            (1_000_000u64 << self.clamped_spreading_factor()) / self.bandwidth().hz() as u64;
        symbol_us > 16_000
    }
}

pub fn clamp_spreading_factor(sf: u8) -> u8 {
    sf.clamp(MIN_SPREADING_FACTOR, MAX_SPREADING_FACTOR)
}

pub fn clamp_coding_rate(denominator: u8) -> u8 {
    denominator.clamp(MIN_CODING_RATE, MAX_CODING_RATE)
}

/// Runtime channel switch, applied after entering standby
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelParams {
    pub frequency_hz: Option<u32>,
    pub invert_iq: Option<bool>,
    pub tx_power_level: Option<i8>,
}
