//! # SX127x Radio Driver
//!
//! Driver for the Semtech SX1276/77/78/79 in LoRa mode, with an optional LoRaWAN
//! session for encrypted unconfirmed uplinks.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────┐
//! │        Application Layer        │
//! ├─────────────────────────────────┤
//! │   Sx127xDriver (this file)      │──── lorawan::frame (encode_uplink)
//! ├─────────────────────────────────┤
//! │       RegisterTransport         │
//! ├─────────────────────────────────┤
//! │    Platform-specific HAL impl   │
//! └─────────────────────────────────┘
//! ```
//!
//! ## Receive paths
//!
//! Polling: put the chip into receive with [`Sx127xDriver::receive`], then call
//! [`Sx127xDriver::received_packet`] and [`Sx127xDriver::read_payload`].
//!
//! Interrupt: register a callback with [`Sx127xDriver::on_receive`] and call
//! [`Sx127xDriver::handle_on_receive`] from the DIO0 rising-edge handler, or
//! [`Sx127xDriver::service_interrupt`] from a loop when the HAL latches the edge.
//! The interrupt path never blocks and never returns an error.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use lora_sx127x::lorawan::{AesKey, DevAddr, Region, Session};
//! use lora_sx127x::radio::{RadioConfig, Sx127xDriver};
//! # fn run<H: lora_sx127x::radio::Hal>(hal: H) -> Result<(), lora_sx127x::LoRaError> {
//! let session = Session::new(
//!     DevAddr::new([0x26, 0x01, 0x1B, 0xDA]),
//!     AesKey::new([0; 16]),
//!     AesKey::new([0; 16]),
//!     Region::Eu868,
//! );
//! let mut driver = Sx127xDriver::new_lorawan(hal, RadioConfig::default(), session)?;
//!
//! let fcnt = driver.frame_counter();
//! driver.send_data(b"21.5C", fcnt)?;
//! driver.increment_frame_counter();
//! # Ok(())
//! # }
//! ```

use crate::error::LoRaError;
use crate::log_error_throttled;
use crate::lorawan::frame::encode_uplink;
use crate::lorawan::region::{Channel, CHANNELS_PER_REGION};
use crate::lorawan::session::Session;
use crate::radio::hal::{Hal, Pin};
use crate::radio::lock::BusLock;
use crate::radio::params::{
    clamp_coding_rate, clamp_spreading_factor, Bandwidth, ChannelParams, ChipMode, PaOutput,
    RadioConfig,
};
use crate::radio::registers::*;
use crate::radio::transport::RegisterTransport;
use crate::util::buffer::{RxBuffer, RX_CAPACITY};
use crate::util::logging::{log_frame_hex, LogThrottle};
use log::{debug, error, info, warn};
use rand::Rng;

/// Callback invoked with the raw bytes of every packet received on the interrupt path
pub type ReceiveCallback = Box<dyn FnMut(&[u8]) + Send>;

/// Attempts to read the SX127x signature before giving up
pub const VERSION_PROBE_ATTEMPTS: u32 = 5;

/// Base delay between version probes; doubles per attempt
const VERSION_PROBE_BACKOFF_MS: u32 = 2;

/// NRESET low time
const RESET_HOLD_MS: u32 = 1;

/// Wait after releasing NRESET before the first SPI access
const RESET_SETTLE_MS: u32 = 10;

/// Pause between TX_DONE polls
const TX_POLL_INTERVAL_MS: u32 = 1;

/// RSSI offset of the HF port (868 MHz and above)
const RSSI_OFFSET_HF: i16 = 157;

/// RSSI offset of the LF port
const RSSI_OFFSET_LF: i16 = 164;

/// Boundary between the LF and HF RSSI offsets
const RSSI_HF_THRESHOLD_HZ: u32 = 868_000_000;

/// Counters kept by the driver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadioStats {
    /// Packets handed to the modem that completed with TX_DONE
    pub packets_sent: u64,
    /// Sends that gave up waiting for TX_DONE
    pub tx_timeouts: u64,
    /// Packets observed with exactly RX_DONE set
    pub packets_received: u64,
    /// Packets dropped for a payload CRC error
    pub crc_errors: u64,
    /// RxSingle windows re-armed after an unexpected IRQ state
    pub rx_rearms: u64,
    /// Interrupts skipped because the bus lock was held
    pub interrupts_skipped: u64,
    /// Errors swallowed on the interrupt path
    pub interrupt_errors: u64,
}

/// SX127x driver bound to one HAL instance
pub struct Sx127xDriver<H: Hal> {
    transport: RegisterTransport<H>,
    config: RadioConfig,
    /// Last carrier frequency written to FRF
    frequency_hz: u32,
    /// Cached header mode; `None` after a reset forces the next write
    implicit_header: Option<bool>,
    session: Option<Session>,
    on_receive: Option<ReceiveCallback>,
    lock: BusLock,
    stats: RadioStats,
    irq_error_throttle: LogThrottle,
}

impl<H: Hal> Sx127xDriver<H> {
    /// Reset, probe and configure a radio for plain LoRa operation
    ///
    /// # Errors
    ///
    /// * [`LoRaError::DeviceNotFound`] - the version register never read 0x12
    /// * [`LoRaError::InvalidConfig`] - a channel index was configured without a session
    /// * [`LoRaError::Bus`] - SPI or GPIO failure
    pub fn new(hal: H, config: RadioConfig) -> Result<Self, LoRaError> {
        if config.channel.is_some() {
            return Err(LoRaError::InvalidConfig(
                "channel index requires a LoRaWAN session".to_string(),
            ));
        }
        Self::build(hal, config, None)
    }

    /// Reset, probe and configure a radio for LoRaWAN uplinks under `session`
    ///
    /// When `config.channel` is set, the carrier comes from the session's regional
    /// plan instead of `config.frequency_hz`.
    pub fn new_lorawan(hal: H, config: RadioConfig, session: Session) -> Result<Self, LoRaError> {
        Self::build(hal, config, Some(session))
    }

    fn build(hal: H, config: RadioConfig, session: Option<Session>) -> Result<Self, LoRaError> {
        // Resolve the plan channel before any bus traffic
        let channel = match (&session, config.channel) {
            (Some(session), Some(index)) => Some(session.region().channel(index as usize)?),
            _ => None,
        };

        let mut driver = Self {
            transport: RegisterTransport::new(hal),
            frequency_hz: config.frequency_hz,
            config,
            implicit_header: None,
            session,
            on_receive: None,
            lock: BusLock::new(),
            stats: RadioStats::default(),
            irq_error_throttle: LogThrottle::new(10_000, 3),
        };

        driver.reset()?;
        let version = driver.probe_version()?;
        info!("SX127x detected, version 0x{version:02X}");

        driver.sleep()?;
        driver.configure(channel)?;
        driver.standby()?;

        info!(
            "SX127x configured: {:.1} MHz, SF{}, {} Hz, 4/{}, sync 0x{:02X}",
            driver.frequency_hz as f64 / 1e6,
            driver.config.clamped_spreading_factor(),
            driver.config.bandwidth().hz(),
            clamp_coding_rate(driver.config.coding_rate),
            driver.config.sync_word
        );
        if let Some(session) = &driver.session {
            info!(
                "LoRaWAN session: DevAddr {} region {} FPort {}",
                session.dev_addr(),
                session.region(),
                session.fport()
            );
        }

        Ok(driver)
    }

    /// Pulse NRESET; register contents return to their power-on values
    fn reset(&mut self) -> Result<(), LoRaError> {
        debug!("Resetting SX127x");
        let hal = self.transport.hal_mut();
        hal.gpio_write(Pin::Reset, false)?;
        hal.delay_ms(RESET_HOLD_MS);
        hal.gpio_write(Pin::Reset, true)?;
        hal.delay_ms(RESET_SETTLE_MS);
        self.implicit_header = None;
        Ok(())
    }

    fn probe_version(&mut self) -> Result<u8, LoRaError> {
        let mut version = 0;
        for attempt in 0..VERSION_PROBE_ATTEMPTS {
            version = self.read(REG_VERSION)?;
            if version == SX127X_VERSION {
                return Ok(version);
            }
            debug!("Version probe {} read 0x{version:02X}", attempt + 1);
            if attempt + 1 < VERSION_PROBE_ATTEMPTS {
                self.transport
                    .hal_mut()
                    .delay_ms(VERSION_PROBE_BACKOFF_MS << attempt);
            }
        }

        error!("SX127x not found after {VERSION_PROBE_ATTEMPTS} probes (version 0x{version:02X})");
        Err(LoRaError::DeviceNotFound { version })
    }

    /// Apply the full configuration; the chip must be in sleep mode
    fn configure(&mut self, channel: Option<Channel>) -> Result<(), LoRaError> {
        match channel {
            Some(channel) => self.set_channel_frf(&channel)?,
            None => self.set_frequency(self.config.frequency_hz)?,
        }
        self.set_signal_bandwidth(self.config.signal_bandwidth)?;

        self.update(REG_LNA, 0xFF, LNA_BOOST_HF)?;
        self.write(REG_MODEM_CONFIG_3, MODEM_CONFIG3_AGC_AUTO)?;

        self.set_tx_power(self.config.tx_power_level)?;
        self.implicit_header = None;
        self.implicit_header_mode(self.config.implicit_header)?;
        self.set_spreading_factor(self.config.spreading_factor)?;
        self.set_coding_rate(self.config.coding_rate)?;
        self.set_preamble_length(self.config.preamble_length)?;
        self.set_sync_word(self.config.sync_word)?;
        self.enable_crc(self.config.enable_crc)?;
        self.invert_iq(self.config.invert_iq)?;

        if self.config.low_data_rate_optimize() {
            debug!("Symbol time above 16 ms, enabling LowDataRateOptimize");
            self.update(REG_MODEM_CONFIG_3, 0xFF, MODEM_CONFIG3_LOW_DATA_RATE)?;
        }

        self.write(REG_FIFO_TX_BASE_ADDR, FIFO_TX_BASE_ADDR)?;
        self.write(REG_FIFO_RX_BASE_ADDR, FIFO_RX_BASE_ADDR)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Register access
    // ------------------------------------------------------------------

    fn read(&mut self, address: u8) -> Result<u8, LoRaError> {
        Ok(self.transport.read_register(address)?)
    }

    fn write(&mut self, address: u8, value: u8) -> Result<(), LoRaError> {
        Ok(self.transport.write_register(address, value)?)
    }

    fn update(&mut self, address: u8, keep_mask: u8, bits: u8) -> Result<(), LoRaError> {
        Ok(self.transport.update_register(address, keep_mask, bits)?)
    }

    // ------------------------------------------------------------------
    // Modes
    // ------------------------------------------------------------------

    fn set_mode(&mut self, mode: ChipMode) -> Result<(), LoRaError> {
        self.write(REG_OP_MODE, MODE_LONG_RANGE_MODE | mode.bits())
    }

    pub fn standby(&mut self) -> Result<(), LoRaError> {
        self.set_mode(ChipMode::Standby)
    }

    pub fn sleep(&mut self) -> Result<(), LoRaError> {
        self.set_mode(ChipMode::Sleep)
    }

    /// Current mode as reported by REG_OP_MODE; `None` for transitional modes
    pub fn mode(&mut self) -> Result<Option<ChipMode>, LoRaError> {
        let value = self.read(REG_OP_MODE)?;
        Ok(ChipMode::from_register(value))
    }

    // ------------------------------------------------------------------
    // Modem configuration
    // ------------------------------------------------------------------

    /// Set the carrier, rounded to the nearest synthesizer step (61.035 Hz)
    ///
    /// # Errors
    /// [`LoRaError::InvalidConfig`] when the carrier does not fit the 24-bit FRF
    /// register (above about 1024 MHz).
    pub fn set_frequency(&mut self, frequency_hz: u32) -> Result<(), LoRaError> {
        let frf = (((frequency_hz as u64) << FRF_SHIFT) + FXOSC_HZ / 2) / FXOSC_HZ;
        if frf > FRF_MAX {
            return Err(LoRaError::InvalidConfig(format!(
                "frequency {frequency_hz} Hz is outside the synthesizer range"
            )));
        }
        self.write_frf([(frf >> 16) as u8, (frf >> 8) as u8, frf as u8])?;
        self.frequency_hz = frequency_hz;
        self.config.frequency_hz = frequency_hz;
        debug!("Frequency set to {:.3} MHz (FRF 0x{:06X})", frequency_hz as f64 / 1e6, frf);
        Ok(())
    }

    /// Tune to a regional plan channel using its precomputed FRF value
    pub fn set_channel_frf(&mut self, channel: &Channel) -> Result<(), LoRaError> {
        self.write_frf(channel.frf)?;
        self.frequency_hz = channel.frequency_hz;
        debug!("Channel set to {:.1} MHz", channel.frequency_hz as f64 / 1e6);
        Ok(())
    }

    fn write_frf(&mut self, frf: [u8; 3]) -> Result<(), LoRaError> {
        self.write(REG_FRF_MSB, frf[0])?;
        self.write(REG_FRF_MID, frf[1])?;
        self.write(REG_FRF_LSB, frf[2])
    }

    /// Set output power on the configured PA pin, clamped to its range
    pub fn set_tx_power(&mut self, level: i8) -> Result<(), LoRaError> {
        let output = self.config.pa_output;
        let clamped = output.clamp_level(level);
        let value = match output {
            PaOutput::Rfo => PA_RFO_MAX_POWER | clamped,
            PaOutput::PaBoost => PA_BOOST | (clamped - 2),
        };
        self.write(REG_PA_CONFIG, value)?;
        self.config.tx_power_level = level;
        debug!("TX power level {clamped} on {output:?}");
        Ok(())
    }

    pub fn set_spreading_factor(&mut self, sf: u8) -> Result<(), LoRaError> {
        let sf = clamp_spreading_factor(sf);
        let (optimize, threshold) = if sf == 6 { (0xC5, 0x0C) } else { (0xC3, 0x0A) };
        self.write(REG_DETECTION_OPTIMIZE, optimize)?;
        self.write(REG_DETECTION_THRESHOLD, threshold)?;
        self.update(REG_MODEM_CONFIG_2, 0x0F, sf << 4)?;
        self.config.spreading_factor = sf;
        Ok(())
    }

    /// Set the bandwidth from a register code (0-9) or a value in Hz
    pub fn set_signal_bandwidth(&mut self, value: u32) -> Result<(), LoRaError> {
        let bandwidth = Bandwidth::from_config_value(value);
        self.update(REG_MODEM_CONFIG_1, 0x0F, bandwidth.code() << 4)?;
        self.config.signal_bandwidth = bandwidth.hz();
        Ok(())
    }

    /// Set the coding rate 4/`denominator`, clamped to 4/5..4/8
    pub fn set_coding_rate(&mut self, denominator: u8) -> Result<(), LoRaError> {
        let denominator = clamp_coding_rate(denominator);
        self.update(REG_MODEM_CONFIG_1, 0xF1, (denominator - 4) << 1)?;
        self.config.coding_rate = denominator;
        Ok(())
    }

    pub fn set_preamble_length(&mut self, length: u16) -> Result<(), LoRaError> {
        let [msb, lsb] = length.to_be_bytes();
        self.write(REG_PREAMBLE_MSB, msb)?;
        self.write(REG_PREAMBLE_LSB, lsb)?;
        self.config.preamble_length = length;
        Ok(())
    }

    pub fn set_sync_word(&mut self, sync_word: u8) -> Result<(), LoRaError> {
        self.write(REG_SYNC_WORD, sync_word)?;
        self.config.sync_word = sync_word;
        Ok(())
    }

    pub fn enable_crc(&mut self, enabled: bool) -> Result<(), LoRaError> {
        let bits = if enabled { MODEM_CONFIG2_RX_CRC_ON } else { 0 };
        self.update(REG_MODEM_CONFIG_2, !MODEM_CONFIG2_RX_CRC_ON, bits)?;
        self.config.enable_crc = enabled;
        Ok(())
    }

    pub fn invert_iq(&mut self, inverted: bool) -> Result<(), LoRaError> {
        let (iq_bits, iq2) = if inverted {
            (RFLR_INVERTIQ_RX_ON | RFLR_INVERTIQ_TX_ON, RFLR_INVERTIQ2_ON)
        } else {
            (RFLR_INVERTIQ_RX_OFF | RFLR_INVERTIQ_TX_OFF, RFLR_INVERTIQ2_OFF)
        };
        self.update(
            REG_INVERTIQ,
            RFLR_INVERTIQ_TX_MASK & RFLR_INVERTIQ_RX_MASK,
            iq_bits,
        )?;
        self.write(REG_INVERTIQ2, iq2)?;
        self.config.invert_iq = inverted;
        Ok(())
    }

    /// Switch header mode; the register is written only when the mode changes
    pub fn implicit_header_mode(&mut self, implicit: bool) -> Result<(), LoRaError> {
        if self.implicit_header == Some(implicit) {
            return Ok(());
        }
        let bits = if implicit { MODEM_CONFIG1_IMPLICIT_HEADER } else { 0 };
        self.update(REG_MODEM_CONFIG_1, !MODEM_CONFIG1_IMPLICIT_HEADER, bits)?;
        self.implicit_header = Some(implicit);
        Ok(())
    }

    /// Enter standby, then apply whichever of frequency, IQ inversion and power are set
    pub fn set_channel(&mut self, params: &ChannelParams) -> Result<(), LoRaError> {
        self.standby()?;
        if let Some(frequency_hz) = params.frequency_hz {
            self.set_frequency(frequency_hz)?;
        }
        if let Some(inverted) = params.invert_iq {
            self.invert_iq(inverted)?;
        }
        if let Some(level) = params.tx_power_level {
            self.set_tx_power(level)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transmit
    // ------------------------------------------------------------------

    /// Encrypt and send `payload` as a LoRaWAN uplink with frame counter `fcnt`.
    ///
    /// The frame is built before the bus is touched, so an oversized payload fails
    /// with [`LoRaError::PayloadTooLarge`] and no register access. The session's
    /// counter is not advanced; see [`Sx127xDriver::increment_frame_counter`].
    pub fn send_data(&mut self, payload: &[u8], fcnt: u16) -> Result<(), LoRaError> {
        let session = self.session.as_ref().ok_or_else(|| {
            LoRaError::InvalidConfig("send_data requires a LoRaWAN session".to_string())
        })?;
        let frame = encode_uplink(session, payload, fcnt)?;

        let channel = if self.config.multi_channel {
            let index = rand::thread_rng().gen_range(0..CHANNELS_PER_REGION);
            Some(session.region().channel(index)?)
        } else {
            None
        };

        self.transmit(frame.as_slice(), channel)?;
        info!("Uplink FCnt {fcnt} sent ({} bytes)", frame.len());
        Ok(())
    }

    /// Send with the session's current frame counter, then advance it
    ///
    /// Returns the counter value used.
    pub fn send_next(&mut self, payload: &[u8]) -> Result<u16, LoRaError> {
        let fcnt = self.frame_counter();
        self.send_data(payload, fcnt)?;
        self.increment_frame_counter();
        Ok(fcnt)
    }

    /// Send raw bytes without LoRaWAN framing
    pub fn send_packet(&mut self, packet: &[u8]) -> Result<(), LoRaError> {
        if packet.len() > MAX_PKT_LENGTH {
            return Err(LoRaError::PayloadTooLarge {
                len: packet.len(),
                max: MAX_PKT_LENGTH,
            });
        }
        self.transmit(packet, None)
    }

    fn transmit(&mut self, packet: &[u8], channel: Option<Channel>) -> Result<(), LoRaError> {
        let _guard = self.lock.try_acquire().ok_or(LoRaError::Busy)?;

        self.standby()?;
        if let Some(channel) = channel {
            self.set_channel_frf(&channel)?;
        }
        self.implicit_header_mode(false)?;

        self.write(REG_FIFO_ADDR_PTR, FIFO_TX_BASE_ADDR)?;
        self.write(REG_PAYLOAD_LENGTH, 0)?;
        for &byte in packet {
            self.write(REG_FIFO, byte)?;
        }
        self.write(REG_PAYLOAD_LENGTH, packet.len() as u8)?;
        log_frame_hex("TX", packet);

        self.set_mode(ChipMode::Tx)?;
        self.wait_tx_done()
    }

    /// Busy-poll until TX_DONE; the chip falls back to standby on its own
    fn wait_tx_done(&mut self) -> Result<(), LoRaError> {
        let timeout_ms = self.config.tx_timeout_ms;
        let start = self.transport.hal_mut().millis();

        loop {
            let flags = self.read(REG_IRQ_FLAGS)?;
            if IrqFlags::from_bits_retain(flags).contains(IrqFlags::TX_DONE) {
                self.write(REG_IRQ_FLAGS, flags)?;
                self.stats.packets_sent += 1;
                return Ok(());
            }

            let elapsed = self.transport.hal_mut().millis().saturating_sub(start);
            if elapsed >= timeout_ms {
                self.stats.tx_timeouts += 1;
                warn!("TX_DONE not seen after {elapsed} ms");
                return Err(LoRaError::TxTimeout { timeout_ms });
            }

            self.transport.hal_mut().delay_ms(TX_POLL_INTERVAL_MS);
        }
    }

    // ------------------------------------------------------------------
    // Receive
    // ------------------------------------------------------------------

    /// Enter continuous receive; `size > 0` selects implicit header with that length
    pub fn receive(&mut self, size: u8) -> Result<(), LoRaError> {
        self.apply_rx_length(size)?;
        self.set_mode(ChipMode::RxContinuous)
    }

    fn apply_rx_length(&mut self, size: u8) -> Result<(), LoRaError> {
        self.implicit_header_mode(size > 0)?;
        if size > 0 {
            self.write(REG_PAYLOAD_LENGTH, size)?;
        }
        Ok(())
    }

    /// Read REG_IRQ_FLAGS and write the value back to clear it
    pub fn get_irq_flags(&mut self) -> Result<IrqFlags, LoRaError> {
        let flags = self.read(REG_IRQ_FLAGS)?;
        self.write(REG_IRQ_FLAGS, flags)?;
        Ok(IrqFlags::from_bits_retain(flags))
    }

    /// Poll for a packet.
    ///
    /// Returns `true` only when the IRQ flags equal exactly RX_DONE; the packet is
    /// then ready for [`Sx127xDriver::read_payload`]. Otherwise a single-receive
    /// window is re-armed unless one is already open.
    pub fn received_packet(&mut self, size: u8) -> Result<bool, LoRaError> {
        let flags = self.get_irq_flags()?;
        self.apply_rx_length(size)?;

        if flags == IrqFlags::RX_DONE {
            self.stats.packets_received += 1;
            return Ok(true);
        }

        self.note_rx_failure(flags);
        self.rearm_rx_single()?;
        Ok(false)
    }

    fn note_rx_failure(&mut self, flags: IrqFlags) {
        if flags.contains(IrqFlags::PAYLOAD_CRC_ERROR) {
            self.stats.crc_errors += 1;
            debug!("Dropping packet: {}", LoRaError::CrcError);
        } else if !flags.is_empty() {
            debug!("Unexpected IRQ flags 0x{:02X}", flags.bits());
        }
    }

    fn rearm_rx_single(&mut self) -> Result<(), LoRaError> {
        if self.mode()? != Some(ChipMode::RxSingle) {
            self.write(REG_FIFO_ADDR_PTR, FIFO_RX_BASE_ADDR)?;
            self.set_mode(ChipMode::RxSingle)?;
            self.stats.rx_rearms += 1;
        }
        Ok(())
    }

    /// Read the last received packet from the FIFO
    pub fn read_payload(&mut self) -> Result<RxBuffer, LoRaError> {
        let current = self.read(REG_FIFO_RX_CURRENT_ADDR)?;
        self.write(REG_FIFO_ADDR_PTR, current)?;

        let length = if self.implicit_header == Some(true) {
            self.read(REG_PAYLOAD_LENGTH)?
        } else {
            self.read(REG_RX_NB_BYTES)?
        };

        let mut payload = RxBuffer::new();
        for _ in 0..length {
            let byte = self.read(REG_FIFO)?;
            payload.push(byte).map_err(|_| {
                LoRaError::MalformedFrame(format!("packet longer than {RX_CAPACITY} bytes"))
            })?;
        }
        log_frame_hex("RX", payload.as_slice());
        Ok(payload)
    }

    /// Register (or with `None`, remove) the receive callback.
    ///
    /// Registering maps RxDone to DIO0 and enables the rising-edge interrupt.
    pub fn on_receive(&mut self, callback: Option<ReceiveCallback>) -> Result<(), LoRaError> {
        match callback {
            Some(callback) => {
                self.write(REG_DIO_MAPPING_1, DIO0_RX_DONE)?;
                self.transport.hal_mut().set_rx_interrupt(true)?;
                self.on_receive = Some(callback);
                debug!("Receive callback registered on DIO0");
            }
            None => {
                self.transport.hal_mut().set_rx_interrupt(false)?;
                self.on_receive = None;
                debug!("Receive callback removed");
            }
        }
        Ok(())
    }

    /// DIO0 rising-edge handler.
    ///
    /// Holds the bus lock for its duration. Returns `false` without touching the bus
    /// when the lock is already held. Errors are logged, never returned.
    pub fn handle_on_receive(&mut self) -> bool {
        let Some(_guard) = self.lock.try_acquire() else {
            self.stats.interrupts_skipped += 1;
            return false;
        };

        self.run_rx_interrupt();
        true
    }

    fn run_rx_interrupt(&mut self) {
        if let Err(e) = self.process_rx_interrupt() {
            self.stats.interrupt_errors += 1;
            let now = self.transport.hal_mut().millis();
            log_error_throttled!(self.irq_error_throttle, now, "Receive interrupt failed: {e}");
        }
    }

    fn process_rx_interrupt(&mut self) -> Result<(), LoRaError> {
        let flags = self.get_irq_flags()?;

        if flags == IrqFlags::RX_DONE {
            self.stats.packets_received += 1;
            if self.on_receive.is_some() {
                let payload = self.read_payload()?;
                if let Some(callback) = self.on_receive.as_mut() {
                    callback(payload.as_slice());
                }
            }
            return Ok(());
        }

        self.note_rx_failure(flags);
        self.rearm_rx_single()
    }

    /// Run the interrupt path once if the HAL latched a DIO0 edge.
    ///
    /// Returns `true` when a pending edge was handled. While the bus lock is held
    /// the edge stays latched in the HAL and is picked up by a later call.
    pub fn service_interrupt(&mut self) -> bool {
        let Some(_guard) = self.lock.try_acquire() else {
            return false;
        };

        match self.transport.hal_mut().take_rx_interrupt() {
            Ok(true) => {
                self.run_rx_interrupt();
                true
            }
            Ok(false) => false,
            Err(e) => {
                self.stats.interrupt_errors += 1;
                let now = self.transport.hal_mut().millis();
                log_error_throttled!(self.irq_error_throttle, now, "Failed to poll DIO0: {e}");
                false
            }
        }
    }

    /// RSSI of the last packet in dBm
    pub fn packet_rssi(&mut self) -> Result<i16, LoRaError> {
        let raw = self.read(REG_PKT_RSSI_VALUE)? as i16;
        let offset = if self.frequency_hz < RSSI_HF_THRESHOLD_HZ {
            RSSI_OFFSET_LF
        } else {
            RSSI_OFFSET_HF
        };
        Ok(raw - offset)
    }

    /// SNR of the last packet in dB
    pub fn packet_snr(&mut self) -> Result<f32, LoRaError> {
        let raw = self.read(REG_PKT_SNR_VALUE)? as i8;
        Ok(raw as f32 * 0.25)
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Read all 128 registers
    pub fn dump_registers(&mut self) -> Result<[u8; REGISTER_COUNT], LoRaError> {
        let mut registers = [0u8; REGISTER_COUNT];
        for (address, value) in registers.iter_mut().enumerate() {
            *value = self.read(address as u8)?;
        }
        Ok(registers)
    }

    /// Pulse the status LED `times` times
    pub fn blink_led(&mut self, times: u32, on_ms: u32, off_ms: u32) -> Result<(), LoRaError> {
        let hal = self.transport.hal_mut();
        for _ in 0..times {
            hal.gpio_write(Pin::Led, true)?;
            hal.delay_ms(on_ms);
            hal.gpio_write(Pin::Led, false)?;
            hal.delay_ms(off_ms);
        }
        Ok(())
    }

    pub fn stats(&self) -> &RadioStats {
        &self.stats
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Carrier frequency currently programmed
    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Frame counter of the session, 0 without one
    pub fn frame_counter(&self) -> u16 {
        self.session.as_ref().map_or(0, Session::frame_counter)
    }

    /// Advance the session frame counter after a successful send
    pub fn increment_frame_counter(&mut self) -> u16 {
        self.session
            .as_mut()
            .map_or(0, Session::increment_frame_counter)
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Shared handle on the bus lock for a platform interrupt dispatcher
    pub fn lock_handle(&self) -> BusLock {
        self.lock.clone()
    }

    pub fn hal(&self) -> &H {
        self.transport.hal()
    }

    /// Release the HAL, consuming the driver
    pub fn into_hal(self) -> H {
        self.transport.into_inner()
    }
}
