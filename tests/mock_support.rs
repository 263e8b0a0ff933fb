//! Register-level SX127x simulator for driver tests
//!
//! `MockHal` decodes the two-byte chip-select windows produced by the register
//! transport and keeps a register file, the 256-byte FIFO and the IRQ flags. Clones
//! share state, so a test keeps one clone to inspect the radio after handing the
//! other to the driver.

#![allow(dead_code)]

use lora_sx127x::radio::hal::{Hal, HalError, Pin};
use lora_sx127x::radio::registers::*;
use std::sync::{Arc, Mutex, MutexGuard};

/// One decoded register access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusOp {
    pub write: bool,
    pub address: u8,
    pub value: u8,
}

#[derive(Debug)]
struct State {
    registers: [u8; REGISTER_COUNT],
    fifo: [u8; 256],
    version: u8,
    selected: bool,
    byte_index: usize,
    address: u8,
    reset_low: bool,
    resets: u32,
    bus_log: Vec<BusOp>,
    tx_packets: Vec<Vec<u8>>,
    tx_never_completes: bool,
    fail_spi: bool,
    interrupt_enabled: bool,
    edge_latched: bool,
    led: bool,
    led_pulses: u32,
    now_ms: u64,
}

impl State {
    fn new(version: u8) -> Self {
        Self {
            registers: [0; REGISTER_COUNT],
            fifo: [0; 256],
            version,
            selected: false,
            byte_index: 0,
            address: 0,
            reset_low: false,
            resets: 0,
            bus_log: Vec::new(),
            tx_packets: Vec::new(),
            tx_never_completes: false,
            fail_spi: false,
            interrupt_enabled: false,
            edge_latched: false,
            led: false,
            led_pulses: 0,
            now_ms: 0,
        }
    }

    fn power_on_reset(&mut self) {
        self.registers = [0; REGISTER_COUNT];
        self.registers[REG_OP_MODE as usize] = MODE_STDBY;
        self.registers[REG_LNA as usize] = 0x20;
        self.registers[REG_MODEM_CONFIG_1 as usize] = 0x72;
        self.registers[REG_MODEM_CONFIG_2 as usize] = 0x70;
        self.registers[REG_PREAMBLE_LSB as usize] = 0x08;
        self.registers[REG_PAYLOAD_LENGTH as usize] = 0x01;
        self.registers[REG_SYNC_WORD as usize] = 0x12;
        self.registers[REG_FIFO_TX_BASE_ADDR as usize] = 0x80;
        self.resets += 1;
    }

    fn fifo_ptr(&mut self) -> &mut u8 {
        &mut self.registers[REG_FIFO_ADDR_PTR as usize]
    }

    fn read(&mut self, address: u8) -> u8 {
        match address {
            REG_FIFO => {
                let ptr = *self.fifo_ptr();
                *self.fifo_ptr() = ptr.wrapping_add(1);
                self.fifo[ptr as usize]
            }
            REG_VERSION => self.version,
            _ => self.registers[address as usize],
        }
    }

    fn write(&mut self, address: u8, value: u8) {
        match address {
            REG_FIFO => {
                let ptr = *self.fifo_ptr();
                self.fifo[ptr as usize] = value;
                *self.fifo_ptr() = ptr.wrapping_add(1);
            }
            REG_IRQ_FLAGS => self.registers[address as usize] &= !value,
            REG_OP_MODE => {
                self.registers[address as usize] = value;
                if value & MODE_MASK == MODE_TX {
                    self.start_tx();
                }
            }
            REG_VERSION => {}
            _ => self.registers[address as usize] = value,
        }
    }

    fn start_tx(&mut self) {
        let base = self.registers[REG_FIFO_TX_BASE_ADDR as usize] as usize;
        let length = self.registers[REG_PAYLOAD_LENGTH as usize] as usize;
        let packet = (0..length).map(|i| self.fifo[(base + i) % 256]).collect();
        self.tx_packets.push(packet);

        if !self.tx_never_completes {
            self.registers[REG_IRQ_FLAGS as usize] |= IrqFlags::TX_DONE.bits();
            self.enter_standby();
        }
    }

    fn enter_standby(&mut self) {
        let op_mode = &mut self.registers[REG_OP_MODE as usize];
        *op_mode = (*op_mode & !MODE_MASK) | MODE_STDBY;
    }

    fn mode_bits(&self) -> u8 {
        self.registers[REG_OP_MODE as usize] & MODE_MASK
    }
}

/// Simulated SX127x behind the [`Hal`] trait
#[derive(Debug, Clone)]
pub struct MockHal {
    state: Arc<Mutex<State>>,
}

impl Default for MockHal {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHal {
    pub fn new() -> Self {
        Self::with_version(SX127X_VERSION)
    }

    /// A chip whose version register reads `version`
    pub fn with_version(version: u8) -> Self {
        let mut state = State::new(version);
        state.power_on_reset();
        state.resets = 0;
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn register(&self, address: u8) -> u8 {
        self.state().registers[address as usize]
    }

    pub fn set_register(&self, address: u8, value: u8) {
        self.state().registers[address as usize] = value;
    }

    pub fn frf(&self) -> [u8; 3] {
        let state = self.state();
        [
            state.registers[REG_FRF_MSB as usize],
            state.registers[REG_FRF_MID as usize],
            state.registers[REG_FRF_LSB as usize],
        ]
    }

    /// Mode bits of REG_OP_MODE
    pub fn mode_bits(&self) -> u8 {
        self.state().mode_bits()
    }

    pub fn resets(&self) -> u32 {
        self.state().resets
    }

    /// Every packet the chip was asked to transmit, in order
    pub fn tx_packets(&self) -> Vec<Vec<u8>> {
        self.state().tx_packets.clone()
    }

    pub fn bus_log(&self) -> Vec<BusOp> {
        self.state().bus_log.clone()
    }

    pub fn clear_bus_log(&self) {
        self.state().bus_log.clear();
    }

    /// Values written to `address`, in order
    pub fn writes_to(&self, address: u8) -> Vec<u8> {
        self.state()
            .bus_log
            .iter()
            .filter(|op| op.write && op.address == address)
            .map(|op| op.value)
            .collect()
    }

    pub fn reads_of(&self, address: u8) -> usize {
        self.state()
            .bus_log
            .iter()
            .filter(|op| !op.write && op.address == address)
            .count()
    }

    /// Leave TX_DONE unset after entering TX
    pub fn set_tx_never_completes(&self, never: bool) {
        self.state().tx_never_completes = never;
    }

    pub fn set_fail_spi(&self, fail: bool) {
        self.state().fail_spi = fail;
    }

    /// Deliver a packet into the FIFO and raise RX_DONE (and PAYLOAD_CRC_ERROR)
    pub fn inject_rx(&self, payload: &[u8], crc_error: bool) {
        let mut state = self.state();
        let base = state.registers[REG_FIFO_RX_BASE_ADDR as usize];
        for (i, &byte) in payload.iter().enumerate() {
            state.fifo[(base as usize + i) % 256] = byte;
        }
        state.registers[REG_FIFO_RX_CURRENT_ADDR as usize] = base;
        state.registers[REG_RX_NB_BYTES as usize] = payload.len() as u8;

        let mut flags = IrqFlags::RX_DONE;
        if crc_error {
            flags |= IrqFlags::PAYLOAD_CRC_ERROR;
        }
        state.registers[REG_IRQ_FLAGS as usize] |= flags.bits();

        if state.mode_bits() == MODE_RX_SINGLE {
            state.enter_standby();
        }
        if state.interrupt_enabled {
            state.edge_latched = true;
        }
    }

    /// Latch a DIO0 edge without any packet behind it
    pub fn raise_edge(&self) {
        self.state().edge_latched = true;
    }

    pub fn interrupt_enabled(&self) -> bool {
        self.state().interrupt_enabled
    }

    pub fn led_pulses(&self) -> u32 {
        self.state().led_pulses
    }

    pub fn now_ms(&self) -> u64 {
        self.state().now_ms
    }
}

impl Hal for MockHal {
    fn spi_transfer(&mut self, byte: u8) -> Result<u8, HalError> {
        let mut state = self.state();
        if state.fail_spi {
            return Err(HalError::Spi);
        }
        assert!(state.selected, "SPI transfer outside a chip-select window");

        let index = state.byte_index;
        state.byte_index += 1;
        match index {
            0 => {
                state.address = byte;
                Ok(0)
            }
            1 => {
                let write = state.address & SPI_WRITE != 0;
                let address = state.address & SPI_READ_MASK;
                let value = if write {
                    state.write(address, byte);
                    byte
                } else {
                    state.read(address)
                };
                state.bus_log.push(BusOp { write, address, value });
                Ok(if write { 0 } else { value })
            }
            _ => panic!("more than two bytes in one chip-select window"),
        }
    }

    fn gpio_write(&mut self, pin: Pin, high: bool) -> Result<(), HalError> {
        let mut state = self.state();
        match pin {
            Pin::ChipSelect => {
                state.selected = !high;
                state.byte_index = 0;
            }
            Pin::Reset => {
                if high && state.reset_low {
                    state.power_on_reset();
                }
                state.reset_low = !high;
            }
            Pin::Led => {
                if high && !state.led {
                    state.led_pulses += 1;
                }
                state.led = high;
            }
            Pin::Dio0 => return Err(HalError::InvalidConfig("DIO0 is an input".to_string())),
        }
        Ok(())
    }

    fn gpio_read(&mut self, pin: Pin) -> Result<bool, HalError> {
        let state = self.state();
        Ok(match pin {
            Pin::Dio0 => {
                let done = IrqFlags::RX_DONE | IrqFlags::TX_DONE;
                state.registers[REG_IRQ_FLAGS as usize] & done.bits() != 0
            }
            Pin::ChipSelect => !state.selected,
            Pin::Reset => !state.reset_low,
            Pin::Led => state.led,
        })
    }

    fn set_rx_interrupt(&mut self, enabled: bool) -> Result<(), HalError> {
        let mut state = self.state();
        state.interrupt_enabled = enabled;
        if !enabled {
            state.edge_latched = false;
        }
        Ok(())
    }

    fn take_rx_interrupt(&mut self) -> Result<bool, HalError> {
        let mut state = self.state();
        Ok(std::mem::replace(&mut state.edge_latched, false))
    }

    fn delay_ms(&mut self, ms: u32) {
        self.state().now_ms += ms as u64;
    }

    fn millis(&mut self) -> u64 {
        self.state().now_ms
    }
}
