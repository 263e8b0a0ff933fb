//! # SPI Register Transport
//!
//! Framing of single-register accesses on the SX127x SPI interface. Every access is
//! one chip-select window carrying two bytes: the address (bit 7 set for a write)
//! followed by the data byte. The byte clocked in during the second exchange is the
//! register value.

use crate::radio::hal::{Hal, HalError, Pin};
use crate::radio::registers::{SPI_READ_MASK, SPI_WRITE};

/// Register-level access to the radio over a [`Hal`].
///
/// Not reentrant: the driver serialises callers with its bus lock.
pub struct RegisterTransport<H: Hal> {
    hal: H,
}

impl<H: Hal> RegisterTransport<H> {
    pub fn new(hal: H) -> Self {
        Self { hal }
    }

    /// Exchange `address` and `value` inside one chip-select window.
    ///
    /// Chip select is released even when the exchange fails, so a bus error never
    /// leaves the radio selected.
    pub fn transfer(&mut self, address: u8, value: u8) -> Result<u8, HalError> {
        self.hal.gpio_write(Pin::ChipSelect, false)?;

        let exchanged = self
            .hal
            .spi_transfer(address)
            .and_then(|_| self.hal.spi_transfer(value));

        let released = self.hal.gpio_write(Pin::ChipSelect, true);
        let response = exchanged?;
        released?;
        Ok(response)
    }

    /// Read a single register
    pub fn read_register(&mut self, address: u8) -> Result<u8, HalError> {
        self.transfer(address & SPI_READ_MASK, 0x00)
    }

    /// Write a single register
    pub fn write_register(&mut self, address: u8, value: u8) -> Result<(), HalError> {
        self.transfer(address | SPI_WRITE, value)?;
        Ok(())
    }

    /// Read-modify-write: keep the bits in `keep_mask`, then OR in `bits`
    pub fn update_register(
        &mut self,
        address: u8,
        keep_mask: u8,
        bits: u8,
    ) -> Result<(), HalError> {
        let current = self.read_register(address)?;
        self.write_register(address, (current & keep_mask) | bits)
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    /// Give back the HAL, consuming the transport
    pub fn into_inner(self) -> H {
        self.hal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every pin edge and SPI byte in order
    #[derive(Default)]
    struct TraceHal {
        trace: Vec<String>,
        miso: u8,
        fail_spi: bool,
    }

    impl Hal for TraceHal {
        fn spi_transfer(&mut self, byte: u8) -> Result<u8, HalError> {
            if self.fail_spi {
                return Err(HalError::Spi);
            }
            self.trace.push(format!("spi {byte:02X}"));
            Ok(self.miso)
        }

        fn gpio_write(&mut self, pin: Pin, high: bool) -> Result<(), HalError> {
            self.trace.push(format!("{pin:?} {}", if high { "high" } else { "low" }));
            Ok(())
        }

        fn gpio_read(&mut self, _pin: Pin) -> Result<bool, HalError> {
            Ok(false)
        }

        fn set_rx_interrupt(&mut self, _enabled: bool) -> Result<(), HalError> {
            Ok(())
        }

        fn take_rx_interrupt(&mut self) -> Result<bool, HalError> {
            Ok(false)
        }

        fn delay_ms(&mut self, _ms: u32) {}

        fn millis(&mut self) -> u64 {
            0
        }
    }

    #[test]
    fn test_read_clears_write_bit() {
        let mut transport = RegisterTransport::new(TraceHal {
            miso: 0x12,
            ..Default::default()
        });

        assert_eq!(transport.read_register(0x42 | 0x80).unwrap(), 0x12);
        assert_eq!(
            transport.hal().trace,
            vec!["ChipSelect low", "spi 42", "spi 00", "ChipSelect high"]
        );
    }

    #[test]
    fn test_write_sets_write_bit() {
        let mut transport = RegisterTransport::new(TraceHal::default());
        transport.write_register(0x01, 0x81).unwrap();
        assert_eq!(
            transport.hal().trace,
            vec!["ChipSelect low", "spi 81", "spi 81", "ChipSelect high"]
        );
    }

    #[test]
    fn test_chip_select_released_on_spi_failure() {
        let mut transport = RegisterTransport::new(TraceHal {
            fail_spi: true,
            ..Default::default()
        });

        assert!(matches!(transport.read_register(0x42), Err(HalError::Spi)));
        assert_eq!(transport.hal().trace, vec!["ChipSelect low", "ChipSelect high"]);
    }
}
