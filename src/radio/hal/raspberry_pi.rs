//! # Raspberry Pi HAL Implementation
//!
//! [`Hal`] for a SX127x breakout (RFM95/96, Dragino and similar HATs) wired to the
//! 40-pin header of a Raspberry Pi 4 or 5, using `rppal` for SPI and GPIO.
//!
//! ## Wiring (BCM numbering, defaults of [`GpioPins`])
//! ```text
//! Pi Pin │ BCM GPIO │ SX127x Pin │ Function
//! ───────┼──────────┼────────────┼─────────────────────
//! 19     │ GPIO 10  │ MOSI       │ SPI data out
//! 21     │ GPIO 9   │ MISO       │ SPI data in
//! 23     │ GPIO 11  │ SCK        │ SPI clock
//! 22     │ GPIO 25  │ NSS        │ Chip select (GPIO)
//! 11     │ GPIO 17  │ RESET      │ Reset (active low)
//! 7      │ GPIO 4   │ DIO0       │ RxDone / TxDone
//! ```
//!
//! NSS is driven as a plain GPIO so that the address and data bytes of a register
//! access share one chip-select window; the controller's own CE line stays unused.
//!
//! SPI must be enabled in `/boot/config.txt` (`dtparam=spi=on`).

use crate::radio::hal::{Hal, HalError, Pin};
use log::{debug, error, info};
use rppal::gpio::{Gpio, InputPin, Level, OutputPin, Trigger};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// SPI clock used for the SX127x (the chip accepts up to 10 MHz)
pub const SPI_CLOCK_HZ: u32 = 5_000_000;

/// GPIO pin assignment, BCM numbering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpioPins {
    /// SPI bus (0 or 1)
    pub spi_bus: u8,
    /// NSS chip select (output)
    pub chip_select: u8,
    /// RESET (output, active low)
    pub reset: u8,
    /// DIO0 (input, interrupt source)
    pub dio0: u8,
    /// Status LED (output, optional)
    pub led: Option<u8>,
}

impl Default for GpioPins {
    fn default() -> Self {
        Self {
            spi_bus: 0,
            chip_select: 25,
            reset: 17,
            dio0: 4,
            led: None,
        }
    }
}

/// Raspberry Pi HAL for one SX127x
pub struct RaspberryPiHal {
    spi: Spi,
    chip_select: OutputPin,
    reset: OutputPin,
    dio0: InputPin,
    led: Option<OutputPin>,
    /// Set from the rppal interrupt thread on every DIO0 rising edge
    rx_edge: Arc<AtomicBool>,
    interrupt_enabled: bool,
    epoch: Instant,
}

impl RaspberryPiHal {
    /// Open the SPI bus and claim the control pins
    ///
    /// # Arguments
    ///
    /// * `pins` - GPIO and SPI bus assignment
    ///
    /// # Returns
    ///
    /// * `Ok(RaspberryPiHal)` - Pins claimed, chip select and reset idle high
    /// * `Err(HalError)` - SPI bus or GPIO could not be opened
    pub fn new(pins: &GpioPins) -> Result<Self, HalError> {
        let bus = match pins.spi_bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            other => {
                return Err(HalError::InvalidConfig(format!(
                    "Invalid SPI bus {other}, only 0 and 1 are supported"
                )))
            }
        };

        let spi = Spi::new(bus, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0).map_err(|e| {
            error!("SPI{} initialization failed: {e}", pins.spi_bus);
            HalError::Spi
        })?;

        let gpio = Gpio::new().map_err(|e| {
            error!("GPIO initialization failed: {e}");
            HalError::Gpio
        })?;

        let claim = |pin: u8| {
            gpio.get(pin).map_err(|e| {
                error!("GPIO {pin} unavailable: {e}");
                HalError::Gpio
            })
        };

        let mut chip_select = claim(pins.chip_select)?.into_output();
        chip_select.set_high();
        let mut reset = claim(pins.reset)?.into_output();
        reset.set_high();
        let dio0 = claim(pins.dio0)?.into_input();
        let led = match pins.led {
            Some(pin) => {
                let mut led = claim(pin)?.into_output();
                led.set_low();
                Some(led)
            }
            None => None,
        };

        info!("Raspberry Pi HAL initialized:");
        info!("  SPI: SPI{} at {} Hz", pins.spi_bus, SPI_CLOCK_HZ);
        info!("  NSS: GPIO {}", pins.chip_select);
        info!("  RESET: GPIO {}", pins.reset);
        info!("  DIO0: GPIO {}", pins.dio0);
        if let Some(pin) = pins.led {
            info!("  LED: GPIO {pin}");
        }

        Ok(Self {
            spi,
            chip_select,
            reset,
            dio0,
            led,
            rx_edge: Arc::new(AtomicBool::new(false)),
            interrupt_enabled: false,
            epoch: Instant::now(),
        })
    }

    fn output(&mut self, pin: Pin) -> Result<&mut OutputPin, HalError> {
        match pin {
            Pin::ChipSelect => Ok(&mut self.chip_select),
            Pin::Reset => Ok(&mut self.reset),
            Pin::Led => self
                .led
                .as_mut()
                .ok_or_else(|| HalError::InvalidConfig("LED pin not configured".to_string())),
            Pin::Dio0 => Err(HalError::InvalidConfig("DIO0 is an input".to_string())),
        }
    }
}

impl Hal for RaspberryPiHal {
    fn spi_transfer(&mut self, byte: u8) -> Result<u8, HalError> {
        let mut read = [0u8; 1];
        self.spi.transfer(&mut read, &[byte]).map_err(|e| {
            error!("SPI transfer failed: {e}");
            HalError::Spi
        })?;
        Ok(read[0])
    }

    fn gpio_write(&mut self, pin: Pin, high: bool) -> Result<(), HalError> {
        let output = self.output(pin)?;
        if high {
            output.set_high();
        } else {
            output.set_low();
        }
        Ok(())
    }

    fn gpio_read(&mut self, pin: Pin) -> Result<bool, HalError> {
        match pin {
            Pin::Dio0 => Ok(self.dio0.read() == Level::High),
            Pin::ChipSelect => Ok(self.chip_select.is_set_high()),
            Pin::Reset => Ok(self.reset.is_set_high()),
            Pin::Led => self
                .led
                .as_ref()
                .map(|led| led.is_set_high())
                .ok_or_else(|| HalError::InvalidConfig("LED pin not configured".to_string())),
        }
    }

    fn set_rx_interrupt(&mut self, enabled: bool) -> Result<(), HalError> {
        if enabled == self.interrupt_enabled {
            return Ok(());
        }

        if enabled {
            let rx_edge = Arc::clone(&self.rx_edge);
            self.dio0
                .set_async_interrupt(Trigger::RisingEdge, None, move |_event| {
                    rx_edge.store(true, Ordering::Release);
                })
                .map_err(|e| {
                    error!("Failed to set DIO0 interrupt: {e}");
                    HalError::Interrupt
                })?;
            debug!("DIO0 rising-edge interrupt enabled");
        } else {
            self.dio0.clear_async_interrupt().map_err(|e| {
                error!("Failed to clear DIO0 interrupt: {e}");
                HalError::Interrupt
            })?;
            self.rx_edge.store(false, Ordering::Release);
            debug!("DIO0 interrupt disabled");
        }

        self.interrupt_enabled = enabled;
        Ok(())
    }

    fn take_rx_interrupt(&mut self) -> Result<bool, HalError> {
        Ok(self.rx_edge.swap(false, Ordering::AcqRel))
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }

    fn millis(&mut self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}
