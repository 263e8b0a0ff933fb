//! # Application Configuration
//!
//! JSON configuration for a node: radio parameters, the ABP session, the board
//! wiring and the send schedule. Every section has defaults, so a file only needs
//! the keys it changes.
//!
//! ```json
//! {
//!   "radio": { "spreading_factor": 7, "sync_word": 52, "enable_crc": true },
//!   "session": {
//!     "dev_addr": "26011BDA",
//!     "nwk_skey": "2B7E151628AED2A6ABF7158809CF4F3C",
//!     "app_skey": "2B7E151628AED2A6ABF7158809CF4F3C",
//!     "region": "EU"
//!   },
//!   "device": { "spi_bus": 0, "ss": 25, "reset": 17, "dio0": 4, "led": 27 }
//! }
//! ```

use crate::error::LoRaError;
use crate::lorawan::{AesKey, DevAddr, Session, DEFAULT_FPORT};
use crate::radio::RadioConfig;
use crate::schedule::ScheduleConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub radio: RadioConfig,
    pub session: Option<SessionConfig>,
    pub device: Option<DeviceConfig>,
    pub schedule: ScheduleConfig,
}

impl AppConfig {
    /// Load and parse a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoRaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| LoRaError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, LoRaError> {
        serde_json::from_str(text).map_err(|e| LoRaError::Config(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, LoRaError> {
        serde_json::to_string_pretty(self).map_err(|e| LoRaError::Config(e.to_string()))
    }

    /// The configured session, or a `Config` error if the file has none
    pub fn session(&self) -> Result<Session, LoRaError> {
        self.session
            .as_ref()
            .ok_or_else(|| LoRaError::Config("missing \"session\" section".to_string()))?
            .to_session()
    }
}

/// ABP session credentials as hex strings
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SessionConfig {
    /// Device address, big-endian hex (e.g. `"26011BDA"`)
    pub dev_addr: String,
    pub nwk_skey: String,
    pub app_skey: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_fport")]
    pub fport: u8,
    /// Frame counter to resume from
    #[serde(default)]
    pub frame_counter: u16,
}

fn default_region() -> String {
    "EU".to_string()
}

fn default_fport() -> u8 {
    DEFAULT_FPORT
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("dev_addr", &self.dev_addr)
            .field("nwk_skey", &"<redacted>")
            .field("app_skey", &"<redacted>")
            .field("region", &self.region)
            .field("fport", &self.fport)
            .field("frame_counter", &self.frame_counter)
            .finish()
    }
}

impl SessionConfig {
    /// Parse the hex fields into a [`Session`]
    pub fn to_session(&self) -> Result<Session, LoRaError> {
        let dev_addr = DevAddr::from_hex(&self.dev_addr)
            .map_err(|e| LoRaError::Config(format!("dev_addr: {e}")))?;
        let nwk_skey = AesKey::from_hex(&self.nwk_skey)
            .map_err(|e| LoRaError::Config(format!("nwk_skey: {e}")))?;
        let app_skey = AesKey::from_hex(&self.app_skey)
            .map_err(|e| LoRaError::Config(format!("app_skey: {e}")))?;

        Ok(
            Session::with_region_code(dev_addr, nwk_skey, app_skey, &self.region)?
                .with_fport(self.fport)
                .with_frame_counter(self.frame_counter),
        )
    }
}

/// Board wiring, BCM pin numbering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub spi_bus: u8,
    /// NSS chip select
    pub ss: u8,
    pub reset: u8,
    pub dio0: u8,
    pub led: Option<u8>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            spi_bus: 0,
            ss: 25,
            reset: 17,
            dio0: 4,
            led: None,
        }
    }
}

#[cfg(feature = "raspberry-pi")]
impl DeviceConfig {
    pub fn gpio_pins(&self) -> crate::radio::hal::GpioPins {
        crate::radio::hal::GpioPins {
            spi_bus: self.spi_bus,
            chip_select: self.ss,
            reset: self.reset,
            dio0: self.dio0,
            led: self.led,
        }
    }
}
