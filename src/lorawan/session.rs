//! LoRaWAN ABP session context: device address, session keys, region and the
//! uplink frame counter.

use crate::error::LoRaError;
use crate::lorawan::region::Region;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-128 session key, wiped from memory on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AesKey {
    key: [u8; 16],
}

impl AesKey {
    pub const fn new(key: [u8; 16]) -> Self {
        Self { key }
    }

    /// Create AES key from a byte slice
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoRaError> {
        let key: [u8; 16] = bytes.try_into().map_err(|_| {
            LoRaError::InvalidConfig(format!("AES key must be 16 bytes, got {}", bytes.len()))
        })?;
        Ok(Self { key })
    }

    /// Create AES key from 32 hex characters
    pub fn from_hex(hex_str: &str) -> Result<Self, LoRaError> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| LoRaError::Config(format!("invalid AES key hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.key
    }
}

impl std::fmt::Debug for AesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesKey(..)")
    }
}

/// 4-byte device address, stored most significant byte first.
///
/// LoRaWAN puts it on the wire (and into the cipher blocks) least significant
/// byte first; see [`DevAddr::wire_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevAddr([u8; 4]);

impl DevAddr {
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, LoRaError> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| LoRaError::Config(format!("invalid DevAddr hex: {e}")))?;
        let addr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
            LoRaError::InvalidConfig(format!("DevAddr must be 4 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(addr))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Byte-reversed address as it appears in FHDR, A_i and B_0
    pub fn wire_bytes(&self) -> [u8; 4] {
        [self.0[3], self.0[2], self.0[1], self.0[0]]
    }

    pub fn from_wire_bytes(wire: [u8; 4]) -> Self {
        Self([wire[3], wire[2], wire[1], wire[0]])
    }
}

impl std::fmt::Display for DevAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

/// Default application port for uplinks
pub const DEFAULT_FPORT: u8 = 1;

/// Session context for one logical sender.
///
/// The frame counter is owned by the caller: read it with [`Session::frame_counter`],
/// send with that value, then call [`Session::increment_frame_counter`] once the
/// send succeeded. It wraps silently at 65536.
#[derive(Debug, Clone)]
pub struct Session {
    dev_addr: DevAddr,
    nwk_skey: AesKey,
    app_skey: AesKey,
    region: Region,
    fport: u8,
    frame_counter: u16,
}

impl Session {
    pub fn new(dev_addr: DevAddr, nwk_skey: AesKey, app_skey: AesKey, region: Region) -> Self {
        Self {
            dev_addr,
            nwk_skey,
            app_skey,
            region,
            fport: DEFAULT_FPORT,
            frame_counter: 0,
        }
    }

    /// Build a session from a region code such as `"EU"`; unknown codes fail.
    pub fn with_region_code(
        dev_addr: DevAddr,
        nwk_skey: AesKey,
        app_skey: AesKey,
        region_code: &str,
    ) -> Result<Self, LoRaError> {
        let region: Region = region_code.parse()?;
        Ok(Self::new(dev_addr, nwk_skey, app_skey, region))
    }

    pub fn with_fport(mut self, fport: u8) -> Self {
        self.fport = fport;
        self
    }

    /// Resume from a persisted frame counter
    pub fn with_frame_counter(mut self, frame_counter: u16) -> Self {
        self.frame_counter = frame_counter;
        self
    }

    pub fn dev_addr(&self) -> &DevAddr {
        &self.dev_addr
    }

    pub fn nwk_skey(&self) -> &AesKey {
        &self.nwk_skey
    }

    pub fn app_skey(&self) -> &AesKey {
        &self.app_skey
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn fport(&self) -> u8 {
        self.fport
    }

    pub fn frame_counter(&self) -> u16 {
        self.frame_counter
    }

    /// Advance after a successful send; returns the new value
    pub fn increment_frame_counter(&mut self) -> u16 {
        self.frame_counter = self.frame_counter.wrapping_add(1);
        self.frame_counter
    }
}
