//! # Regional Frequency Plans
//!
//! Eight uplink channels per supported region, each stored as the carrier
//! frequency and the matching 3-byte FRF register value
//! (`round(f * 2^19 / 32 MHz)`, MSB first). Register values are constants; nothing
//! is recomputed at runtime.

use crate::error::LoRaError;
use std::fmt;
use std::str::FromStr;

/// Channels in every regional plan
pub const CHANNELS_PER_REGION: usize = 8;

/// One uplink channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub frequency_hz: u32,
    /// REG_FRF_MSB, REG_FRF_MID, REG_FRF_LSB
    pub frf: [u8; 3],
}

impl Channel {
    const fn new(frequency_hz: u32, frf: [u8; 3]) -> Self {
        Self { frequency_hz, frf }
    }
}

/// Supported LoRaWAN regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Eu868,
    Us915,
    Au915,
    As923,
}

const EU868_CHANNELS: [Channel; CHANNELS_PER_REGION] = [
    Channel::new(868_100_000, [0xD9, 0x06, 0x66]),
    Channel::new(868_300_000, [0xD9, 0x13, 0x33]),
    Channel::new(868_500_000, [0xD9, 0x20, 0x00]),
    Channel::new(867_100_000, [0xD8, 0xC6, 0x66]),
    Channel::new(867_300_000, [0xD8, 0xD3, 0x33]),
    Channel::new(867_500_000, [0xD8, 0xE0, 0x00]),
    Channel::new(867_700_000, [0xD8, 0xEC, 0xCD]),
    Channel::new(867_900_000, [0xD8, 0xF9, 0x9A]),
];

const US915_CHANNELS: [Channel; CHANNELS_PER_REGION] = [
    Channel::new(903_900_000, [0xE1, 0xF9, 0x9A]),
    Channel::new(904_100_000, [0xE2, 0x06, 0x66]),
    Channel::new(904_300_000, [0xE2, 0x13, 0x33]),
    Channel::new(904_500_000, [0xE2, 0x20, 0x00]),
    Channel::new(904_700_000, [0xE2, 0x2C, 0xCD]),
    Channel::new(904_900_000, [0xE2, 0x39, 0x9A]),
    Channel::new(905_100_000, [0xE2, 0x46, 0x66]),
    Channel::new(905_300_000, [0xE2, 0x53, 0x33]),
];

const AU915_CHANNELS: [Channel; CHANNELS_PER_REGION] = [
    Channel::new(916_800_000, [0xE5, 0x33, 0x33]),
    Channel::new(917_000_000, [0xE5, 0x40, 0x00]),
    Channel::new(917_200_000, [0xE5, 0x4C, 0xCD]),
    Channel::new(917_400_000, [0xE5, 0x59, 0x9A]),
    Channel::new(917_600_000, [0xE5, 0x66, 0x66]),
    Channel::new(917_800_000, [0xE5, 0x73, 0x33]),
    Channel::new(918_000_000, [0xE5, 0x80, 0x00]),
    Channel::new(918_200_000, [0xE5, 0x8C, 0xCD]),
];

const AS923_CHANNELS: [Channel; CHANNELS_PER_REGION] = [
    Channel::new(923_200_000, [0xE6, 0xCC, 0xCD]),
    Channel::new(923_400_000, [0xE6, 0xD9, 0x9A]),
    Channel::new(922_200_000, [0xE6, 0x8C, 0xCD]),
    Channel::new(922_400_000, [0xE6, 0x99, 0x9A]),
    Channel::new(922_600_000, [0xE6, 0xA6, 0x66]),
    Channel::new(922_800_000, [0xE6, 0xB3, 0x33]),
    Channel::new(923_000_000, [0xE6, 0xC0, 0x00]),
    Channel::new(922_000_000, [0xE6, 0x80, 0x00]),
];

impl Region {
    pub const ALL: [Region; 4] = [Region::Eu868, Region::Us915, Region::Au915, Region::As923];

    /// Short region code
    pub fn code(self) -> &'static str {
        match self {
            Region::Eu868 => "EU",
            Region::Us915 => "US",
            Region::Au915 => "AU",
            Region::As923 => "AS",
        }
    }

    pub fn channels(self) -> &'static [Channel; CHANNELS_PER_REGION] {
        match self {
            Region::Eu868 => &EU868_CHANNELS,
            Region::Us915 => &US915_CHANNELS,
            Region::Au915 => &AU915_CHANNELS,
            Region::As923 => &AS923_CHANNELS,
        }
    }

    /// Look up one channel by index
    pub fn channel(self, index: usize) -> Result<Channel, LoRaError> {
        self.channels().get(index).copied().ok_or_else(|| {
            LoRaError::InvalidConfig(format!(
                "channel index {index} out of range for {self} (0..{CHANNELS_PER_REGION})"
            ))
        })
    }
}

impl FromStr for Region {
    type Err = LoRaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EU" | "EU868" => Ok(Region::Eu868),
            "US" | "US915" => Ok(Region::Us915),
            "AU" | "AU915" => Ok(Region::Au915),
            "AS" | "AS923" => Ok(Region::As923),
            _ => Err(LoRaError::UnsupportedRegion(s.to_string())),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::Eu868 => "EU868",
            Region::Us915 => "US915",
            Region::Au915 => "AU915",
            Region::As923 => "AS923",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn frf_of(frequency_hz: u32) -> [u8; 3] {
        let frf = ((frequency_hz as u64) << 19) + 16_000_000;
        let frf = frf / 32_000_000;
        [(frf >> 16) as u8, (frf >> 8) as u8, frf as u8]
    }

    #[test]
    fn test_every_region_has_eight_distinct_channels() {
        for region in Region::ALL {
            let triples: HashSet<[u8; 3]> = region.channels().iter().map(|c| c.frf).collect();
            assert_eq!(triples.len(), CHANNELS_PER_REGION, "{region}");
        }
    }

    #[test]
    fn test_register_values_match_frequencies() {
        for region in Region::ALL {
            for channel in region.channels() {
                assert_eq!(
                    channel.frf,
                    frf_of(channel.frequency_hz),
                    "{region} {}",
                    channel.frequency_hz
                );
            }
        }
    }

    #[test]
    fn test_region_codes() {
        assert_eq!("EU".parse::<Region>().unwrap(), Region::Eu868);
        assert_eq!("us915".parse::<Region>().unwrap(), Region::Us915);
        assert_eq!(" au ".parse::<Region>().unwrap(), Region::Au915);
        assert_eq!("AS923".parse::<Region>().unwrap(), Region::As923);
        assert!(matches!("CN470".parse::<Region>(), Err(LoRaError::UnsupportedRegion(_))));
    }

    #[test]
    fn test_channel_lookup() {
        let channel = Region::Eu868.channel(0).unwrap();
        assert_eq!(channel.frequency_hz, 868_100_000);
        assert_eq!(channel.frf, [0xD9, 0x06, 0x66]);
        assert!(matches!(Region::Eu868.channel(8), Err(LoRaError::InvalidConfig(_))));
    }
}
