//! Common types used in the protocol.

use crate::constants::*;

/// A 32-byte public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; PUB_KEY_SIZE]);

impl PublicKey {
    /// Create a new public key from bytes.
    pub fn new(bytes: [u8; PUB_KEY_SIZE]) -> Self {
        PublicKey(bytes)
    }

    /// Create from a slice. Returns None if slice is too short.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() >= PUB_KEY_SIZE {
            let mut bytes = [0u8; PUB_KEY_SIZE];
            bytes.copy_from_slice(&slice[..PUB_KEY_SIZE]);
            Some(PublicKey(bytes))
        } else {
            None
        }
    }

    /// Get the 6-byte prefix used in push messages.
    pub fn prefix(&self) -> PublicKeyPrefix {
        let mut bytes = [0u8; PUB_KEY_PREFIX_SIZE];
        bytes.copy_from_slice(&self.0[..PUB_KEY_PREFIX_SIZE]);
        PublicKeyPrefix(bytes)
    }

    /// First key byte, used as the truncated path-hash identifier.
    pub fn path_hash(&self) -> u8 {
        self.0[0]
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; PUB_KEY_SIZE] {
        &self.0
    }
}

impl Default for PublicKey {
    fn default() -> Self {
        PublicKey([0u8; PUB_KEY_SIZE])
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A 6-byte public key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKeyPrefix(pub [u8; PUB_KEY_PREFIX_SIZE]);

impl PublicKeyPrefix {
    /// Create from a slice. Returns None if slice is too short.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() >= PUB_KEY_PREFIX_SIZE {
            let mut bytes = [0u8; PUB_KEY_PREFIX_SIZE];
            bytes.copy_from_slice(&slice[..PUB_KEY_PREFIX_SIZE]);
            Some(PublicKeyPrefix(bytes))
        } else {
            None
        }
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; PUB_KEY_PREFIX_SIZE] {
        &self.0
    }
}

/// Contact information stored on the device.
///
/// Identity is the public key; `name` is operator-assigned and not
/// guaranteed unique.
#[derive(Debug, Clone)]
pub struct ContactInfo {
    /// Contact's public key.
    pub public_key: PublicKey,
    /// Contact type (chat, repeater, room server).
    pub contact_type: u8,
    /// Contact flags.
    pub flags: u8,
    /// Outbound path length (-1 if unknown/flood).
    pub out_path_len: i8,
    /// Contact name (up to 31 chars).
    pub name: String,
    /// GPS latitude in microdegrees.
    pub gps_lat: i32,
    /// GPS longitude in microdegrees.
    pub gps_lon: i32,
}

impl ContactInfo {
    /// Get latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.gps_lat as f64 / 1_000_000.0
    }

    /// Get longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.gps_lon as f64 / 1_000_000.0
    }

    /// True if the contact advertises a position.
    pub fn has_position(&self) -> bool {
        self.gps_lat != 0 || self.gps_lon != 0
    }
}

/// Self/node information returned by CMD_APP_START.
#[derive(Debug, Clone)]
pub struct SelfInfo {
    /// Node's public key.
    pub public_key: PublicKey,
    /// Node name.
    pub name: String,
    /// GPS latitude in microdegrees.
    pub gps_lat: i32,
    /// GPS longitude in microdegrees.
    pub gps_lon: i32,
    /// Current TX power in dBm.
    pub tx_power_dbm: u8,
    /// Maximum TX power supported.
    pub max_tx_power_dbm: u8,
}

impl SelfInfo {
    /// Get latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.gps_lat as f64 / 1_000_000.0
    }

    /// Get longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.gps_lon as f64 / 1_000_000.0
    }

    /// True if the node advertises a position.
    pub fn has_position(&self) -> bool {
        self.gps_lat != 0 || self.gps_lon != 0
    }
}

/// Core statistics (battery, uptime, errors, queue length).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreStats {
    /// Battery voltage in millivolts.
    pub battery_mv: u16,
    /// Uptime in seconds.
    pub uptime_secs: u32,
    /// Error flags bitmask.
    pub error_flags: u16,
    /// Outbound queue length.
    pub queue_len: u8,
}

/// Radio statistics (noise floor, RSSI, SNR, airtime).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RadioStats {
    /// Noise floor in dBm.
    pub noise_floor: i16,
    /// Last RSSI in dBm.
    pub last_rssi: i8,
    /// Last SNR, device-native scaling (dB x4).
    pub last_snr_x4: i8,
    /// Cumulative TX airtime in seconds.
    pub tx_air_secs: u32,
    /// Cumulative RX airtime in seconds.
    pub rx_air_secs: u32,
}

impl RadioStats {
    /// Get the last SNR in dB.
    pub fn last_snr(&self) -> f64 {
        self.last_snr_x4 as f64 / 4.0
    }
}

/// Packet statistics, split by flood vs. direct routing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketStats {
    /// Total packets received (at radio level).
    pub recv: u32,
    /// Total packets sent (at radio level).
    pub sent: u32,
    /// Flood packets sent.
    pub sent_flood: u32,
    /// Direct packets sent.
    pub sent_direct: u32,
    /// Flood packets received.
    pub recv_flood: u32,
    /// Direct packets received.
    pub recv_direct: u32,
}

/// Radio parameters.
#[derive(Debug, Clone, Copy)]
pub struct RadioParams {
    /// Frequency in kHz.
    pub freq_khz: u32,
    /// Bandwidth in Hz.
    pub bandwidth_hz: u32,
    /// Spreading factor (5-12).
    pub spreading_factor: u8,
    /// Coding rate (5-8).
    pub coding_rate: u8,
}

/// A regional radio preset.
#[derive(Debug, Clone, Copy)]
pub struct RadioRegion {
    /// Region code.
    pub code: &'static str,
    /// Radio parameters for the region.
    pub params: RadioParams,
}

/// Built-in regional presets.
pub const REGIONS: &[RadioRegion] = &[
    RadioRegion {
        code: "US",
        params: RadioParams {
            freq_khz: 910_525,
            bandwidth_hz: 62_500,
            spreading_factor: 7,
            coding_rate: 5,
        },
    },
    RadioRegion {
        code: "EU",
        params: RadioParams {
            freq_khz: 869_525,
            bandwidth_hz: 250_000,
            spreading_factor: 10,
            coding_rate: 5,
        },
    },
    RadioRegion {
        code: "AU",
        params: RadioParams {
            freq_khz: 915_000,
            bandwidth_hz: 250_000,
            spreading_factor: 10,
            coding_rate: 5,
        },
    },
    RadioRegion {
        code: "NZ",
        params: RadioParams {
            freq_khz: 915_000,
            bandwidth_hz: 250_000,
            spreading_factor: 10,
            coding_rate: 5,
        },
    },
];

/// Look up a regional preset by code, case-insensitively.
pub fn region_by_code(code: &str) -> Option<&'static RadioRegion> {
    REGIONS.iter().find(|r| r.code.eq_ignore_ascii_case(code))
}

/// Owner info returned in a binary response push.
#[derive(Debug, Clone, Default)]
pub struct OwnerInfo {
    /// Firmware version string.
    pub version: String,
    /// Node name.
    pub node_name: String,
    /// Free-form owner contact info.
    pub owner_info: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_lookup_case_insensitive() {
        assert_eq!(region_by_code("us").unwrap().params.freq_khz, 910_525);
        assert_eq!(region_by_code("Eu").unwrap().params.bandwidth_hz, 250_000);
        assert!(region_by_code("JP").is_none());
    }

    #[test]
    fn test_public_key_path_hash() {
        let mut bytes = [0u8; PUB_KEY_SIZE];
        bytes[0] = 0xAB;
        let key = PublicKey::new(bytes);
        assert_eq!(key.path_hash(), 0xAB);
    }

    #[test]
    fn test_snr_scaling() {
        let stats = RadioStats {
            last_snr_x4: 10,
            ..Default::default()
        };
        assert_eq!(stats.last_snr(), 2.5);
    }
}
