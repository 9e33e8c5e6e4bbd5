//! Commands that can be sent to the companion firmware.

use crate::constants::*;
use crate::types::*;

/// Commands that can be sent to the companion firmware.
///
/// Each variant encodes to the exact byte layout expected by the firmware;
/// commands are built once per invocation and carry no state.
#[derive(Debug, Clone)]
pub enum Command {
    /// Start the app connection and get self info.
    AppStart,

    /// Get the list of contacts.
    GetContacts,

    /// Get the firmware version string.
    GetVersion,

    /// Set radio parameters.
    SetRadioParams {
        /// Radio parameters.
        params: RadioParams,
    },

    /// Set radio TX power.
    SetRadioTxPower {
        /// TX power in dBm.
        power_dbm: u8,
    },

    /// Reboot the device.
    Reboot,

    /// Send login request to a server.
    SendLogin {
        /// Server's public key.
        public_key: PublicKey,
        /// Password, appended raw with no terminator.
        password: String,
    },

    /// Send status request to a server.
    SendStatusRequest {
        /// Server's public key.
        public_key: PublicKey,
    },

    /// Send owner-info binary request to a server.
    SendOwnerInfoRequest {
        /// Server's public key.
        public_key: PublicKey,
    },

    /// Send telemetry request.
    SendTelemetryRequest {
        /// Target's public key.
        public_key: PublicKey,
    },

    /// Get statistics.
    GetStats {
        /// Stats type (core, radio, or packets).
        stats_type: u8,
    },
}

impl Command {
    /// Get the command opcode.
    pub fn code(&self) -> u8 {
        match self {
            Command::AppStart => CMD_APP_START,
            Command::GetContacts => CMD_GET_CONTACTS,
            Command::GetVersion => CMD_GET_VERSION,
            Command::SetRadioParams { .. } => CMD_SET_RADIO_PARAMS,
            Command::SetRadioTxPower { .. } => CMD_SET_RADIO_TX_POWER,
            Command::Reboot => CMD_REBOOT,
            Command::SendLogin { .. } => CMD_SEND_LOGIN,
            Command::SendStatusRequest { .. } => CMD_SEND_STATUS_REQ,
            Command::SendOwnerInfoRequest { .. } => CMD_SEND_BINARY_REQ,
            Command::SendTelemetryRequest { .. } => CMD_SEND_TELEMETRY_REQ,
            Command::GetStats { .. } => CMD_GET_STATS,
        }
    }

    /// Encode the command to its wire payload (no framing).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);

        match self {
            Command::AppStart => {
                // Fixed 11-byte structure: opcode, version byte, client id,
                // zero padding.
                buf.push(CMD_APP_START);
                buf.push(APP_START_VERSION);
                buf.extend_from_slice(APP_START_CLIENT_ID.as_bytes());
                buf.resize(APP_START_CMD_SIZE, 0);
            }

            Command::GetContacts => {
                buf.push(CMD_GET_CONTACTS);
            }

            Command::GetVersion => {
                buf.push(CMD_GET_VERSION);
            }

            Command::SetRadioParams { params } => {
                buf.push(CMD_SET_RADIO_PARAMS);
                buf.extend_from_slice(&params.freq_khz.to_le_bytes());
                buf.extend_from_slice(&params.bandwidth_hz.to_le_bytes());
                buf.push(params.spreading_factor);
                buf.push(params.coding_rate);
            }

            Command::SetRadioTxPower { power_dbm } => {
                buf.push(CMD_SET_RADIO_TX_POWER);
                buf.push(*power_dbm);
            }

            Command::Reboot => {
                buf.push(CMD_REBOOT);
            }

            Command::SendLogin {
                public_key,
                password,
            } => {
                buf.push(CMD_SEND_LOGIN);
                buf.extend_from_slice(public_key.as_bytes());
                buf.extend_from_slice(password.as_bytes());
            }

            Command::SendStatusRequest { public_key } => {
                buf.push(CMD_SEND_STATUS_REQ);
                buf.extend_from_slice(public_key.as_bytes());
            }

            Command::SendOwnerInfoRequest { public_key } => {
                // Opcode, key, 4 reserved bytes, then the request sub-type.
                buf.push(CMD_SEND_BINARY_REQ);
                buf.extend_from_slice(public_key.as_bytes());
                buf.extend_from_slice(&[0u8; 4]);
                buf.push(BINARY_REQ_OWNER_INFO);
            }

            Command::SendTelemetryRequest { public_key } => {
                // Opcode, 3 reserved bytes, one pad byte, then the key.
                buf.push(CMD_SEND_TELEMETRY_REQ);
                buf.extend_from_slice(&[0u8; 3]);
                buf.push(0);
                buf.extend_from_slice(public_key.as_bytes());
            }

            Command::GetStats { stats_type } => {
                buf.push(CMD_GET_STATS);
                buf.push(*stats_type);
            }
        }

        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_start_layout() {
        let encoded = Command::AppStart.encode();
        assert_eq!(encoded.len(), APP_START_CMD_SIZE);
        assert_eq!(encoded[0], CMD_APP_START);
        assert_eq!(encoded[1], APP_START_VERSION);
        assert_eq!(&encoded[2..7], b"mccli");
        assert_eq!(&encoded[7..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_send_login_layout() {
        let mut key = [0u8; PUB_KEY_SIZE];
        key[0] = 0x11;
        key[31] = 0x22;
        let encoded = Command::SendLogin {
            public_key: PublicKey::new(key),
            password: "hunter2".to_string(),
        }
        .encode();

        assert_eq!(encoded[0], CMD_SEND_LOGIN);
        assert_eq!(&encoded[1..33], &key);
        // Raw password bytes, no terminator.
        assert_eq!(&encoded[33..], b"hunter2");
        assert_eq!(encoded.len(), 1 + PUB_KEY_SIZE + 7);
    }

    #[test]
    fn test_set_radio_params_little_endian() {
        let encoded = Command::SetRadioParams {
            params: RadioParams {
                freq_khz: 910_525,
                bandwidth_hz: 62_500,
                spreading_factor: 7,
                coding_rate: 5,
            },
        }
        .encode();

        assert_eq!(encoded.len(), 11);
        assert_eq!(encoded[0], CMD_SET_RADIO_PARAMS);
        assert_eq!(u32::from_le_bytes([encoded[1], encoded[2], encoded[3], encoded[4]]), 910_525);
        assert_eq!(u32::from_le_bytes([encoded[5], encoded[6], encoded[7], encoded[8]]), 62_500);
        assert_eq!(encoded[9], 7);
        assert_eq!(encoded[10], 5);
    }

    #[test]
    fn test_owner_info_request_layout() {
        let key = PublicKey::new([0xAA; PUB_KEY_SIZE]);
        let encoded = Command::SendOwnerInfoRequest { public_key: key }.encode();
        assert_eq!(encoded.len(), 1 + PUB_KEY_SIZE + 4 + 1);
        assert_eq!(encoded[0], CMD_SEND_BINARY_REQ);
        assert_eq!(&encoded[33..37], &[0, 0, 0, 0]);
        assert_eq!(encoded[37], BINARY_REQ_OWNER_INFO);
    }

    #[test]
    fn test_telemetry_request_layout() {
        let mut key = [0u8; PUB_KEY_SIZE];
        key[0] = 0xAA;
        let encoded = Command::SendTelemetryRequest {
            public_key: PublicKey::new(key),
        }
        .encode();

        assert_eq!(encoded.len(), 1 + 3 + 1 + PUB_KEY_SIZE);
        assert_eq!(encoded[0], CMD_SEND_TELEMETRY_REQ);
        assert_eq!(&encoded[1..5], &[0, 0, 0, 0]);
        // The key starts after the pad byte, at offset 5.
        assert_eq!(encoded[5], 0xAA);
        assert_eq!(&encoded[5..37], &key);
    }

    #[test]
    fn test_get_stats_layout() {
        let encoded = Command::GetStats {
            stats_type: STATS_TYPE_PACKETS,
        }
        .encode();
        assert_eq!(encoded, vec![CMD_GET_STATS, STATS_TYPE_PACKETS]);
    }
}
