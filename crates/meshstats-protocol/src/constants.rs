//! Protocol constants
//!
//! These constants define the command codes, response codes, and other
//! protocol-specific values used by the MeshCore companion UART protocol.

// ============================================================================
// Framing
// ============================================================================

/// Header byte for host → device frames.
pub const FRAME_HEADER_TX: u8 = b'<';
/// Header byte for device → host frames.
pub const FRAME_HEADER_RX: u8 = b'>';
/// Maximum frame payload size in bytes.
pub const MAX_FRAME_SIZE: usize = 512;

// ============================================================================
// Command Codes (host → firmware)
// ============================================================================

/// Initial handshake command - starts the app connection.
pub const CMD_APP_START: u8 = 1;
/// Get the list of contacts.
pub const CMD_GET_CONTACTS: u8 = 4;
/// Get the firmware version string.
pub const CMD_GET_VERSION: u8 = 10;
/// Set radio parameters (frequency, bandwidth, SF, CR).
pub const CMD_SET_RADIO_PARAMS: u8 = 11;
/// Set radio TX power.
pub const CMD_SET_RADIO_TX_POWER: u8 = 12;
/// Reboot the device.
pub const CMD_REBOOT: u8 = 19;
/// Send login request to a server.
pub const CMD_SEND_LOGIN: u8 = 26;
/// Send status request to a server.
pub const CMD_SEND_STATUS_REQ: u8 = 27;
/// Send telemetry request.
pub const CMD_SEND_TELEMETRY_REQ: u8 = 39;
/// Send binary request.
pub const CMD_SEND_BINARY_REQ: u8 = 50;
/// Get statistics (v8+).
pub const CMD_GET_STATS: u8 = 56;

/// App-start protocol version byte.
pub const APP_START_VERSION: u8 = 3;
/// Client identifier embedded in the app-start command.
pub const APP_START_CLIENT_ID: &str = "mccli";
/// Total encoded size of the app-start command.
pub const APP_START_CMD_SIZE: usize = 11;

/// Binary request sub-type for owner info.
pub const BINARY_REQ_OWNER_INFO: u8 = 0x07;

// ============================================================================
// Stats Sub-types (for CMD_GET_STATS)
// ============================================================================

/// Core statistics (battery, uptime, errors, queue length).
pub const STATS_TYPE_CORE: u8 = 0;
/// Radio statistics (noise floor, RSSI, SNR, air time).
pub const STATS_TYPE_RADIO: u8 = 1;
/// Packet statistics (counts of sent/received by route type).
pub const STATS_TYPE_PACKETS: u8 = 2;

// ============================================================================
// Response Codes (firmware → host)
// ============================================================================

/// Generic OK response.
pub const RESP_CODE_OK: u8 = 0;
/// Generic error response (followed by error code).
pub const RESP_CODE_ERR: u8 = 1;
/// Start of contacts list.
pub const RESP_CODE_CONTACTS_START: u8 = 2;
/// A single contact entry.
pub const RESP_CODE_CONTACT: u8 = 3;
/// End of contacts list.
pub const RESP_CODE_END_OF_CONTACTS: u8 = 4;
/// Self info response (reply to CMD_APP_START).
pub const RESP_CODE_SELF_INFO: u8 = 5;
/// Outbound message accepted (reply to CMD_SEND_*).
pub const RESP_CODE_SENT: u8 = 6;
/// Firmware version string.
pub const RESP_CODE_VERSION: u8 = 8;
/// Statistics response (v8+).
pub const RESP_CODE_STATS: u8 = 24;

// ============================================================================
// Push Codes (unsolicited firmware → host, high bit set)
// ============================================================================

/// First opcode of the push range.
pub const PUSH_CODE_BASE: u8 = 0x80;
/// Login to server succeeded.
pub const PUSH_CODE_LOGIN_SUCCESS: u8 = 0x85;
/// Login to server failed.
pub const PUSH_CODE_LOGIN_FAIL: u8 = 0x86;
/// Status response from server.
pub const PUSH_CODE_STATUS_RESPONSE: u8 = 0x87;
/// Raw RX data log (an overheard mesh packet).
pub const PUSH_CODE_LOG_RX_DATA: u8 = 0x88;
/// Binary response received (owner info payload).
pub const PUSH_CODE_BINARY_RESPONSE: u8 = 0x8C;

/// Returns true if the opcode is in the push-notification range.
pub const fn is_push_code(code: u8) -> bool {
    code >= PUSH_CODE_BASE
}

// ============================================================================
// Sizes
// ============================================================================

/// Size of a public key in bytes.
pub const PUB_KEY_SIZE: usize = 32;
/// Size of public key prefix used in push messages.
pub const PUB_KEY_PREFIX_SIZE: usize = 6;
/// Maximum out-path size in a contact record.
pub const MAX_PATH_SIZE: usize = 64;
/// Minimum encoded size of a core stats response.
pub const STATS_CORE_SIZE: usize = 11;
/// Minimum encoded size of a radio stats response.
pub const STATS_RADIO_SIZE: usize = 14;
/// Minimum encoded size of a packet stats response.
pub const STATS_PACKETS_SIZE: usize = 26;
/// Minimum encoded size of a remote status push body.
pub const STATUS_PUSH_MIN_SIZE: usize = 48;
