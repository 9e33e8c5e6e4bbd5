//! Responses and push notifications from the companion firmware.

use crate::constants::*;
use crate::error::*;
use crate::types::*;

/// Responses received synchronously after a command.
#[derive(Debug, Clone)]
pub enum Response {
    /// Generic OK response.
    Ok,

    /// Error response from firmware (raw error code).
    Error(u8),

    /// Start of contacts list.
    ContactsStart {
        /// Total number of contacts.
        total_count: u32,
    },

    /// A single contact.
    Contact(ContactInfo),

    /// End of contacts list.
    EndOfContacts,

    /// Self info (response to AppStart).
    SelfInfo(SelfInfo),

    /// Outbound message accepted by the radio.
    Sent {
        /// Whether the message was sent as flood.
        is_flood: bool,
        /// Tag correlating the eventual push reply.
        tag: u32,
        /// Estimated round-trip timeout in milliseconds.
        est_timeout_ms: u32,
    },

    /// Firmware version string.
    Version(String),

    /// Core statistics.
    StatsCore(CoreStats),

    /// Radio statistics.
    StatsRadio(RadioStats),

    /// Packet statistics.
    StatsPackets(PacketStats),
}

/// Stats parsed from a combined remote status push.
///
/// The remote layout shares nothing with the per-type `GetStats` responses:
/// all three logical groups live at fixed offsets in one body, and fields the
/// remote node does not report (noise floor, error flags) come back zero.
#[derive(Debug, Clone)]
pub struct RemoteStatus {
    /// Responding server's public key prefix.
    pub server_prefix: PublicKeyPrefix,
    /// Core statistics.
    pub core: CoreStats,
    /// Radio statistics.
    pub radio: RadioStats,
    /// Packet statistics.
    pub packets: PacketStats,
}

/// An overheard mesh packet reported by the radio.
#[derive(Debug, Clone)]
pub struct RxLogEntry {
    /// SNR, device-native scaling (dB x4).
    pub snr_x4: i8,
    /// RSSI in dBm.
    pub rssi: i8,
    /// Raw mesh packet: header byte, path length, path bytes, encrypted payload.
    pub raw: Vec<u8>,
}

impl RxLogEntry {
    /// SNR in dB.
    pub fn snr(&self) -> f64 {
        self.snr_x4 as f64 / 4.0
    }

    /// The first path byte: truncated hash of the immediate sender's pubkey.
    /// None when the path is empty (direct transmission, sender unknowable).
    pub fn sender_path_hash(&self) -> Option<u8> {
        let path_len = *self.raw.get(1)? as usize;
        if path_len == 0 {
            return None;
        }
        self.raw.get(2).copied()
    }

    /// Length of the encrypted payload after header, path length, and path.
    pub fn payload_len(&self) -> usize {
        if self.raw.len() < 2 {
            return 0;
        }
        let path_len = self.raw[1] as usize;
        self.raw.len().saturating_sub(2 + path_len)
    }
}

/// Push notifications from the firmware (unsolicited or delayed replies).
#[derive(Debug, Clone)]
pub enum PushNotification {
    /// Login to a server succeeded.
    LoginSuccess {
        /// Server's public key prefix.
        server_prefix: PublicKeyPrefix,
    },

    /// Login to a server failed.
    LoginFail {
        /// Server's public key prefix.
        server_prefix: PublicKeyPrefix,
    },

    /// Combined status response from a server.
    StatusResponse(RemoteStatus),

    /// Raw RX data log (overheard mesh traffic).
    LogRxData(RxLogEntry),

    /// Binary response carrying an owner-info payload.
    BinaryResponse {
        /// Responding server's public key prefix.
        server_prefix: PublicKeyPrefix,
        /// Server timestamp.
        timestamp: u32,
        /// Decoded owner info.
        owner: OwnerInfo,
    },

    /// A push code this client recognizes as push but does not decode.
    Unknown {
        /// The push opcode.
        code: u8,
    },
}

/// Either a response or a push notification.
#[derive(Debug, Clone)]
pub enum Message {
    /// A response to a command.
    Response(Response),
    /// An unsolicited push notification.
    Push(PushNotification),
}

impl Message {
    /// Decode a message from a frame payload.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        if frame.is_empty() {
            return Err(ProtocolError::FrameTooShort {
                expected: 1,
                actual: 0,
            });
        }

        if is_push_code(frame[0]) {
            Ok(Message::Push(PushNotification::decode(frame)?))
        } else {
            Ok(Message::Response(Response::decode(frame)?))
        }
    }
}

impl Response {
    /// The opcode this response was decoded from.
    pub fn code(&self) -> u8 {
        match self {
            Response::Ok => RESP_CODE_OK,
            Response::Error(_) => RESP_CODE_ERR,
            Response::ContactsStart { .. } => RESP_CODE_CONTACTS_START,
            Response::Contact(_) => RESP_CODE_CONTACT,
            Response::EndOfContacts => RESP_CODE_END_OF_CONTACTS,
            Response::SelfInfo(_) => RESP_CODE_SELF_INFO,
            Response::Sent { .. } => RESP_CODE_SENT,
            Response::Version(_) => RESP_CODE_VERSION,
            Response::StatsCore(_) | Response::StatsRadio(_) | Response::StatsPackets(_) => {
                RESP_CODE_STATS
            }
        }
    }

    /// Decode a response from a frame payload.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        if frame.is_empty() {
            return Err(ProtocolError::FrameTooShort {
                expected: 1,
                actual: 0,
            });
        }

        let code = frame[0];

        match code {
            RESP_CODE_OK => Ok(Response::Ok),

            RESP_CODE_ERR => {
                if frame.len() < 2 {
                    return Err(ProtocolError::FrameTooShort {
                        expected: 2,
                        actual: frame.len(),
                    });
                }
                Ok(Response::Error(frame[1]))
            }

            RESP_CODE_CONTACTS_START => {
                if frame.len() < 5 {
                    return Err(ProtocolError::FrameTooShort {
                        expected: 5,
                        actual: frame.len(),
                    });
                }
                let total_count = u32::from_le_bytes([frame[1], frame[2], frame[3], frame[4]]);
                Ok(Response::ContactsStart { total_count })
            }

            RESP_CODE_CONTACT => Ok(Response::Contact(decode_contact(frame)?)),

            RESP_CODE_END_OF_CONTACTS => Ok(Response::EndOfContacts),

            RESP_CODE_SELF_INFO => Ok(Response::SelfInfo(decode_self_info(frame)?)),

            RESP_CODE_SENT => {
                if frame.len() < 10 {
                    return Err(ProtocolError::FrameTooShort {
                        expected: 10,
                        actual: frame.len(),
                    });
                }
                let is_flood = frame[1] == 1;
                let tag = u32::from_le_bytes([frame[2], frame[3], frame[4], frame[5]]);
                let est_timeout_ms = u32::from_le_bytes([frame[6], frame[7], frame[8], frame[9]]);
                Ok(Response::Sent {
                    is_flood,
                    tag,
                    est_timeout_ms,
                })
            }

            RESP_CODE_VERSION => {
                if frame.len() == 1 {
                    return Ok(Response::Version("unknown".to_string()));
                }
                Ok(Response::Version(trim_null_str(&frame[1..])))
            }

            RESP_CODE_STATS => decode_stats(frame),

            _ => Err(ProtocolError::UnknownResponse(code)),
        }
    }
}

impl PushNotification {
    /// Decode a push notification from a frame payload.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        if frame.is_empty() {
            return Err(ProtocolError::FrameTooShort {
                expected: 1,
                actual: 0,
            });
        }

        let code = frame[0];

        match code {
            PUSH_CODE_LOGIN_SUCCESS => {
                let server_prefix = read_key_prefix(frame, 2)?;
                Ok(PushNotification::LoginSuccess { server_prefix })
            }

            PUSH_CODE_LOGIN_FAIL => {
                let server_prefix = read_key_prefix(frame, 2)?;
                Ok(PushNotification::LoginFail { server_prefix })
            }

            PUSH_CODE_STATUS_RESPONSE => {
                Ok(PushNotification::StatusResponse(decode_status_push(frame)?))
            }

            PUSH_CODE_LOG_RX_DATA => {
                if frame.len() < 3 {
                    return Err(ProtocolError::FrameTooShort {
                        expected: 3,
                        actual: frame.len(),
                    });
                }
                Ok(PushNotification::LogRxData(RxLogEntry {
                    snr_x4: frame[1] as i8,
                    rssi: frame[2] as i8,
                    raw: frame[3..].to_vec(),
                }))
            }

            PUSH_CODE_BINARY_RESPONSE => {
                // Layout: code, 6-byte sender prefix, reserved, u32 timestamp,
                // then "version\nnode_name\nowner_info".
                if frame.len() < 13 {
                    return Err(ProtocolError::FrameTooShort {
                        expected: 13,
                        actual: frame.len(),
                    });
                }
                let server_prefix = read_key_prefix(frame, 1)?;
                let timestamp = u32::from_le_bytes([frame[8], frame[9], frame[10], frame[11]]);
                let payload = trim_null_str(&frame[12..]);
                let mut parts = payload.splitn(3, '\n');
                let owner = OwnerInfo {
                    version: parts.next().unwrap_or_default().to_string(),
                    node_name: parts.next().unwrap_or_default().to_string(),
                    owner_info: parts.next().unwrap_or_default().to_string(),
                };
                Ok(PushNotification::BinaryResponse {
                    server_prefix,
                    timestamp,
                    owner,
                })
            }

            c if is_push_code(c) => {
                log::debug!("undecoded push notification 0x{:02X} ({} bytes)", c, frame.len());
                Ok(PushNotification::Unknown { code: c })
            }

            _ => Err(ProtocolError::UnknownResponse(code)),
        }
    }
}

/// Decode a per-type stats response (opcode, type tag, fixed body).
fn decode_stats(frame: &[u8]) -> Result<Response, ProtocolError> {
    if frame.len() < 2 {
        return Err(ProtocolError::FrameTooShort {
            expected: 2,
            actual: frame.len(),
        });
    }

    match frame[1] {
        STATS_TYPE_CORE => {
            if frame.len() < STATS_CORE_SIZE {
                return Err(ProtocolError::FrameTooShort {
                    expected: STATS_CORE_SIZE,
                    actual: frame.len(),
                });
            }
            Ok(Response::StatsCore(CoreStats {
                battery_mv: u16::from_le_bytes([frame[2], frame[3]]),
                uptime_secs: u32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]),
                error_flags: u16::from_le_bytes([frame[8], frame[9]]),
                queue_len: frame[10],
            }))
        }

        STATS_TYPE_RADIO => {
            if frame.len() < STATS_RADIO_SIZE {
                return Err(ProtocolError::FrameTooShort {
                    expected: STATS_RADIO_SIZE,
                    actual: frame.len(),
                });
            }
            Ok(Response::StatsRadio(RadioStats {
                noise_floor: i16::from_le_bytes([frame[2], frame[3]]),
                last_rssi: frame[4] as i8,
                last_snr_x4: frame[5] as i8,
                tx_air_secs: u32::from_le_bytes([frame[6], frame[7], frame[8], frame[9]]),
                rx_air_secs: u32::from_le_bytes([frame[10], frame[11], frame[12], frame[13]]),
            }))
        }

        STATS_TYPE_PACKETS => {
            if frame.len() < STATS_PACKETS_SIZE {
                return Err(ProtocolError::FrameTooShort {
                    expected: STATS_PACKETS_SIZE,
                    actual: frame.len(),
                });
            }
            Ok(Response::StatsPackets(PacketStats {
                recv: u32::from_le_bytes([frame[2], frame[3], frame[4], frame[5]]),
                sent: u32::from_le_bytes([frame[6], frame[7], frame[8], frame[9]]),
                sent_flood: u32::from_le_bytes([frame[10], frame[11], frame[12], frame[13]]),
                sent_direct: u32::from_le_bytes([frame[14], frame[15], frame[16], frame[17]]),
                recv_flood: u32::from_le_bytes([frame[18], frame[19], frame[20], frame[21]]),
                recv_direct: u32::from_le_bytes([frame[22], frame[23], frame[24], frame[25]]),
            }))
        }

        other => Err(ProtocolError::UnknownStatsType(other)),
    }
}

/// Decode a combined remote status push.
///
/// The offsets here are independent of the per-type stats layout; the two
/// schemas must not be merged.
fn decode_status_push(frame: &[u8]) -> Result<RemoteStatus, ProtocolError> {
    if frame[0] != PUSH_CODE_STATUS_RESPONSE {
        return Err(ProtocolError::UnexpectedOpcode {
            got: frame[0],
            want: PUSH_CODE_STATUS_RESPONSE,
        });
    }
    if frame.len() < STATUS_PUSH_MIN_SIZE {
        return Err(ProtocolError::FrameTooShort {
            expected: STATUS_PUSH_MIN_SIZE,
            actual: frame.len(),
        });
    }

    let server_prefix = read_key_prefix(frame, 2)?;

    let core = CoreStats {
        battery_mv: u16::from_le_bytes([frame[8], frame[9]]),
        queue_len: frame[10],
        uptime_secs: u32::from_le_bytes([frame[28], frame[29], frame[30], frame[31]]),
        error_flags: 0, // not reported in the remote layout
    };

    // Newer firmware appends RX airtime past the 48-byte body; older nodes
    // stop short, in which case it reads as zero.
    let rx_air_secs = if frame.len() >= 60 {
        u32::from_le_bytes([frame[56], frame[57], frame[58], frame[59]])
    } else {
        0
    };

    let radio = RadioStats {
        noise_floor: 0, // not reported in the remote layout
        last_rssi: frame[12] as i8,
        last_snr_x4: frame[14] as i8,
        tx_air_secs: u32::from_le_bytes([frame[24], frame[25], frame[26], frame[27]]),
        rx_air_secs,
    };

    let packets = PacketStats {
        recv: u32::from_le_bytes([frame[16], frame[17], frame[18], frame[19]]),
        sent: u32::from_le_bytes([frame[20], frame[21], frame[22], frame[23]]),
        sent_flood: u32::from_le_bytes([frame[32], frame[33], frame[34], frame[35]]),
        sent_direct: u32::from_le_bytes([frame[36], frame[37], frame[38], frame[39]]),
        recv_flood: u32::from_le_bytes([frame[40], frame[41], frame[42], frame[43]]),
        recv_direct: u32::from_le_bytes([frame[44], frame[45], frame[46], frame[47]]),
    };

    Ok(RemoteStatus {
        server_prefix,
        core,
        radio,
        packets,
    })
}

/// Decode a contact record.
///
/// Layout: code, pub_key(32), type, flags, out_path_len, out_path(64),
/// name(32), last_advert_ts(4), lat(4), lon(4), lastmod(4).
fn decode_contact(frame: &[u8]) -> Result<ContactInfo, ProtocolError> {
    const NAME_OFFSET: usize = 1 + PUB_KEY_SIZE + 3 + MAX_PATH_SIZE; // 100
    const NAME_SIZE: usize = 32;
    const MIN_SIZE: usize = 148;

    if frame.len() < MIN_SIZE {
        return Err(ProtocolError::FrameTooShort {
            expected: MIN_SIZE,
            actual: frame.len(),
        });
    }

    Ok(ContactInfo {
        public_key: read_public_key(frame, 1)?,
        contact_type: frame[1 + PUB_KEY_SIZE],
        flags: frame[1 + PUB_KEY_SIZE + 1],
        out_path_len: frame[1 + PUB_KEY_SIZE + 2] as i8,
        name: trim_null_str(&frame[NAME_OFFSET..NAME_OFFSET + NAME_SIZE]),
        gps_lat: i32::from_le_bytes([frame[136], frame[137], frame[138], frame[139]]),
        gps_lon: i32::from_le_bytes([frame[140], frame[141], frame[142], frame[143]]),
    })
}

/// Decode a self-info record.
///
/// Layout: code, adv_type, tx_power, max_tx_power, pub_key(32), lat(4),
/// lon(4), flags(4), freq(4), bw(4), sf, cr, then the node name.
fn decode_self_info(frame: &[u8]) -> Result<SelfInfo, ProtocolError> {
    const HEADER_SIZE: usize = 58;

    if frame.len() < HEADER_SIZE {
        return Err(ProtocolError::FrameTooShort {
            expected: HEADER_SIZE,
            actual: frame.len(),
        });
    }

    let name = if frame.len() > HEADER_SIZE {
        trim_null_str(&frame[HEADER_SIZE..])
    } else {
        String::new()
    };

    Ok(SelfInfo {
        public_key: read_public_key(frame, 4)?,
        name,
        gps_lat: i32::from_le_bytes([frame[36], frame[37], frame[38], frame[39]]),
        gps_lon: i32::from_le_bytes([frame[40], frame[41], frame[42], frame[43]]),
        tx_power_dbm: frame[2],
        max_tx_power_dbm: frame[3],
    })
}

fn read_key_prefix(frame: &[u8], offset: usize) -> Result<PublicKeyPrefix, ProtocolError> {
    frame
        .get(offset..)
        .and_then(PublicKeyPrefix::from_slice)
        .ok_or(ProtocolError::FrameTooShort {
            expected: offset + PUB_KEY_PREFIX_SIZE,
            actual: frame.len(),
        })
}

fn read_public_key(frame: &[u8], offset: usize) -> Result<PublicKey, ProtocolError> {
    frame
        .get(offset..)
        .and_then(PublicKey::from_slice)
        .ok_or(ProtocolError::FrameTooShort {
            expected: offset + PUB_KEY_SIZE,
            actual: frame.len(),
        })
}

/// Decode a fixed-width string field: bytes up to the first zero.
fn trim_null_str(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_core_frame(battery_mv: u16, uptime: u32, errors: u16, queue: u8) -> Vec<u8> {
        let mut f = vec![RESP_CODE_STATS, STATS_TYPE_CORE];
        f.extend_from_slice(&battery_mv.to_le_bytes());
        f.extend_from_slice(&uptime.to_le_bytes());
        f.extend_from_slice(&errors.to_le_bytes());
        f.push(queue);
        f
    }

    #[test]
    fn test_decode_stats_core_known_good() {
        let frame = stats_core_frame(3700, 12345, 0, 2);
        let resp = Response::decode(&frame).unwrap();
        match resp {
            Response::StatsCore(core) => {
                assert_eq!(core.battery_mv, 3700);
                assert_eq!(core.uptime_secs, 12345);
                assert_eq!(core.error_flags, 0);
                assert_eq!(core.queue_len, 2);
            }
            other => panic!("expected core stats, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_stats_core_truncated() {
        let frame = stats_core_frame(3700, 12345, 0, 2);
        let err = Response::decode(&frame[..STATS_CORE_SIZE - 1]).unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooShort { .. }));
    }

    #[test]
    fn test_decode_stats_radio_signed_fields() {
        let mut frame = vec![RESP_CODE_STATS, STATS_TYPE_RADIO];
        frame.extend_from_slice(&(-105i16).to_le_bytes());
        frame.push(0xCE); // -50 as i8
        frame.push(10); // SNR 2.5 dB
        frame.extend_from_slice(&100u32.to_le_bytes());
        frame.extend_from_slice(&200u32.to_le_bytes());

        match Response::decode(&frame).unwrap() {
            Response::StatsRadio(radio) => {
                assert_eq!(radio.noise_floor, -105);
                assert_eq!(radio.last_rssi, -50);
                assert_eq!(radio.last_snr(), 2.5);
                assert_eq!(radio.tx_air_secs, 100);
                assert_eq!(radio.rx_air_secs, 200);
            }
            other => panic!("expected radio stats, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_stats_unknown_type() {
        let frame = vec![RESP_CODE_STATS, 9, 0, 0];
        assert!(matches!(
            Response::decode(&frame),
            Err(ProtocolError::UnknownStatsType(9))
        ));
    }

    fn status_push_frame(len: usize) -> Vec<u8> {
        let mut f = vec![0u8; len];
        f[0] = PUSH_CODE_STATUS_RESPONSE;
        f[8..10].copy_from_slice(&4100u16.to_le_bytes()); // battery
        f[10] = 3; // queue
        f[12] = 0xCE; // rssi -50
        f[14] = 10; // snr x4 -> 2.5
        f[16..20].copy_from_slice(&500u32.to_le_bytes()); // recv
        f[20..24].copy_from_slice(&400u32.to_le_bytes()); // sent
        f[24..28].copy_from_slice(&77u32.to_le_bytes()); // tx air
        f[28..32].copy_from_slice(&86400u32.to_le_bytes()); // uptime
        f[32..36].copy_from_slice(&10u32.to_le_bytes()); // flood tx
        f[36..40].copy_from_slice(&20u32.to_le_bytes()); // direct tx
        f[40..44].copy_from_slice(&30u32.to_le_bytes()); // flood rx
        f[44..48].copy_from_slice(&40u32.to_le_bytes()); // direct rx
        f
    }

    #[test]
    fn test_decode_status_push_scaling() {
        let frame = status_push_frame(48);
        let status = match PushNotification::decode(&frame).unwrap() {
            PushNotification::StatusResponse(s) => s,
            other => panic!("expected status response, got {:?}", other),
        };
        assert_eq!(status.core.battery_mv, 4100);
        assert_eq!(status.core.queue_len, 3);
        assert_eq!(status.core.uptime_secs, 86400);
        assert_eq!(status.radio.last_rssi, -50);
        assert_eq!(status.radio.last_snr(), 2.5);
        assert_eq!(status.radio.tx_air_secs, 77);
        assert_eq!(status.packets.recv, 500);
        assert_eq!(status.packets.sent_flood, 10);
        assert_eq!(status.packets.recv_direct, 40);
        // Body too short for RX airtime: reads as zero.
        assert_eq!(status.radio.rx_air_secs, 0);
    }

    #[test]
    fn test_decode_status_push_with_rx_airtime() {
        let mut frame = status_push_frame(60);
        frame[56..60].copy_from_slice(&999u32.to_le_bytes());
        match PushNotification::decode(&frame).unwrap() {
            PushNotification::StatusResponse(s) => assert_eq!(s.radio.rx_air_secs, 999),
            other => panic!("expected status response, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_status_push_truncated() {
        let frame = status_push_frame(48);
        assert!(matches!(
            PushNotification::decode(&frame[..40]),
            Err(ProtocolError::FrameTooShort { .. })
        ));
    }

    fn contact_frame(name: &str, first_key_byte: u8) -> Vec<u8> {
        let mut f = vec![0u8; 148];
        f[0] = RESP_CODE_CONTACT;
        f[1] = first_key_byte;
        f[33] = 2; // repeater type
        f[35] = 0xFF; // out_path_len -1
        f[100..100 + name.len()].copy_from_slice(name.as_bytes());
        f[136..140].copy_from_slice(&45_000_000i32.to_le_bytes());
        f[140..144].copy_from_slice(&(-93_000_000i32).to_le_bytes());
        f
    }

    #[test]
    fn test_decode_contact() {
        let frame = contact_frame("Hilltop Repeater", 0x7F);
        match Response::decode(&frame).unwrap() {
            Response::Contact(c) => {
                assert_eq!(c.name, "Hilltop Repeater");
                assert_eq!(c.public_key.path_hash(), 0x7F);
                assert_eq!(c.contact_type, 2);
                assert_eq!(c.out_path_len, -1);
                assert_eq!(c.latitude(), 45.0);
                assert_eq!(c.longitude(), -93.0);
            }
            other => panic!("expected contact, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_contact_truncated() {
        let frame = contact_frame("x", 1);
        assert!(matches!(
            Response::decode(&frame[..140]),
            Err(ProtocolError::FrameTooShort { .. })
        ));
    }

    #[test]
    fn test_decode_self_info() {
        let mut frame = vec![0u8; 58 + 8];
        frame[0] = RESP_CODE_SELF_INFO;
        frame[2] = 22; // tx power
        frame[3] = 30; // max tx power
        frame[4] = 0xAB; // first key byte
        frame[36..40].copy_from_slice(&45_500_000i32.to_le_bytes());
        frame[40..44].copy_from_slice(&(-93_250_000i32).to_le_bytes());
        frame[58..58 + 7].copy_from_slice(b"BaseCmp");

        match Response::decode(&frame).unwrap() {
            Response::SelfInfo(info) => {
                assert_eq!(info.name, "BaseCmp");
                assert_eq!(info.tx_power_dbm, 22);
                assert_eq!(info.public_key.path_hash(), 0xAB);
                assert_eq!(info.latitude(), 45.5);
                assert_eq!(info.longitude(), -93.25);
            }
            other => panic!("expected self info, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_version() {
        let mut frame = vec![RESP_CODE_VERSION];
        frame.extend_from_slice(b"v1.8.2\0junk");
        match Response::decode(&frame).unwrap() {
            Response::Version(v) => assert_eq!(v, "v1.8.2"),
            other => panic!("expected version, got {:?}", other),
        }
        match Response::decode(&[RESP_CODE_VERSION]).unwrap() {
            Response::Version(v) => assert_eq!(v, "unknown"),
            other => panic!("expected version, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_sent() {
        let mut frame = vec![RESP_CODE_SENT, 1];
        frame.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
        frame.extend_from_slice(&12_000u32.to_le_bytes());
        match Response::decode(&frame).unwrap() {
            Response::Sent {
                is_flood,
                tag,
                est_timeout_ms,
            } => {
                assert!(is_flood);
                assert_eq!(tag, 0xDEADBEEF);
                assert_eq!(est_timeout_ms, 12_000);
            }
            other => panic!("expected sent, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rx_log_entry() {
        // header, path_len=2, path bytes, 4-byte payload
        let frame = vec![PUSH_CODE_LOG_RX_DATA, 10, 0xCE, 0x11, 2, 0x7F, 0x42, 9, 9, 9, 9];
        match PushNotification::decode(&frame).unwrap() {
            PushNotification::LogRxData(entry) => {
                assert_eq!(entry.snr(), 2.5);
                assert_eq!(entry.rssi, -50);
                assert_eq!(entry.sender_path_hash(), Some(0x7F));
                assert_eq!(entry.payload_len(), 4);
            }
            other => panic!("expected rx log, got {:?}", other),
        }
    }

    #[test]
    fn test_rx_log_entry_zero_path() {
        let frame = vec![PUSH_CODE_LOG_RX_DATA, 0, 0, 0x11, 0, 1, 2, 3];
        match PushNotification::decode(&frame).unwrap() {
            PushNotification::LogRxData(entry) => {
                assert_eq!(entry.sender_path_hash(), None);
                assert_eq!(entry.payload_len(), 3);
            }
            other => panic!("expected rx log, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_binary_response_owner_info() {
        let mut frame = vec![PUSH_CODE_BINARY_RESPONSE];
        frame.extend_from_slice(&[1, 2, 3, 4, 5, 6]); // prefix
        frame.push(0); // reserved
        frame.extend_from_slice(&1_700_000_000u32.to_le_bytes());
        frame.extend_from_slice(b"v1.8\nHilltop\nKD9XYZ");
        match PushNotification::decode(&frame).unwrap() {
            PushNotification::BinaryResponse { owner, .. } => {
                assert_eq!(owner.version, "v1.8");
                assert_eq!(owner.node_name, "Hilltop");
                assert_eq!(owner.owner_info, "KD9XYZ");
            }
            other => panic!("expected binary response, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_push_code_tolerated() {
        let frame = vec![0x8E, 1, 2, 3];
        assert!(matches!(
            PushNotification::decode(&frame).unwrap(),
            PushNotification::Unknown { code: 0x8E }
        ));
    }

    #[test]
    fn test_unknown_response_code_rejected() {
        assert!(matches!(
            Response::decode(&[0x42]),
            Err(ProtocolError::UnknownResponse(0x42))
        ));
    }
}
