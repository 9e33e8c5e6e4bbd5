//! The transport session: one exclusive handle to the companion radio.
//!
//! The companion protocol has no request identifiers; a response is
//! correlated with a command purely by being the next non-push frame after
//! the write. [`RadioLink`] therefore serializes all exchanges behind one
//! lock and absorbs push notifications that arrive interleaved with a
//! synchronous response, dispatching them so no observation is lost.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use meshstats_metrics::{metric_defs, sender_labels, StatsSink};
use meshstats_protocol::frame;
use meshstats_protocol::{
    Command, ContactInfo, CoreStats, Message, PacketStats, ProtocolError, PushNotification,
    RadioParams, RadioStats, Response, SelfInfo, RESP_CODE_CONTACT, RESP_CODE_CONTACTS_START,
    RESP_CODE_OK, RESP_CODE_SELF_INFO, RESP_CODE_STATS, RESP_CODE_VERSION, STATS_TYPE_CORE,
    STATS_TYPE_PACKETS, STATS_TYPE_RADIO,
};

use crate::directory::ContactDirectory;
use crate::error::LinkError;
use crate::transport::{Connector, Transport, DEFAULT_READ_TIMEOUT};

/// Sender label used when a packet arrived with an empty path: the
/// transmission was direct and the sender is unknowable from the log entry.
pub const DIRECT_SENDER: &str = "direct";

/// Read timeout while draining stale frames.
const DRAIN_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Node label used until app-start reports the real node name.
const DEFAULT_NODE_NAME: &str = "local";

struct Inner {
    transport: Box<dyn Transport>,
    directory: ContactDirectory,
    node_name: String,
}

/// Exclusive session with a companion radio.
///
/// All methods take `&self`; exchanges are serialized internally. The link
/// is shared between the polling loop and nothing else, but the lock also
/// guarantees a reconnect cannot race a half-finished exchange.
pub struct RadioLink {
    connector: Box<dyn Connector>,
    sink: Arc<dyn StatsSink>,
    inner: Mutex<Inner>,
}

impl RadioLink {
    /// Open the transport and wrap it in a session.
    pub fn connect(
        connector: Box<dyn Connector>,
        sink: Arc<dyn StatsSink>,
    ) -> Result<Self, LinkError> {
        let transport = connector.connect()?;
        Ok(Self {
            connector,
            sink,
            inner: Mutex::new(Inner {
                transport,
                directory: ContactDirectory::new(),
                node_name: DEFAULT_NODE_NAME.to_string(),
            }),
        })
    }

    /// The node name used as the `node` metric label.
    pub fn node_name(&self) -> String {
        self.inner.lock().node_name.clone()
    }

    /// Close and reopen the transport.
    ///
    /// Higher-level session state (login, cached contacts) is untouched;
    /// fault recovery decides what to reset.
    pub fn reconnect(&self) -> Result<(), LinkError> {
        let mut inner = self.inner.lock();
        inner.transport = self.connector.connect()?;
        tracing::info!("serial transport reopened");
        Ok(())
    }

    /// Consume and discard buffered frames until the port reads empty.
    ///
    /// Used after recovery so a stale response from before the fault cannot
    /// be mis-correlated with the next command. Errors are ignored; an empty
    /// port is the goal, not a precondition.
    pub fn drain(&self) {
        let mut inner = self.inner.lock();
        if inner.transport.set_read_timeout(DRAIN_READ_TIMEOUT).is_err() {
            return;
        }
        let mut discarded = 0usize;
        while frame::read_frame(&mut inner.transport).is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::debug!(discarded, "drained stale frames");
        }
        let _ = inner.transport.set_read_timeout(DEFAULT_READ_TIMEOUT);
    }

    /// Send a command and return the next synchronous response.
    ///
    /// Push notifications that arrive before the response are dispatched,
    /// not dropped. A firmware error response becomes
    /// [`ProtocolError::FirmwareError`].
    pub fn send_command(&self, command: &Command) -> Result<Response, LinkError> {
        let mut inner = self.inner.lock();
        self.exchange(&mut inner, command)
    }

    fn exchange(&self, inner: &mut Inner, command: &Command) -> Result<Response, LinkError> {
        frame::write_frame(&mut inner.transport, &command.encode())?;
        loop {
            let payload = frame::read_frame(&mut inner.transport)?;
            match Message::decode(&payload)? {
                Message::Push(push) => Self::dispatch_push(inner, self.sink.as_ref(), push),
                Message::Response(Response::Error(code)) => {
                    return Err(ProtocolError::FirmwareError(code).into());
                }
                Message::Response(resp) => return Ok(resp),
            }
        }
    }

    /// Block until a push with one of the wanted opcodes arrives.
    ///
    /// Frames with other opcodes, including unrelated pushes and stray
    /// responses, are discarded without dispatch; the caller asked for a
    /// specific delayed reply and anything else read here is stale. The
    /// port's read timeout is widened for the wait and restored on every
    /// exit path.
    pub fn wait_for_push(
        &self,
        wanted: &[u8],
        timeout: Duration,
    ) -> Result<PushNotification, LinkError> {
        let mut inner = self.inner.lock();
        inner
            .transport
            .set_read_timeout(timeout)
            .map_err(LinkError::Io)?;
        let result = Self::wait_for_push_locked(&mut inner, wanted, timeout);
        let _ = inner.transport.set_read_timeout(DEFAULT_READ_TIMEOUT);
        result
    }

    fn wait_for_push_locked(
        inner: &mut Inner,
        wanted: &[u8],
        timeout: Duration,
    ) -> Result<PushNotification, LinkError> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() >= deadline {
                return Err(LinkError::Timeout);
            }
            let payload = match frame::read_frame(&mut inner.transport) {
                Ok(p) => p,
                Err(e) => return Err(e.into()),
            };
            match payload.first() {
                Some(code) if wanted.contains(code) => {
                    return Ok(PushNotification::decode(&payload)?);
                }
                Some(code) => {
                    tracing::trace!(code = *code, "discarded frame while waiting");
                }
                None => {}
            }
        }
    }

    // ------------------------------------------------------------------
    // Typed operations
    // ------------------------------------------------------------------

    /// Handshake with the radio and return its self-description.
    ///
    /// Also registers the node in the contact directory and adopts its name
    /// for metric labels.
    pub fn app_start(&self) -> Result<SelfInfo, LinkError> {
        let mut inner = self.inner.lock();
        let resp = self.exchange(&mut inner, &Command::AppStart)?;
        match resp {
            Response::SelfInfo(info) => {
                inner.directory.add_self(&info);
                if !info.name.is_empty() {
                    inner.node_name = info.name.clone();
                }
                tracing::info!(node = %info.name, "companion session started");
                Ok(info)
            }
            other => Err(unexpected(&other, RESP_CODE_SELF_INFO)),
        }
    }

    /// Fetch the contact list and rebuild the directory from it.
    ///
    /// The device streams contacts as individual frames between a start and
    /// an end marker; pushes interleaved with the stream are dispatched.
    pub fn get_contacts(&self) -> Result<Vec<ContactInfo>, LinkError> {
        let mut inner = self.inner.lock();

        let resp = self.exchange(&mut inner, &Command::GetContacts)?;
        let total = match resp {
            Response::ContactsStart { total_count } => total_count,
            other => return Err(unexpected(&other, RESP_CODE_CONTACTS_START)),
        };

        let mut contacts = Vec::with_capacity(total as usize);
        loop {
            let payload = frame::read_frame(&mut inner.transport)?;
            match Message::decode(&payload)? {
                Message::Push(push) => Self::dispatch_push(&mut inner, self.sink.as_ref(), push),
                Message::Response(Response::Contact(contact)) => contacts.push(contact),
                Message::Response(Response::EndOfContacts) => break,
                Message::Response(other) => return Err(unexpected(&other, RESP_CODE_CONTACT)),
            }
        }

        let collisions = inner.directory.rebuild(&contacts);
        if collisions > 0 {
            tracing::warn!(collisions, "contacts share truncated path-hash bytes");
            self.sink.add_counter(
                &metric_defs::DIRECTORY_COLLISIONS,
                &meshstats_metrics::node_labels(&inner.node_name),
                collisions as u64,
            );
        }
        tracing::debug!(count = contacts.len(), "contact list refreshed");
        Ok(contacts)
    }

    /// Firmware version string.
    pub fn get_version(&self) -> Result<String, LinkError> {
        match self.send_command(&Command::GetVersion)? {
            Response::Version(v) => Ok(v),
            other => Err(unexpected(&other, RESP_CODE_VERSION)),
        }
    }

    /// Core statistics of the local radio.
    pub fn get_core_stats(&self) -> Result<CoreStats, LinkError> {
        match self.send_command(&Command::GetStats {
            stats_type: STATS_TYPE_CORE,
        })? {
            Response::StatsCore(stats) => Ok(stats),
            other => Err(unexpected(&other, RESP_CODE_STATS)),
        }
    }

    /// Radio statistics of the local radio.
    pub fn get_radio_stats(&self) -> Result<RadioStats, LinkError> {
        match self.send_command(&Command::GetStats {
            stats_type: STATS_TYPE_RADIO,
        })? {
            Response::StatsRadio(stats) => Ok(stats),
            other => Err(unexpected(&other, RESP_CODE_STATS)),
        }
    }

    /// Packet statistics of the local radio.
    pub fn get_packet_stats(&self) -> Result<PacketStats, LinkError> {
        match self.send_command(&Command::GetStats {
            stats_type: STATS_TYPE_PACKETS,
        })? {
            Response::StatsPackets(stats) => Ok(stats),
            other => Err(unexpected(&other, RESP_CODE_STATS)),
        }
    }

    /// Queue a login to a server; the result arrives later as a push.
    pub fn send_login(&self, contact: &ContactInfo, password: &str) -> Result<(), LinkError> {
        let resp = self.send_command(&Command::SendLogin {
            public_key: contact.public_key,
            password: password.to_string(),
        })?;
        expect_accepted(&resp)
    }

    /// Queue a status request; the reply arrives as a status push.
    pub fn send_status_request(&self, contact: &ContactInfo) -> Result<(), LinkError> {
        let resp = self.send_command(&Command::SendStatusRequest {
            public_key: contact.public_key,
        })?;
        expect_accepted(&resp)
    }

    /// Queue an owner-info request; the reply arrives as a binary push.
    pub fn send_owner_info_request(&self, contact: &ContactInfo) -> Result<(), LinkError> {
        let resp = self.send_command(&Command::SendOwnerInfoRequest {
            public_key: contact.public_key,
        })?;
        expect_accepted(&resp)
    }

    /// Queue a telemetry request to a node.
    pub fn send_telemetry_request(&self, contact: &ContactInfo) -> Result<(), LinkError> {
        let resp = self.send_command(&Command::SendTelemetryRequest {
            public_key: contact.public_key,
        })?;
        expect_accepted(&resp)
    }

    /// Apply radio parameters (frequency, bandwidth, SF, CR).
    pub fn set_radio_params(&self, params: RadioParams) -> Result<(), LinkError> {
        let resp = self.send_command(&Command::SetRadioParams { params })?;
        expect_accepted(&resp)
    }

    /// Set the radio transmit power in dBm.
    pub fn set_radio_tx_power(&self, power_dbm: u8) -> Result<(), LinkError> {
        let resp = self.send_command(&Command::SetRadioTxPower { power_dbm })?;
        expect_accepted(&resp)
    }

    /// Ask the radio to reboot. The device usually resets before it can
    /// answer, so callers treat any outcome as best-effort.
    pub fn reboot(&self) -> Result<(), LinkError> {
        let resp = self.send_command(&Command::Reboot)?;
        expect_accepted(&resp)
    }

    // ------------------------------------------------------------------
    // Push dispatch
    // ------------------------------------------------------------------

    /// Handle a push absorbed during a synchronous exchange.
    ///
    /// Only rx-log entries produce observations here; login and status
    /// pushes are meaningful solely to a caller waiting on them, and one
    /// absorbed mid-command is already stale.
    fn dispatch_push(inner: &mut Inner, sink: &dyn StatsSink, push: PushNotification) {
        match push {
            PushNotification::LogRxData(entry) => {
                let sender = match entry.sender_path_hash() {
                    Some(hash) => inner.directory.name_by_path_hash(hash),
                    None => DIRECT_SENDER.to_string(),
                };
                let labels = sender_labels(&inner.node_name, &sender);
                sink.inc_counter(&metric_defs::MESH_PACKETS_OBSERVED, &labels);
                sink.set_gauge(&metric_defs::MESH_PACKET_RSSI, &labels, entry.rssi as f64);
                sink.set_gauge(&metric_defs::MESH_PACKET_SNR, &labels, entry.snr());
                let payload_len = entry.payload_len();
                if payload_len > 0 {
                    sink.add_counter(&metric_defs::MESH_PACKET_BYTES, &labels, payload_len as u64);
                }
                tracing::debug!(
                    sender = %sender,
                    rssi = entry.rssi,
                    snr = entry.snr(),
                    bytes = payload_len,
                    "mesh packet observed"
                );
            }
            other => {
                tracing::debug!(?other, "push absorbed during command exchange");
            }
        }
    }
}

fn unexpected(resp: &Response, want: u8) -> LinkError {
    ProtocolError::UnexpectedOpcode {
        got: resp.code(),
        want,
    }
    .into()
}

/// Send-style commands answer OK or SENT depending on firmware version.
fn expect_accepted(resp: &Response) -> Result<(), LinkError> {
    match resp {
        Response::Ok | Response::Sent { .. } => Ok(()),
        other => Err(unexpected(other, RESP_CODE_OK)),
    }
}
