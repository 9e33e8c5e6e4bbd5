//! Remote repeater polling over the mesh.
//!
//! The remote flow is a small state machine: find the repeater in the
//! contact list, log in, then request a combined status report each tick.
//! Login and status replies are delayed push notifications, not synchronous
//! responses, so each step queues a request and then waits on the link for
//! the matching push code.

use std::sync::Arc;
use std::time::{Duration, Instant};

use meshstats_metrics::{metric_defs, node_labels, StatsSink};
use meshstats_protocol::{
    ContactInfo, PushNotification, PUSH_CODE_BINARY_RESPONSE, PUSH_CODE_LOGIN_FAIL,
    PUSH_CODE_LOGIN_SUCCESS, PUSH_CODE_STATUS_RESPONSE,
};
use meshstats_radio::{LinkError, RadioLink};

use crate::local::{publish_core_stats, publish_packet_stats, publish_radio_stats};

/// How long to wait for the owner-info reply. Informational only, so much
/// shorter than the login and status deadlines.
const OWNER_INFO_WAIT: Duration = Duration::from_secs(10);

enum LoginOutcome {
    LoggedIn,
    Rejected,
    Unconfirmed,
    Fatal(LinkError),
}

/// Polls one named repeater through the attached radio.
pub struct RemotePoller {
    link: Arc<RadioLink>,
    sink: Arc<dyn StatsSink>,
    repeater_name: String,
    password: String,
    login_wait: Duration,
    status_wait: Duration,
    contact_refresh: Duration,
    target: Option<ContactInfo>,
    logged_in: bool,
    last_refresh: Option<Instant>,
}

impl RemotePoller {
    /// Create a poller for the named repeater.
    pub fn new(
        link: Arc<RadioLink>,
        sink: Arc<dyn StatsSink>,
        repeater_name: String,
        password: String,
        login_wait: Duration,
        status_wait: Duration,
        contact_refresh: Duration,
    ) -> Self {
        Self {
            link,
            sink,
            repeater_name,
            password,
            login_wait,
            status_wait,
            contact_refresh,
            target: None,
            logged_in: false,
            last_refresh: None,
        }
    }

    /// True once a login has been confirmed and not since invalidated.
    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Forget all session state after a transport recovery.
    ///
    /// The radio may have rebooted, so the cached contact and the login are
    /// both suspect; the next tick starts from discovery.
    pub fn reset(&mut self) {
        self.target = None;
        self.logged_in = false;
        self.last_refresh = None;
        self.sink.set_gauge(
            &metric_defs::LOGIN_STATUS,
            &node_labels(&self.repeater_name),
            0.0,
        );
    }

    /// Run one remote collection pass.
    ///
    /// Returns `Err` only on fatal transport faults; every protocol-level
    /// disappointment (repeater missing, login rejected, status timeout) is
    /// counted and deferred to the next tick.
    pub fn tick(&mut self) -> Result<(), LinkError> {
        self.refresh_contacts_if_due()?;

        let Some(target) = self.target.clone() else {
            self.scrape_error("repeater not resolved");
            return Ok(());
        };

        if !self.logged_in {
            match self.login(&target) {
                LoginOutcome::LoggedIn => {}
                LoginOutcome::Rejected => return Ok(()),
                // No reply inside the deadline does not prove failure; the
                // status request below settles it either way.
                LoginOutcome::Unconfirmed => {}
                LoginOutcome::Fatal(err) => return Err(err),
            }
        }

        self.poll_status(&target)
    }

    fn refresh_contacts_if_due(&mut self) -> Result<(), LinkError> {
        let discovering = self.target.is_none();
        let due = discovering
            || self
                .last_refresh
                .map_or(true, |at| at.elapsed() >= self.contact_refresh);
        if !due {
            return Ok(());
        }

        // Entering discovery means the session may be brand new (startup or
        // post-recovery), so handshake again before asking for contacts.
        if discovering {
            match self.link.app_start() {
                Ok(info) => {
                    if info.has_position() {
                        let labels = node_labels(&info.name);
                        self.sink.set_gauge(
                            &metric_defs::NODE_LATITUDE,
                            &labels,
                            info.latitude(),
                        );
                        self.sink.set_gauge(
                            &metric_defs::NODE_LONGITUDE,
                            &labels,
                            info.longitude(),
                        );
                    }
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    // The tick counts the missing target once; no double
                    // scrape error here.
                    tracing::warn!(error = %err, "companion handshake failed");
                    return Ok(());
                }
            }
        }

        let contacts = match self.link.get_contacts() {
            Ok(contacts) => contacts,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                // Keep the cached target; a stale entry beats none.
                tracing::warn!(error = %err, "contact refresh failed");
                return Ok(());
            }
        };
        self.last_refresh = Some(Instant::now());

        // Every contact that advertises a position gets mapped, not just
        // the polling target.
        for contact in &contacts {
            if contact.has_position() {
                let labels = node_labels(&contact.name);
                self.sink
                    .set_gauge(&metric_defs::NODE_LATITUDE, &labels, contact.latitude());
                self.sink
                    .set_gauge(&metric_defs::NODE_LONGITUDE, &labels, contact.longitude());
            }
        }

        match contacts
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(&self.repeater_name))
        {
            Some(found) => {
                let changed = self
                    .target
                    .as_ref()
                    .map_or(true, |t| t.public_key != found.public_key);
                if changed {
                    tracing::info!(repeater = %found.name, "repeater resolved");
                    self.logged_in = false;
                }
                self.target = Some(found.clone());
            }
            None => {
                tracing::warn!(
                    repeater = %self.repeater_name,
                    known = contacts.len(),
                    "repeater not in contact list"
                );
            }
        }
        Ok(())
    }

    fn login(&mut self, target: &ContactInfo) -> LoginOutcome {
        if let Err(err) = self.link.send_login(target, &self.password) {
            if err.is_fatal() {
                return LoginOutcome::Fatal(err);
            }
            tracing::warn!(error = %err, "login request not accepted");
            self.scrape_error("login request failed");
            return LoginOutcome::Rejected;
        }

        match self.link.wait_for_push(
            &[PUSH_CODE_LOGIN_SUCCESS, PUSH_CODE_LOGIN_FAIL],
            self.login_wait,
        ) {
            Ok(PushNotification::LoginSuccess { .. }) => {
                tracing::info!(repeater = %target.name, "logged in");
                self.logged_in = true;
                self.set_login_gauge(1.0);
                self.sink.inc_counter(
                    &metric_defs::REPEATER_LOGINS,
                    &node_labels(&target.name),
                );
                self.fetch_owner_info(target);
                LoginOutcome::LoggedIn
            }
            Ok(PushNotification::LoginFail { .. }) => {
                tracing::warn!(repeater = %target.name, "login rejected");
                self.set_login_gauge(0.0);
                self.scrape_error("login rejected");
                LoginOutcome::Rejected
            }
            Ok(other) => {
                tracing::warn!(?other, "unexpected push while awaiting login");
                self.scrape_error("unexpected login reply");
                LoginOutcome::Rejected
            }
            Err(LinkError::Timeout) => {
                tracing::warn!(repeater = %target.name, "login unconfirmed within deadline");
                LoginOutcome::Unconfirmed
            }
            Err(err) if err.is_fatal() => LoginOutcome::Fatal(err),
            Err(err) => {
                tracing::warn!(error = %err, "login wait failed");
                self.scrape_error("login wait failed");
                LoginOutcome::Rejected
            }
        }
    }

    /// One-shot owner-info fetch after a fresh login, purely informational.
    fn fetch_owner_info(&self, target: &ContactInfo) {
        if let Err(err) = self.link.send_owner_info_request(target) {
            tracing::debug!(error = %err, "owner info request not accepted");
            return;
        }
        match self
            .link
            .wait_for_push(&[PUSH_CODE_BINARY_RESPONSE], OWNER_INFO_WAIT)
        {
            Ok(PushNotification::BinaryResponse { owner, .. }) => {
                tracing::info!(
                    repeater = %target.name,
                    version = %owner.version,
                    node = %owner.node_name,
                    owner = %owner.owner_info,
                    "repeater owner info"
                );
            }
            Ok(other) => tracing::debug!(?other, "unexpected owner info reply"),
            Err(err) => tracing::debug!(error = %err, "owner info not received"),
        }
    }

    fn poll_status(&mut self, target: &ContactInfo) -> Result<(), LinkError> {
        if let Err(err) = self.link.send_status_request(target) {
            if err.is_fatal() {
                return Err(err);
            }
            tracing::warn!(error = %err, "status request not accepted");
            self.drop_login();
            self.scrape_error("status request failed");
            return Ok(());
        }

        match self
            .link
            .wait_for_push(&[PUSH_CODE_STATUS_RESPONSE], self.status_wait)
        {
            Ok(PushNotification::StatusResponse(status)) => {
                if status.server_prefix != target.public_key.prefix() {
                    tracing::debug!(
                        repeater = %target.name,
                        "status push from a different server prefix"
                    );
                }
                let labels = node_labels(&target.name);
                publish_core_stats(self.sink.as_ref(), &labels, &status.core);
                publish_radio_stats(self.sink.as_ref(), &labels, &status.radio);
                publish_packet_stats(self.sink.as_ref(), &labels, &status.packets);
                // An authenticated status reply confirms a login the push
                // deadline may have missed.
                if !self.logged_in {
                    self.logged_in = true;
                    self.set_login_gauge(1.0);
                }
                Ok(())
            }
            Ok(other) => {
                tracing::warn!(?other, "unexpected push while awaiting status");
                self.scrape_error("unexpected status reply");
                Ok(())
            }
            Err(LinkError::Timeout) => {
                tracing::warn!(repeater = %target.name, "status response timed out");
                self.drop_login();
                self.scrape_error("status timeout");
                Ok(())
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "status wait failed");
                self.scrape_error("status wait failed");
                Ok(())
            }
        }
    }

    /// The repeater stopped answering; assume the session lapsed and log in
    /// again next tick.
    fn drop_login(&mut self) {
        self.logged_in = false;
        self.set_login_gauge(0.0);
    }

    fn set_login_gauge(&self, value: f64) {
        let name = self
            .target
            .as_ref()
            .map_or(self.repeater_name.as_str(), |t| t.name.as_str());
        self.sink
            .set_gauge(&metric_defs::LOGIN_STATUS, &node_labels(name), value);
    }

    fn scrape_error(&self, reason: &str) {
        tracing::warn!(repeater = %self.repeater_name, reason, "remote poll incomplete");
        let name = self
            .target
            .as_ref()
            .map_or(self.repeater_name.as_str(), |t| t.name.as_str());
        self.sink
            .inc_counter(&metric_defs::SCRAPE_ERRORS, &node_labels(name));
    }
}
