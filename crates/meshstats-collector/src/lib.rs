//! Polling loops for the MeshCore exporter.
//!
//! The collector runs fixed-interval ticks against one shared
//! [`RadioLink`] in one of two mutually exclusive modes: without a repeater
//! configured each tick polls the local radio's three stats groups; with
//! one, each tick walks the remote repeater state machine instead. A fatal
//! transport fault in either mode triggers recovery and a restart of the
//! current tick, so each cycle still produces data once the port is back.

mod local;
pub mod recovery;
mod remote;

pub use local::{publish_core_stats, publish_packet_stats, publish_radio_stats, LocalPoller};
pub use recovery::{recover, RecoveryPolicy};
pub use remote::RemotePoller;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use meshstats_metrics::{metric_defs, node_labels, StatsSink};
use meshstats_radio::{LinkError, RadioLink};

/// Collector configuration.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Pause between completed ticks. Ticks never overlap; a slow tick
    /// delays the next one rather than stacking.
    pub interval: Duration,
    /// Name of the repeater to poll remotely, if any.
    pub repeater: Option<String>,
    /// Password for the repeater login.
    pub password: String,
    /// Deadline for the login push after a login request.
    pub login_wait: Duration,
    /// Deadline for the status push after a status request.
    pub status_wait: Duration,
    /// How often the contact list is refetched.
    pub contact_refresh: Duration,
    /// Recovery timing knobs.
    pub recovery: RecoveryPolicy,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
            repeater: None,
            password: String::new(),
            login_wait: Duration::from_secs(30),
            status_wait: Duration::from_secs(30),
            contact_refresh: Duration::from_secs(3600),
            recovery: RecoveryPolicy::default(),
        }
    }
}

/// Drives the polling loop over one radio link.
pub struct Collector {
    link: Arc<RadioLink>,
    sink: Arc<dyn StatsSink>,
    local: LocalPoller,
    remote: Option<RemotePoller>,
    recovery: RecoveryPolicy,
    interval: Duration,
}

impl Collector {
    /// Build a collector over an already connected link.
    pub fn new(link: Arc<RadioLink>, sink: Arc<dyn StatsSink>, config: CollectorConfig) -> Self {
        let local = LocalPoller::new(link.clone(), sink.clone());
        let remote = config.repeater.map(|name| {
            RemotePoller::new(
                link.clone(),
                sink.clone(),
                name,
                config.password,
                config.login_wait,
                config.status_wait,
                config.contact_refresh,
            )
        });
        Self {
            link,
            sink,
            local,
            remote,
            recovery: config.recovery,
            interval: config.interval,
        }
    }

    /// Run ticks until the shutdown flag is set.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        self.startup();
        while !shutdown.load(Ordering::Relaxed) {
            self.tick();
            self.sleep_interval(shutdown);
        }
        tracing::info!("collector stopped");
    }

    /// Handshake with the radio before the first tick: adopt the node name,
    /// publish its position, log the firmware version.
    fn startup(&mut self) {
        loop {
            match self.initialize() {
                Ok(()) => return,
                Err(err) if err.is_fatal() => {
                    tracing::error!(error = %err, "startup handshake failed");
                    self.recover_and_reset();
                }
                Err(err) => {
                    // A confused but present radio is a polling problem,
                    // not a startup one.
                    tracing::warn!(error = %err, "startup handshake incomplete");
                    return;
                }
            }
        }
    }

    fn initialize(&self) -> Result<(), LinkError> {
        let info = self.link.app_start()?;
        if info.has_position() {
            let labels = node_labels(&info.name);
            self.sink
                .set_gauge(&metric_defs::NODE_LATITUDE, &labels, info.latitude());
            self.sink
                .set_gauge(&metric_defs::NODE_LONGITUDE, &labels, info.longitude());
        }
        match self.link.get_version() {
            Ok(version) => tracing::info!(node = %info.name, %version, "radio ready"),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => tracing::warn!(error = %err, "version query failed"),
        }
        Ok(())
    }

    /// Run one tick, recovering and restarting it on fatal faults.
    pub fn tick(&mut self) {
        loop {
            match self.try_tick() {
                Ok(()) => return,
                Err(err) => {
                    tracing::error!(error = %err, "fatal transport fault during poll");
                    self.recover_and_reset();
                }
            }
        }
    }

    fn try_tick(&mut self) -> Result<(), LinkError> {
        match &mut self.remote {
            Some(remote) => remote.tick(),
            None => self.local.collect(),
        }
    }

    fn recover_and_reset(&mut self) {
        recovery::recover(self.link.as_ref(), self.sink.as_ref(), &self.recovery);
        if let Some(remote) = &mut self.remote {
            remote.reset();
        }
    }

    fn sleep_interval(&self, shutdown: &AtomicBool) {
        let deadline = Instant::now() + self.interval;
        while Instant::now() < deadline {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            thread::sleep(remaining.min(Duration::from_millis(250)));
        }
    }
}
