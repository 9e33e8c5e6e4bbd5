//! Metrics infrastructure for the MeshCore exporter.
//!
//! This crate declares every published observation as a structured [`Metric`]
//! constant to avoid typos and provide rich metadata, and defines the
//! [`StatsSink`] trait that the polling routines observe through. The real
//! sink forwards to the `metrics` facade (exported by the Prometheus
//! recorder installed in the binary); tests use [`testing::RecordingSink`].
//!
//! # Example
//!
//! ```rust,ignore
//! use meshstats_metrics::{metric_defs, node_labels, FacadeSink, StatsSink};
//!
//! let sink = FacadeSink;
//! sink.set_gauge(&metric_defs::BATTERY_MILLIVOLTS, &node_labels("local"), 3700.0);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, Unit};

/// A metric label pair.
pub type Label = (&'static str, String);

/// The kind of metric (counter or gauge).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A gauge that can go up and down.
    Gauge,
}

/// A metric declaration with its metadata.
///
/// Use the const constructors to create metrics at compile time.
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g. "meshstats.battery_millivolts").
    pub name: &'static str,
    /// The kind of metric.
    pub kind: MetricKind,
    /// Human-readable description of the metric.
    pub description: &'static str,
    /// The unit of measurement (optional).
    pub unit: Option<Unit>,
    /// Expected label keys for this metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    /// Creates a new counter metric with the given name.
    pub const fn counter(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Counter,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Creates a new gauge metric with the given name.
    pub const fn gauge(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Gauge,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Sets the description for the metric.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit for the metric.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys for the metric.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the metrics recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Gauge, Some(unit)) => {
                describe_gauge!(self.name, unit, self.description);
            }
            (MetricKind::Gauge, None) => {
                describe_gauge!(self.name, self.description);
            }
        }
    }
}

/// All metric definitions for the exporter.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Labels on node-scoped metrics.
    pub const NODE_LABELS: &[&str] = &["node"];
    /// Labels on mesh-traffic metrics.
    pub const SENDER_LABELS: &[&str] = &["node", "sender"];

    // ========================================================================
    // Core Stats
    // ========================================================================

    /// Battery voltage in millivolts.
    pub const BATTERY_MILLIVOLTS: Metric = Metric::gauge("meshstats.battery_millivolts")
        .with_description("Battery voltage in millivolts")
        .with_labels(NODE_LABELS);

    /// Device uptime in seconds.
    pub const UPTIME_SECONDS: Metric = Metric::gauge("meshstats.uptime_seconds")
        .with_description("Device uptime in seconds")
        .with_unit(Unit::Seconds)
        .with_labels(NODE_LABELS);

    /// Error flags bitmask.
    pub const ERROR_FLAGS: Metric = Metric::gauge("meshstats.error_flags")
        .with_description("Error flags bitmask")
        .with_labels(NODE_LABELS);

    /// Outbound packet queue length.
    pub const QUEUE_LENGTH: Metric = Metric::gauge("meshstats.queue_length")
        .with_description("Outbound packet queue length")
        .with_unit(Unit::Count)
        .with_labels(NODE_LABELS);

    // ========================================================================
    // Radio Stats
    // ========================================================================

    /// Radio noise floor in dBm.
    pub const NOISE_FLOOR_DBM: Metric = Metric::gauge("meshstats.noise_floor_dbm")
        .with_description("Radio noise floor in dBm")
        .with_labels(NODE_LABELS);

    /// Last received signal strength in dBm.
    pub const LAST_RSSI_DBM: Metric = Metric::gauge("meshstats.last_rssi_dbm")
        .with_description("Last received signal strength in dBm")
        .with_labels(NODE_LABELS);

    /// Last signal-to-noise ratio in dB.
    pub const LAST_SNR_DB: Metric = Metric::gauge("meshstats.last_snr_db")
        .with_description("Last signal-to-noise ratio in dB")
        .with_labels(NODE_LABELS);

    /// Cumulative transmit airtime in seconds.
    pub const TX_AIRTIME_SECONDS: Metric = Metric::gauge("meshstats.tx_airtime_seconds_total")
        .with_description("Cumulative transmit airtime in seconds")
        .with_unit(Unit::Seconds)
        .with_labels(NODE_LABELS);

    /// Cumulative receive airtime in seconds.
    pub const RX_AIRTIME_SECONDS: Metric = Metric::gauge("meshstats.rx_airtime_seconds_total")
        .with_description("Cumulative receive airtime in seconds")
        .with_unit(Unit::Seconds)
        .with_labels(NODE_LABELS);

    // ========================================================================
    // Packet Stats
    // ========================================================================

    /// Total packets received.
    pub const PACKETS_RECEIVED: Metric = Metric::gauge("meshstats.packets_received_total")
        .with_description("Total packets received")
        .with_unit(Unit::Count)
        .with_labels(NODE_LABELS);

    /// Total packets sent.
    pub const PACKETS_SENT: Metric = Metric::gauge("meshstats.packets_sent_total")
        .with_description("Total packets sent")
        .with_unit(Unit::Count)
        .with_labels(NODE_LABELS);

    /// Packets sent via flood routing.
    pub const PACKETS_FLOOD_TX: Metric = Metric::gauge("meshstats.packets_flood_tx_total")
        .with_description("Packets sent via flood routing")
        .with_unit(Unit::Count)
        .with_labels(NODE_LABELS);

    /// Packets sent via direct routing.
    pub const PACKETS_DIRECT_TX: Metric = Metric::gauge("meshstats.packets_direct_tx_total")
        .with_description("Packets sent via direct routing")
        .with_unit(Unit::Count)
        .with_labels(NODE_LABELS);

    /// Packets received via flood routing.
    pub const PACKETS_FLOOD_RX: Metric = Metric::gauge("meshstats.packets_flood_rx_total")
        .with_description("Packets received via flood routing")
        .with_unit(Unit::Count)
        .with_labels(NODE_LABELS);

    /// Packets received via direct routing.
    pub const PACKETS_DIRECT_RX: Metric = Metric::gauge("meshstats.packets_direct_rx_total")
        .with_description("Packets received via direct routing")
        .with_unit(Unit::Count)
        .with_labels(NODE_LABELS);

    // ========================================================================
    // Session / Health
    // ========================================================================

    /// Total number of scrape errors.
    pub const SCRAPE_ERRORS: Metric = Metric::counter("meshstats.scrape_errors_total")
        .with_description("Total number of scrape errors")
        .with_unit(Unit::Count)
        .with_labels(NODE_LABELS);

    /// Login status (1 = logged in, 0 = not logged in).
    pub const LOGIN_STATUS: Metric = Metric::gauge("meshstats.login_status")
        .with_description("Login status (1=logged in, 0=not logged in)")
        .with_labels(NODE_LABELS);

    /// Total successful repeater logins.
    pub const REPEATER_LOGINS: Metric = Metric::counter("meshstats.repeater_logins_total")
        .with_description("Total successful repeater logins")
        .with_unit(Unit::Count)
        .with_labels(NODE_LABELS);

    /// Total companion radio reboot commands sent.
    pub const RADIO_REBOOTS: Metric = Metric::counter("meshstats.radio_reboots_total")
        .with_description("Total companion radio reboot commands sent")
        .with_unit(Unit::Count)
        .with_labels(NODE_LABELS);

    /// Total serial port reconnections.
    pub const SERIAL_RECONNECTS: Metric = Metric::counter("meshstats.serial_reconnects_total")
        .with_description("Total serial port reconnections")
        .with_unit(Unit::Count)
        .with_labels(NODE_LABELS);

    /// Path-hash collisions observed while rebuilding the contact directory.
    pub const DIRECTORY_COLLISIONS: Metric = Metric::counter("meshstats.directory_collisions_total")
        .with_description("Contacts sharing a truncated path-hash byte (first registration wins)")
        .with_unit(Unit::Count)
        .with_labels(NODE_LABELS);

    // ========================================================================
    // Node Position
    // ========================================================================

    /// Node latitude in degrees.
    pub const NODE_LATITUDE: Metric = Metric::gauge("meshstats.node_latitude")
        .with_description("Node latitude in degrees")
        .with_labels(NODE_LABELS);

    /// Node longitude in degrees.
    pub const NODE_LONGITUDE: Metric = Metric::gauge("meshstats.node_longitude")
        .with_description("Node longitude in degrees")
        .with_labels(NODE_LABELS);

    // ========================================================================
    // Mesh Traffic (from rx-log pushes)
    // ========================================================================

    /// Mesh packets observed, attributed to a sender.
    pub const MESH_PACKETS_OBSERVED: Metric = Metric::counter("meshstats.mesh_packets_observed_total")
        .with_description("Mesh packets overheard by the companion radio")
        .with_unit(Unit::Count)
        .with_labels(SENDER_LABELS);

    /// Last RSSI of packets from a mesh sender.
    pub const MESH_PACKET_RSSI: Metric = Metric::gauge("meshstats.mesh_packet_rssi_dbm")
        .with_description("Last RSSI of packets from a mesh sender")
        .with_labels(SENDER_LABELS);

    /// Last SNR of packets from a mesh sender.
    pub const MESH_PACKET_SNR: Metric = Metric::gauge("meshstats.mesh_packet_snr_db")
        .with_description("Last SNR of packets from a mesh sender")
        .with_labels(SENDER_LABELS);

    /// Total payload bytes observed from mesh senders.
    pub const MESH_PACKET_BYTES: Metric = Metric::counter("meshstats.mesh_packet_bytes_total")
        .with_description("Total payload bytes observed from mesh senders")
        .with_unit(Unit::Bytes)
        .with_labels(SENDER_LABELS);

    /// Returns a slice of all defined metrics.
    pub const ALL: &[&Metric] = &[
        &BATTERY_MILLIVOLTS,
        &UPTIME_SECONDS,
        &ERROR_FLAGS,
        &QUEUE_LENGTH,
        &NOISE_FLOOR_DBM,
        &LAST_RSSI_DBM,
        &LAST_SNR_DB,
        &TX_AIRTIME_SECONDS,
        &RX_AIRTIME_SECONDS,
        &PACKETS_RECEIVED,
        &PACKETS_SENT,
        &PACKETS_FLOOD_TX,
        &PACKETS_DIRECT_TX,
        &PACKETS_FLOOD_RX,
        &PACKETS_DIRECT_RX,
        &SCRAPE_ERRORS,
        &LOGIN_STATUS,
        &REPEATER_LOGINS,
        &RADIO_REBOOTS,
        &SERIAL_RECONNECTS,
        &DIRECTORY_COLLISIONS,
        &NODE_LATITUDE,
        &NODE_LONGITUDE,
        &MESH_PACKETS_OBSERVED,
        &MESH_PACKET_RSSI,
        &MESH_PACKET_SNR,
        &MESH_PACKET_BYTES,
    ];
}

/// Labels for a node-scoped observation.
pub fn node_labels(node: &str) -> Vec<Label> {
    vec![("node", node.to_string())]
}

/// Labels for a mesh-traffic observation attributed to a sender.
pub fn sender_labels(node: &str, sender: &str) -> Vec<Label> {
    vec![("node", node.to_string()), ("sender", sender.to_string())]
}

/// The narrow observation capability the polling routines publish through.
///
/// Implementations must be safe for concurrent use; the Prometheus endpoint
/// scrapes while the polling task records.
pub trait StatsSink: Send + Sync {
    /// Set a gauge to the given value.
    fn set_gauge(&self, metric: &Metric, labels: &[Label], value: f64);

    /// Add to a counter.
    fn add_counter(&self, metric: &Metric, labels: &[Label], value: u64);

    /// Increment a counter by one.
    fn inc_counter(&self, metric: &Metric, labels: &[Label]) {
        self.add_counter(metric, labels, 1);
    }
}

/// Sink backed by the global `metrics` facade.
///
/// Whatever recorder the binary installs (the Prometheus exporter in
/// production) receives these observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacadeSink;

impl StatsSink for FacadeSink {
    fn set_gauge(&self, metric: &Metric, labels: &[Label], value: f64) {
        metrics::gauge!(metric.name, labels).set(value);
    }

    fn add_counter(&self, metric: &Metric, labels: &[Label], value: u64) {
        metrics::counter!(metric.name, labels).increment(value);
    }
}

/// Describes all metrics with the installed recorder.
///
/// Call once at startup, after installing the recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

/// Test support: an in-memory sink that records every observation.
pub mod testing {
    use super::{Label, Metric, MetricKind, StatsSink};
    use parking_lot::Mutex;

    /// One recorded observation.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Observation {
        /// Metric name.
        pub name: &'static str,
        /// Metric kind.
        pub kind: MetricKind,
        /// Label pairs as recorded.
        pub labels: Vec<(String, String)>,
        /// Gauge value, or counter delta.
        pub value: f64,
    }

    /// A sink that stores observations for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        observations: Mutex<Vec<Observation>>,
    }

    impl RecordingSink {
        /// Create an empty recording sink.
        pub fn new() -> Self {
            Self::default()
        }

        /// All observations recorded so far.
        pub fn observations(&self) -> Vec<Observation> {
            self.observations.lock().clone()
        }

        /// The last gauge value set for a metric, across any labels.
        pub fn last_gauge(&self, name: &str) -> Option<f64> {
            self.observations
                .lock()
                .iter()
                .rev()
                .find(|o| o.kind == MetricKind::Gauge && o.name == name)
                .map(|o| o.value)
        }

        /// Sum of counter increments for a metric, across any labels.
        pub fn counter_total(&self, name: &str) -> f64 {
            self.observations
                .lock()
                .iter()
                .filter(|o| o.kind == MetricKind::Counter && o.name == name)
                .map(|o| o.value)
                .sum()
        }

        /// Observations for a metric restricted to a label pair.
        pub fn with_label(&self, name: &str, key: &str, value: &str) -> Vec<Observation> {
            self.observations
                .lock()
                .iter()
                .filter(|o| {
                    o.name == name
                        && o.labels.iter().any(|(k, v)| k == key && v == value)
                })
                .cloned()
                .collect()
        }
    }

    impl StatsSink for RecordingSink {
        fn set_gauge(&self, metric: &Metric, labels: &[Label], value: f64) {
            self.observations.lock().push(Observation {
                name: metric.name,
                kind: MetricKind::Gauge,
                labels: labels.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                value,
            });
        }

        fn add_counter(&self, metric: &Metric, labels: &[Label], value: u64) {
            self.observations.lock().push(Observation {
                name: metric.name,
                kind: MetricKind::Counter,
                labels: labels.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                value: value as f64,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;

    #[test]
    fn test_metric_definitions() {
        assert_eq!(metric_defs::BATTERY_MILLIVOLTS.name, "meshstats.battery_millivolts");
        assert_eq!(metric_defs::BATTERY_MILLIVOLTS.kind, MetricKind::Gauge);
        assert_eq!(metric_defs::SCRAPE_ERRORS.kind, MetricKind::Counter);
        assert_eq!(metric_defs::MESH_PACKET_BYTES.labels, &["node", "sender"]);
    }

    #[test]
    fn test_all_metrics_count() {
        assert_eq!(metric_defs::ALL.len(), 27);
    }

    #[test]
    fn test_recording_sink_gauges_and_counters() {
        let sink = RecordingSink::new();
        let labels = node_labels("local");

        sink.set_gauge(&metric_defs::BATTERY_MILLIVOLTS, &labels, 3700.0);
        sink.set_gauge(&metric_defs::BATTERY_MILLIVOLTS, &labels, 3650.0);
        sink.inc_counter(&metric_defs::SCRAPE_ERRORS, &labels);
        sink.add_counter(&metric_defs::SCRAPE_ERRORS, &labels, 2);

        assert_eq!(sink.last_gauge("meshstats.battery_millivolts"), Some(3650.0));
        assert_eq!(sink.counter_total("meshstats.scrape_errors_total"), 3.0);
    }

    #[test]
    fn test_sender_labels() {
        let labels = sender_labels("base", "Hilltop");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1], ("sender", "Hilltop".to_string()));
    }
}
