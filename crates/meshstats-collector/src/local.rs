//! Local radio polling: the three per-type stats requests.

use std::sync::Arc;

use meshstats_metrics::{metric_defs, node_labels, Label, StatsSink};
use meshstats_protocol::{CoreStats, PacketStats, RadioStats};
use meshstats_radio::{LinkError, RadioLink};

/// Polls the directly attached radio each tick.
pub struct LocalPoller {
    link: Arc<RadioLink>,
    sink: Arc<dyn StatsSink>,
}

impl LocalPoller {
    /// Create a poller over the shared link.
    pub fn new(link: Arc<RadioLink>, sink: Arc<dyn StatsSink>) -> Self {
        Self { link, sink }
    }

    /// Run one collection pass.
    ///
    /// The three stats groups are requested independently; a bad answer to
    /// one is counted and the others still run. Only a fatal transport
    /// fault propagates, so the caller can recover and restart the tick.
    pub fn collect(&self) -> Result<(), LinkError> {
        let node = self.link.node_name();
        let labels = node_labels(&node);

        match self.link.get_core_stats() {
            Ok(stats) => publish_core_stats(self.sink.as_ref(), &labels, &stats),
            Err(err) => self.request_failed("core", &labels, err)?,
        }

        match self.link.get_radio_stats() {
            Ok(stats) => publish_radio_stats(self.sink.as_ref(), &labels, &stats),
            Err(err) => self.request_failed("radio", &labels, err)?,
        }

        match self.link.get_packet_stats() {
            Ok(stats) => publish_packet_stats(self.sink.as_ref(), &labels, &stats),
            Err(err) => self.request_failed("packets", &labels, err)?,
        }

        Ok(())
    }

    fn request_failed(
        &self,
        group: &str,
        labels: &[Label],
        err: LinkError,
    ) -> Result<(), LinkError> {
        if err.is_fatal() {
            return Err(err);
        }
        tracing::warn!(group, error = %err, "local stats request failed");
        self.sink.inc_counter(&metric_defs::SCRAPE_ERRORS, labels);
        Ok(())
    }
}

/// Publish core stats under the given node labels.
pub fn publish_core_stats(sink: &dyn StatsSink, labels: &[Label], stats: &CoreStats) {
    sink.set_gauge(&metric_defs::BATTERY_MILLIVOLTS, labels, stats.battery_mv as f64);
    sink.set_gauge(&metric_defs::UPTIME_SECONDS, labels, stats.uptime_secs as f64);
    sink.set_gauge(&metric_defs::ERROR_FLAGS, labels, stats.error_flags as f64);
    sink.set_gauge(&metric_defs::QUEUE_LENGTH, labels, stats.queue_len as f64);
}

/// Publish radio stats under the given node labels.
pub fn publish_radio_stats(sink: &dyn StatsSink, labels: &[Label], stats: &RadioStats) {
    sink.set_gauge(&metric_defs::NOISE_FLOOR_DBM, labels, stats.noise_floor as f64);
    sink.set_gauge(&metric_defs::LAST_RSSI_DBM, labels, stats.last_rssi as f64);
    sink.set_gauge(&metric_defs::LAST_SNR_DB, labels, stats.last_snr());
    sink.set_gauge(&metric_defs::TX_AIRTIME_SECONDS, labels, stats.tx_air_secs as f64);
    sink.set_gauge(&metric_defs::RX_AIRTIME_SECONDS, labels, stats.rx_air_secs as f64);
}

/// Publish packet stats under the given node labels.
///
/// These are device-side cumulative totals read back each tick, so they are
/// exported as gauges rather than host-side counters.
pub fn publish_packet_stats(sink: &dyn StatsSink, labels: &[Label], stats: &PacketStats) {
    sink.set_gauge(&metric_defs::PACKETS_RECEIVED, labels, stats.recv as f64);
    sink.set_gauge(&metric_defs::PACKETS_SENT, labels, stats.sent as f64);
    sink.set_gauge(&metric_defs::PACKETS_FLOOD_TX, labels, stats.sent_flood as f64);
    sink.set_gauge(&metric_defs::PACKETS_DIRECT_TX, labels, stats.sent_direct as f64);
    sink.set_gauge(&metric_defs::PACKETS_FLOOD_RX, labels, stats.recv_flood as f64);
    sink.set_gauge(&metric_defs::PACKETS_DIRECT_RX, labels, stats.recv_direct as f64);
}
