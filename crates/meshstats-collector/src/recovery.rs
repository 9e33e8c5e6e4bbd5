//! Fault recovery: best-effort reboot, then reconnect until the port is back.

use std::thread;
use std::time::Duration;

use meshstats_metrics::{metric_defs, node_labels, StatsSink};
use meshstats_radio::RadioLink;

/// Timing knobs for the recovery sequence.
#[derive(Debug, Clone)]
pub struct RecoveryPolicy {
    /// Pause after the reboot command before the first reconnect attempt.
    pub reboot_settle: Duration,
    /// Delay unit between reconnect attempts; attempt N waits N units.
    pub base_delay: Duration,
    /// Upper bound on the per-attempt delay.
    pub max_delay: Duration,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            reboot_settle: Duration::from_secs(5),
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

/// Recover from a fatal transport fault.
///
/// Sends a reboot command in case the radio is wedged but the port still
/// accepts writes, then reopens the port with linearly growing delays until
/// it succeeds. There is no attempt limit: the exporter's job is to outlast
/// flaky hardware, and the Prometheus endpoint keeps serving the last good
/// values throughout.
pub fn recover(link: &RadioLink, sink: &dyn StatsSink, policy: &RecoveryPolicy) {
    let labels = node_labels(&link.node_name());

    tracing::warn!("transport fault, starting recovery");
    match link.reboot() {
        Ok(()) => tracing::info!("reboot command accepted"),
        Err(err) => tracing::debug!(error = %err, "reboot command failed"),
    }
    sink.inc_counter(&metric_defs::RADIO_REBOOTS, &labels);
    thread::sleep(policy.reboot_settle);

    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match link.reconnect() {
            Ok(()) => {
                sink.inc_counter(&metric_defs::SERIAL_RECONNECTS, &labels);
                // Whatever the radio queued before the fault is stale now
                // and must not be correlated with the next command.
                link.drain();
                tracing::info!(attempt, "transport recovered");
                return;
            }
            Err(err) => {
                let delay = policy
                    .base_delay
                    .saturating_mul(attempt)
                    .min(policy.max_delay);
                tracing::warn!(attempt, error = %err, delay = ?delay, "reconnect failed");
                thread::sleep(delay);
            }
        }
    }
}
