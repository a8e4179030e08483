//! The poll/report loop.

use std::time::Duration;

use metricsd_crypto::Signer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::error::ReporterError;
use crate::sampler::Sampler;
use crate::transport::Transport;

/// Samples on one interval and reports on another.
#[derive(Debug)]
pub struct Reporter {
    sampler: Sampler,
    rng: StdRng,
    signer: Signer,
    transport: Transport,
}

impl Reporter {
    /// Create a reporter that signs with `signer` and delivers over
    /// `transport`.
    pub fn new(signer: Signer, transport: Transport) -> Self {
        Self {
            sampler: Sampler::new(),
            rng: StdRng::from_os_rng(),
            signer,
            transport,
        }
    }

    /// The samples accumulated so far.
    pub const fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Take one sample.
    pub fn poll(&mut self) {
        self.sampler.poll(&mut self.rng);
    }

    /// Sign and send the current batch.
    ///
    /// `PollCount` is only reset once the collector has accepted the batch,
    /// so a failed report is retried with the accumulated delta.
    ///
    /// # Errors
    ///
    /// Returns [`ReporterError`] if signing or delivery fails.
    pub async fn report(&mut self) -> Result<(), ReporterError> {
        let mut batch = self.sampler.metrics();
        for metric in &mut batch {
            self.signer.sign(metric)?;
        }
        let sent = self.sampler.poll_count();
        self.transport.send(&batch).await?;
        self.sampler.acknowledge(sent);
        Ok(())
    }

    /// Poll and report on their intervals until shutdown is requested.
    ///
    /// Report failures are logged and the loop carries on.
    pub async fn run(
        mut self,
        poll_interval: Duration,
        report_interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut poll = tokio::time::interval(poll_interval);
        let mut report = tokio::time::interval(report_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        report.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        report.tick().await;

        tracing::info!(
            transport = self.transport.name(),
            poll_ms = poll_interval.as_millis(),
            report_ms = report_interval.as_millis(),
            "Reporter started"
        );

        loop {
            tokio::select! {
                _ = poll.tick() => self.poll(),
                _ = report.tick() => {
                    if let Err(e) = self.report().await {
                        tracing::warn!(
                            transport = self.transport.name(),
                            pending = self.sampler.poll_count(),
                            error = %e,
                            "Report failed"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("Reporter stopped");
    }
}
