//! In-process sample source.
//!
//! Two metrics are produced: the `PollCount` counter, incremented on every
//! poll, and the `RandomValue` gauge, redrawn on every poll.

use metricsd_types::Metric;
use rand::Rng;

/// Name of the poll counter.
pub const POLL_COUNT: &str = "PollCount";
/// Name of the random gauge.
pub const RANDOM_VALUE: &str = "RandomValue";

/// Accumulates samples between reports.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Sampler {
    poll_count: i64,
    random_value: f64,
}

impl Sampler {
    /// Create a sampler with nothing polled yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take one sample.
    pub fn poll<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.poll_count = self.poll_count.wrapping_add(1);
        self.random_value = rng.random();
    }

    /// Polls since the last acknowledged report.
    pub const fn poll_count(&self) -> i64 {
        self.poll_count
    }

    /// The current batch. `PollCount` is a delta since the last report.
    pub fn metrics(&self) -> Vec<Metric> {
        vec![
            Metric::counter(POLL_COUNT, self.poll_count),
            Metric::gauge(RANDOM_VALUE, self.random_value),
        ]
    }

    /// Forget `sent` polls once the collector has accepted them.
    pub const fn acknowledge(&mut self, sent: i64) {
        self.poll_count = self.poll_count.wrapping_sub(sent);
    }
}
