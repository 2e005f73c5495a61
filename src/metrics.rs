//! Metrics collection for launch runs
//!
//! A run is one-shot, so nothing is served over HTTP; `render()` produces the
//! text exposition format for `--metrics`.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};
use std::time::Instant;

use crate::errors::MintError;

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub runs_total: IntCounter,
    pub submissions_total: IntCounter,
    pub confirmed_total: IntCounter,
    pub expired_total: IntCounter,
    pub rejected_total: IntCounter,
    pub rebuilds_total: IntCounter,
    pub failures_total: IntCounter,

    // Histograms
    pub confirmation_latency: Histogram,
    pub build_latency: Histogram,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let runs_total = IntCounter::with_opts(Opts::new(
            "launch_runs_total",
            "Total number of launch runs started",
        ))?;

        let submissions_total = IntCounter::with_opts(Opts::new(
            "launch_submissions_total",
            "Signed transactions sent to the cluster",
        ))?;

        let confirmed_total = IntCounter::with_opts(Opts::new(
            "launch_confirmed_total",
            "Launches that reached the requested commitment",
        ))?;

        let expired_total = IntCounter::with_opts(Opts::new(
            "launch_expired_total",
            "Submissions whose block-reference expired before landing",
        ))?;

        let rejected_total = IntCounter::with_opts(Opts::new(
            "launch_rejected_total",
            "Submissions rejected by the ledger or preflight",
        ))?;

        let rebuilds_total = IntCounter::with_opts(Opts::new(
            "launch_rebuilds_total",
            "Rebuilds with a fresh block-reference after expiry",
        ))?;

        let failures_total = IntCounter::with_opts(Opts::new(
            "launch_failures_total",
            "Runs that ended in an error",
        ))?;

        let confirmation_latency = Histogram::with_opts(
            HistogramOpts::new(
                "launch_confirmation_latency_seconds",
                "Time from submission to confirmation",
            )
            .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0, 90.0]),
        )?;

        let build_latency = Histogram::with_opts(
            HistogramOpts::new("launch_build_latency_seconds", "Instruction build and signing latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.02, 0.05, 0.1, 0.5]),
        )?;

        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(submissions_total.clone()))?;
        registry.register(Box::new(confirmed_total.clone()))?;
        registry.register(Box::new(expired_total.clone()))?;
        registry.register(Box::new(rejected_total.clone()))?;
        registry.register(Box::new(rebuilds_total.clone()))?;
        registry.register(Box::new(failures_total.clone()))?;
        registry.register(Box::new(confirmation_latency.clone()))?;
        registry.register(Box::new(build_latency.clone()))?;

        Ok(Self {
            registry,
            runs_total,
            submissions_total,
            confirmed_total,
            expired_total,
            rejected_total,
            rebuilds_total,
            failures_total,
            confirmation_latency,
            build_latency,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Count a run that ended in `err`
    pub fn record_failure(&self, err: &MintError) {
        self.failures_total.inc();
        match err {
            MintError::SubmissionExpired { .. } => self.expired_total.inc(),
            MintError::OnChainRejection { .. } => self.rejected_total.inc(),
            _ => {}
        }
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_counters() {
        let m = Metrics::new().unwrap();
        m.runs_total.inc();
        m.record_failure(&MintError::SubmissionExpired {
            signature: "sig".to_string(),
            last_valid_block_height: 1,
        });

        let text = m.render().unwrap();
        assert!(text.contains("launch_runs_total 1"));
        assert!(text.contains("launch_expired_total 1"));
        assert!(text.contains("launch_failures_total 1"));
    }

    #[test]
    fn test_timer_observes() {
        let m = Metrics::new().unwrap();
        let timer = Timer::new();
        timer.observe_duration(&m.build_latency);
        assert_eq!(m.build_latency.get_sample_count(), 1);
    }
}
