//! Step timing observers passed explicitly into reader, writer and job calls.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Receives one notification per completed processing step.
pub trait ObserveStep: Send + Sync {
    /// Called after `step` finished in `elapsed`; `detail` is free-form context.
    fn on_step(&self, step: &str, elapsed: Duration, detail: &str);
}

/// Observer that ignores every step.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ObserveStep for NoopObserver {
    fn on_step(&self, _step: &str, _elapsed: Duration, _detail: &str) {}
}

/// Aggregated timing of one step name.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpecStepStats {
    /// Number of observations.
    pub n_calls: usize,
    /// Sum of all durations.
    pub total: Duration,
    /// Shortest observation.
    pub min: Duration,
    /// Longest observation.
    pub max: Duration,
}

impl SpecStepStats {
    /// Mean duration.
    pub fn avg(&self) -> Duration {
        if self.n_calls == 0 {
            return Duration::ZERO;
        }
        self.total / self.n_calls as u32
    }

    fn record(&mut self, elapsed: Duration) {
        if self.n_calls == 0 {
            self.min = elapsed;
            self.max = elapsed;
        } else {
            self.min = self.min.min(elapsed);
            self.max = self.max.max(elapsed);
        }
        self.n_calls += 1;
        self.total += elapsed;
    }
}

/// Thread-safe collector aggregating step timings.
#[derive(Debug, Default)]
pub struct TimingCollector {
    dict_stats: Mutex<BTreeMap<String, SpecStepStats>>,
}

impl TimingCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all step statistics, keyed by step name.
    pub fn snapshot(&self) -> BTreeMap<String, SpecStepStats> {
        match self.dict_stats.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Statistics of one step.
    pub fn stats(&self, step: &str) -> Option<SpecStepStats> {
        self.snapshot().get(step).copied()
    }

    /// Render steps sorted by total time, slowest first.
    pub fn format_summary(&self) -> String {
        let mut l_stats: Vec<(String, SpecStepStats)> = self.snapshot().into_iter().collect();
        l_stats.sort_by(|a, b| b.1.total.cmp(&a.1.total).then_with(|| a.0.cmp(&b.0)));

        let mut l_lines = vec!["Timing summary:".to_string()];
        for (c_step, stats) in l_stats {
            l_lines.push(format!(
                "  {c_step}: n={} total={:.3}s avg={:.3}s min={:.3}s max={:.3}s",
                stats.n_calls,
                stats.total.as_secs_f64(),
                stats.avg().as_secs_f64(),
                stats.min.as_secs_f64(),
                stats.max.as_secs_f64(),
            ));
        }
        l_lines.join("\n")
    }

    /// Log the summary at info level.
    pub fn log_summary(&self) {
        for c_line in self.format_summary().lines() {
            log::info!("{c_line}");
        }
    }
}

impl ObserveStep for TimingCollector {
    fn on_step(&self, step: &str, elapsed: Duration, detail: &str) {
        log::debug!("step {step} took {:.3}s {detail}", elapsed.as_secs_f64());
        let mut guard = match self.dict_stats.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.entry(step.to_string()).or_default().record(elapsed);
    }
}

/// Measures one step and reports it on [`StepTimer::finish`].
pub struct StepTimer<'a> {
    step: &'a str,
    observer: &'a dyn ObserveStep,
    t_start: Instant,
}

impl<'a> StepTimer<'a> {
    /// Start timing `step`.
    pub fn start(step: &'a str, observer: &'a dyn ObserveStep) -> Self {
        Self {
            step,
            observer,
            t_start: Instant::now(),
        }
    }

    /// Report elapsed time to the observer and return it.
    pub fn finish(self, detail: &str) -> Duration {
        let elapsed = self.t_start.elapsed();
        self.observer.on_step(self.step, elapsed, detail);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ObserveStep, StepTimer, TimingCollector};

    #[test]
    fn test_timing_collector_aggregates_per_step() {
        let collector = TimingCollector::new();
        collector.on_step("read", Duration::from_millis(10), "");
        collector.on_step("read", Duration::from_millis(30), "");
        collector.on_step("write", Duration::from_millis(5), "");

        let stats = collector.stats("read").unwrap();
        assert_eq!(stats.n_calls, 2);
        assert_eq!(stats.total, Duration::from_millis(40));
        assert_eq!(stats.avg(), Duration::from_millis(20));
        assert_eq!(stats.min, Duration::from_millis(10));
        assert_eq!(stats.max, Duration::from_millis(30));

        let c_summary = collector.format_summary();
        let n_pos_read = c_summary.find("read:").unwrap();
        let n_pos_write = c_summary.find("write:").unwrap();
        assert!(n_pos_read < n_pos_write);
    }

    #[test]
    fn test_step_timer_reports_once() {
        let collector = TimingCollector::new();
        StepTimer::start("parse", &collector).finish("rows=3");
        assert_eq!(collector.stats("parse").unwrap().n_calls, 1);
    }
}
