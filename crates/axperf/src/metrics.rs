//! Metrics export using metrics-rs.
//!
//! Publishes report counters as `axperf_*` metrics, and provides a simple
//! in-memory recorder for printing them at the end of a CLI run.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit, counter,
    describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use parking_lot::RwLock;

use crate::{ReadCategory, Report, WriteCategory};

// ============================================================================
// Metric descriptions
// ============================================================================

/// Register metric descriptions. Call once at startup.
pub fn init() {
    describe_counter!(
        "axperf_active_cycles_total",
        Unit::Count,
        "Cycles counted while triggered"
    );
    describe_counter!(
        "axperf_write_cycles_total",
        Unit::Count,
        "Write-channel cycles per category"
    );
    describe_counter!(
        "axperf_read_cycles_total",
        Unit::Count,
        "Read-channel cycles per category"
    );
    describe_counter!("axperf_bursts_total", Unit::Count, "Address handshakes");
    describe_counter!("axperf_beats_total", Unit::Count, "Data handshakes");
    describe_counter!("axperf_bytes_total", Unit::Bytes, "Bytes transferred");

    describe_gauge!(
        "axperf_utilisation",
        Unit::Count,
        "Fraction of active cycles carrying a data beat (0-1)"
    );
    describe_gauge!(
        "axperf_max_outstanding",
        Unit::Count,
        "Deepest outstanding burst count seen"
    );
    describe_gauge!(
        "axperf_write_bias",
        Unit::Count,
        "Data-lag minus address-lag cycles"
    );

    describe_histogram!(
        "axperf_replay_duration_seconds",
        Unit::Seconds,
        "Wall-clock time to replay a trace"
    );
}

// ============================================================================
// Metric recording functions
// ============================================================================

/// Publish a report. `trace` labels every metric.
#[allow(clippy::cast_precision_loss)]
pub fn record_report(trace: &str, report: &Report) {
    let labels = [("trace", trace.to_string())];
    counter!("axperf_active_cycles_total", &labels).absolute(report.active_time);

    for category in WriteCategory::ALL {
        let labels = [
            ("trace", trace.to_string()),
            ("category", category.name().to_string()),
        ];
        counter!("axperf_write_cycles_total", &labels).absolute(report.write.category(category));
    }
    for category in ReadCategory::ALL {
        let labels = [
            ("trace", trace.to_string()),
            ("category", category.name().to_string()),
        ];
        counter!("axperf_read_cycles_total", &labels).absolute(report.read.category(category));
    }

    for (channel, bursts, beats, bytes, outstanding, utilisation) in [
        (
            "write",
            report.write.bursts(),
            report.write.beats(),
            report.write.data_bytes(),
            report.write.max_outstanding(),
            report.write_utilisation(),
        ),
        (
            "read",
            report.read.bursts(),
            report.read.beats(),
            report.read.bytes(),
            report.read.max_outstanding(),
            report.read_utilisation(),
        ),
    ] {
        let labels = [("trace", trace.to_string()), ("channel", channel.to_string())];
        counter!("axperf_bursts_total", &labels).absolute(bursts);
        counter!("axperf_beats_total", &labels).absolute(beats);
        counter!("axperf_bytes_total", &labels).absolute(bytes);
        gauge!("axperf_max_outstanding", &labels).set(f64::from(outstanding));
        gauge!("axperf_utilisation", &labels).set(utilisation);
    }

    gauge!("axperf_write_bias", &labels).set(report.write.bias() as f64);
}

/// Record how long a replay took.
pub fn record_replay_duration(trace: &str, secs: f64) {
    let labels = [("trace", trace.to_string())];
    histogram!("axperf_replay_duration_seconds", &labels).record(secs);
}

// ============================================================================
// CLI Recorder for terminal output
// ============================================================================

#[derive(Default)]
struct CounterStorage {
    values: RwLock<HashMap<String, u64>>,
}

#[derive(Default)]
struct GaugeStorage {
    values: RwLock<HashMap<String, f64>>,
}

#[derive(Default)]
struct HistogramStorage {
    values: RwLock<HashMap<String, Vec<f64>>>,
}

struct CliCounter {
    key: String,
    storage: Arc<CounterStorage>,
}

impl metrics::CounterFn for CliCounter {
    fn increment(&self, value: u64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0) += value;
    }

    fn absolute(&self, value: u64) {
        self.storage.values.write().insert(self.key.clone(), value);
    }
}

struct CliGauge {
    key: String,
    storage: Arc<GaugeStorage>,
}

impl metrics::GaugeFn for CliGauge {
    fn increment(&self, value: f64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0.0) += value;
    }

    fn decrement(&self, value: f64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0.0) -= value;
    }

    fn set(&self, value: f64) {
        self.storage.values.write().insert(self.key.clone(), value);
    }
}

struct CliHistogram {
    key: String,
    storage: Arc<HistogramStorage>,
}

impl metrics::HistogramFn for CliHistogram {
    fn record(&self, value: f64) {
        let mut values = self.storage.values.write();
        values.entry(self.key.clone()).or_default().push(value);
    }
}

/// Recorder that keeps metrics in memory for a terminal summary.
#[derive(Default)]
pub struct CliRecorder {
    counters: Arc<CounterStorage>,
    gauges: Arc<GaugeStorage>,
    histograms: Arc<HistogramStorage>,
}

impl CliRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle onto this recorder's storage.
    #[must_use]
    pub fn handle(&self) -> CliRecorderHandle {
        CliRecorderHandle {
            counters: Arc::clone(&self.counters),
            gauges: Arc::clone(&self.gauges),
            histograms: Arc::clone(&self.histograms),
        }
    }

    /// Install as the global recorder.
    ///
    /// Returns `None` if a global recorder is already installed.
    #[must_use]
    pub fn install(self) -> Option<CliRecorderHandle> {
        let handle = self.handle();
        metrics::set_global_recorder(self).ok()?;
        Some(handle)
    }
}

fn key_to_string(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|l| format!("{}={}", l.key(), l.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(Arc::new(CliCounter {
            key: key_to_string(key),
            storage: Arc::clone(&self.counters),
        }))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(Arc::new(CliGauge {
            key: key_to_string(key),
            storage: Arc::clone(&self.gauges),
        }))
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(Arc::new(CliHistogram {
            key: key_to_string(key),
            storage: Arc::clone(&self.histograms),
        }))
    }
}

/// Read access to metrics collected by a [`CliRecorder`].
pub struct CliRecorderHandle {
    counters: Arc<CounterStorage>,
    gauges: Arc<GaugeStorage>,
    histograms: Arc<HistogramStorage>,
}

impl CliRecorderHandle {
    #[must_use]
    pub fn get_counter(&self, key: &str) -> Option<u64> {
        self.counters.values.read().get(key).copied()
    }

    #[must_use]
    pub fn get_gauge(&self, key: &str) -> Option<f64> {
        self.gauges.values.read().get(key).copied()
    }

    #[must_use]
    pub fn get_histogram(&self, key: &str) -> Option<Vec<f64>> {
        self.histograms.values.read().get(key).cloned()
    }

    /// Print all collected metrics.
    #[allow(clippy::cast_precision_loss)]
    pub fn print_summary(&self) {
        let counters = self.counters.values.read();
        let gauges = self.gauges.values.read();
        let histograms = self.histograms.values.read();

        if counters.is_empty() && gauges.is_empty() && histograms.is_empty() {
            println!("No metrics collected.");
            return;
        }

        println!();
        println!("## Metrics Summary");
        println!();

        if !counters.is_empty() {
            println!("### Counters");
            let mut entries: Vec<_> = counters.iter().collect();
            entries.sort();
            for (key, value) in entries {
                println!("  {key}: {value}");
            }
            println!();
        }

        if !gauges.is_empty() {
            println!("### Gauges");
            let mut keys: Vec<_> = gauges.keys().collect();
            keys.sort();
            for key in keys {
                println!("  {key}: {:.6}", gauges[key]);
            }
            println!();
        }

        if !histograms.is_empty() {
            println!("### Histograms");
            let mut keys: Vec<_> = histograms.keys().collect();
            keys.sort();
            for key in keys {
                let values = &histograms[key];
                if values.is_empty() {
                    continue;
                }
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let avg = values.iter().sum::<f64>() / values.len() as f64;
                println!(
                    "  {key}: count={}, min={min:.6}, max={max:.6}, avg={avg:.6}",
                    values.len()
                );
            }
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BusCycle, ControlRequest, MonitorConfig, PerfMonitor};
    use metrics::Label;

    #[test]
    fn test_key_to_string() {
        let key = Key::from_name("axperf_beats_total");
        assert_eq!(key_to_string(&key), "axperf_beats_total");

        let key = Key::from_parts(
            "axperf_beats_total",
            vec![Label::new("trace", "a"), Label::new("channel", "read")],
        );
        assert_eq!(key_to_string(&key), "axperf_beats_total{trace=a,channel=read}");
    }

    #[test]
    fn test_record_report() {
        let mut monitor = PerfMonitor::new(MonitorConfig::default()).expect("valid config");
        monitor.request(ControlRequest::Start);
        for _ in 0..4 {
            monitor.tick(&BusCycle::idle());
        }
        let report = Report::from_monitor(&monitor);

        let recorder = CliRecorder::new();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            record_report("t", &report);
            record_replay_duration("t", 0.5);
        });

        assert_eq!(handle.get_counter("axperf_active_cycles_total{trace=t}"), Some(3));
        assert_eq!(
            handle.get_counter("axperf_write_cycles_total{trace=t,category=idle}"),
            Some(3)
        );
        assert_eq!(
            handle.get_counter("axperf_read_cycles_total{trace=t,category=lag}"),
            Some(0)
        );
        assert_eq!(
            handle.get_gauge("axperf_max_outstanding{trace=t,channel=write}"),
            Some(0.0)
        );
        assert_eq!(
            handle.get_histogram("axperf_replay_duration_seconds{trace=t}"),
            Some(vec![0.5])
        );
    }
}
