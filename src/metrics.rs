// Prometheus Metrics Collection
//
// Run metrics for the batch job. Nothing scrapes a batch process, so the
// registry is rendered once at the end: summarized in the log and optionally
// written out in the text format for a node-exporter textfile collector.

use anyhow::{Context, Result};
use prometheus::{
    CounterVec, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::fs;
use std::path::Path;
use tracing::info;

/// Insert outcome labels
pub const OUTCOME_INSERTED: &str = "inserted";
pub const OUTCOME_NO_DATA: &str = "no_data";
pub const OUTCOME_FAILED: &str = "failed";

pub struct EtlMetrics {
    pub registry: Registry,

    // Fetch side
    pub pages_fetched_total: IntCounter,
    pub rows_fetched_total: IntCounter,
    pub days_processed_total: IntCounter,
    pub page_fetch_duration: Histogram,

    // Load side
    pub batch_rows: IntGauge,
    pub rows_inserted_total: IntCounter,
    pub insert_outcomes_total: CounterVec,
    pub insert_duration: Histogram,
}

impl EtlMetrics {
    /// Create a new registry with all job metrics registered
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("ga4_etl".to_string()), None)?;

        let pages_fetched_total = IntCounter::new(
            "pages_fetched_total",
            "Report pages fetched from GA4",
        )?;

        let rows_fetched_total = IntCounter::new(
            "rows_fetched_total",
            "Report rows fetched from GA4",
        )?;

        let days_processed_total = IntCounter::new(
            "days_processed_total",
            "Calendar days fetched in per-day mode",
        )?;

        let page_fetch_duration = Histogram::with_opts(HistogramOpts::new(
            "page_fetch_duration_seconds",
            "Latency of one runReport page request",
        ))?;

        let batch_rows = IntGauge::new(
            "batch_rows",
            "Rows accumulated for the final insert",
        )?;

        let rows_inserted_total = IntCounter::new(
            "rows_inserted_total",
            "Rows written to ClickHouse",
        )?;

        let insert_outcomes_total = CounterVec::new(
            Opts::new("insert_outcomes_total", "Final insert outcomes"),
            &["outcome"],
        )?;

        let insert_duration = Histogram::with_opts(HistogramOpts::new(
            "insert_duration_seconds",
            "Latency of the bulk insert",
        ))?;

        registry.register(Box::new(pages_fetched_total.clone()))?;
        registry.register(Box::new(rows_fetched_total.clone()))?;
        registry.register(Box::new(days_processed_total.clone()))?;
        registry.register(Box::new(page_fetch_duration.clone()))?;
        registry.register(Box::new(batch_rows.clone()))?;
        registry.register(Box::new(rows_inserted_total.clone()))?;
        registry.register(Box::new(insert_outcomes_total.clone()))?;
        registry.register(Box::new(insert_duration.clone()))?;

        Ok(Self {
            registry,
            pages_fetched_total,
            rows_fetched_total,
            days_processed_total,
            page_fetch_duration,
            batch_rows,
            rows_inserted_total,
            insert_outcomes_total,
            insert_duration,
        })
    }

    pub fn record_page_fetched(&self, duration: f64, rows: usize) {
        self.pages_fetched_total.inc();
        self.rows_fetched_total.inc_by(rows as u64);
        self.page_fetch_duration.observe(duration);
    }

    pub fn record_day_processed(&self) {
        self.days_processed_total.inc();
    }

    pub fn record_batch_size(&self, rows: usize) {
        self.batch_rows.set(rows as i64);
    }

    pub fn record_insert(&self, outcome: &str, rows: u64, duration: f64) {
        self.insert_outcomes_total.with_label_values(&[outcome]).inc();
        self.rows_inserted_total.inc_by(rows);
        self.insert_duration.observe(duration);
    }

    pub fn record_no_data(&self) {
        self.insert_outcomes_total.with_label_values(&[OUTCOME_NO_DATA]).inc();
    }

    pub fn insert_outcome_count(&self, outcome: &str) -> u64 {
        self.insert_outcomes_total.with_label_values(&[outcome]).get() as u64
    }

    /// Registry in the Prometheus text exposition format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Write via a temp file and rename, so a collector never reads half a file
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        let body = self.render()?;
        let tmp = path.with_extension("prom.tmp");
        fs::write(&tmp, body).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("failed to move metrics into {}", path.display()))?;
        Ok(())
    }

    pub fn log_summary(&self) {
        info!(
            "Run metrics: {} pages | {} rows fetched | {} days | {} rows batched | {} rows inserted | fetch avg: {:.3}s",
            self.pages_fetched_total.get(),
            self.rows_fetched_total.get(),
            self.days_processed_total.get(),
            self.batch_rows.get(),
            self.rows_inserted_total.get(),
            average(&self.page_fetch_duration),
        );
    }
}

fn average(histogram: &Histogram) -> f64 {
    let count = histogram.get_sample_count();
    if count == 0 {
        0.0
    } else {
        histogram.get_sample_sum() / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = EtlMetrics::new().unwrap();
        metrics.record_page_fetched(0.2, 10);
        metrics.record_page_fetched(0.4, 3);
        metrics.record_insert(OUTCOME_INSERTED, 13, 0.1);

        assert_eq!(metrics.pages_fetched_total.get(), 2);
        assert_eq!(metrics.rows_fetched_total.get(), 13);
        assert_eq!(metrics.rows_inserted_total.get(), 13);
        assert_eq!(metrics.insert_outcome_count(OUTCOME_INSERTED), 1);
        assert_eq!(metrics.insert_outcome_count(OUTCOME_FAILED), 0);
        assert!((average(&metrics.page_fetch_duration) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_render_and_textfile() {
        let metrics = EtlMetrics::new().unwrap();
        metrics.record_no_data();

        let text = metrics.render().unwrap();
        assert!(text.contains("ga4_etl_insert_outcomes_total{outcome=\"no_data\"} 1"));
        assert!(text.contains("ga4_etl_rows_fetched_total 0"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ga4_etl.prom");
        metrics.write_textfile(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }
}
