// Row Transformation
//
// Column mapping between GA4 report fields and the destination table, and the
// per-column decoders that turn the API's string values into typed cells.
//
// Empty or absent numeric values decode to zero, never to null or an error.

use anyhow::{anyhow, bail, ensure, Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::models::{CellValue, ReportPage, ReportRow, TransformedRow};

/// Format of the API's `date` dimension
pub const REPORT_DATE_FORMAT: &str = "%Y%m%d";

/// Declared type of a destination column, which selects its decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// `YYYYMMDD` shifted into local time
    Timestamp,
    Text,
    /// Integer via a float parse, empty means 0
    Count,
    /// Float, empty means 0.0
    Rate,
}

impl ColumnKind {
    fn text() -> Self {
        ColumnKind::Text
    }
}

/// Where a destination column takes its value from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ColumnSource {
    Dimension {
        field: String,
        #[serde(default = "ColumnKind::text")]
        kind: ColumnKind,
    },
    Metric {
        field: String,
        kind: ColumnKind,
    },
    /// `round(clicks / impressions, 4)`, 0.0 without impressions
    ClickThroughRate { clicks: String, impressions: String },
    /// Local midnight of the day being fetched (per-day mode only)
    ReportDay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(flatten)]
    pub source: ColumnSource,
}

impl ColumnSpec {
    pub fn dimension(name: &str, field: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            source: ColumnSource::Dimension {
                field: field.to_string(),
                kind,
            },
        }
    }

    pub fn metric(name: &str, field: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            source: ColumnSource::Metric {
                field: field.to_string(),
                kind,
            },
        }
    }

    pub fn click_through_rate(name: &str, clicks: &str, impressions: &str) -> Self {
        Self {
            name: name.to_string(),
            source: ColumnSource::ClickThroughRate {
                clicks: clicks.to_string(),
                impressions: impressions.to_string(),
            },
        }
    }

    pub fn report_day(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: ColumnSource::ReportDay,
        }
    }
}

/// Ordered destination columns and their sources. The report's dimension and
/// metric lists are derived from it, so the two can never drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMapping {
    pub columns: Vec<ColumnSpec>,
}

impl TableMapping {
    /// Organic search landing pages, one report per day; `date` from the day cursor
    pub fn search_console() -> Self {
        Self {
            columns: vec![
                ColumnSpec::report_day("date"),
                ColumnSpec::dimension("landing_page", "landingPagePlusQueryString", ColumnKind::Text),
                ColumnSpec::metric("clicks", "organicGoogleSearchClicks", ColumnKind::Count),
                ColumnSpec::metric("impressions", "organicGoogleSearchImpressions", ColumnKind::Count),
                ColumnSpec::click_through_rate(
                    "ctr",
                    "organicGoogleSearchClicks",
                    "organicGoogleSearchImpressions",
                ),
                ColumnSpec::metric("avg_position", "organicGoogleSearchAveragePosition", ColumnKind::Rate),
            ],
        }
    }

    /// Same destination columns with `date` supplied by the API's date dimension
    pub fn landing_pages() -> Self {
        let mut mapping = Self::search_console();
        mapping.columns[0] = ColumnSpec::dimension("date", "date", ColumnKind::Timestamp);
        mapping
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let mapping: Self = serde_json::from_str(raw).context("invalid column mapping")?;
        mapping.validate()?;
        Ok(mapping)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read column mapping {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.columns.is_empty(), "column mapping has no columns");

        let mut seen = HashSet::new();
        for column in &self.columns {
            ensure!(!column.name.trim().is_empty(), "column mapping has an unnamed column");
            ensure!(
                seen.insert(column.name.as_str()),
                "column '{}' is mapped more than once",
                column.name
            );
        }

        ensure!(
            !self.dimensions().is_empty() || !self.metrics().is_empty(),
            "column mapping requests no dimensions or metrics"
        );
        Ok(())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn uses_report_day(&self) -> bool {
        self.columns
            .iter()
            .any(|c| matches!(c.source, ColumnSource::ReportDay))
    }

    /// Dimension names to request, in first-use order
    pub fn dimensions(&self) -> Vec<String> {
        let mut names = Vec::new();
        for column in &self.columns {
            if let ColumnSource::Dimension { field, .. } = &column.source {
                push_unique(&mut names, field);
            }
        }
        names
    }

    /// Metric names to request, in first-use order, including CTR inputs
    pub fn metrics(&self) -> Vec<String> {
        let mut names = Vec::new();
        for column in &self.columns {
            match &column.source {
                ColumnSource::Metric { field, .. } => push_unique(&mut names, field),
                ColumnSource::ClickThroughRate { clicks, impressions } => {
                    push_unique(&mut names, clicks);
                    push_unique(&mut names, impressions);
                }
                _ => {}
            }
        }
        names
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

fn is_blank(raw: Option<&str>) -> bool {
    raw.map_or(true, |s| s.trim().is_empty())
}

/// Count coercion: empty or absent is 0, otherwise parsed as a float and truncated
pub fn coerce_count(raw: Option<&str>) -> Result<i64> {
    if is_blank(raw) {
        return Ok(0);
    }
    let value = coerce_rate(raw)?.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    ensure!(
        value >= i64::MIN as f64 && value < i64::MAX as f64,
        "count value {:?} does not fit in a 64-bit integer",
        raw
    );
    Ok(value as i64)
}

/// Rate coercion: empty or absent is 0.0, NaN and infinities are rejected
pub fn coerce_rate(raw: Option<&str>) -> Result<f64> {
    let s = match raw.map(str::trim) {
        None | Some("") => return Ok(0.0),
        Some(s) => s,
    };
    let value = s
        .parse::<f64>()
        .with_context(|| format!("metric value '{}' is not numeric", s))?;
    ensure!(value.is_finite(), "metric value '{}' is not finite", s);
    Ok(value)
}

/// `YYYYMMDD` read as UTC midnight, plus a fixed offset. The result is a naive
/// local timestamp; no timezone database is consulted.
pub fn parse_report_date(raw: &str, utc_offset_hours: i64) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    ensure!(
        raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()),
        "report date '{}' is not YYYYMMDD",
        raw
    );
    let day = NaiveDate::parse_from_str(raw, REPORT_DATE_FORMAT)
        .with_context(|| format!("report date '{}' is not a calendar date", raw))?;
    Ok(local_midnight(day, utc_offset_hours))
}

pub fn local_midnight(day: NaiveDate, utc_offset_hours: i64) -> NaiveDateTime {
    day.and_time(chrono::NaiveTime::MIN) + Duration::hours(utc_offset_hours)
}

pub fn click_through_rate(clicks: i64, impressions: i64) -> f64 {
    if impressions == 0 {
        return 0.0;
    }
    round_to(clicks as f64 / impressions as f64, 4)
}

/// Rounds via the correctly rounded decimal form; exact ties go to the even digit
fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

fn decode(kind: ColumnKind, raw: Option<&str>, utc_offset_hours: i64) -> Result<CellValue> {
    Ok(match kind {
        ColumnKind::Timestamp => {
            let raw = raw.ok_or_else(|| anyhow!("date value is missing"))?;
            CellValue::Timestamp(parse_report_date(raw, utc_offset_hours)?)
        }
        ColumnKind::Text => CellValue::Text(raw.unwrap_or_default().to_string()),
        ColumnKind::Count => CellValue::Int(coerce_count(raw)?),
        ColumnKind::Rate => CellValue::Float(coerce_rate(raw)?),
    })
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Dimension(usize),
    Metric(usize),
}

#[derive(Debug, Clone)]
enum ResolvedSource {
    Field { slot: Slot, kind: ColumnKind },
    ClickThroughRate { clicks: usize, impressions: usize },
    ReportDay,
}

#[derive(Debug, Clone)]
struct ResolvedColumn {
    name: String,
    source: ResolvedSource,
}

/// Maps raw report rows to typed rows. Column sources are resolved to
/// positions by name once, up front.
#[derive(Debug, Clone)]
pub struct RowTransformer {
    dimensions: Vec<String>,
    metrics: Vec<String>,
    columns: Vec<ResolvedColumn>,
    utc_offset_hours: i64,
}

impl RowTransformer {
    pub fn new(
        mapping: &TableMapping,
        dimensions: &[String],
        metrics: &[String],
        utc_offset_hours: i64,
    ) -> Result<Self> {
        mapping.validate()?;

        let position = |names: &[String], field: &str, what: &str| {
            names
                .iter()
                .position(|n| n == field)
                .ok_or_else(|| anyhow!("{} '{}' is not part of the report query", what, field))
        };

        let columns = mapping
            .columns
            .iter()
            .map(|column| -> Result<ResolvedColumn> {
                let source = match &column.source {
                    ColumnSource::Dimension { field, kind } => ResolvedSource::Field {
                        slot: Slot::Dimension(position(dimensions, field, "dimension")?),
                        kind: *kind,
                    },
                    ColumnSource::Metric { field, kind } => ResolvedSource::Field {
                        slot: Slot::Metric(position(metrics, field, "metric")?),
                        kind: *kind,
                    },
                    ColumnSource::ClickThroughRate { clicks, impressions } => {
                        ResolvedSource::ClickThroughRate {
                            clicks: position(metrics, clicks, "metric")?,
                            impressions: position(metrics, impressions, "metric")?,
                        }
                    }
                    ColumnSource::ReportDay => ResolvedSource::ReportDay,
                };
                Ok(ResolvedColumn {
                    name: column.name.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            dimensions: dimensions.to_vec(),
            metrics: metrics.to_vec(),
            columns,
            utc_offset_hours,
        })
    }

    /// Fails when the API echoed headers that differ from what was requested.
    /// Pages without headers are accepted.
    pub fn check_headers(&self, page: &ReportPage) -> Result<()> {
        if !page.dimension_headers.is_empty() && page.dimension_headers != self.dimensions {
            bail!(
                "report returned dimensions {:?}, requested {:?}",
                page.dimension_headers,
                self.dimensions
            );
        }
        if !page.metric_headers.is_empty() && page.metric_headers != self.metrics {
            bail!(
                "report returned metrics {:?}, requested {:?}",
                page.metric_headers,
                self.metrics
            );
        }
        Ok(())
    }

    pub fn transform(&self, row: &ReportRow, day: Option<NaiveDate>) -> Result<TransformedRow> {
        ensure!(
            row.dimension_values.len() == self.dimensions.len()
                && row.metric_values.len() == self.metrics.len(),
            "row has {} dimension and {} metric values, expected {} and {}",
            row.dimension_values.len(),
            row.metric_values.len(),
            self.dimensions.len(),
            self.metrics.len()
        );

        let raw = |slot: Slot| match slot {
            Slot::Dimension(i) => row.dimension_values[i].as_deref(),
            Slot::Metric(i) => row.metric_values[i].as_deref(),
        };

        let mut out = TransformedRow::new();
        for column in &self.columns {
            let value = match &column.source {
                ResolvedSource::Field { slot, kind } => decode(*kind, raw(*slot), self.utc_offset_hours)
                    .with_context(|| format!("column '{}'", column.name))?,
                ResolvedSource::ClickThroughRate { clicks, impressions } => {
                    let clicks = coerce_count(raw(Slot::Metric(*clicks)))?;
                    let impressions = coerce_count(raw(Slot::Metric(*impressions)))?;
                    CellValue::Float(click_through_rate(clicks, impressions))
                }
                ResolvedSource::ReportDay => {
                    let day = day.ok_or_else(|| {
                        anyhow!("column '{}' needs a report day, none is being iterated", column.name)
                    })?;
                    CellValue::Timestamp(local_midnight(day, self.utc_offset_hours))
                }
            };
            out.set(&column.name, value);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn example_mapping() -> TableMapping {
        TableMapping {
            columns: vec![
                ColumnSpec::dimension("date", "date", ColumnKind::Timestamp),
                ColumnSpec::dimension("landing_page", "landingPage", ColumnKind::Text),
                ColumnSpec::metric("clicks", "clicks", ColumnKind::Count),
                ColumnSpec::metric("impressions", "impressions", ColumnKind::Count),
                ColumnSpec::click_through_rate("ctr", "clicks", "impressions"),
                ColumnSpec::metric("avg_position", "avgPosition", ColumnKind::Rate),
            ],
        }
    }

    #[test]
    fn test_count_coercion() {
        assert_eq!(coerce_count(None).unwrap(), 0);
        assert_eq!(coerce_count(Some("")).unwrap(), 0);
        assert_eq!(coerce_count(Some("42")).unwrap(), 42);
        assert_eq!(coerce_count(Some("42.9")).unwrap(), 42);
        assert_eq!(coerce_count(Some("1e3")).unwrap(), 1000);
        assert!(coerce_count(Some("abc")).is_err());
        assert!(coerce_count(Some("inf")).is_err());
        assert!(coerce_count(Some("9223372036854775807")).is_err());
        assert!(coerce_count(Some("1e19")).is_err());
        assert!(coerce_count(Some("-1e19")).is_err());
        assert_eq!(coerce_count(Some("-9223372036854775808")).unwrap(), i64::MIN);
    }

    #[test]
    fn test_rate_coercion() {
        assert_eq!(coerce_rate(None).unwrap(), 0.0);
        assert_eq!(coerce_rate(Some("")).unwrap(), 0.0);
        assert_eq!(coerce_rate(Some("5.2")).unwrap(), 5.2);
        assert!(coerce_rate(Some("n/a")).is_err());
        assert!(coerce_rate(Some("inf")).is_err());
        assert!(coerce_rate(Some("-infinity")).is_err());
        assert!(coerce_rate(Some("NaN")).is_err());
    }

    #[test]
    fn test_click_through_rate() {
        assert_eq!(click_through_rate(3, 10), 0.3);
        assert_eq!(click_through_rate(5, 0), 0.0);
        assert_eq!(click_through_rate(0, 0), 0.0);
        assert_eq!(click_through_rate(1, 3), 0.3333);
        assert_eq!(click_through_rate(2, 3), 0.6667);
        // 1/32 is an exact tie, 3/160 sits just below one
        assert_eq!(click_through_rate(1, 32), 0.0312);
        assert_eq!(click_through_rate(3, 32), 0.0938);
        assert_eq!(click_through_rate(3, 160), 0.0187);

        for (c, i) in [(7, 9), (1, 7), (13, 1000)] {
            let ctr = click_through_rate(c, i);
            assert!(ctr >= 0.0 && ctr <= 1.0);
        }
    }

    #[test]
    fn test_report_date_shift() {
        assert_eq!(parse_report_date("20250701", 7).unwrap(), ts(2025, 7, 1, 7));
        assert_eq!(
            parse_report_date("20250701", 7).unwrap(),
            parse_report_date("20250701", 7).unwrap()
        );
        assert_eq!(parse_report_date("20251231", 0).unwrap(), ts(2025, 12, 31, 0));
        assert!(parse_report_date("2025-07-01", 7).is_err());
        assert!(parse_report_date("20250231", 7).is_err());
        assert!(parse_report_date("", 7).is_err());
    }

    #[test]
    fn test_local_midnight() {
        let day = NaiveDate::from_ymd_opt(2025, 7, 31).unwrap();
        assert_eq!(local_midnight(day, 7), ts(2025, 7, 31, 7));
    }

    #[test]
    fn test_mapping_derives_query_fields() {
        let mapping = TableMapping::search_console();
        assert_eq!(mapping.dimensions(), strings(&["landingPagePlusQueryString"]));
        assert_eq!(
            mapping.metrics(),
            strings(&[
                "organicGoogleSearchClicks",
                "organicGoogleSearchImpressions",
                "organicGoogleSearchAveragePosition",
            ])
        );
        assert!(mapping.uses_report_day());
        assert_eq!(
            mapping.column_names(),
            strings(&["date", "landing_page", "clicks", "impressions", "ctr", "avg_position"])
        );

        let landing = TableMapping::landing_pages();
        assert_eq!(landing.dimensions(), strings(&["date", "landingPagePlusQueryString"]));
        assert!(!landing.uses_report_day());
    }

    #[test]
    fn test_ctr_inputs_are_requested_even_without_own_columns() {
        let mapping = TableMapping {
            columns: vec![
                ColumnSpec::dimension("page", "pagePath", ColumnKind::Text),
                ColumnSpec::click_through_rate("ctr", "clicks", "impressions"),
            ],
        };
        assert_eq!(mapping.metrics(), strings(&["clicks", "impressions"]));
    }

    #[test]
    fn test_mapping_validation() {
        let duplicate = TableMapping {
            columns: vec![
                ColumnSpec::dimension("page", "pagePath", ColumnKind::Text),
                ColumnSpec::metric("page", "sessions", ColumnKind::Count),
            ],
        };
        assert!(duplicate.validate().is_err());

        let only_day = TableMapping {
            columns: vec![ColumnSpec::report_day("date")],
        };
        assert!(only_day.validate().is_err());

        assert!(TableMapping { columns: vec![] }.validate().is_err());
    }

    #[test]
    fn test_mapping_from_json() {
        let raw = r#"{"columns": [
            {"name": "date", "source": "report_day"},
            {"name": "page", "source": "dimension", "field": "pagePath"},
            {"name": "sessions", "source": "metric", "field": "sessions", "kind": "count"},
            {"name": "ctr", "source": "click_through_rate", "clicks": "clicks", "impressions": "impressions"}
        ]}"#;

        let mapping = TableMapping::from_json(raw).unwrap();
        assert_eq!(mapping.columns[0], ColumnSpec::report_day("date"));
        assert_eq!(mapping.columns[1], ColumnSpec::dimension("page", "pagePath", ColumnKind::Text));
        assert_eq!(mapping.columns[2], ColumnSpec::metric("sessions", "sessions", ColumnKind::Count));
        assert_eq!(mapping.metrics(), strings(&["sessions", "clicks", "impressions"]));

        assert!(TableMapping::from_json(r#"{"columns": [{"name": "x", "source": "nope"}]}"#).is_err());
    }

    #[test]
    fn test_transform_example_row() {
        let mapping = example_mapping();
        let transformer =
            RowTransformer::new(&mapping, &mapping.dimensions(), &mapping.metrics(), 7).unwrap();

        let row = ReportRow::new(["20250701", "/a"], ["3", "10", "5.2"]);
        let out = transformer.transform(&row, None).unwrap();

        assert_eq!(
            out.into_tuple(&mapping.column_names()).unwrap(),
            vec![
                CellValue::Timestamp(ts(2025, 7, 1, 7)),
                CellValue::Text("/a".to_string()),
                CellValue::Int(3),
                CellValue::Int(10),
                CellValue::Float(0.3),
                CellValue::Float(5.2),
            ]
        );
    }

    #[test]
    fn test_reordered_query_fields_keep_columns_intact() {
        let mapping = example_mapping();
        let dimensions = strings(&["landingPage", "date"]);
        let metrics = strings(&["avgPosition", "impressions", "clicks"]);
        let transformer = RowTransformer::new(&mapping, &dimensions, &metrics, 7).unwrap();

        let row = ReportRow::new(["/a", "20250701"], ["5.2", "10", "3"]);
        let out = transformer.transform(&row, None).unwrap();

        assert_eq!(out.get("date"), Some(&CellValue::Timestamp(ts(2025, 7, 1, 7))));
        assert_eq!(out.get("clicks"), Some(&CellValue::Int(3)));
        assert_eq!(out.get("impressions"), Some(&CellValue::Int(10)));
        assert_eq!(out.get("avg_position"), Some(&CellValue::Float(5.2)));
    }

    #[test]
    fn test_empty_metrics_decode_to_zero() {
        let mapping = example_mapping();
        let transformer =
            RowTransformer::new(&mapping, &mapping.dimensions(), &mapping.metrics(), 7).unwrap();

        let row = ReportRow {
            dimension_values: vec![Some("20250701".to_string()), None],
            metric_values: vec![Some(String::new()), None, Some(String::new())],
        };
        let out = transformer.transform(&row, None).unwrap();

        assert_eq!(out.get("landing_page"), Some(&CellValue::Text(String::new())));
        assert_eq!(out.get("clicks"), Some(&CellValue::Int(0)));
        assert_eq!(out.get("impressions"), Some(&CellValue::Int(0)));
        assert_eq!(out.get("ctr"), Some(&CellValue::Float(0.0)));
        assert_eq!(out.get("avg_position"), Some(&CellValue::Float(0.0)));
    }

    #[test]
    fn test_report_day_column_uses_cursor() {
        let mapping = TableMapping::search_console();
        let transformer =
            RowTransformer::new(&mapping, &mapping.dimensions(), &mapping.metrics(), 7).unwrap();
        let row = ReportRow::new(["/blog?x=1"], ["4", "0", "12.5"]);

        let day = NaiveDate::from_ymd_opt(2025, 7, 2).unwrap();
        let out = transformer.transform(&row, Some(day)).unwrap();
        assert_eq!(out.get("date"), Some(&CellValue::Timestamp(ts(2025, 7, 2, 7))));
        assert_eq!(out.get("ctr"), Some(&CellValue::Float(0.0)));

        assert!(transformer.transform(&row, None).is_err());
    }

    #[test]
    fn test_transform_rejects_bad_rows() {
        let mapping = example_mapping();
        let transformer =
            RowTransformer::new(&mapping, &mapping.dimensions(), &mapping.metrics(), 7).unwrap();

        let short = ReportRow::new(["20250701"], ["3", "10", "5.2"]);
        assert!(transformer.transform(&short, None).is_err());

        let garbage = ReportRow::new(["20250701", "/a"], ["three", "10", "5.2"]);
        assert!(transformer.transform(&garbage, None).is_err());
    }

    #[test]
    fn test_unknown_field_fails_resolution() {
        let mapping = example_mapping();
        let dimensions = strings(&["date"]);
        assert!(RowTransformer::new(&mapping, &dimensions, &mapping.metrics(), 7).is_err());
    }

    #[test]
    fn test_header_check() {
        let mapping = example_mapping();
        let transformer =
            RowTransformer::new(&mapping, &mapping.dimensions(), &mapping.metrics(), 7).unwrap();

        let mut page = ReportPage::default();
        assert!(transformer.check_headers(&page).is_ok());

        page.dimension_headers = strings(&["date", "landingPage"]);
        page.metric_headers = strings(&["clicks", "impressions", "avgPosition"]);
        assert!(transformer.check_headers(&page).is_ok());

        page.metric_headers = strings(&["impressions", "clicks", "avgPosition"]);
        assert!(transformer.check_headers(&page).is_err());
    }
}
