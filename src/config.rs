// Configuration Management
//
// One immutable configuration record, parsed once at startup from flags or
// environment variables and passed by reference into the job.

use anyhow::{bail, ensure, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::filter::{parse_exclusion, FilterExpression};
use crate::loader::InsertErrorPolicy;
use crate::transform::TableMapping;

/// Hard cap the GA4 Data API puts on `limit`
pub const GA4_MAX_PAGE_SIZE: u32 = 250_000;

/// How the report date range is walked
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateMode {
    /// One report per calendar day, concatenated
    PerDay,
    /// One report over the whole range
    SingleRange,
}

/// Built-in report/table layouts
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportProfile {
    /// Organic search landing pages, date taken from the day being fetched
    SearchConsole,
    /// Organic search landing pages, date taken from the `date` dimension
    LandingPages,
}

/// Command line and environment variable configuration for the GA4 to ClickHouse job
#[derive(Parser, Debug, Clone)]
#[clap(name = "ga4-clickhouse-etl")]
#[clap(about = "Load a Google Analytics 4 report into a ClickHouse table")]
pub struct Config {
    /// GA4 property identifier (numeric, without the `properties/` prefix)
    #[clap(long, env = "GA4_PROPERTY_ID")]
    pub property_id: String,

    /// First day of the report, inclusive
    #[clap(long, env = "START_DATE", default_value = "2025-07-01")]
    pub start_date: NaiveDate,

    /// Last day of the report, inclusive
    #[clap(long, env = "END_DATE", default_value = "2025-07-31")]
    pub end_date: NaiveDate,

    /// Rows requested per page; a shorter page ends pagination
    #[clap(long, env = "MAX_ROWS", default_value = "30000")]
    pub max_rows: u32,

    /// Query the range in one report or one day at a time
    #[clap(long, env = "DATE_MODE", value_enum, default_value = "per-day")]
    pub date_mode: DateMode,

    /// Built-in dimension/metric to column layout
    #[clap(long, env = "REPORT_PROFILE", value_enum, default_value = "search-console")]
    pub profile: ReportProfile,

    /// JSON column mapping overriding the profile
    #[clap(long, env = "MAPPING_FILE")]
    pub mapping_file: Option<PathBuf>,

    /// Exclude rows where a field contains a substring, as `field:substring`
    #[clap(long = "exclude", env = "GA4_EXCLUDE", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Complete filter expression in the GA4 API JSON form
    #[clap(long, env = "GA4_FILTER_JSON")]
    pub filter_json: Option<String>,

    /// Hours added to the UTC midnight of each report day
    #[clap(long, env = "UTC_OFFSET_HOURS", default_value = "7", allow_hyphen_values = true)]
    pub utc_offset_hours: i64,

    /// Service account key as JSON, written to the credentials file when that is missing
    #[clap(long, env = "GA4_CREDENTIALS_JSON", hide_env_values = true)]
    pub credentials_json: Option<String>,

    /// Service account key file
    #[clap(long, env = "GOOGLE_CREDENTIALS_FILE", default_value = "ga4-credentials.json")]
    pub credentials_file: PathBuf,

    /// Pre-issued OAuth bearer token; skips the service account exchange
    #[clap(long, env = "GA4_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// GA4 Data API base URL
    #[clap(long, env = "GA4_API_BASE", default_value = "https://analyticsdata.googleapis.com")]
    pub ga4_api_base: String,

    /// ClickHouse host for the HTTP interface
    #[clap(long, env = "CH_HOST", default_value = "localhost")]
    pub ch_host: String,

    /// ClickHouse HTTP port
    #[clap(long, env = "CH_PORT", default_value = "8123")]
    pub ch_port: u16,

    /// Use HTTPS towards ClickHouse
    #[clap(long, env = "CH_SECURE")]
    pub ch_secure: bool,

    #[clap(long, env = "CH_USER", default_value = "default")]
    pub ch_user: String,

    #[clap(long, env = "CH_PASSWORD", hide_env_values = true)]
    pub ch_password: Option<String>,

    #[clap(long, env = "CH_DATABASE", default_value = "default")]
    pub ch_database: String,

    /// Destination table
    #[clap(long, env = "CH_TABLE")]
    pub ch_table: String,

    /// Exit non-zero when the final insert fails instead of logging and carrying on
    #[clap(long, env = "FAIL_ON_INSERT_ERROR")]
    pub fail_on_insert_error: bool,

    /// Write run metrics in the Prometheus text format to this file
    #[clap(long, env = "METRICS_FILE")]
    pub metrics_file: Option<PathBuf>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.property_id.trim().is_empty(), "GA4 property id is empty");
        ensure!(!self.ch_table.trim().is_empty(), "ClickHouse table name is empty");
        ensure!(
            self.start_date <= self.end_date,
            "start date {} is after end date {}",
            self.start_date,
            self.end_date
        );
        ensure!(
            self.max_rows > 0 && self.max_rows <= GA4_MAX_PAGE_SIZE,
            "page size must be between 1 and {}, got {}",
            GA4_MAX_PAGE_SIZE,
            self.max_rows
        );
        if self.filter_json.is_some() && !self.exclude.is_empty() {
            bail!("use either exclusion filters or a JSON filter expression, not both");
        }
        Ok(())
    }

    pub fn clickhouse_url(&self) -> String {
        let scheme = if self.ch_secure { "https" } else { "http" };
        format!("{}://{}:{}/", scheme, self.ch_host, self.ch_port)
    }

    pub fn insert_error_policy(&self) -> InsertErrorPolicy {
        if self.fail_on_insert_error {
            InsertErrorPolicy::Propagate
        } else {
            InsertErrorPolicy::Swallow
        }
    }

    /// The server-side filter, if any was configured
    pub fn report_filter(&self) -> Result<Option<FilterExpression>> {
        if let Some(raw) = &self.filter_json {
            let expr = FilterExpression::from_json(raw).context("invalid GA4_FILTER_JSON")?;
            return Ok(Some(expr));
        }

        let pairs = self
            .exclude
            .iter()
            .map(|raw| parse_exclusion(raw))
            .collect::<Result<Vec<_>>>()?;
        Ok(FilterExpression::exclude_contains(&pairs))
    }

    pub fn table_mapping(&self) -> Result<TableMapping> {
        let mapping = match &self.mapping_file {
            Some(path) => TableMapping::from_file(path)?,
            None => match self.profile {
                ReportProfile::SearchConsole => TableMapping::search_console(),
                ReportProfile::LandingPages => TableMapping::landing_pages(),
            },
        };

        if mapping.uses_report_day() && self.date_mode == DateMode::SingleRange {
            bail!("the column mapping fills a column from the report day, which needs --date-mode per-day");
        }
        Ok(mapping)
    }
}

/// Write the credentials blob to `path` unless the file is already there.
/// Returns true when a file was written.
pub fn materialize_credentials(blob: Option<&str>, path: &Path) -> Result<bool> {
    let Some(blob) = blob else {
        return Ok(false);
    };
    if path.exists() {
        return Ok(false);
    }

    fs::write(path, blob)
        .with_context(|| format!("failed to write credentials to {}", path.display()))?;
    info!("Created {} from GA4_CREDENTIALS_JSON", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Config {
        let mut args = vec![
            "ga4-clickhouse-etl",
            "--property-id",
            "123456",
            "--ch-table",
            "ga4_search",
        ];
        args.extend_from_slice(extra);
        Config::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2025, 7, 31).unwrap());
        assert_eq!(config.max_rows, 30000);
        assert_eq!(config.date_mode, DateMode::PerDay);
        assert_eq!(config.utc_offset_hours, 7);
        assert_eq!(config.clickhouse_url(), "http://localhost:8123/");
        assert_eq!(config.insert_error_policy(), InsertErrorPolicy::Swallow);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let config = parse(&["--start-date", "2025-08-01", "--end-date", "2025-07-01"]);
        assert!(config.validate().is_err());

        let config = parse(&["--max-rows", "0"]);
        assert!(config.validate().is_err());

        let config = parse(&["--max-rows", "250001"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_exclusions_build_filter() {
        let config = parse(&["--exclude", "landingPagePlusQueryString:/admin,landingPagePlusQueryString:gclid"]);
        assert_eq!(config.exclude.len(), 2);

        let expected = FilterExpression::and(vec![
            FilterExpression::not(FilterExpression::contains("landingPagePlusQueryString", "/admin")),
            FilterExpression::not(FilterExpression::contains("landingPagePlusQueryString", "gclid")),
        ]);
        assert_eq!(config.report_filter().unwrap(), Some(expected));

        assert_eq!(parse(&[]).report_filter().unwrap(), None);
    }

    #[test]
    fn test_both_filter_sources_rejected() {
        let config = parse(&["--exclude", "pagePath:x", "--filter-json", "{}"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_report_day_mapping_needs_per_day_mode() {
        let config = parse(&["--date-mode", "single-range"]);
        assert!(config.table_mapping().is_err());

        let config = parse(&["--date-mode", "single-range", "--profile", "landing-pages"]);
        assert_eq!(config.table_mapping().unwrap(), TableMapping::landing_pages());
    }

    #[test]
    fn test_materialize_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ga4-credentials.json");

        assert!(!materialize_credentials(None, &path).unwrap());
        assert!(!path.exists());

        assert!(materialize_credentials(Some(r#"{"type":"service_account"}"#), &path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"type":"service_account"}"#);

        // an existing file is left alone
        assert!(!materialize_credentials(Some("{}"), &path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"type":"service_account"}"#);
    }
}
