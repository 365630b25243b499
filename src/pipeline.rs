// ETL Pipeline
//
// The whole job as one linear flow: page through the report (once, or once per
// day), transform every row as its page arrives, keep everything in a single
// in-memory batch, then hand the batch to the loader.

use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

use crate::config::{Config, DateMode};
use crate::database::RowSink;
use crate::fetcher::{days_inclusive, fetch_paginated, FetchSummary, ReportSource};
use crate::loader::{load_batch, InsertErrorPolicy, LoadOutcome};
use crate::metrics::EtlMetrics;
use crate::models::{AccumulatedBatch, DateRange, ReportQuery};
use crate::transform::{RowTransformer, TableMapping};

/// Everything one run needs, resolved from configuration
#[derive(Debug, Clone)]
pub struct JobPlan {
    pub query: ReportQuery,
    pub mapping: TableMapping,
    pub date_mode: DateMode,
    pub table: String,
    pub utc_offset_hours: i64,
    pub insert_error_policy: InsertErrorPolicy,
}

impl JobPlan {
    pub fn new(
        property_id: &str,
        date_range: DateRange,
        page_size: u32,
        mapping: TableMapping,
        date_mode: DateMode,
        table: &str,
    ) -> Self {
        let query = ReportQuery {
            property_id: property_id.to_string(),
            date_range,
            dimensions: mapping.dimensions(),
            metrics: mapping.metrics(),
            filter: None,
            page_size,
            page_offset: 0,
        };

        Self {
            query,
            mapping,
            date_mode,
            table: table.to_string(),
            utc_offset_hours: 7,
            insert_error_policy: InsertErrorPolicy::Swallow,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let mut plan = Self::new(
            &config.property_id,
            DateRange::new(config.start_date, config.end_date),
            config.max_rows,
            config.table_mapping()?,
            config.date_mode,
            &config.ch_table,
        );
        plan.query.filter = config.report_filter()?;
        plan.utc_offset_hours = config.utc_offset_hours;
        plan.insert_error_policy = config.insert_error_policy();
        Ok(plan)
    }

    /// Number of days the outer loop walks (1 in single-range mode)
    pub fn day_count(&self) -> u64 {
        match self.date_mode {
            DateMode::SingleRange => 1,
            DateMode::PerDay => days_inclusive(
                self.query.date_range.start_date,
                self.query.date_range.end_date,
            )
            .count() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub days: u64,
    pub fetch: FetchSummary,
    pub batched_rows: u64,
    pub outcome: LoadOutcome,
}

pub struct EtlJob<'a, S, K> {
    source: &'a S,
    sink: &'a K,
    plan: JobPlan,
    metrics: &'a EtlMetrics,
}

impl<'a, S: ReportSource, K: RowSink> EtlJob<'a, S, K> {
    pub fn new(source: &'a S, sink: &'a K, plan: JobPlan, metrics: &'a EtlMetrics) -> Self {
        Self {
            source,
            sink,
            plan,
            metrics,
        }
    }

    /// Fetch everything, then load once. Fetch errors abort before the loader
    /// runs; load errors follow the plan's insert policy.
    pub async fn run(&self) -> Result<RunSummary> {
        let (batch, fetch, days) = self.fetch_batch().await?;
        let batched_rows = batch.len() as u64;
        info!("Total: {} rows fetched in {} pages", batched_rows, fetch.pages);

        let outcome = load_batch(
            self.sink,
            &self.plan.table,
            batch,
            self.plan.insert_error_policy,
            self.metrics,
        )
        .await?;

        Ok(RunSummary {
            days,
            fetch,
            batched_rows,
            outcome,
        })
    }

    /// Fetch and transform every page of every day into one batch
    pub async fn fetch_batch(&self) -> Result<(AccumulatedBatch, FetchSummary, u64)> {
        let plan = &self.plan;
        let transformer = RowTransformer::new(
            &plan.mapping,
            &plan.query.dimensions,
            &plan.query.metrics,
            plan.utc_offset_hours,
        )?;
        let mut batch = AccumulatedBatch::new(plan.mapping.column_names());
        let mut fetch = FetchSummary::default();
        let mut days = 0u64;

        match plan.date_mode {
            DateMode::SingleRange => {
                info!(
                    "Fetching data for {}..{}",
                    plan.query.date_range.start_date, plan.query.date_range.end_date
                );
                let summary = self
                    .fetch_into(&transformer, &plan.query, None, &mut batch)
                    .await?;
                fetch.add(summary);
                days = 1;
            }
            DateMode::PerDay => {
                let range = plan.query.date_range;
                for day in days_inclusive(range.start_date, range.end_date) {
                    info!("Fetching data for {}...", day);
                    let summary = self
                        .fetch_into(&transformer, &plan.query.for_day(day), Some(day), &mut batch)
                        .await?;
                    fetch.add(summary);
                    days += 1;
                    self.metrics.record_day_processed();
                }
            }
        }

        Ok((batch, fetch, days))
    }

    async fn fetch_into(
        &self,
        transformer: &RowTransformer,
        query: &ReportQuery,
        day: Option<NaiveDate>,
        batch: &mut AccumulatedBatch,
    ) -> Result<FetchSummary> {
        fetch_paginated(self.source, query, self.metrics, |page| {
            transformer.check_headers(&page)?;
            for row in &page.rows {
                batch.push(transformer.transform(row, day)?);
            }
            Ok(())
        })
        .await
    }
}
