// Report Fetching
//
// Offset pagination over a report source. There is no "has more" flag in the
// API; a page shorter than the requested size ends the loop, so a result set
// that is an exact multiple of the page size costs one extra, empty request.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::time::Instant;
use tracing::{debug, info};

use crate::metrics::EtlMetrics;
use crate::models::{ReportPage, ReportQuery};

/// Anything that can answer one page of a report query
#[allow(async_fn_in_trait)]
pub trait ReportSource {
    async fn run_report(&self, query: &ReportQuery) -> Result<ReportPage>;
}

/// Totals for one paginated fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub pages: u64,
    pub rows: u64,
}

impl FetchSummary {
    pub fn add(&mut self, other: FetchSummary) {
        self.pages += other.pages;
        self.rows += other.rows;
    }
}

/// Fetch every page of `query`, handing each page to `on_page` as it arrives.
/// Any source or callback error aborts the fetch.
pub async fn fetch_paginated<S, F>(
    source: &S,
    query: &ReportQuery,
    metrics: &EtlMetrics,
    mut on_page: F,
) -> Result<FetchSummary>
where
    S: ReportSource,
    F: FnMut(ReportPage) -> Result<()>,
{
    let page_size = u64::from(query.page_size);
    let mut summary = FetchSummary::default();
    let mut offset = query.page_offset;

    loop {
        let page_number = summary.pages + 1;
        let request = query.at_offset(offset);

        let started = Instant::now();
        let page = source.run_report(&request).await.with_context(|| {
            format!(
                "report request failed for {}..{}, page {} (offset {})",
                query.date_range.start_date, query.date_range.end_date, page_number, offset
            )
        })?;
        metrics.record_page_fetched(started.elapsed().as_secs_f64(), page.rows.len());

        let row_count = page.rows.len() as u64;
        summary.pages += 1;
        summary.rows += row_count;

        on_page(page)?;

        if query.date_range.start_date == query.date_range.end_date {
            info!(
                "{} rows on {}, page {}",
                row_count, query.date_range.start_date, page_number
            );
        } else {
            info!(
                "{} rows for {}..{}, page {}",
                row_count, query.date_range.start_date, query.date_range.end_date, page_number
            );
        }

        if row_count < page_size {
            break;
        }
        offset += page_size;
        debug!("Page was full, continuing at offset {}", offset);
    }

    Ok(summary)
}

/// Every calendar day from `start` to `end`, both included
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}
