// GA4 to ClickHouse ETL Library
//
// Paginated GA4 report fetching, typed row transformation and a single bulk
// insert into ClickHouse.

pub mod config;
pub mod database;
pub mod fetcher;
pub mod filter;
pub mod ga4;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod transform;

// Re-export commonly used types
pub use config::{Config, DateMode, ReportProfile};
pub use database::{ClickHouseClient, RowSink};
pub use fetcher::{fetch_paginated, FetchSummary, ReportSource};
pub use filter::FilterExpression;
pub use ga4::{Ga4Auth, Ga4Client};
pub use loader::{load_batch, InsertErrorPolicy, LoadOutcome};
pub use metrics::EtlMetrics;
pub use models::*;
pub use pipeline::{EtlJob, JobPlan, RunSummary};
pub use transform::{ColumnKind, ColumnSource, ColumnSpec, RowTransformer, TableMapping};
