// Batch Loading
//
// One bulk insert for the whole run. An empty batch is not an error and never
// reaches the sink. What happens on a failed insert is an explicit policy.

use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{error, info, warn};

use crate::database::RowSink;
use crate::metrics::{EtlMetrics, OUTCOME_FAILED, OUTCOME_INSERTED};
use crate::models::AccumulatedBatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertErrorPolicy {
    /// Log the failure and finish the run successfully
    Swallow,
    /// Log the failure and fail the run
    Propagate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Inserted { rows: u64 },
    NoData,
    Failed { error: String },
}

pub async fn load_batch<K: RowSink>(
    sink: &K,
    table: &str,
    batch: AccumulatedBatch,
    policy: InsertErrorPolicy,
    metrics: &EtlMetrics,
) -> Result<LoadOutcome> {
    metrics.record_batch_size(batch.len());

    if batch.is_empty() {
        warn!("No data to insert into {}", table);
        metrics.record_no_data();
        return Ok(LoadOutcome::NoData);
    }

    let row_count = batch.len();
    let columns = batch.columns.clone();
    let started = Instant::now();

    let result = match batch.into_tuples() {
        Ok(tuples) => sink.insert_rows(table, &columns, &tuples).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(rows) => {
            metrics.record_insert(OUTCOME_INSERTED, rows, started.elapsed().as_secs_f64());
            info!("Inserted {} rows into ClickHouse table {}", rows, table);
            Ok(LoadOutcome::Inserted { rows })
        }
        Err(e) => {
            metrics.record_insert(OUTCOME_FAILED, 0, started.elapsed().as_secs_f64());
            error!("Insert of {} rows into ClickHouse table {} failed: {:#}", row_count, table, e);
            match policy {
                InsertErrorPolicy::Swallow => Ok(LoadOutcome::Failed {
                    error: format!("{:#}", e),
                }),
                InsertErrorPolicy::Propagate => {
                    Err(e).with_context(|| format!("insert into {} failed", table))
                }
            }
        }
    }
}
