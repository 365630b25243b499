// GA4 to ClickHouse ETL - scheduled batch job
//
// One linear run: authenticate against GA4, probe ClickHouse, fetch and
// transform the whole report, insert it in one statement.
// Setup and fetch failures exit non-zero. Insert failures are logged and the
// run still exits zero unless FAIL_ON_INSERT_ERROR is set.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use ga4_clickhouse_etl::{
    ClickHouseClient, Config, DateMode, EtlJob, EtlMetrics, Ga4Client, JobPlan, LoadOutcome,
    RowSink,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ga4_clickhouse_etl=info")),
        )
        .init();

    let config = Config::parse();
    let run_id = Uuid::new_v4();

    async {
        info!("========== Job started ==========");
        let result = run(&config).await;
        if let Err(e) = &result {
            error!("Job failed: {:#}", e);
        }
        info!("========== Job finished ==========");
        result
    }
    .instrument(info_span!("etl_run", %run_id))
    .await
}

async fn run(config: &Config) -> Result<()> {
    let plan = JobPlan::from_config(config)?;

    info!("Configuration:");
    info!("  - Property: {}", config.property_id);
    info!("  - Date range: {} to {}", config.start_date, config.end_date);
    info!(
        "  - Date mode: {}",
        match config.date_mode {
            DateMode::PerDay => format!("per day ({} days)", plan.day_count()),
            DateMode::SingleRange => "single range".to_string(),
        }
    );
    info!("  - Page size: {}", config.max_rows);
    info!("  - Dimensions: {:?}", plan.query.dimensions);
    info!("  - Metrics: {:?}", plan.query.metrics);
    info!("  - Filter: {}", if plan.query.filter.is_some() { "yes" } else { "none" });
    info!(
        "  - Destination: {} / {}.{}",
        config.clickhouse_url(),
        config.ch_database,
        config.ch_table
    );

    let metrics = EtlMetrics::new()?;

    let ga4 = Ga4Client::from_config(config).await?;
    ga4.authenticate().await?;

    let clickhouse = ClickHouseClient::new(
        &config.clickhouse_url(),
        &config.ch_user,
        config.ch_password.as_deref(),
        &config.ch_database,
    );
    clickhouse.ping().await?;

    let job = EtlJob::new(&ga4, &clickhouse, plan, &metrics);
    let summary = job.run().await;

    metrics.log_summary();
    if let Some(path) = &config.metrics_file {
        match metrics.write_textfile(path) {
            Ok(()) => info!("Wrote run metrics to {}", path.display()),
            Err(e) => error!("Failed to write run metrics: {:#}", e),
        }
    }

    let summary = summary?;
    match &summary.outcome {
        LoadOutcome::Inserted { rows } => {
            info!("Loaded {} rows from {} days", rows, summary.days)
        }
        LoadOutcome::NoData => info!("Nothing fetched, nothing loaded"),
        LoadOutcome::Failed { .. } => {
            info!("{} rows fetched but not persisted", summary.batched_rows)
        }
    }
    Ok(())
}
