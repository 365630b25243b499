// Database Layer
//
// ClickHouse over its HTTP interface: SQL goes in the `query` parameter and
// insert payloads go in the request body.

use anyhow::{bail, ensure, Context, Result};
use reqwest::{Client, Url};
use std::fmt::Write as _;
use tracing::{debug, info};

use crate::models::CellValue;

/// Destination for the accumulated batch
#[allow(async_fn_in_trait)]
pub trait RowSink {
    /// Cheap round trip to fail fast on a bad address or credentials
    async fn ping(&self) -> Result<()>;

    /// Insert every row in a single statement; returns the row count written
    async fn insert_rows(&self, table: &str, columns: &[String], rows: &[Vec<CellValue>]) -> Result<u64>;
}

/// HTTP client wrapper for ClickHouse
#[derive(Clone)]
pub struct ClickHouseClient {
    client: Client,
    url: String,
    user: String,
    password: Option<String>,
    database: String,
}

impl ClickHouseClient {
    pub fn new(url: &str, user: &str, password: Option<&str>, database: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
            user: user.to_string(),
            password: password.map(str::to_string),
            database: database.to_string(),
        }
    }

    async fn execute(&self, sql: &str, body: String) -> Result<String> {
        let mut url = Url::parse(&self.url).context("Invalid ClickHouse URL")?;
        url.query_pairs_mut()
            .append_pair("database", &self.database)
            .append_pair("query", sql);

        let resp = self
            .client
            .post(url)
            .basic_auth(&self.user, self.password.as_deref())
            .body(body)
            .send()
            .await
            .context("ClickHouse HTTP request failed")?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            bail!("ClickHouse error {}: {}", status, text.trim());
        }
        Ok(text)
    }
}

impl RowSink for ClickHouseClient {
    async fn ping(&self) -> Result<()> {
        let answer = self.execute("SELECT 1", String::new()).await?;
        ensure!(
            answer.trim() == "1",
            "unexpected ClickHouse probe answer: {}",
            answer.trim()
        );
        info!("ClickHouse connection OK ({})", self.url);
        Ok(())
    }

    async fn insert_rows(&self, table: &str, columns: &[String], rows: &[Vec<CellValue>]) -> Result<u64> {
        let sql = insert_statement(table, columns);
        let body = encode_rows(rows)?;
        debug!("{} ({} bytes)", sql, body.len());

        self.execute(&sql, body).await?;
        Ok(rows.len() as u64)
    }
}

/// Backtick-quote an identifier, keeping `db.table` qualification
pub fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| format!("`{}`", part.replace('\\', "\\\\").replace('`', "\\`")))
        .collect::<Vec<_>>()
        .join(".")
}

pub fn insert_statement(table: &str, columns: &[String]) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) FORMAT JSONCompactEachRow",
        quote_identifier(table),
        column_list
    )
}

/// One JSON array per line, positionally matching the column list
pub fn encode_rows(rows: &[Vec<CellValue>]) -> Result<String> {
    let mut body = String::new();
    for row in rows {
        let line = serde_json::to_string(row)?;
        writeln!(body, "{}", line)?;
    }
    Ok(body)
}
