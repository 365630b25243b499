// Data Models and Types
//
// Report queries and responses as exchanged with the GA4 Data API, and the
// typed rows that end up in ClickHouse.

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::filter::FilterExpression;

/// Format ClickHouse accepts for DateTime columns
pub const CLICKHOUSE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Inclusive date range, serialized as the API's `{"startDate", "endDate"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self { start_date, end_date }
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self::new(day, day)
    }
}

/// One page request against a GA4 property. Dimension and metric order is
/// fixed for the life of a run; only the offset moves between pages.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportQuery {
    pub property_id: String,
    pub date_range: DateRange,
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    pub filter: Option<FilterExpression>,
    pub page_size: u32,
    pub page_offset: u64,
}

impl ReportQuery {
    /// Same query restricted to one calendar day, starting from the first page
    pub fn for_day(&self, day: NaiveDate) -> Self {
        Self {
            date_range: DateRange::single_day(day),
            page_offset: 0,
            ..self.clone()
        }
    }

    pub fn at_offset(&self, offset: u64) -> Self {
        Self {
            page_offset: offset,
            ..self.clone()
        }
    }

    /// Request body for `properties/{id}:runReport`
    pub fn to_request(&self) -> RunReportRequest {
        RunReportRequest {
            date_ranges: vec![self.date_range],
            dimensions: self.dimensions.iter().map(|name| NamedField::new(name)).collect(),
            metrics: self.metrics.iter().map(|name| NamedField::new(name)).collect(),
            dimension_filter: self.filter.clone(),
            limit: self.page_size,
            offset: self.page_offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedField {
    pub name: String,
}

impl NamedField {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportRequest {
    pub date_ranges: Vec<DateRange>,
    pub dimensions: Vec<NamedField>,
    pub metrics: Vec<NamedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_filter: Option<FilterExpression>,
    pub limit: u32,
    pub offset: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    #[serde(default)]
    pub dimension_headers: Vec<NamedField>,
    #[serde(default)]
    pub metric_headers: Vec<NamedField>,
    /// Omitted entirely by the API when the page is empty
    #[serde(default)]
    pub rows: Vec<WireRow>,
    #[serde(default)]
    pub row_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRow {
    #[serde(default)]
    pub dimension_values: Vec<WireValue>,
    #[serde(default)]
    pub metric_values: Vec<WireValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireValue {
    #[serde(default)]
    pub value: Option<String>,
}

/// Raw report row: every value is a string as sent by the API, None when absent
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportRow {
    pub dimension_values: Vec<Option<String>>,
    pub metric_values: Vec<Option<String>>,
}

impl ReportRow {
    pub fn new<D, M>(dimensions: D, metrics: M) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            dimension_values: dimensions.into_iter().map(|v| Some(v.into())).collect(),
            metric_values: metrics.into_iter().map(|v| Some(v.into())).collect(),
        }
    }
}

/// One page of a report with the header names the API echoed back
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportPage {
    pub dimension_headers: Vec<String>,
    pub metric_headers: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl From<RunReportResponse> for ReportPage {
    fn from(response: RunReportResponse) -> Self {
        let values = |cells: Vec<WireValue>| cells.into_iter().map(|c| c.value).collect();

        Self {
            dimension_headers: response.dimension_headers.into_iter().map(|h| h.name).collect(),
            metric_headers: response.metric_headers.into_iter().map(|h| h.name).collect(),
            rows: response
                .rows
                .into_iter()
                .map(|row| ReportRow {
                    dimension_values: values(row.dimension_values),
                    metric_values: values(row.metric_values),
                })
                .collect(),
        }
    }
}

/// Typed value bound for one destination column
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Timestamp(NaiveDateTime),
    Text(String),
    Int(i64),
    Float(f64),
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Timestamp(ts) => {
                serializer.collect_str(&ts.format(CLICKHOUSE_DATETIME_FORMAT))
            }
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Int(i) => serializer.serialize_i64(*i),
            CellValue::Float(f) => serializer.serialize_f64(*f),
        }
    }
}

/// Transformed row keyed by destination column name. Column order is applied
/// only when the row is turned into a tuple for the insert.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformedRow {
    cells: BTreeMap<String, CellValue>,
}

impl TransformedRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &str, value: CellValue) {
        self.cells.insert(column.to_string(), value);
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Positional tuple in the given column order
    pub fn into_tuple(mut self, columns: &[String]) -> Result<Vec<CellValue>> {
        columns
            .iter()
            .map(|column| {
                self.cells
                    .remove(column)
                    .ok_or_else(|| anyhow!("row has no value for column '{}'", column))
            })
            .collect()
    }
}

/// Every transformed row of a run, in fetch order, with the destination columns
#[derive(Debug, Clone, Default)]
pub struct AccumulatedBatch {
    pub columns: Vec<String>,
    pub rows: Vec<TransformedRow>,
}

impl AccumulatedBatch {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: TransformedRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Consume the batch into positional tuples ready for binding
    pub fn into_tuples(self) -> Result<Vec<Vec<CellValue>>> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| row.into_tuple(&columns))
            .collect()
    }
}
