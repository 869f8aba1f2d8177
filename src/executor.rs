//! Runs cataloged queries against the store and shapes their results.

use chrono::{DateTime, NaiveDate};
use duckdb::{
    Connection,
    types::{TimeUnit, Value as SqlValue},
};
use log::{debug, info};
use rust_decimal::prelude::ToPrimitive;
use serde_json::json;

use crate::{
    catalog::{QueryCatalog, QueryDefinition},
    data::{Value, display_cell},
    error::QueryError,
    store::StoreGateway,
};

/// Column-named, row-ordered output of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<Value>>>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn render_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(display_cell).collect())
            .collect()
    }

    /// `{"name", "columns", "rows"}` with cells as plain JSON scalars.
    pub fn to_json(&self) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().map(cell_to_json).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        json!({
            "name": self.name,
            "columns": self.columns,
            "rows": rows,
        })
    }
}

fn cell_to_json(cell: &Option<Value>) -> serde_json::Value {
    match cell {
        None => serde_json::Value::Null,
        Some(Value::Integer(i)) => json!(i),
        Some(Value::Float(f)) => json!(f),
        Some(Value::Boolean(b)) => json!(b),
        Some(other) => json!(other.as_display()),
    }
}

pub struct QueryExecutor<'a> {
    gateway: &'a StoreGateway,
    catalog: &'a QueryCatalog,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(gateway: &'a StoreGateway, catalog: &'a QueryCatalog) -> Self {
        Self { gateway, catalog }
    }

    /// Executes the named query on a connection held for this call only.
    pub fn execute(&self, name: &str) -> Result<QueryResult, QueryError> {
        let definition = self.catalog.get(name)?;
        info!("Executing query '{}'", definition.name);
        let conn = self
            .gateway
            .acquire()
            .map_err(|cause| QueryError::Connection {
                name: definition.name.to_string(),
                cause,
            })?;
        let (columns, rows) =
            run_query(&conn, definition.sql).map_err(|cause| QueryError::Execution {
                name: definition.name.to_string(),
                cause,
            })?;
        validate_shape(definition, &columns)?;
        debug!(
            "Query '{}' returned {} row(s)",
            definition.name,
            rows.len()
        );
        Ok(QueryResult {
            name: definition.name.to_string(),
            columns,
            rows,
        })
    }
}

type RawResult = (Vec<String>, Vec<Vec<Option<Value>>>);

fn run_query(conn: &Connection, sql: &str) -> duckdb::Result<RawResult> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let columns = rows
        .as_ref()
        .map(|stmt| stmt.column_names())
        .unwrap_or_default();
    let mut output = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            cells.push(from_sql_value(row.get::<_, SqlValue>(idx)?));
        }
        output.push(cells);
    }
    Ok((columns, output))
}

fn validate_shape(definition: &QueryDefinition, actual: &[String]) -> Result<(), QueryError> {
    let matches = actual.len() == definition.expected_columns.len()
        && actual
            .iter()
            .zip(definition.expected_columns)
            .all(|(got, want)| got.eq_ignore_ascii_case(want));
    if matches {
        Ok(())
    } else {
        Err(QueryError::ShapeMismatch {
            name: definition.name.to_string(),
            expected: definition
                .expected_columns
                .iter()
                .map(|column| column.to_string())
                .collect(),
            actual: actual.to_vec(),
        })
    }
}

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Maps a store value onto the cell model; types without a counterpart are
/// rendered as text.
pub fn from_sql_value(value: SqlValue) -> Option<Value> {
    match value {
        SqlValue::Null => None,
        SqlValue::Boolean(b) => Some(Value::Boolean(b)),
        SqlValue::TinyInt(i) => Some(Value::Integer(i.into())),
        SqlValue::SmallInt(i) => Some(Value::Integer(i.into())),
        SqlValue::Int(i) => Some(Value::Integer(i.into())),
        SqlValue::BigInt(i) => Some(Value::Integer(i)),
        SqlValue::UTinyInt(i) => Some(Value::Integer(i.into())),
        SqlValue::USmallInt(i) => Some(Value::Integer(i.into())),
        SqlValue::UInt(i) => Some(Value::Integer(i.into())),
        SqlValue::UBigInt(i) => Some(
            i64::try_from(i)
                .map(Value::Integer)
                .unwrap_or(Value::Float(i as f64)),
        ),
        SqlValue::HugeInt(i) => Some(
            i64::try_from(i)
                .map(Value::Integer)
                .unwrap_or(Value::Float(i as f64)),
        ),
        SqlValue::Float(f) => Some(Value::Float(f.into())),
        SqlValue::Double(f) => Some(Value::Float(f)),
        SqlValue::Decimal(d) => Some(
            rust_decimal::Decimal::try_from(d)
                .ok()
                .and_then(|exact| exact.to_f64())
                .map(Value::Float)
                .unwrap_or_else(|| Value::String(d.to_string())),
        ),
        SqlValue::Text(s) | SqlValue::Enum(s) => Some(Value::String(s)),
        SqlValue::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(Value::Date),
        SqlValue::Timestamp(unit, raw) => {
            let micros = match unit {
                TimeUnit::Second => raw.checked_mul(1_000_000),
                TimeUnit::Millisecond => raw.checked_mul(1_000),
                TimeUnit::Microsecond => Some(raw),
                TimeUnit::Nanosecond => Some(raw / 1_000),
            };
            micros
                .and_then(DateTime::from_timestamp_micros)
                .map(|dt| Value::DateTime(dt.naive_utc()))
        }
        other => Some(Value::String(format!("{other:?}"))),
    }
}
