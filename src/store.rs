//! DuckDB-backed store with at-most-once table creation.
//!
//! The gateway keeps one root connection to the database and hands out a
//! fresh clone for every operation, so each existence check, load or query
//! holds a connection only for its own duration. Clones share the same
//! database instance, which keeps `:memory:` targets coherent across calls.

use std::fmt;

use duckdb::{Connection, ToSql, types::Value as SqlValue};
use log::{debug, info, warn};

use crate::{
    data::Value,
    dataset::{Column, TabularDataset},
    error::StoreError,
};

pub const IN_MEMORY_TARGET: &str = ":memory:";

/// Outcome of [`StoreGateway::load_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loaded { rows: usize },
    AlreadyExists,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Loaded { rows } => write!(f, "loaded {rows} row(s)"),
            LoadState::AlreadyExists => f.write_str("already exists"),
        }
    }
}

/// Column type chosen for a table column from the cleaned cells it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    BigInt,
    Double,
    Boolean,
    Date,
    Timestamp,
    Varchar,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Date => "DATE",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Varchar => "VARCHAR",
        }
    }

    pub fn for_column(column: &Column) -> Self {
        let mut resolved: Option<SqlType> = None;
        for value in column.present() {
            let observed = match value {
                Value::Integer(_) => SqlType::BigInt,
                Value::Float(_) => SqlType::Double,
                Value::Boolean(_) => SqlType::Boolean,
                Value::Date(_) => SqlType::Date,
                Value::DateTime(_) => SqlType::Timestamp,
                Value::String(_) => return SqlType::Varchar,
            };
            resolved = Some(match (resolved, observed) {
                (None, next) => next,
                (Some(current), next) if current == next => current,
                (Some(SqlType::BigInt), SqlType::Double) | (Some(SqlType::Double), SqlType::BigInt) => {
                    SqlType::Double
                }
                (Some(SqlType::Date), SqlType::Timestamp) | (Some(SqlType::Timestamp), SqlType::Date) => {
                    SqlType::Timestamp
                }
                _ => return SqlType::Varchar,
            });
        }
        resolved.unwrap_or(SqlType::Varchar)
    }

    /// Converts a cleaned cell into the value appended to a column of this type.
    /// Temporal cells are appended as ISO text and cast by the store.
    fn to_sql_value(self, cell: &Option<Value>) -> SqlValue {
        let Some(value) = cell else {
            return SqlValue::Null;
        };
        match (self, value) {
            (SqlType::BigInt, Value::Integer(i)) => SqlValue::BigInt(*i),
            (SqlType::Double, Value::Integer(i)) => SqlValue::Double(*i as f64),
            (SqlType::Double, Value::Float(f)) => SqlValue::Double(*f),
            (SqlType::Boolean, Value::Boolean(b)) => SqlValue::Boolean(*b),
            (SqlType::Date, Value::Date(d)) => SqlValue::Text(d.format("%Y-%m-%d").to_string()),
            (SqlType::Timestamp, Value::Date(d)) => {
                SqlValue::Text(d.format("%Y-%m-%d 00:00:00").to_string())
            }
            (SqlType::Timestamp, Value::DateTime(dt)) => {
                SqlValue::Text(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }
            (_, other) => SqlValue::Text(other.as_display()),
        }
    }
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `CREATE TABLE` statement for `dataset` under `table`.
pub fn create_table_sql(table: &str, dataset: &TabularDataset) -> String {
    let columns = dataset
        .columns()
        .iter()
        .map(|column| {
            format!(
                "{} {}",
                quote_identifier(&column.name),
                SqlType::for_column(column).as_sql()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({columns})", quote_identifier(table))
}

pub struct StoreGateway {
    target: String,
    root: Connection,
}

impl StoreGateway {
    /// Opens the database at `target`, or an in-memory one for `:memory:`.
    pub fn open(target: &str) -> Result<Self, StoreError> {
        let root = if target == IN_MEMORY_TARGET {
            Connection::open_in_memory()
        } else {
            Connection::open(target)
        }
        .map_err(|cause| StoreError::Connection {
            target: target.to_string(),
            cause,
        })?;
        debug!("Opened store '{target}'");
        Ok(Self {
            target: target.to_string(),
            root,
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(IN_MEMORY_TARGET)
    }

    /// A connection scoped to one operation; dropping it releases it.
    pub fn acquire(&self) -> Result<Connection, StoreError> {
        self.root.try_clone().map_err(|cause| StoreError::Connection {
            target: self.target.clone(),
            cause,
        })
    }

    pub fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
        let conn = self.acquire()?;
        table_exists_on(&conn, table)
    }

    pub fn row_count(&self, table: &str) -> Result<usize, StoreError> {
        let conn = self.acquire()?;
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
                [],
                |row| row.get(0),
            )
            .map_err(|cause| StoreError::Metadata {
                table: table.to_string(),
                cause,
            })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Creates and fills `table` from `dataset` unless a table with that name
    /// already exists. An existing table is left untouched, whatever its shape.
    pub fn load_if_absent(
        &self,
        dataset: &TabularDataset,
        table: &str,
    ) -> Result<LoadState, StoreError> {
        let mut conn = self.acquire()?;
        if table_exists_on(&conn, table)? {
            warn!("Table '{table}' already exists; skipping load");
            return Ok(LoadState::AlreadyExists);
        }

        let write_error = |cause| StoreError::Write {
            table: table.to_string(),
            cause,
        };
        let types = dataset
            .columns()
            .iter()
            .map(SqlType::for_column)
            .collect::<Vec<_>>();
        let create = create_table_sql(table, dataset);
        debug!("{create}");

        let tx = conn.transaction().map_err(write_error)?;
        tx.execute_batch(&create).map_err(write_error)?;
        {
            let mut appender = tx.appender(table).map_err(write_error)?;
            for row in dataset.rows() {
                let values = row
                    .iter()
                    .zip(&types)
                    .map(|(cell, sql_type)| sql_type.to_sql_value(cell))
                    .collect::<Vec<_>>();
                let params = values
                    .iter()
                    .map(|value| value as &dyn ToSql)
                    .collect::<Vec<_>>();
                appender
                    .append_row(params.as_slice())
                    .map_err(write_error)?;
            }
            appender.flush().map_err(write_error)?;
        }
        tx.commit().map_err(write_error)?;

        let rows = dataset.row_count();
        info!("Loaded {rows} row(s) into table '{table}'");
        Ok(LoadState::Loaded { rows })
    }
}

impl fmt::Debug for StoreGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreGateway")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

fn table_exists_on(conn: &Connection, table: &str) -> Result<bool, StoreError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE lower(table_name) = lower(?)",
            [table],
            |row| row.get(0),
        )
        .map_err(|cause| StoreError::Metadata {
            table: table.to_string(),
            cause,
        })?;
    Ok(count > 0)
}
