//! Error taxonomy for ingestion, storage and query execution.
//!
//! Cell-level coercion problems never surface here; they are recovered as
//! unknown cells during cleaning. These errors describe failures of a whole
//! source, a store operation or a query.

use std::path::PathBuf;

use thiserror::Error;

use crate::source::DataSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {source_id} data from {path:?}: {cause}")]
    Read {
        source_id: DataSource,
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    #[error("{source_id} data is not valid tabular input: {message}")]
    Malformed {
        source_id: DataSource,
        message: String,
    },

    #[error("{source_id} data could not be decoded with any of: {}", tried.join(", "))]
    Decode {
        source_id: DataSource,
        tried: Vec<&'static str>,
    },

    #[error("{source_id} data is missing required column '{column}'")]
    MissingColumn {
        source_id: DataSource,
        column: String,
    },

    #[error("{source_id} column '{column}' has no observed values to impute from")]
    EmptyColumn {
        source_id: DataSource,
        column: String,
    },
}

impl SourceError {
    pub fn source_id(&self) -> DataSource {
        match self {
            SourceError::Read { source_id, .. }
            | SourceError::Malformed { source_id, .. }
            | SourceError::Decode { source_id, .. }
            | SourceError::MissingColumn { source_id, .. }
            | SourceError::EmptyColumn { source_id, .. } => *source_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unable to connect to store '{target}': {cause}")]
    Connection {
        target: String,
        #[source]
        cause: duckdb::Error,
    },

    #[error("Store metadata lookup for table '{table}' failed: {cause}")]
    Metadata {
        table: String,
        #[source]
        cause: duckdb::Error,
    },

    #[error("Loading table '{table}' failed: {cause}")]
    Write {
        table: String,
        #[source]
        cause: duckdb::Error,
    },
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Unknown query '{0}'")]
    UnknownQuery(String),

    #[error("Query '{name}' could not acquire a store connection: {cause}")]
    Connection {
        name: String,
        #[source]
        cause: StoreError,
    },

    #[error("Query '{name}' failed: {cause}")]
    Execution {
        name: String,
        #[source]
        cause: duckdb::Error,
    },

    #[error("Query '{name}' returned columns [{}] but [{}] were expected", actual.join(", "), expected.join(", "))]
    ShapeMismatch {
        name: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
}
