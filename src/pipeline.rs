//! Ingest-all: clean every source, then load each cleaned dataset at most once.

use std::fmt;

use itertools::Itertools;
use log::{error, info};

use crate::{
    config::AppConfig,
    dataset::TabularDataset,
    error::{SourceError, StoreError},
    source::{self, DataSource},
    store::{LoadState, StoreGateway},
};

#[derive(Debug)]
pub enum SourceOutcome {
    Loaded { rows: usize },
    AlreadyExists,
    CleanFailed(SourceError),
    LoadFailed(StoreError),
}

impl SourceOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SourceOutcome::CleanFailed(_) | SourceOutcome::LoadFailed(_))
    }
}

impl From<LoadState> for SourceOutcome {
    fn from(state: LoadState) -> Self {
        match state {
            LoadState::Loaded { rows } => SourceOutcome::Loaded { rows },
            LoadState::AlreadyExists => SourceOutcome::AlreadyExists,
        }
    }
}

impl fmt::Display for SourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceOutcome::Loaded { rows } => write!(f, "loaded {rows} row(s)"),
            SourceOutcome::AlreadyExists => f.write_str("already exists"),
            SourceOutcome::CleanFailed(err) => write!(f, "clean failed: {err}"),
            SourceOutcome::LoadFailed(err) => write!(f, "load failed: {err}"),
        }
    }
}

/// Per-source outcomes in ingestion order.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub outcomes: Vec<(DataSource, SourceOutcome)>,
}

impl IngestReport {
    pub fn outcome(&self, source: DataSource) -> Option<&SourceOutcome> {
        self.outcomes
            .iter()
            .find(|(candidate, _)| *candidate == source)
            .map(|(_, outcome)| outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &(DataSource, SourceOutcome)> {
        self.outcomes.iter().filter(|(_, outcome)| outcome.is_failure())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// One-line tally such as `3 loaded, 1 already exists, 1 failed`.
    pub fn summary(&self) -> String {
        let counts = self.outcomes.iter().counts_by(|(_, outcome)| match outcome {
            SourceOutcome::Loaded { .. } => "loaded",
            SourceOutcome::AlreadyExists => "already exists",
            SourceOutcome::CleanFailed(_) | SourceOutcome::LoadFailed(_) => "failed",
        });
        ["loaded", "already exists", "failed"]
            .into_iter()
            .filter_map(|label| counts.get(label).map(|count| format!("{count} {label}")))
            .join(", ")
    }
}

/// Reads and cleans every source in declaration order.
pub fn clean_all(config: &AppConfig) -> Vec<(DataSource, Result<TabularDataset, SourceError>)> {
    DataSource::ALL
        .into_iter()
        .map(|source| (source, source::load(source, &config.source_path(source))))
        .collect()
}

/// Cleans all sources before loading any of them; a source that fails to
/// clean is reported and the others are still loaded.
pub fn ingest_all(config: &AppConfig, gateway: &StoreGateway) -> IngestReport {
    let cleaned = clean_all(config);
    let mut report = IngestReport::default();
    for (source, result) in cleaned {
        let outcome = match result {
            Ok(dataset) => match gateway.load_if_absent(&dataset, source.table_name()) {
                Ok(state) => SourceOutcome::from(state),
                Err(err) => {
                    error!("{err}");
                    SourceOutcome::LoadFailed(err)
                }
            },
            Err(err) => {
                error!("{err}");
                SourceOutcome::CleanFailed(err)
            }
        };
        info!("{}: {}", source, outcome);
        report.outcomes.push((source, outcome));
    }
    report
}
