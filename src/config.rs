//! Application configuration: where the source files live and which store to
//! load into.
//!
//! Values come from an optional YAML file and are then overridden by command
//! line flags (or their environment variables). Every field has a default, so
//! running without a config file reads `data/*.csv` into `dataspark.duckdb`.

use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::source::DataSource;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_DATABASE: &str = "dataspark.duckdb";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Directory holding the default `<Table>.csv` files.
    pub data_dir: PathBuf,
    /// DuckDB database path, or `:memory:`.
    pub database: String,
    /// Per-source file overrides; relative paths resolve against `data_dir`.
    pub sources: BTreeMap<DataSource, PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            database: DEFAULT_DATABASE.to_string(),
            sources: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let config: AppConfig =
            serde_yaml::from_reader(reader).with_context(|| format!("Parsing config YAML {path:?}"))?;
        debug!("Loaded configuration from {path:?}: {config:?}");
        Ok(config)
    }

    /// Loads `path` when given, otherwise starts from defaults, then applies
    /// the overrides that are set.
    pub fn resolve(
        path: Option<&Path>,
        data_dir: Option<PathBuf>,
        database: Option<String>,
    ) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(data_dir) = data_dir {
            config.data_dir = data_dir;
        }
        if let Some(database) = database {
            config.database = database;
        }
        Ok(config)
    }

    pub fn source_path(&self, source: DataSource) -> PathBuf {
        match self.sources.get(&source) {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.data_dir.join(path),
            None => self.data_dir.join(source.file_name()),
        }
    }
}
