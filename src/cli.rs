use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::source::DataSource;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Clean retail CSV sources, load them into DuckDB once, and run analytical queries",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// YAML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory holding Stores.csv, Sales.csv, Products.csv, Exchange_Rates.csv and Customers.csv
    #[arg(long = "data-dir", env = "DATASPARK_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,
    /// DuckDB database file, or `:memory:`
    #[arg(long, env = "DATASPARK_DATABASE", global = true)]
    pub database: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clean one source and preview the result
    Clean(CleanArgs),
    /// Clean every source and load each table that does not exist yet
    Load,
    /// Show whether each source table exists and how many rows it holds
    Tables,
    /// List the available queries in catalog order
    Queries,
    /// Run a cataloged query
    Query(QueryArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum SourceArg {
    Stores,
    Sales,
    Products,
    ExchangeRates,
    Customers,
}

impl From<SourceArg> for DataSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Stores => DataSource::Stores,
            SourceArg::Sales => DataSource::Sales,
            SourceArg::Products => DataSource::Products,
            SourceArg::ExchangeRates => DataSource::ExchangeRates,
            SourceArg::Customers => DataSource::Customers,
        }
    }
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Source to clean
    #[arg(short, long, value_enum)]
    pub source: SourceArg,
    /// Number of cleaned rows to preview
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Query name exactly as listed by `queries`
    pub name: String,
    /// Result format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}
