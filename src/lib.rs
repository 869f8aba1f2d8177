pub mod catalog;
pub mod cleaning;
pub mod cli;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod executor;
pub mod io_utils;
pub mod pipeline;
pub mod schema;
pub mod source;
pub mod stats;
pub mod store;
pub mod table;

use std::{env, io::Write, path::Path, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    catalog::QueryCatalog,
    cli::{CleanArgs, Cli, Commands, OutputFormat, QueryArgs},
    config::AppConfig,
    executor::{QueryExecutor, QueryResult},
    source::DataSource,
    store::StoreGateway,
    table::Align,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("dataspark", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = AppConfig::resolve(
        cli.global.config.as_deref(),
        cli.global.data_dir,
        cli.global.database,
    )?;
    match cli.command {
        Commands::Clean(args) => handle_clean(&config, &args),
        Commands::Load => handle_load(&config),
        Commands::Tables => handle_tables(&config),
        Commands::Queries => handle_queries(),
        Commands::Query(args) => handle_query(&config, &args),
    }
}

fn open_store(config: &AppConfig) -> Result<StoreGateway> {
    StoreGateway::open(&config.database)
        .with_context(|| format!("Opening store {:?}", config.database))
}

fn handle_clean(config: &AppConfig, args: &CleanArgs) -> Result<()> {
    let source = DataSource::from(args.source);
    let path = config.source_path(source);
    let dataset = source::load(source, &path)
        .with_context(|| format!("Cleaning {source} data from {path:?}"))?;
    info!(
        "Cleaned {} row(s) across {} column(s) from {:?}",
        dataset.row_count(),
        dataset.column_count(),
        path
    );
    table::print_table(&dataset.headers(), &dataset.render_rows(args.rows));
    Ok(())
}

fn handle_load(config: &AppConfig) -> Result<()> {
    let gateway = open_store(config)?;
    let report = pipeline::ingest_all(config, &gateway);
    for (source, outcome) in &report.outcomes {
        println!("{}: {}", source.table_name(), outcome);
    }
    let failed = report.failures().count();
    if failed > 0 {
        bail!("{failed} source(s) failed to load ({})", report.summary());
    }
    info!("Load finished: {}", report.summary());
    Ok(())
}

fn handle_tables(config: &AppConfig) -> Result<()> {
    let gateway = open_store(config)?;
    let headers = vec!["Table".to_string(), "State".to_string(), "Rows".to_string()];
    let mut rows = Vec::with_capacity(DataSource::ALL.len());
    for source in DataSource::ALL {
        let table = source.table_name();
        let row = if gateway.table_exists(table)? {
            vec![
                table.to_string(),
                "loaded".to_string(),
                gateway.row_count(table)?.to_string(),
            ]
        } else {
            vec![table.to_string(), "absent".to_string(), String::new()]
        };
        rows.push(row);
    }
    print!(
        "{}",
        table::render_aligned(&headers, &rows, &[Align::Left, Align::Left, Align::Right])
    );
    Ok(())
}

fn handle_queries() -> Result<()> {
    for name in QueryCatalog::standard().list_names() {
        println!("{name}");
    }
    Ok(())
}

fn handle_query(config: &AppConfig, args: &QueryArgs) -> Result<()> {
    let gateway = open_store(config)?;
    let catalog = QueryCatalog::standard();
    let result = QueryExecutor::new(&gateway, &catalog).execute(&args.name)?;
    info!(
        "Query '{}' returned {} row(s)",
        result.name,
        result.row_count()
    );
    write_result(&result, args.format, args.output.as_deref())
        .with_context(|| format!("Writing results of '{}'", result.name))
}

fn write_result(result: &QueryResult, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let mut writer = io_utils::open_output(output)?;
            let rendered =
                table::render_aligned(&result.columns, &result.render_rows(), &alignments(result));
            writer.write_all(rendered.as_bytes())?;
            writer.flush()?;
        }
        OutputFormat::Csv => {
            let mut writer = io_utils::open_csv_writer(output, io_utils::DEFAULT_CSV_DELIMITER)?;
            writer.write_record(&result.columns)?;
            for row in result.render_rows() {
                writer.write_record(&row)?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            let mut writer = io_utils::open_output(output)?;
            serde_json::to_writer_pretty(&mut writer, &result.to_json())?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Right-aligns columns whose present cells are all numeric.
fn alignments(result: &QueryResult) -> Vec<Align> {
    (0..result.columns.len())
        .map(|idx| {
            let mut present = result.rows.iter().filter_map(|row| row[idx].as_ref()).peekable();
            if present.peek().is_some() && present.all(|value| value.is_numeric()) {
                Align::Right
            } else {
                Align::Left
            }
        })
        .collect()
}
