use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tablature::infra::config::CatalogConfig;
use tablature::infra::import::csv::import_csv_to_table;
use tablature::{CatalogBuilder, DataSource, SqliteSource, TablePage, TableView};

/// Answer one table-data request against a SQLite table.
#[derive(Debug, Parser)]
#[command(name = "tablature", version)]
struct Args {
    /// SQLite database; defaults to the per-user data directory.
    #[arg(long)]
    db: Option<PathBuf>,
    /// YAML catalog configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Table to serve; overrides `table` from the config.
    #[arg(long)]
    table: Option<String>,
    /// Replace the table with the contents of this CSV file first.
    #[arg(long)]
    import_csv: Option<PathBuf>,
    /// UI locale, used to pick a full-text search configuration.
    #[arg(long, default_value = "en")]
    locale: String,
    /// Print the initial page context instead of answering `query`.
    #[arg(long)]
    page: bool,
    /// Query string, e.g. `q=jane&orderings=1,0&page=0` or `get_config`.
    #[arg(default_value = "")]
    query: String,
}

fn default_db_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "hellhbbd", "tablature")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    Ok(project_dirs.data_local_dir().join("tables.sqlite"))
}

fn run(args: Args) -> Result<ExitCode> {
    let db_path = match args.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let config = args
        .config
        .as_deref()
        .map(CatalogConfig::load)
        .transpose()?;

    let table = args
        .table
        .or_else(|| config.as_ref().and_then(|config| config.table.clone()))
        .or_else(|| {
            args.import_csv
                .as_deref()
                .and_then(|path| path.file_stem())
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
        })
        .ok_or_else(|| anyhow!("no table given: use --table or set `table` in the config"))?;

    if let Some(csv_path) = &args.import_csv {
        let imported = import_csv_to_table(&db_path, csv_path, &table, true)?;
        info!(table = %imported.table, rows = imported.row_count, "imported csv");
    }

    let source = SqliteSource::open(&db_path, &table)
        .with_context(|| format!("failed to open table `{table}`"))?;
    let builder = config
        .map(CatalogConfig::into_builder)
        .unwrap_or_else(CatalogBuilder::default);
    let catalog = builder.build(source.schema())?;
    info!(
        table = %table,
        columns = catalog.columns().len(),
        db = %db_path.display(),
        "catalog ready"
    );
    let view = TableView::new(Arc::new(catalog), source);

    if args.page {
        let context = TablePage::new(&view).context()?;
        println!("{}", serde_json::to_string_pretty(&context)?);
        return Ok(ExitCode::SUCCESS);
    }

    let response = view.handle(&args.query, &args.locale)?;
    println!("{}", response.body);
    if response.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
