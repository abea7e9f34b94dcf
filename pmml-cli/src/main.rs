//! PMML CLI — build the settled-market feature dataset and inspect its view.
//!
//! Commands:
//! - `build` — discover closed yes/no markets, fetch their candlesticks,
//!   derive features, write Parquet partitions and publish the view
//! - `status` — report the published view, its partitions and row counts
//!
//! The Dome API key is read from `DOME_API_KEY` (a `.env` file is honoured).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pmml_core::data::DomeClient;
use pmml_core::storage::Catalog;
use pmml_core::{run_pipeline, PipelineConfig, ProviderConfig, RunSummary};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pmml",
    about = "PMML CLI — settled prediction-market feature dataset builder"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build feature partitions from closed yes/no markets and publish the view.
    Build {
        /// Path to a TOML config file. Defaults apply to anything it omits.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop discovery after this many eligible markets.
        #[arg(long)]
        max_markets: Option<usize>,

        /// Catalog page size.
        #[arg(long)]
        page_limit: Option<usize>,

        /// Markets per partition file.
        #[arg(long)]
        write_every: Option<usize>,

        /// Partition output directory.
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// View catalog file.
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Log filter (e.g. info, debug, pmml_core=debug). Overrides RUST_LOG.
        #[arg(long)]
        log_level: Option<String>,
    },
    /// Show the published view and its partitions.
    Status {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// View catalog file.
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// View name.
        #[arg(long)]
        view: Option<String>,

        /// Log filter (e.g. warn, debug). Overrides RUST_LOG.
        #[arg(long)]
        log_level: Option<String>,
    },
}

fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("warning: failed to load .env: {e}");
        }
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            config,
            max_markets,
            page_limit,
            write_every,
            out_dir,
            catalog,
            log_level,
        } => {
            init_tracing(log_level.as_deref());
            let mut pipeline_config = load_config(config.as_deref())?;
            apply_overrides(
                &mut pipeline_config,
                max_markets,
                page_limit,
                write_every,
                out_dir,
                catalog,
            );
            run_build(&pipeline_config)
        }
        Commands::Status {
            config,
            catalog,
            view,
            log_level,
        } => {
            init_tracing(log_level.as_deref());
            let mut pipeline_config = load_config(config.as_deref())?;
            if let Some(path) = catalog {
                pipeline_config.output.catalog_path = path;
            }
            if let Some(name) = view {
                pipeline_config.output.view_name = name;
            }
            run_status(
                &pipeline_config.output.catalog_path,
                &pipeline_config.output.view_name,
            )
        }
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn apply_overrides(
    config: &mut PipelineConfig,
    max_markets: Option<usize>,
    page_limit: Option<usize>,
    write_every: Option<usize>,
    out_dir: Option<PathBuf>,
    catalog: Option<PathBuf>,
) {
    if let Some(n) = max_markets {
        config.discovery.max_markets = n;
    }
    if let Some(n) = page_limit {
        config.discovery.page_limit = n;
    }
    if let Some(n) = write_every {
        config.output.write_every = n;
    }
    if let Some(dir) = out_dir {
        config.output.out_dir = dir;
    }
    if let Some(path) = catalog {
        config.output.catalog_path = path;
    }
}

fn run_build(config: &PipelineConfig) -> Result<()> {
    config.validate()?;
    let provider_config = ProviderConfig::from_env()?;
    info!(
        base_url = %provider_config.base_url,
        timeout_s = provider_config.timeout.as_secs_f64(),
        min_interval_ms = provider_config.min_request_interval.as_millis() as u64,
        "provider configured"
    );
    let provider = DomeClient::new(&provider_config)?;

    let summary = run_pipeline(&provider, config)?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let d = &summary.discovery;
    println!();
    println!("=== Build Summary ===");
    println!(
        "Discovery:    {} eligible of {} scanned ({} pages)",
        d.eligible, d.scanned, d.pages
    );
    println!(
        "Rejected:     {} unresolved, {} missing labels, {} not yes/no",
        d.rejected_no_winner, d.rejected_missing_labels, d.rejected_not_yes_no
    );
    println!("Processed:    {}", summary.markets_processed);
    println!("Skipped:      {}", summary.skipped.len());
    println!("Rows written: {}", summary.rows_written);
    println!("Partitions:   {}", summary.partitions.len());
    for p in &summary.partitions {
        println!(
            "  {:<28} {:>7} rows {:>4} markets  {}",
            p.path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default(),
            p.rows,
            p.markets,
            &p.content_hash[..12.min(p.content_hash.len())]
        );
    }
    println!(
        "View '{}':    {} rows total",
        summary.view_name, summary.view_rows
    );
    println!("Elapsed:      {:.1}s", summary.elapsed.as_secs_f64());

    if !summary.skipped.is_empty() {
        println!();
        println!("Skipped markets:");
        for s in &summary.skipped {
            println!("  {:<50} {}", s.market_slug, s.reason);
        }
    }
}

fn run_status(catalog_path: &Path, view_name: &str) -> Result<()> {
    if !catalog_path.exists() {
        println!("Catalog does not exist: {}", catalog_path.display());
        return Ok(());
    }

    let catalog = Catalog::open(catalog_path)?;
    let Some(view) = catalog.view(view_name) else {
        let known: Vec<&str> = catalog.view_names().collect();
        if known.is_empty() {
            bail!("view '{view_name}' not found; catalog has no views");
        }
        bail!("view '{view_name}' not found. Known views: {}", known.join(", "));
    };

    println!("Catalog:   {}", catalog.path().display());
    println!("View:      {}", view.name);
    println!("Source:    {}", view.source_glob);
    println!(
        "Published: {}",
        view.published_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();
    println!("{:<28} {:>10} {:>10}", "Partition", "Rows", "Size");
    println!("{}", "-".repeat(50));

    let mut total_size = 0u64;
    for p in &view.partitions {
        let size = partition_size(&view.source_dir.join(&p.file)).unwrap_or(0);
        total_size += size;
        println!("{:<28} {:>10} {:>10}", p.file, p.rows, format_size(size));
    }
    println!("{}", "-".repeat(50));
    println!(
        "{:<28} {:>10} {:>10}",
        format!("{} partitions", view.partitions.len()),
        view.total_rows,
        format_size(total_size)
    );

    Ok(())
}

/// On-disk size of a partition listed in a view; `None` (and a warning) when
/// the file is gone.
fn partition_size(path: &Path) -> Option<u64> {
    match std::fs::metadata(path) {
        Ok(meta) => Some(meta.len()),
        Err(_) => {
            warn!(file = %path.display(), "partition listed in view is missing on disk");
            None
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.1} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
