use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use entclust::cluster::{ClusterPipeline, ClusteringStats, RecordStore, Strategy};
use entclust::config::Config;
use entclust::storage::{load_tables, OutputWriter, CLUSTERED_TABLE_FILE, CLUSTER_TRACE_FILE};
use entclust::utils::truncate_text;

#[derive(Parser)]
#[command(
    name = "entclust",
    version,
    about = "Cluster linked entity mentions into real-world entities",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster entity tables and write the annotated output
    Cluster {
        /// Entity table files or directories
        #[arg(short, long, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Linking strategy (layered, baseline)
        #[arg(short, long)]
        strategy: Option<Strategy>,

        /// Seed for cluster id suffixes
        #[arg(long)]
        seed: Option<u64>,

        /// Print the detailed run report
        #[arg(long, default_value = "false")]
        report: bool,
    },

    /// Report linking statistics without clustering
    Inspect {
        /// Entity table files or directories
        #[arg(short, long, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Number of excluded rows to list
        #[arg(long, default_value = "10")]
        show_excluded: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env()?;
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }

    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    tracing::info!("entclust starting");

    match cli.command {
        Commands::Cluster {
            input,
            output,
            strategy,
            seed,
            report,
        } => {
            if !input.is_empty() {
                config.input.paths = input;
            }
            if let Some(output) = output {
                config.output.dir = output;
            }
            if let Some(strategy) = strategy {
                config.clustering.strategy = strategy;
            }
            if seed.is_some() {
                config.clustering.seed = seed;
            }

            tracing::info!(
                inputs = config.input.paths.len(),
                output = %config.output.dir.display(),
                strategy = %config.clustering.strategy,
                "Starting cluster command"
            );
            cluster(&config, report)?;
        }

        Commands::Inspect {
            input,
            show_excluded,
        } => {
            if !input.is_empty() {
                config.input.paths = input;
            }
            tracing::info!(inputs = config.input.paths.len(), "Starting inspect command");
            inspect(&config, show_excluded)?;
        }
    }

    tracing::info!("entclust completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("entclust=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("entclust={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

fn cluster(config: &Config, detailed: bool) -> Result<()> {
    config.validate()?;
    if config.input.paths.is_empty() {
        anyhow::bail!("No input tables given (use --input or ENTCLUST_INPUT)");
    }

    let table = load_tables(&config.input.paths)?;
    let pipeline = ClusterPipeline::new(config.clustering.clone())
        .context("Invalid clustering configuration")?;
    let run = pipeline.run(&table);

    let writer = OutputWriter::new(&config.output.dir)?;
    println!("{}", run.stats.summary());
    if detailed {
        println!("\n{}", run.stats.detailed_report());
        println!("{}", run.profile.report());
    }

    if config.output.write_report {
        let written = writer.write_run(&run, config.clustering.strategy)?;
        println!("{}", written.summary());
    } else {
        let table_path = writer.write_jsonl(CLUSTERED_TABLE_FILE, &run.export.rows)?;
        let trace_path = writer.write_jsonl(CLUSTER_TRACE_FILE, &run.export.trace)?;
        println!("Wrote {} and {}", table_path.display(), trace_path.display());
    }

    if run.integrity_violations() > 0 {
        tracing::error!(
            violations = run.integrity_violations(),
            "Output contains entities assigned to more than one cluster"
        );
    }

    Ok(())
}

fn inspect(config: &Config, show_excluded: usize) -> Result<()> {
    config.validate()?;
    if config.input.paths.is_empty() {
        anyhow::bail!("No input tables given (use --input or ENTCLUST_INPUT)");
    }

    let table = load_tables(&config.input.paths)?;
    let ingestion = RecordStore::ingest(&table, &config.clustering);

    let mut stats = ClusteringStats::new();
    stats.record_ingestion(table.len(), &ingestion);

    println!("Input rows: {}", stats.input_rows);
    println!(
        "Records: {} | Excluded: {} | Duplicate rows: {}",
        stats.records, stats.excluded, stats.duplicate_rows
    );
    for (reason, count) in &stats.excluded_by_reason {
        println!("  - {reason}: {count}");
    }
    println!(
        "KB linked: {} ({:.1}%) | Wikidata linked: {} ({:.1}%) | Both: {}",
        stats.kb_linked,
        stats.kb_link_rate(),
        stats.wikidata_linked,
        stats.wikidata_link_rate(),
        stats.both_linked
    );

    if show_excluded > 0 && !ingestion.excluded.is_empty() {
        println!("\nExcluded rows:");
        for excluded in ingestion.excluded.iter().take(show_excluded) {
            println!(
                "  {:<40} {:<24} {}",
                truncate_text(&excluded.id, 40),
                truncate_text(&excluded.entity_type, 24),
                excluded.reason
            );
        }
    }

    Ok(())
}
