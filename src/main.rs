// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use ipa_sync::pipeline::orchestrator::resolve_source;
use ipa_sync::utils::logging::{format_error, format_step, format_success, format_warning};
use ipa_sync::{
    Config, ElasticClient, HealthCheck, HealthReport, IndexMapping, IndexStore, SyncPipeline,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "ipa_sync")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(
    about = "Replace the IndicePA PEC index in Elasticsearch with the contents of pec.txt",
    long_about = None
)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = ipa_sync::config::DEFAULT_CONFIG_PATH
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the source file and replace the index with its records
    Sync {
        /// Tab-separated source; overrides source.path
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Parse and transform only, leave the index untouched
        #[arg(long)]
        dry_run: bool,
    },

    /// Check the Elasticsearch connection and the target index
    Verify {
        #[arg(long)]
        create_mapping: bool,
    },

    /// Print the number of documents in the target index
    Stats,

    /// Delete the target index
    Reset {
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    ipa_sync::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    info!("IndicePA PEC sync");

    let config = if cli.config.exists() {
        info!("Loading configuration from: {}", cli.config.display());
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using defaults and environment",
            cli.config.display()
        );
        Config::load(None).context("Failed to load configuration")?
    };

    match cli.command {
        Commands::Sync { input, dry_run } => {
            cmd_sync(&config, input, dry_run).await?;
        }
        Commands::Verify { create_mapping } => {
            cmd_verify(&config, create_mapping).await?;
        }
        Commands::Stats => {
            cmd_stats(&config).await?;
        }
        Commands::Reset { confirm } => {
            cmd_reset(&config, confirm).await?;
        }
    }

    Ok(())
}

async fn cmd_sync(config: &Config, input: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let source = resolve_source(input, &config.source.path);

    let client =
        ElasticClient::new(&config.store).context("Failed to create Elasticsearch client")?;
    let pipeline = SyncPipeline::new(&client, &config.store)
        .context("Failed to prepare sync pipeline")?
        .with_progress(std::io::stderr().is_terminal());

    info!("Reading {}", source.display());
    let report = match pipeline.run_path(&source, dry_run).await {
        Ok(report) => report,
        Err(e) => {
            error!(kind = e.kind(), "Sync failed: {}", e);
            eprintln!("{}", format_error(&e.to_string()));
            return Err(e).context("Sync run failed");
        }
    };

    match &report.replace {
        None => println!(
            "{}",
            format_success(&format!(
                "Dry run: {} records parsed (sha256 {})",
                report.stats.documents_built, report.snapshot_digest
            ))
        ),
        Some(replace) if replace.is_complete() => println!(
            "{}",
            format_success(&format!(
                "{} records indexed into {}",
                replace.indexed, replace.index
            ))
        ),
        Some(replace) => println!(
            "{}",
            format_warning(&format!(
                "{} of {} records indexed into {} ({} rejected)",
                replace.indexed, replace.submitted, replace.index, replace.failed
            ))
        ),
    }

    Ok(())
}

async fn cmd_verify(config: &Config, create_mapping: bool) -> Result<()> {
    info!("Verifying Elasticsearch and index {}", config.store.index_name);

    let client =
        ElasticClient::new(&config.store).context("Failed to create Elasticsearch client")?;
    let index = &config.store.index_name;
    let mut checks = Vec::new();

    println!("{}", format_step(1, 2, "Connecting to Elasticsearch"));
    let started = Instant::now();
    match client.ping().await {
        Ok(()) => checks.push(HealthCheck::healthy("elasticsearch", started.elapsed())),
        Err(e) => {
            checks.push(HealthCheck::unhealthy(
                "elasticsearch",
                e.to_string(),
                started.elapsed(),
            ));
            let report = HealthReport::new(checks, env!("CARGO_PKG_VERSION").to_string());
            println!("{}", report.format());
            return Err(e).context("Elasticsearch connection failed");
        }
    }

    println!("{}", format_step(2, 2, &format!("Checking index {}", index)));
    let component = format!("index:{}", index);
    let started = Instant::now();
    if client.index_exists(index).await? {
        checks.push(HealthCheck::healthy(&component, started.elapsed()));
    } else if create_mapping {
        let mapping = match &config.store.mapping_path {
            Some(path) => IndexMapping::from_file(path)?,
            None => IndexMapping::default(),
        };
        client
            .create_index(index, &mapping)
            .await
            .context("Failed to create index mapping")?;
        info!("Index {} created with mapping", index);
        checks.push(HealthCheck::healthy(&component, started.elapsed()));
    } else {
        checks.push(HealthCheck::degraded(
            &component,
            "index missing (use --create-mapping to create it)".to_string(),
            started.elapsed(),
        ));
    }

    let report = HealthReport::new(checks, env!("CARGO_PKG_VERSION").to_string());
    println!("{}", report.format());

    Ok(())
}

async fn cmd_stats(config: &Config) -> Result<()> {
    info!("Gathering statistics");

    let client =
        ElasticClient::new(&config.store).context("Failed to create Elasticsearch client")?;
    client.ping().await.context("Elasticsearch connection failed")?;

    let count = client
        .count_documents(&config.store.index_name)
        .await
        .context("Failed to count documents")?;
    info!("Total documents in {}: {}", config.store.index_name, count);
    println!("{}", count);

    Ok(())
}

async fn cmd_reset(config: &Config, confirm: bool) -> Result<()> {
    if !confirm {
        error!("This will delete the index. Use --confirm to proceed");
        return Ok(());
    }

    warn!("Deleting index {} - all documents will be lost", config.store.index_name);

    let client =
        ElasticClient::new(&config.store).context("Failed to create Elasticsearch client")?;
    let outcome = client
        .delete_index(&config.store.index_name)
        .await
        .context("Failed to delete index")?;

    info!("Index {}: {:?}", config.store.index_name, outcome);
    Ok(())
}
