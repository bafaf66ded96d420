//! ClaimCraft CLI
//!
//! Operator tool for building, publishing and serving Merkle airdrop
//! distributions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};

use claimcraft_distribution::{BucketSpec, DirectorySink, Distributor};
use claimcraft_ingest::{ingest, normalize, to_csv, FileSource, InputSource};
use claimcraft_logging::{try_init as try_init_logging, LogLevel};
use claimcraft_query::{serve, ProofStore};
use claimcraft_settings::{Settings, DEFAULT_SETTINGS_FILE};

/// ClaimCraft - Merkle airdrop distribution engine
#[derive(Parser)]
#[command(name = "claimcraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file
    #[arg(short, long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every configured bucket and publish the packs
    Build,

    /// Serve published packs over HTTP
    Serve {
        /// Listen address (overrides server.listen_addr)
        #[arg(short, long)]
        listen: Option<String>,

        /// Directory with roots.json and the packs (overrides server.packs_dir)
        #[arg(long)]
        packs_dir: Option<PathBuf>,
    },

    /// Look up one address in a published pack
    Proof {
        /// Bucket name
        #[arg(short, long)]
        bucket: String,

        /// 0x-prefixed address, any letter case
        #[arg(short, long)]
        address: String,

        /// Directory with roots.json and the packs (overrides server.packs_dir)
        #[arg(long)]
        packs_dir: Option<PathBuf>,
    },

    /// Re-hash every published leaf and check it against its root
    Verify {
        /// Directory with roots.json and the packs (overrides server.packs_dir)
        #[arg(long)]
        packs_dir: Option<PathBuf>,
    },

    /// Write the aggregated, checksummed address list as CSV
    Normalize {
        /// Eligibility files
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Manage the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a starter settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    // Ignore if a subscriber is already installed
    let _ = try_init_logging(level);

    match cli.command {
        Commands::Build => {
            build(&cli.config)?;
        }
        Commands::Serve { listen, packs_dir } => {
            run_server(&cli.config, listen, packs_dir).await?;
        }
        Commands::Proof {
            bucket,
            address,
            packs_dir,
        } => {
            proof(&cli.config, &bucket, &address, packs_dir)?;
        }
        Commands::Verify { packs_dir } => {
            verify(&cli.config, packs_dir)?;
        }
        Commands::Normalize { input, output } => {
            normalize_files(&input, &output)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => {
                config_init(&cli.config, force)?;
            }
        },
    }

    Ok(())
}

fn load_settings(path: &Path) -> Result<Settings> {
    let settings = Settings::load_from(path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    settings.validate().context("Invalid settings")?;
    Ok(settings)
}

fn packs_dir(settings: &Settings, overridden: Option<PathBuf>) -> PathBuf {
    overridden.unwrap_or_else(|| settings.resolve(&settings.server.packs_dir))
}

fn load_store(dir: &Path) -> Result<ProofStore> {
    ProofStore::load_dir(dir).with_context(|| format!("Failed to load packs from {}", dir.display()))
}

// ============================================================================
// Build
// ============================================================================

fn build(config: &Path) -> Result<()> {
    let settings = load_settings(config)?;
    if settings.build.buckets.is_empty() {
        bail!(
            "No buckets configured in {} (run `claimcraft config init` for a template)",
            config.display()
        );
    }

    let buckets: Vec<BucketSpec> = settings
        .build
        .buckets
        .iter()
        .map(|bucket| {
            let sources: Vec<Box<dyn InputSource>> = bucket
                .inputs
                .iter()
                .map(|input| Box::new(FileSource::new(settings.resolve(input))) as Box<dyn InputSource>)
                .collect();
            BucketSpec::new(bucket.name.clone(), sources)
        })
        .collect();

    let output_dir = settings.resolve(&settings.build.output_dir);
    info!(
        "Building {} buckets with {} decimals into {}",
        buckets.len(),
        settings.token.decimals,
        output_dir.display()
    );

    let mut sink = DirectorySink::new(&output_dir);
    let reports = Distributor::new(settings.token.decimals)
        .run(&buckets, &mut sink)
        .context("Build failed, nothing was published")?;

    for report in &reports {
        println!("{}", report);
    }
    println!("Published to {}", output_dir.display());
    Ok(())
}

// ============================================================================
// Query
// ============================================================================

async fn run_server(config: &Path, listen: Option<String>, packs_dir_arg: Option<PathBuf>) -> Result<()> {
    let settings = load_settings(config)?;
    let dir = packs_dir(&settings, packs_dir_arg);
    let store = Arc::new(load_store(&dir)?);

    let listen = listen.unwrap_or_else(|| settings.server.listen_addr.clone());
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;

    serve(listener, store, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    })
    .await
    .context("Proof API failed")?;
    Ok(())
}

fn proof(config: &Path, bucket: &str, address: &str, packs_dir_arg: Option<PathBuf>) -> Result<()> {
    let settings = load_settings(config)?;
    let store = load_store(&packs_dir(&settings, packs_dir_arg))?;

    match store.get_proof(bucket, address)? {
        Some(record) => {
            let output = json!({
                "bucket": bucket,
                "address": address.to_ascii_lowercase(),
                "amount": record.amount,
                "amountWei": record.amount_wei,
                "proof": record.proof,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        None => bail!("{} is not eligible in bucket {}", address, bucket),
    }
}

fn verify(config: &Path, packs_dir_arg: Option<PathBuf>) -> Result<()> {
    let settings = load_settings(config)?;
    let store = load_store(&packs_dir(&settings, packs_dir_arg))?;

    for bucket in store.buckets() {
        let Some(pack) = store.pack(bucket) else {
            continue;
        };
        let verified = pack
            .verify()
            .with_context(|| format!("Bucket {} failed verification", bucket))?;
        println!("{}: {} addresses verified against {}", bucket, verified, pack.root);
    }
    println!("All {} buckets verified", store.len());
    Ok(())
}

// ============================================================================
// Utilities
// ============================================================================

fn normalize_files(inputs: &[PathBuf], output: &Path) -> Result<()> {
    let sources: Vec<Box<dyn InputSource>> = inputs
        .iter()
        .map(|path| Box::new(FileSource::new(path)) as Box<dyn InputSource>)
        .collect();
    let table = ingest(&sources)?;
    let mut report = table.report;
    let entries = normalize(&table.entries, &mut report);

    std::fs::write(output, to_csv(&entries))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} rows, {} unique addresses, {} skipped -> {}",
        report.rows,
        entries.len(),
        report.skipped_total(),
        output.display()
    );
    for (reason, count) in &report.skipped {
        println!("  {}: {}", reason, count);
    }
    Ok(())
}

fn config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Settings::template()
        .save_to(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
