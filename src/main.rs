//! Lava Seed CLI
//!
//! Command-line interface for deriving passwords from lava lamp images and
//! running the rotating one-time seed service.

use clap::{Parser, Subcommand};
use lava_seed::{
    config::FileConfig,
    keygen,
    metrics::MetricsRegistry,
    regeneration::{PasswordGenerator, RegenerationSettings, Regenerator, Scheduler},
    source::{
        Collector, DirectoryCollector, DirectoryOutputStore, OutputStore, PassthroughTransform,
        TransformService,
    },
    store::MemoryStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "lava-seed", version, about = "Secrets from lava lamp imagery")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Derive a password from an image file.
    Derive {
        /// Image to derive from.
        file: PathBuf,
        /// Password length (zero or less uses 16).
        #[arg(short, long, default_value_t = 16, allow_negative_numbers = true)]
        length: i64,
    },
    /// Generate a password from the latest collected image.
    Generate {
        /// Requested length, clamped by the configured policy.
        #[arg(short, long, allow_negative_numbers = true)]
        length: Option<i64>,
    },
    /// Run the rotating one-time seed service.
    Run {
        /// Override the regeneration interval in seconds.
        #[arg(long)]
        interval_secs: Option<u64>,
        /// Override the directory raw images are collected from.
        #[arg(long)]
        source_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };

    match cli.command {
        Command::Derive { file, length } => derive_file(file, length).await,
        Command::Generate { length } => generate(&config, length).await,
        Command::Run {
            interval_secs,
            source_dir,
        } => {
            if let Some(secs) = interval_secs {
                config.schedule.interval_secs = secs;
            }
            if let Some(dir) = source_dir {
                config.source.dir = dir;
            }
            if let Err(e) = config.validate() {
                eprintln!("Invalid configuration: {}", e);
                std::process::exit(1);
            }
            run(config).await;
        }
    }
}

async fn derive_file(file: PathBuf, length: i64) {
    let bytes = match tokio::fs::read(&file).await {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read {}: {}", file.display(), e);
            std::process::exit(1);
        }
    };

    let password = keygen::derive(&bytes, length);
    info!(
        "Derived {} characters (entropy estimate: {} bits)",
        password.len(),
        keygen::entropy_estimate(&password)
    );
    println!("{}", password);
}

fn collaborators(
    config: &FileConfig,
) -> (Arc<dyn Collector>, Arc<dyn TransformService>, Arc<dyn OutputStore>) {
    let collector: Arc<dyn Collector> = Arc::new(DirectoryCollector::new(
        &config.source.dir,
        config.source.prefix.clone(),
    ));
    let transform: Arc<dyn TransformService> = Arc::new(PassthroughTransform);
    let output: Arc<dyn OutputStore> = Arc::new(DirectoryOutputStore::new(&config.output.dir));

    (collector, transform, output)
}

async fn generate(config: &FileConfig, length: Option<i64>) {
    let (collector, transform, output) = collaborators(config);
    let generator = PasswordGenerator::new(
        collector,
        transform,
        output,
        config.output.prefix.clone(),
        config.password,
    );

    match generator.generate(length).await {
        Ok(generated) => {
            info!(
                "Generated from {} via {} (entropy estimate: {} bits)",
                generated.source_key, generated.output_key, generated.entropy_bits
            );
            println!("{}", generated.password);
        }
        Err(e) => {
            eprintln!("Password generation failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(config: FileConfig) {
    info!("Lava Seed v{}", lava_seed::VERSION);

    let (collector, transform, output) = collaborators(&config);
    let store = Arc::new(MemoryStore::new());

    let metrics = match MetricsRegistry::new() {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };

    let regenerator = Regenerator::new(
        Arc::clone(&collector),
        config.output.transform.then(|| Arc::clone(&transform)),
        Arc::clone(&output),
        store.clone(),
        RegenerationSettings::from(&config),
    );

    #[cfg(feature = "server")]
    {
        if config.server.port != 0 {
            use lava_seed::metrics::{HttpServer, HttpServerConfig};

            let passwords = Arc::new(PasswordGenerator::new(
                collector,
                transform,
                output,
                config.output.prefix.clone(),
                config.password,
            ));
            let server = HttpServer::new(
                HttpServerConfig::with_port(config.server.port),
                Arc::clone(&metrics),
                store.clone(),
            )
            .with_passwords(passwords);

            tokio::spawn(async move {
                if let Err(e) = server.run().await {
                    warn!("HTTP server stopped: {}", e);
                }
            });
        }
    }
    #[cfg(not(feature = "server"))]
    let _ = (collector, transform, output);

    // The sender stays alive here so the loop only stops on Ctrl-C.
    let (shutdown, receiver) = tokio::sync::watch::channel(false);
    let shutdown = Arc::new(shutdown);
    let on_interrupt = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = on_interrupt.send(true);
    }) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    info!(
        source = %config.source.dir.display(),
        interval_secs = config.schedule.interval_secs,
        code_ttl_secs = config.schedule.code_ttl_secs,
        "Starting regeneration loop"
    );

    let stats = Scheduler::new(regenerator, config.schedule.interval())
        .with_metrics(metrics)
        .run(receiver)
        .await;
    drop(shutdown);

    info!(
        "Done. {} cycles, {} codes issued, {} aborted for missing source",
        stats.cycles_total, stats.cycles_succeeded, stats.source_unavailable
    );
}
