//! Diabetes triage - main entry point
//!
//! `triage train` fits and persists a versioned artifact pair;
//! `triage serve` loads one and serves predictions over HTTP.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use diabetes_triage::artifacts::ArtifactStore;
use diabetes_triage::dataset::Dataset;
use diabetes_triage::server::{run_server, ServerConfig};
use diabetes_triage::training::{train, ModelFamily, TrainConfig};

#[derive(Parser)]
#[command(name = "triage")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and serve the diabetes progression triage model")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and persist the versioned artifact pair
    Train {
        /// Artifact version key (e.g. v0.2)
        #[arg(long)]
        version: String,

        /// Model family (linear, ridge, forest)
        #[arg(long, default_value = "ridge")]
        model: String,

        /// Training CSV with the ten feature columns plus `target`;
        /// defaults to the built-in dataset
        #[arg(long)]
        data: Option<PathBuf>,

        /// Output directory for the artifact pair
        #[arg(long = "out_dir", alias = "out-dir", default_value = "models")]
        out_dir: PathBuf,

        /// Held-out fraction, in (0, 1) exclusive
        #[arg(long = "test_size", alias = "test-size", default_value_t = 0.2)]
        test_size: f64,

        /// Seed for split, CV folds, and bootstrap sampling
        #[arg(long = "random_state", alias = "random-state", default_value_t = 42)]
        random_state: u64,
    },

    /// Serve predictions from the artifacts at MODEL_PATH / METRICS_PATH
    Serve {
        /// Bind host (overrides API_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides API_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diabetes_triage=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            version,
            model,
            data,
            out_dir,
            test_size,
            random_state,
        } => {
            let model_family: ModelFamily = model.parse()?;
            let dataset = match data {
                Some(path) => Dataset::from_csv(&path)?,
                None => Dataset::builtin(),
            };

            let config = TrainConfig::new(version, model_family)
                .with_test_fraction(test_size)
                .with_seed(random_state);
            let (pipeline, metrics) = train(&dataset, &config)?;

            let store = ArtifactStore::new(out_dir);
            store.save_pair(&pipeline, &metrics)?;
            info!(
                model = %store.model_path(&metrics.version).display(),
                metrics = %store.metrics_path(&metrics.version).display(),
                "artifact pair written"
            );

            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        Commands::Serve { host, port } => {
            let mut config = ServerConfig::default();
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            run_server(config).await?;
        }
    }

    Ok(())
}
