//! OCRFlux Server and CLI
//!
//! Serves a document OCR model over HTTP, or runs it once on a local file.
//!
//! # Usage
//!
//! ## CLI Mode
//! ```bash
//! ocrflux-server parse --file report.pdf --model /model_dir/OCRFlux-3B --worker-program python3 --worker-arg=-m --worker-arg=ocrflux.worker
//! ```
//!
//! ## Server Mode
//! ```bash
//! ocrflux-server serve --model /model_dir/OCRFlux-3B --worker-program python3 --worker-arg=-m --worker-arg=ocrflux.worker --port 8000
//! ```

mod cli;
mod config;
mod server;

use clap::{Args, Parser, Subcommand};
use ocrflux_server::core::{ModelConfig, WorkerSettings};
use ocrflux_server::domain::InferenceOptions;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "ocrflux-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Document OCR via CLI or HTTP server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Model and worker settings shared by every subcommand
#[derive(Args)]
struct ModelArgs {
    /// Path to the model directory
    #[arg(long, default_value = "/model_dir/OCRFlux-3B", env = "OCRFLUX_MODEL_PATH")]
    model: PathBuf,

    /// Fraction of accelerator memory the model may use (0.0, 1.0]
    #[arg(long, default_value_t = 0.8, env = "OCRFLUX_GPU_MEMORY_UTILIZATION")]
    gpu_memory_utilization: f32,

    /// Maximum context length of the model
    #[arg(long, default_value_t = 8192, env = "OCRFLUX_MAX_MODEL_LEN")]
    max_model_len: u32,

    /// Program that hosts the model
    #[arg(long, default_value = "ocrflux-worker", env = "OCRFLUX_WORKER_PROGRAM")]
    worker_program: PathBuf,

    /// Extra argument for the worker program (repeatable)
    #[arg(long = "worker-arg", allow_hyphen_values = true)]
    worker_args: Vec<String>,

    /// Seconds to wait for the model to load
    #[arg(long, default_value_t = 600, env = "OCRFLUX_STARTUP_TIMEOUT")]
    startup_timeout_secs: u64,
}

impl ModelArgs {
    fn into_config(self) -> config::OcrConfig {
        config::OcrConfig {
            model: ModelConfig::new(self.model)
                .with_gpu_memory_utilization(self.gpu_memory_utilization)
                .with_max_model_len(self.max_model_len),
            worker: WorkerSettings::new(self.worker_program)
                .with_args(self.worker_args)
                .with_startup_timeout(Duration::from_secs(self.startup_timeout_secs)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Process a single PDF via CLI
    Parse {
        /// Local PDF file to process
        #[arg(long)]
        file: PathBuf,

        /// Output format (json, text, pretty)
        #[arg(long, default_value = "pretty")]
        output: String,

        /// Skip cross-page content merging
        #[arg(long)]
        skip_cross_page_merge: bool,

        /// Maximum retries for page processing
        #[arg(long, default_value_t = 2)]
        max_page_retries: u32,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, short, default_value = "8000", env = "OCRFLUX_PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "OCRFLUX_HOST")]
        host: String,

        /// Directory for request scratch files (defaults to the OS temp dir)
        #[arg(long, env = "OCRFLUX_SCRATCH_DIR")]
        scratch_dir: Option<PathBuf>,

        /// Largest accepted upload, in MiB
        #[arg(long, default_value_t = 256, env = "OCRFLUX_MAX_UPLOAD_MB")]
        max_upload_mb: usize,

        #[command(flatten)]
        model: ModelArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    ocrflux_server::utils::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            file,
            output,
            skip_cross_page_merge,
            max_page_retries,
            model,
        } => {
            let options = InferenceOptions::new()
                .with_skip_cross_page_merge(skip_cross_page_merge)
                .with_max_page_retries(max_page_retries);

            info!("Processing file: {}", file.display());
            cli::process_file(&file, &model.into_config(), options, &output).await?;
        }
        Commands::Serve {
            port,
            host,
            scratch_dir,
            max_upload_mb,
            model,
        } => {
            let config = config::ServerConfig {
                ocr: model.into_config(),
                host,
                port,
                scratch_dir,
                max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            };

            info!("Starting server on {}:{}", config.host, config.port);
            server::run_server(config).await?;
        }
    }

    Ok(())
}
