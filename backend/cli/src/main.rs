mod doctor_cmd;
mod status_cmd;
mod terminal_output;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use formlens_config::{GatewayConfig, redacted_summary, validate_and_log};
use formlens_gateway::{AppState, start_server};
use formlens_understanding::{HeaderEnricher, OpenAiVisionProvider, TextractProvider};

#[derive(Parser)]
#[command(name = "formlens")]
#[command(about = "formlens: document analysis gateway for forms, tables, and table headers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Query a running gateway's health endpoint
    Status,
    /// Check configuration and vendor credentials
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = GatewayConfig::from_env()?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await?;
        }
        Commands::Status => status_cmd::run(&config).await?,
        Commands::Doctor => {
            if !doctor_cmd::run(&config).await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run_server(config: GatewayConfig) -> Result<()> {
    logging::init_logger(&config.server.log_dir, config.effective_log_level()).with_context(|| {
        format!("Failed to open log directory {}", config.server.log_dir.display())
    })?;

    info!(config = %redacted_summary(&config), "Starting formlens gateway");
    let report = validate_and_log(&config);
    if !report.is_valid() {
        bail!(
            "Invalid configuration ({} error(s)); run `formlens doctor` for details",
            report.errors.len()
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("formlens/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let ocr = TextractProvider::from_default_chain(
        client.clone(),
        &config.textract.region,
        config.textract.endpoint_url(),
    )
    .await;
    info!(region = %config.textract.region, endpoint = ocr.endpoint(), "Registered Textract provider");

    let enricher = match config.vision.api_key.as_deref().filter(|key| !key.is_empty()) {
        Some(key) => {
            let provider =
                OpenAiVisionProvider::new(client.clone(), key).with_base_url(&config.vision.base_url);
            info!(model = %config.vision.model, "Registered OpenAI vision provider");
            Some(HeaderEnricher::new(
                Arc::new(provider),
                config.vision.model.clone(),
                config.vision.max_tokens,
            ))
        }
        None => {
            warn!("OPENAI_API_KEY not set; header enrichment requests will fail");
            None
        }
    };

    let state = Arc::new(AppState::new(Arc::new(config), Arc::new(ocr), enricher));
    start_server(addr, state).await
}
