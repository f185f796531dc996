//! glm-acp - ACP agent over stdio backed by the GLM chat API.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use glm_acp_client::{
    GLM_API_BASE_ENV, GLM_API_KEY_ENV, GLM_MODEL_ENV, GlmClient, GlmConfig, GlmError,
};
use glm_acp_engine::{AcpConfig, AcpHandler, AcpServer};

/// GLM ACP agent
#[derive(Debug, Parser)]
#[command(name = "glm-acp")]
#[command(about = "Agent Client Protocol server over stdio, backed by GLM")]
#[command(version)]
struct Args {
    /// API key (overrides GLM_API_KEY)
    #[arg(long, value_name = "KEY")]
    api_key: Option<String>,

    /// API base URL (overrides GLM_API_BASE)
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Model to use (overrides GLM_MODEL)
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Maximum tokens per reply
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Upper bound for one completion call, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Initial project root (defaults to the working directory)
    #[arg(long, value_name = "DIR")]
    project_root: Option<PathBuf>,

    /// Pause between streamed reply chunks, in milliseconds
    #[arg(long, default_value_t = 100)]
    chunk_delay_ms: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// Client configuration: flags first, then `env`, then defaults.
    fn glm_config<F>(&self, env: F) -> Result<GlmConfig, GlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = GlmConfig::from_lookup(|name| {
            let flag = match name {
                GLM_API_KEY_ENV => self.api_key.clone(),
                GLM_API_BASE_ENV => self.api_base.clone(),
                GLM_MODEL_ENV => self.model.clone(),
                _ => None,
            };
            flag.or_else(|| env(name))
        })?;

        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    fn acp_config(&self, cwd: PathBuf) -> AcpConfig {
        let project_root = self.project_root.clone().unwrap_or(cwd);
        AcpConfig::new(project_root).with_chunk_delay(Duration::from_millis(self.chunk_delay_ms))
    }
}

/// Logs go to stderr; stdout is reserved for protocol messages.
fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run(args: Args) -> Result<()> {
    let glm_config = args
        .glm_config(|name| std::env::var(name).ok())
        .context("Invalid GLM configuration")?;
    info!(
        model = %glm_config.model,
        base_url = %glm_config.base_url,
        "Using GLM backend"
    );

    let client = GlmClient::new(glm_config).context("Failed to build GLM client")?;
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let handler = AcpHandler::new(args.acp_config(cwd), Arc::new(client));

    let mut server = AcpServer::new(handler);
    server.run_stdio().await?;

    info!("ACP server stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Variables already in the environment win over .env entries.
    dotenvy::dotenv().ok();

    let args = Args::parse();
    setup_logging(&args.log_level, args.json_logs);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
