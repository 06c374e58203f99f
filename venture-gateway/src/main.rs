use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use venture::config::{GatewayConfig, ProviderKind};
use venture::gateway;

#[derive(Parser)]
#[command(name = "venture-gateway")]
#[command(version)]
#[command(about = "Streams five-year startup trajectories generated by an LLM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Serve(ServeArgs),
    /// Print the effective configuration as TOML.
    Config(ConfigArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// TOML configuration file. Environment variables override it.
    #[arg(long, env = "VENTURE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    bind_addr: Option<String>,

    /// openai, openrouter or stub
    #[arg(long)]
    provider: Option<String>,

    #[arg(long)]
    model: Option<String>,

    /// Pause between years, in milliseconds.
    #[arg(long)]
    year_delay_ms: Option<u64>,

    /// Permit the deterministic stub provider.
    #[arg(long)]
    allow_stub: bool,
}

#[derive(Parser)]
struct ConfigArgs {
    #[arg(long, env = "VENTURE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Config(args) => {
            let mut config = GatewayConfig::load(args.config.as_deref())?;
            if config.llm.api_key.is_some() {
                config.llm.api_key = Some("<redacted>".to_string());
            }
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = GatewayConfig::load(args.config.as_deref())
        .context("failed to load gateway configuration")?;

    if let Some(addr) = args.bind_addr {
        config.bind_addr = addr;
    }
    if let Some(provider) = args.provider {
        config.llm.provider = ProviderKind::parse(&provider)
            .with_context(|| format!("unknown provider '{}'", provider))?;
    }
    if let Some(model) = args.model {
        config.llm.model = model;
    }
    if let Some(delay) = args.year_delay_ms {
        config.simulation.year_delay_ms = delay;
    }
    if args.allow_stub {
        config.allow_stub_provider = true;
    }

    info!(
        bind_addr = %config.bind_addr,
        provider = config.llm.provider.as_str(),
        model = %config.llm.model,
        "Loaded gateway configuration"
    );
    gateway::serve(config).await?;
    Ok(())
}
