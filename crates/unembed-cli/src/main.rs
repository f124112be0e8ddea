//! unembed: resolve video embed pages to direct stream URLs

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use unembed_core::{
    EmbedClient, EmbedDescriptor, EmbedResolver, EngineConfig, Provider, ServerEnhancer,
    find_packed_script, unpack_nested,
};

#[derive(Parser)]
#[command(name = "unembed")]
#[command(about = "Resolve third-party video embed pages to direct stream URLs")]
#[command(version)]
struct Cli {
    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// User-Agent sent with embed fetches
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Maximum resolutions in flight
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Maximum cached resolutions
    #[arg(long, global = true)]
    cache_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a single embed URL
    Resolve {
        /// Embed/iframe URL
        url: String,

        /// Provider name or host, overriding URL detection
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Enhance a JSON array of server descriptors
    Enhance {
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,
    },

    /// Decode the packed script found in a page or script
    Unpack {
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,
    },

    /// List supported providers
    Providers,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Resolve { url, provider } => {
            let provider = match provider.as_deref() {
                Some(hint) => Provider::from_hint(hint)
                    .with_context(|| format!("Unknown provider: {}", hint))?,
                None => Provider::detect(&url)
                    .with_context(|| format!("No provider matches {}", url))?,
            };

            let resolver = EmbedResolver::new(provider, EmbedClient::with_config(&config)?);
            match resolver.resolve(&url).await {
                Ok(source) => println!("{}", serde_json::to_string_pretty(&source)?),
                Err(e) => bail!("{}: {}", e.reason(), e),
            }
        }

        Commands::Enhance { input } => {
            let text = read_input(input.as_deref())?;
            let descriptors: Vec<EmbedDescriptor> =
                serde_json::from_str(&text).context("Input must be a JSON array of servers")?;

            let enhancer = ServerEnhancer::new(&config)?;
            let servers = enhancer.enhance(descriptors).await;
            println!("{}", serde_json::to_string_pretty(&servers)?);

            let stats = enhancer.cache().stats();
            info!(
                hits = stats.hits,
                misses = stats.misses,
                size = stats.size,
                capacity = stats.capacity,
                "Cache statistics"
            );
        }

        Commands::Unpack { input } => {
            let text = read_input(input.as_deref())?;
            let block = find_packed_script(&text)?;
            println!("{}", unpack_nested(block)?);
        }

        Commands::Providers => {
            for provider in Provider::ALL {
                println!("{:<10} {}", provider.display_name(), provider.hosts().join(", "));
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Defaults, then environment, then the config file, then flags
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = EngineConfig::from_env();

    if let Some(path) = &cli.config {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        config = overlay_json(&config, &text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
    }

    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(user_agent) = &cli.user_agent {
        config.user_agent = user_agent.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(cache_size) = cli.cache_size {
        config.cache_max_size = cache_size;
    }

    config.validate()?;
    Ok(config)
}

/// Apply only the fields present in `json` on top of `base`
fn overlay_json(base: &EngineConfig, json: &str) -> Result<EngineConfig> {
    let mut merged = serde_json::to_value(base)?;
    let overrides: serde_json::Value = serde_json::from_str(json)?;

    let (Some(target), Some(fields)) = (merged.as_object_mut(), overrides.as_object()) else {
        bail!("Config file must contain a JSON object");
    };
    for (key, value) in fields {
        target.insert(key.clone(), value.clone());
    }

    Ok(serde_json::from_value(merged)?)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}
