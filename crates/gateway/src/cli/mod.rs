pub mod complete;
pub mod config;

use clap::{Parser, Subcommand};
use sm_domain::memory::MemorySize;

/// SolMind — memory-augmented LLM completion gateway.
#[derive(Debug, Parser)]
#[command(name = "solmind", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Run one completion and print the response.
    Complete(CompleteArgs),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

#[derive(Debug, Clone, clap::Args)]
pub struct CompleteArgs {
    /// The user message to send.
    pub message: String,
    /// Agent id used for provider resolution and memory scoping.
    #[arg(long, default_value = "cli")]
    pub agent: String,
    /// Platform string matched against the known providers.
    #[arg(long, default_value = "openrouter")]
    pub platform: String,
    /// Model override.
    #[arg(long)]
    pub model: Option<String>,
    /// Chat id; enables memory retrieval and persistence.
    #[arg(long)]
    pub chat: Option<String>,
    /// Capsule id; partitions memory within the chat.
    #[arg(long)]
    pub capsule: Option<String>,
    /// small, medium or large.
    #[arg(long, value_parser = parse_memory_size)]
    pub memory_size: Option<MemorySize>,
    /// Output the full result as JSON instead of streaming plain text.
    #[arg(long)]
    pub json: bool,
}

fn parse_memory_size(s: &str) -> Result<MemorySize, String> {
    match s.to_ascii_lowercase().as_str() {
        "small" => Ok(MemorySize::Small),
        "medium" => Ok(MemorySize::Medium),
        "large" => Ok(MemorySize::Large),
        other => Err(format!("unknown memory size '{other}' (small, medium, large)")),
    }
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `SOLMIND_CONFIG` (or
/// `config.toml` by default). Returns the parsed [`Config`] and the
/// path that was used. A missing file yields the defaults.
///
/// [`Config`]: sm_domain::config::Config
pub fn load_config() -> anyhow::Result<(sm_domain::config::Config, String)> {
    let config_path = std::env::var("SOLMIND_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

pub fn load_config_from(config_path: &str) -> anyhow::Result<sm_domain::config::Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(sm_domain::config::Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}
