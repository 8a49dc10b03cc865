use anyhow::{bail, Context, Result};
use clap::Subcommand;
use keystone_core::config::AppConfig;
use std::path::Path;

use super::utils::{print_info, print_success};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to config file
        #[arg(short, long, default_value = "config/keystone.toml")]
        file: String,
    },

    /// Show the effective configuration, defaults and env overrides included
    Show {
        /// Path to config file
        #[arg(short, long, default_value = "config/keystone.toml")]
        file: String,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output path for the config file
        #[arg(short, long, default_value = "config/keystone.toml")]
        output: String,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(&file),
        ConfigCommands::Show { file } => show_config(&file),
        ConfigCommands::Generate { output, force } => generate_config(&output, force),
    }
}

fn validate_config(file: &str) -> Result<()> {
    if !Path::new(file).exists() {
        bail!("Configuration file not found: {file}");
    }

    print_info(&format!("Loading configuration from {file}..."));
    let config = AppConfig::from_file(file).with_context(|| format!("failed to load {file}"))?;

    print_info("Validating configuration...");
    config.validate().map_err(anyhow::Error::msg)?;

    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!("  RPC: {} (chain {})", config.chain.rpc_url, config.chain.chain_id);
    println!("  Fallback entries: {}", config.registry.fallback.len());
    println!(
        "  Storage: {}",
        config.storage.path.as_ref().map_or("in-memory".to_string(), |p| p.display().to_string())
    );
    println!("  Discovery: {:?}", config.discovery.mode);
    println!("  Membership tiers: {}", config.membership.tiers.len());

    Ok(())
}

fn show_config(file: &str) -> Result<()> {
    let config = AppConfig::from_file(file).with_context(|| format!("failed to load {file}"))?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn generate_config(output: &str, force: bool) -> Result<()> {
    if Path::new(output).exists() && !force {
        bail!("File {output} already exists. Use --force to overwrite.");
    }

    let sample_config = r#"# Keystone configuration
# Every value shown is the compiled default.

[chain]
rpc_url = "https://ethereum-sepolia-rpc.publicnode.com"
chain_id = 11155111
request_timeout_seconds = 10
probe_timeout_ms = 5000

[registry]
env_prefix = "KEYSTONE"

[registry.fallback]
GOVTOKEN = "0x5a08cfc2e2e4b61b0ad4bf9d8977f5fc4c74d0ad"
REWARDTOKEN = "0x65d4bc4e05836e4421c985dc2947f1d68ccaea48"
PARTICIPATIONNFT = "0x8a544f1e3954296d8ba6430e2c6cb505be85d836"
GOVERNANCE = "0x1a6e113cf3abd20650662f76bc163ac2d43a9347"
LOTTERY = "0xdb7d60eca9dff432d8a8cc3087fe278e5bfd0d0c"
STATUSNFT = "0x86285162f7060796aebecd9c0809e28c0d15e2a5"

[storage]
# path = "data/keystone.json"

[reload]
debounce_ms = 500

[discovery]
mode = "static"
# announcer = "0x..."
lookback_blocks = 50000

[membership]
base_tier = "Member"
token_decimals = 18
tiers = [
    { name = "Bronze", threshold = 100 },
    { name = "Silver", threshold = 500 },
    { name = "Gold", threshold = 1000 },
    { name = "Platinum", threshold = 5000 },
    { name = "Diamond", threshold = 10000 },
]

[lottery]
default_threshold = 10

[logging]
level = "info"
format = "pretty"
"#;

    if let Some(parent) = Path::new(output).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output, sample_config)?;

    print_success(&format!("Sample configuration generated: {output}"));
    print_info("Set storage.path to keep overrides across runs");

    Ok(())
}
