//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: Hardcoded in struct `Default` implementations
//! 2. **Config file**: TOML file specified by `KEYSTONE_CONFIG` env var
//! 3. **Environment variables**: `KEYSTONE__*` env vars override specific fields
//!
//! # Configuration Sections
//!
//! - [`ChainConfig`]: JSON-RPC endpoint and timeouts
//! - [`RegistryConfig`]: runtime default prefix and the fallback address table
//! - [`StorageConfig`]: where operator overrides persist
//! - [`ReloadConfig`]: debounce window for reloads
//! - [`DiscoveryConfig`]: which deployment discovery source to use
//! - [`MembershipConfig`]: membership tier thresholds
//! - [`LotteryConfig`]: lottery defaults
//! - [`LoggingConfig`]: Log level and format
//!
//! # Example
//!
//! ```toml
//! [chain]
//! rpc_url = "https://ethereum-sepolia-rpc.publicnode.com"
//! chain_id = 11155111
//!
//! [reload]
//! debounce_ms = 500
//!
//! [discovery]
//! mode = "event_log"
//! announcer = "0x1a6e113cf3abd20650662f76bc163ac2d43a9347"
//! lookback_blocks = 50000
//! ```

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::{Path, PathBuf}, time::Duration};

use crate::{
    derived::{whole_tokens, MembershipTier, MembershipTierTable},
    registry::{sepolia_fallback, validate_address_format, CandidateSet},
    types::ContractName,
};
use alloy_primitives::{Address, U256};

/// JSON-RPC endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// HTTP(S) JSON-RPC endpoint. Defaults to a public Sepolia node.
    pub rpc_url: String,

    /// Expected chain id. Defaults to `11155111` (Sepolia).
    pub chain_id: u64,

    /// Timeout of a single JSON-RPC request in seconds. Defaults to `10`.
    pub request_timeout_seconds: u64,

    /// Upper bound on one deployment probe in milliseconds. Defaults to `5000`.
    pub probe_timeout_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
            chain_id: 11_155_111,
            request_timeout_seconds: 10,
            probe_timeout_ms: 5_000,
        }
    }
}

/// Address resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Prefix of the runtime default variables, `<PREFIX>_<NAME>_ADDRESS`. Defaults to
    /// `"KEYSTONE"`.
    pub env_prefix: String,

    /// Last-resort addresses keyed by contract name. Defaults to the Sepolia deployment.
    pub fallback: BTreeMap<String, String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            env_prefix: "KEYSTONE".to_string(),
            fallback: sepolia_fallback()
                .into_iter()
                .map(|(name, address)| (name.key_segment().to_string(), format!("{address:#x}")))
                .collect(),
        }
    }
}

/// Where overrides and the ready marker persist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the store. When absent, state lives in memory for the session.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Quiet period before a scheduled reload fires, in milliseconds. Defaults to `500`.
    pub debounce_ms: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

/// Deployment discovery source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    /// The configured fallback table.
    #[default]
    Static,
    /// `ContractDeployed` logs on chain.
    EventLog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub mode: DiscoveryMode,

    /// Only logs emitted by this address are considered. Any emitter when absent.
    pub announcer: Option<String>,

    /// Blocks behind head to scan. Defaults to `50000`.
    pub lookback_blocks: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self { mode: DiscoveryMode::Static, announcer: None, lookback_blocks: 50_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MembershipConfig {
    /// Name shown below the first threshold. Defaults to `"Member"`.
    pub base_tier: String,

    /// Tiers in ascending threshold order, thresholds in whole tokens.
    pub tiers: Vec<MembershipTier>,

    /// Decimals of the governance token. Defaults to `18`.
    pub token_decimals: u8,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        let table = MembershipTierTable::default();
        Self { base_tier: "Member".to_string(), tiers: table.tiers().to_vec(), token_decimals: table.decimals() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    /// Eligibility threshold in whole tokens, used when `THRESHOLD()` cannot be read.
    /// Defaults to `10`.
    pub default_threshold: u64,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self { default_threshold: 10 }
    }
}

/// Application logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (e.g., "trace", "debug", "info", "warn", "error"). Defaults to `"info"`.
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

/// Root application configuration.
///
/// Environment overrides use the `KEYSTONE__` prefix with `__` between nested fields,
/// e.g. `KEYSTONE__RELOAD__DEBOUNCE_MS=250`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub registry: RegistryConfig,
    pub storage: StorageConfig,
    pub reload: ReloadConfig,
    pub discovery: DiscoveryConfig,
    pub membership: MembershipConfig,
    pub lottery: LotteryConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("reload.debounce_ms", 500)?
            .set_default("lottery.default_threshold", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("KEYSTONE").separator("__"))
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from `config/keystone.toml`, or the path in `KEYSTONE_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("KEYSTONE_CONFIG").unwrap_or_else(|_| "config/keystone.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string for the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        let url = &self.chain.rpc_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!("Invalid RPC URL: {url}"));
        }
        if url::Url::parse(url).is_err() {
            return Err(format!("Unparseable RPC URL: {url}"));
        }

        if self.chain.request_timeout_seconds == 0 {
            return Err("Request timeout must be greater than 0".to_string());
        }

        if self.reload.debounce_ms == 0 {
            return Err("Reload debounce must be greater than 0".to_string());
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        self.fallback_table()?;

        if let Some(announcer) = &self.discovery.announcer {
            validate_address_format(announcer).map_err(|e| format!("Invalid discovery announcer: {e}"))?;
        }

        if self.discovery.mode == DiscoveryMode::EventLog && self.discovery.lookback_blocks == 0 {
            return Err("Event log discovery needs a lookback greater than 0".to_string());
        }

        // 10^78 overflows U256.
        if self.membership.token_decimals > 77 {
            return Err(format!("Token decimals must be at most 77, got {}", self.membership.token_decimals));
        }

        let ascending = self.membership.tiers.windows(2).all(|pair| pair[0].threshold < pair[1].threshold);
        if !ascending {
            return Err("Membership tier thresholds must be strictly ascending".to_string());
        }

        Ok(())
    }

    /// The fallback table with names and addresses parsed.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string for an unknown name or malformed address.
    pub fn fallback_table(&self) -> Result<CandidateSet, String> {
        self.registry
            .fallback
            .iter()
            .map(|(name, value)| {
                let name: ContractName =
                    name.parse().map_err(|e| format!("Invalid fallback entry {name:?}: {e}"))?;
                let address = validate_address_format(value)
                    .map_err(|e| format!("Invalid fallback address for {name}: {e}"))?;
                Ok((name, address))
            })
            .collect()
    }

    /// Parsed discovery announcer. Malformed values are rejected by [`validate`](Self::validate).
    #[must_use]
    pub fn announcer(&self) -> Option<Address> {
        self.discovery.announcer.as_deref().and_then(|a| validate_address_format(a).ok())
    }

    #[must_use]
    pub fn tier_table(&self) -> MembershipTierTable {
        MembershipTierTable::new(
            self.membership.base_tier.clone(),
            self.membership.tiers.clone(),
            self.membership.token_decimals,
        )
    }

    /// Default eligibility threshold in base units.
    #[must_use]
    pub fn default_threshold(&self) -> U256 {
        whole_tokens(self.lottery.default_threshold, self.membership.token_decimals)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.chain.request_timeout_seconds)
    }

    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.chain.probe_timeout_ms)
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.reload.debounce_ms)
    }
}
