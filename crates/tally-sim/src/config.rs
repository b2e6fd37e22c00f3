//! Simulation configuration file.
//!
//! Loaded from TOML. Every section is optional and falls back to defaults.
//! Parties are named by label; a 64-character hex string is taken as a raw
//! handle instead.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tally_split::tiered::DEFAULT_WEIGHTS;
use tally_types::{Amount, Beneficiary, Timestamp};
use tally_vesting::VestingParams;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "TALLY_CONFIG";

/// Config file used when neither an argument nor [`CONFIG_ENV`] is given.
pub const DEFAULT_CONFIG_FILE: &str = "tally.toml";

/// Complete simulation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    /// Parties the in-memory ledger refuses transfers to.
    #[serde(default)]
    pub unreachable: Vec<String>,
    /// Scenario, applied in order.
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Equal-split distributor.
    #[serde(default)]
    pub equal_split: EqualSplitConfig,
    /// Weighted tier distributor.
    #[serde(default)]
    pub tiered_split: TieredSplitConfig,
    /// Vesting schedule.
    #[serde(default)]
    pub vesting: VestingConfig,
    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Equal-split distributor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EqualSplitConfig {
    /// The three parties sharing each deposit.
    #[serde(default = "default_equal_beneficiaries")]
    pub beneficiaries: [String; 3],
}

/// Weighted tier distributor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TieredSplitConfig {
    /// Highest tier first.
    #[serde(default = "default_tier_beneficiaries")]
    pub beneficiaries: [String; 3],
    /// Percent weights, must sum to 100.
    #[serde(default = "default_weights")]
    pub weights: [u8; 3],
}

/// Vesting schedule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VestingConfig {
    /// Party allowed to release and deactivate.
    #[serde(default = "default_administrator")]
    pub administrator: String,
    /// Party the shares vest to.
    #[serde(default = "default_beneficiary")]
    pub beneficiary: String,
    /// Unix seconds.
    #[serde(default)]
    pub start_time: Timestamp,
    /// Allotments, period length and unlock policy.
    #[serde(flatten)]
    pub params: VestingParams,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Which distributor an unsolicited transfer reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    /// The equal-split distributor.
    Equal,
    /// The weighted tier distributor.
    Tiered,
}

/// One scenario step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Deposit into the equal split; the remainder goes back to `depositor`.
    EqualDeposit { amount: Amount, depositor: String },
    /// Deposit into the tiered split.
    TieredDeposit { amount: Amount },
    /// Value sent to a distributor without a deposit call.
    Unsolicited {
        split: SplitKind,
        amount: Amount,
        from: String,
    },
    /// Vesting release attempt by `caller` at time `at`.
    Release { caller: String, at: Timestamp },
    /// Vesting deactivation attempt by `caller`.
    Deactivate { caller: String },
}

// Default value functions

fn default_equal_beneficiaries() -> [String; 3] {
    ["alpha".to_string(), "beta".to_string(), "gamma".to_string()]
}

fn default_tier_beneficiaries() -> [String; 3] {
    ["gold".to_string(), "silver".to_string(), "bronze".to_string()]
}

fn default_weights() -> [u8; 3] {
    DEFAULT_WEIGHTS
}

fn default_administrator() -> String {
    "admin".to_string()
}

fn default_beneficiary() -> String {
    "holder".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EqualSplitConfig {
    fn default() -> Self {
        Self {
            beneficiaries: default_equal_beneficiaries(),
        }
    }
}

impl Default for TieredSplitConfig {
    fn default() -> Self {
        Self {
            beneficiaries: default_tier_beneficiaries(),
            weights: default_weights(),
        }
    }
}

impl Default for VestingConfig {
    fn default() -> Self {
        Self {
            administrator: default_administrator(),
            beneficiary: default_beneficiary(),
            start_time: 0,
            params: VestingParams::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SimConfig {
    /// Load configuration from `path`, or from the default location.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::parse(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }
}

/// Resolve a party name to a handle.
pub fn resolve(name: &str) -> Beneficiary {
    if name.len() == 64 {
        if let Ok(handle) = name.parse() {
            return handle;
        }
    }
    Beneficiary::from_label(name)
}
