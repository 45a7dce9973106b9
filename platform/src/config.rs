//! Platform configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use shield_types::{Address, SettlementParams};
use shield_utils::LogFormat;

use crate::PlatformError;

/// Configuration for a Shield platform instance.
///
/// Can be loaded from a TOML file via [`PlatformConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Voting, slashing and split parameters.
    #[serde(default)]
    pub params: SettlementParams,

    /// Receives the residual reward pool of finalized votes.
    #[serde(default = "default_treasury")]
    pub treasury: Address,

    /// How many times an operation is re-run after a write conflict.
    #[serde(default = "default_max_commit_retries")]
    pub max_commit_retries: u32,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_treasury() -> Address {
    Address::new("shd_treasury")
}

fn default_max_commit_retries() -> u32 {
    16
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl PlatformConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, PlatformError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PlatformError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, PlatformError> {
        let config: Self = toml::from_str(s).map_err(|e| PlatformError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, PlatformError> {
        toml::to_string_pretty(self).map_err(|e| PlatformError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), PlatformError> {
        if !self.treasury.is_valid() {
            return Err(PlatformError::Config(format!(
                "treasury address {} is malformed",
                self.treasury
            )));
        }
        if self.params.slash_bps as u128 > shield_types::BPS_DENOMINATOR {
            return Err(PlatformError::Config(format!(
                "slash_bps {} exceeds 10000",
                self.params.slash_bps
            )));
        }
        if self.params.max_split_recipients == 0 {
            return Err(PlatformError::Config(
                "max_split_recipients must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::from_name(&self.log_format)
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            params: SettlementParams::default(),
            treasury: default_treasury(),
            max_commit_retries: default_max_commit_retries(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = PlatformConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = PlatformConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = PlatformConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.max_commit_retries, 16);
        assert_eq!(config.treasury, Address::new("shd_treasury"));
        assert_eq!(config.params.slash_bps, 1_000);
        assert_eq!(config.log_format(), LogFormat::Human);
    }

    #[test]
    fn partial_params_table_overrides() {
        let toml = r#"
            treasury = "shd_dao"
            log_format = "json"

            [params]
            default_min_quorum = 5000
            slash_bps = 2500
        "#;
        let config = PlatformConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.treasury, Address::new("shd_dao"));
        assert_eq!(config.params.default_min_quorum, 5000);
        assert_eq!(config.params.slash_bps, 2500);
        assert_eq!(config.params.standard_voting_period_secs, 259_200); // default
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn malformed_treasury_is_rejected() {
        let err = PlatformConfig::from_toml_str(r#"treasury = "dao""#).unwrap_err();
        assert!(matches!(err, PlatformError::Config(_)));
    }

    #[test]
    fn slash_above_100_percent_is_rejected() {
        let err = PlatformConfig::from_toml_str("[params]\nslash_bps = 10001").unwrap_err();
        assert!(matches!(err, PlatformError::Config(_)));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let err = PlatformConfig::from_toml_file("/nonexistent/shield.toml").unwrap_err();
        assert!(matches!(err, PlatformError::Config(_)));
    }
}
