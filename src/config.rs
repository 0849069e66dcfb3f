//! Configuration management

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

use crate::types::Outcome;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,
    pub model: ModelConfig,
    pub detector: DetectorConfig,
    pub database: DatabaseConfig,
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// API-Football endpoint
    pub base_url: String,
    /// API key sent in the x-apisports-key header
    pub api_key: String,
    /// League ids scanned each batch
    pub leagues: Vec<u32>,
    /// Upcoming fixtures fetched per league
    pub upcoming_per_league: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Bound on parallel per-fixture requests
    pub max_concurrent_requests: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Prediction service endpoint
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// The service's class-index ordering; must name each canonical
    /// outcome exactly once
    pub class_order: Vec<Outcome>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Minimum probability x odd product to flag a value signal
    pub value_threshold: Decimal,
    /// Rolling window length per team
    pub window: usize,
    /// Fixed unit stake used for profit accounting
    pub stake: Decimal,
    /// Cap on signals per alert message
    pub max_alerts_per_message: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path.as_ref().to_str().unwrap()))
            .add_source(config::Environment::with_prefix("VALUEBET"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }

    /// Load from default locations
    pub fn load_default() -> anyhow::Result<Self> {
        let paths = ["config.toml", "~/.config/valuebet-bot/config.toml"];

        for path in paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::load(expanded.as_ref());
            }
        }

        anyhow::bail!("No configuration file found")
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            value_threshold: Decimal::new(110, 2), // 1.10
            window: 5,
            stake: Decimal::new(10, 0), // 10 units per bet
            max_alerts_per_message: 5,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
            class_order: vec![Outcome::Home, Outcome::Draw, Outcome::Away],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_detector_defaults() {
        let cfg = DetectorConfig::default();
        assert_eq!(cfg.value_threshold, dec!(1.10));
        assert_eq!(cfg.window, 5);
        assert_eq!(cfg.stake, dec!(10));
    }

    #[test]
    fn test_config_from_toml() {
        let raw = r#"
            [provider]
            base_url = "https://v3.football.api-sports.io"
            api_key = "secret"
            leagues = [39, 140, 135, 78, 61]
            upcoming_per_league = 10
            timeout_secs = 30
            max_concurrent_requests = 4

            [model]
            base_url = "http://localhost:8000"
            timeout_secs = 10
            class_order = ["Home", "Draw", "Away"]

            [detector]
            value_threshold = "1.05"
            window = 5
            stake = "10"
            max_alerts_per_message = 5

            [database]
            path = "valuebet.db"
        "#;

        let cfg: Config = toml::from_str(raw).unwrap();
        assert_eq!(cfg.provider.leagues.len(), 5);
        assert_eq!(cfg.detector.value_threshold, dec!(1.05));
        assert_eq!(
            cfg.model.class_order,
            vec![Outcome::Home, Outcome::Draw, Outcome::Away]
        );
        assert!(cfg.telegram.is_none());
    }
}
