//! Service configuration.
//!
//! Loaded from the environment (after `.env`), then optionally overridden by
//! the admin-editable `settings` table. Bad values stop startup instead of
//! being replaced with defaults.

use std::collections::HashMap;
use std::env;

use thiserror::Error;

use crate::domain::loyalty::{PointsPolicy, TierTable};
use crate::StoreError;

/// Settings keys the back office writes.
pub const LOYALTY_KEYS: [&str; 4] = ["point_ratio", "level_silver", "level_gold", "level_diamond"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Loyalty tiers misconfigured: {0}")]
    Tiers(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub loyalty: LoyaltyConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(raw) => parse("PORT", &raw)?,
            Err(_) => 8083,
        };
        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let mut loyalty = LoyaltyConfig::default();
        let overrides: HashMap<String, String> = LOYALTY_KEYS
            .iter()
            .filter_map(|key| env::var(key.to_ascii_uppercase()).ok().map(|v| (key.to_string(), v)))
            .collect();
        loyalty.apply(&overrides)?;

        Ok(Self { port, database_url, loyalty })
    }
}

/// Tier thresholds and earn ratio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltyConfig {
    pub silver: u64,
    pub gold: u64,
    pub diamond: u64,
    pub points: PointsPolicy,
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self { silver: 1_000, gold: 5_000, diamond: 10_000, points: PointsPolicy::default() }
    }
}

impl LoyaltyConfig {
    /// Overrides from `settings`-style key/value pairs. Blank values are
    /// treated as unset, the way the admin form leaves them.
    pub fn apply(&mut self, values: &HashMap<String, String>) -> Result<(), ConfigError> {
        let get = |key: &str| values.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let mut next = self.clone();
        if let Some(v) = get("point_ratio") { next.points = PointsPolicy::new(parse("point_ratio", v)?); }
        if let Some(v) = get("level_silver") { next.silver = parse("level_silver", v)?; }
        if let Some(v) = get("level_gold") { next.gold = parse("level_gold", v)?; }
        if let Some(v) = get("level_diamond") { next.diamond = parse("level_diamond", v)?; }

        // Validate eagerly so a bad override is reported against its source.
        next.tier_table()?;
        *self = next;
        Ok(())
    }

    pub fn tier_table(&self) -> Result<TierTable, ConfigError> {
        Ok(TierTable::with_thresholds(self.silver, self.gold, self.diamond)?)
    }
}

fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue { key: key.to_string(), value: raw.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults_match_standard_table() {
        assert_eq!(LoyaltyConfig::default().tier_table().unwrap(), TierTable::standard());
    }

    #[test]
    fn test_settings_override() {
        let mut cfg = LoyaltyConfig::default();
        cfg.apply(&values(&[("level_silver", "2000"), ("point_ratio", " 2 "), ("level_gold", "")])).unwrap();
        assert_eq!(cfg.silver, 2_000);
        assert_eq!(cfg.gold, 5_000);
        assert_eq!(cfg.points, PointsPolicy::new(2));
    }

    #[test]
    fn test_bad_values_rejected() {
        let mut cfg = LoyaltyConfig::default();
        let err = cfg.apply(&values(&[("level_gold", "lots")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for level_gold: 'lots'");

        let mut cfg = LoyaltyConfig::default();
        assert!(matches!(cfg.apply(&values(&[("level_silver", "5000")])), Err(ConfigError::Tiers(_))));
        assert_eq!(cfg, LoyaltyConfig::default());
        assert!(cfg.apply(&values(&[("level_diamond", "-1")])).is_err());
    }
}
