use crate::refund_policy::{
    MissingTierStrategy, PolicyTiers, RefundPolicyEvaluator, RefundTier, DEFAULT_EPSILON_DAYS,
};
use anyhow::{bail, Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "BOOKING_VALUATION_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "booking-valuation";
/// `BOOKING_VALUATION__REFUND__EPSILON_DAYS=0.01` sets `refund.epsilon_days`.
pub const ENV_PREFIX: &str = "BOOKING_VALUATION";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundSettings {
    pub epsilon_days: f64,
    pub missing_tier: MissingTierStrategy,
    pub default_tiers: PolicyTiers,
}

impl Default for RefundSettings {
    fn default() -> Self {
        Self {
            epsilon_days: DEFAULT_EPSILON_DAYS,
            missing_tier: MissingTierStrategy::Zero,
            default_tiers: PolicyTiers::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationConfig {
    pub refund: RefundSettings,
    /// Reject malformed events and bookings instead of counting them as zero.
    pub strict_validation: bool,
    pub log_level: String,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            refund: RefundSettings::default(),
            strict_validation: false,
            log_level: "info".to_string(),
        }
    }
}

impl ValuationConfig {
    /// Defaults, then the optional config file, then environment variables.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let settings = defaults()?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<Self> {
        let config: ValuationConfig = settings
            .try_deserialize()
            .context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let epsilon = self.refund.epsilon_days;
        if !epsilon.is_finite() || !(0.0..1.0).contains(&epsilon) {
            bail!("refund.epsilon_days must be in [0, 1), got {}", epsilon);
        }

        for tier in RefundTier::ALL {
            let value = self.refund.default_tiers.percentage(tier);
            if !(0.0..=100.0).contains(&value) {
                bail!(
                    "refund.default_tiers value {} for {:?} must be within 0..=100",
                    value,
                    tier
                );
            }
        }

        Ok(())
    }

    pub fn refund_evaluator(&self) -> RefundPolicyEvaluator {
        RefundPolicyEvaluator::new()
            .with_epsilon(self.refund.epsilon_days)
            .with_default_tiers(self.refund.default_tiers.clone())
            .with_missing_tier_strategy(self.refund.missing_tier)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    let tiers = PolicyTiers::default();
    let builder = Config::builder()
        .set_default("refund.epsilon_days", DEFAULT_EPSILON_DAYS)?
        .set_default("refund.missing_tier", "zero")?
        .set_default("refund.default_tiers.seven_days_or_more", tiers.seven_days_or_more)?
        .set_default("refund.default_tiers.one_to_days", tiers.one_to_days)?
        .set_default("refund.default_tiers.less_than_day", tiers.less_than_day)?
        .set_default("strict_validation", false)?
        .set_default("log_level", "info")?;
    Ok(builder)
}
