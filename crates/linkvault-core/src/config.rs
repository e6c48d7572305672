use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{LinkVaultError, Result};

/// Top-level configuration for LinkVault.
///
/// Loaded from `~/.linkvault/config.toml` by default. Every section is
/// optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkVaultConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl LinkVaultConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LinkVaultConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values that would make the engine delete everything, spin, or
    /// compute cutoffs outside the calendar.
    pub fn validate(&self) -> Result<()> {
        let retention = &self.retention;
        for (name, tier) in [
            ("anonymous", &retention.anonymous),
            ("free", &retention.free),
            ("premium", &retention.premium),
        ] {
            check_days(&format!("retention.{}.creation_days", name), tier.creation_days, 1)?;
            check_days(&format!("retention.{}.inactivity_days", name), tier.inactivity_days, 1)?;
        }
        check_days("retention.inactive_user_days", retention.inactive_user_days, 1)?;
        check_days("retention.expiring_soon_days", retention.expiring_soon_days, 0)?;
        if self.scheduler.interval_hours == 0 {
            return Err(LinkVaultError::Config(
                "scheduler.interval_hours must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Upper bound for any day count in `[retention]`.
pub const MAX_RETENTION_DAYS: u32 = 36_500;

fn check_days(key: &str, days: u32, min: u32) -> Result<()> {
    if days < min {
        return Err(LinkVaultError::Config(format!(
            "{} must be greater than zero",
            key
        )));
    }
    if days > MAX_RETENTION_DAYS {
        return Err(LinkVaultError::Config(format!(
            "{} must be at most {} days, got {}",
            key, MAX_RETENTION_DAYS, days
        )));
    }
    Ok(())
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.linkvault/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Retention rules for one tier.
///
/// All fields are required when a tier table is written out, except
/// `age_limited` which defaults to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRetentionConfig {
    /// Maximum link age in days.
    pub creation_days: u32,
    /// Maximum days since the last successful redirect.
    pub inactivity_days: u32,
    /// When false, the sweep ignores `creation_days` for this tier.
    #[serde(default = "default_true")]
    pub age_limited: bool,
}

fn default_true() -> bool {
    true
}

/// Retention policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub anonymous: TierRetentionConfig,
    pub free: TierRetentionConfig,
    pub premium: TierRetentionConfig,
    /// Look-ahead window for the "expiring soon" statistic.
    pub expiring_soon_days: u32,
    /// Free accounts without a login for this long are deactivated.
    pub inactive_user_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            anonymous: TierRetentionConfig {
                creation_days: 90,
                inactivity_days: 30,
                age_limited: true,
            },
            free: TierRetentionConfig {
                creation_days: 90,
                inactivity_days: 30,
                age_limited: true,
            },
            premium: TierRetentionConfig {
                creation_days: 3650,
                inactivity_days: 365,
                age_limited: false,
            },
            expiring_soon_days: 7,
            inactive_user_days: 365,
        }
    }
}

/// Recurring sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run the sweep on a timer in `serve` mode.
    pub enabled: bool,
    /// Hours between sweeps.
    pub interval_hours: u32,
    /// Delay before the first sweep after start.
    pub initial_delay_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_hours: 24,
            initial_delay_secs: 60,
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.interval_hours) * 3600)
    }

    pub fn initial_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.initial_delay_secs)
    }
}
