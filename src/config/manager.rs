//! Configuration Manager

use super::Config;
use crate::Result;
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};

/// Manages configuration loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            config
                .validate()
                .with_context(|| "Configuration validation failed")?;

            tracing::info!("Configuration loaded and validated successfully");
            Ok(config)
        } else {
            tracing::warn!(
                "Configuration file not found at {}, using defaults",
                path.display()
            );
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Config> {
        let mut config = Config::default();

        // Override with environment variables if present
        if let Ok(enabled) = std::env::var("SOCKSPOOL_ENABLED") {
            config.pool.enabled = enabled
                .parse::<bool>()
                .with_context(|| format!("Invalid SOCKSPOOL_ENABLED: {}", enabled))?;
        }

        if let Ok(data_dir) = std::env::var("SOCKSPOOL_DATA_DIR") {
            config.pool.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(source_file) = std::env::var("SOCKSPOOL_SOURCE_FILE") {
            config.pool.source_file = PathBuf::from(source_file);
        }

        if let Ok(quota) = std::env::var("SOCKSPOOL_QUOTA_PER_ROUND") {
            config.pool.quota_per_round = quota
                .parse::<u32>()
                .with_context(|| format!("Invalid SOCKSPOOL_QUOTA_PER_ROUND: {}", quota))?;
        }

        if let Ok(timeout) = std::env::var("SOCKSPOOL_PROBE_TIMEOUT") {
            config.probe.timeout = humantime::parse_duration(&timeout)
                .with_context(|| format!("Invalid SOCKSPOOL_PROBE_TIMEOUT: {}", timeout))?;
        }

        if let Ok(target_url) = std::env::var("SOCKSPOOL_PROBE_URL") {
            config.probe.target_url = target_url;
        }

        if let Ok(log_level) = std::env::var("SOCKSPOOL_LOG_LEVEL") {
            config.monitoring.log_level = log_level;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_pool_config()
            .with_context(|| "Pool configuration validation failed")?;

        self.validate_probe_config()
            .with_context(|| "Probe configuration validation failed")?;

        self.validate_monitoring_config()
            .with_context(|| "Monitoring configuration validation failed")?;

        Ok(())
    }

    /// Validate pool configuration
    fn validate_pool_config(&self) -> Result<()> {
        if self.pool.quota_per_round == 0 {
            bail!("quota_per_round must be greater than 0");
        }

        if self.pool.quota_per_round > 10000 {
            bail!("quota_per_round cannot exceed 10,000 for safety");
        }

        if self.pool.source_file.as_os_str().is_empty() {
            bail!("source_file must not be empty");
        }

        if self.pool.banned_file.as_os_str().is_empty() {
            bail!("banned_file must not be empty");
        }

        if self.pool.stats_file.as_os_str().is_empty() {
            bail!("stats_file must not be empty");
        }

        Ok(())
    }

    /// Validate probe configuration
    fn validate_probe_config(&self) -> Result<()> {
        if self.probe.timeout.as_secs() == 0 {
            bail!("probe timeout must be greater than 0");
        }

        if self.probe.timeout.as_secs() > 300 {
            bail!("probe timeout cannot exceed 5 minutes");
        }

        if !self.probe.target_url.starts_with("http://")
            && !self.probe.target_url.starts_with("https://")
        {
            bail!("probe target_url must be an http(s) URL");
        }

        Ok(())
    }

    /// Validate monitoring configuration
    fn validate_monitoring_config(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.monitoring.log_level.as_str()) {
            bail!(
                "monitoring.log_level must be one of: {}",
                valid_log_levels.join(", ")
            );
        }

        Ok(())
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(
        &mut self,
        source: Option<&Path>,
        quota: Option<u32>,
        probe_timeout: Option<u64>,
        disable: bool,
    ) {
        // Override source file if provided
        if let Some(source) = source {
            self.pool.source_file = source.to_path_buf();
            self.pool.enabled = true;
            tracing::info!("CLI override: source file set to {}", source.display());
        }

        // Override per-round quota if provided
        if let Some(quota) = quota {
            self.pool.quota_per_round = quota;
            tracing::info!("CLI override: quota per round set to {}", quota);
        }

        // Override probe timeout if provided
        if let Some(timeout_secs) = probe_timeout {
            self.probe.timeout = std::time::Duration::from_secs(timeout_secs);
            tracing::info!("CLI override: probe timeout set to {}s", timeout_secs);
        }

        // Force-disable the pool if requested
        if disable {
            self.pool.enabled = false;
            tracing::info!("CLI override: proxy pool disabled");
        }
    }
}
