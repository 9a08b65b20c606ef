//! Configuration Types

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub pool: PoolConfig,
    pub probe: ProbeConfig,
    pub monitoring: MonitoringConfig,
}

/// Proxy pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    pub enabled: bool,
    /// Base directory that relative file paths are resolved against.
    pub data_dir: PathBuf,
    pub source_file: PathBuf,
    pub banned_file: PathBuf,
    pub stats_file: PathBuf,
    /// Maximum successful uses per endpoint within one round.
    pub quota_per_round: u32,
}

/// Connectivity probe configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Stable external URL used as the liveness beacon.
    pub target_url: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// Monitoring configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl PoolConfig {
    pub fn source_path(&self) -> PathBuf {
        self.resolve(&self.source_file)
    }

    pub fn banned_path(&self) -> PathBuf {
        self.resolve(&self.banned_file)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.resolve(&self.stats_file)
    }

    // Path::join keeps absolute paths as-is, so absolute entries win over data_dir.
    fn resolve(&self, path: &Path) -> PathBuf {
        self.data_dir.join(path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool: PoolConfig {
                enabled: false,
                data_dir: PathBuf::from("."),
                source_file: PathBuf::from("socks5.txt"),
                banned_file: PathBuf::from("banned_socks5.txt"),
                stats_file: PathBuf::from("socks5_stats.json"),
                quota_per_round: 3,
            },
            probe: ProbeConfig {
                target_url: "https://app.tavily.com".to_string(),
                timeout: Duration::from_secs(10),
            },
            monitoring: MonitoringConfig {
                log_level: "info".to_string(),
            },
        }
    }
}
