//! Sockspool - SOCKS5 Proxy Pool Maintenance Tool
//!
//! Loads the configured proxy pool, optionally sweeps it with connectivity
//! probes (banning unreachable endpoints), and reports pool and per-endpoint
//! statistics.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sockspool::{config::ConfigManager, pool::PoolManager};

/// CLI arguments for Sockspool
#[derive(Parser, Debug)]
#[command(name = "sockspool")]
#[command(about = "Sockspool - SOCKS5 proxy pool maintenance tool")]
#[command(version)]
#[command(long_about = "
Sockspool - SOCKS5 Proxy Pool Maintenance Tool

Manages a pool of SOCKS5 forward-proxy endpoints: loads and normalizes the
endpoint list, probes connectivity (permanently banning unreachable
endpoints), and reports durable per-endpoint statistics.

Configuration priority (highest to lowest):
1. Command-line arguments
2. Configuration file
3. Environment variables
4. Built-in defaults

Environment variables:
  SOCKSPOOL_ENABLED          - Enable the proxy pool (true/false)
  SOCKSPOOL_DATA_DIR         - Base directory for data files
  SOCKSPOOL_SOURCE_FILE      - Endpoint source file path
  SOCKSPOOL_QUOTA_PER_ROUND  - Uses allowed per endpoint per round
  SOCKSPOOL_PROBE_TIMEOUT    - Probe timeout (e.g., 10s, 1m)
  SOCKSPOOL_PROBE_URL        - Probe target URL
  SOCKSPOOL_LOG_LEVEL        - Log level (trace, debug, info, warn, error)
")]
pub struct CliArgs {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "config.toml",
        help = "Path to configuration file"
    )]
    pub config: PathBuf,

    /// Endpoint source file (overrides config file, enables the pool)
    #[arg(long, help = "Endpoint source file path")]
    pub source: Option<PathBuf>,

    /// Per-round usage quota (overrides config file)
    #[arg(long, help = "Uses allowed per endpoint per round")]
    pub quota: Option<u32>,

    /// Probe timeout in seconds (overrides config file)
    #[arg(long, help = "Probe timeout in seconds")]
    pub probe_timeout: Option<u64>,

    /// Force-disable the pool (overrides config file)
    #[arg(long, help = "Disable the proxy pool")]
    pub disabled: bool,

    /// Probe every non-banned endpoint and ban failures
    #[arg(long, help = "Run a connectivity sweep over the pool")]
    pub check: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", help = "Log level")]
    pub log_level: String,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Initialize tracing
    init_tracing(&args)?;

    info!("Starting Sockspool v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with priority: CLI args > config file > environment > defaults
    let mut config = if args.config.exists() {
        ConfigManager::load_from_file(&args.config)?
    } else {
        info!("Config file not found, checking environment variables");
        ConfigManager::load_from_env()?
    };

    // Apply CLI argument overrides (highest priority)
    config.merge_with_cli_args(
        args.source.as_deref(),
        args.quota,
        args.probe_timeout,
        args.disabled,
    );

    // Final validation after all overrides
    config
        .validate()
        .context("Final configuration validation failed")?;

    // If validate-config flag is set, just validate and exit
    if args.validate_config {
        info!("Configuration is valid");
        info!("Configuration summary:");
        info!(
            "  Pool: {}",
            if config.pool.enabled {
                "enabled"
            } else {
                "disabled"
            }
        );
        info!("  Source file: {}", config.pool.source_path().display());
        info!("  Ban list: {}", config.pool.banned_path().display());
        info!("  Stats file: {}", config.pool.stats_path().display());
        info!("  Quota per round: {}", config.pool.quota_per_round);
        info!("  Probe target: {}", config.probe.target_url);
        info!("  Probe timeout: {:?}", config.probe.timeout);
        return Ok(());
    }

    let pool = PoolManager::new(&config)?;

    if !pool.is_enabled() {
        warn!("Proxy pool is disabled; callers will fall back to direct connections");
        return Ok(());
    }

    if args.check {
        run_check(&pool).await?;
    }

    report_status(&pool);

    Ok(())
}

/// Probe every non-banned endpoint, banning failures.
async fn run_check(pool: &PoolManager) -> Result<()> {
    let candidates: Vec<_> = pool
        .catalog()
        .iter()
        .filter(|e| !pool.is_banned(e))
        .cloned()
        .collect();

    info!("Probing {} proxies", candidates.len());
    let mut reachable = 0usize;
    for endpoint in &candidates {
        if pool.probe(endpoint).await? {
            reachable += 1;
        }
    }
    info!(
        "Probe sweep complete: {}/{} reachable",
        reachable,
        candidates.len()
    );
    Ok(())
}

/// Report pool counts and durable per-endpoint statistics.
fn report_status(pool: &PoolManager) {
    info!(
        "Pool status: {} loaded, {} banned, {} selectable",
        pool.catalog().len(),
        pool.excluded_count(),
        pool.available_count()
    );

    let stats = pool.stats().load();
    for (endpoint, record) in &stats {
        if record.banned {
            info!(
                "  {}: {} successes, banned ({})",
                endpoint,
                record.total_success,
                record.ban_reason.as_deref().unwrap_or("unknown")
            );
        } else {
            info!("  {}: {} successes", endpoint, record.total_success);
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(args: &CliArgs) -> Result<()> {
    let log_level = if args.verbose {
        "debug"
    } else {
        &args.log_level
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_ansi(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}
