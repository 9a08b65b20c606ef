//! Sockspool Library
//!
//! SOCKS5 forward-proxy pool manager for bulk outbound HTTP clients.
//!
//! Loads and normalizes a list of SOCKS5 endpoints, hands one endpoint per
//! outbound request under a per-round usage quota (shuffle-bag rotation),
//! permanently excludes endpoints that fail a connectivity probe, and keeps
//! exclusion and usage statistics durable across restarts.

pub mod config;
pub mod endpoint;
pub mod pool;
pub mod probe;
pub mod stats;

pub use config::Config;
pub use endpoint::Endpoint;
pub use pool::PoolManager;

/// Common error type for the proxy pool
pub type Result<T> = anyhow::Result<T>;
