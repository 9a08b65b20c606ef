//! Stats Store
//!
//! Durable per-endpoint success and ban statistics, persisted as one JSON
//! document. Every update is a full read-modify-write: the new document is
//! written to a temporary file and renamed over the canonical path, so the
//! store is never observed partially written. Updates are serialized by a
//! per-process lock; concurrent writers from independent processes are not
//! supported.

use crate::endpoint::Endpoint;
use crate::Result;
use anyhow::Context;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Per-endpoint usage and ban record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsRecord {
    pub total_success: u64,
    pub banned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban_time: Option<String>,
}

/// Durable endpoint statistics document.
pub struct StatsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl StatsStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Load the current document.
    ///
    /// A missing or corrupt document reads as empty; corruption is
    /// overwritten by the next update.
    pub fn load(&self) -> BTreeMap<String, StatsRecord> {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => BTreeMap::new(),
        }
    }

    /// Increment the success counter for `endpoint`.
    pub fn record_success(&self, endpoint: &Endpoint) -> Result<()> {
        self.update(endpoint, |record| {
            record.total_success += 1;
        })
    }

    /// Mark `endpoint` as banned with a reason and the current wall-clock time.
    pub fn record_ban(&self, endpoint: &Endpoint, reason: &str) -> Result<()> {
        let reason = reason.to_string();
        self.update(endpoint, move |record| {
            record.banned = true;
            record.ban_reason = Some(reason);
            record.ban_time = Some(Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
        })
    }

    fn update<F>(&self, endpoint: &Endpoint, apply: F) -> Result<()>
    where
        F: FnOnce(&mut StatsRecord),
    {
        let _guard = self.write_lock.lock().unwrap();
        let mut stats = self.load();
        let record = stats.entry(endpoint.as_str().to_string()).or_default();
        apply(record);
        self.write_atomic(&stats)
    }

    fn write_atomic(&self, stats: &BTreeMap<String, StatsRecord>) -> Result<()> {
        let tmp_path = self.tmp_path();
        let content = serde_json::to_string_pretty(stats)
            .with_context(|| "Failed to serialize stats document")?;
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write stats document: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!("Failed to replace stats document: {}", self.path.display())
        })?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}
