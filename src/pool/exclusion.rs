//! Exclusion Store
//!
//! Append-only persistence for permanently banned endpoints. Each ban is one
//! canonical line; a crash during append can lose the newest line but never
//! corrupts prior entries. The file is never rewritten.

use crate::endpoint::Endpoint;
use crate::Result;
use anyhow::Context;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::info;

/// Durable, append-only ban list.
pub struct ExclusionStore {
    path: PathBuf,
}

impl ExclusionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the full exclusion set from the store.
    ///
    /// A missing file means nothing has been banned yet. Lines follow the
    /// same comment/blank rules as the source file; malformed lines are
    /// dropped silently.
    pub fn load(&self) -> Result<HashSet<Endpoint>> {
        let mut banned = HashSet::new();
        if !self.path.exists() {
            return Ok(banned);
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open ban list: {}", self.path.display()))?;
        for line in BufReader::new(file).lines() {
            let line = line
                .with_context(|| format!("Failed to read ban list: {}", self.path.display()))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(endpoint) = Endpoint::normalize(line) {
                banned.insert(endpoint);
            }
        }

        if !banned.is_empty() {
            info!(
                "Loaded {} banned proxies from {}",
                banned.len(),
                self.path.display()
            );
        }
        Ok(banned)
    }

    /// Append one canonical endpoint to the store.
    pub fn append(&self, endpoint: &Endpoint) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open ban list: {}", self.path.display()))?;
        writeln!(file, "{}", endpoint)
            .with_context(|| format!("Failed to append to ban list: {}", self.path.display()))?;
        Ok(())
    }
}
