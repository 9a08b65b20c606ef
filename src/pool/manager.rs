//! Proxy Pool Manager
//!
//! Owns the endpoint catalog, the exclusion set, the per-round usage
//! counters, and the shuffle queue, and couples the connectivity prober to
//! the durable ban and stats stores.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::endpoint::Endpoint;
use crate::pool::catalog;
use crate::pool::exclusion::ExclusionStore;
use crate::probe::{ConnectivityProber, ProbeOutcome};
use crate::stats::StatsStore;
use crate::Result;

/// Mutable selection state.
///
/// Selection, quota accounting, and banning are read-check-write sequences
/// over these three pieces, so they share one lock.
#[derive(Debug, Default)]
struct PoolState {
    excluded: HashSet<Endpoint>,
    round_used: HashMap<Endpoint, u32>,
    shuffle_queue: VecDeque<Endpoint>,
}

/// Manages the pool of SOCKS5 forward-proxy endpoints.
///
/// The catalog is immutable after construction; the exclusion set only
/// grows. When the pool is disabled by configuration, every selection
/// returns `None` and callers fall back to direct connections.
pub struct PoolManager {
    enabled: bool,
    quota_per_round: u32,
    catalog: Vec<Endpoint>,
    state: Mutex<PoolState>,
    exclusion: ExclusionStore,
    stats: StatsStore,
    prober: ConnectivityProber,
}

impl PoolManager {
    /// Construct the pool from configuration.
    ///
    /// With the pool enabled, a missing source file is a fatal configuration
    /// error; the ban list and stats document are created lazily on first
    /// write. With the pool disabled, nothing is loaded.
    pub fn new(config: &Config) -> Result<Self> {
        let exclusion = ExclusionStore::new(config.pool.banned_path());
        let stats = StatsStore::new(config.pool.stats_path());
        let prober = ConnectivityProber::new(&config.probe);

        let (catalog, excluded) = if config.pool.enabled {
            let catalog = catalog::load_catalog(&config.pool.source_path())?;
            let excluded = exclusion.load()?;
            (catalog, excluded)
        } else {
            (Vec::new(), HashSet::new())
        };

        Ok(Self {
            enabled: config.pool.enabled,
            quota_per_round: config.pool.quota_per_round,
            catalog,
            state: Mutex::new(PoolState {
                excluded,
                ..PoolState::default()
            }),
            exclusion,
            stats,
            prober,
        })
    }

    /// Select the next endpoint to use.
    ///
    /// Returns `None` when the pool is disabled or no endpoint is eligible;
    /// that is a normal outcome, and the caller proceeds without a proxy.
    pub fn select(&self) -> Option<Endpoint> {
        self.select_with_rng(&mut rand::thread_rng())
    }

    /// Shuffle-bag selection with a caller-supplied random source.
    ///
    /// The bag is a random permutation of the currently eligible endpoints,
    /// drawn without replacement and rebuilt only when it empties, so every
    /// eligible endpoint is drawn exactly once per bag. When every non-banned
    /// endpoint has reached the per-round quota, the round resets and
    /// selection continues. Quota is consulted when the bag is built and when
    /// stale members are filtered out, not per draw.
    pub fn select_with_rng<R: Rng>(&self, rng: &mut R) -> Option<Endpoint> {
        if !self.enabled {
            return None;
        }

        let mut state = self.state.lock().unwrap();
        let mut available = self.available_in(&state);

        if available.is_empty() {
            let non_banned: Vec<Endpoint> = self
                .catalog
                .iter()
                .filter(|e| !state.excluded.contains(e))
                .cloned()
                .collect();
            let round_complete = !non_banned.is_empty()
                && non_banned
                    .iter()
                    .all(|e| state.round_used.get(e).copied().unwrap_or(0) >= self.quota_per_round);
            if round_complete {
                Self::reset_state(&mut state);
                available = non_banned;
            }
        }

        if available.is_empty() {
            info!("No usable proxy available, degrading to direct connection");
            return None;
        }

        // Members banned or exhausted since the bag was built are dropped in place.
        state.shuffle_queue.retain(|e| available.contains(e));
        if state.shuffle_queue.is_empty() {
            let mut bag = available;
            bag.shuffle(rng);
            state.shuffle_queue = bag.into();
        }

        let endpoint = state.shuffle_queue.pop_front();
        if let Some(ref endpoint) = endpoint {
            debug!("Selected proxy {}", endpoint);
        }
        endpoint
    }

    /// Record one successful use of `endpoint` in the current round and in
    /// the durable stats document.
    pub fn mark_used(&self, endpoint: &Endpoint) -> Result<()> {
        let count = {
            let mut state = self.state.lock().unwrap();
            let count = state.round_used.entry(endpoint.clone()).or_insert(0);
            *count += 1;
            *count
        };
        debug!(
            "Proxy {} used {}/{} this round",
            endpoint, count, self.quota_per_round
        );
        self.stats.record_success(endpoint)
    }

    /// Permanently exclude an endpoint from selection.
    ///
    /// The raw input is normalized first; nothing is ever banned under an
    /// invalid form. Idempotent: an already-banned endpoint neither grows the
    /// ban file nor touches the stats document. The canonical form is
    /// appended to the durable ban list before the ban is recorded in stats.
    pub fn mark_banned(&self, endpoint: &str, reason: &str) -> Result<()> {
        let endpoint = match Endpoint::normalize(endpoint) {
            Some(endpoint) => endpoint,
            None => return Ok(()),
        };

        {
            let mut state = self.state.lock().unwrap();
            if !state.excluded.insert(endpoint.clone()) {
                return Ok(());
            }
        }

        warn!("Banning proxy {}: {}", endpoint, reason);
        self.exclusion.append(&endpoint)?;
        self.stats.record_ban(&endpoint, reason)
    }

    /// Probe `endpoint` against the configured target.
    ///
    /// A failed probe (bad status or transport error) permanently bans the
    /// endpoint. A successful probe has no side effect; callers invoke
    /// [`PoolManager::mark_used`] only after real use.
    pub async fn probe(&self, endpoint: &Endpoint) -> Result<bool> {
        match self.prober.check(endpoint).await {
            ProbeOutcome::Success { .. } => Ok(true),
            ProbeOutcome::Failure { reason, .. } => {
                self.mark_banned(endpoint.as_str(), &reason)?;
                Ok(false)
            }
        }
    }

    /// Clear the per-round usage counters and the shuffle queue.
    ///
    /// Called automatically when a round completes; also available to callers
    /// between logical batches.
    pub fn reset_round(&self) {
        let mut state = self.state.lock().unwrap();
        Self::reset_state(&mut state);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// All loaded endpoints, in source order.
    pub fn catalog(&self) -> &[Endpoint] {
        &self.catalog
    }

    pub fn is_banned(&self, endpoint: &Endpoint) -> bool {
        self.state.lock().unwrap().excluded.contains(endpoint)
    }

    pub fn excluded_count(&self) -> usize {
        self.state.lock().unwrap().excluded.len()
    }

    /// Endpoints currently eligible for selection: loaded, not banned, and
    /// under quota for this round.
    pub fn available_count(&self) -> usize {
        self.available_in(&self.state.lock().unwrap()).len()
    }

    pub fn stats(&self) -> &StatsStore {
        &self.stats
    }

    fn available_in(&self, state: &PoolState) -> Vec<Endpoint> {
        self.catalog
            .iter()
            .filter(|e| !state.excluded.contains(e))
            .filter(|e| state.round_used.get(e).copied().unwrap_or(0) < self.quota_per_round)
            .cloned()
            .collect()
    }

    fn reset_state(state: &mut PoolState) {
        state.round_used.clear();
        state.shuffle_queue.clear();
        info!("Reset per-proxy usage counters for a new round");
    }
}
