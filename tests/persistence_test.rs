//! Tests for durable ban-list and stats persistence across pool restarts

use std::path::Path;
use tempfile::TempDir;

use sockspool::config::Config;
use sockspool::pool::PoolManager;
use sockspool::Endpoint;

fn config_for(dir: &Path) -> Config {
    let mut config = Config::default();
    config.pool.enabled = true;
    config.pool.data_dir = dir.to_path_buf();
    config
}

fn pool_with_sources(dir: &Path, sources: &str) -> PoolManager {
    std::fs::write(dir.join("socks5.txt"), sources).unwrap();
    PoolManager::new(&config_for(dir)).unwrap()
}

#[test]
fn test_bans_survive_restart() {
    let dir = TempDir::new().unwrap();
    let victim = Endpoint::normalize("10.0.0.2:1080").unwrap();

    {
        let pool = pool_with_sources(dir.path(), "10.0.0.1:1080\n10.0.0.2:1080\n");
        pool.mark_banned(victim.as_str(), "unreachable").unwrap();
        assert!(pool.is_banned(&victim));
    }

    // A fresh pool instance reloads the ban list from disk.
    let pool = PoolManager::new(&config_for(dir.path())).unwrap();
    assert!(pool.is_banned(&victim));
    assert_eq!(pool.excluded_count(), 1);
    for _ in 0..6 {
        if let Some(endpoint) = pool.select() {
            assert_ne!(endpoint, victim);
        }
    }
}

#[test]
fn test_duplicate_ban_does_not_grow_the_store() {
    let dir = TempDir::new().unwrap();
    let pool = pool_with_sources(dir.path(), "10.0.0.1:1080\n10.0.0.2:1080\n");

    pool.mark_banned("10.0.0.1:1080", "first").unwrap();
    pool.mark_banned("10.0.0.1:1080", "second").unwrap();
    // Same endpoint under a different raw spelling is still the same ban.
    pool.mark_banned("socks5://10.0.0.1:1080", "third").unwrap();

    let banned_file = std::fs::read_to_string(dir.path().join("banned_socks5.txt")).unwrap();
    assert_eq!(banned_file.lines().count(), 1);
    assert_eq!(banned_file.trim(), "socks5://10.0.0.1:1080");

    // The stats record keeps the first reason.
    let stats = pool.stats().load();
    let record = &stats["socks5://10.0.0.1:1080"];
    assert!(record.banned);
    assert_eq!(record.ban_reason.as_deref(), Some("first"));
}

#[test]
fn test_invalid_token_is_never_banned() {
    let dir = TempDir::new().unwrap();
    let pool = pool_with_sources(dir.path(), "10.0.0.1:1080\n");

    pool.mark_banned("http://10.0.0.9:8080", "not socks").unwrap();
    pool.mark_banned("", "empty").unwrap();

    assert_eq!(pool.excluded_count(), 0);
    assert!(!dir.path().join("banned_socks5.txt").exists());
}

#[test]
fn test_usage_stats_accumulate_across_restarts() {
    let dir = TempDir::new().unwrap();
    let endpoint = Endpoint::normalize("10.0.0.1:1080").unwrap();

    {
        let pool = pool_with_sources(dir.path(), "10.0.0.1:1080\n");
        pool.mark_used(&endpoint).unwrap();
        pool.mark_used(&endpoint).unwrap();
    }

    let pool = PoolManager::new(&config_for(dir.path())).unwrap();
    pool.mark_used(&endpoint).unwrap();

    let stats = pool.stats().load();
    assert_eq!(stats["socks5://10.0.0.1:1080"].total_success, 3);
}

#[test]
fn test_ban_reason_and_time_are_recorded_once() {
    let dir = TempDir::new().unwrap();
    let pool = pool_with_sources(dir.path(), "10.0.0.1:1080\n10.0.0.2:1080\n");

    pool.mark_banned("10.0.0.2:1080", "connectivity-failed-500")
        .unwrap();

    let stats = pool.stats().load();
    let record = &stats["socks5://10.0.0.2:1080"];
    assert!(record.banned);
    assert!(record.ban_reason.as_deref().unwrap().contains("500"));
    assert!(record.ban_time.is_some());
}

#[test]
fn test_stale_tmp_file_does_not_shadow_the_document() {
    let dir = TempDir::new().unwrap();
    let endpoint = Endpoint::normalize("10.0.0.1:1080").unwrap();
    let pool = pool_with_sources(dir.path(), "10.0.0.1:1080\n");
    pool.mark_used(&endpoint).unwrap();

    // A crash after writing the temporary file but before the rename leaves
    // a stale .tmp behind; the canonical document must stay authoritative.
    std::fs::write(dir.path().join("socks5_stats.json.tmp"), "garbage").unwrap();

    let stats = pool.stats().load();
    assert_eq!(stats["socks5://10.0.0.1:1080"].total_success, 1);

    // The next update replaces the stale temporary cleanly.
    pool.mark_used(&endpoint).unwrap();
    let stats = pool.stats().load();
    assert_eq!(stats["socks5://10.0.0.1:1080"].total_success, 2);
}
