//! Catalog Loader

use crate::endpoint::Endpoint;
use crate::Result;
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Load the endpoint catalog from a plain-text source file.
///
/// One candidate per line: blank lines and `#` comments are skipped, and only
/// the first whitespace-delimited field of a line is considered. Tokens are
/// normalized before insertion; first-seen order wins and duplicates are
/// dropped silently. A missing file is a configuration error.
pub fn load_catalog(path: &Path) -> Result<Vec<Endpoint>> {
    let file = File::open(path)
        .with_context(|| format!("Proxy source file not found: {}", path.display()))?;

    let mut catalog: Vec<Endpoint> = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line
            .with_context(|| format!("Failed to read proxy source file: {}", path.display()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let token = match line.split_whitespace().next() {
            Some(token) => token,
            None => continue,
        };
        if let Some(endpoint) = Endpoint::normalize(token) {
            if !catalog.contains(&endpoint) {
                catalog.push(endpoint);
            }
        }
    }

    info!("Loaded {} proxies from {}", catalog.len(), path.display());
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_source(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("socks5.txt");
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_comments_blanks_and_trailing_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_source(
            &dir,
            "# header comment\n\n10.0.0.1:1080 eu-west fast\nsocks5://10.0.0.2:1080\n",
        );

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].as_str(), "socks5://10.0.0.1:1080");
        assert_eq!(catalog[1].as_str(), "socks5://10.0.0.2:1080");
    }

    #[test]
    fn test_duplicates_are_dropped_first_seen_wins() {
        let dir = TempDir::new().unwrap();
        let path = write_source(
            &dir,
            "10.0.0.1:1080\nsocks5://10.0.0.1:1080\n10.0.0.2:1080\n10.0.0.1:1080\n",
        );

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].as_str(), "socks5://10.0.0.1:1080");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write_source(
            &dir,
            "http://10.0.0.1:8080\nsocks5://http://10.0.0.2:8080\nnotaproxy\n10.0.0.3:1080\n",
        );

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].as_str(), "socks5://10.0.0.3:1080");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_catalog(&dir.path().join("missing.txt")).is_err());
    }
}
