//! On-disk cache of parse outcomes, one JSON file per key.
//!
//! Entry age is the file's modification time. Reads never fail: an expired or
//! unreadable entry is deleted and reported as a miss.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tallyscan_core::CacheConfig;
use thiserror::Error;
use tracing::{debug, warn};

use crate::parser::ParseOutcome;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
    ttl: Duration,
    max_bytes: u64,
}

impl ResultCache {
    /// Creates the directory when missing. A zero `ttl` expires every entry.
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration, max_bytes: u64) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| CacheError::Io { path: dir.clone(), source })?;
        Ok(Self { dir, ttl, max_bytes })
    }

    pub fn from_config(dir: impl Into<PathBuf>, config: &CacheConfig) -> Result<Self, CacheError> {
        Self::new(dir, Duration::from_secs(config.ttl_days.saturating_mul(SECS_PER_DAY)), config.max_bytes)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn is_expired(&self, modified: SystemTime, now: SystemTime) -> bool {
        // Clock skew (mtime in the future) counts as fresh.
        now.duration_since(modified).map_or(false, |age| age >= self.ttl)
    }

    pub fn get(&self, key: &str) -> Option<ParseOutcome> {
        let path = self.entry_path(key);
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        if self.is_expired(modified, SystemTime::now()) {
            debug!(key, "cache entry expired");
            remove_quietly(&path);
            return None;
        }

        let parsed = fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| serde_json::from_slice::<ParseOutcome>(&bytes).map_err(|e| e.to_string()));
        match parsed {
            Ok(outcome) => {
                debug!(key, "cache hit");
                Some(outcome)
            }
            Err(error) => {
                debug!(key, %error, "dropping unreadable cache entry");
                remove_quietly(&path);
                None
            }
        }
    }

    pub fn set(&self, key: &str, outcome: &ParseOutcome) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        let json = serde_json::to_vec(outcome)?;
        fs::write(&path, json).map_err(|source| CacheError::Io { path, source })
    }

    /// Removes expired entries, then the oldest ones until the total size is
    /// within `max_bytes`. Returns the number of entries removed.
    pub fn cleanup(&self) -> Result<usize, CacheError> {
        let now = SystemTime::now();
        let read_dir = fs::read_dir(&self.dir).map_err(|source| CacheError::Io { path: self.dir.clone(), source })?;

        let mut removed = 0;
        let mut live: Vec<(PathBuf, SystemTime, u64)> = Vec::new();
        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(meta) = entry.metadata() else { continue };
            let modified = meta.modified().unwrap_or(now);
            if self.is_expired(modified, now) {
                if fs::remove_file(&path).is_ok() {
                    removed += 1;
                }
            } else {
                live.push((path, modified, meta.len()));
            }
        }

        let mut total: u64 = live.iter().map(|(_, _, size)| size).sum();
        if total > self.max_bytes {
            live.sort_by_key(|(_, modified, _)| *modified);
            for (path, _, size) in live {
                if total <= self.max_bytes {
                    break;
                }
                if fs::remove_file(&path).is_ok() {
                    removed += 1;
                    total -= size;
                }
            }
        }

        debug!(removed, total_bytes = total, "cache cleanup");
        Ok(removed)
    }
}

fn remove_quietly(path: &Path) {
    if let Err(error) = fs::remove_file(path) {
        warn!(path = %path.display(), %error, "failed to remove cache entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::StatementParser;
    use tallyscan_core::{DocumentType, ParserConfig, RawDocumentText};

    const DAY: Duration = Duration::from_secs(SECS_PER_DAY);

    fn outcome() -> ParseOutcome {
        let parser = StatementParser::new(ParserConfig::default()).unwrap();
        parser.parse(
            &RawDocumentText::new("Date   Description   Amount\n2025-01-02  COFFEE  -4.50\n"),
            DocumentType::Bank,
        )
    }

    #[test]
    fn set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(dir.path(), DAY, u64::MAX).unwrap();
        let stored = outcome();
        cache.set("abc", &stored).unwrap();
        assert_eq!(cache.get("abc"), Some(stored));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn expired_entry_is_removed_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(dir.path(), Duration::ZERO, u64::MAX).unwrap();
        cache.set("abc", &outcome()).unwrap();
        assert_eq!(cache.get("abc"), None);
        assert!(!dir.path().join("abc.json").exists());
    }

    #[test]
    fn corrupt_entry_is_removed_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(dir.path(), DAY, u64::MAX).unwrap();
        fs::write(dir.path().join("bad.json"), b"{not json").unwrap();
        assert_eq!(cache.get("bad"), None);
        assert!(!dir.path().join("bad.json").exists());
    }

    #[test]
    fn cleanup_enforces_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(dir.path(), DAY, 0).unwrap();
        cache.set("one", &outcome()).unwrap();
        cache.set("two", &outcome()).unwrap();
        fs::write(dir.path().join("notes.txt"), b"not a cache entry").unwrap();
        assert_eq!(cache.cleanup().unwrap(), 2);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn cleanup_keeps_fresh_entries_under_limit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(dir.path(), DAY, u64::MAX).unwrap();
        cache.set("one", &outcome()).unwrap();
        assert_eq!(cache.cleanup().unwrap(), 0);
        assert!(cache.get("one").is_some());
    }

    #[test]
    fn cleanup_removes_expired() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(dir.path(), Duration::ZERO, u64::MAX).unwrap();
        cache.set("one", &outcome()).unwrap();
        assert_eq!(cache.cleanup().unwrap(), 1);
    }

    #[test]
    fn huge_ttl_saturates() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig { ttl_days: u64::MAX, ..CacheConfig::default() };
        let cache = ResultCache::from_config(dir.path(), &config).unwrap();
        assert_eq!(cache.ttl, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let cache = ResultCache::new(&nested, DAY, u64::MAX).unwrap();
        assert!(cache.dir().is_dir());
    }
}
