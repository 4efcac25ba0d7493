//! Content-addressed cache for expensive document conversions.
//!
//! Entries are keyed by the source file's identity (absolute path, mtime and
//! size) and the strategy that produced them, so touching a file orphans its
//! old entries instead of mutating them. Each entry is two files:
//!
//! ```text
//! {root}/documents/{strategy}_{hash}.md
//! {root}/metadata/{strategy}_{hash}.json
//! ```
//!
//! The artifact is written before the metadata, both through atomic renames,
//! and an entry only counts as present when both files exist.

use crate::error::{IngestError, IngestResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::UNIX_EPOCH;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const DOCUMENTS_DIR: &str = "documents";
const METADATA_DIR: &str = "metadata";

/// Sidecar metadata stored next to every cached artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub file_path: PathBuf,
    pub strategy: String,
    pub cached_at: DateTime<Utc>,
    pub source_modified: Option<DateTime<Utc>>,
    pub content_length: usize,
    #[serde(default)]
    pub additional_metadata: serde_json::Value,
}

/// A cache hit.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedArtifact {
    pub key: String,
    pub text: String,
    pub metadata: CacheMetadata,
}

/// One entry as reported by [`ContentCache::info`].
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryInfo {
    pub key: String,
    pub file_path: PathBuf,
    pub strategy: String,
    pub cached_at: DateTime<Utc>,
    pub content_length: usize,
    /// Bytes on disk for artifact plus metadata.
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub cache_dir: PathBuf,
    pub entries: Vec<CacheEntryInfo>,
    pub total_size: u64,
}

/// Counters since the cache was opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
}

#[derive(Debug)]
pub struct ContentCache {
    root: PathBuf,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl ContentCache {
    /// Open (and create if needed) a cache rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> IngestResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(DOCUMENTS_DIR))?;
        fs::create_dir_all(root.join(METADATA_DIR))?;
        debug!("Content cache at {:?}", root);
        Ok(Self {
            root,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// SHA-256 over the file's absolute path, modification time and size.
    pub fn content_hash(path: &Path) -> IngestResult<String> {
        let abs = path
            .canonicalize()
            .map_err(|_| IngestError::FileNotFound(path.to_path_buf()))?;
        let meta = fs::metadata(&abs)?;
        let mtime = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        let mut hasher = Sha256::new();
        hasher.update(format!("{}_{}_{}", abs.display(), mtime, meta.len()));
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// The entry key for a source under a strategy.
    pub fn key(path: &Path, strategy: &str) -> IngestResult<String> {
        Ok(format!(
            "{}_{}",
            sanitize_strategy(strategy),
            Self::content_hash(path)?
        ))
    }

    fn entry_paths(&self, key: &str) -> (PathBuf, PathBuf) {
        (
            self.root.join(DOCUMENTS_DIR).join(format!("{key}.md")),
            self.root.join(METADATA_DIR).join(format!("{key}.json")),
        )
    }

    /// True when both the artifact and its metadata exist.
    pub fn is_cached(&self, path: &Path, strategy: &str) -> bool {
        match Self::key(path, strategy) {
            Ok(key) => {
                let (artifact, metadata) = self.entry_paths(&key);
                artifact.is_file() && metadata.is_file()
            }
            Err(_) => false,
        }
    }

    /// Look up the artifact for a source. Unreadable entries count as misses.
    pub fn get(&self, path: &Path, strategy: &str) -> IngestResult<Option<CachedArtifact>> {
        let key = Self::key(path, strategy)?;
        let (artifact_path, metadata_path) = self.entry_paths(&key);

        if !(artifact_path.is_file() && metadata_path.is_file()) {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }

        let loaded = fs::read_to_string(&artifact_path)
            .map_err(IngestError::from)
            .and_then(|text| {
                let raw = fs::read_to_string(&metadata_path)?;
                let metadata: CacheMetadata = serde_json::from_str(&raw)
                    .map_err(|e| IngestError::Cache(format!("corrupt metadata {key}: {e}")))?;
                Ok((text, metadata))
            });

        match loaded {
            Ok((text, metadata)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for {:?} ({})", path, strategy);
                Ok(Some(CachedArtifact {
                    key,
                    text,
                    metadata,
                }))
            }
            Err(e) => {
                warn!("Ignoring unreadable cache entry {}: {}", key, e);
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    /// Store an artifact, returning its key.
    pub fn put(
        &self,
        path: &Path,
        strategy: &str,
        text: &str,
        additional_metadata: serde_json::Value,
    ) -> IngestResult<String> {
        let key = Self::key(path, strategy)?;
        let (artifact_path, metadata_path) = self.entry_paths(&key);

        let source_modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        let metadata = CacheMetadata {
            file_path: path.canonicalize()?,
            strategy: strategy.to_string(),
            cached_at: Utc::now(),
            source_modified,
            content_length: text.chars().count(),
            additional_metadata,
        };
        let metadata_json = serde_json::to_string_pretty(&metadata)
            .map_err(|e| IngestError::Cache(e.to_string()))?;

        write_atomic(&artifact_path, text.as_bytes())?;
        write_atomic(&metadata_path, metadata_json.as_bytes())?;

        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!("Cached {:?} as {}", path, key);
        Ok(key)
    }

    /// Remove entries, narrowed by source and/or strategy. Returns how many were removed.
    pub fn clear(&self, path: Option<&Path>, strategy: Option<&str>) -> IngestResult<usize> {
        let hash = path.map(Self::content_hash).transpose()?;
        let prefix = strategy.map(|s| format!("{}_", sanitize_strategy(s)));

        let mut removed = 0;
        for key in self.keys()? {
            let matches_hash = hash.as_ref().map_or(true, |h| key.ends_with(h.as_str()));
            let matches_strategy = prefix.as_ref().map_or(true, |p| key.starts_with(p.as_str()));
            if matches_hash && matches_strategy {
                self.remove_entry(&key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Remove every entry.
    pub fn clear_all(&self) -> IngestResult<usize> {
        self.clear(None, None)
    }

    /// Describe the entries currently on disk.
    pub fn info(&self) -> IngestResult<CacheInfo> {
        let mut entries = Vec::new();
        let mut total_size = 0;

        for key in self.keys()? {
            let (artifact_path, metadata_path) = self.entry_paths(&key);
            let raw = match fs::read_to_string(&metadata_path) {
                Ok(raw) => raw,
                Err(_) => continue,
            };
            let Ok(metadata) = serde_json::from_str::<CacheMetadata>(&raw) else {
                continue;
            };
            let size_bytes = file_size(&artifact_path) + file_size(&metadata_path);
            total_size += size_bytes;
            entries.push(CacheEntryInfo {
                key,
                file_path: metadata.file_path,
                strategy: metadata.strategy,
                cached_at: metadata.cached_at,
                content_length: metadata.content_length,
                size_bytes,
            });
        }

        entries.sort_by(|a, b| b.cached_at.cmp(&a.cached_at));
        Ok(CacheInfo {
            cache_dir: self.root.clone(),
            entries,
            total_size,
        })
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }

    /// Keys of complete entries.
    fn keys(&self) -> IngestResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(self.root.join(METADATA_DIR))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn remove_entry(&self, key: &str) -> IngestResult<()> {
        let (artifact_path, metadata_path) = self.entry_paths(key);
        // Metadata first so a partial removal never leaves an entry that reads as present.
        for path in [metadata_path, artifact_path] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

fn sanitize_strategy(strategy: &str) -> String {
    strategy
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn write_atomic(target: &Path, bytes: &[u8]) -> IngestResult<()> {
    let dir = target
        .parent()
        .ok_or_else(|| IngestError::Cache(format!("no parent directory for {:?}", target)))?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(target)
        .map_err(|e| IngestError::Cache(format!("failed to persist {:?}: {}", target, e.error)))?;
    Ok(())
}
