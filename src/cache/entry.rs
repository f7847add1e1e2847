//! Entry Store Module
//!
//! Persists cache entries on disk, one file per `(category, digest)` address.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::cache::envelope::Envelope;
use crate::error::{CacheError, Result};

/// File extension for serialized entries.
const ENTRY_EXT: &str = "json";

// == Entry Info ==
/// Address and metadata of a single stored entry.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Category partition the entry lives in
    pub category: String,
    /// Digest the entry is addressed by
    pub digest: String,
    /// Serialized size on disk in bytes
    pub size_bytes: u64,
    /// Last modification time, refreshed on every write
    pub modified_at: DateTime<Utc>,
}

// == Entry Store ==
/// Durable storage for cache entries under a root directory.
///
/// Each category maps to one subdirectory of the root, created lazily on
/// first write, and each entry to one file named by its digest. The store
/// exclusively owns the files below its root.
#[derive(Debug, Clone)]
pub struct EntryStore {
    root: PathBuf,
}

impl EntryStore {
    // == Constructor ==
    /// Creates a store rooted at `root`. The directory itself is not created
    /// until the first write needs it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn category_dir(&self, category: &str) -> PathBuf {
        self.root.join(category)
    }

    fn entry_path(&self, category: &str, digest: &str) -> PathBuf {
        self.category_dir(category)
            .join(format!("{digest}.{ENTRY_EXT}"))
    }

    // == Write ==
    /// Writes an envelope under `(category, digest)`, creating the category
    /// partition if absent.
    ///
    /// The bytes go to a temporary file in the same partition first and are
    /// renamed over the final path, so a concurrent reader observes either
    /// the previous entry or the new one, never a partial file.
    pub fn write(&self, category: &str, digest: &str, envelope: &Envelope) -> Result<()> {
        let dir = self.category_dir(category);
        fs::create_dir_all(&dir).map_err(|source| CacheError::Storage {
            path: dir.clone(),
            source,
        })?;

        let path = self.entry_path(category, digest);
        let bytes = serde_json::to_vec(envelope).map_err(|e| CacheError::Storage {
            path: path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|source| CacheError::Storage {
            path: dir.clone(),
            source,
        })?;
        tmp.write_all(&bytes).map_err(|source| CacheError::Storage {
            path: tmp.path().to_path_buf(),
            source,
        })?;
        tmp.persist(&path).map_err(|e| CacheError::Storage {
            path: path.clone(),
            source: e.error,
        })?;

        Ok(())
    }

    // == Read ==
    /// Reads the envelope stored under `(category, digest)`.
    ///
    /// Returns `Ok(None)` when no entry exists. A file that exists but does
    /// not decode as a current-version envelope is reported as
    /// `CacheError::CorruptEntry`.
    pub fn read(&self, category: &str, digest: &str) -> Result<Option<Envelope>> {
        let path = self.entry_path(category, digest);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Storage { path, source }),
        };

        let envelope: Envelope =
            serde_json::from_slice(&bytes).map_err(|e| CacheError::CorruptEntry {
                category: category.to_string(),
                digest: digest.to_string(),
                reason: e.to_string(),
            })?;

        if !envelope.is_current() {
            return Err(CacheError::CorruptEntry {
                category: category.to_string(),
                digest: digest.to_string(),
                reason: format!("unsupported envelope version {}", envelope.version),
            });
        }

        Ok(Some(envelope))
    }

    // == Delete ==
    /// Removes the entry, reporting whether one existed.
    pub fn delete(&self, category: &str, digest: &str) -> Result<bool> {
        let path = self.entry_path(category, digest);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Storage { path, source }),
        }
    }

    // == Exists ==
    /// Whether an entry file is present under `(category, digest)`.
    pub fn exists(&self, category: &str, digest: &str) -> bool {
        self.entry_path(category, digest).is_file()
    }

    // == Entry Info ==
    /// Size and modification metadata for one entry, `None` when absent.
    pub fn entry_info(&self, category: &str, digest: &str) -> Result<Option<EntryInfo>> {
        let path = self.entry_path(category, digest);
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Storage { path, source }),
        };
        let modified = metadata.modified().map_err(|source| CacheError::Storage {
            path: path.clone(),
            source,
        })?;

        Ok(Some(EntryInfo {
            category: category.to_string(),
            digest: digest.to_string(),
            size_bytes: metadata.len(),
            modified_at: DateTime::<Utc>::from(modified),
        }))
    }

    // == List All ==
    /// Enumerates every entry in every category.
    ///
    /// Entries that vanish mid-walk (a concurrent invalidation or eviction)
    /// are skipped rather than reported as errors.
    pub fn list_all(&self) -> Result<Vec<EntryInfo>> {
        let mut entries = Vec::new();
        for category in self.categories()? {
            let dir = self.category_dir(&category);
            let reader = match fs::read_dir(&dir) {
                Ok(reader) => reader,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(CacheError::Storage { path: dir, source }),
            };
            for dir_entry in reader.flatten() {
                let path = dir_entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXT) {
                    continue;
                }
                let digest = match path.file_stem().and_then(|s| s.to_str()) {
                    Some(stem) => stem.to_string(),
                    None => continue,
                };
                let metadata = match dir_entry.metadata() {
                    Ok(metadata) => metadata,
                    Err(_) => continue,
                };
                let modified = match metadata.modified() {
                    Ok(modified) => modified,
                    Err(_) => continue,
                };
                entries.push(EntryInfo {
                    category: category.clone(),
                    digest,
                    size_bytes: metadata.len(),
                    modified_at: DateTime::<Utc>::from(modified),
                });
            }
        }
        Ok(entries)
    }

    // == Categories ==
    /// Category partitions currently present on disk.
    pub fn categories(&self) -> Result<Vec<String>> {
        let reader = match fs::read_dir(&self.root) {
            Ok(reader) => reader,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(CacheError::Storage {
                    path: self.root.clone(),
                    source,
                })
            }
        };

        let mut categories = Vec::new();
        for dir_entry in reader.flatten() {
            if dir_entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                if let Some(name) = dir_entry.file_name().to_str() {
                    categories.push(name.to_string());
                }
            }
        }
        Ok(categories)
    }

    // == Clear Category ==
    /// Deletes every entry file in one category, keeping the partition
    /// directory itself. Returns the number of entries removed.
    pub fn clear_category(&self, category: &str) -> Result<usize> {
        let dir = self.category_dir(category);
        let reader = match fs::read_dir(&dir) {
            Ok(reader) => reader,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(source) => return Err(CacheError::Storage { path: dir, source }),
        };

        let mut removed = 0;
        for dir_entry in reader.flatten() {
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXT) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(CacheError::Storage { path, source }),
            }
        }
        Ok(removed)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_envelope() -> Envelope {
        Envelope::new(json!({"story": "Once, in Madurai"}))
    }

    #[test]
    fn test_write_creates_partition_lazily() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path());

        assert!(!temp.path().join("stories").exists());
        store.write("stories", "abc", &sample_envelope()).unwrap();
        assert!(temp.path().join("stories").is_dir());
        assert!(store.exists("stories", "abc"));
    }

    #[test]
    fn test_write_read_roundtrip() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path());
        let envelope = sample_envelope();

        store.write("stories", "abc", &envelope).unwrap();
        let read = store.read("stories", "abc").unwrap().unwrap();
        assert_eq!(read.payload, envelope.payload);
    }

    #[test]
    fn test_read_absent_entry() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path());
        assert!(store.read("stories", "missing").unwrap().is_none());
    }

    #[test]
    fn test_same_digest_different_categories_do_not_collide() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path());

        store
            .write("stories", "abc", &Envelope::new(json!("a story")))
            .unwrap();
        store
            .write("images", "abc", &Envelope::new(json!(["url1"])))
            .unwrap();

        let story = store.read("stories", "abc").unwrap().unwrap();
        let image = store.read("images", "abc").unwrap().unwrap();
        assert_eq!(story.payload, json!("a story"));
        assert_eq!(image.payload, json!(["url1"]));
    }

    #[test]
    fn test_delete_reports_presence() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path());

        store.write("stories", "abc", &sample_envelope()).unwrap();
        assert!(store.delete("stories", "abc").unwrap());
        assert!(!store.delete("stories", "abc").unwrap());
        assert!(!store.exists("stories", "abc"));
    }

    #[test]
    fn test_read_corrupt_entry() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path());

        fs::create_dir_all(temp.path().join("stories")).unwrap();
        fs::write(temp.path().join("stories/bad.json"), b"not json {{").unwrap();

        let result = store.read("stories", "bad");
        assert!(matches!(result, Err(CacheError::CorruptEntry { .. })));
    }

    #[test]
    fn test_read_unsupported_envelope_version() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path());

        fs::create_dir_all(temp.path().join("stories")).unwrap();
        fs::write(
            temp.path().join("stories/old.json"),
            br#"{"version": 99, "created_at": "2024-01-01T00:00:00Z", "payload": null}"#,
        )
        .unwrap();

        let result = store.read("stories", "old");
        assert!(matches!(result, Err(CacheError::CorruptEntry { .. })));
    }

    #[test]
    fn test_entry_info_reports_size() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path());

        store.write("stories", "abc", &sample_envelope()).unwrap();
        let info = store.entry_info("stories", "abc").unwrap().unwrap();
        let on_disk = fs::metadata(temp.path().join("stories/abc.json")).unwrap();
        assert_eq!(info.size_bytes, on_disk.len());
        assert_eq!(info.category, "stories");
        assert_eq!(info.digest, "abc");
    }

    #[test]
    fn test_entry_info_absent() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path());
        assert!(store.entry_info("stories", "missing").unwrap().is_none());
    }

    #[test]
    fn test_list_all_spans_categories() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path());

        store.write("stories", "s1", &sample_envelope()).unwrap();
        store.write("stories", "s2", &sample_envelope()).unwrap();
        store.write("images", "i1", &sample_envelope()).unwrap();

        let mut listed: Vec<(String, String)> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|e| (e.category, e.digest))
            .collect();
        listed.sort();
        assert_eq!(
            listed,
            vec![
                ("images".to_string(), "i1".to_string()),
                ("stories".to_string(), "s1".to_string()),
                ("stories".to_string(), "s2".to_string()),
            ]
        );
    }

    #[test]
    fn test_list_all_on_missing_root() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path().join("never-created"));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_list_all_ignores_foreign_files() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path());

        store.write("stories", "s1", &sample_envelope()).unwrap();
        fs::write(temp.path().join("stories/notes.txt"), b"scratch").unwrap();

        let listed = store.list_all().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].digest, "s1");
    }

    #[test]
    fn test_clear_category_keeps_partition() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path());

        store.write("stories", "s1", &sample_envelope()).unwrap();
        store.write("stories", "s2", &sample_envelope()).unwrap();

        let removed = store.clear_category("stories").unwrap();
        assert_eq!(removed, 2);
        assert!(temp.path().join("stories").is_dir());
        assert!(!store.exists("stories", "s1"));
    }

    #[test]
    fn test_clear_missing_category() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path());
        assert_eq!(store.clear_category("nothing-here").unwrap(), 0);
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let temp = tempdir().unwrap();
        let store = EntryStore::new(temp.path());

        store
            .write("stories", "abc", &Envelope::new(json!("first")))
            .unwrap();
        store
            .write("stories", "abc", &Envelope::new(json!("second")))
            .unwrap();

        let read = store.read("stories", "abc").unwrap().unwrap();
        assert_eq!(read.payload, json!("second"));
    }
}
