//! Durable state: the fingerprint store and the local Markdown cache.
//!
//! ```text
//! articles_metadata.json    # id -> FingerprintRecord
//! articles/
//! ├── 360001.md
//! └── 360002.md
//! ```
//!
//! Both are plain files; deleting them forces a full re-sync.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::SyncError;
use crate::models::{ArticleId, FingerprintRecord};

/// Checkpoint of what content has already been pushed for each article.
///
/// Single writer: only the change-detection engine mutates it.
pub trait FingerprintStore {
    /// Replaces in-memory state with what is persisted.
    fn load(&mut self) -> Result<(), SyncError>;

    fn get(&self, id: &str) -> Option<&FingerprintRecord>;

    fn upsert(&mut self, id: &str, record: FingerprintRecord);

    /// Persists the whole store.
    fn save(&self) -> Result<(), SyncError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pretty-printed JSON file keyed by article id.
#[derive(Debug)]
pub struct JsonFingerprintStore {
    path: PathBuf,
    records: BTreeMap<String, FingerprintRecord>,
}

impl JsonFingerprintStore {
    /// Opens and loads the store; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let mut store = Self {
            path: path.into(),
            records: BTreeMap::new(),
        };
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FingerprintStore for JsonFingerprintStore {
    fn load(&mut self) -> Result<(), SyncError> {
        self.records = match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(SyncError::Io(e)),
        };
        Ok(())
    }

    fn get(&self, id: &str) -> Option<&FingerprintRecord> {
        self.records.get(id)
    }

    fn upsert(&mut self, id: &str, record: FingerprintRecord) {
        self.records.insert(id.to_string(), record);
    }

    /// Writes to a temp file then renames it over the target, so readers see
    /// either the old or the new store.
    fn save(&self) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(&self.records)?;
        let tmp = self.path.with_extension("tmp");
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// In-memory store; `save` is a no-op.
#[derive(Debug, Default, Clone)]
pub struct MemoryFingerprintStore {
    records: BTreeMap<String, FingerprintRecord>,
}

impl MemoryFingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FingerprintStore for MemoryFingerprintStore {
    fn load(&mut self) -> Result<(), SyncError> {
        Ok(())
    }

    fn get(&self, id: &str) -> Option<&FingerprintRecord> {
        self.records.get(id)
    }

    fn upsert(&mut self, id: &str, record: FingerprintRecord) {
        self.records.insert(id.to_string(), record);
    }

    fn save(&self) -> Result<(), SyncError> {
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Directory of one Markdown file per known article.
#[derive(Debug, Clone)]
pub struct ArticleCache {
    dir: PathBuf,
}

impl ArticleCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn filename_for(id: ArticleId) -> String {
        format!("{id}.md")
    }

    pub fn path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    pub fn write(&self, filename: &str, markdown: &str) -> Result<PathBuf, SyncError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(filename);
        fs::write(&path, markdown)?;
        Ok(path)
    }

    pub fn read(&self, filename: &str) -> Result<Vec<u8>, SyncError> {
        Ok(fs::read(self.path(filename))?)
    }

    /// Cached Markdown filenames, sorted. A missing directory lists nothing.
    pub fn list_markdown(&self) -> Result<Vec<String>, SyncError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SyncError::Io(e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("md") {
                if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
