//! Storage backends for the two settings tiers.
//!
//! The local tier is a synchronous string key/value store (one entry per
//! setting). The remote tier holds one flat JSON document per account and
//! only ever receives partial merges.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::prelude::HashMap;
use crate::{Error, Result};

/// Device-local key/value tier.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Account-scoped tier.
#[async_trait]
pub trait RemoteSettingsStore: Send + Sync {
    /// Whole settings document of `account`, `None` if it has none yet
    async fn fetch(&self, account: &str) -> Result<Option<Map<String, Value>>>;

    /// Merges `patch` into the document, leaving every other field untouched
    async fn merge(&self, account: &str, patch: Map<String, Value>) -> Result<()>;
}

fn lock_poisoned(what: &str) -> Error {
    Error::Settings(format!("{what} lock poisoned"))
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| lock_poisoned("memory store"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| lock_poisoned("memory store"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| lock_poisoned("memory store"))?;
        entries.remove(key);
        Ok(())
    }
}

/// Local tier backed by a JSON object file of string entries.
///
/// The file is re-read on every access so several processes may share it;
/// writes go through a temporary file and a rename.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&text)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Settings(format!(
                "{} does not hold an object: {}",
                self.path.display(),
                other
            ))),
        }
    }

    fn write_all(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| lock_poisoned("file store"))?;
        let mut entries = self.read_all()?;
        apply(&mut entries);
        self.write_all(&entries)
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), Value::String(value.to_string()));
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// In-memory remote tier, counting calls. Used by tests and the demo app.
#[derive(Default)]
pub struct MemoryRemoteStore {
    documents: Mutex<HashMap<String, Map<String, Value>>>,
    fetches: AtomicUsize,
    merges: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail until reset
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn merge_count(&self) -> usize {
        self.merges.load(Ordering::SeqCst)
    }

    pub fn document(&self, account: &str) -> Option<Map<String, Value>> {
        self.documents
            .lock()
            .ok()
            .and_then(|docs| docs.get(account).cloned())
    }

    pub fn insert_document(&self, account: &str, document: Map<String, Value>) {
        if let Ok(mut docs) = self.documents.lock() {
            docs.insert(account.to_string(), document);
        }
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Settings("remote settings unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSettingsStore for MemoryRemoteStore {
    async fn fetch(&self, account: &str) -> Result<Option<Map<String, Value>>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let docs = self.documents.lock().map_err(|_| lock_poisoned("remote store"))?;
        Ok(docs.get(account).cloned())
    }

    async fn merge(&self, account: &str, patch: Map<String, Value>) -> Result<()> {
        self.merges.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut docs = self.documents.lock().map_err(|_| lock_poisoned("remote store"))?;
        docs.entry(account.to_string()).or_default().extend(patch);
        Ok(())
    }
}
