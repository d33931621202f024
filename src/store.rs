//! Small string key-value store standing in for browser local storage.
//!
//! The theme override and the saved note are the only values persisted.
//! `MemoryStore` backs tests; `FileStore` keeps a flat TOML table on disk and
//! replaces the file atomically on every write, so a reader sees either the
//! old table or the new one and never one override key without the other.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::logger::Log;

/// Minimal key-value interface over string keys and values.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    /// Write several keys as one update.
    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<()>;

    /// Remove several keys as one update. Missing keys are ignored.
    fn remove_all(&mut self, keys: &[&str]) -> Result<()>;

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_all(&[(key, value)])
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.remove_all(&[key])
    }
}

/// In-memory store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_all(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }
}

/// Store persisted as a TOML table of strings.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Default location: `$XDG_DATA_HOME/together/store.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir().context("Could not determine data directory")?;
        Ok(data_dir.join("together").join("store.toml"))
    }

    pub fn open_default() -> Result<Self> {
        Self::open(&Self::default_path()?)
    }

    /// Open a store file. A missing file is an empty store; an unreadable
    /// table is reported and treated as empty.
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read store from {}", path.display()))?;
            match toml::from_str::<BTreeMap<String, String>>(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    Log::log_warning(&format!(
                        "Ignoring unreadable store {}: {}",
                        path.display(),
                        e
                    ));
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let dir = self
            .path
            .parent()
            .context("Store path has no parent directory")?;
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create store directory {}", dir.display()))?;

        let content =
            toml::to_string(&self.entries).context("Failed to serialize store contents")?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        tmp.write_all(content.as_bytes())
            .context("Failed to write store contents")?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace store {}", self.path.display()))?;

        Log::log_debug(&format!("Store written to {}", self.path.display()));
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), (*value).to_string());
        }
        self.persist()
    }

    fn remove_all(&mut self, keys: &[&str]) -> Result<()> {
        let before = self.entries.len();
        for key in keys {
            self.entries.remove(*key);
        }
        if self.entries.len() == before {
            return Ok(());
        }
        self.persist()
    }
}
