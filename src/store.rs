//! Persisted record of which packages were installed through which manager.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{PaktError, Result};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingStore {
    #[serde(default)]
    pub package_managers: BTreeMap<String, Vec<String>>, // manager id -> packages, install order
}

impl TrackingStore {
    /// Appends `package` under `manager` unless already tracked there.
    /// Returns whether the store changed.
    pub fn add(&mut self, manager: &str, package: &str) -> bool {
        let list = self.package_managers.entry(manager.to_string()).or_default();
        if list.iter().any(|p| p == package) {
            return false;
        }
        list.push(package.to_string());
        true
    }

    /// Drops `package` from `manager`; a manager left with nothing is removed.
    pub fn remove(&mut self, manager: &str, package: &str) -> bool {
        let Some(list) = self.package_managers.get_mut(manager) else { return false };
        let Some(idx) = list.iter().position(|p| p == package) else { return false };
        list.remove(idx);
        if list.is_empty() {
            self.package_managers.remove(manager);
        }
        true
    }

    #[cfg(test)]
    pub fn packages(&self, manager: &str) -> &[String] {
        self.package_managers.get(manager).map(Vec::as_slice).unwrap_or_default()
    }

    /// Collapses repeated packages under a manager, keeping the first
    /// occurrence. Returns whether anything was dropped.
    pub fn dedup(&mut self) -> bool {
        let mut changed = false;
        for list in self.package_managers.values_mut() {
            let before = list.len();
            let mut seen = std::collections::HashSet::new();
            list.retain(|p| seen.insert(p.clone()));
            changed |= list.len() != before;
        }
        changed
    }

    pub fn is_empty(&self) -> bool {
        self.package_managers.values().all(Vec::is_empty)
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PaktError {
    let path = path.to_path_buf();
    move |source| PaktError::Persistence { path, source }
}

/// Location of the JSON store on disk.
#[derive(Debug, Clone)]
pub struct StoreFile {
    path: PathBuf,
}

impl StoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty store; unreadable or corrupt content is an error.
    pub fn load(&self) -> Result<TrackingStore> {
        let text = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no tracking store at {}, starting empty", self.path.display());
                return Ok(TrackingStore::default());
            }
            Err(e) => return Err(PaktError::Persistence { path: self.path.clone(), source: e }),
        };
        let mut store: TrackingStore =
            serde_json::from_str(&text).map_err(|e| PaktError::Parse { path: self.path.clone(), source: e })?;
        if store.dedup() {
            log::warn!("{} lists a package twice under one manager; using the first entry", self.path.display());
        }
        Ok(store)
    }

    /// Overwrites the store file as a whole: write a sibling temp file, then rename.
    pub fn save(&self, store: &TrackingStore) -> Result<()> {
        let dir = self.path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
        fs::create_dir_all(dir).map_err(io_err(dir))?;

        let mut content = serde_json::to_string_pretty(store)?;
        content.push('\n');

        let tmp = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp).map_err(io_err(&tmp))?;
        f.write_all(content.as_bytes()).map_err(io_err(&tmp))?;
        f.sync_all().map_err(io_err(&tmp))?;
        drop(f);
        fs::rename(&tmp, &self.path).map_err(io_err(&self.path))?;
        log::debug!("wrote tracking store {}", self.path.display());
        Ok(())
    }

    /// Load, apply `f`, and write back only if `f` reports a change.
    pub fn update<F>(&self, f: F) -> Result<bool>
    where
        F: FnOnce(&mut TrackingStore) -> bool,
    {
        let mut store = self.load()?;
        let changed = f(&mut store);
        if changed {
            self.save(&store)?;
        }
        Ok(changed)
    }
}
