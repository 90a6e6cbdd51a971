//! Live provider registry.
//!
//! [`ProviderRegistry`] holds every loaded [`Provider`] keyed by id, plus the
//! reverse mapping from definition file to id so a deleted or renamed file can
//! be unloaded. Both maps are concurrent; request handlers resolve while the
//! watcher loads and unloads without any lock held across an invocation.
//!
//! Resolved providers are `Arc` snapshots: replacing or removing an id never
//! invalidates a provider a request is already executing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use yuzu_common::paths::{default_provider_extensions, is_provider_file};
use yuzu_common::{Error, Result};

use super::definition::Provider;

/// How a load treats an id that is already registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Startup bulk load: the first file for an id wins, later ones are
    /// skipped.
    Initial,
    /// Hot reload: the new definition replaces the registered one.
    Reload,
}

/// Result of a successful [`ProviderRegistry::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(String),
    Replaced(String),
    /// Skipped because the id was already registered during an initial load.
    Duplicate(String),
}

impl LoadOutcome {
    pub fn id(&self) -> &str {
        match self {
            LoadOutcome::Loaded(id) | LoadOutcome::Replaced(id) | LoadOutcome::Duplicate(id) => id,
        }
    }
}

/// Concurrent collection of live providers.
#[derive(Debug)]
pub struct ProviderRegistry {
    providers: DashMap<String, Arc<Provider>>,
    paths: DashMap<PathBuf, String>,
    extensions: Vec<String>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new(default_provider_extensions())
    }
}

impl ProviderRegistry {
    /// Create an empty registry accepting files with the given extensions.
    pub fn new(extensions: Vec<String>) -> Self {
        Self {
            providers: DashMap::new(),
            paths: DashMap::new(),
            extensions,
        }
    }

    /// Allowed definition file extensions.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether `path` has an allowed definition extension.
    pub fn accepts(&self, path: &Path) -> bool {
        is_provider_file(path, &self.extensions)
    }

    /// Parse the definition at `path` and register it.
    ///
    /// On error the registry is left untouched.
    pub fn load(&self, path: &Path, mode: LoadMode) -> Result<LoadOutcome> {
        let provider = Arc::new(Provider::from_path(path)?);
        let id = provider.id.clone();

        match mode {
            LoadMode::Initial => {
                match self.providers.entry(id.clone()) {
                    Entry::Occupied(_) => {
                        warn!(
                            provider = %id,
                            path = %path.display(),
                            "duplicate provider id, skipping"
                        );
                        return Ok(LoadOutcome::Duplicate(id));
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(provider);
                    }
                }
                self.paths.insert(path.to_path_buf(), id.clone());
                info!(provider = %id, path = %path.display(), "provider loaded");
                Ok(LoadOutcome::Loaded(id))
            }
            LoadMode::Reload => {
                if let Some(previous) = self.paths.insert(path.to_path_buf(), id.clone()) {
                    if previous != id {
                        debug!(old = %previous, new = %id, path = %path.display(), "provider id changed");
                        self.release(&previous);
                    }
                }
                let replaced = self.providers.insert(id.clone(), provider).is_some();
                info!(provider = %id, path = %path.display(), replaced, "provider loaded");
                Ok(if replaced {
                    LoadOutcome::Replaced(id)
                } else {
                    LoadOutcome::Loaded(id)
                })
            }
        }
    }

    /// Forget the definition loaded from `path`.
    ///
    /// Returns the id it had produced. Paths never loaded are a no-op.
    pub fn unload(&self, path: &Path) -> Option<String> {
        let Some((_, id)) = self.paths.remove(path) else {
            debug!(path = %path.display(), "unload of untracked path ignored");
            return None;
        };
        self.release(&id);
        info!(provider = %id, path = %path.display(), "provider unloaded");
        Some(id)
    }

    /// Drop `id` unless another file still maps to it.
    fn release(&self, id: &str) {
        let still_owned = self.paths.iter().any(|entry| entry.value() == id);
        if !still_owned {
            self.providers.remove(id);
        }
    }

    /// Bulk-load every definition under `dirs` in [`LoadMode::Initial`].
    ///
    /// Missing directories and unparseable files are logged and skipped.
    /// Returns the number of providers registered.
    pub fn load_dirs(&self, dirs: &[PathBuf]) -> usize {
        let mut loaded = 0;
        for dir in dirs {
            if !dir.is_dir() {
                warn!(path = %dir.display(), "provider directory does not exist");
                continue;
            }

            let files = WalkDir::new(dir)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!(path = %dir.display(), error = %e, "error walking provider directory");
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file() && self.accepts(entry.path()));

            for entry in files {
                match self.load(entry.path(), LoadMode::Initial) {
                    Ok(LoadOutcome::Loaded(_)) => loaded += 1,
                    Ok(_) => {}
                    Err(e) => {
                        warn!(path = %entry.path().display(), error = %e, "skipping provider file");
                    }
                }
            }
        }
        info!(count = loaded, ids = ?self.ids(), "providers loaded");
        loaded
    }

    /// Register a provider that has no backing file, replacing any provider
    /// with the same id.
    pub fn insert(&self, provider: Provider) -> Option<Arc<Provider>> {
        self.providers.insert(provider.id.clone(), Arc::new(provider))
    }

    /// Remove `id` and every file mapping that produced it.
    pub fn remove(&self, id: &str) -> Option<Arc<Provider>> {
        let removed = self.providers.remove(id).map(|(_, p)| p);
        if removed.is_some() {
            self.paths.retain(|_, mapped| mapped.as_str() != id);
        }
        removed
    }

    /// Snapshot of the provider registered under `id`.
    pub fn resolve(&self, id: &str) -> Option<Arc<Provider>> {
        self.providers.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Like [`resolve`](Self::resolve), with a not-found error.
    pub fn get(&self, id: &str) -> Result<Arc<Provider>> {
        self.resolve(id).ok_or_else(|| Error::not_found("provider", id))
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Id produced by the file at `path`, if it is tracked.
    pub fn id_for_path(&self, path: &Path) -> Option<String> {
        self.paths.get(path).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
