//! Module discovery, loading, and the TTL/watch-invalidated cache.
//!
//! The registry owns an immutable snapshot of loaded modules. A refresh
//! loads every script file concurrently, then swaps the snapshot in one
//! step: readers either see the old map or the new one, never a half
//! update. One file failing to load only removes that module from the
//! result; it never aborts the refresh or reaches a caller.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use futures::future;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rhai::{Engine, FnAccess};
use tracing::{debug, info, warn};

use crate::signature::extract_signatures;
use crate::types::{Callable, EngineError, ModuleMap, ModuleRecord};

/// Default minimum age before a non-forced refresh re-scans disk
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
/// Default recognized script extension
pub const DEFAULT_EXTENSION: &str = "rhai";

/// Where and how the registry discovers modules
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Directory containing module script files
    pub script_dir: PathBuf,
    /// Minimum age before a non-forced refresh re-scans disk
    pub ttl: Duration,
    /// Recognized file extensions (without the dot)
    pub extensions: Vec<String>,
    /// Whether to watch the script directory for changes
    pub watch: bool,
}

impl RegistryConfig {
    pub fn new(script_dir: impl Into<PathBuf>) -> Self {
        Self {
            script_dir: script_dir.into(),
            ttl: DEFAULT_CACHE_TTL,
            extensions: vec![DEFAULT_EXTENSION.to_string()],
            watch: true,
        }
    }

    /// Builder: set the cache TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Builder: set the recognized extensions
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Builder: enable or disable the directory watcher
    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    fn recognizes(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|known| known == ext))
            .unwrap_or(false)
    }
}

struct CacheState {
    modules: ModuleMap,
    refreshed_at: Option<Instant>,
}

/// Registry of discovered modules with lazy, coalesced reload
pub struct ModuleRegistry {
    config: RegistryConfig,
    state: RwLock<CacheState>,
    /// Set by the watcher (or `invalidate`), consumed by the next refresh
    /// decision. Single writer, single reader, read-then-cleared atomically.
    dirty: Arc<AtomicBool>,
    _watcher: Option<RecommendedWatcher>,
}

impl ModuleRegistry {
    /// Create a registry for the configured script directory. Watch setup
    /// failure degrades to TTL-only invalidation.
    pub fn new(config: RegistryConfig) -> Self {
        let dirty = Arc::new(AtomicBool::new(false));
        let watcher = if config.watch {
            start_watcher(&config, Arc::clone(&dirty))
        } else {
            None
        };

        Self {
            config,
            state: RwLock::new(CacheState {
                modules: Arc::new(HashMap::new()),
                refreshed_at: None,
            }),
            dirty,
            _watcher: watcher,
        }
    }

    /// The registry's configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Mark the cache stale; the next `modules()` call will reload.
    /// The watcher uses this internally, and hosts without file events can
    /// call it directly.
    pub fn invalidate(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Current module snapshot, reloading from disk when forced, invalidated,
    /// older than the TTL, or empty. Within the TTL an unchanged cache is
    /// returned as-is with no disk access.
    pub async fn modules(&self, force_refresh: bool) -> ModuleMap {
        let invalidated = self.dirty.swap(false, Ordering::AcqRel);

        if !force_refresh && !invalidated {
            let state = self.state.read().unwrap();
            if !state.modules.is_empty() {
                if let Some(at) = state.refreshed_at {
                    if at.elapsed() < self.config.ttl {
                        return Arc::clone(&state.modules);
                    }
                }
            }
        }

        self.refresh().await
    }

    /// Enumerate, load everything concurrently, then swap the snapshot
    async fn refresh(&self) -> ModuleMap {
        let paths = self.enumerate().await;

        let loads = paths.into_iter().map(load_module);
        let results = future::join_all(loads).await;

        let mut map = HashMap::new();
        for result in results {
            match result {
                Ok(record) => {
                    debug!(
                        module = %record.name,
                        callables = record.callables.len(),
                        "module loaded"
                    );
                    map.insert(record.name.clone(), Arc::new(record));
                }
                Err(e) => warn!("{e}"),
            }
        }

        let map: ModuleMap = Arc::new(map);
        {
            let mut state = self.state.write().unwrap();
            state.modules = Arc::clone(&map);
            state.refreshed_at = Some(Instant::now());
        }
        info!(modules = map.len(), "module registry refreshed");
        map
    }

    async fn enumerate(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.config.script_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    dir = %self.config.script_dir.display(),
                    "cannot read script directory: {e}"
                );
                return paths;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.is_file() && self.config.recognizes(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        paths
    }
}

fn start_watcher(config: &RegistryConfig, dirty: Arc<AtomicBool>) -> Option<RecommendedWatcher> {
    let extensions = config.extensions.clone();
    let handler = move |event: notify::Result<Event>| match event {
        Ok(event) => {
            let recognized = event.paths.iter().any(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|ext| extensions.iter().any(|known| known == ext))
                    .unwrap_or(false)
            });
            let relevant = matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            );
            if recognized && relevant {
                dirty.store(true, Ordering::Release);
            }
        }
        Err(e) => warn!("module watcher error: {e}"),
    };

    match notify::recommended_watcher(handler) {
        Ok(mut watcher) => match watcher.watch(&config.script_dir, RecursiveMode::NonRecursive) {
            Ok(()) => Some(watcher),
            Err(e) => {
                warn!(
                    dir = %config.script_dir.display(),
                    "cannot watch script directory, falling back to TTL-only invalidation: {e}"
                );
                None
            }
        },
        Err(e) => {
            warn!("cannot create file watcher, falling back to TTL-only invalidation: {e}");
            None
        }
    }
}

/// Load one script file: read its source, compile it fresh (so edits always
/// take effect), enumerate its public functions, and extract signatures.
/// A module with zero callables is a load failure.
async fn load_module(path: PathBuf) -> Result<ModuleRecord, EngineError> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let load_error = |reason: String| EngineError::Load {
        module: name.clone(),
        reason,
    };

    let source = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| load_error(e.to_string()))?;

    let engine = Engine::new();
    let ast = engine
        .compile(&source)
        .map_err(|e| load_error(e.to_string()))?;
    let ast = Arc::new(ast);

    let mut callable_names: Vec<String> = ast
        .iter_functions()
        .filter(|f| f.access == FnAccess::Public)
        .map(|f| f.name.to_string())
        .collect();
    callable_names.sort();
    callable_names.dedup();

    if callable_names.is_empty() {
        return Err(load_error("no callable functions found".to_string()));
    }

    let signatures = extract_signatures(&source, &callable_names, &name);

    let callables = callable_names
        .iter()
        .map(|fn_name| {
            (
                fn_name.clone(),
                Callable::new(fn_name.clone(), Arc::clone(&ast)),
            )
        })
        .collect();

    Ok(ModuleRecord {
        name,
        path,
        callables,
        signatures,
        loaded_at: Instant::now(),
    })
}
