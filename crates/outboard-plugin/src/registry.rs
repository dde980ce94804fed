//! Plugin registry.
//!
//! Owns every module the host has loaded, keyed by module path, so effects
//! created from the same file share one library. Hosts create one registry
//! at startup and call [`PluginRegistry::shutdown`] when tearing down.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::effect::Effect;
use crate::error::{BridgeError, Result};
use crate::metadata::{ClassId, ClassInfo};
use crate::module::{ModuleBinding, PluginModule};
use crate::options::SettingsStore;

pub struct PluginRegistry {
    binding: Box<dyn ModuleBinding>,
    search_paths: Vec<PathBuf>,
    modules: RwLock<HashMap<PathBuf, Arc<PluginModule>>>,
}

impl PluginRegistry {
    pub fn new(binding: impl ModuleBinding + 'static) -> Self {
        Self {
            binding: Box::new(binding),
            search_paths: default_search_paths(),
            modules: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the platform search paths.
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn family(&self) -> &str {
        self.binding.family()
    }

    /// Check if a path has one of the binding's module extensions
    pub fn is_plugin_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.binding
                    .extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }

    /// Register a module that did not come from [`load_module`](Self::load_module),
    /// typically a factory linked into the host.
    pub fn register_module(&self, module: Arc<PluginModule>) -> Arc<PluginModule> {
        tracing::info!(
            "Registered {} module {} ({} classes)",
            module.family(),
            module.path().display(),
            module.classes().len()
        );
        self.modules
            .write()
            .insert(module.path().to_path_buf(), Arc::clone(&module));
        module
    }

    /// Load `path`, or return the already registered module for it.
    pub fn load_module(&self, path: &Path) -> Result<Arc<PluginModule>> {
        if let Some(module) = self.modules.read().get(path) {
            return Ok(Arc::clone(module));
        }

        let module = Arc::new(PluginModule::load(path, self.binding.as_ref())?);
        let mut modules = self.modules.write();
        // Another thread may have won the race while the library was loading.
        let entry = modules
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::clone(&module));
        Ok(Arc::clone(entry))
    }

    pub fn module(&self, path: &Path) -> Option<Arc<PluginModule>> {
        self.modules.read().get(path).cloned()
    }

    /// Drop the registry's reference to a module. Effects still holding it
    /// keep the library loaded.
    pub fn unregister(&self, path: &Path) -> bool {
        self.modules.write().remove(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }

    /// Module files directly inside `dir`, sorted by path.
    pub fn scan_directory(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(BridgeError::NotADirectory(dir.to_path_buf()));
        }

        let mut found = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if self.is_plugin_file(&path) {
                found.push(path);
            }
        }
        found.sort();
        Ok(found)
    }

    /// Scan every existing search path.
    pub fn scan_search_paths(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for dir in &self.search_paths {
            if !dir.exists() {
                continue;
            }
            match self.scan_directory(dir) {
                Ok(mut paths) => found.append(&mut paths),
                Err(e) => tracing::warn!("Failed to scan {}: {}", dir.display(), e),
            }
        }
        tracing::info!("Found {} {} modules", found.len(), self.family());
        found
    }

    /// Load every module in `dir`, skipping the ones that fail.
    pub fn load_directory(&self, dir: &Path) -> Result<Vec<Arc<PluginModule>>> {
        let mut loaded = Vec::new();
        for path in self.scan_directory(dir)? {
            match self.load_module(&path) {
                Ok(module) => loaded.push(module),
                Err(e) => tracing::warn!("Failed to load {}: {}", path.display(), e),
            }
        }
        Ok(loaded)
    }

    /// Every class of every registered module, ordered by module path.
    pub fn classes(&self) -> Vec<(PathBuf, ClassInfo)> {
        let modules = self.modules.read();
        let mut classes: Vec<(PathBuf, ClassInfo)> = modules
            .values()
            .flat_map(|module| {
                module
                    .classes()
                    .into_iter()
                    .map(move |class| (module.path().to_path_buf(), class))
            })
            .collect();
        classes.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
        classes
    }

    pub fn create_effect(
        &self,
        path: &Path,
        class_id: &ClassId,
        store: Arc<dyn SettingsStore>,
    ) -> Result<Effect> {
        let module = self.load_module(path)?;
        Effect::new(module, class_id, store)
    }

    /// Release every module. Effects still alive keep theirs.
    pub fn shutdown(&self) {
        let released = std::mem::take(&mut *self.modules.write());
        tracing::info!("Plugin registry shut down ({} modules)", released.len());
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("family", &self.family())
            .field("search_paths", &self.search_paths)
            .field("modules", &self.len())
            .finish()
    }
}

/// Standard VST3 locations for the current platform
pub fn default_search_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Library/Audio/Plug-Ins/VST3"),
            PathBuf::from(format!(
                "{}/Library/Audio/Plug-Ins/VST3",
                std::env::var("HOME").unwrap_or_default()
            )),
        ]
    }

    #[cfg(target_os = "windows")]
    {
        vec![
            PathBuf::from("C:\\Program Files\\Common Files\\VST3"),
            PathBuf::from("C:\\Program Files (x86)\\Common Files\\VST3"),
        ]
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![
            PathBuf::from("/usr/lib/vst3"),
            PathBuf::from("/usr/local/lib/vst3"),
            PathBuf::from(format!(
                "{}/.vst3",
                std::env::var("HOME").unwrap_or_default()
            )),
        ]
    }
}
