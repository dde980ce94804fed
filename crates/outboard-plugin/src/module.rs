//! Loaded plugin module.
//!
//! A module owns the dynamic library a plugin was loaded from together with
//! the class factory it exports. It is shared through `Arc` by every effect
//! instance created from it, so the library stays mapped until the last
//! instance is gone.

use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::info;

use crate::error::{BridgeError, LoadStage, Result};
use crate::instance::{PluginFactory, PluginParts};
use crate::metadata::{ClassId, ClassInfo, FactoryInfo};

/// Adapts a loaded library of one plugin format to [`PluginFactory`].
pub trait ModuleBinding: Send + Sync {
    /// Family symbol reported for effects of this format, e.g. `"VST3"`.
    fn family(&self) -> &str;

    /// Extensions (without the dot) of module files this binding opens.
    fn extensions(&self) -> &[&str];

    /// Path of the loadable binary inside a module bundle.
    fn binary_path(&self, module: &Path) -> PathBuf {
        module.to_path_buf()
    }

    /// Resolve the factory entry point of `library`.
    ///
    /// # Safety
    /// `library` must be a module of the format this binding implements;
    /// the binding calls its exported entry points.
    unsafe fn bind(&self, library: &Library, module: &Path) -> Result<Box<dyn PluginFactory>>;
}

pub struct PluginModule {
    path: PathBuf,
    family: String,
    // Declared before `library` so the factory is dropped first.
    factory: Box<dyn PluginFactory>,
    library: Option<Library>,
}

impl PluginModule {
    /// Load a module from disk through `binding`.
    ///
    /// Opening the library runs its initialisers, so only trusted plugin
    /// directories should be handed to this.
    pub fn load(path: &Path, binding: &dyn ModuleBinding) -> Result<Self> {
        let binary = binding.binary_path(path);
        let library = unsafe {
            Library::new(&binary).map_err(|e| BridgeError::LoadFailed {
                path: path.to_path_buf(),
                stage: LoadStage::Opening,
                reason: e.to_string(),
            })?
        };
        let factory = unsafe { binding.bind(&library, path)? };

        info!(
            "Loaded {} module {} ({} classes)",
            binding.family(),
            path.display(),
            factory.classes().len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            family: binding.family().to_string(),
            factory,
            library: Some(library),
        })
    }

    /// Wrap a factory that is linked into the host process.
    pub fn from_factory(path: impl AsRef<Path>, factory: Box<dyn PluginFactory>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            family: "VST3".to_string(),
            factory,
            library: None,
        }
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn is_dynamic(&self) -> bool {
        self.library.is_some()
    }

    pub fn factory_info(&self) -> FactoryInfo {
        self.factory.factory_info()
    }

    pub fn classes(&self) -> Vec<ClassInfo> {
        self.factory.classes()
    }

    pub fn class_info(&self, id: &ClassId) -> Option<ClassInfo> {
        self.factory.classes().into_iter().find(|c| c.id == *id)
    }

    pub fn create_instance(&self, id: &ClassId) -> Result<PluginParts> {
        self.factory
            .create_instance(id)
            .map_err(|code| BridgeError::plugin(LoadStage::Instantiation, code))
    }
}

impl std::fmt::Debug for PluginModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginModule")
            .field("path", &self.path)
            .field("family", &self.family)
            .field("dynamic", &self.is_dynamic())
            .finish()
    }
}
