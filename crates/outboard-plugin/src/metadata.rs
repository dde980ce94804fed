//! Plugin identity as read from a module's factory.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Sub-category string of generator plugins.
pub const SUB_CATEGORY_GENERATOR: &str = "Fx|Generator";

/// Sub-category tag shared by all effect plugins.
pub const SUB_CATEGORY_FX: &str = "Fx";

/// 128-bit class identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub [u8; 16]);

impl ClassId {
    /// Parse the 32 hex digit form produced by `Display`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Factory-level vendor information.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryInfo {
    pub vendor: String,
    pub url: String,
    pub email: String,
}

/// Immutable description of one plugin class exported by a module.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub id: ClassId,
    pub name: String,
    pub vendor: String,
    pub version: String,
    pub sub_categories: Vec<String>,
}

impl ClassInfo {
    pub fn new(id: ClassId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            vendor: String::new(),
            version: "1.0.0".to_string(),
            sub_categories: vec![SUB_CATEGORY_FX.to_string()],
        }
    }

    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set sub-categories from the `|`-separated form.
    pub fn sub_categories(mut self, categories: &str) -> Self {
        self.sub_categories = categories
            .split('|')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    pub fn sub_categories_string(&self) -> String {
        self.sub_categories.join("|")
    }

    pub fn effect_type(&self) -> EffectType {
        if self.sub_categories_string() == SUB_CATEGORY_GENERATOR {
            EffectType::Generate
        } else if self.sub_categories.iter().any(|c| c == SUB_CATEGORY_FX) {
            EffectType::Process
        } else {
            EffectType::None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectType {
    None,
    Generate,
    Process,
}

/// Host-visible plugin path: `<module path>;<class id>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PluginPath {
    pub module: PathBuf,
    pub class_id: ClassId,
}

impl PluginPath {
    pub fn new(module: impl AsRef<Path>, class_id: ClassId) -> Self {
        Self {
            module: module.as_ref().to_path_buf(),
            class_id,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let (module, id) = s.rsplit_once(';')?;
        if module.is_empty() {
            return None;
        }
        Some(Self {
            module: PathBuf::from(module),
            class_id: ClassId::parse(id)?,
        })
    }
}

impl fmt::Display for PluginPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.module.display(), self.class_id)
    }
}
