//! Effect settings and preset files.
//!
//! The bridge never interprets plugin state. Settings and presets carry the
//! component and controller state blobs exactly as the plugin produced them;
//! this module only frames them for storage.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::metadata::{ClassId, ClassInfo};

/// File extension of preset files, without the dot.
pub const PRESET_EXTENSION: &str = "vstpreset";

/// Leading bytes of every preset stream.
pub const PRESET_MAGIC: &[u8; 4] = b"OBPR";

/// Current preset stream version.
pub const PRESET_VERSION: u32 = 1;

/// Group prefix for named user presets in a [`SettingsStore`](crate::SettingsStore).
pub const USER_PRESETS_GROUP: &str = "UserPresets";

/// Serialized state of one effect instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectSettings {
    pub processor_state: Vec<u8>,
    pub controller_state: Vec<u8>,
}

impl EffectSettings {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Payload of a preset stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetChunk {
    pub class_id: ClassId,
    pub processor_state: Vec<u8>,
    pub controller_state: Vec<u8>,
}

impl PresetChunk {
    pub fn new(class_id: ClassId, settings: EffectSettings) -> Self {
        Self {
            class_id,
            processor_state: settings.processor_state,
            controller_state: settings.controller_state,
        }
    }

    pub fn into_settings(self) -> EffectSettings {
        EffectSettings {
            processor_state: self.processor_state,
            controller_state: self.controller_state,
        }
    }
}

pub fn write_preset<W: Write>(writer: &mut W, chunk: &PresetChunk) -> Result<()> {
    writer.write_all(PRESET_MAGIC)?;
    writer.write_all(&PRESET_VERSION.to_le_bytes())?;
    bincode::serialize_into(&mut *writer, chunk)?;
    writer.flush()?;
    Ok(())
}

pub fn read_preset<R: Read>(reader: &mut R) -> Result<PresetChunk> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != PRESET_MAGIC {
        return Err(BridgeError::PresetFormat("bad magic".into()));
    }

    let mut version = [0u8; 4];
    reader.read_exact(&mut version)?;
    let version = u32::from_le_bytes(version);
    if version != PRESET_VERSION {
        return Err(BridgeError::PresetFormat(format!(
            "unsupported version {}",
            version
        )));
    }

    Ok(bincode::deserialize_from(reader)?)
}

/// Replace characters that cannot appear in a directory name.
pub fn sanitize_path_component(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '\\' | '*' | '?' | '/' | ':' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

/// `<base>/<vendor>/<name>` for `class`.
pub fn factory_presets_dir(base: &Path, class: &ClassInfo) -> PathBuf {
    base.join(sanitize_path_component(&class.vendor))
        .join(sanitize_path_component(&class.name))
}

/// Preset names (file stems) found in `dir`, sorted.
///
/// A missing directory yields no presets.
pub fn scan_factory_presets(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(PRESET_EXTENSION))
        .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
        .collect();
    names.sort();
    names
}

/// System-wide factory preset location for the current platform.
pub fn default_factory_presets_base() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        PathBuf::from("/Library/Audio/Presets")
    }

    #[cfg(target_os = "windows")]
    {
        PathBuf::from(format!(
            "{}\\VST3 Presets",
            std::env::var("PROGRAMDATA").unwrap_or_else(|_| "C:\\ProgramData".into())
        ))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        PathBuf::from("/usr/local/share/vst3/presets")
    }
}
