//! User options and the settings store they live in.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::protocol::DEFAULT_BLOCK_SIZE;

/// Group holding [`EffectOptions`] in a [`SettingsStore`].
pub const OPTIONS_GROUP: &str = "Options";

const KEY_BUFFER_SIZE: &str = "BufferSize";
const KEY_USE_LATENCY: &str = "UseLatency";
const KEY_USE_GUI: &str = "UseGUI";

/// Persistent key/value settings shared by every effect of one plugin.
///
/// The backend is supplied by the host; values are opaque bytes grouped by
/// a slash-free group name.
pub trait SettingsStore: Send + Sync {
    fn get(&self, group: &str, key: &str) -> Option<Vec<u8>>;

    fn set(&self, group: &str, key: &str, value: Vec<u8>);

    fn remove(&self, group: &str, key: &str) -> bool;

    /// Keys present in `group`, in no particular order.
    fn keys(&self, group: &str) -> Vec<String>;
}

/// In-process [`SettingsStore`], used by tests and hosts without a backend.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    entries: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, group: &str, key: &str) -> Option<Vec<u8>> {
        self.entries
            .read()
            .get(&(group.to_string(), key.to_string()))
            .cloned()
    }

    fn set(&self, group: &str, key: &str, value: Vec<u8>) {
        self.entries
            .write()
            .insert((group.to_string(), key.to_string()), value);
    }

    fn remove(&self, group: &str, key: &str) -> bool {
        self.entries
            .write()
            .remove(&(group.to_string(), key.to_string()))
            .is_some()
    }

    fn keys(&self, group: &str) -> Vec<String> {
        self.entries
            .read()
            .keys()
            .filter(|(g, _)| g == group)
            .map(|(_, k)| k.clone())
            .collect()
    }
}

/// Per-plugin options the user can change from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectOptions {
    /// Ceiling for the negotiated block size. Never below 1.
    #[serde(rename = "BufferSize")]
    pub buffer_size: usize,
    /// Report the plugin's latency to the host.
    #[serde(rename = "UseLatency")]
    pub use_latency: bool,
    /// Prefer the plugin's own editor over the plain parameter list.
    #[serde(rename = "UseGUI")]
    pub use_gui: bool,
}

impl Default for EffectOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BLOCK_SIZE,
            use_latency: true,
            use_gui: true,
        }
    }
}

impl EffectOptions {
    /// Read options from `store`, falling back to defaults for missing or
    /// unparsable entries.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();
        Self {
            buffer_size: read_value(store, KEY_BUFFER_SIZE)
                .unwrap_or(defaults.buffer_size)
                .max(1),
            use_latency: read_value(store, KEY_USE_LATENCY).unwrap_or(defaults.use_latency),
            use_gui: read_value(store, KEY_USE_GUI).unwrap_or(defaults.use_gui),
        }
    }

    pub fn save(&self, store: &dyn SettingsStore) {
        write_value(store, KEY_BUFFER_SIZE, self.buffer_size.max(1));
        write_value(store, KEY_USE_LATENCY, self.use_latency);
        write_value(store, KEY_USE_GUI, self.use_gui);
    }
}

// Stored as text so other tools reading the backend can make sense of it.
fn read_value<T: std::str::FromStr>(store: &dyn SettingsStore, key: &str) -> Option<T> {
    let raw = store.get(OPTIONS_GROUP, key)?;
    std::str::from_utf8(&raw).ok()?.trim().parse().ok()
}

fn write_value<T: ToString>(store: &dyn SettingsStore, key: &str, value: T) {
    store.set(OPTIONS_GROUP, key, value.to_string().into_bytes());
}
