//! # Outboard - audio plugin host bridge
//!
//! Hosts binary audio plugins inside an audio application.
//!
//! ## Architecture
//!
//! Outboard is an umbrella crate over:
//! - **outboard-plugin** - module loading, bus negotiation, offline and
//!   realtime processing, parameter edits, settings and presets
//!
//! ## Quick Start
//!
//! ```ignore
//! use outboard::prelude::*;
//!
//! let registry = PluginRegistry::new(binding);
//! let store: Arc<dyn SettingsStore> = Arc::new(MemorySettingsStore::new());
//! let mut effect = registry.create_effect(path, &class_id, store)?;
//!
//! // One sibling per track group
//! effect.realtime_initialize(48000.0);
//! effect.realtime_add_processor(2, 48000.0);
//!
//! effect.realtime_process_start();
//! effect.realtime_process(0, Some(&inputs), Some(&mut outputs), 512);
//! effect.realtime_process_end();
//!
//! effect.realtime_finalize();
//! registry.shutdown();
//! ```

/// Re-export of outboard-plugin for direct access
pub use outboard_plugin as plugin;

pub use outboard_plugin::{
    // Host-facing effect
    Effect,
    EffectOptions,
    EffectSettings,
    EffectState,
    EffectType,
    UiKind,

    // Loading
    ClassId,
    ClassInfo,
    ModuleBinding,
    PluginModule,
    PluginPath,
    PluginRegistry,

    // Plugin capability traits
    Component,
    ComponentHandler,
    EditController,
    PluginFactory,
    PluginParts,
    ProcessData,

    // Setup and buses
    BusArrangement,
    BusInfo,
    ProcessMode,
    ProcessSetup,

    // Settings backends
    MemorySettingsStore,
    SettingsStore,

    // Errors
    BridgeError,
    ResultCode,
};

mod error;
pub use error::{Error, Result};

pub mod prelude {
    pub use crate::{
        BusInfo, ClassId, ClassInfo, Component, ComponentHandler, EditController, Effect,
        EffectOptions, EffectSettings, EffectState, EffectType, Error, MemorySettingsStore,
        ModuleBinding, PluginFactory, PluginModule, PluginParts, PluginPath, PluginRegistry,
        ProcessData, ProcessMode, ProcessSetup, Result, SettingsStore, UiKind,
    };
    pub use std::sync::Arc;
}
