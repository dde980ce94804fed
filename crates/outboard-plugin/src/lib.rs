//! Plugin audio-processing bridge for Outboard
//!
//! Loads binary audio plugins, negotiates their bus layout and processing
//! setup, and drives them offline or as a realtime group with one instance
//! per track group.
//!
//! ## Pieces
//!
//! - [`PluginRegistry`] loads modules through a [`ModuleBinding`] and keeps
//!   them shared between effects
//! - [`Effect`] is what the host talks to: lifecycle, block processing,
//!   realtime groups, latency, parameters, settings and presets
//! - [`negotiate_setup`] and [`process_block`] are the two calls every
//!   processing path goes through
//! - [`ComponentHandler`] collects parameter edits from the controller until
//!   the next processing call drains them
//!
//! ## Usage
//!
//! ```ignore
//! use outboard_plugin::{Effect, MemorySettingsStore, PluginRegistry};
//!
//! let registry = PluginRegistry::new(my_vst3_binding);
//! let store = Arc::new(MemorySettingsStore::new());
//! let mut effect = registry.create_effect(path, &class_id, store)?;
//!
//! effect.process_initialize(48000.0);
//! let done = effect.process_block(Some(&inputs), Some(&mut outputs), 512);
//! effect.process_finalize();
//! ```

pub mod error;
pub use error::{BridgeError, CallResult, LoadStage, Result, ResultCode};

mod bus;
pub use bus::{activate_main_audio_buses, full_channel_mask, negotiate_setup, BusArrangement};

mod effect;
pub use effect::{Effect, EffectState, UiKind};

mod handler;
pub use handler::{restart, ComponentHandler};

mod instance;
pub use instance::{
    Component, EditController, InputBus, OutputBus, PluginFactory, PluginParts, ProcessData,
    BUS_STACK_CAPACITY,
};

mod metadata;
pub use metadata::{
    ClassId, ClassInfo, EffectType, FactoryInfo, PluginPath, SUB_CATEGORY_FX,
    SUB_CATEGORY_GENERATOR,
};

mod module;
pub use module::{ModuleBinding, PluginModule};

/// Re-exported for [`ModuleBinding`] implementations.
pub use libloading;

mod options;
pub use options::{EffectOptions, MemorySettingsStore, SettingsStore, OPTIONS_GROUP};

mod processor;
pub use processor::process_block;

pub mod protocol;
pub use protocol::{
    BusDirection, BusInfo, BusType, MediaType, ParameterChanges, ParameterFlags, ParameterInfo,
    ParameterPoint, ParameterQueue, ProcessMode, ProcessSetup, SampleFormat, SpeakerArrangement,
    DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE,
};

mod registry;
pub use registry::{default_search_paths, PluginRegistry};

pub mod settings;
pub use settings::{EffectSettings, PresetChunk};

mod wrapper;
pub use wrapper::PluginWrapper;
