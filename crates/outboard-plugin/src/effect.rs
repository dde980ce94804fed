//! Host-facing effect.
//!
//! [`Effect`] presents one plugin class to the host: offline processing,
//! realtime group management, latency, parameters and persistence. In
//! realtime use the host talks to a master effect which owns one sibling
//! effect per track group; siblings share the plugin module but carry their
//! own instance, setup and bus arrangement.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::error::{BridgeError, Result};
use crate::handler::restart;
use crate::metadata::{ClassId, ClassInfo, EffectType, PluginPath};
use crate::module::PluginModule;
use crate::options::{EffectOptions, SettingsStore};
use crate::protocol::{BusDirection, ParameterChanges, ParameterInfo, ProcessMode, ProcessSetup};
use crate::settings::{
    default_factory_presets_base, factory_presets_dir, read_preset, scan_factory_presets,
    write_preset, EffectSettings, PresetChunk, PRESET_EXTENSION, USER_PRESETS_GROUP,
};
use crate::wrapper::PluginWrapper;

/// Lifecycle of an effect as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    Idle,
    Initialized,
    Active,
    Suspended,
    Finalized,
}

/// Editor chosen by [`Effect::populate_ui`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiKind {
    /// The plugin's own editor view.
    Graphical,
    /// Host-drawn parameter list.
    Plain,
}

pub struct Effect {
    wrapper: PluginWrapper,
    store: Arc<dyn SettingsStore>,
    options: EffectOptions,
    state: EffectState,
    /// Component is active and processing outside the realtime group.
    active: bool,
    initial_delay: u32,
    siblings: Vec<Effect>,
    /// Batch shared by every sibling during one realtime cycle.
    cycle_changes: Option<Arc<ParameterChanges>>,
    editor_attached: bool,
    factory_presets_base: PathBuf,
    factory_presets: Vec<String>,
    rescan_factory_presets: bool,
}

impl Effect {
    /// Instantiate `class_id` from `module`.
    ///
    /// The new instance is offered an offline 44.1 kHz setup with the
    /// user's block size. If the plugin refuses it the sample rate is left
    /// at 0 and the first initialization must supply a real one.
    pub fn new(
        module: Arc<PluginModule>,
        class_id: &ClassId,
        store: Arc<dyn SettingsStore>,
    ) -> Result<Self> {
        let options = EffectOptions::load(&*store);
        let wrapper = PluginWrapper::new(module, class_id, ProcessSetup::offline(options.buffer_size))?;

        Ok(Self {
            wrapper,
            store,
            options,
            state: EffectState::Idle,
            active: false,
            initial_delay: 0,
            siblings: Vec::new(),
            cycle_changes: None,
            editor_attached: false,
            factory_presets_base: default_factory_presets_base(),
            factory_presets: Vec::new(),
            rescan_factory_presets: true,
        })
    }

    /// Fresh effect of the same class, after re-reading the user options.
    pub fn make_instance(&mut self) -> Result<Effect> {
        self.reload_user_options();
        let mut instance = Effect::new(
            Arc::clone(self.wrapper.module()),
            &self.wrapper.class().id,
            Arc::clone(&self.store),
        )?;
        instance.set_factory_presets_base(self.factory_presets_base.clone());
        Ok(instance)
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    pub fn setup(&self) -> &ProcessSetup {
        self.wrapper.setup()
    }

    pub fn options(&self) -> &EffectOptions {
        &self.options
    }

    pub fn class(&self) -> &ClassInfo {
        self.wrapper.class()
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    pub fn path(&self) -> PluginPath {
        PluginPath::new(self.wrapper.module().path(), self.class().id)
    }

    pub fn symbol(&self) -> &str {
        &self.class().name
    }

    pub fn vendor(&self) -> &str {
        &self.class().vendor
    }

    pub fn version(&self) -> &str {
        &self.class().version
    }

    pub fn description(&self) -> String {
        format!("SubCategories: {}", self.class().sub_categories_string())
    }

    pub fn family(&self) -> &str {
        self.wrapper.module().family()
    }

    pub fn effect_type(&self) -> EffectType {
        self.class().effect_type()
    }

    pub fn is_interactive(&self) -> bool {
        true
    }

    pub fn supports_automation(&self) -> bool {
        true
    }

    /// Plugins keep internal state between blocks that the realtime group
    /// does not replicate, so hosts should not offer realtime use yet.
    pub fn supports_realtime(&self) -> bool {
        false
    }

    pub fn audio_in_count(&self) -> u32 {
        self.wrapper.main_channel_count(BusDirection::Input)
    }

    pub fn audio_out_count(&self) -> u32 {
        self.wrapper.main_channel_count(BusDirection::Output)
    }

    // ------------------------------------------------------------------
    // Options
    // ------------------------------------------------------------------

    /// Re-read [`EffectOptions`] from the store and apply the block size.
    pub fn reload_user_options(&mut self) {
        self.options = EffectOptions::load(&*self.store);
        self.set_block_size(self.options.buffer_size);
    }

    /// Request a new maximum block size, capped by the user option.
    ///
    /// Returns the block size actually in effect, which is the previous one
    /// if the plugin refused the change.
    pub fn set_block_size(&mut self, requested: usize) -> usize {
        let block_size = requested.min(self.options.buffer_size);
        if block_size != self.wrapper.setup().max_block_size {
            let candidate = self.wrapper.setup().with_block_size(block_size);
            if !self.wrapper.try_setup(candidate) {
                debug!(
                    "{}: block size {} refused, keeping {}",
                    self.symbol(),
                    block_size,
                    self.wrapper.setup().max_block_size
                );
            }
        }
        self.wrapper.setup().max_block_size
    }

    pub fn block_size(&self) -> usize {
        self.wrapper.setup().max_block_size
    }

    /// Latency in samples, 0 when the user disabled latency compensation.
    pub fn latency(&self) -> u32 {
        if !self.options.use_latency {
            return 0;
        }
        self.siblings
            .first()
            .map_or(self.initial_delay, |sibling| sibling.wrapper.latency_samples())
    }

    // ------------------------------------------------------------------
    // Offline processing
    // ------------------------------------------------------------------

    pub fn process_initialize(&mut self, sample_rate: f64) -> bool {
        let mut renegotiated = false;
        if self.wrapper.setup().sample_rate != sample_rate {
            let candidate = self.wrapper.setup().with_sample_rate(sample_rate);
            if !self.wrapper.try_setup(candidate) {
                warn!("{}: sample rate {} refused", self.symbol(), sample_rate);
                return false;
            }
            renegotiated = true;
        }

        let flags = self.wrapper.handler().take_restart_flags();
        if flags != 0 {
            debug!("{}: pending restart flags {:#x}", self.symbol(), flags);
        }
        // Bus counts may differ after either restart; the cached arrangement
        // has to follow.
        if flags & (restart::IO_CHANGED | restart::RELOAD_COMPONENT) != 0 && !renegotiated {
            let current = *self.wrapper.setup();
            if !self.wrapper.try_setup(current) {
                warn!("{}: setup refused after bus layout change", self.symbol());
                return false;
            }
        }

        if let Err(code) = self.wrapper.set_active(true) {
            warn!("{}: activation failed: {}", self.symbol(), code);
            return false;
        }
        self.active = true;
        if let Err(code) = self.wrapper.set_processing(true) {
            debug!("{}: set_processing(true) returned {}", self.symbol(), code);
        }
        self.initial_delay = self.wrapper.latency_samples();
        self.state = EffectState::Active;
        true
    }

    /// Stop processing and deactivate. Never panics.
    pub fn process_finalize(&mut self) -> bool {
        self.active = false;
        self.state = EffectState::Finalized;

        let wrapper = &mut self.wrapper;
        panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = wrapper.set_processing(false);
            wrapper.set_active(false).is_ok()
        }))
        .unwrap_or_else(|_| {
            error!("Plugin panicked while finalizing");
            false
        })
    }

    /// Process one block with the edits made since the previous block.
    pub fn process_block<'a, 's>(
        &mut self,
        inputs: Option<&'a [&'a [f32]]>,
        outputs: Option<&'a mut [&'s mut [f32]]>,
        block_len: usize,
    ) -> usize {
        let changes = self.wrapper.handler().pending_changes();
        self.wrapper
            .process(inputs, outputs, block_len, changes.as_deref())
    }

    // ------------------------------------------------------------------
    // Realtime group
    // ------------------------------------------------------------------

    pub fn realtime_initialize(&mut self, sample_rate: f64) -> bool {
        if self.wrapper.setup().sample_rate != sample_rate {
            let candidate = self.wrapper.setup().with_sample_rate(sample_rate);
            if !self.wrapper.try_setup(candidate) {
                warn!("{}: sample rate {} refused", self.symbol(), sample_rate);
                return false;
            }
        }
        self.state = EffectState::Initialized;
        true
    }

    /// Add a sibling for the next group index.
    ///
    /// The sibling starts from this effect's setup in realtime mode at
    /// `sample_rate`. A sibling that fails to negotiate or activate is
    /// dropped and the existing group is left untouched.
    pub fn realtime_add_processor(&mut self, channels: u32, sample_rate: f64) -> bool {
        let mut sibling = match Effect::new(
            Arc::clone(self.wrapper.module()),
            &self.class().id,
            Arc::clone(&self.store),
        ) {
            Ok(sibling) => sibling,
            Err(e) => {
                error!("Failed to add realtime processor: {}", e);
                return false;
            }
        };

        let candidate = self
            .wrapper
            .setup()
            .with_mode(ProcessMode::Realtime)
            .with_sample_rate(sample_rate);
        if !sibling.wrapper.try_setup(candidate) {
            error!(
                "Failed to add realtime processor: {} refused {} Hz",
                self.symbol(),
                sample_rate
            );
            return false;
        }
        if !sibling.process_initialize(sample_rate) {
            error!("Failed to add realtime processor: {} did not activate", self.symbol());
            return false;
        }

        debug!(
            "{}: realtime group {} added ({} channels)",
            self.symbol(),
            self.siblings.len(),
            channels
        );
        self.siblings.push(sibling);
        self.state = EffectState::Active;
        true
    }

    /// Finalize and drop every sibling. Never panics.
    pub fn realtime_finalize(&mut self) -> bool {
        let siblings = &mut self.siblings;
        let finalized = panic::catch_unwind(AssertUnwindSafe(|| {
            for sibling in siblings.iter_mut() {
                sibling.process_finalize();
            }
            true
        }))
        .unwrap_or_else(|_| {
            error!("Plugin panicked while finalizing realtime group");
            false
        });

        self.siblings.clear();
        self.cycle_changes = None;
        self.state = EffectState::Finalized;
        finalized
    }

    pub fn realtime_suspend(&mut self) -> bool {
        for sibling in &mut self.siblings {
            let _ = sibling.wrapper.set_processing(false);
            sibling.state = EffectState::Suspended;
        }
        if self.state == EffectState::Active {
            self.state = EffectState::Suspended;
        }
        true
    }

    pub fn realtime_resume(&mut self) -> bool {
        for sibling in &mut self.siblings {
            let _ = sibling.wrapper.set_processing(true);
            sibling.state = EffectState::Active;
        }
        if self.state == EffectState::Suspended {
            self.state = EffectState::Active;
        }
        true
    }

    /// Capture this cycle's edits for every group.
    pub fn realtime_process_start(&mut self) -> bool {
        if self.cycle_changes.is_some() {
            warn!("{}: realtime cycle started twice, dropping previous edits", self.symbol());
        }
        self.cycle_changes = self.wrapper.handler().pending_changes();
        true
    }

    /// Process `group`'s block. Unknown groups process nothing.
    pub fn realtime_process<'a, 's>(
        &mut self,
        group: usize,
        inputs: Option<&'a [&'a [f32]]>,
        outputs: Option<&'a mut [&'s mut [f32]]>,
        num_samples: usize,
    ) -> usize {
        let changes = self.cycle_changes.as_deref();
        match self.siblings.get_mut(group) {
            Some(sibling) => sibling
                .wrapper
                .process(inputs, outputs, num_samples, changes),
            None => 0,
        }
    }

    pub fn realtime_process_end(&mut self) -> bool {
        self.cycle_changes = None;
        true
    }

    pub fn sibling_count(&self) -> usize {
        self.siblings.len()
    }

    pub fn sibling(&self, group: usize) -> Option<&Effect> {
        self.siblings.get(group)
    }

    // ------------------------------------------------------------------
    // Parameters and UI
    // ------------------------------------------------------------------

    pub fn parameters(&self) -> Vec<ParameterInfo> {
        let controller = self.wrapper.controller();
        (0..controller.parameter_count())
            .filter_map(|index| controller.parameter_info(index))
            .collect()
    }

    pub fn parameter(&self, id: u32) -> Option<f64> {
        self.parameters()
            .iter()
            .any(|info| info.id == id)
            .then(|| self.wrapper.controller().param_normalized(id))
    }

    /// Set a normalized value and queue it for the processor.
    pub fn set_parameter(&mut self, id: u32, value: f64) -> bool {
        if !(0.0..=1.0).contains(&value) {
            return false;
        }
        if self.wrapper.controller_mut().set_param_normalized(id, value).is_err() {
            return false;
        }
        let handler = self.wrapper.handler();
        let _ = handler.begin_edit(id);
        let performed = handler.perform_edit(id, value).is_ok();
        let _ = handler.end_edit(id);
        performed
    }

    pub fn populate_ui(&mut self) -> UiKind {
        let use_gui = EffectOptions::load(&*self.store).use_gui;
        if use_gui && self.wrapper.controller().has_editor() {
            self.editor_attached = true;
            UiKind::Graphical
        } else {
            UiKind::Plain
        }
    }

    pub fn is_graphical_ui(&self) -> bool {
        self.editor_attached
    }

    pub fn close_ui(&mut self) -> bool {
        if self.editor_attached {
            self.editor_attached = false;
        } else {
            self.flush_pending_changes();
        }
        true
    }

    /// Push pending edits into an idle component.
    ///
    /// Some plugins only update their controller from the processor model,
    /// so edits made while nothing is processing would otherwise never show
    /// up in the editor. Runs one activate, empty block, deactivate cycle.
    /// Returns whether a batch was delivered.
    pub fn flush_pending_changes(&mut self) -> bool {
        if self.active {
            return false;
        }
        let Some(changes) = self.wrapper.handler().pending_changes() else {
            return false;
        };
        if self.wrapper.set_active(true).is_err() {
            return false;
        }
        let _ = self.wrapper.set_processing(true);
        self.wrapper.process(None, None, 0, Some(changes.as_ref()));
        let _ = self.wrapper.set_processing(false);
        let _ = self.wrapper.set_active(false);
        true
    }

    // ------------------------------------------------------------------
    // Settings and presets
    // ------------------------------------------------------------------

    pub fn save_settings(&mut self) -> Result<EffectSettings> {
        self.wrapper.save_settings()
    }

    pub fn load_settings(&mut self, settings: &EffectSettings) -> Result<()> {
        self.wrapper.load_settings(settings)
    }

    pub fn save_user_preset(&mut self, name: &str) -> Result<()> {
        let bytes = self.wrapper.save_settings()?.to_bytes()?;
        self.store.set(USER_PRESETS_GROUP, name, bytes);
        Ok(())
    }

    pub fn load_user_preset(&mut self, name: &str) -> Result<()> {
        let bytes = self
            .store
            .get(USER_PRESETS_GROUP, name)
            .ok_or_else(|| BridgeError::StateRestoreError(format!("no user preset '{}'", name)))?;
        let settings = EffectSettings::from_bytes(&bytes)?;
        self.wrapper.load_settings(&settings)
    }

    pub fn user_presets(&self) -> Vec<String> {
        let mut names = self.store.keys(USER_PRESETS_GROUP);
        names.sort();
        names
    }

    pub fn save_preset<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        let class_id = self.class().id;
        let settings = self.wrapper.save_settings()?;
        write_preset(writer, &PresetChunk::new(class_id, settings))
    }

    pub fn load_preset<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let chunk = read_preset(reader)?;
        if chunk.class_id != self.class().id {
            return Err(BridgeError::PresetFormat(format!(
                "preset belongs to class {}, not {}",
                chunk.class_id,
                self.class().id
            )));
        }
        self.wrapper.load_settings(&chunk.into_settings())
    }

    pub fn export_preset(&mut self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| {
            BridgeError::StateSaveError(format!("cannot open {}: {}", path.display(), e))
        })?;
        self.save_preset(&mut BufWriter::new(file))
            .map_err(|e| BridgeError::StateSaveError(format!("{}: {}", path.display(), e)))
    }

    pub fn import_preset(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).map_err(|e| {
            BridgeError::StateRestoreError(format!("cannot open {}: {}", path.display(), e))
        })?;
        self.load_preset(&mut BufReader::new(file))
            .map_err(|e| BridgeError::StateRestoreError(format!("{}: {}", path.display(), e)))
    }

    pub fn set_factory_presets_base(&mut self, base: impl Into<PathBuf>) {
        self.factory_presets_base = base.into();
        self.rescan_factory_presets = true;
    }

    pub fn factory_presets_dir(&self) -> PathBuf {
        factory_presets_dir(&self.factory_presets_base, self.class())
    }

    /// Factory preset names, scanned on first use and cached.
    pub fn factory_presets(&mut self) -> &[String] {
        if self.rescan_factory_presets {
            self.factory_presets = scan_factory_presets(&self.factory_presets_dir());
            self.rescan_factory_presets = false;
        }
        &self.factory_presets
    }

    pub fn rescan_factory_presets(&mut self) {
        self.rescan_factory_presets = true;
    }

    /// Load the cached factory preset at `index`. Unknown indices are ignored.
    pub fn load_factory_preset(&mut self, index: usize) -> Result<()> {
        let Some(name) = self.factory_presets.get(index) else {
            return Ok(());
        };
        let path = self
            .factory_presets_dir()
            .join(format!("{}.{}", name, PRESET_EXTENSION));
        self.import_preset(&path)
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        self.close_ui();
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("class", &self.class().name)
            .field("state", &self.state)
            .field("setup", self.setup())
            .field("siblings", &self.siblings.len())
            .finish()
    }
}
