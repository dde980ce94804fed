//! One live plugin instance: both halves plus the host-side handler.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::bus::{negotiate_setup, BusArrangement};
use crate::error::{BridgeError, CallResult, Result};
use crate::handler::ComponentHandler;
use crate::instance::{Component, EditController, PluginParts};
use crate::metadata::{ClassId, ClassInfo};
use crate::module::PluginModule;
use crate::processor::process_block;
use crate::protocol::{BusDirection, MediaType, ParameterChanges, ProcessSetup};
use crate::settings::EffectSettings;

pub struct PluginWrapper {
    module: Arc<PluginModule>,
    class: ClassInfo,
    component: Box<dyn Component>,
    controller: Box<dyn EditController>,
    handler: Arc<ComponentHandler>,
    setup: ProcessSetup,
    arrangement: BusArrangement,
}

impl PluginWrapper {
    /// Instantiate `class_id` from `module` and negotiate `initial`.
    ///
    /// A rejected initial setup is kept with a sample rate of 0, which
    /// forces the next initialization to renegotiate.
    pub fn new(module: Arc<PluginModule>, class_id: &ClassId, initial: ProcessSetup) -> Result<Self> {
        let class = module
            .class_info(class_id)
            .ok_or_else(|| BridgeError::ClassNotFound(class_id.to_string()))?;
        let PluginParts {
            mut component,
            mut controller,
        } = module.create_instance(class_id)?;

        let handler = ComponentHandler::new();
        controller.set_component_handler(Arc::clone(&handler));

        match component.get_state() {
            Ok(state) => {
                if let Err(code) = controller.set_component_state(&state) {
                    debug!("{}: controller ignored component state: {}", class.name, code);
                }
            }
            Err(code) => debug!("{}: no initial component state: {}", class.name, code),
        }

        let mut wrapper = Self {
            module,
            class,
            component,
            controller,
            handler,
            setup: initial,
            arrangement: BusArrangement::default(),
        };

        if !wrapper.try_setup(initial) {
            warn!(
                "{} rejected the default setup ({} Hz, {} frames); sample rate left unset",
                wrapper.class.name, initial.sample_rate, initial.max_block_size
            );
            wrapper.setup.sample_rate = 0.0;
        }

        Ok(wrapper)
    }

    pub fn module(&self) -> &Arc<PluginModule> {
        &self.module
    }

    pub fn class(&self) -> &ClassInfo {
        &self.class
    }

    pub fn setup(&self) -> &ProcessSetup {
        &self.setup
    }

    pub fn arrangement(&self) -> &BusArrangement {
        &self.arrangement
    }

    pub fn handler(&self) -> &Arc<ComponentHandler> {
        &self.handler
    }

    pub fn controller(&self) -> &dyn EditController {
        self.controller.as_ref()
    }

    pub fn controller_mut(&mut self) -> &mut dyn EditController {
        self.controller.as_mut()
    }

    /// Negotiate `candidate` and commit it only if the component accepts.
    pub fn try_setup(&mut self, candidate: ProcessSetup) -> bool {
        match negotiate_setup(self.component.as_mut(), &candidate) {
            Some(arrangement) => {
                self.setup = candidate;
                self.arrangement = arrangement;
                true
            }
            None => false,
        }
    }

    pub fn set_active(&mut self, active: bool) -> CallResult {
        self.component.set_active(active)
    }

    pub fn set_processing(&mut self, processing: bool) -> CallResult {
        self.component.set_processing(processing)
    }

    pub fn latency_samples(&self) -> u32 {
        self.component.latency_samples()
    }

    /// Sum of channels over the main audio buses in `direction`.
    pub fn main_channel_count(&self, direction: BusDirection) -> u32 {
        (0..self.component.bus_count(MediaType::Audio, direction))
            .filter_map(|index| {
                self.component
                    .bus_info(MediaType::Audio, direction, index)
                    .ok()
            })
            .filter(|info| info.is_main())
            .map(|info| info.channel_count)
            .sum()
    }

    pub fn process<'a, 's>(
        &mut self,
        inputs: Option<&'a [&'a [f32]]>,
        outputs: Option<&'a mut [&'s mut [f32]]>,
        block_len: usize,
        changes: Option<&'a ParameterChanges>,
    ) -> usize {
        process_block(
            self.component.as_mut(),
            &self.setup,
            inputs,
            outputs,
            block_len,
            changes,
        )
    }

    pub fn save_settings(&mut self) -> Result<EffectSettings> {
        let processor_state = self
            .component
            .get_state()
            .map_err(|code| BridgeError::StateSaveError(format!("component state: {}", code)))?;

        // Controllers without state of their own are common.
        let controller_state = self.controller.get_state().unwrap_or_else(|code| {
            debug!("{}: no controller state: {}", self.class.name, code);
            Vec::new()
        });

        Ok(EffectSettings {
            processor_state,
            controller_state,
        })
    }

    pub fn load_settings(&mut self, settings: &EffectSettings) -> Result<()> {
        self.component
            .set_state(&settings.processor_state)
            .map_err(|code| BridgeError::StateRestoreError(format!("component state: {}", code)))?;

        if let Err(code) = self
            .controller
            .set_component_state(&settings.processor_state)
        {
            warn!("{}: controller did not sync to component state: {}", self.class.name, code);
        }

        if !settings.controller_state.is_empty() {
            self.controller
                .set_state(&settings.controller_state)
                .map_err(|code| {
                    BridgeError::StateRestoreError(format!("controller state: {}", code))
                })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PluginWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginWrapper")
            .field("module", &self.module.path())
            .field("class", &self.class.name)
            .field("setup", &self.setup)
            .field("arrangement", &self.arrangement)
            .finish()
    }
}
