//! Capability traits a loaded plugin exposes to the bridge.
//!
//! A binding for a concrete plugin ABI implements these traits on top of the
//! native interfaces. The bridge never sees the ABI's own identity-query or
//! reference-counting idioms, only the calls it needs.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::CallResult;
use crate::handler::ComponentHandler;
use crate::metadata::{ClassId, ClassInfo, FactoryInfo};
use crate::protocol::{
    BusDirection, BusInfo, MediaType, ParameterChanges, ParameterInfo, ProcessMode, ProcessSetup,
    SampleFormat, SpeakerArrangement,
};

/// Inline capacity of the per-call bus lists.
pub const BUS_STACK_CAPACITY: usize = 4;

/// Input channels routed to one bus. Aux buses get an empty slice.
#[derive(Debug)]
pub struct InputBus<'a> {
    pub channels: &'a [&'a [f32]],
    pub silence_flags: u64,
}

impl InputBus<'_> {
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }
}

/// Output channels routed to one bus. Aux buses get an empty slice.
#[derive(Debug)]
pub struct OutputBus<'a, 's> {
    pub channels: &'a mut [&'s mut [f32]],
    pub silence_flags: u64,
}

impl OutputBus<'_, '_> {
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }
}

/// Transport structure for one processing call.
///
/// Components must only touch the first `num_samples` frames of each
/// channel slice.
#[derive(Debug)]
pub struct ProcessData<'a, 's> {
    pub mode: ProcessMode,
    pub sample_format: SampleFormat,
    pub num_samples: usize,
    pub inputs: SmallVec<[InputBus<'a>; BUS_STACK_CAPACITY]>,
    pub outputs: SmallVec<[OutputBus<'a, 's>; BUS_STACK_CAPACITY]>,
    pub input_parameter_changes: Option<&'a ParameterChanges>,
}

/// Audio side of a plugin: buses, activation, processing and state.
pub trait Component: Send {
    fn bus_count(&self, media: MediaType, direction: BusDirection) -> usize;

    fn bus_info(&self, media: MediaType, direction: BusDirection, index: usize)
        -> CallResult<BusInfo>;

    fn activate_bus(
        &mut self,
        media: MediaType,
        direction: BusDirection,
        index: usize,
        active: bool,
    ) -> CallResult;

    fn set_active(&mut self, active: bool) -> CallResult;

    /// Only valid while the component is inactive.
    fn setup_processing(&mut self, setup: &ProcessSetup) -> CallResult;

    /// `None` means the direction has no buses at all.
    fn set_bus_arrangements(
        &mut self,
        inputs: Option<&[SpeakerArrangement]>,
        outputs: Option<&[SpeakerArrangement]>,
    ) -> CallResult;

    fn set_processing(&mut self, processing: bool) -> CallResult;

    fn process(&mut self, data: &mut ProcessData<'_, '_>) -> CallResult;

    fn latency_samples(&self) -> u32;

    fn get_state(&mut self) -> CallResult<Vec<u8>>;

    fn set_state(&mut self, state: &[u8]) -> CallResult;
}

/// Control side of a plugin: parameters, editor and controller state.
pub trait EditController: Send {
    /// Edits made through the controller are reported to `handler`.
    fn set_component_handler(&mut self, handler: Arc<ComponentHandler>);

    /// Sync the controller with the processor state.
    fn set_component_state(&mut self, state: &[u8]) -> CallResult;

    fn get_state(&mut self) -> CallResult<Vec<u8>>;

    fn set_state(&mut self, state: &[u8]) -> CallResult;

    fn parameter_count(&self) -> usize;

    fn parameter_info(&self, index: usize) -> Option<ParameterInfo>;

    fn param_normalized(&self, id: u32) -> f64;

    fn set_param_normalized(&mut self, id: u32, value: f64) -> CallResult;

    fn has_editor(&self) -> bool {
        false
    }
}

/// Both halves of a freshly created plugin.
pub struct PluginParts {
    pub component: Box<dyn Component>,
    pub controller: Box<dyn EditController>,
}

/// Class factory exported by a plugin module.
pub trait PluginFactory: Send + Sync {
    fn factory_info(&self) -> FactoryInfo;

    fn classes(&self) -> Vec<ClassInfo>;

    fn create_instance(&self, class_id: &ClassId) -> CallResult<PluginParts>;
}
