//! Value types exchanged between the host and a loaded component.

use serde::{Deserialize, Serialize};

/// Block size used when no user ceiling has been configured.
pub const DEFAULT_BLOCK_SIZE: usize = 8192;

/// Sample rate a freshly created component is first negotiated at.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    Float32,
    Float64,
}

#[allow(clippy::derivable_impls)]
impl Default for SampleFormat {
    fn default() -> Self {
        SampleFormat::Float32
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessMode {
    #[default]
    Offline,
    Realtime,
}

/// Negotiated processing contract between host and component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessSetup {
    pub mode: ProcessMode,
    pub sample_format: SampleFormat,
    pub sample_rate: f64,
    pub max_block_size: usize,
}

impl ProcessSetup {
    /// Offline, 32-bit float, 44.1 kHz.
    pub fn offline(max_block_size: usize) -> Self {
        Self {
            mode: ProcessMode::Offline,
            sample_format: SampleFormat::Float32,
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_block_size,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    pub fn with_mode(mut self, mode: ProcessMode) -> Self {
        self.mode = mode;
        self
    }

    /// A zero sample rate marks a setup the component never accepted.
    pub fn is_negotiated(&self) -> bool {
        self.sample_rate > 0.0
    }
}

impl Default for ProcessSetup {
    fn default() -> Self {
        Self::offline(DEFAULT_BLOCK_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Audio,
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusType {
    #[default]
    Main,
    Aux,
}

/// Bitmask of speakers, one bit per channel.
pub type SpeakerArrangement = u64;

/// Bus metadata as reported by the component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusInfo {
    pub name: String,
    pub bus_type: BusType,
    pub channel_count: u32,
    pub default_active: bool,
}

impl BusInfo {
    pub fn main(name: impl Into<String>, channel_count: u32) -> Self {
        Self {
            name: name.into(),
            bus_type: BusType::Main,
            channel_count,
            default_active: true,
        }
    }

    pub fn aux(name: impl Into<String>, channel_count: u32) -> Self {
        Self {
            name: name.into(),
            bus_type: BusType::Aux,
            channel_count,
            default_active: false,
        }
    }

    pub fn is_main(&self) -> bool {
        self.bus_type == BusType::Main
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterPoint {
    pub sample_offset: i32,
    pub value: f64,
}

/// Automation points for one parameter within a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterQueue {
    pub param_id: u32,
    pub points: Vec<ParameterPoint>,
}

impl ParameterQueue {
    pub fn new(param_id: u32) -> Self {
        Self {
            param_id,
            points: Vec::new(),
        }
    }

    pub fn add_point(&mut self, sample_offset: i32, value: f64) {
        self.points.push(ParameterPoint {
            sample_offset,
            value,
        });
    }

    pub fn last_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.value)
    }
}

/// Batch of parameter edits handed to one processing call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterChanges {
    pub queues: Vec<ParameterQueue>,
}

impl ParameterChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_queue(&mut self, queue: ParameterQueue) {
        self.queues.push(queue);
    }

    /// Append a point, creating the parameter's queue on first use.
    pub fn add_change(&mut self, param_id: u32, sample_offset: i32, value: f64) {
        match self.queues.iter_mut().find(|q| q.param_id == param_id) {
            Some(queue) => queue.add_point(sample_offset, value),
            None => {
                let mut queue = ParameterQueue::new(param_id);
                queue.add_point(sample_offset, value);
                self.queues.push(queue);
            }
        }
    }

    pub fn queue(&self, param_id: u32) -> Option<&ParameterQueue> {
        self.queues.iter().find(|q| q.param_id == param_id)
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterFlags {
    pub automatable: bool,
    pub read_only: bool,
    pub wrap: bool,
    pub is_bypass: bool,
    pub hidden: bool,
}

/// Parameter metadata. Values are normalized to 0..1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub id: u32,
    pub name: String,
    pub unit: String,
    pub default_value: f64,
    pub step_count: u32,
    pub flags: ParameterFlags,
}

impl ParameterInfo {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            unit: String::new(),
            default_value: 0.0,
            step_count: 0,
            flags: ParameterFlags {
                automatable: true,
                ..ParameterFlags::default()
            },
        }
    }

    pub fn default_value(mut self, value: f64) -> Self {
        self.default_value = value;
        self
    }
}
