//! Per-block processing call.

use smallvec::SmallVec;
use tracing::warn;

use crate::instance::{Component, InputBus, OutputBus, ProcessData, BUS_STACK_CAPACITY};
use crate::protocol::{BusDirection, MediaType, ParameterChanges, ProcessSetup};

/// Run one processing call on `component`.
///
/// `inputs` and `outputs` are flat channel lists consumed left to right by
/// the main buses in bus order; aux buses receive no channels. Passing
/// `None` for both with `block_len == 0` delivers `changes` without audio.
///
/// Returns the number of samples processed, or 0 when any bus query fails,
/// the channel lists do not cover the main buses, or the component reports
/// an error.
pub fn process_block<'a, 's>(
    component: &mut dyn Component,
    setup: &ProcessSetup,
    inputs: Option<&'a [&'a [f32]]>,
    outputs: Option<&'a mut [&'s mut [f32]]>,
    block_len: usize,
    changes: Option<&'a ParameterChanges>,
) -> usize {
    let num_samples = block_len.min(setup.max_block_size);

    let mut input_buses: SmallVec<[InputBus<'a>; BUS_STACK_CAPACITY]> = SmallVec::new();
    if let Some(flat) = inputs {
        let mut offset = 0;
        for index in 0..component.bus_count(MediaType::Audio, BusDirection::Input) {
            let Ok(info) = component.bus_info(MediaType::Audio, BusDirection::Input, index) else {
                return 0;
            };
            let channels: &'a [&'a [f32]] = if info.is_main() {
                let count = info.channel_count as usize;
                let Some(channels) = flat.get(offset..offset + count) else {
                    warn!(
                        "Input bus {} needs {} channels, {} left",
                        index,
                        count,
                        flat.len().saturating_sub(offset)
                    );
                    return 0;
                };
                offset += count;
                channels
            } else {
                // aux routing is not supported
                &[]
            };
            if channels.iter().any(|c| c.len() < num_samples) {
                return 0;
            }
            input_buses.push(InputBus {
                channels,
                silence_flags: 0,
            });
        }
    }

    let mut output_buses: SmallVec<[OutputBus<'a, 's>; BUS_STACK_CAPACITY]> = SmallVec::new();
    if let Some(mut rest) = outputs {
        for index in 0..component.bus_count(MediaType::Audio, BusDirection::Output) {
            let Ok(info) = component.bus_info(MediaType::Audio, BusDirection::Output, index)
            else {
                return 0;
            };
            let channels: &'a mut [&'s mut [f32]] = if info.is_main() {
                let count = info.channel_count as usize;
                if rest.len() < count {
                    warn!(
                        "Output bus {} needs {} channels, {} left",
                        index,
                        count,
                        rest.len()
                    );
                    return 0;
                }
                let (head, tail) = std::mem::take(&mut rest).split_at_mut(count);
                rest = tail;
                head
            } else {
                Default::default()
            };
            if channels.iter().any(|c| c.len() < num_samples) {
                return 0;
            }
            output_buses.push(OutputBus {
                channels,
                silence_flags: 0,
            });
        }
    }

    let mut data = ProcessData {
        mode: setup.mode,
        sample_format: setup.sample_format,
        num_samples,
        inputs: input_buses,
        outputs: output_buses,
        input_parameter_changes: changes,
    };

    match component.process(&mut data) {
        Ok(()) => num_samples,
        Err(_) => 0,
    }
}
