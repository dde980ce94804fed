//! Bus negotiation.
//!
//! Every accepted setup is followed by activating the main audio buses with
//! their full channel mask, switching everything else off and submitting the
//! resulting speaker arrangements in one call.

use tracing::{debug, warn};

use crate::instance::Component;
use crate::protocol::{BusDirection, MediaType, ProcessSetup, SpeakerArrangement};

/// Speaker arrangements submitted at the last successful negotiation.
///
/// One entry per audio bus, 0 for buses that ended up inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusArrangement {
    pub inputs: Vec<SpeakerArrangement>,
    pub outputs: Vec<SpeakerArrangement>,
}

impl BusArrangement {
    pub fn active_inputs(&self) -> usize {
        self.inputs.iter().filter(|a| **a != 0).count()
    }

    pub fn active_outputs(&self) -> usize {
        self.outputs.iter().filter(|a| **a != 0).count()
    }
}

/// Mask with one bit per channel.
pub fn full_channel_mask(channels: u32) -> SpeakerArrangement {
    if channels >= SpeakerArrangement::BITS {
        SpeakerArrangement::MAX
    } else {
        (1u64 << channels) - 1
    }
}

/// Ask `component` to accept `setup` and, if it does, renegotiate its buses.
///
/// Returns `None` when the setup is rejected; the component is left as it
/// was in that case.
pub fn negotiate_setup(
    component: &mut dyn Component,
    setup: &ProcessSetup,
) -> Option<BusArrangement> {
    if let Err(code) = component.setup_processing(setup) {
        debug!(
            "Component rejected setup ({:?}, {} Hz, {} frames): {}",
            setup.mode, setup.sample_rate, setup.max_block_size, code
        );
        return None;
    }
    Some(activate_main_audio_buses(component))
}

/// Activate main audio buses and disable aux and event buses.
pub fn activate_main_audio_buses(component: &mut dyn Component) -> BusArrangement {
    let inputs = activate_audio_direction(component, BusDirection::Input);
    let outputs = activate_audio_direction(component, BusDirection::Output);

    // Event buses are not routed by this bridge.
    for direction in [BusDirection::Input, BusDirection::Output] {
        for index in 0..component.bus_count(MediaType::Event, direction) {
            let _ = component.activate_bus(MediaType::Event, direction, index, false);
        }
    }

    let result = component.set_bus_arrangements(
        (!inputs.is_empty()).then_some(inputs.as_slice()),
        (!outputs.is_empty()).then_some(outputs.as_slice()),
    );
    if let Err(code) = result {
        warn!("Component refused default bus arrangements: {}", code);
    }

    BusArrangement { inputs, outputs }
}

fn activate_audio_direction(
    component: &mut dyn Component,
    direction: BusDirection,
) -> Vec<SpeakerArrangement> {
    let count = component.bus_count(MediaType::Audio, direction);
    let mut arrangements = Vec::with_capacity(count);

    for index in 0..count {
        let mut arrangement = match component.bus_info(MediaType::Audio, direction, index) {
            Ok(info) if info.is_main() && info.channel_count > 0 => {
                full_channel_mask(info.channel_count)
            }
            _ => 0,
        };
        if component
            .activate_bus(MediaType::Audio, direction, index, arrangement > 0)
            .is_err()
        {
            arrangement = 0;
        }
        arrangements.push(arrangement);
    }

    arrangements
}
