//! Offline processing integration tests
//!
//! Activation, block processing, parameter delivery and finalization of a
//! single effect instance.

use approx::assert_abs_diff_eq;
use outboard::prelude::*;

use crate::helpers::tolerances::{FLOAT_EPSILON, SILENCE_THRESHOLD};
use crate::helpers::*;

fn stereo_staircase(len: usize) -> Block {
    Block::new(
        vec![generate_integer_staircase(len), generate_integer_staircase(len)],
        len,
    )
}

#[test]
fn test_offline_lifecycle() {
    let (mut effect, factory, _store) = gain_effect();
    assert_eq!(effect.state(), EffectState::Idle);

    assert!(effect.process_initialize(TEST_SAMPLE_RATE));
    assert_eq!(effect.state(), EffectState::Active);
    {
        let instance = factory.instance(0);
        let state = instance.lock();
        assert!(state.active);
        assert!(state.processing);
        let setup = state.setup.expect("negotiated setup");
        assert_eq!(setup.sample_rate, TEST_SAMPLE_RATE);
        assert_eq!(setup.mode, ProcessMode::Offline);
    }

    assert!(effect.process_finalize());
    assert_eq!(effect.state(), EffectState::Finalized);
    let instance = factory.instance(0);
    let state = instance.lock();
    assert!(!state.active);
    assert!(!state.processing);
}

#[test]
fn test_unity_gain_passthrough() {
    let (mut effect, _factory, _store) = gain_effect();
    assert!(effect.process_initialize(TEST_SAMPLE_RATE));

    let mut block = stereo_staircase(TEST_BLOCK_SIZE);
    let n = block.run(|ins, outs| effect.process_block(ins, outs, TEST_BLOCK_SIZE));

    assert_eq!(n, TEST_BLOCK_SIZE);
    for (input, output) in block.inputs.iter().zip(&block.outputs) {
        for (x, y) in input.iter().zip(output) {
            assert_abs_diff_eq!(*x, *y, epsilon = FLOAT_EPSILON);
        }
    }
}

#[test]
fn test_parameter_edit_applies_from_next_block() {
    let (mut effect, factory, _store) = gain_effect();
    assert!(effect.process_initialize(TEST_SAMPLE_RATE));

    let mut block = Block::new(vec![generate_dc(1.0, 64); 2], 64);
    block.run(|ins, outs| effect.process_block(ins, outs, 64));
    assert_abs_diff_eq!(peak(&block.outputs[0]), 1.0, epsilon = FLOAT_EPSILON);

    assert!(effect.set_parameter(GAIN_PARAM, 0.5));
    assert_eq!(effect.parameter(GAIN_PARAM), Some(0.5));

    block.run(|ins, outs| effect.process_block(ins, outs, 64));
    for output in &block.outputs {
        assert!(output.iter().all(|s| (s - 0.5).abs() < FLOAT_EPSILON));
    }

    // the component keeps the value once delivered
    block.run(|ins, outs| effect.process_block(ins, outs, 64));
    assert_abs_diff_eq!(peak(&block.outputs[1]), 0.5, epsilon = FLOAT_EPSILON);
    assert_eq!(factory.instance(0).lock().blocks, vec![64, 64, 64]);
}

#[test]
fn test_set_parameter_rejects_out_of_range_values() {
    let (mut effect, _factory, _store) = gain_effect();

    assert!(!effect.set_parameter(GAIN_PARAM, 1.5));
    assert!(!effect.set_parameter(GAIN_PARAM, -0.1));
    assert!(!effect.set_parameter(99, 0.5));
    assert_eq!(effect.parameter(GAIN_PARAM), Some(1.0));
    assert_eq!(effect.parameter(99), None);
}

#[test]
fn test_block_clamped_to_max_block_size() {
    let (mut effect, factory, _store) = gain_effect();
    assert_eq!(effect.set_block_size(256), 256);
    assert!(effect.process_initialize(TEST_SAMPLE_RATE));

    let mut block = Block::new(vec![generate_dc(1.0, TEST_BLOCK_SIZE); 2], TEST_BLOCK_SIZE);
    let n = block.run(|ins, outs| effect.process_block(ins, outs, TEST_BLOCK_SIZE));

    assert_eq!(n, 256);
    assert_abs_diff_eq!(peak(&block.outputs[0][..256]), 1.0, epsilon = FLOAT_EPSILON);
    assert_silence(&block.outputs[0][256..], SILENCE_THRESHOLD);
    assert_eq!(factory.instance(0).lock().blocks, vec![256]);
}

#[test]
fn test_block_size_capped_by_user_option() {
    let (mut effect, _factory, _store) = gain_effect();
    assert_eq!(effect.set_block_size(1 << 20), effect.options().buffer_size);
}

#[test]
fn test_missing_channels_process_nothing() {
    let (mut effect, factory, _store) = gain_effect();
    assert!(effect.process_initialize(TEST_SAMPLE_RATE));

    // stereo plugin, mono buffers
    let mut block = Block::new(vec![generate_dc(1.0, 64)], 64);
    let n = block.run(|ins, outs| effect.process_block(ins, outs, 64));

    assert_eq!(n, 0);
    assert_silence(&block.outputs[0], SILENCE_THRESHOLD);
    assert!(factory.instance(0).lock().blocks.is_empty());
}

#[test]
fn test_refused_sample_rate_keeps_effect_inactive() {
    let (mut effect, factory, _store) = gain_effect();

    assert!(!effect.process_initialize(384_000.0));
    assert_ne!(effect.state(), EffectState::Active);
    assert!(!factory.instance(0).lock().active);
    assert_ne!(effect.setup().sample_rate, 384_000.0);
}

#[test]
fn test_idle_edits_flushed_when_ui_closes() {
    let (mut effect, factory, _store) = gain_effect();

    assert!(effect.set_parameter(GAIN_PARAM, 0.25));
    assert!(effect.close_ui());

    let instance = factory.instance(0);
    let state = instance.lock();
    assert_eq!(state.gain, 0.25);
    assert_eq!(state.blocks, vec![0]);
    assert!(!state.active);
}

#[test]
fn test_edits_not_flushed_while_active() {
    let (mut effect, factory, _store) = gain_effect();
    assert!(effect.process_initialize(TEST_SAMPLE_RATE));

    assert!(effect.set_parameter(GAIN_PARAM, 0.25));
    assert!(!effect.flush_pending_changes());
    assert!(factory.instance(0).lock().blocks.is_empty());

    // still queued for the next block
    let mut block = Block::new(vec![generate_dc(1.0, 32); 2], 32);
    block.run(|ins, outs| effect.process_block(ins, outs, 32));
    assert_abs_diff_eq!(peak(&block.outputs[0]), 0.25, epsilon = FLOAT_EPSILON);
}

#[test]
fn test_identity_reported_from_class_info() {
    let (effect, _factory, _store) = gain_effect();

    assert_eq!(effect.symbol(), "Gain");
    assert_eq!(effect.vendor(), "Outboard Test");
    assert_eq!(effect.version(), "0.1.0");
    assert_eq!(effect.family(), "VST3");
    assert_eq!(effect.effect_type(), EffectType::Process);
    assert_eq!(effect.audio_in_count(), 2);
    assert_eq!(effect.audio_out_count(), 2);
    assert_eq!(
        effect.path().to_string(),
        format!("{};{}", GAIN_MODULE_PATH, GAIN_CLASS)
    );
}
