//! Realtime group integration tests
//!
//! One sibling instance per group, a single batch of edits per cycle shared
//! by every group, and teardown of the whole group.

use approx::assert_abs_diff_eq;
use outboard::prelude::*;

use crate::helpers::tolerances::FLOAT_EPSILON;
use crate::helpers::*;

const CYCLE: usize = 128;

fn realtime_group(groups: usize) -> (Effect, std::sync::Arc<GainFactory>) {
    let (mut effect, factory, _store) = gain_effect();
    assert!(effect.realtime_initialize(TEST_SAMPLE_RATE));
    for _ in 0..groups {
        assert!(effect.realtime_add_processor(2, TEST_SAMPLE_RATE));
    }
    (effect, factory)
}

fn run_group(effect: &mut Effect, group: usize, level: f32) -> (usize, Block) {
    let mut block = Block::new(vec![generate_dc(level, CYCLE); 2], CYCLE);
    let n = block.run(|ins, outs| effect.realtime_process(group, ins, outs, CYCLE));
    (n, block)
}

#[test]
fn test_each_group_gets_its_own_sibling() {
    let (mut effect, factory) = realtime_group(2);

    assert_eq!(effect.sibling_count(), 2);
    assert_eq!(effect.state(), EffectState::Active);
    // master plus one instance per group
    assert_eq!(factory.instance_count(), 3);
    for group in 0..2 {
        let sibling = effect.sibling(group).expect("sibling");
        assert_eq!(sibling.setup().mode, ProcessMode::Realtime);
        assert_eq!(sibling.setup().sample_rate, TEST_SAMPLE_RATE);
    }

    assert!(effect.realtime_process_start());
    let (n0, block0) = run_group(&mut effect, 0, 1.0);
    let (n1, block1) = run_group(&mut effect, 1, 2.0);
    assert!(effect.realtime_process_end());

    assert_eq!((n0, n1), (CYCLE, CYCLE));
    assert_abs_diff_eq!(peak(&block0.outputs[0]), 1.0, epsilon = FLOAT_EPSILON);
    assert_abs_diff_eq!(peak(&block1.outputs[1]), 2.0, epsilon = FLOAT_EPSILON);

    assert!(factory.instance(0).lock().blocks.is_empty());
    assert_eq!(factory.instance(1).lock().blocks, vec![CYCLE]);
    assert_eq!(factory.instance(2).lock().blocks, vec![CYCLE]);
}

#[test]
fn test_cycle_edits_reach_every_group() {
    let (mut effect, _factory) = realtime_group(2);

    assert!(effect.set_parameter(GAIN_PARAM, 0.5));
    effect.realtime_process_start();
    let (_, block0) = run_group(&mut effect, 0, 1.0);
    // an edit made mid-cycle waits for the next cycle
    assert!(effect.set_parameter(GAIN_PARAM, 0.25));
    let (_, block1) = run_group(&mut effect, 1, 1.0);
    effect.realtime_process_end();

    assert_abs_diff_eq!(peak(&block0.outputs[0]), 0.5, epsilon = FLOAT_EPSILON);
    assert_abs_diff_eq!(peak(&block1.outputs[0]), 0.5, epsilon = FLOAT_EPSILON);

    effect.realtime_process_start();
    let (_, block0) = run_group(&mut effect, 0, 1.0);
    let (_, block1) = run_group(&mut effect, 1, 1.0);
    effect.realtime_process_end();

    assert_abs_diff_eq!(peak(&block0.outputs[1]), 0.25, epsilon = FLOAT_EPSILON);
    assert_abs_diff_eq!(peak(&block1.outputs[1]), 0.25, epsilon = FLOAT_EPSILON);
}

#[test]
fn test_unknown_group_processes_nothing() {
    let (mut effect, _factory) = realtime_group(1);

    effect.realtime_process_start();
    let (n, block) = run_group(&mut effect, 5, 1.0);
    effect.realtime_process_end();

    assert_eq!(n, 0);
    assert_eq!(peak(&block.outputs[0]), 0.0);
}

#[test]
fn test_refused_rate_adds_no_sibling() {
    let (mut effect, _factory) = realtime_group(1);

    assert!(!effect.realtime_add_processor(2, 384_000.0));
    assert_eq!(effect.sibling_count(), 1);
}

#[test]
fn test_suspend_and_resume_toggle_processing() {
    let (mut effect, factory) = realtime_group(2);

    assert!(effect.realtime_suspend());
    assert_eq!(effect.state(), EffectState::Suspended);
    assert!(!factory.instance(1).lock().processing);
    assert!(!factory.instance(2).lock().processing);
    // suspended siblings stay active
    assert!(factory.instance(1).lock().active);

    assert!(effect.realtime_resume());
    assert_eq!(effect.state(), EffectState::Active);
    assert!(factory.instance(1).lock().processing);
    assert!(factory.instance(2).lock().processing);
}

#[test]
fn test_finalize_releases_group_and_allows_rebuild() {
    let (mut effect, factory) = realtime_group(2);

    assert!(effect.realtime_finalize());
    assert_eq!(effect.sibling_count(), 0);
    assert_eq!(effect.state(), EffectState::Finalized);
    assert!(!factory.instance(1).lock().active);
    assert!(!factory.instance(2).lock().active);

    assert!(effect.realtime_initialize(TEST_SAMPLE_RATE));
    assert!(effect.realtime_add_processor(2, TEST_SAMPLE_RATE));
    assert_eq!(effect.sibling_count(), 1);
    assert_eq!(factory.instance_count(), 4);
}
