use real_water::gpu::driver::{Axis, ComputeGate, DrawMode, FrameCommand};
use real_water::manager::ManagerState;

fn state(n: u32) -> ManagerState {
    ManagerState::new(n, ComputeGate::RequireRenderProgram, true)
}

#[test]
fn teardown_runs_once() {
    let mut s = state(4096);
    assert!(!s.is_torn_down());
    assert!(s.teardown());
    assert!(s.is_torn_down());
    assert!(!s.teardown());
    assert!(s.is_torn_down());
}

#[test]
fn teardown_clears_the_pending_frame() {
    let mut s = state(4096);
    s.advance(0.001);
    assert!(!s.frame().is_empty());
    s.teardown();
    assert!(s.frame().is_empty());
}

#[test]
fn draws_after_teardown_record_nothing() {
    let mut s = state(4096);
    s.teardown();

    s.advance(0.001);
    assert!(s.frame().is_empty());
    s.draw_initial();
    assert!(s.frame().is_empty());
    s.draw(0.001, DrawMode::Update);
    assert!(s.frame().is_empty());
}

#[test]
fn draw_mode_selects_the_operation() {
    let mut s = state(4096);

    s.draw(0.001, DrawMode::Initial);
    assert_eq!(s.frame().commands(), [FrameCommand::Draw { instances: 4096 }]);

    s.draw(0.001, DrawMode::Update);
    assert_eq!(s.frame().dispatches().count(), 3);
    assert_eq!(s.frame().draw_instances(), Some(4096));

    let mut direct = state(4096);
    direct.advance(0.001);
    assert_eq!(s.frame(), direct.frame());
}

#[test]
fn set_bound_reaches_every_pass() {
    let mut s = state(4096);
    s.set_bound(Axis::X, 5.0);
    s.set_bound(Axis::Z, 1.5);
    s.advance(0.002);

    let dispatches: Vec<_> = s.frame().dispatches().collect();
    assert_eq!(dispatches.len(), 3);
    for d in dispatches {
        assert_eq!(d.params.bounding_x, 5.0);
        assert_eq!(d.params.bounding_z, 1.5);
        assert_eq!(d.params.delta_time, 0.002);
        assert_eq!(d.params.particle_count, 4096);
    }
}

#[test]
fn missing_render_program_skips_the_frame() {
    let mut gated = ManagerState::new(4096, ComputeGate::RequireRenderProgram, false);
    gated.advance(0.001);
    assert!(gated.frame().is_empty());
    gated.draw_initial();
    assert!(gated.frame().is_empty());

    let mut independent = ManagerState::new(4096, ComputeGate::Independent, false);
    independent.advance(0.001);
    assert_eq!(independent.frame().dispatches().count(), 3);
    assert_eq!(independent.frame().draw_instances(), None);
}

#[test]
fn empty_store_plans_nothing() {
    let mut s = state(0);
    assert_eq!(s.particle_count(), 0);
    assert_eq!(s.workgroups(), 0);
    s.advance(0.001);
    assert!(s.frame().is_empty());
    s.draw_initial();
    assert!(s.frame().is_empty());
}
