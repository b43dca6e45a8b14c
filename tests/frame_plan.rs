use real_water::constants::{DEFAULT_BOUNDING, WORKGROUP_SIZE};
use real_water::gpu::driver::{
    workgroup_count, Axis, BarrierBits, ComputeGate, Dispatch, DrawMode, FrameCommand, FramePlan,
    Pass, PlanError, SimulationDriver,
};

fn driver(n: u32) -> SimulationDriver {
    SimulationDriver::new(n, ComputeGate::RequireRenderProgram)
}

#[test]
fn advance_records_three_passes_with_barriers() {
    let plan = driver(4096).plan_advance(0.001, true);
    let kinds: Vec<String> = plan
        .commands()
        .iter()
        .map(|c| match c {
            FrameCommand::Dispatch(d) => format!("pass{}", d.pass.index()),
            FrameCommand::Barrier(b) if *b == BarrierBits::STORAGE => "storage".to_string(),
            FrameCommand::Barrier(_) => "storage+vertex".to_string(),
            FrameCommand::Draw { instances } => format!("draw{instances}"),
        })
        .collect();
    assert_eq!(
        kinds,
        [
            "pass1",
            "storage",
            "pass2",
            "storage+vertex",
            "pass3",
            "storage+vertex",
            "draw4096"
        ]
    );
    assert_eq!(plan.validate(), Ok(()));
}

#[test]
fn draw_follows_pass_three_and_its_vertex_barrier() {
    let plan = driver(4096).plan_advance(0.001, true);
    let commands = plan.commands();
    let n = commands.len();
    assert_eq!(commands[n - 1], FrameCommand::Draw { instances: 4096 });
    match commands[n - 2] {
        FrameCommand::Barrier(bits) => assert!(bits.contains(BarrierBits::VERTEX_ATTRIB | BarrierBits::STORAGE)),
        other => panic!("expected barrier before draw, got {other:?}"),
    }
    match commands[n - 3] {
        FrameCommand::Dispatch(d) => assert_eq!(d.pass, Pass::Integrate),
        other => panic!("expected pass 3 before the final barrier, got {other:?}"),
    }
}

#[test]
fn every_pass_gets_its_own_compute_pass() {
    let segments = driver(1000).plan_advance(0.001, true).compute_segments();
    assert_eq!(segments.len(), 3);
    for (segment, pass) in segments.iter().zip(Pass::ORDER) {
        assert_eq!(segment.len(), 1);
        assert_eq!(segment[0].pass, pass);
    }
}

#[test]
fn set_bound_reaches_all_three_passes() {
    let mut driver = driver(4096);
    driver.set_bound(Axis::X, 5.0);
    let plan = driver.plan_advance(0.002, true);

    let dispatches: Vec<&Dispatch> = plan.dispatches().collect();
    assert_eq!(dispatches.len(), 3);
    for (d, pass) in dispatches.iter().zip(Pass::ORDER) {
        assert_eq!(d.params.bounding_x, 5.0);
        assert_eq!(d.params.bounding_z, DEFAULT_BOUNDING);
        assert_eq!(d.params.pass, pass.index());
        assert_eq!(d.params.particle_count, 4096);
        assert_eq!(d.params.delta_time, 0.002);
        assert_eq!(d.workgroups, 16);
    }

    driver.set_bound(Axis::Z, 1.5);
    assert_eq!(driver.bounding(Axis::Z), 1.5);
    assert_eq!(driver.bounding(Axis::X), 5.0);
}

#[test]
fn dispatch_covers_trailing_particles() {
    assert_eq!(workgroup_count(0), 0);
    assert_eq!(workgroup_count(1), 1);
    assert_eq!(workgroup_count(255), 1);
    assert_eq!(workgroup_count(256), 1);
    assert_eq!(workgroup_count(4096), 16);
    assert_eq!(workgroup_count(4097), 17);

    for n in [1u32, 100, 900, 1000, 4095, 4096, 4097, 10_000] {
        let groups = workgroup_count(n);
        // every particle has an invocation, and no group is entirely masked
        assert!(groups * WORKGROUP_SIZE >= n);
        assert!((groups - 1) * WORKGROUP_SIZE < n);
    }
}

#[test]
fn initial_draw_has_no_compute() {
    let plan = driver(900).plan(0.001, DrawMode::Initial, true);
    assert_eq!(plan.commands(), &[FrameCommand::Draw { instances: 900 }]);
    assert_eq!(plan.dispatches().count(), 0);
}

#[test]
fn missing_render_program_gates_compute_by_policy() {
    let gated = driver(4096).plan_advance(0.001, false);
    assert!(gated.is_empty());

    let independent = SimulationDriver::new(4096, ComputeGate::Independent).plan_advance(0.001, false);
    assert_eq!(independent.dispatches().count(), 3);
    assert_eq!(independent.draw_instances(), None);
    assert_eq!(independent.validate(), Ok(()));

    assert!(driver(4096).plan_initial(false).is_empty());
}

#[test]
fn empty_store_plans_nothing() {
    assert!(driver(0).plan_advance(0.001, true).is_empty());
    assert!(driver(0).plan_initial(true).is_empty());
}

#[test]
fn validate_rejects_missing_barriers() {
    let d = |pass| {
        FrameCommand::Dispatch(Dispatch {
            pass,
            workgroups: 1,
            params: driver(256).params(0.001, pass),
        })
    };

    let no_storage = FramePlan::from(vec![d(Pass::DensityPressure), d(Pass::Forces)]);
    assert_eq!(no_storage.validate(), Err(PlanError::MissingStorageBarrier(Pass::Forces)));

    // a storage-only barrier is not enough for the vertex fetch
    let no_vertex = FramePlan::from(vec![
        d(Pass::Integrate),
        FrameCommand::Barrier(BarrierBits::STORAGE),
        FrameCommand::Draw { instances: 256 },
    ]);
    assert_eq!(no_vertex.validate(), Err(PlanError::MissingVertexBarrier));

    let ok = FramePlan::from(vec![
        d(Pass::Integrate),
        FrameCommand::Barrier(BarrierBits::STORAGE | BarrierBits::VERTEX_ATTRIB),
        FrameCommand::Draw { instances: 256 },
    ]);
    assert_eq!(ok.validate(), Ok(()));
}
