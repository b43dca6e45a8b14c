use bevy::core_pipeline::core_3d::graph::{Core3d, Node3d};
use bevy::prelude::*;
use bevy::render::render_graph::{RenderGraph, ViewNodeRunner};
use bevy::render::renderer::RenderDevice;
use bevy::render::{ExtractSchedule, Render, RenderApp, RenderSet};

use crate::config::SimConfig;
use crate::constants::{COMPUTE_SHADER, PARTICLE_SHADER};
use crate::cpu::layout::{self, GenerationMode, SeedPolicy};
use crate::error::ManagerError;
use crate::gpu::buffers::{
    extract_particle_frame, extract_simulation_bind_group_layout, init_simulation_bind_group_layout,
    prepare_simulation_bind_groups, write_pass_params, ExtractedParticleFrame, ParticleStore,
    SimParamsBuffers,
};
use crate::gpu::draw_buffers::{
    extract_draw_bgl, extract_draw_params_buffer, extract_quad_vb, init_draw_bgl,
    init_draw_params, init_quad_vb, prepare_draw_bg, update_draw_params,
};
use crate::gpu::draw_pass::{ParticlesDrawNode, ParticlesDrawPassLabel};
use crate::gpu::draw_pipeline::prepare_draw_pipeline;
use crate::gpu::driver::{Axis, ComputeGate, DrawMode, FramePlan, SimulationDriver};
use crate::gpu::pipeline::{add_simulation_node_to_graph, prepare_simulation_pipeline};

// ==================== resources ======================================

/// Shader handles the manager runs with. Either may be missing; a missing
/// render program turns draws into logged no-ops.
#[derive(Resource, Clone, Debug, Default)]
pub struct ParticlePrograms {
    pub render: Option<Handle<Shader>>,
    pub compute: Option<Handle<Shader>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManagerOptions {
    pub seed: SeedPolicy,
    pub gate: ComputeGate,
}

/// Ask for the store to be regenerated even if mode and count are unchanged.
#[derive(Event, Clone, Copy, Debug, Default)]
pub struct ResetParticles;

#[derive(Resource, Debug, Default)]
pub struct FrameStats {
    pub fps: u32,
    pub last_delta: f32,
    frames: u32,
    timer: f32,
}

/// Device-free half of the manager: the driver, the plan of the current
/// frame and whether the store is still alive.
#[derive(Clone, Debug)]
pub struct ManagerState {
    driver: SimulationDriver,
    render_program: bool,
    torn_down: bool,
    frame: FramePlan,
}

/// Owns the particle store and drives it. Lives in the main world; the render
/// world only sees what [`ParticleManager::extract`] hands over each frame.
#[derive(Resource)]
pub struct ParticleManager {
    programs: ParticlePrograms,
    state: ManagerState,
    store: Option<ParticleStore>,
    params: Option<SimParamsBuffers>,
}

// =====================================================================

// Implementations

impl ManagerState {
    pub fn new(particle_count: u32, gate: ComputeGate, render_program: bool) -> Self {
        Self {
            driver: SimulationDriver::new(particle_count, gate),
            render_program,
            torn_down: false,
            frame: FramePlan::default(),
        }
    }

    pub fn particle_count(&self) -> u32 {
        self.driver.particle_count()
    }

    pub fn workgroups(&self) -> u32 {
        self.driver.workgroups()
    }

    /// Plan recorded by the last draw call, consumed by the extract step.
    pub fn frame(&self) -> &FramePlan {
        &self.frame
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Draw the store without stepping it, used while paused.
    pub fn draw_initial(&mut self) {
        if self.torn_down {
            self.frame = FramePlan::default();
            return;
        }
        self.frame = self.driver.plan_initial(self.render_program);
    }

    /// Step the simulation by `delta_time` and draw the result.
    pub fn advance(&mut self, delta_time: f32) {
        if self.torn_down {
            self.frame = FramePlan::default();
            return;
        }
        self.frame = self.driver.plan_advance(delta_time, self.render_program);
    }

    pub fn draw(&mut self, delta_time: f32, mode: DrawMode) {
        match mode {
            DrawMode::Initial => self.draw_initial(),
            DrawMode::Update => self.advance(delta_time),
        }
    }

    pub fn set_bound(&mut self, axis: Axis, value: f32) {
        self.driver.set_bound(axis, value);
    }

    /// Returns false if the state was already torn down.
    pub fn teardown(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;
        self.frame = FramePlan::default();
        true
    }
}

impl ParticleManager {
    /// Generates the layout, uploads it and allocates the per-pass parameter
    /// buffers. The host copy of the particles is dropped after upload.
    pub fn construct(
        render_device: &RenderDevice,
        particle_count: u32,
        mode: GenerationMode,
        programs: ParticlePrograms,
        options: ManagerOptions,
    ) -> Result<Self, ManagerError> {
        if programs.render.is_none() {
            warn!("particle render program is not set, draws will be skipped");
        }

        let particles = layout::generate_with(mode, particle_count, options.seed);
        if particles.len() != particle_count as usize {
            info!(
                "{} generated {} particles for a requested {}",
                mode.label(),
                particles.len(),
                particle_count
            );
        }

        let store = ParticleStore::upload(render_device, particles)?;
        let state = ManagerState::new(store.num_particles, options.gate, programs.render.is_some());
        let params = SimParamsBuffers::new(render_device);

        info!(
            "particle manager ready: {} particles, {} workgroups per pass",
            store.num_particles,
            state.workgroups()
        );

        Ok(Self {
            programs,
            state,
            store: Some(store),
            params: Some(params),
        })
    }

    /// Particles actually in the store; differs from the requested count
    /// for the grid layouts.
    pub fn particle_count(&self) -> u32 {
        self.state.particle_count()
    }

    pub fn draw(&mut self, delta_time: f32, mode: DrawMode) {
        self.state.draw(delta_time, mode);
    }

    pub fn set_bound(&mut self, axis: Axis, value: f32) {
        self.state.set_bound(axis, value);
    }

    /// Drops every device handle. Calling it again does nothing.
    pub fn teardown(&mut self) {
        if !self.state.teardown() {
            return;
        }
        // buffers are freed once the render world lets go of its copies
        self.store = None;
        self.params = None;
        info!("particle manager torn down");
    }

    pub fn extract(&self) -> Option<ExtractedParticleFrame> {
        let (Some(store), Some(params)) = (&self.store, &self.params) else {
            return None;
        };
        Some(ExtractedParticleFrame {
            store: store.clone(),
            params: params.clone(),
            plan: self.state.frame().clone(),
            programs: self.programs.clone(),
        })
    }
}

impl Drop for ParticleManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl FrameStats {
    // fps is the number of frames seen in the last full second
    pub fn tick(&mut self, delta: f32) -> bool {
        self.last_delta = delta;
        self.timer += delta;
        self.frames += 1;
        if self.timer > 1.0 {
            self.fps = self.frames;
            self.timer = 0.0;
            self.frames = 0;
            return true;
        }
        false
    }
}

// ========================== systems ==================================

// Startup systems that have to run only once

fn load_particle_programs(mut commands: Commands, assets: Res<AssetServer>) {
    commands.insert_resource(ParticlePrograms {
        render: Some(assets.load(PARTICLE_SHADER)),
        compute: Some(assets.load(COMPUTE_SHADER)),
    });
}

// Update systems that have to run per frame

/// Rebuilds the manager on a reset event or when mode / particle count change.
pub fn rebuild_particle_manager(
    mut commands: Commands,
    render_device: Res<RenderDevice>,
    config: Res<SimConfig>,
    programs: Option<Res<ParticlePrograms>>,
    mut resets: EventReader<ResetParticles>,
    mut manager: Option<ResMut<ParticleManager>>,
    mut built_for: Local<Option<(GenerationMode, u32)>>,
) {
    let key = (config.generation_mode, config.particle_base);
    let reset = resets.read().count() > 0;
    if !reset && *built_for == Some(key) {
        return;
    }
    *built_for = Some(key);

    let Some(particle_count) = config.particle_count() else {
        error!(
            "particle base {} is too large, keeping the current particles",
            config.particle_base
        );
        return;
    };

    if let Some(manager) = manager.as_mut() {
        manager.teardown();
    }

    let programs = programs.as_deref().cloned().unwrap_or_default();
    let options = ManagerOptions {
        seed: config.seed,
        gate: config.gate,
    };
    match ParticleManager::construct(&render_device, particle_count, key.0, programs, options) {
        Ok(new_manager) => {
            info!("particles generated with {}", key.0.label());
            commands.insert_resource(new_manager);
        }
        Err(err) => {
            error!("failed to build particle manager: {err}");
            commands.remove_resource::<ParticleManager>();
        }
    }
}

pub fn drive_particles(
    time: Res<Time>,
    config: Res<SimConfig>,
    manager: Option<ResMut<ParticleManager>>,
) {
    let Some(mut manager) = manager else {
        return;
    };

    let dt = config.time_step.seconds(time.delta_secs());
    if config.running {
        manager.set_bound(Axis::X, config.bounding_x);
        manager.set_bound(Axis::Z, config.bounding_z);
        manager.draw(dt, DrawMode::Update);
    } else {
        manager.draw(dt, DrawMode::Initial);
    }
}

fn track_frame_stats(time: Res<Time>, mut stats: ResMut<FrameStats>, manager: Option<Res<ParticleManager>>) {
    if stats.tick(time.delta_secs()) {
        let particles = manager.map(|m| m.particle_count()).unwrap_or(0);
        info!(
            "==== {} fps, {:.3} ms, {} particles ====",
            stats.fps,
            stats.last_delta * 1000.0,
            particles
        );
    }
}

// Plugin

pub struct RealWaterPlugin;

impl Plugin for RealWaterPlugin {
    fn build(&self, app: &mut App) {
        // App
        app.init_resource::<SimConfig>()
            .init_resource::<FrameStats>()
            .add_event::<ResetParticles>()
            .add_systems(
                Startup,
                (
                    load_particle_programs,
                    init_simulation_bind_group_layout,
                    init_draw_bgl,
                    init_draw_params,
                    init_quad_vb,
                ),
            )
            .add_systems(
                Update,
                (
                    (rebuild_particle_manager, drive_particles).chain(),
                    update_draw_params,
                    track_frame_stats,
                ),
            );

        // Render
        let render_app = app.sub_app_mut(RenderApp);
        render_app
            .add_systems(
                ExtractSchedule,
                (
                    extract_particle_frame,
                    extract_simulation_bind_group_layout,
                    extract_draw_params_buffer,
                    extract_draw_bgl,
                    extract_quad_vb,
                ),
            )
            .add_systems(
                Render,
                (
                    write_pass_params.in_set(RenderSet::Prepare),
                    prepare_simulation_pipeline.in_set(RenderSet::Prepare),
                    prepare_draw_pipeline.in_set(RenderSet::Prepare),
                    prepare_simulation_bind_groups.in_set(RenderSet::PrepareBindGroups),
                    prepare_draw_bg.in_set(RenderSet::PrepareBindGroups),
                ),
            );

        add_simulation_node_to_graph(render_app);
        add_draw_node_to_graph(render_app);
    }
}

fn add_draw_node_to_graph(render_app: &mut bevy::app::SubApp) {
    let runner = ViewNodeRunner::<ParticlesDrawNode>::from_world(render_app.world_mut());
    let mut graph = render_app.world_mut().resource_mut::<RenderGraph>();
    let Some(core_3d) = graph.get_sub_graph_mut(Core3d) else {
        warn!("no 3d render graph, particles will not be drawn");
        return;
    };
    core_3d.add_node(ParticlesDrawPassLabel, runner);
    core_3d.add_node_edges((Node3d::MainTransparentPass, ParticlesDrawPassLabel, Node3d::EndMainPass));
}
