use bevy::prelude::*;
use bevy::render::render_resource::{
    BindGroup, BindGroupEntry, BindGroupLayout, BindGroupLayoutEntry, BindingType, Buffer,
    BufferBindingType, BufferDescriptor, BufferInitDescriptor, BufferUsages, ShaderStages,
};
use bevy::render::renderer::{RenderDevice, RenderQueue};
use bevy::render::Extract;

use crate::error::{DeviceError, DeviceLimits};
use crate::gpu::driver::{workgroup_count, FramePlan, Pass};
use crate::gpu::ffi::{GPUParticle, PARTICLE_STRIDE, SimParams};
use crate::manager::{ParticleManager, ParticlePrograms};

// ==================== resources ======================================

/// Device-resident particle array. Bound as a storage buffer by the compute
/// passes and as an instance-rate vertex buffer by the draw pass.
#[derive(Clone)]
pub struct ParticleStore {
    pub buffer: Buffer,
    pub num_particles: u32,
}

/// One uniform buffer per pass so all three parameter sets live in the same
/// submission without overwriting each other.
#[derive(Clone)]
pub struct SimParamsBuffers(pub [Buffer; 3]);

// particles (rw storage) + SimParams (uniform)
#[derive(Resource, Clone)]
pub struct SimulationBindGroupLayout(pub BindGroupLayout);

// one bind group per pass, indexed by Pass::slot
#[derive(Resource)]
pub struct SimulationBindGroups(pub [BindGroup; 3]);

// Rendering world copy of everything a frame needs from the manager
#[derive(Resource, Clone)]
pub struct ExtractedParticleFrame {
    pub store: ParticleStore,
    pub params: SimParamsBuffers,
    pub plan: FramePlan,
    pub programs: ParticlePrograms,
}

// =====================================================================

// Implementations

impl ParticleStore {
    /// Uploads `particles` and drops the host copy. An empty layout still gets
    /// a one-particle buffer since zero-sized bindings are invalid.
    pub fn upload(
        render_device: &RenderDevice,
        particles: Vec<GPUParticle>,
    ) -> Result<Self, DeviceError> {
        let num_particles = particles.len() as u32;
        let limits = DeviceLimits::from(&render_device.limits());
        limits.check(
            num_particles.max(1) as u64 * PARTICLE_STRIDE,
            workgroup_count(num_particles),
        )?;

        let placeholder = [GPUParticle::default()];
        let contents: &[GPUParticle] = if particles.is_empty() {
            &placeholder
        } else {
            &particles
        };

        let buffer = render_device.create_buffer_with_data(&BufferInitDescriptor {
            label: Some("particle_store"),
            contents: bytemuck::cast_slice(contents),
            usage: BufferUsages::STORAGE
                | BufferUsages::VERTEX
                | BufferUsages::COPY_DST
                | BufferUsages::COPY_SRC,
        });

        Ok(Self {
            buffer,
            num_particles,
        })
    }
}

impl SimParamsBuffers {
    pub fn new(render_device: &RenderDevice) -> Self {
        let make = |pass: Pass| {
            render_device.create_buffer(&BufferDescriptor {
                label: Some(match pass {
                    Pass::DensityPressure => "sim_params_pass1",
                    Pass::Forces => "sim_params_pass2",
                    Pass::Integrate => "sim_params_pass3",
                }),
                size: std::mem::size_of::<SimParams>() as u64,
                usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        Self(Pass::ORDER.map(make))
    }

    pub fn for_pass(&self, pass: Pass) -> &Buffer {
        &self.0[pass.slot()]
    }
}

// ========================== systems ==================================

// Startup systems that have to run only once

pub fn init_simulation_bind_group_layout(mut commands: Commands, render_device: Res<RenderDevice>) {
    let layout = render_device.create_bind_group_layout(
        Some("simulation_bind_group_layout"),
        &[
            // binding 0: particles (rw storage)
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::COMPUTE,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Storage { read_only: false },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            // binding 1: SimParams (uniform)
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::COMPUTE,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    );
    commands.insert_resource(SimulationBindGroupLayout(layout));
}

// Extract systems that send from App to Render

pub fn extract_particle_frame(
    mut commands: Commands,
    manager: Extract<Option<Res<ParticleManager>>>,
) {
    match manager.as_ref().and_then(|m| m.extract()) {
        Some(frame) => commands.insert_resource(frame),
        None => commands.remove_resource::<ExtractedParticleFrame>(),
    }
}

pub fn extract_simulation_bind_group_layout(
    mut commands: Commands,
    layout: Extract<Option<Res<SimulationBindGroupLayout>>>,
) {
    if let Some(layout) = layout.as_ref() {
        commands.insert_resource(SimulationBindGroupLayout(layout.0.clone()));
    }
}

// Systems in Render

// every pass reads its own buffer, written before the graph runs
pub fn write_pass_params(render_queue: Res<RenderQueue>, frame: Option<Res<ExtractedParticleFrame>>) {
    let Some(frame) = frame else {
        return;
    };
    for dispatch in frame.plan.dispatches() {
        render_queue.write_buffer(
            frame.params.for_pass(dispatch.pass),
            0,
            bytemuck::bytes_of(&dispatch.params),
        );
    }
}

pub fn prepare_simulation_bind_groups(
    mut commands: Commands,
    render_device: Res<RenderDevice>,
    layout: Option<Res<SimulationBindGroupLayout>>,
    frame: Option<Res<ExtractedParticleFrame>>,
) {
    let (Some(layout), Some(frame)) = (layout, frame) else {
        commands.remove_resource::<SimulationBindGroups>();
        return;
    };

    let bind_groups = Pass::ORDER.map(|pass| {
        render_device.create_bind_group(
            Some("simulation_bind_group"),
            &layout.0,
            &[
                BindGroupEntry {
                    binding: 0,
                    resource: frame.store.buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: frame.params.for_pass(pass).as_entire_binding(),
                },
            ],
        )
    });
    commands.insert_resource(SimulationBindGroups(bind_groups));
}

impl SimulationBindGroups {
    pub fn for_pass(&self, pass: Pass) -> &BindGroup {
        &self.0[pass.slot()]
    }
}
