use bevy::core_pipeline::core_3d::CORE_3D_DEPTH_FORMAT;
use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;
use bevy::render::render_resource::{
    CachedPipelineState, CachedRenderPipelineId, ColorTargetState, ColorWrites, CompareFunction,
    DepthBiasState, DepthStencilState, FragmentState, MultisampleState, PipelineCache,
    PrimitiveState, RenderPipelineDescriptor, StencilState, VertexAttribute, VertexBufferLayout,
    VertexFormat, VertexState, VertexStepMode,
};

use super::draw_buffers::DrawBindGroupLayout;
use crate::gpu::buffers::ExtractedParticleFrame;
use crate::gpu::ffi::{
    CURR_POS_OFFSET, FACTOR_OFFSET, PARTICLE_STRIDE, SURFACE_NORM_OFFSET, VEL_OFFSET,
};

// shader locations of the per-particle attributes in particle_draw.wgsl
pub const POSITION_LOCATION: u32 = 1;
pub const VELOCITY_LOCATION: u32 = 2;
pub const NORMAL_LOCATION: u32 = 3;
pub const FACTOR_LOCATION: u32 = 4;

#[derive(Resource)]
pub struct DrawPipeline(pub CachedRenderPipelineId);

/// Slot 0: billboard corner, one per vertex.
pub fn quad_buffer_layout() -> VertexBufferLayout {
    VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 2]>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: vec![VertexAttribute {
            format: VertexFormat::Float32x2,
            offset: 0,
            shader_location: 0,
        }],
    }
}

/// Slot 1: the particle store itself, one particle per instance. Offsets come
/// straight from `GPUParticle` so host and shader cannot drift apart.
pub fn particle_buffer_layout() -> VertexBufferLayout {
    let attribute = |offset, shader_location| VertexAttribute {
        format: VertexFormat::Float32x4,
        offset,
        shader_location,
    };
    VertexBufferLayout {
        array_stride: PARTICLE_STRIDE,
        step_mode: VertexStepMode::Instance,
        attributes: vec![
            attribute(CURR_POS_OFFSET, POSITION_LOCATION),
            attribute(VEL_OFFSET, VELOCITY_LOCATION),
            attribute(SURFACE_NORM_OFFSET, NORMAL_LOCATION),
            attribute(FACTOR_OFFSET, FACTOR_LOCATION),
        ],
    }
}

pub fn prepare_draw_pipeline(
    mut commands: Commands,
    cache: Res<PipelineCache>,
    bgl: Option<Res<DrawBindGroupLayout>>,
    frame: Option<Res<ExtractedParticleFrame>>,
    mut cached: Local<Option<CachedRenderPipelineId>>,
) {
    let Some(bgl) = bgl else {
        return;
    };

    if cached.is_none() {
        let Some(shader) = frame.and_then(|f| f.programs.render.clone()) else {
            return;
        };

        let desc = RenderPipelineDescriptor {
            label: Some("particles_draw_pipeline".into()),
            layout: vec![bgl.0.clone()],
            vertex: VertexState {
                shader: shader.clone(),
                entry_point: "vs_main".into(),
                shader_defs: vec![],
                buffers: vec![quad_buffer_layout(), particle_buffer_layout()],
            },
            fragment: Some(FragmentState {
                shader,
                entry_point: "fs_main".into(),
                shader_defs: vec![],
                targets: vec![Some(ColorTargetState {
                    // non-HDR camera target
                    format: TextureFormat::Rgba8UnormSrgb,
                    blend: None,
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState::default(),
            depth_stencil: Some(DepthStencilState {
                format: CORE_3D_DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::GreaterEqual, // reverse-z
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: MultisampleState {
                count: 4, // camera default Msaa::Sample4
                ..Default::default()
            },
            push_constant_ranges: vec![],
            zero_initialize_workgroup_memory: false,
        };

        let id = cache.queue_render_pipeline(desc);
        *cached = Some(id);
        info!("draw_pipeline QUEUED");
        return;
    }

    if let Some(id) = *cached {
        match cache.get_render_pipeline_state(id) {
            &CachedPipelineState::Ok(_) => {
                commands.insert_resource(DrawPipeline(id));
            }
            &CachedPipelineState::Err(ref err) => {
                error!("draw_pipeline ERROR: {err:?}");
            }
            &CachedPipelineState::Queued => {
                debug!("draw_pipeline QUEUED (waiting for compilation)...");
            }
            &CachedPipelineState::Creating(_) => {
                debug!("draw_pipeline CREATING (compiling now)...");
            }
        }
    }
}
