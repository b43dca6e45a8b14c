use bevy::prelude::*;
use bevy::render::render_resource::*;
use bevy::render::renderer::{RenderDevice, RenderQueue};
use bevy::render::Extract;

use crate::config::SimConfig;
use crate::gpu::ffi::DrawParams;

// ---------------- Types ----------------

#[derive(Resource)]
pub struct DrawParamsBuffer {
    pub buffer: Buffer,
}

#[derive(Resource, Clone)]
pub struct DrawBindGroupLayout(pub BindGroupLayout);

#[derive(Resource)]
pub struct DrawBindGroup(pub BindGroup);

#[derive(Resource)]
pub struct QuadVertexBuffer {
    pub buffer: Buffer,
}

#[derive(Resource, Clone)]
pub struct ExtractedDrawParamsBuffer {
    pub buffer: Buffer,
}

// billboard corners, expanded around each particle in the vertex shader
pub const QUAD_VERTS: &[[f32; 2]] = &[
    [-0.5, -0.5],
    [0.5, -0.5],
    [0.5, 0.5],
    [-0.5, -0.5],
    [0.5, 0.5],
    [-0.5, 0.5],
];

pub fn extract_draw_params_buffer(
    mut commands: Commands,
    dp: Extract<Option<Res<DrawParamsBuffer>>>,
) {
    if let Some(dp) = dp.as_ref() {
        commands.insert_resource(ExtractedDrawParamsBuffer {
            buffer: dp.buffer.clone(),
        });
    }
}

pub fn extract_quad_vb(mut commands: Commands, vb: Extract<Option<Res<QuadVertexBuffer>>>) {
    if let Some(vb) = vb.as_ref() {
        commands.insert_resource(QuadVertexBuffer {
            buffer: vb.buffer.clone(),
        });
    }
}

pub fn extract_draw_bgl(mut commands: Commands, bgl: Extract<Option<Res<DrawBindGroupLayout>>>) {
    if let Some(bgl) = bgl.as_ref() {
        commands.insert_resource(DrawBindGroupLayout(bgl.0.clone()));
    }
}

// Create the DrawParams UBO from the startup config
pub fn init_draw_params(mut commands: Commands, rd: Res<RenderDevice>, config: Res<SimConfig>) {
    let dp = config.draw_params();
    let buffer = rd.create_buffer_with_data(&BufferInitDescriptor {
        label: Some("draw_params_uniform"),
        contents: bytemuck::bytes_of(&dp),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });
    commands.insert_resource(DrawParamsBuffer { buffer });
}

// shading mode, lighting and the model transform can change every frame
pub fn update_draw_params(rq: Res<RenderQueue>, dp: Option<Res<DrawParamsBuffer>>, config: Res<SimConfig>) {
    let Some(dp) = dp else {
        return;
    };
    let dp_cpu: DrawParams = config.draw_params();
    rq.write_buffer(&dp.buffer, 0, bytemuck::bytes_of(&dp_cpu));
}

pub fn init_quad_vb(mut commands: Commands, rd: Res<RenderDevice>) {
    let vb = rd.create_buffer_with_data(&BufferInitDescriptor {
        label: Some("particle_quad_vb"),
        contents: bytemuck::cast_slice(QUAD_VERTS),
        usage: BufferUsages::VERTEX,
    });
    commands.insert_resource(QuadVertexBuffer { buffer: vb });
}

// Layout: 0 = draw params UBO. Particles come in as vertex attributes.
pub fn init_draw_bgl(mut commands: Commands, rd: Res<RenderDevice>) {
    let bgl = rd.create_bind_group_layout(
        Some("draw_bgl"),
        &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    );
    commands.insert_resource(DrawBindGroupLayout(bgl));
    info!("draw_bgl is READY");
}

// ---------------- Systems (Render world) ----------------

pub fn prepare_draw_bg(
    mut commands: Commands,
    rd: Res<RenderDevice>,
    layout: Option<Res<DrawBindGroupLayout>>,
    dp: Option<Res<ExtractedDrawParamsBuffer>>,
    mut ready: Local<bool>,
) {
    let (Some(layout), Some(dp)) = (layout, dp) else {
        return;
    };
    let bg = rd.create_bind_group(
        Some("draw_bg"),
        &layout.0,
        &[BindGroupEntry {
            binding: 0,
            resource: dp.buffer.as_entire_binding(),
        }],
    );
    commands.insert_resource(DrawBindGroup(bg));
    if !*ready {
        info!("draw_bg is READY");
        *ready = true;
    }
}
