use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

// Host mirror of `struct Particle` in particle_compute.wgsl / particle_draw.wgsl.
// Six vec4<f32>, no implicit padding, 96 bytes per particle.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GPUParticle {
    // not using glam to make sure WGSL compatibility
    pub prev_pos: [f32; 4],
    pub curr_pos: [f32; 4],
    pub vel: [f32; 4],
    pub acc: [f32; 4],
    pub surface_norm: [f32; 4],
    pub factor: [f32; 4], // x density, y pressure, z color field
}

impl GPUParticle {
    /// A particle at rest at `pos`. Both positions are set so the first Verlet
    /// step sees zero velocity.
    pub fn at_rest(pos: [f32; 3]) -> Self {
        let p = [pos[0], pos[1], pos[2], 1.0];
        Self {
            prev_pos: p,
            curr_pos: p,
            vel: [0.0; 4],
            acc: [0.0; 4],
            surface_norm: [0.0; 4],
            factor: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn position(&self) -> [f32; 3] {
        [self.curr_pos[0], self.curr_pos[1], self.curr_pos[2]]
    }
}

pub const PARTICLE_STRIDE: u64 = size_of::<GPUParticle>() as u64;

// vertex attribute offsets read by the draw pipeline
pub const CURR_POS_OFFSET: u64 = offset_of!(GPUParticle, curr_pos) as u64;
pub const VEL_OFFSET: u64 = offset_of!(GPUParticle, vel) as u64;
pub const SURFACE_NORM_OFFSET: u64 = offset_of!(GPUParticle, surface_norm) as u64;
pub const FACTOR_OFFSET: u64 = offset_of!(GPUParticle, factor) as u64;

// uniform for one compute pass; uniform structs are padded to 16 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SimParams {
    pub delta_time: f32,
    pub particle_count: u32,
    pub pass: u32,
    pub bounding_x: f32,
    pub bounding_z: f32,
    pub _pad: [f32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawParams {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub shading_mode: u32,
    pub lighting: u32,
    pub point_size: f32,
    pub _pad: f32,
}
