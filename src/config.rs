use bevy::prelude::Resource;
use glam::{Mat4, Vec3};

use crate::constants::{DEFAULT_BOUNDING, FIXED_STEP_MILLIS, PARTICLE_NUM_BASE};
use crate::cpu::layout::{GenerationMode, SeedPolicy};
use crate::gpu::driver::ComputeGate;
use crate::gpu::ffi::DrawParams;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShadingMode {
    Default,
    VelocityVisual,
    #[default]
    SurfaceColor,
}

impl ShadingMode {
    pub fn index(self) -> u32 {
        match self {
            Self::Default => 0,
            Self::VelocityVisual => 1,
            Self::SurfaceColor => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimeStep {
    /// Use the frame's wall-clock delta.
    WallClock,
    /// Fixed step given in milliseconds.
    Fixed { millis: f32 },
}

impl TimeStep {
    pub const DEFAULT_FIXED: Self = Self::Fixed {
        millis: FIXED_STEP_MILLIS,
    };

    pub fn seconds(self, frame_delta: f32) -> f32 {
        match self {
            Self::WallClock => frame_delta,
            Self::Fixed { millis } => millis / 1000.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
            aspect: 1.0,
            near: 0.1,
        }
    }
}

/// Everything the frame loop feeds the simulation. Changing `generation_mode`
/// or `particle_base` rebuilds the particle manager.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct SimConfig {
    pub generation_mode: GenerationMode,
    pub particle_base: u32, // particle count is base^3
    pub seed: SeedPolicy,
    pub gate: ComputeGate,
    pub running: bool,
    pub time_step: TimeStep,
    pub bounding_x: f32,
    pub bounding_z: f32,
    pub shading: ShadingMode,
    pub lighting: bool,
    pub point_size: f32,
    pub scale: f32,
    pub rot_x: f32,
    pub rot_y: f32,
    pub camera: CameraConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            generation_mode: GenerationMode::SparseCube,
            particle_base: PARTICLE_NUM_BASE,
            seed: SeedPolicy::Fresh,
            gate: ComputeGate::RequireRenderProgram,
            running: false,
            time_step: TimeStep::WallClock,
            bounding_x: DEFAULT_BOUNDING,
            bounding_z: DEFAULT_BOUNDING,
            shading: ShadingMode::SurfaceColor,
            lighting: true,
            point_size: 0.08,
            scale: 0.2,
            rot_x: 0.0,
            rot_y: 0.0,
            camera: CameraConfig::default(),
        }
    }
}

impl SimConfig {
    /// `particle_base^3`, or `None` if that does not fit in a `u32`.
    pub fn particle_count(&self) -> Option<u32> {
        self.particle_base.checked_pow(3)
    }

    // scale * rotate_x * rotate_y, the angles go to the rotation unconverted
    pub fn model_matrix(&self) -> Mat4 {
        let rot = Mat4::from_rotation_x(self.rot_x) * Mat4::from_rotation_y(self.rot_y);
        Mat4::from_scale(Vec3::splat(self.scale)) * rot
    }

    pub fn draw_params(&self) -> DrawParams {
        let cam = &self.camera;
        let view = Mat4::look_at_rh(cam.eye, cam.target, Vec3::Y);
        // reverse-z infinite projection to share the camera's depth buffer
        let proj = Mat4::perspective_infinite_reverse_rh(cam.fov_degrees.to_radians(), cam.aspect, cam.near);
        DrawParams {
            model: self.model_matrix().to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            shading_mode: self.shading.index(),
            lighting: self.lighting as u32,
            point_size: self.point_size,
            _pad: 0.0,
        }
    }
}
