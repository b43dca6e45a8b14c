// layout recipe constants shared by the generator and the demo defaults

/// Particle radius in world units. Grid spacings are multiples of it.
pub const RADIUS: f32 = 0.04;

/// Edge count of the cube layouts (16^3 = 4096 particles).
pub const PARTICLE_NUM_BASE: u32 = 16;

/// Must match `@workgroup_size` in the compute shader.
pub const WORKGROUP_SIZE: u32 = 256;

pub const COMPUTE_SHADER: &str = "shaders/particle_compute.wgsl";
pub const PARTICLE_SHADER: &str = "shaders/particle_draw.wgsl";

pub const DEFAULT_BOUNDING: f32 = 3.2;

/// Step used when the simulation runs on a fixed clock.
pub const FIXED_STEP_MILLIS: f32 = 0.25;
