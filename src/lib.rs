pub mod config;
pub mod constants;
pub mod error;
pub mod manager;

pub mod cpu {
    pub mod layout;
}

pub mod gpu {
    pub mod ffi;
    pub mod buffers;
    pub mod driver;
    pub mod pipeline;
    pub mod draw_buffers;
    pub mod draw_pipeline;
    pub mod draw_pass;
}

pub use config::{ShadingMode, SimConfig, TimeStep};
pub use cpu::layout::{GenerationMode, SeedPolicy};
pub use error::{DeviceError, ManagerError};
pub use gpu::driver::{Axis, ComputeGate, DrawMode};
pub use manager::{ParticleManager, ParticlePrograms, RealWaterPlugin, ResetParticles};
