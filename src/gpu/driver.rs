//! Per-frame command recording for the particle simulation.
//!
//! The driver never touches the device. It turns the current simulation
//! state into a [`FramePlan`]: an ordered list of compute dispatches,
//! barriers and the final draw. The render world executes that plan in
//! [`crate::gpu::pipeline::SimulationNode`] and
//! [`crate::gpu::draw_pass::ParticlesDrawNode`].

use bevy::log::warn;
use bitflags::bitflags;
use thiserror::Error;

use crate::constants::{DEFAULT_BOUNDING, WORKGROUP_SIZE};
use crate::gpu::ffi::SimParams;

/// Compute program stage selected by the `pass` uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pass {
    DensityPressure,
    Forces,
    Integrate,
}

impl Pass {
    pub const ORDER: [Pass; 3] = [Pass::DensityPressure, Pass::Forces, Pass::Integrate];

    /// Value written to `SimParams::pass` (1, 2 or 3).
    pub fn index(self) -> u32 {
        match self {
            Pass::DensityPressure => 1,
            Pass::Forces => 2,
            Pass::Integrate => 3,
        }
    }

    /// Slot of the pass's uniform buffer and bind group.
    pub fn slot(self) -> usize {
        self.index() as usize - 1
    }

    // what has to be flushed before anything after this pass reads the store
    fn barrier(self) -> BarrierBits {
        match self {
            Pass::DensityPressure => BarrierBits::STORAGE,
            Pass::Forces | Pass::Integrate => BarrierBits::STORAGE | BarrierBits::VERTEX_ATTRIB,
        }
    }
}

bitflags! {
    /// Which later readers a barrier makes the preceding writes visible to.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct BarrierBits: u32 {
        /// Storage buffer reads in a later compute pass.
        const STORAGE = 1 << 0;
        /// Vertex attribute fetches in the draw pass.
        const VERTEX_ATTRIB = 1 << 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Z,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawMode {
    /// Draw the store as it is, no simulation step.
    #[default]
    Initial,
    /// Step the simulation, then draw.
    Update,
}

/// Whether compute passes need a render program to be configured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ComputeGate {
    /// Skip the whole frame when nothing would be drawn.
    #[default]
    RequireRenderProgram,
    /// Always step the simulation; only the draw is skipped.
    Independent,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dispatch {
    pub pass: Pass,
    pub workgroups: u32,
    pub params: SimParams,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameCommand {
    Dispatch(Dispatch),
    Barrier(BarrierBits),
    Draw { instances: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("pass {0:?} reads the store without a storage barrier after the previous pass")]
    MissingStorageBarrier(Pass),
    #[error("draw reads the store without a vertex attribute barrier after the last pass")]
    MissingVertexBarrier,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FramePlan {
    commands: Vec<FrameCommand>,
}

impl From<Vec<FrameCommand>> for FramePlan {
    fn from(commands: Vec<FrameCommand>) -> Self {
        Self { commands }
    }
}

impl FramePlan {
    pub fn commands(&self) -> &[FrameCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn dispatches(&self) -> impl Iterator<Item = &Dispatch> {
        self.commands.iter().filter_map(|c| match c {
            FrameCommand::Dispatch(d) => Some(d),
            _ => None,
        })
    }

    /// Instance count of the draw, if the plan draws at all.
    pub fn draw_instances(&self) -> Option<u32> {
        self.commands.iter().find_map(|c| match c {
            FrameCommand::Draw { instances } => Some(*instances),
            _ => None,
        })
    }

    /// Dispatches grouped by the barriers between them. Every group is
    /// recorded into its own compute pass, so a barrier is a pass boundary.
    pub fn compute_segments(&self) -> Vec<Vec<Dispatch>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for command in &self.commands {
            match command {
                FrameCommand::Dispatch(d) => current.push(*d),
                FrameCommand::Barrier(_) => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
                FrameCommand::Draw { .. } => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        let mut dirty_storage = false;
        let mut dirty_vertex = false;
        for command in &self.commands {
            match command {
                FrameCommand::Dispatch(d) => {
                    if dirty_storage {
                        return Err(PlanError::MissingStorageBarrier(d.pass));
                    }
                    dirty_storage = true;
                    dirty_vertex = true;
                }
                FrameCommand::Barrier(bits) => {
                    if bits.contains(BarrierBits::STORAGE) {
                        dirty_storage = false;
                    }
                    if bits.contains(BarrierBits::VERTEX_ATTRIB) {
                        dirty_vertex = false;
                    }
                }
                FrameCommand::Draw { .. } => {
                    if dirty_vertex {
                        return Err(PlanError::MissingVertexBarrier);
                    }
                }
            }
        }
        Ok(())
    }

    fn push(&mut self, command: FrameCommand) {
        self.commands.push(command);
    }
}

/// Groups needed to cover `particle_count` particles. Rounds up; the compute
/// program drops invocations whose index is `>= particle_count`.
pub fn workgroup_count(particle_count: u32) -> u32 {
    particle_count.div_ceil(WORKGROUP_SIZE)
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationDriver {
    particle_count: u32,
    bounding_x: f32,
    bounding_z: f32,
    gate: ComputeGate,
}

impl SimulationDriver {
    pub fn new(particle_count: u32, gate: ComputeGate) -> Self {
        Self {
            particle_count,
            bounding_x: DEFAULT_BOUNDING,
            bounding_z: DEFAULT_BOUNDING,
            gate,
        }
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    pub fn bounding(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.bounding_x,
            Axis::Z => self.bounding_z,
        }
    }

    pub fn set_bound(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::X => self.bounding_x = value,
            Axis::Z => self.bounding_z = value,
        }
    }

    pub fn workgroups(&self) -> u32 {
        workgroup_count(self.particle_count)
    }

    pub fn params(&self, delta_time: f32, pass: Pass) -> SimParams {
        SimParams {
            delta_time,
            particle_count: self.particle_count,
            pass: pass.index(),
            bounding_x: self.bounding_x,
            bounding_z: self.bounding_z,
            _pad: [0.0; 3],
        }
    }

    /// Draw the store without stepping it.
    pub fn plan_initial(&self, render_ready: bool) -> FramePlan {
        let mut plan = FramePlan::default();
        if !render_ready {
            warn!("particle render program is not set, skipping draw");
            return plan;
        }
        if self.particle_count > 0 {
            plan.push(FrameCommand::Draw {
                instances: self.particle_count,
            });
        }
        plan
    }

    /// Three passes, each followed by its barrier, then the draw.
    pub fn plan_advance(&self, delta_time: f32, render_ready: bool) -> FramePlan {
        let mut plan = FramePlan::default();
        if !render_ready {
            warn!("particle render program is not set, skipping draw");
            if self.gate == ComputeGate::RequireRenderProgram {
                return plan;
            }
        }
        if self.particle_count == 0 {
            return plan;
        }

        let workgroups = self.workgroups();
        for pass in Pass::ORDER {
            plan.push(FrameCommand::Dispatch(Dispatch {
                pass,
                workgroups,
                params: self.params(delta_time, pass),
            }));
            plan.push(FrameCommand::Barrier(pass.barrier()));
        }
        if render_ready {
            plan.push(FrameCommand::Draw {
                instances: self.particle_count,
            });
        }
        plan
    }

    pub fn plan(&self, delta_time: f32, mode: DrawMode, render_ready: bool) -> FramePlan {
        match mode {
            DrawMode::Initial => self.plan_initial(render_ready),
            DrawMode::Update => self.plan_advance(delta_time, render_ready),
        }
    }
}
