/* used https://docs.rs/bevy/latest/bevy/render/render_resource/struct.ComputePass.html
as my source for computepass */

use std::borrow::Cow;

use bevy::prelude::*;
use bevy::render::render_resource::{
    CachedComputePipelineId, ComputePassDescriptor, ComputePipeline, ComputePipelineDescriptor,
    PipelineCache, PushConstantRange, ShaderDefVal,
};
use bevy::render::graph::CameraDriverLabel;
use bevy::render::render_graph::{
    Node, NodeRunError, RenderGraph, RenderGraphContext, RenderLabel,
};
use bevy::render::renderer::RenderContext;

use crate::gpu::buffers::{ExtractedParticleFrame, SimulationBindGroupLayout, SimulationBindGroups};

#[derive(Resource)]
pub struct SimulationPipeline(pub ComputePipeline);

#[derive(Debug, Hash, PartialEq, Eq, Clone, RenderLabel)]
pub struct SimulationPassLabel;

/// Runs the compute half of the frame plan. Every barrier in the plan ends
/// the current compute pass; wgpu orders storage writes across pass
/// boundaries, and the draw pass after the camera driver sees the final
/// store as vertex input.
#[derive(Default)]
struct SimulationNode;

impl Node for SimulationNode {
    fn run(
        &self,
        _graph: &mut RenderGraphContext,
        render_context: &mut RenderContext,
        world: &World,
    ) -> Result<(), NodeRunError> {
        let Some(frame) = world.get_resource::<ExtractedParticleFrame>() else { return Ok(()); };
        let Some(pipeline) = world.get_resource::<SimulationPipeline>() else { return Ok(()); };
        let Some(bind_groups) = world.get_resource::<SimulationBindGroups>() else { return Ok(()); };

        if let Err(err) = frame.plan.validate() {
            error!("particle frame plan rejected: {err}");
            return Ok(());
        }

        for segment in frame.plan.compute_segments() {
            let mut pass = render_context
                .command_encoder()
                .begin_compute_pass(&ComputePassDescriptor {
                    label: Some("particle_simulation_pass"),
                    timestamp_writes: None,
                });

            pass.set_pipeline(&pipeline.0);
            for dispatch in &segment {
                pass.set_bind_group(0, bind_groups.for_pass(dispatch.pass), &[]);
                pass.dispatch_workgroups(dispatch.workgroups, 1, 1);
            }
        }

        Ok(())
    }
}

pub fn prepare_simulation_pipeline(
    mut commands: Commands,
    pipeline_cache: Res<PipelineCache>,
    layout: Option<Res<SimulationBindGroupLayout>>,
    frame: Option<Res<ExtractedParticleFrame>>,
    mut pipeline_id: Local<Option<CachedComputePipelineId>>,
) {
    let (Some(layout), Some(frame)) = (layout, frame) else {
        return;
    };

    if pipeline_id.is_none() {
        let Some(shader) = frame.programs.compute.clone() else {
            return;
        };
        let desc = ComputePipelineDescriptor {
            label: Some("particle_simulation_pipeline".into()),
            layout: vec![layout.0.clone()],
            push_constant_ranges: Vec::<PushConstantRange>::new(),
            shader,
            shader_defs: Vec::<ShaderDefVal>::new(),
            entry_point: Cow::from("main"),
            zero_initialize_workgroup_memory: false,
        };
        *pipeline_id = Some(pipeline_cache.queue_compute_pipeline(desc));
        info!("simulation_pipeline QUEUED");
        return; // waits for compilation
    }

    // where grabs the compiled GPU object.
    if let Some(id) = *pipeline_id {
        if let Some(pipeline) = pipeline_cache.get_compute_pipeline(id) {
            commands.insert_resource(SimulationPipeline(pipeline.clone()));
        }
    }
}

pub fn add_simulation_node_to_graph(render_app: &mut bevy::app::SubApp) {
    let mut graph = render_app.world_mut().resource_mut::<RenderGraph>();
    graph.add_node(SimulationPassLabel, SimulationNode::default());
    graph.add_node_edge(SimulationPassLabel, CameraDriverLabel);
}
