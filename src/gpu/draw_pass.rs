use bevy::prelude::*;
use bevy::render::render_graph::{NodeRunError, RenderGraphContext, RenderLabel, ViewNode};
use bevy::render::render_resource::StoreOp;
use bevy::render::renderer::RenderContext;
use bevy::render::view::{ViewDepthTexture, ViewTarget};

use crate::gpu::buffers::ExtractedParticleFrame;
use crate::gpu::draw_buffers::{DrawBindGroup, QuadVertexBuffer};
use crate::gpu::draw_pipeline::DrawPipeline;

#[derive(Debug, Hash, PartialEq, Eq, Clone, RenderLabel)]
pub struct ParticlesDrawPassLabel;

/// Draws the particle store as instanced billboards. Only runs when the
/// frame plan ends in a draw; the simulation node has finished all passes by
/// then, so the vertex fetch sees the last pass's output.
#[derive(Default)]
pub struct ParticlesDrawNode;

impl ViewNode for ParticlesDrawNode {
    // 0.16.1: ViewNode runs *per view*; fetch the camera's targets directly
    type ViewQuery = (&'static ViewTarget, &'static ViewDepthTexture);

    fn run(
        &self,
        _graph: &mut RenderGraphContext,
        rcx: &mut RenderContext,
        (view_target, depth): <Self::ViewQuery as bevy::ecs::query::QueryData>::Item<'_>,
        world: &World,
    ) -> Result<(), NodeRunError> {
        let Some(frame) = world.get_resource::<ExtractedParticleFrame>() else {
            return Ok(());
        };
        let Some(instances) = frame.plan.draw_instances() else {
            return Ok(());
        };
        if instances == 0 {
            return Ok(());
        }

        // Pipeline (from PipelineCache)
        let Some(dp) = world.get_resource::<DrawPipeline>() else {
            return Ok(());
        };
        let cache = world.resource::<bevy::render::render_resource::PipelineCache>();
        let Some(pipeline) = cache.get_render_pipeline(dp.0) else {
            return Ok(());
        };

        let Some(bg) = world.get_resource::<DrawBindGroup>() else {
            return Ok(());
        };
        let Some(vb) = world.get_resource::<QuadVertexBuffer>() else {
            return Ok(());
        };

        let mut pass =
            rcx.begin_tracked_render_pass(bevy::render::render_resource::RenderPassDescriptor {
                label: Some("ParticlesDrawPass"),
                color_attachments: &[Some(view_target.get_color_attachment())],
                depth_stencil_attachment: Some(depth.get_attachment(StoreOp::Store)),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

        pass.set_render_pipeline(pipeline);
        pass.set_bind_group(0, &bg.0, &[]);
        pass.set_vertex_buffer(0, vb.buffer.slice(..));
        pass.set_vertex_buffer(1, frame.store.buffer.slice(..));
        pass.draw(0..6, 0..instances);
        Ok(())
    }
}
