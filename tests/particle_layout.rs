use std::mem::size_of;

use bevy::render::render_resource::{VertexFormat, VertexStepMode};
use real_water::config::{ShadingMode, SimConfig, TimeStep};
use real_water::error::{DeviceError, DeviceLimits};
use real_water::gpu::draw_pipeline::{particle_buffer_layout, quad_buffer_layout};
use real_water::gpu::ffi::{
    CURR_POS_OFFSET, DrawParams, FACTOR_OFFSET, GPUParticle, PARTICLE_STRIDE, SURFACE_NORM_OFFSET,
    SimParams, VEL_OFFSET,
};
use real_water::manager::FrameStats;

#[test]
fn particle_matches_shader_struct() {
    // six vec4<f32>, no padding
    assert_eq!(size_of::<GPUParticle>(), 96);
    assert_eq!(PARTICLE_STRIDE, 96);
    assert_eq!(CURR_POS_OFFSET, 16);
    assert_eq!(VEL_OFFSET, 32);
    assert_eq!(SURFACE_NORM_OFFSET, 64);
    assert_eq!(FACTOR_OFFSET, 80);
}

#[test]
fn uniforms_are_16_byte_multiples() {
    assert_eq!(size_of::<SimParams>(), 32);
    assert_eq!(size_of::<DrawParams>(), 208);
}

#[test]
fn particle_bytes_follow_field_order() {
    let mut p = GPUParticle::at_rest([1.0, 2.0, 3.0]);
    p.vel = [4.0, 5.0, 6.0, 0.0];
    let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&p));
    assert_eq!(&floats[0..4], &[1.0, 2.0, 3.0, 1.0]);
    assert_eq!(&floats[4..8], &[1.0, 2.0, 3.0, 1.0]);
    assert_eq!(&floats[8..12], &[4.0, 5.0, 6.0, 0.0]);
    assert_eq!(&floats[20..24], &[0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn vertex_layout_reads_the_store_per_instance() {
    let layout = particle_buffer_layout();
    assert_eq!(layout.array_stride, 96);
    assert_eq!(layout.step_mode, VertexStepMode::Instance);
    let offsets: Vec<(u64, u32)> = layout
        .attributes
        .iter()
        .map(|a| (a.offset, a.shader_location))
        .collect();
    assert_eq!(offsets, [(16, 1), (32, 2), (64, 3), (80, 4)]);
    assert!(layout.attributes.iter().all(|a| a.format == VertexFormat::Float32x4));

    let quad = quad_buffer_layout();
    assert_eq!(quad.step_mode, VertexStepMode::Vertex);
    assert_eq!(quad.attributes[0].shader_location, 0);
}

#[test]
fn device_limits_reject_oversized_stores() {
    let limits = DeviceLimits {
        max_storage_bytes: 96 * 4096,
        max_workgroups: 16,
    };
    assert_eq!(limits.check(96 * 4096, 16), Ok(()));
    assert_eq!(
        limits.check(96 * 4097, 17),
        Err(DeviceError::BufferTooLarge {
            requested: 96 * 4097,
            limit: 96 * 4096
        })
    );
    assert_eq!(
        limits.check(96, 17),
        Err(DeviceError::TooManyWorkgroups {
            requested: 17,
            limit: 16
        })
    );
}

#[test]
fn config_defaults() {
    let config = SimConfig::default();
    assert_eq!(config.particle_count(), Some(4096));
    assert_eq!(config.bounding_x, 3.2);
    assert_eq!(config.bounding_z, 3.2);
    assert!(!config.running);

    let dp = config.draw_params();
    assert_eq!(dp.shading_mode, 2);
    assert_eq!(dp.lighting, 1);
    // model is a uniform 0.2 scale with no rotation
    assert_eq!(dp.model[0][0], 0.2);
    assert_eq!(dp.model[1][1], 0.2);
    assert_eq!(dp.model[2][2], 0.2);
}

#[test]
fn oversized_particle_base_has_no_count() {
    let config = SimConfig {
        particle_base: 2000,
        ..SimConfig::default()
    };
    assert_eq!(config.particle_count(), None);

    let largest = SimConfig {
        particle_base: 1625,
        ..SimConfig::default()
    };
    assert_eq!(largest.particle_count(), Some(1625 * 1625 * 1625));
}

#[test]
fn shading_modes_and_time_steps() {
    assert_eq!(ShadingMode::Default.index(), 0);
    assert_eq!(ShadingMode::VelocityVisual.index(), 1);
    assert_eq!(ShadingMode::SurfaceColor.index(), 2);

    assert_eq!(TimeStep::WallClock.seconds(0.016), 0.016);
    assert_eq!(TimeStep::Fixed { millis: 5.0 }.seconds(0.016), 0.005);
    assert_eq!(TimeStep::DEFAULT_FIXED.seconds(0.016), 0.00025);
}

#[test]
fn frame_stats_report_once_per_second() {
    let mut stats = FrameStats::default();
    assert!(!stats.tick(0.5));
    assert!(!stats.tick(0.4));
    assert!(stats.tick(0.2));
    assert_eq!(stats.fps, 3);
    assert_eq!(stats.last_delta, 0.2);
    // window restarts after reporting
    assert!(!stats.tick(0.5));
    assert_eq!(stats.fps, 3);
}
