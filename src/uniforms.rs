//! Per-frame uniform block shared by both render pipelines.
//!
//! The host writes one [`FrameUniforms`] per frame; the WGSL declaration in
//! [`FrameUniforms::WGSL`] must list the same fields in the same order.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Uniform block layout (WGSL uniform address space rules):
///
/// | offset | field |
/// |--------|-------|
/// | 0 | `view_proj: mat4x4<f32>` |
/// | 64 | `tint: vec3<f32>` |
/// | 76 | `point_size: f32` |
/// | 80 | `viewport: vec2<f32>` |
/// | 88 | `time`, `zoom`, `chaos_threshold`, `chaos_amplitude`, `zoom_scale`, `color_mix` |
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub tint: [f32; 3],
    /// Point diameter in pixels.
    pub point_size: f32,
    /// Output size in pixels.
    pub viewport: [f32; 2],
    pub time: f32,
    pub zoom: f32,
    pub chaos_threshold: f32,
    pub chaos_amplitude: f32,
    pub zoom_scale: f32,
    /// 0 colours points by the tint alone, 1 by tint times per-point colour.
    pub color_mix: f32,
}

impl FrameUniforms {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub const WGSL: &'static str = r#"struct Uniforms {
    view_proj: mat4x4<f32>,
    tint: vec3<f32>,
    point_size: f32,
    viewport: vec2<f32>,
    time: f32,
    zoom: f32,
    chaos_threshold: f32,
    chaos_amplitude: f32,
    zoom_scale: f32,
    color_mix: f32,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;
"#;

    pub fn new(view_proj: Mat4, tint: Vec3, point_size: f32, viewport: (u32, u32)) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            tint: tint.to_array(),
            point_size,
            viewport: [viewport.0 as f32, viewport.1 as f32],
            ..Self::zeroed()
        }
    }
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Vec3::ONE, 1.0, (1, 1))
    }
}
