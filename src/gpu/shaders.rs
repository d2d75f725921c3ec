//! WGSL programs for both scenes.
//!
//! Each program is the shared uniform block, a billboard helper, a scene
//! specific vertex entry point and the shared round-point fragment stage.
//! Points are drawn as instanced quads of six vertices.

use crate::uniforms::FrameUniforms;

const COMMON: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

fn quad_corner(vertex_index: u32) -> vec2<f32> {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    return quad_vertices[vertex_index];
}

// Screen-space quad of `size * point_size` pixels centred on `world`.
fn billboard(world: vec3<f32>, corner: vec2<f32>, size: f32, color: vec3<f32>) -> VertexOutput {
    var clip_pos = uniforms.view_proj * vec4<f32>(world, 1.0);
    let extent = corner * size * uniforms.point_size / max(uniforms.viewport, vec2<f32>(1.0, 1.0));
    clip_pos.x += extent.x * clip_pos.w;
    clip_pos.y += extent.y * clip_pos.w;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.color = color;
    out.uv = corner;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(in.uv);
    if dist > 1.0 {
        discard;
    }
    let alpha = 1.0 - smoothstep(0.4, 1.0, dist);
    return vec4<f32>(in.color, alpha);
}
"#;

const POINTS_VERTEX: &str = r#"
@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) size: f32,
) -> VertexOutput {
    let tinted = mix(uniforms.tint, uniforms.tint * color, uniforms.color_mix);
    return billboard(position, quad_corner(vertex_index), size, tinted);
}
"#;

const ORBITAL_VERTEX: &str = r#"
@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) base: vec3<f32>,
    @location(1) radius: f32,
    @location(2) color: vec3<f32>,
    @location(3) angle: f32,
    @location(4) jitter: vec3<f32>,
    @location(5) angular_speed: f32,
    @location(6) size: f32,
) -> VertexOutput {
    var p = base;
    if angular_speed > 0.0 {
        let a = angle + uniforms.time * angular_speed;
        p = vec3<f32>(cos(a) * radius, base.y, sin(a) * radius);
    }
    p = p * (1.0 + uniforms.zoom * uniforms.zoom_scale);

    let span = max(1.0 - uniforms.chaos_threshold, 0.0001);
    let intensity = clamp((uniforms.zoom - uniforms.chaos_threshold) / span, 0.0, 1.0);
    let pulse = 0.5 + 0.5 * sin(uniforms.time * 4.0 + angle * 7.0);
    p = p + jitter * uniforms.chaos_amplitude * intensity * pulse;

    let tinted = mix(uniforms.tint, uniforms.tint * color, uniforms.color_mix);
    return billboard(p, quad_corner(vertex_index), size, tinted);
}
"#;

/// Program for the blended image point cloud.
pub fn points_shader() -> String {
    format!("{}{}{}", FrameUniforms::WGSL, COMMON, POINTS_VERTEX)
}

/// Program for the orbital field. Motion is evaluated here from `time` and
/// `zoom`; the host never rewrites orbital positions.
pub fn orbital_shader() -> String {
    format!("{}{}{}", FrameUniforms::WGSL, COMMON, ORBITAL_VERTEX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(source: &str) -> naga::Module {
        let module = match naga::front::wgsl::parse_str(source) {
            Ok(m) => m,
            Err(e) => panic!("WGSL parse error:\n{}", e.emit_to_string(source)),
        };
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        );
        if let Err(e) = validator.validate(&module) {
            panic!("WGSL validation error: {:?}", e);
        }
        module
    }

    fn entry_points(module: &naga::Module) -> Vec<&str> {
        module.entry_points.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_points_shader_validates() {
        let module = validate(&points_shader());
        let names = entry_points(&module);
        assert!(names.contains(&"vs_main"));
        assert!(names.contains(&"fs_main"));
    }

    #[test]
    fn test_orbital_shader_validates() {
        let module = validate(&orbital_shader());
        assert_eq!(entry_points(&module).len(), 2);
    }

    #[test]
    fn test_uniform_block_matches_host_layout() {
        let module = validate(&points_shader());
        let mut layouter = naga::proc::Layouter::default();
        layouter.update(module.to_ctx()).unwrap();

        let (handle, _) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some("Uniforms"))
            .unwrap();
        assert_eq!(layouter[handle].size as u64, FrameUniforms::SIZE);
    }
}
