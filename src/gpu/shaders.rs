/// WGSL shader code for the 3D world scene
///
/// Two modules: the scene shader carries the lit mesh entry points plus
/// the wireframe placeholder entry points (they share the Globals
/// uniform), and the sky shader paints the gradient backdrop with a
/// full-screen triangle.

/// Lit scene shader: mesh/ground triangles and placeholder lines
///
/// Lighting mirrors the original scene setup:
/// - ambient, intensity 0.5
/// - directional from (10, 10, 5), intensity 1.0
/// - point at (-10, 10, -10), intensity 0.5 with soft falloff
pub const SCENE_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    camera_pos: vec4<f32>,
    ambient: vec4<f32>,     // rgb, intensity
    sun: vec4<f32>,         // xyz direction toward the light, intensity
    point_light: vec4<f32>, // xyz position, intensity
}

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    let world = globals.model * vec4<f32>(input.position, 1.0);

    var output: VertexOutput;
    output.clip_position = globals.view_proj * world;
    output.world_position = world.xyz;
    output.normal = (globals.model * vec4<f32>(input.normal, 0.0)).xyz;
    output.color = input.color;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    var normal = normalize(input.normal);
    // Light both faces; generated meshes have no reliable winding
    if (dot(normal, globals.camera_pos.xyz - input.world_position) < 0.0) {
        normal = -normal;
    }

    let sun = max(dot(normal, normalize(globals.sun.xyz)), 0.0) * globals.sun.w;

    let to_point = globals.point_light.xyz - input.world_position;
    let point_dist = length(to_point);
    let point = max(dot(normal, to_point / max(point_dist, 0.001)), 0.0)
        * globals.point_light.w
        / (1.0 + 0.002 * point_dist * point_dist);

    let light = globals.ambient.rgb * globals.ambient.a + vec3<f32>(sun + point);

    return vec4<f32>(input.color.rgb * light, input.color.a);
}

// ========== Wireframe placeholder ==========

@vertex
fn vs_line(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return globals.view_proj * globals.model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_line() -> @location(0) vec4<f32> {
    // #4299e1, the loading-cube blue
    return vec4<f32>(0.259, 0.600, 0.882, 1.0);
}
"#;

/// Sky gradient backdrop, drawn first with depth writes off
pub const SKY_SHADER: &str = r#"
struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) height: f32,
}

@vertex
fn vs_sky(@builtin(vertex_index) vertex_index: u32) -> SkyOutput {
    // Full-screen triangle covering the viewport
    let x = f32(i32(vertex_index & 1u) * 4 - 1);
    let y = f32(i32(vertex_index >> 1u) * 4 - 1);

    var output: SkyOutput;
    output.clip_position = vec4<f32>(x, y, 1.0, 1.0);
    output.height = (y + 1.0) * 0.5;
    return output;
}

@fragment
fn fs_sky(input: SkyOutput) -> @location(0) vec4<f32> {
    // Warm horizon fading into a dusk blue zenith
    let horizon = vec3<f32>(0.83, 0.58, 0.40);
    let zenith = vec3<f32>(0.16, 0.27, 0.47);
    let t = clamp(input.height, 0.0, 1.0);
    return vec4<f32>(mix(horizon, zenith, pow(t, 0.8)), 1.0);
}
"#;
