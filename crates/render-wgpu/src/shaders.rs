/// WGSL shader for the instanced spheres.
///
/// `fs_main` shades straight to the surface. `fs_glow` writes untonemapped
/// color plus the emissive channel into two HDR targets for the bloom chain.
pub const SCENE_SHADER: &str = r#"
const PI: f32 = 3.14159265;

struct Globals {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(0) @binding(1)
var env_map: texture_2d<f32>;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) base_color: vec4<f32>,
    @location(7) surface: vec4<f32>,
    @location(8) emissive: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) base_color: vec4<f32>,
    @location(3) surface: vec4<f32>,
    @location(4) emissive: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = globals.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.base_color = instance.base_color;
    out.surface = instance.surface;
    out.emissive = instance.emissive.rgb;
    return out;
}

// Equirectangular lookup, nearest texel.
fn sample_env(dir: vec3<f32>) -> vec3<f32> {
    let dims = vec2<f32>(textureDimensions(env_map));
    let u = atan2(dir.z, dir.x) / (2.0 * PI) + 0.5;
    let v = acos(clamp(dir.y, -1.0, 1.0)) / PI;
    let texel = vec2<i32>(min(vec2<f32>(u, v) * dims, dims - 1.0));
    return textureLoad(env_map, texel, 0).rgb;
}

fn shade(in: VertexOutput) -> vec3<f32> {
    let n = normalize(in.world_normal);
    let v = normalize(globals.eye.xyz - in.world_pos);
    let r = reflect(-v, n);
    let base = in.base_color.rgb;
    let roughness = in.surface.x;
    let metalness = in.surface.y;

    let f0 = mix(vec3<f32>(0.04), base, metalness);
    let fresnel = f0 + (1.0 - f0) * pow(1.0 - max(dot(n, v), 0.0), 5.0);
    let specular = sample_env(r) * fresnel * (1.0 - roughness * 0.7);
    let diffuse = base * (1.0 - metalness) * sample_env(n);
    return diffuse + specular + in.emissive;
}

fn tonemap(c: vec3<f32>) -> vec3<f32> {
    return c / (c + vec3<f32>(1.0));
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(tonemap(shade(in)), 1.0);
}

struct GlowOutput {
    @location(0) color: vec4<f32>,
    @location(1) glow: vec4<f32>,
};

@fragment
fn fs_glow(in: VertexOutput) -> GlowOutput {
    var out: GlowOutput;
    out.color = vec4<f32>(shade(in), 1.0);
    out.glow = vec4<f32>(in.emissive, 1.0);
    return out;
}
"#;

/// WGSL shader for the bloom chain: extract, separable blur, composite.
///
/// Every pass is a fullscreen triangle reading `tex_a` (and `tex_b` for the
/// composite).
pub const BLOOM_SHADER: &str = r#"
struct PostParams {
    texel: vec2<f32>,
    direction: vec2<f32>,
    strength: f32,
    radius: f32,
    threshold: f32,
    _pad: f32,
};

@group(0) @binding(0)
var tex_a: texture_2d<f32>;
@group(0) @binding(1)
var tex_b: texture_2d<f32>;
@group(0) @binding(2)
var samp: sampler;
@group(0) @binding(3)
var<uniform> params: PostParams;

struct FullscreenOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) index: u32) -> FullscreenOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: FullscreenOutput;
    out.clip_position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_extract(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let c = textureSample(tex_a, samp, in.uv).rgb;
    let brightness = max(c.r, max(c.g, c.b));
    let keep = max(brightness - params.threshold, 0.0) / max(brightness, 0.0001);
    return vec4<f32>(c * keep, 1.0);
}

@fragment
fn fs_blur(in: FullscreenOutput) -> @location(0) vec4<f32> {
    var weights = array<f32, 5>(0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);
    let step = params.direction * params.texel * (1.0 + params.radius * 4.0);
    var acc = textureSample(tex_a, samp, in.uv).rgb * weights[0];
    for (var i = 1; i < 5; i++) {
        let offset = step * f32(i);
        acc += textureSample(tex_a, samp, in.uv + offset).rgb * weights[i];
        acc += textureSample(tex_a, samp, in.uv - offset).rgb * weights[i];
    }
    return vec4<f32>(acc, 1.0);
}

@fragment
fn fs_composite(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let scene = textureSample(tex_a, samp, in.uv).rgb;
    let bloom = textureSample(tex_b, samp, in.uv).rgb;
    let c = scene + bloom * params.strength;
    return vec4<f32>(c / (c + vec3<f32>(1.0)), 1.0);
}
"#;
