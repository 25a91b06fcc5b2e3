//! WGSL shader sources for the filter compute pipelines.
//!
//! Common conventions:
//! - binding 0: source samples (`array<f32>`, raw 0-255 values)
//! - binding 1: destination samples (`array<f32>`, read_write)
//! - binding 2: `dims` uniform `vec4<u32>` = (width, height, channels, extra)
//! - binding 3: op-specific uniform or storage data, where needed
//!
//! Every kernel runs one thread per destination pixel in 16x16 blocks and
//! quantizes its output (clamp to 0-255, round by +0.5 and floor), so a
//! chain of device ops sees exactly the byte values the CPU path produces.

#![allow(dead_code)]

/// Luma conversion replicated into R, G, B; alpha untouched.
pub const GRAYSCALE: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, c, 0

fn quantize(v: f32) -> f32 {
    return floor(clamp(v, 0.0, 255.0) + 0.5);
}

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let x = id.x;
    let y = id.y;
    let w = dims.x;
    let h = dims.y;
    if x >= w || y >= h { return; }

    let c = dims.z;
    let base = (y * w + x) * c;

    if c < 3u {
        for (var ch = 0u; ch < c; ch = ch + 1u) {
            dst[base + ch] = src[base + ch];
        }
        return;
    }

    let gray = quantize(0.299 * src[base] + 0.587 * src[base + 1u] + 0.114 * src[base + 2u]);
    dst[base] = gray;
    dst[base + 1u] = gray;
    dst[base + 2u] = gray;
    if c >= 4u { dst[base + 3u] = src[base + 3u]; }
}
"#;

/// General convolution with clamp-to-edge sampling.
/// dims.w carries the kernel side length; binding 3 holds the weights.
pub const CONVOLVE: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, c, kernel_size
@group(0) @binding(3) var<storage, read> weights: array<f32>;

fn quantize(v: f32) -> f32 {
    return floor(clamp(v, 0.0, 255.0) + 0.5);
}

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let x = id.x;
    let y = id.y;
    let w = dims.x;
    let h = dims.y;
    if x >= w || y >= h { return; }

    let c = dims.z;
    let k = i32(dims.w);
    let r = k / 2;

    for (var ch = 0u; ch < c; ch = ch + 1u) {
        var sum = 0.0;
        for (var ky = -r; ky <= r; ky = ky + 1) {
            let sy = u32(clamp(i32(y) + ky, 0, i32(h) - 1));
            for (var kx = -r; kx <= r; kx = kx + 1) {
                let sx = u32(clamp(i32(x) + kx, 0, i32(w) - 1));
                let kw = weights[u32((ky + r) * k + (kx + r))];
                sum = sum + src[(sy * w + sx) * c + ch] * kw;
            }
        }
        dst[(y * w + x) * c + ch] = quantize(sum);
    }
}
"#;

/// Sobel gradient magnitude, per channel.
pub const EDGE_DETECT: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, c, 0

fn quantize(v: f32) -> f32 {
    return floor(clamp(v, 0.0, 255.0) + 0.5);
}

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let x = id.x;
    let y = id.y;
    let w = dims.x;
    let h = dims.y;
    if x >= w || y >= h { return; }

    let c = dims.z;
    var wx = array<f32, 9>(-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0);
    var wy = array<f32, 9>(-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0);

    for (var ch = 0u; ch < c; ch = ch + 1u) {
        var gx = 0.0;
        var gy = 0.0;
        for (var ky = -1; ky <= 1; ky = ky + 1) {
            let sy = u32(clamp(i32(y) + ky, 0, i32(h) - 1));
            for (var kx = -1; kx <= 1; kx = kx + 1) {
                let sx = u32(clamp(i32(x) + kx, 0, i32(w) - 1));
                let v = src[(sy * w + sx) * c + ch];
                let ki = u32((ky + 1) * 3 + (kx + 1));
                gx = gx + v * wx[ki];
                gy = gy + v * wy[ki];
            }
        }
        dst[(y * w + x) * c + ch] = quantize(sqrt(gx * gx + gy * gy));
    }
}
"#;

/// Per-sample offset. params.x carries the delta.
pub const BRIGHTNESS: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, c, 0
@group(0) @binding(3) var<uniform> params: vec4<f32>;  // delta, 0, 0, 0

fn quantize(v: f32) -> f32 {
    return floor(clamp(v, 0.0, 255.0) + 0.5);
}

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let x = id.x;
    let y = id.y;
    let w = dims.x;
    let h = dims.y;
    if x >= w || y >= h { return; }

    let c = dims.z;
    let base = (y * w + x) * c;
    for (var ch = 0u; ch < c; ch = ch + 1u) {
        dst[base + ch] = quantize(src[base + ch] + params.x);
    }
}
"#;

/// Saturation scale about the pixel's luma. params.x carries the factor.
pub const SATURATION: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, c, 0
@group(0) @binding(3) var<uniform> params: vec4<f32>;  // factor, 0, 0, 0

fn quantize(v: f32) -> f32 {
    return floor(clamp(v, 0.0, 255.0) + 0.5);
}

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let x = id.x;
    let y = id.y;
    let w = dims.x;
    let h = dims.y;
    if x >= w || y >= h { return; }

    let c = dims.z;
    let base = (y * w + x) * c;

    if c < 3u {
        for (var ch = 0u; ch < c; ch = ch + 1u) {
            dst[base + ch] = src[base + ch];
        }
        return;
    }

    let gray = 0.299 * src[base] + 0.587 * src[base + 1u] + 0.114 * src[base + 2u];
    for (var ch = 0u; ch < 3u; ch = ch + 1u) {
        dst[base + ch] = quantize(gray + params.x * (src[base + ch] - gray));
    }
    if c >= 4u { dst[base + 3u] = src[base + 3u]; }
}
"#;

/// Additive Gaussian noise via Box-Muller with counter-based streams:
/// every sample hashes (seed xor sample index), so no thread reads or
/// advances another thread's stream.
pub const NOISE: &str = r#"
struct NoiseParams {
    seed: vec2<u32>,
    level: f32,
    _pad: f32,
}

@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, c, 0
@group(0) @binding(3) var<uniform> noise_params: NoiseParams;

fn quantize(v: f32) -> f32 {
    return floor(clamp(v, 0.0, 255.0) + 0.5);
}

fn pcg_hash(n: u32) -> u32 {
    let state = n * 747796405u + 2891336453u;
    let word = ((state >> ((state >> 28u) + 4u)) ^ state) * 277803737u;
    return (word >> 22u) ^ word;
}

fn uniform01(n: u32) -> f32 {
    return (f32(pcg_hash(n)) + 1.0) / 4294967296.0;
}

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let x = id.x;
    let y = id.y;
    let w = dims.x;
    let h = dims.y;
    if x >= w || y >= h { return; }

    let c = dims.z;
    let base = (y * w + x) * c;
    for (var ch = 0u; ch < c; ch = ch + 1u) {
        let i = base + ch;
        let u = max(uniform01(noise_params.seed.x ^ (i * 2u)), 1.0e-7);
        let v = uniform01(noise_params.seed.y ^ (i * 2u + 1u));
        let mag = noise_params.level * sqrt(-2.0 * log(u));
        let n = mag * cos(6.28318530718 * v);
        dst[i] = quantize(src[i] + n);
    }
}
"#;

/// Horizontal mirror.
pub const FLIP_H: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, c, 0

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let x = id.x;
    let y = id.y;
    let w = dims.x;
    let h = dims.y;
    if x >= w || y >= h { return; }

    let c = dims.z;
    let src_base = (y * w + x) * c;
    let dst_base = (y * w + (w - 1u - x)) * c;
    for (var ch = 0u; ch < c; ch = ch + 1u) {
        dst[dst_base + ch] = src[src_base + ch];
    }
}
"#;

/// Vertical mirror.
pub const FLIP_V: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, c, 0

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let x = id.x;
    let y = id.y;
    let w = dims.x;
    let h = dims.y;
    if x >= w || y >= h { return; }

    let c = dims.z;
    let src_base = (y * w + x) * c;
    let dst_base = ((h - 1u - y) * w + x) * c;
    for (var ch = 0u; ch < c; ch = ch + 1u) {
        dst[dst_base + ch] = src[src_base + ch];
    }
}
"#;

/// One clockwise quarter turn. dims describe the source; the destination
/// is (h, w) with (x, y) mapping to (h - 1 - y, x).
pub const ROTATE90: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // src w, h, c, 0

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let x = id.x;
    let y = id.y;
    let w = dims.x;
    let h = dims.y;
    if x >= w || y >= h { return; }

    let c = dims.z;
    let new_w = h;
    let new_x = h - 1u - y;
    let new_y = x;
    let src_base = (y * w + x) * c;
    let dst_base = (new_y * new_w + new_x) * c;
    for (var ch = 0u; ch < c; ch = ch + 1u) {
        dst[dst_base + ch] = src[src_base + ch];
    }
}
"#;

/// Arbitrary-angle rotation by inverse mapping, black fill outside the
/// source. params = (sin, cos, cx, cy), precomputed on the host.
pub const ROTATE_ANGLE: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, c, 0
@group(0) @binding(3) var<uniform> params: vec4<f32>;  // sin, cos, cx, cy

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let x = id.x;
    let y = id.y;
    let w = dims.x;
    let h = dims.y;
    if x >= w || y >= h { return; }

    let c = dims.z;
    let dx = f32(x) - params.z;
    let dy = f32(y) - params.w;
    let sx = i32(dx * params.y - dy * params.x + params.z);
    let sy = i32(dx * params.x + dy * params.y + params.w);

    let dst_base = (y * w + x) * c;
    if sx >= 0 && sx < i32(w) && sy >= 0 && sy < i32(h) {
        let src_base = (u32(sy) * w + u32(sx)) * c;
        for (var ch = 0u; ch < c; ch = ch + 1u) {
            dst[dst_base + ch] = src[src_base + ch];
        }
    } else {
        for (var ch = 0u; ch < c; ch = ch + 1u) {
            dst[dst_base + ch] = 0.0;
        }
    }
}
"#;

/// Block-average downsampling. dims describe the source; dims.w is the
/// factor, and threads cover the destination grid.
pub const DOWNSAMPLE: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // src w, h, c, factor

fn quantize(v: f32) -> f32 {
    return floor(clamp(v, 0.0, 255.0) + 0.5);
}

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let x = id.x;
    let y = id.y;
    let w = dims.x;
    let h = dims.y;
    let c = dims.z;
    let f = dims.w;

    let new_w = max(w / f, 1u);
    let new_h = max(h / f, 1u);
    if x >= new_w || y >= new_h { return; }

    for (var ch = 0u; ch < c; ch = ch + 1u) {
        var sum = 0.0;
        var count = 0u;
        for (var dy = 0u; dy < f; dy = dy + 1u) {
            let sy = y * f + dy;
            if sy >= h { continue; }
            for (var dx = 0u; dx < f; dx = dx + 1u) {
                let sx = x * f + dx;
                if sx >= w { continue; }
                sum = sum + src[(sy * w + sx) * c + ch];
                count = count + 1u;
            }
        }
        dst[(y * new_w + x) * c + ch] = quantize(sum / f32(count));
    }
}
"#;
