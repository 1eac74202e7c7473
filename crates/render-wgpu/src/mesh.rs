use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Unit-radius UV sphere with `segments` longitudinal and `rings` latitudinal
/// divisions.
pub(crate) fn uv_sphere(segments: u16, rings: u16) -> (Vec<Vertex>, Vec<u16>) {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut vertices = Vec::with_capacity((segments as usize + 1) * (rings as usize + 1));
    for ring in 0..=rings {
        let theta = ring as f32 / rings as f32 * std::f32::consts::PI;
        let (sin_t, cos_t) = theta.sin_cos();
        for seg in 0..=segments {
            let phi = seg as f32 / segments as f32 * std::f32::consts::TAU;
            let (sin_p, cos_p) = phi.sin_cos();
            let n = [sin_t * cos_p, cos_t, sin_t * sin_p];
            vertices.push(Vertex {
                position: n,
                normal: n,
            });
        }
    }

    let stride = segments + 1;
    let mut indices = Vec::with_capacity(segments as usize * rings as usize * 6);
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * stride + seg;
            let b = a + stride;
            // Counter-clockwise seen from outside.
            indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
        }
    }
    (vertices, indices)
}
