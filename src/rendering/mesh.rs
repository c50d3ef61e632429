//! CPU-side mesh generation for the scene's shapes.

use bytemuck::{Pod, Zeroable};
use std::f32::consts::PI;

use crate::scene::Shape;

/// Sphere tessellation (segments around, rings top to bottom)
const SPHERE_SEGMENTS: u32 = 64;
const SPHERE_RINGS: u32 = 64;

/// Vertex data (position + normal + UV coordinates)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed triangle list
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn for_shape(shape: &Shape) -> Self {
        match *shape {
            Shape::Sphere { radius_m } => Self::sphere(radius_m, SPHERE_SEGMENTS, SPHERE_RINGS),
            Shape::Plane { size_m, segments } => Self::plane(size_m, segments.max(1)),
        }
    }

    /// Flat XZ plane grid centered on the origin, facing +Y
    pub fn plane(size_m: f32, segments: u32) -> Self {
        let spacing = size_m / segments as f32;
        let half_size = size_m / 2.0;

        let mut vertices = Vec::with_capacity(((segments + 1) * (segments + 1)) as usize);
        let mut indices = Vec::with_capacity((segments * segments * 6) as usize);

        for z in 0..=segments {
            for x in 0..=segments {
                vertices.push(Vertex {
                    position: [
                        x as f32 * spacing - half_size,
                        0.0,
                        z as f32 * spacing - half_size,
                    ],
                    normal: [0.0, 1.0, 0.0],
                    uv: [x as f32 / segments as f32, z as f32 / segments as f32],
                });
            }
        }

        // Counter-clockwise winding seen from above
        for z in 0..segments {
            for x in 0..segments {
                let top_left = z * (segments + 1) + x;
                let top_right = top_left + 1;
                let bottom_left = (z + 1) * (segments + 1) + x;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }

        Self { vertices, indices }
    }

    /// UV sphere centered on the origin
    pub fn sphere(radius_m: f32, segments: u32, rings: u32) -> Self {
        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);

        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let theta = v * PI;
            for seg in 0..=segments {
                let u = seg as f32 / segments as f32;
                let phi = u * 2.0 * PI;
                let normal = [
                    -phi.cos() * theta.sin(),
                    theta.cos(),
                    phi.sin() * theta.sin(),
                ];
                vertices.push(Vertex {
                    position: normal.map(|c| c * radius_m),
                    normal,
                    uv: [u, v],
                });
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let a = ring * (segments + 1) + seg;
                let b = a + segments + 1;
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }

        Self { vertices, indices }
    }
}
