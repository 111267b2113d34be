//! CPU-side mesh generation: unit icospheres and flat rings.

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::Vec3;

use crate::buffer::{BufferAllocator, IndexData, MeshBuffer, VertexPositionNormal, compact_indices};

/// Vertices and triangle indices ready for upload.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<VertexPositionNormal>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Upload, using 16-bit indices when they fit.
    pub fn upload(&self, allocator: &BufferAllocator<'_>, label: &str) -> MeshBuffer {
        let vertices = bytemuck::cast_slice(&self.vertices);
        match compact_indices(&self.indices) {
            Some(short) => allocator.create_mesh(label, vertices, IndexData::U16(&short)),
            None => allocator.create_mesh(label, vertices, IndexData::U32(&self.indices)),
        }
    }
}

/// Unit sphere built by repeatedly splitting an icosahedron's faces at
/// their edge midpoints. Each subdivision quadruples the triangle count.
pub fn icosphere(subdivisions: u32) -> MeshData {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let mut positions: Vec<Vec3> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .into_iter()
    .map(|(x, y, z)| Vec3::new(x, y, z).normalize())
    .collect();

    let mut indices: Vec<u32> = vec![
        0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, 1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7,
        1, 8, 3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, 4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9,
        8, 1,
    ];

    for _ in 0..subdivisions {
        indices = split_faces(&mut positions, &indices);
    }

    MeshData {
        vertices: positions
            .iter()
            .map(|p| VertexPositionNormal {
                position: p.to_array(),
                normal: p.to_array(),
            })
            .collect(),
        indices,
    }
}

fn split_faces(positions: &mut Vec<Vec3>, indices: &[u32]) -> Vec<u32> {
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
        let key = (a.min(b), a.max(b));
        *midpoints.entry(key).or_insert_with(|| {
            positions.push((positions[a as usize] + positions[b as usize]).normalize());
            (positions.len() - 1) as u32
        })
    };

    let mut out = Vec::with_capacity(indices.len() * 4);
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let ab = midpoint(a, b, positions);
        let bc = midpoint(b, c, positions);
        let ca = midpoint(c, a, positions);
        out.extend_from_slice(&[a, ab, ca, b, bc, ab, c, ca, bc, ab, bc, ca]);
    }
    out
}

/// Flat annulus in the XZ plane facing +Y. Draw it without culling to see
/// both sides.
pub fn ring(inner: f32, outer: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity(2 * (segments as usize + 1));
    for i in 0..=segments {
        let angle = i as f32 / segments as f32 * TAU;
        let (sin, cos) = angle.sin_cos();
        for radius in [inner, outer] {
            vertices.push(VertexPositionNormal {
                position: [cos * radius, 0.0, sin * radius],
                normal: [0.0, 1.0, 0.0],
            });
        }
    }

    let mut indices = Vec::with_capacity(segments as usize * 6);
    for i in 0..segments {
        let inner_a = 2 * i;
        let outer_a = inner_a + 1;
        let inner_b = inner_a + 2;
        let outer_b = inner_a + 3;
        // Counter-clockwise seen from +Y.
        indices.extend_from_slice(&[inner_a, inner_b, outer_a, outer_a, inner_b, outer_b]);
    }

    MeshData { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icosphere_vertices_on_unit_sphere() {
        let mesh = icosphere(3);
        for v in &mesh.vertices {
            let len = Vec3::from_array(v.position).length();
            assert!((len - 1.0).abs() < 1e-5, "vertex length {len}");
            assert_eq!(v.position, v.normal);
        }
    }

    #[test]
    fn test_icosphere_counts() {
        assert_eq!(icosphere(0).triangle_count(), 20);
        assert_eq!(icosphere(0).vertices.len(), 12);
        assert_eq!(icosphere(2).triangle_count(), 320);
        // Shared midpoints: V = 10 * 4^n + 2.
        assert_eq!(icosphere(2).vertices.len(), 162);
    }

    #[test]
    fn test_icosphere_indices_in_bounds() {
        let mesh = icosphere(3);
        let n = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn test_ring_radii() {
        let mesh = ring(15.9, 16.1, 64);
        assert_eq!(mesh.vertices.len(), 130);
        assert_eq!(mesh.triangle_count(), 128);
        for (i, v) in mesh.vertices.iter().enumerate() {
            let r = Vec3::from_array(v.position).length();
            let expected = if i % 2 == 0 { 15.9 } else { 16.1 };
            assert!((r - expected).abs() < 1e-4);
            assert_eq!(v.position[1], 0.0);
        }
    }

    #[test]
    fn test_ring_faces_up() {
        let mesh = ring(1.0, 2.0, 8);
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|i| Vec3::from_array(mesh.vertices[i as usize].position));
            let normal = (b - a).cross(c - a);
            assert!(normal.y > 0.0, "triangle faces down: {normal}");
        }
    }

    #[test]
    fn test_ring_segment_floor() {
        assert_eq!(ring(1.0, 2.0, 0).triangle_count(), 6);
    }
}
