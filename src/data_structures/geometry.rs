//! CPU-side geometries.
//!
//! A [`Geometry`] only describes vertices and indices. The renderer uploads
//! it lazily the first time it is drawn and keeps the GPU buffers keyed by
//! the geometry's [`ResourceId`] until the geometry is disposed, so any number
//! of meshes may share one `Rc<Geometry>`.

use cgmath::{ElementWise, Vector3};

use crate::data_structures::ResourceId;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[derive(Debug)]
pub struct Geometry {
    id: ResourceId,
    pub name: String,
    vertices: Vec<ModelVertex>,
    indices: Vec<u32>,
}

impl Geometry {
    pub fn new(name: &str, vertices: Vec<ModelVertex>, indices: Vec<u32>) -> Self {
        Self {
            id: ResourceId::next(),
            name: name.to_string(),
            vertices,
            indices,
        }
    }

    /// An axis-aligned box centred on the origin.
    ///
    /// Each face gets its own four vertices so normals stay flat. Faces are
    /// wound counter-clockwise when seen from outside.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);
        // (normal, u, v) with u x v == normal
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let n = Vector3::from(normal);
            let centre = n.mul_element_wise(half);
            let u = Vector3::from(u).mul_element_wise(half);
            let v = Vector3::from(v).mul_element_wise(half);
            let base = vertices.len() as u32;
            for corner in [centre - u - v, centre + u - v, centre + u + v, centre - u + v] {
                vertices.push(ModelVertex {
                    position: corner.into(),
                    normal,
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new("box", vertices, indices)
    }

    /// A single quad in the XY plane facing +Z.
    pub fn plane(width: f32, height: f32) -> Self {
        let (w, h) = (width / 2.0, height / 2.0);
        let normal = [0.0, 0.0, 1.0];
        let vertices = [[-w, -h], [w, -h], [w, h], [-w, h]]
            .into_iter()
            .map(|[x, y]| ModelVertex {
                position: [x, y, 0.0],
                normal,
            })
            .collect();

        Self::new("plane", vertices, vec![0, 1, 2, 0, 2, 3])
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn vertices(&self) -> &[ModelVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;

    use super::*;

    #[test]
    fn cuboid_faces_are_wound_outwards() {
        let geometry = Geometry::cuboid(2.0, 4.0, 6.0);
        assert_eq!(geometry.vertices().len(), 24);
        assert_eq!(geometry.indices().len(), 36);

        for triangle in geometry.indices().chunks(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                .map(|i| Vector3::from(geometry.vertices()[i as usize].position));
            let winding = (b - a).cross(c - a).normalize();
            let normal = Vector3::from(geometry.vertices()[triangle[0] as usize].normal);
            assert!(winding.dot(normal) > 0.99, "{:?} vs {:?}", winding, normal);
        }
    }

    #[test]
    fn cuboid_extents_match_dimensions() {
        let geometry = Geometry::cuboid(2.0, 4.0, 6.0);
        let max = geometry.vertices().iter().fold([0.0f32; 3], |acc, v| {
            [
                acc[0].max(v.position[0]),
                acc[1].max(v.position[1]),
                acc[2].max(v.position[2]),
            ]
        });
        assert_eq!(max, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn every_geometry_gets_its_own_id() {
        assert_ne!(Geometry::plane(1.0, 1.0).id(), Geometry::plane(1.0, 1.0).id());
    }
}
