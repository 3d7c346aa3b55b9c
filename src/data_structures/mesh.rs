//! GPU meshes: vertex and index buffers an entity draws from.
//!
//! Meshes are shared between entities (`Arc<Mesh>`), entities never own them.

use wgpu::util::DeviceExt;

/// Describes how the bytes of a vertex type map to shader locations.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl MeshVertex {
    pub const fn new(position: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            tex_coords,
        }
    }
}

/**
 * position at @location(0), tex_coords at @location(1), tightly packed.
 */
impl Vertex for MeshVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
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
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Vertex and index buffers plus what a draw call needs to know about them.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub index_format: wgpu::IndexFormat,
}

impl Mesh {
    /// Uploads a mesh with 16-bit indices, which caps it at 65536 addressable vertices.
    pub fn new(device: &wgpu::Device, name: &str, vertices: &[MeshVertex], indices: &[u16]) -> Self {
        Self::from_raw(
            device,
            name,
            vertices,
            bytemuck::cast_slice(indices),
            indices.len() as u32,
            wgpu::IndexFormat::Uint16,
        )
    }

    /// Uploads a mesh with 32-bit indices.
    pub fn new_u32(
        device: &wgpu::Device,
        name: &str,
        vertices: &[MeshVertex],
        indices: &[u32],
    ) -> Self {
        Self::from_raw(
            device,
            name,
            vertices,
            bytemuck::cast_slice(indices),
            indices.len() as u32,
            wgpu::IndexFormat::Uint32,
        )
    }

    fn from_raw(
        device: &wgpu::Device,
        name: &str,
        vertices: &[MeshVertex],
        index_bytes: &[u8],
        num_elements: u32,
        index_format: wgpu::IndexFormat,
    ) -> Self {
        if num_elements == 0 {
            log::warn!("Mesh {name} has no indices and will never produce a draw call.");
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: index_bytes,
            usage: wgpu::BufferUsages::INDEX,
        });
        log::debug!(
            "Uploaded mesh {name}: {} vertices, {num_elements} indices ({index_format:?})",
            vertices.len()
        );

        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements,
            index_format,
        }
    }

    /// A unit cube centred on the origin, each face mapping the full texture.
    pub fn cube(device: &wgpu::Device) -> Self {
        let (vertices, indices) = cube_geometry();
        Self::new(device, "cube", &vertices, &indices)
    }

    /// A unit quad in the XY plane facing +Z.
    pub fn quad(device: &wgpu::Device) -> Self {
        let (vertices, indices) = quad_geometry();
        Self::new(device, "quad", &vertices, &indices)
    }
}

// Corners are bottom-left, bottom-right, top-right, top-left as seen from
// outside, which makes both triangles counter-clockwise.
const FACE_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
const FACE_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

fn push_face(corners: [[f32; 3]; 4], vertices: &mut Vec<MeshVertex>, indices: &mut Vec<u16>) {
    let base = vertices.len() as u16;
    vertices.extend(
        corners
            .iter()
            .zip(FACE_UVS.iter())
            .map(|(&position, &tex_coords)| MeshVertex::new(position, tex_coords)),
    );
    indices.extend(FACE_INDICES.iter().map(|i| base + i));
}

pub(crate) fn quad_geometry() -> (Vec<MeshVertex>, Vec<u16>) {
    let mut vertices = Vec::with_capacity(4);
    let mut indices = Vec::with_capacity(6);
    push_face(
        [
            [-0.5, -0.5, 0.0],
            [0.5, -0.5, 0.0],
            [0.5, 0.5, 0.0],
            [-0.5, 0.5, 0.0],
        ],
        &mut vertices,
        &mut indices,
    );
    (vertices, indices)
}

pub(crate) fn cube_geometry() -> (Vec<MeshVertex>, Vec<u16>) {
    let h = 0.5;
    let faces = [
        // +Z
        [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]],
        // -Z
        [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]],
        // +X
        [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]],
        // -X
        [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]],
        // +Y
        [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]],
        // -Y
        [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]],
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for corners in faces {
        push_face(corners, &mut vertices, &mut indices);
    }
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;

    #[test]
    fn vertex_layout_matches_struct() {
        let desc = MeshVertex::desc();
        assert_eq!(desc.array_stride, 20);
        assert_eq!(desc.attributes.len(), 2);
        assert_eq!(desc.attributes[1].offset, 12);
    }

    #[test]
    fn cube_has_36_indices_over_24_vertices() {
        let (vertices, indices) = cube_geometry();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn cube_triangles_wind_counter_clockwise_from_outside() {
        let (vertices, indices) = cube_geometry();
        for tri in indices.chunks(3) {
            let p: Vec<Vector3<f32>> = tri
                .iter()
                .map(|&i| Vector3::from(vertices[i as usize].position))
                .collect();
            let normal = (p[1] - p[0]).cross(p[2] - p[0]);
            let centre = (p[0] + p[1] + p[2]) / 3.0;
            assert!(normal.dot(centre) > 0.0, "triangle {tri:?} faces inwards");
        }
    }

    #[test]
    fn quad_faces_positive_z() {
        let (vertices, indices) = quad_geometry();
        assert_eq!(indices, vec![0, 1, 2, 0, 2, 3]);
        let p: Vec<Vector3<f32>> = vertices.iter().map(|v| v.position.into()).collect();
        let normal = (p[1] - p[0]).cross(p[2] - p[0]).normalize();
        assert!((normal.z - 1.0).abs() < 1e-6);
    }
}
