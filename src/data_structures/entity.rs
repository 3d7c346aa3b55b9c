//! Textured, transformable draw objects.
//!
//! An [`Entity`] is the per-object resource bundle of the renderer:
//!
//! - a 64 byte uniform buffer holding the model-view-projection matrix
//! - a bind group pairing that buffer with a texture view and sampler
//! - a [`Transform`] relative to an optional parent
//!
//! Mesh and texture are shared and only referenced. Each frame the caller
//! runs [`Entity::update`] with the camera's view-projection matrix and then
//! records [`Entity::draw`] into a render pass whose pipeline was built with
//! [`entity_layout`](crate::resources::texture::entity_layout) at group 0.

use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::{mesh::Mesh, texture::Texture, transform::Transform};

/// Bind group slot the entity's resources are bound to.
pub const ENTITY_BIND_GROUP: u32 = 0;

/**
 * The data stored in the entity's uniform buffer: model, view and projection
 * multiplied into one matrix.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EntityUniform {
    pub mvp: [[f32; 4]; 4],
}

impl EntityUniform {
    pub const SIZE: wgpu::BufferAddress =
        std::mem::size_of::<EntityUniform>() as wgpu::BufferAddress;

    pub fn new(mvp: Matrix4<f32>) -> Self {
        Self { mvp: mvp.into() }
    }

    pub fn from_matrices(view_proj: Matrix4<f32>, model: Matrix4<f32>) -> Self {
        Self::new(view_proj * model)
    }
}

impl Default for EntityUniform {
    fn default() -> Self {
        Self::new(Matrix4::identity())
    }
}

#[derive(Debug)]
pub struct Entity {
    mesh: Arc<Mesh>,
    texture: Arc<Texture>,
    transform: Transform,
    model: Matrix4<f32>,
    uniform: EntityUniform,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Entity {
    /// Creates the uniform buffer and the bind group of a new entity.
    ///
    /// `layout` must be the [`entity_layout`](crate::resources::texture::entity_layout)
    /// (or a compatible one) that the drawing pipeline was created with.
    /// `sampler` is bound next to the texture's view; pass `&texture.sampler`
    /// to keep the texture's own filtering.
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        mesh: Arc<Mesh>,
        texture: Arc<Texture>,
    ) -> Self {
        let uniform = EntityUniform::default();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Entity Uniform Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some(&format!("{} Entity Bind Group", mesh.name)),
        });
        log::debug!("Created entity for mesh {}", mesh.name);

        Self {
            mesh,
            texture,
            transform: Transform::default(),
            model: Matrix4::identity(),
            uniform,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Recomputes the MVP from `view_proj` and the current transform and
    /// writes it into the uniform buffer.
    ///
    /// The write lands before any command buffer submitted afterwards, so an
    /// `update` followed by recording and submitting a frame always draws with
    /// the new matrix.
    pub fn update(&mut self, queue: &wgpu::Queue, view_proj: Matrix4<f32>) {
        self.model = self.model_matrix();
        self.uniform = EntityUniform::from_matrices(view_proj, self.model);
        log::trace!("Writing MVP of entity {}", self.mesh.name);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }

    /// Records the draw call for this entity into `render_pass`.
    ///
    /// The pass must already have a pipeline set whose layout has the entity
    /// layout at group [`ENTITY_BIND_GROUP`].
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.draw_entity(self);
    }

    /// World matrix from the transform: `parent * T * Ry * Rx * Rz * S`.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.transform.model_matrix()
    }

    /// World space position, the translation column of [`Self::model_matrix`].
    pub fn world_position(&self) -> Vector3<f32> {
        self.transform.world_position()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn set_parent(&mut self, parent: Matrix4<f32>) {
        self.transform.parent = parent;
    }

    /// Makes `parent`'s current world matrix the parent matrix of `self`.
    ///
    /// This is a snapshot: moving `parent` later has no effect until it is
    /// attached again. [`SceneNode`](crate::data_structures::scene_graph::SceneNode)
    /// keeps whole hierarchies in sync.
    pub fn attach_to(&mut self, parent: &Entity) {
        self.set_parent(parent.model_matrix());
    }

    pub fn detach(&mut self) {
        self.set_parent(Matrix4::identity());
    }

    /// The model matrix the last [`Self::update`] used (identity before the first one).
    pub fn last_model_matrix(&self) -> Matrix4<f32> {
        self.model
    }

    /// The matrix written by the last [`Self::update`] (identity before the first one).
    pub fn mvp(&self) -> Matrix4<f32> {
        self.uniform.mvp.into()
    }

    pub fn uniform(&self) -> &EntityUniform {
        &self.uniform
    }

    pub fn uniform_buffer(&self) -> &wgpu::Buffer {
        &self.uniform_buffer
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn texture(&self) -> &Arc<Texture> {
        &self.texture
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        log::debug!("Releasing uniform buffer of entity {}", self.mesh.name);
        self.uniform_buffer.destroy();
    }
}

/// Extension for recording entities straight into a `wgpu::RenderPass`.
pub trait DrawEntity {
    fn draw_entity(&mut self, entity: &Entity);
}

impl DrawEntity for wgpu::RenderPass<'_> {
    fn draw_entity(&mut self, entity: &Entity) {
        let mesh = &entity.mesh;
        if mesh.num_elements == 0 {
            log::warn!("Skipping entity {}: its mesh has no indices.", mesh.name);
            return;
        }
        self.set_bind_group(ENTITY_BIND_GROUP, &entity.bind_group, &[]);
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), mesh.index_format);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }
}
