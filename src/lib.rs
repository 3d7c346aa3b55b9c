//! textured-entity
//!
//! Per-object GPU resource bundles for textured meshes on top of wgpu. An
//! entity owns a small uniform buffer with its model-view-projection matrix
//! and a bind group pairing that buffer with a texture, references a shared
//! mesh, and places itself through a parent-relative transform. Each frame it
//! is updated with the camera's view-projection matrix and drawn with one
//! indexed draw call.
//!
//! High-level modules
//! - `camera`: camera and projection producing the view-projection matrix
//! - `context`: device, queue, layout, pipeline and render targets
//! - `data_structures`: entities, transforms, meshes, textures, hierarchies
//! - `pipelines`: the textured render pipeline entities are drawn with
//! - `resources`: bind group layout and loading of meshes/textures from files
//! - `render`: frame composition
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;

pub use data_structures::{
    entity::{DrawEntity, Entity, EntityUniform},
    mesh::{Mesh, MeshVertex},
    scene_graph::SceneNode,
    texture::Texture,
    transform::Transform,
};

/// Initialises `env_logger` once; later calls only report that a logger exists.
pub fn init_logging() {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };
}
