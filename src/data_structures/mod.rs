//! Entity data structures: transforms, meshes, textures and hierarchies.
//!
//! - `entity` is the per-object bundle of uniform buffer, bind group and transform
//! - `transform` composes parent-relative placement into a world matrix
//! - `scene_graph` keeps parent matrices of entity trees in sync
//! - `mesh` holds the shared vertex/index buffers entities draw
//! - `texture` is the GPU texture wrapper entities sample

pub mod entity;
pub mod mesh;
pub mod scene_graph;
pub mod texture;
pub mod transform;
