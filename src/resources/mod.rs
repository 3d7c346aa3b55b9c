/**
 * This module contains all logic for loading meshes and textures from external files
 * and the bind group layout entities are created against.
 */
pub mod mesh;
pub mod texture;

pub use mesh::load_mesh_obj;
pub use texture::{entity_layout, load_texture};

use anyhow::Context as _;

/// Relative names resolve against `./assets`, absolute paths are used as they are.
fn asset_path(file_name: &str) -> std::path::PathBuf {
    std::path::Path::new("./").join("assets").join(file_name)
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    let path = asset_path(file_name);
    let txt = std::fs::read_to_string(&path)
        .with_context(|| format!("could not read {}", path.display()))?;
    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    let path = asset_path(file_name);
    let data = std::fs::read(&path).with_context(|| format!("could not read {}", path.display()))?;
    Ok(data)
}
