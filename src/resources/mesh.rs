use std::io::{BufReader, Cursor};

use anyhow::Context as _;

use crate::{
    data_structures::mesh::{Mesh, MeshVertex},
    resources::load_string,
};

/**
 * Loads every model of an OBJ file as its own mesh.
 *
 * Materials referenced by the file are ignored: entities get their texture
 * separately, so only positions, texture coordinates and indices are read.
 */
pub async fn load_mesh_obj(file_name: &str, device: &wgpu::Device) -> anyhow::Result<Vec<Mesh>> {
    let obj_text = load_string(file_name).await?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, _materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| async move {
            log::debug!("Skipping material library {p}");
            let skipped: tobj::MTLLoadResult = Err(tobj::LoadError::OpenFileFailed);
            skipped
        },
    )
    .await
    .with_context(|| format!("failed to parse {file_name}"))?;

    if models.is_empty() {
        log::warn!("{file_name} contains no models.");
    }
    Ok(models
        .iter()
        .map(|m| {
            let vertices = obj_vertices(&m.mesh);
            let name = if m.name.is_empty() {
                file_name.to_string()
            } else {
                format!("{file_name}:{}", m.name)
            };
            Mesh::new_u32(device, &name, &vertices, &m.mesh.indices)
        })
        .collect())
}

/// OBJ texture coordinates have V pointing up, wgpu samples with V pointing down.
pub(crate) fn obj_vertices(mesh: &tobj::Mesh) -> Vec<MeshVertex> {
    (0..mesh.positions.len() / 3)
        .map(|i| {
            MeshVertex::new(
                [
                    mesh.positions[i * 3],
                    mesh.positions[i * 3 + 1],
                    mesh.positions[i * 3 + 2],
                ],
                [
                    mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                    1.0 - mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                ],
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::obj_vertices;

    #[test]
    fn flips_v_and_defaults_missing_uvs() {
        let mesh = tobj::Mesh {
            positions: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            texcoords: vec![0.25, 0.25],
            ..Default::default()
        };
        let vertices = obj_vertices(&mesh);
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[0].position, [0.0, 1.0, 2.0]);
        assert_eq!(vertices[0].tex_coords, [0.25, 0.75]);
        assert_eq!(vertices[1].tex_coords, [0.0, 1.0]);
    }
}
