#![cfg(feature = "integration-tests")]

mod common;

use std::sync::Arc;

use common::*;
use textured_entity::resources::{load_mesh_obj, load_texture};

#[tokio::test]
async fn should_load_obj_quad() {
    let ctx = test_context().await;
    let meshes = load_mesh_obj("quad.obj", &ctx.device).await.unwrap();

    assert_eq!(meshes.len(), 1);
    assert_eq!(meshes[0].num_elements, 6);
    assert_eq!(meshes[0].index_format, wgpu::IndexFormat::Uint32);
}

#[tokio::test]
async fn should_render_loaded_mesh_with_loaded_texture() {
    let ctx = test_context().await;
    let mesh = load_mesh_obj("quad.obj", &ctx.device)
        .await
        .unwrap()
        .pop()
        .unwrap();
    let texture = load_texture("green.png", &ctx.device, &ctx.queue, Some("png"))
        .await
        .unwrap();
    let mut entity = ctx.create_entity(Arc::new(mesh), Arc::new(texture));
    ctx.update_entity(&mut entity);

    let image = render_and_read(&ctx, &entity).await;
    assert_eq!(centre(&image), GREEN);
    assert_eq!(corner(&image), WHITE);
}

#[tokio::test]
async fn missing_assets_are_errors() {
    let ctx = test_context().await;
    assert!(load_mesh_obj("does-not-exist.obj", &ctx.device).await.is_err());
    assert!(
        load_texture("does-not-exist.png", &ctx.device, &ctx.queue, None)
            .await
            .is_err()
    );
}
