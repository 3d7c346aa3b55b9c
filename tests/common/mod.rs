#![allow(dead_code)]

use std::sync::Arc;

use textured_entity::{
    Entity, Mesh, Texture,
    context::{Context, ContextConfig},
};

pub const RED: [u8; 4] = [255, 0, 0, 255];
pub const GREEN: [u8; 4] = [0, 255, 0, 255];
pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Headless context with a white clear colour. Falls back to a software
/// adapter when no GPU is available.
pub async fn test_context() -> Context {
    textured_entity::init_logging();
    let config = ContextConfig::default();
    match Context::new(config.clone()).await {
        Ok(ctx) => ctx,
        Err(_) => Context::new(ContextConfig {
            force_fallback_adapter: true,
            ..config
        })
        .await
        .expect("no wgpu adapter available for integration tests"),
    }
}

pub fn solid_texture(ctx: &Context, colour: [u8; 4]) -> Arc<Texture> {
    Arc::new(Texture::from_colour(&ctx.device, &ctx.queue, colour, 2, 2, "solid"))
}

pub fn quad_entity(ctx: &Context, colour: [u8; 4]) -> Entity {
    let mesh = Arc::new(Mesh::quad(&ctx.device));
    ctx.create_entity(mesh, solid_texture(ctx, colour))
}

pub async fn render_and_read<'a>(
    ctx: &Context,
    render: impl Into<textured_entity::render::Render<'a>>,
) -> image::RgbaImage {
    ctx.render(render);
    ctx.read_target().await.expect("failed to read back the target")
}

pub fn centre(image: &image::RgbaImage) -> [u8; 4] {
    image.get_pixel(image.width() / 2, image.height() / 2).0
}

pub fn corner(image: &image::RgbaImage) -> [u8; 4] {
    image.get_pixel(0, 0).0
}
