//! Device, queue and offscreen frame setup shared by all entities.
//!
//! [`Context`] owns everything an entity consumes but does not own itself:
//! the wgpu device and queue, the entity bind group layout, a sampler, the
//! textured pipeline and colour/depth render targets. It also carries the
//! camera whose view-projection matrix entities are updated with.

use std::{iter, sync::Arc, time::Duration};

use anyhow::Context as _;
use cgmath::{Deg, Matrix4};

use crate::{
    camera::{self, Camera, Projection},
    data_structures::{
        entity::{DrawEntity, Entity},
        mesh::Mesh,
        scene_graph::SceneNode,
        texture::{self, DepthTexture, Texture},
    },
    pipelines::textured::mk_textured_pipeline,
    render::Render,
    resources::entity_layout,
};

/// Settings for [`Context::new`].
#[derive(Clone, Debug)]
pub struct ContextConfig {
    pub width: u32,
    pub height: u32,
    /// Format of the colour target the pipeline renders into.
    pub format: wgpu::TextureFormat,
    pub clear_colour: wgpu::Color,
    pub power_preference: wgpu::PowerPreference,
    /// Use a software adapter, e.g. on CI machines without a GPU.
    pub force_fallback_adapter: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            clear_colour: wgpu::Color::WHITE,
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
        }
    }
}

#[derive(Debug)]
pub struct Context {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: ContextConfig,
    pub entity_layout: wgpu::BindGroupLayout,
    pub sampler: wgpu::Sampler,
    pub pipeline: wgpu::RenderPipeline,
    pub camera: Camera,
    pub projection: Projection,
    pub(crate) target: wgpu::Texture,
    pub(crate) target_view: wgpu::TextureView,
    pub(crate) depth_texture: DepthTexture,
}

impl Context {
    pub async fn new(config: ContextConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(
            config.width > 0 && config.height > 0,
            "render target must not be empty, got {}x{}",
            config.width,
            config.height
        );
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: config.force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("textured-entity device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let entity_layout = entity_layout(&device);
        let sampler = texture::create_default_sampler(&device);
        let pipeline = mk_textured_pipeline(
            &device,
            &entity_layout,
            config.format,
            Some(DepthTexture::FORMAT),
        );
        let (target, target_view) =
            create_color_target(&device, config.format, config.width, config.height);
        let depth_texture =
            DepthTexture::new(&device, [config.width, config.height], "depth_texture");

        // right/left, height, forward/backward - yaw turns left/right - pitch looks up/down
        let camera = Camera::new((0.0, 0.0, 3.0), Deg(-90.0), Deg(0.0));
        let projection = Projection::new(config.width, config.height, Deg(45.0), 0.1, 100.0);

        Ok(Self {
            device,
            queue,
            config,
            entity_layout,
            sampler,
            pipeline,
            camera,
            projection,
            target,
            target_view,
            depth_texture,
        })
    }

    /// Creates an entity bound to this context's layout and sampler.
    pub fn create_entity(&self, mesh: Arc<Mesh>, texture: Arc<Texture>) -> Entity {
        Entity::new(&self.device, &self.entity_layout, &self.sampler, mesh, texture)
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        camera::view_proj(&self.camera, &self.projection)
    }

    /// Writes the current camera's MVP into `entity`'s uniform buffer.
    pub fn update_entity(&self, entity: &mut Entity) {
        entity.update(&self.queue, self.view_proj());
    }

    /// Propagates the hierarchy and writes every MVP of `node`'s tree.
    pub fn update_node(&self, node: &mut SceneNode<Entity>) {
        node.update(&self.queue, self.view_proj());
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("Ignoring resize to {width}x{height}.");
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.projection.resize(width, height);
        let (target, target_view) =
            create_color_target(&self.device, self.config.format, width, height);
        self.target = target;
        self.target_view = target_view;
        self.depth_texture = DepthTexture::new(&self.device, [width, height], "depth_texture");
    }

    pub fn target(&self) -> &wgpu::Texture {
        &self.target
    }

    /// Draws `render` into the context's own colour target.
    pub fn render<'a>(&self, render: impl Into<Render<'a>>) -> wgpu::SubmissionIndex {
        self.render_to(&self.target_view, &self.depth_texture.view, render)
    }

    /// Draws `render` into `view`, e.g. a surface texture owned by the caller.
    ///
    /// `view` must have the format the context was configured with and
    /// `depth` must be a [`DepthTexture::FORMAT`] view of the same size.
    pub fn render_to<'a>(
        &self,
        view: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        render: impl Into<Render<'a>>,
    ) -> wgpu::SubmissionIndex {
        let entities = render.into().entities();
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.config.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            for entity in &entities {
                render_pass.draw_entity(entity);
            }
        }
        log::trace!("Submitting frame with {} entities", entities.len());
        self.queue.submit(iter::once(encoder.finish()))
    }

    /// Copies the colour target back to the CPU.
    ///
    /// Rows are padded to `COPY_BYTES_PER_ROW_ALIGNMENT` for the copy and
    /// unpadded again, so the image has exactly the target's size.
    pub async fn read_target(&self) -> anyhow::Result<image::RgbaImage> {
        let (width, height) = (self.config.width, self.config.height);
        let unpadded_bytes_per_row = 4 * width;
        let padded_bytes_per_row = padded_bytes_per_row(width);

        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Target Readback Buffer"),
            size: (padded_bytes_per_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &self.target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(iter::once(encoder.finish()));

        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(Duration::from_secs(3)),
            })
            .context("device poll failed while reading back the target")?;
        rx.receive()
            .await
            .context("readback buffer mapping was cancelled")?
            .context("failed to map readback buffer")?;

        let pixels = {
            let data = buffer_slice.get_mapped_range();
            unpad_rows(&data, padded_bytes_per_row, unpadded_bytes_per_row, height)
        };
        output_buffer.unmap();

        image::RgbaImage::from_raw(width, height, pixels)
            .context("readback size does not match the target")
    }
}

fn create_color_target(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Colour Target"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = 4 * width;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

pub(crate) fn unpad_rows(data: &[u8], padded: u32, unpadded: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((unpadded * height) as usize);
    for row in data.chunks(padded as usize).take(height as usize) {
        pixels.extend_from_slice(&row[..unpadded as usize]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1), 256);
    }

    #[test]
    fn unpadding_drops_row_tails() {
        let mut data = vec![0u8; 512];
        data[..4].copy_from_slice(&[1, 2, 3, 4]);
        data[256..260].copy_from_slice(&[5, 6, 7, 8]);
        assert_eq!(unpad_rows(&data, 256, 4, 2), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn default_config_is_small_white_srgb() {
        let config = ContextConfig::default();
        assert_eq!((config.width, config.height), (256, 256));
        assert_eq!(config.format, wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(config.clear_colour, wgpu::Color::WHITE);
    }

    #[tokio::test]
    async fn empty_targets_are_rejected() {
        for (width, height) in [(0, 0), (0, 16), (16, 0)] {
            let config = ContextConfig {
                width,
                height,
                ..Default::default()
            };
            let err = Context::new(config).await.unwrap_err();
            assert!(err.to_string().contains("must not be empty"), "{err}");
        }
    }
}
