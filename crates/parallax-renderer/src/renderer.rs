use crate::aspect::aspect_correction;
use crate::pipeline::{ParallaxPipeline, QUAD};
use crate::texture::{GpuTextures, ImagePair};
use crate::uniforms::{ParallaxUniforms, Uniform};
use crate::RendererError;
use glam::{Vec2, Vec4};
use wgpu::util::DeviceExt;

/// Draws the depth-displaced image into a color target.
///
/// Owns the pipeline, the uploaded image pair and the uniform buffer. Only
/// the steering vector and time change per frame; resolution and pixel
/// ratio change on resize.
pub struct ParallaxRenderer {
    pipeline: ParallaxPipeline,
    _textures: GpuTextures,
    texture_bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    uniforms: ParallaxUniforms,
    image_aspect: f32,
}

impl ParallaxRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        images: &ImagePair,
        thresholds: Vec2,
    ) -> Result<Self, RendererError> {
        let pipeline = ParallaxPipeline::new(device, color_format)?;
        let textures = GpuTextures::upload(device, queue, images)?;
        let texture_bind_group =
            pipeline.create_texture_bind_group(device, &textures.color_view, &textures.depth_view);

        let uniforms = ParallaxUniforms::default()
            .with(Uniform::Resolution(Vec4::new(1.0, 1.0, 1.0, 1.0)))
            .with(Uniform::Threshold(thresholds))
            .with(Uniform::PixelRatio(1.0));

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("parallax_uniform_buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = pipeline.create_uniform_bind_group(device, &uniform_buffer);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vertex_buffer"),
            contents: bytemuck::cast_slice(&QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Ok(Self {
            pipeline,
            _textures: textures,
            texture_bind_group,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            uniforms,
            image_aspect: images.aspect(),
        })
    }

    /// Update resolution, aspect factors and pixel ratio for a new viewport.
    ///
    /// `logical` is the viewport in logical pixels; fragment coordinates are
    /// physical, hence the `1 / scale_factor` pixel ratio.
    pub fn resize(&mut self, logical: Vec2, scale_factor: f64) {
        let aspect = aspect_correction(logical, self.image_aspect);
        self.uniforms
            .set(Uniform::Resolution(Vec4::new(logical.x, logical.y, aspect.x, aspect.y)));
        let ratio = if scale_factor > 0.0 {
            (1.0 / scale_factor) as f32
        } else {
            1.0
        };
        self.uniforms.set(Uniform::PixelRatio(ratio));
        tracing::debug!(
            width = logical.x,
            height = logical.y,
            a1 = aspect.x,
            a2 = aspect.y,
            pixel_ratio = ratio,
            "Viewport updated"
        );
    }

    pub fn set_thresholds(&mut self, thresholds: Vec2) {
        self.uniforms.set(Uniform::Threshold(thresholds));
    }

    /// Encode one frame. The caller submits the returned buffer and
    /// presents the target.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        displayed: Vec2,
        time: f32,
    ) -> wgpu::CommandBuffer {
        self.uniforms.set(Uniform::Mouse(displayed));
        self.uniforms.set(Uniform::Time(time));
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("parallax_render"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("parallax_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline.pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_bind_group(1, &self.texture_bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.draw(0..QUAD.len() as u32, 0..1);
        }

        encoder.finish()
    }
}
