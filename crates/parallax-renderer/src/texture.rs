use crate::RendererError;
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// The color image and its depth map, decoded to RGBA8.
///
/// The two may differ in resolution; both are sampled in normalized
/// coordinates. Aspect correction follows the color image.
pub struct ImagePair {
    pub color: RgbaImage,
    pub depth: RgbaImage,
    /// Where each image came from, for error reports.
    sources: [PathBuf; 2],
}

impl ImagePair {
    /// Decode both images. Either one failing aborts startup.
    pub fn load(color: &Path, depth: &Path) -> Result<Self, RendererError> {
        let pair = Self {
            color: load_rgba(color)?,
            depth: load_rgba(depth)?,
            sources: [color.to_path_buf(), depth.to_path_buf()],
        };
        for (path, image) in [(color, &pair.color), (depth, &pair.depth)] {
            if image.width() == 0 || image.height() == 0 {
                return Err(RendererError::EmptyImage {
                    path: path.to_path_buf(),
                });
            }
        }
        tracing::info!(
            color_width = pair.color.width(),
            color_height = pair.color.height(),
            depth_width = pair.depth.width(),
            depth_height = pair.depth.height(),
            "Image pair loaded"
        );
        Ok(pair)
    }

    /// Wrap already decoded images.
    pub fn new(color: RgbaImage, depth: RgbaImage) -> Result<Self, RendererError> {
        for (name, image) in [("color", &color), ("depth", &depth)] {
            if image.width() == 0 || image.height() == 0 {
                return Err(RendererError::EmptyImage {
                    path: PathBuf::from(name),
                });
            }
        }
        Ok(Self {
            color,
            depth,
            sources: [PathBuf::from("color"), PathBuf::from("depth")],
        })
    }

    /// Check both images against the device's texture size limit.
    pub fn check_dimensions(&self, max_dimension: u32) -> Result<(), RendererError> {
        for (path, image) in self.sources.iter().zip([&self.color, &self.depth]) {
            let (width, height) = image.dimensions();
            if width > max_dimension || height > max_dimension {
                return Err(RendererError::ImageTooLarge {
                    path: path.clone(),
                    width,
                    height,
                    max: max_dimension,
                });
            }
        }
        Ok(())
    }

    /// Height over width of the color image.
    pub fn aspect(&self) -> f32 {
        self.color.height() as f32 / self.color.width() as f32
    }
}

fn load_rgba(path: &Path) -> Result<RgbaImage, RendererError> {
    let image = image::open(path).map_err(|source| RendererError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}

/// GPU copies of the image pair.
pub struct GpuTextures {
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
}

impl GpuTextures {
    /// Upload both images. Images beyond the device limit are rejected
    /// before any texture is created.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        images: &ImagePair,
    ) -> Result<Self, RendererError> {
        images.check_dimensions(device.limits().max_texture_dimension_2d)?;

        // Depth values are data, not color: keep them out of sRGB decoding.
        let (color, color_view) = create_texture(
            device,
            "color_texture",
            &images.color,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        );
        let (depth, depth_view) = create_texture(
            device,
            "depth_texture",
            &images.depth,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        write_image(queue, &color, &images.color);
        write_image(queue, &depth, &images.depth);

        Ok(Self {
            color,
            color_view,
            depth,
            depth_view,
        })
    }
}

fn create_texture(
    device: &wgpu::Device,
    label: &str,
    image: &RgbaImage,
    format: wgpu::TextureFormat,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&Default::default());
    (texture, view)
}

fn write_image(queue: &wgpu::Queue, texture: &wgpu::Texture, image: &RgbaImage) {
    let (width, height) = image.dimensions();
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}
