pub mod aspect;
pub mod context;
pub mod pipeline;
pub mod renderer;
pub mod sampler;
pub mod texture;
pub mod uniforms;

pub use aspect::aspect_correction;
pub use context::GpuContext;
pub use renderer::ParallaxRenderer;
pub use sampler::{mirrored, mirrored_vec2, ParallaxSampler};
pub use texture::ImagePair;
pub use uniforms::{ParallaxUniforms, Uniform};

use std::path::PathBuf;
use thiserror::Error;

/// Initialization failures. All of them are fatal: nothing is drawn until
/// the sampler is compiled and both images are resident.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Image {path} has no pixels")]
    EmptyImage { path: PathBuf },
    #[error("Image {path} is {width}x{height}, larger than the device limit of {max}")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },
    #[error("Shader compilation failed: {0}")]
    ShaderCompilation(String),
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("Failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
}
