use anyhow::Result;
use glam::Vec2;
use parallax_config::AppConfig;
use parallax_input::router::InputRouter;
use parallax_input::InputAction;
use parallax_motion::{MotionBlender, OrientationSession, SteeringSelector};
use parallax_renderer::{GpuContext, ImagePair, ParallaxRenderer, ParallaxSampler};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

/// Application state.
struct App {
    config: AppConfig,
    images: ImagePair,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    router: InputRouter,
    selector: SteeringSelector,
    blender: MotionBlender,
    orientation: OrientationSession,
    started: Instant,
    /// First fatal error raised inside the event loop.
    init_error: Option<anyhow::Error>,
}

struct GpuState {
    context: GpuContext,
    renderer: ParallaxRenderer,
    frame_count: u64,
}

impl App {
    fn new(config: AppConfig, runtime: Handle, images: ImagePair) -> Self {
        let blender = MotionBlender::new(config.motion.display_inertia);
        let orientation = OrientationSession::new(
            runtime,
            config.orientation.endpoint.clone(),
            config.motion.clone(),
        );
        Self {
            config,
            images,
            window: None,
            gpu: None,
            router: InputRouter::new(1280, 720),
            selector: SteeringSelector::new(),
            blender,
            orientation,
            started: Instant::now(),
            init_error: None,
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> Result<()> {
        let size = window.inner_size();
        let context = GpuContext::new(window.clone(), size.width, size.height)?;
        let mut renderer = ParallaxRenderer::new(
            &context.device,
            &context.queue,
            context.format(),
            &self.images,
            self.config.scene.thresholds(),
        )?;
        renderer.resize(logical_size(&window, size), window.scale_factor());

        self.router.set_viewport(size);
        self.gpu = Some(GpuState {
            context,
            renderer,
            frame_count: 0,
        });
        Ok(())
    }

    fn reset(&mut self) {
        if self.orientation.reset() {
            info!("Orientation anchors reset");
        } else {
            info!("Nothing to reset while steering with the pointer");
        }
    }

    /// Reload the config file and apply the motion and scene settings.
    fn reload(&mut self) -> Result<()> {
        let config = parallax_config::load_config()?;

        if config.scene.color_image != self.config.scene.color_image
            || config.scene.depth_image != self.config.scene.depth_image
        {
            warn!("Image paths changed; restart to load the new pair");
        }

        self.orientation.reconfigure(config.motion.clone());
        self.blender.set_inertia(config.motion.display_inertia);
        if let Some(gpu) = &mut self.gpu {
            gpu.renderer.set_thresholds(config.scene.thresholds());
        }

        self.config = config;
        info!("Config reloaded");
        Ok(())
    }

    /// Render the current frame on the CPU and write it next to the config.
    fn snapshot(&self) -> Result<()> {
        let size = self
            .window
            .as_ref()
            .map(|w| w.inner_size())
            .unwrap_or(PhysicalSize::new(1280, 720));
        let frame = ParallaxSampler::new(&self.images, self.config.scene.thresholds()).render(
            size.width.max(1),
            size.height.max(1),
            self.blender.displayed(),
        );
        let secs = self.started.elapsed().as_secs();
        let path = parallax_config::config_dir()?.join(format!("snapshot-{secs}.png"));
        frame.save(&path)?;
        info!(?path, "Snapshot saved");
        Ok(())
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let Some(window) = &self.window else {
            return;
        };
        if let Some(gpu) = &mut self.gpu {
            gpu.context.resize(size.width, size.height);
            gpu.renderer
                .resize(logical_size(window, size), window.scale_factor());
        }
    }

    fn redraw(&mut self) {
        // Never blocks: a pending request keeps the pointer in charge.
        let target = self.orientation.poll();
        self.selector.set_orientation(target);
        self.selector.activate(self.orientation.steering_source());

        let displayed = self.blender.tick(self.selector.target());
        let time = self.started.elapsed().as_secs_f32();

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.context.reconfigure();
                return;
            }
            Err(e) => {
                warn!(?e, "Failed to get surface texture");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let cmd = gpu.renderer.render(
            &gpu.context.device,
            &gpu.context.queue,
            &view,
            displayed,
            time,
        );
        gpu.context.queue.submit(std::iter::once(cmd));
        output.present();

        gpu.frame_count += 1;
        if gpu.frame_count % 300 == 0 {
            tracing::debug!(
                frames = gpu.frame_count,
                source = ?self.selector.source(),
                x = displayed.x,
                y = displayed.y,
                "Render heartbeat"
            );
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Depth Parallax")
            .with_inner_size(LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.init_error = Some(e.into());
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        if let Err(e) = self.init_gpu(window.clone()) {
            error!(?e, "Renderer initialization failed");
            self.init_error = Some(e);
            event_loop.exit();
            return;
        }

        if self.config.orientation.enabled {
            self.orientation.request();
        }

        info!(access = ?self.orientation.access(), "Application initialized");
        window.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let WindowEvent::RedrawRequested = event {
            self.redraw();
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            return;
        }

        let Some(action) = self.router.on_window_event(&event) else {
            return;
        };
        match action {
            InputAction::Pointer(target) => self.selector.set_pointer(target),
            InputAction::Resize(size) => self.resize(size),
            InputAction::Reset => self.reset(),
            InputAction::ToggleOrientation => self.orientation.toggle(),
            InputAction::Reload => {
                if let Err(e) = self.reload() {
                    warn!(?e, "Config reload failed, keeping current settings");
                }
            }
            InputAction::Snapshot => {
                if let Err(e) = self.snapshot() {
                    error!(?e, "Failed to save snapshot");
                }
            }
            InputAction::Exit => event_loop.exit(),
        }
    }
}

fn logical_size(window: &Window, size: PhysicalSize<u32>) -> Vec2 {
    let logical: LogicalSize<f32> = size.to_logical(window.scale_factor());
    Vec2::new(logical.width, logical.height)
}

fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "parallax_app=info,parallax_motion=info,parallax_renderer=info".into()
            }),
        )
        .init();

    info!("Depth parallax viewer starting");

    // The event loop owns the main thread; orientation tasks run here.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;

    // Load config.
    let config = parallax_config::load_config().unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Ok(path) = parallax_config::config_path() {
        if !path.exists() {
            if let Err(e) = parallax_config::save_config(&config) {
                warn!(?e, "Failed to write default config");
            }
        }
    }

    info!(
        color = %config.scene.color_image.display(),
        depth = %config.scene.depth_image.display(),
        orientation = config.orientation.enabled,
        "Config loaded"
    );

    let images = ImagePair::load(&config.scene.color_image, &config.scene.depth_image)?;

    // Run the application.
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, runtime.handle().clone(), images);
    event_loop.run_app(&mut app)?;

    if let Some(e) = app.init_error.take() {
        return Err(e);
    }
    Ok(())
}
