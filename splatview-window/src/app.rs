//! Viewport controller: window lifecycle, render loop, resize, teardown.

use crate::camera::{Camera, CameraPose, Projection};
use crate::controls::OrbitControls;
use crate::egui_layer::EguiLayer;
use crate::framing::frame_asset;
use crate::overlay::{StatusOverlay, StatusPresenter, UiAction};
use splatview_data::{
    AssetSource, LoadEvent, LoadReport, LoadedAsset, Progress, normalize, spawn_load,
};
use splatview_gpu::{Renderer, RendererError, SplatAsset, SplatPipeline, SurfaceWrapper, wgpu};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::Instant;
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Fixed point size in world units.
const POINT_SIZE: f32 = 0.02;

#[derive(Debug, thiserror::Error)]
pub enum ViewportError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("window creation error: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("renderer error: {0}")]
    Renderer(#[from] RendererError),
    #[error("viewer initialization failed: {0}")]
    Init(String),
}

/// Everything the viewer needs to start.
pub struct ViewerConfig {
    pub title: String,
    pub window_size: (u32, u32),
    /// Ordered asset sources, primary first.
    pub sources: Vec<AssetSource>,
    /// Default tracing filter when RUST_LOG is unset.
    pub log_level: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "splatview".to_string(),
            window_size: (1280, 720),
            sources: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

/// Run the viewer until the window closes.
pub fn run(config: ViewerConfig) -> Result<(), ViewportError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .init();

    let event_loop = EventLoop::new()?;
    let mut app = Viewer::new(config);
    event_loop.run_app(&mut app)?;
    app.finish()
}

struct Viewer {
    config: Option<ViewerConfig>,
    state: Option<ViewerState>,
    error: Option<String>,
}

impl Viewer {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config: Some(config),
            state: None,
            error: None,
        }
    }

    fn finish(self) -> Result<(), ViewportError> {
        match self.error {
            Some(err) => Err(ViewportError::Init(err)),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        // The viewer self-initializes exactly once.
        if self.state.is_some() || self.error.is_some() {
            return;
        }

        let Some(config) = self.config.take() else {
            return;
        };

        match ViewerState::new(event_loop, config) {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                // Fatal: no partial UI, just the diagnostic.
                error!("failed to initialize viewer: {err}");
                self.error = Some(err.to_string());
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.window.id() != window_id {
            return;
        }

        if state.handle_window_event(event_loop, &event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::RedrawRequested => match state.update_and_render() {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    state.surface.reconfigure(state.renderer.device());
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    error!("GPU out of memory - exiting");
                    event_loop.exit();
                }
                Err(e) => error!("render error: {:?}", e),
            },
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        // Frame-paced continuous redraw; always renders current state, so
        // skipped frames never queue up.
        if let Some(state) = self.state.as_ref() {
            state.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(state) = self.state.take() {
            state.shutdown();
        }
    }
}

struct ViewerState {
    window: Arc<Window>,
    renderer: Renderer,
    surface: SurfaceWrapper,
    pipeline: SplatPipeline,
    asset: Option<SplatAsset>,
    depth_view: wgpu::TextureView,
    camera: Camera,
    projection: Projection,
    controls: OrbitControls,
    overlay: StatusOverlay,
    egui: EguiLayer,
    load_rx: Receiver<LoadEvent>,
    last_frame: Instant,
}

impl ViewerState {
    fn new(
        event_loop: &winit::event_loop::ActiveEventLoop,
        config: ViewerConfig,
    ) -> Result<Self, ViewportError> {
        let (width, height) = config.window_size;
        let window_attributes = Window::default_attributes()
            .with_title(&config.title)
            .with_inner_size(PhysicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let renderer = pollster::block_on(Renderer::new())?;
        let size = window.inner_size();

        let surface = renderer
            .instance()
            .create_surface(window.clone())
            .map_err(RendererError::from)?;
        let surface = renderer.configure_surface(surface, size.width, size.height)?;

        let pipeline = SplatPipeline::new(renderer.device(), surface.format());
        let (_, depth_view) =
            splatview_gpu::create_depth_texture(renderer.device(), size.width, size.height);

        let egui = EguiLayer::new(&window, renderer.device(), surface.format());

        // Initial camera matches the no-asset framing.
        let pose = frame_asset(&CameraPose::new(glam::Vec3::ZERO, glam::Vec3::ZERO), None);
        let camera = Camera::new(pose.position, pose.center);
        let projection = Projection::new(
            size.width,
            size.height,
            std::f32::consts::FRAC_PI_3,
            0.1,
            1000.0,
        );

        // The one startup load session; events drain once per frame.
        info!(
            "resolving asset from {} source(s): {}",
            config.sources.len(),
            config
                .sources
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        let (tx, load_rx) = mpsc::channel();
        // Detached on purpose: an in-flight fetch is never aborted, its
        // result just lands in a closed channel after teardown.
        let _ = spawn_load(config.sources, tx);

        Ok(Self {
            window,
            renderer,
            surface,
            pipeline,
            asset: None,
            depth_view,
            camera,
            projection,
            controls: OrbitControls::new(),
            overlay: StatusOverlay::new(),
            egui,
            load_rx,
            last_frame: Instant::now(),
        })
    }

    fn handle_window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        event: &WindowEvent,
    ) -> bool {
        if self.egui.on_window_event(&self.window, event) {
            return true;
        }

        if let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    state: ElementState::Pressed,
                    physical_key: PhysicalKey::Code(code),
                    ..
                },
            ..
        } = event
        {
            match code {
                KeyCode::Escape => {
                    event_loop.exit();
                    return true;
                }
                KeyCode::KeyR => {
                    self.reset_camera();
                    return true;
                }
                KeyCode::Space => {
                    let enabled = self.controls.toggle_auto_rotate();
                    info!("auto-rotate {}", if enabled { "on" } else { "off" });
                    return true;
                }
                _ => {}
            }
        }

        self.controls.handle_event(event)
    }

    /// Reframe against the live displayed asset, or the default view.
    fn reset_camera(&mut self) {
        let bounds = self.asset.as_ref().map(|a| a.world_bounds());
        let pose = frame_asset(&self.camera.pose(), bounds.as_ref());
        self.camera.apply_pose(&pose);
        self.controls.on_reset();
    }

    fn drain_load_events(&mut self) {
        while let Ok(event) = self.load_rx.try_recv() {
            match event {
                LoadEvent::Started {
                    source,
                    attempt,
                    total,
                } => {
                    info!("loading {} (attempt {}/{})", source, attempt, total);
                    self.overlay.show_progress(None);
                }
                LoadEvent::Progress(Progress::Percent(pct)) => {
                    self.overlay.show_progress(Some(pct));
                }
                LoadEvent::Progress(Progress::Indeterminate { .. }) => {
                    self.overlay.show_progress(None);
                }
                LoadEvent::Retrying {
                    failed,
                    error,
                    next,
                } => {
                    warn!("load failed for {} ({}); retrying with {}", failed, error, next);
                    self.overlay.show_progress(None);
                }
                LoadEvent::Succeeded(loaded) => self.attach_asset(loaded),
                LoadEvent::Failed(report) => self.present_failure(report),
            }
        }
    }

    fn attach_asset(&mut self, loaded: LoadedAsset) {
        let source = loaded.source.clone();
        let (geometry, bounds, transform) = normalize(loaded.geometry);

        match self
            .pipeline
            .upload(&self.renderer, &geometry, bounds, transform, POINT_SIZE)
        {
            Ok(new_asset) => {
                // Previous asset's GPU memory goes before the new one attaches.
                if let Some(old) = self.asset.take() {
                    old.dispose();
                }

                let pose = frame_asset(&self.camera.pose(), Some(&new_asset.framing_bounds()));
                self.camera.apply_pose(&pose);
                self.controls.on_reset();

                info!(
                    "displaying {} points from {} (scale {:.4})",
                    new_asset.point_count(),
                    source,
                    new_asset.transform().scale
                );
                self.asset = Some(new_asset);
                self.overlay.hide();
            }
            Err(err) => {
                error!("failed to upload asset: {err}");
                self.overlay
                    .show_error(&format!("Failed to display asset: {err}"), &[source]);
            }
        }
    }

    fn present_failure(&mut self, report: LoadReport) {
        error!(
            "asset load failed after {} attempt(s): {}",
            report.attempted.len(),
            report.error
        );
        self.overlay.show_error(
            &format!("Failed to load asset: {}", report.error),
            &report.attempted,
        );
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        // Identical dimensions: nothing to reconfigure.
        if new_size.width == self.surface.width() && new_size.height == self.surface.height() {
            return;
        }
        self.surface
            .resize(self.renderer.device(), new_size.width, new_size.height);
        self.projection.resize(new_size.width, new_size.height);
        let (_, depth_view) = splatview_gpu::create_depth_texture(
            self.renderer.device(),
            new_size.width,
            new_size.height,
        );
        self.depth_view = depth_view;
    }

    fn update_and_render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        self.drain_load_events();

        // Pending input + auto-rotate apply before the draw.
        let mut pose = self.camera.pose();
        self.controls.update(dt, &mut pose);
        self.camera.apply_pose(&pose);

        let surface_texture = self.surface.get_current_texture()?;
        let color_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.renderer
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Frame Encoder"),
                });

        if let Some(asset) = &self.asset {
            asset.update_camera(
                self.renderer.queue(),
                self.camera.view_matrix(),
                self.projection.matrix(),
                self.camera.position(),
            );
            self.pipeline
                .render(&mut encoder, asset, &color_view, &self.depth_view);
        } else {
            self.pipeline
                .clear(&mut encoder, &color_view, &self.depth_view);
        }

        let mut actions: Vec<UiAction> = Vec::new();
        {
            let Self {
                window,
                renderer,
                egui,
                overlay,
                controls,
                surface,
                ..
            } = self;
            let auto_rotate = controls.auto_rotate();
            egui.draw(
                window,
                renderer.device(),
                renderer.queue(),
                &mut encoder,
                &color_view,
                [surface.width(), surface.height()],
                |ctx| {
                    actions = overlay.ui(ctx, auto_rotate);
                },
            );
        }

        self.renderer.queue().submit(Some(encoder.finish()));
        surface_texture.present();

        for action in actions {
            match action {
                UiAction::ResetCamera => self.reset_camera(),
                UiAction::ToggleAutoRotate => {
                    self.controls.toggle_auto_rotate();
                }
            }
        }

        Ok(())
    }

    /// Teardown: the displayed asset's GPU memory is released explicitly;
    /// the input layer and renderer drop with the state. Any in-flight
    /// fetch just finishes into a closed channel.
    fn shutdown(mut self) {
        if let Some(asset) = self.asset.take() {
            asset.dispose();
        }
        info!("viewer shut down");
    }
}
