// SPDX-License-Identifier: MIT OR Apache-2.0
//! Main application setup and event loop.

use crate::library::MediaLibrary;
use crate::panel_types::PanelType;
use crate::panels::{MediaLibraryPanel, PlayerPanel};
use egui_dock::{DockArea, DockState, NodeIndex, Style, TabViewer};
use egui_wgpu::wgpu;
use std::sync::Arc;
use thiserror::Error;
use visual_three_timeline::{ConfigError, FrameQueue, TimelineConfig, TimelinePanel, TimelineSession};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Application errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Window creation failed
    #[error("Failed to create window: {0}")]
    WindowCreation(String),

    /// Renderer initialization failed
    #[error("Failed to initialize renderer: {0}")]
    RendererInit(String),

    /// Event loop error
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for application operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Tab viewer implementation for `egui_dock`
struct AppTabViewer<'a> {
    session: &'a mut TimelineSession,
    frames: &'a FrameQueue,
    now_ms: f64,
    library: &'a mut MediaLibrary,
    library_panel: &'a mut MediaLibraryPanel,
    timeline_panel: &'a mut TimelinePanel,
    player_panel: &'a mut PlayerPanel,
}

impl TabViewer for AppTabViewer<'_> {
    type Tab = PanelType;

    fn title(&mut self, tab: &mut Self::Tab) -> egui::WidgetText {
        format!("{} {}", tab.icon(), tab.name()).into()
    }

    fn ui(&mut self, ui: &mut egui::Ui, tab: &mut Self::Tab) {
        match tab {
            PanelType::MediaLibrary => self.library_panel.ui(ui, self.library),
            PanelType::Timeline => self.timeline_panel.ui(ui, self.session),
            PanelType::Player => self.player_panel.ui(ui, self.session, self.frames, self.now_ms),
        }
    }

    fn closeable(&mut self, _tab: &mut Self::Tab) -> bool {
        false
    }
}

/// Graphics state for wgpu rendering
struct GraphicsState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    egui_renderer: egui_wgpu::Renderer,
}

impl GraphicsState {
    fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| AppError::RendererInit(format!("surface: {e}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| AppError::RendererInit("no suitable GPU adapter".to_string()))?;

        tracing::info!("Using GPU: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Visual Three Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
            None,
        ))
        .map_err(|e| AppError::RendererInit(format!("device: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| AppError::RendererInit("surface has no formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            egui_renderer,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn render(
        &mut self,
        egui_ctx: &egui::Context,
        full_output: egui::FullOutput,
        window: &Window,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Visual Three Encoder"),
        });

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, image_delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Visual Three Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.1,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // egui-wgpu wants a 'static pass; the encoder outlives it in this scope
            let mut render_pass = render_pass.forget_lifetime();
            self.egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        Ok(())
    }
}

/// Running state of the application
struct AppRunning {
    window: Arc<Window>,
    graphics: GraphicsState,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    inner: AppInner,
}

/// Session, frame queue and panels
struct AppInner {
    session: TimelineSession,
    frames: FrameQueue,
    library: MediaLibrary,
    dock_state: DockState<PanelType>,
    library_panel: MediaLibraryPanel,
    timeline_panel: TimelinePanel,
    player_panel: PlayerPanel,
}

impl AppInner {
    fn new(config: TimelineConfig, library: MediaLibrary) -> Self {
        let mut session = TimelineSession::new(config);
        session.add_layer();

        Self {
            session,
            frames: FrameQueue::new(),
            library,
            dock_state: Self::create_default_layout(),
            library_panel: MediaLibraryPanel::new(),
            timeline_panel: TimelinePanel::new(),
            player_panel: PlayerPanel::new(),
        }
    }

    fn create_default_layout() -> DockState<PanelType> {
        // Player in the center
        let mut dock_state = DockState::new(vec![PanelType::Player]);
        let surface = dock_state.main_surface_mut();

        // Media library on the left
        let [center, _left] = surface.split_left(NodeIndex::root(), 0.22, vec![PanelType::MediaLibrary]);

        // Timeline along the bottom
        let [_top, _bottom] = surface.split_below(center, 0.55, vec![PanelType::Timeline]);

        dock_state
    }

    fn update(&mut self, ctx: &egui::Context) {
        let now_ms = ctx.input(|i| i.time) * 1000.0;

        // Deliver the frame requested by the clock on the previous pass
        for frame in self.frames.drain() {
            self.session.on_frame(frame, now_ms, &self.frames);
        }

        self.handle_shortcuts(ctx, now_ms);

        let mut tab_viewer = AppTabViewer {
            session: &mut self.session,
            frames: &self.frames,
            now_ms,
            library: &mut self.library,
            library_panel: &mut self.library_panel,
            timeline_panel: &mut self.timeline_panel,
            player_panel: &mut self.player_panel,
        };

        DockArea::new(&mut self.dock_state)
            .style(Style::from_egui(ctx.style().as_ref()))
            .show(ctx, &mut tab_viewer);
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context, now_ms: f64) {
        if ctx.wants_keyboard_input() {
            return;
        }
        ctx.input(|input| {
            if input.key_pressed(egui::Key::Space) {
                self.session.toggle_playback(now_ms, &self.frames);
            }
            if input.key_pressed(egui::Key::Home) {
                self.session.seek_start();
            }
            if input.key_pressed(egui::Key::End) {
                self.session.seek_end();
            }
            if input.key_pressed(egui::Key::ArrowLeft) {
                self.session.skip_back();
            }
            if input.key_pressed(egui::Key::ArrowRight) {
                self.session.skip_forward();
            }
        });
    }
}

/// Main application
pub struct VisualThreeApp {
    running: Option<AppRunning>,
    /// Taken when the window is first created
    startup: Option<(TimelineConfig, MediaLibrary)>,
    /// Fatal error raised inside the event loop
    failure: Option<AppError>,
}

impl VisualThreeApp {
    /// Create the application; nothing is opened until the event loop resumes
    pub fn new(config: TimelineConfig, library: MediaLibrary) -> Self {
        Self {
            running: None,
            startup: Some((config, library)),
            failure: None,
        }
    }

    /// Run the event loop until the window closes
    pub fn run(config: TimelineConfig, library: MediaLibrary) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = Self::new(config, library);
        event_loop.run_app(&mut app)?;

        match app.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<AppRunning> {
        let (config, library) = self
            .startup
            .take()
            .ok_or_else(|| AppError::WindowCreation("application already started".to_string()))?;

        tracing::info!("Creating window...");

        let window_attrs = Window::default_attributes()
            .with_title("Visual Three")
            .with_inner_size(winit::dpi::LogicalSize::new(1400, 860))
            .with_min_inner_size(winit::dpi::LogicalSize::new(800, 500));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| AppError::WindowCreation(e.to_string()))?,
        );

        tracing::info!("Initializing graphics...");
        let graphics = GraphicsState::new(window.clone())?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2 * 1024),
        );

        tracing::info!("Window size: {:?}", window.inner_size());

        Ok(AppRunning {
            window,
            graphics,
            egui_ctx,
            egui_state,
            inner: AppInner::new(config, library),
        })
    }
}

impl ApplicationHandler for VisualThreeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                tracing::error!("Startup failed: {e}");
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };

        let response = running.egui_state.on_window_event(&running.window, &event);
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested, exiting...");
                running.inner.session.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!("Window resized to {:?}", new_size);
                running.graphics.resize(new_size);
                running.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let raw_input = running.egui_state.take_egui_input(&running.window);
                let full_output = running.egui_ctx.run(raw_input, |ctx| {
                    running.inner.update(ctx);
                });

                running
                    .egui_state
                    .handle_platform_output(&running.window, full_output.platform_output.clone());

                match running.graphics.render(&running.egui_ctx, full_output, &running.window) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = running.window.inner_size();
                        running.graphics.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("Out of GPU memory!");
                        running.inner.session.teardown();
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        tracing::warn!("Surface timeout");
                    }
                }

                running.window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}
