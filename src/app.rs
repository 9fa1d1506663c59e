//! Galaxy builder and window runner.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::animation::FrameUniforms;
use crate::error::AppError;
use crate::gpu::GpuState;
use crate::params::GalaxyParameters;
use crate::regen::Regenerator;
use crate::time::FrameClock;
use crate::visuals::VisualConfig;

#[cfg(feature = "egui")]
use crate::gpu::egui_integration::EguiIntegration;

const WINDOW_TITLE: &str = "Galaxy";

/// A galaxy viewer builder.
///
/// Use method chaining to configure, then call `.run()` to open the window.
///
/// ```ignore
/// Galaxy::new()
///     .with_parameters(GalaxyParameters { branches: 5, ..Default::default() })
///     .with_visuals(|v| {
///         v.spin_rate(0.4);
///     })
///     .run()?;
/// ```
#[derive(Debug, Clone)]
pub struct Galaxy {
    params: GalaxyParameters,
    visuals: VisualConfig,
    seed: Option<u64>,
    ui: bool,
    perf: bool,
}

impl Galaxy {
    /// Create a viewer with default parameters and visuals.
    pub fn new() -> Self {
        Self {
            params: GalaxyParameters::default(),
            visuals: VisualConfig::default(),
            seed: None,
            ui: true,
            perf: false,
        }
    }

    /// Set the initial galaxy parameters.
    pub fn with_parameters(mut self, params: GalaxyParameters) -> Self {
        self.params = params;
        self
    }

    /// Configure rendering.
    pub fn with_visuals<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut VisualConfig),
    {
        configure(&mut self.visuals);
        self
    }

    /// Seed every regeneration with `seed` for reproducible galaxies.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Show the parameter panel (needs the `egui` feature).
    pub fn with_ui(mut self, enabled: bool) -> Self {
        self.ui = enabled;
        self
    }

    /// Show frame timing from the start.
    pub fn with_perf(mut self, enabled: bool) -> Self {
        self.perf = enabled;
        self
    }

    pub fn parameters(&self) -> &GalaxyParameters {
        &self.params
    }

    pub fn visuals(&self) -> &VisualConfig {
        &self.visuals
    }

    /// Open the window and run until it is closed.
    pub fn run(self) -> Result<(), AppError> {
        self.params.validate()?;
        self.visuals.validate()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for Galaxy {
    fn default() -> Self {
        Self::new()
    }
}

struct App {
    config: Galaxy,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    regen: Option<Regenerator>,
    #[cfg(feature = "egui")]
    egui: Option<EguiIntegration>,
    clock: FrameClock,
    frame: FrameUniforms,
    show_perf: bool,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    /// First fatal error; reported once the event loop returns.
    error: Option<AppError>,
}

impl App {
    fn new(config: Galaxy) -> Self {
        let show_perf = config.perf;
        Self {
            config,
            window: None,
            gpu_state: None,
            regen: None,
            #[cfg(feature = "egui")]
            egui: None,
            clock: FrameClock::new(),
            frame: FrameUniforms::new(1.0),
            show_perf,
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        log::error!("{}", err);
        self.error.get_or_insert(err);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attrs = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let mut gpu_state = pollster::block_on(GpuState::new(window.clone(), &self.config.visuals))?;
        gpu_state.set_point_size(self.config.params.point_size);

        // Pixel density is sampled once; the sprite size stays fixed for the session.
        self.frame = FrameUniforms::new(window.scale_factor() as f32);

        let mut regen = Regenerator::new(gpu_state.limits(), self.config.seed);
        regen.request(&self.config.params);

        #[cfg(feature = "egui")]
        if self.config.ui {
            self.egui = Some(EguiIntegration::new(
                gpu_state.device(),
                gpu_state.config.format,
                &window,
            ));
        }
        #[cfg(not(feature = "egui"))]
        if self.config.ui {
            log::debug!("built without the egui feature; parameter panel unavailable");
        }

        log::info!(
            "window {}x{} at {:.2}x scale",
            gpu_state.config.width,
            gpu_state.config.height,
            window.scale_factor()
        );

        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        self.regen = Some(regen);
        self.clock = FrameClock::new();
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let App {
            #[cfg(feature = "egui")]
            config,
            window: Some(window),
            gpu_state: Some(gpu_state),
            regen: Some(regen),
            #[cfg(feature = "egui")]
            egui,
            clock,
            frame,
            show_perf,
            ..
        } = self
        else {
            return;
        };

        let tick = clock.tick();
        frame.advance(tick.elapsed);

        if let Some(result) = regen.poll() {
            match result.and_then(|set| gpu_state.bind_attributes(set)) {
                Ok(()) => {}
                Err(e) => log::warn!("keeping previous galaxy: {}", e),
            }
        }

        #[cfg(feature = "egui")]
        let result = match egui.as_mut() {
            Some(egui) => {
                let stats = crate::ui::PerfStats {
                    fps: clock.fps(),
                    frame_time_ms: clock.frame_time_ms(),
                    particle_count: gpu_state.particle_count(),
                    regenerating: regen.is_pending(),
                };

                let mut changed = false;
                let output = egui.run(window, |ctx| {
                    changed = crate::ui::parameter_window(ctx, &mut config.params, show_perf);
                    if *show_perf {
                        crate::ui::perf_window(ctx, &stats);
                    }
                });

                if changed {
                    gpu_state.set_point_size(config.params.point_size);
                    regen.request(&config.params);
                }

                gpu_state.render_with_overlay(frame, egui, &output)
            }
            None => gpu_state.render(frame),
        };
        #[cfg(not(feature = "egui"))]
        let result = gpu_state.render(frame);

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu_state.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory");
                event_loop.exit();
                return;
            }
            Err(e) => log::warn!("render error: {:?}", e),
        }

        #[cfg(feature = "egui")]
        let title_perf = *show_perf && egui.is_none();
        #[cfg(not(feature = "egui"))]
        let title_perf = *show_perf;

        if title_perf && tick.fps_refreshed {
            window.set_title(&format!(
                "{} - {:.0} FPS - {} particles",
                WINDOW_TITLE,
                clock.fps(),
                gpu_state.particle_count()
            ));
        }

        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.init(event_loop) {
                self.fail(event_loop, err);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        let ui_consumed = match (&mut self.egui, &self.window) {
            (Some(egui), Some(window)) => egui.on_window_event(window, &event),
            _ => false,
        };
        #[cfg(not(feature = "egui"))]
        let ui_consumed = false;

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed && !ui_consumed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = position.x - last_x;
                        let dy = position.y - last_y;

                        if let Some(gpu_state) = &mut self.gpu_state {
                            gpu_state.camera.rotate(dx as f32, dy as f32);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !ui_consumed => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.camera.zoom(scroll);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}
