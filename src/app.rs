//! Window and event loop.
//!
//! [`App`] is the winit handler: it owns the window, the renderer and the
//! [`Session`], turns window events into session events and camera input,
//! and draws one frame per redraw.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::Config;
use crate::driver::{FrameKind, Scene};
use crate::error::AppError;
use crate::gpu::GpuState;
use crate::session::{Session, SessionEvent};
use crate::time::FrameClock;

#[cfg(feature = "egui")]
use crate::panel::{self, PanelChange};

/// Open the window and run until it is closed.
pub fn run(config: Config) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    app.session.start(&app.config);

    event_loop.run_app(&mut app)?;
    app.session.teardown();

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct App {
    config: Config,
    session: Session,
    clock: FrameClock,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    show_panel: bool,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    /// Failure that ended the event loop early.
    error: Option<AppError>,
}

impl App {
    fn new(config: Config) -> Self {
        let session = Session::new(&config);
        Self {
            show_panel: config.visual.show_panel,
            config,
            session,
            clock: FrameClock::new(),
            window: None,
            gpu_state: None,
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        tracing::error!("{}", error);
        self.error = Some(error);
        self.session.teardown();
        event_loop.exit();
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        tracing::info!("Window closed");
        self.session.teardown();
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) else {
            return;
        };

        let dt = self.clock.tick();
        let Some(update) = self.session.handle(SessionEvent::RenderTick { dt }) else {
            return;
        };

        if let FrameKind::Points { upload: true, .. } = update.kind {
            if let Some(Scene::Blend(buffer)) = self.session.driver().scene() {
                gpu_state.write_positions(buffer.current());
            }
        }

        #[cfg(feature = "egui")]
        {
            let mut tunables = *self.session.tunables();
            let show_dispersion = self.session.has_dispersion();
            let show_panel = self.show_panel;
            let mut change = PanelChange::default();
            gpu_state.run_ui(window, |ctx| {
                if show_panel {
                    change = panel::show(ctx, &mut tunables, show_dispersion);
                }
            });
            *self.session.tunables_mut() = tunables;
            self.session.apply_panel(change);
        }

        let uniforms = self.session.uniforms(&update);
        match gpu_state.render(&uniforms, &update.kind) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu_state.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("GPU out of memory");
                self.session.teardown();
                event_loop.exit();
                return;
            }
            Err(e) => tracing::warn!("Render error: {:?}", e),
        }

        if self.clock.fps_refreshed() {
            window.set_title(&format!(
                "{} | {:.0} fps | progress {:.2}",
                self.config.window.title,
                self.clock.fps(),
                update.progress
            ));
        }

        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let mut gpu_state = match pollster::block_on(GpuState::new(window.clone())) {
            Ok(g) => g,
            Err(e) => return self.fail(event_loop, e.into()),
        };
        gpu_state.load_scene(self.session.driver().scene());

        let size = window.inner_size();
        self.session.handle(SessionEvent::Resize {
            width: size.width,
            height: size.height,
        });

        window.request_redraw();
        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        let consumed = match (&self.window, &mut self.gpu_state) {
            (Some(window), Some(gpu_state)) => gpu_state.on_window_event(window, &event),
            _ => false,
        };
        #[cfg(not(feature = "egui"))]
        let consumed = false;

        match event {
            WindowEvent::CloseRequested => self.close(event_loop),
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
                self.session.handle(SessionEvent::Resize {
                    width: physical_size.width,
                    height: physical_size.height,
                });
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } if !consumed => match code {
                KeyCode::Escape => self.close(event_loop),
                KeyCode::Tab => self.show_panel = !self.show_panel,
                _ => {}
            },
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed && !consumed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;
                        self.session.view_mut().camera.orbit(dx, dy);
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.session.view_mut().camera.zoom(scroll);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}
