//! Session state.
//!
//! One [`Session`] owns everything that lives for the length of a run: the
//! gesture signal, the animation driver, the view, the panel tunables and
//! the tracking resources. Three event sources feed it on one thread:
//!
//! - render ticks from the window's redraw loop,
//! - detections drained from the landmark receiver,
//! - resize notifications.
//!
//! Nothing here touches the GPU; the renderer consumes the [`FrameUpdate`]
//! and [`FrameUniforms`] it produces.

use glam::{Mat4, Vec3};

use crate::config::{Config, SceneKind};
use crate::driver::{AnimationDriver, FrameKind, FrameUpdate, Scene};
use crate::gesture::{Detection, GestureSignal};
use crate::orbital::{OrbitalField, OrbitalMotion};
use crate::panel::{ColorSource, PanelChange, Tunables};
use crate::point_cloud;
use crate::sampling::Sampler;
use crate::tracking::{python_module_available, LandmarkReceiver, TrackerConfig, TrackerProcess};
use crate::uniforms::FrameUniforms;
use crate::view::ViewState;

/// Input to [`Session::handle`].
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Display-synchronized repaint.
    RenderTick { dt: f32 },
    /// One detection result, in arrival order.
    Detection(Detection),
    /// New output size in pixels.
    Resize { width: u32, height: u32 },
}

/// Camera distance that frames a scene of the given kind.
pub fn default_camera_distance(config: &Config) -> f32 {
    match config.scene.kind {
        // Targets span `2 * working_width` world units horizontally.
        SceneKind::Image => config.image.working_width as f32 * 2.6,
        SceneKind::Orbital => config.orbital.ring_outer * 2.5,
    }
}

pub struct Session {
    scene_kind: SceneKind,
    gesture: GestureSignal,
    driver: AnimationDriver,
    view: ViewState,
    tunables: Tunables,
    color_source: ColorSource,
    motion: OrbitalMotion,
    tilt: f32,
    receiver: Option<LandmarkReceiver>,
    tracker: Option<TrackerProcess>,
    /// Tracking was running and has since gone away.
    tracking_lost: bool,
    last_update: Option<FrameUpdate>,
    torn_down: bool,
}

impl Session {
    /// Build an idle session sized to the configured window.
    pub fn new(config: &Config) -> Self {
        let color = match config.scene.kind {
            SceneKind::Image => config.visual.color,
            // The orbital palette is baked per particle; white leaves it as is.
            SceneKind::Orbital => [1.0; 3],
        };

        Self {
            scene_kind: config.scene.kind,
            gesture: GestureSignal::new(config.gesture),
            driver: AnimationDriver::new(config.visual.rotation_speed),
            view: ViewState::new(
                config.window.width,
                config.window.height,
                &config.camera,
                default_camera_distance(config),
            ),
            tunables: Tunables::new(color, config.visual.point_size, config.image.dispersion),
            color_source: config.visual.color_source,
            motion: config.orbital.motion,
            tilt: config.orbital.tilt_degrees.to_radians(),
            receiver: None,
            tracker: None,
            tracking_lost: false,
            last_update: None,
            torn_down: false,
        }
    }

    /// Generate the configured scene and acquire tracking resources.
    ///
    /// Failures are logged and leave the session running without the failed
    /// piece: no scene keeps the driver idle, no receiver keeps progress at 0.
    pub fn start(&mut self, config: &Config) {
        self.load_scene(config);
        self.start_tracking(&config.tracker);
    }

    fn load_scene(&mut self, config: &Config) {
        match self.scene_kind {
            SceneKind::Image => {
                let mut sampler = Sampler::new(config.image.seed);
                match point_cloud::load(&config.image, &mut sampler) {
                    Ok(buffer) => self.driver.load(Scene::Blend(buffer)),
                    Err(e) => tracing::error!(
                        "Failed to load {}: {}; nothing will be drawn",
                        config.image.path.display(),
                        e
                    ),
                }
            }
            SceneKind::Orbital => {
                let mut sampler = Sampler::new(config.orbital.seed);
                let field = OrbitalField::generate(&config.orbital, &mut sampler);
                self.driver.load(Scene::Orbital(field));
            }
        }
    }

    fn start_tracking(&mut self, config: &TrackerConfig) {
        if !config.enabled {
            tracing::info!("Hand tracking disabled");
            return;
        }

        match LandmarkReceiver::bind(&config.socket_addr()) {
            Ok(receiver) => self.receiver = Some(receiver),
            Err(e) => {
                tracing::warn!("Hand tracking unavailable: {}", e);
                return;
            }
        }

        if config.auto_launch {
            if !python_module_available(&config.python, "mediapipe") {
                tracing::warn!(
                    "{} cannot import mediapipe; the tracker will likely exit",
                    config.python
                );
            }
            match TrackerProcess::launch(config) {
                Ok(process) => self.tracker = Some(process),
                Err(e) => tracing::warn!("Hand tracker not started: {}", e),
            }
        }
    }

    /// Use an already bound receiver instead of the configured one.
    pub fn attach_receiver(&mut self, receiver: LandmarkReceiver) {
        self.receiver = Some(receiver);
    }

    /// Feed one event. Render ticks return the frame to draw, or `None`
    /// once the session has been torn down.
    pub fn handle(&mut self, event: SessionEvent) -> Option<FrameUpdate> {
        match event {
            SessionEvent::RenderTick { dt } => self.frame(dt),
            SessionEvent::Detection(detection) => {
                self.on_detection(&detection);
                None
            }
            SessionEvent::Resize { width, height } => {
                if self.view.resize(width, height) {
                    tracing::debug!("Viewport resized to {}x{}", width, height);
                }
                None
            }
        }
    }

    fn on_detection(&mut self, detection: &Detection) {
        let was_present = self.gesture.hand_present();
        self.gesture.on_detection(detection);
        match (was_present, self.gesture.hand_present()) {
            (false, true) => tracing::info!("Hand acquired"),
            (true, false) => tracing::info!("Hand lost"),
            _ => {}
        }
    }

    /// Drain pending detections without blocking.
    ///
    /// Once the receiver fails or the sidecar exits, every call feeds an
    /// empty detection so the signal decays instead of holding its last value.
    pub fn poll_tracking(&mut self) {
        if let Some(receiver) = &mut self.receiver {
            match receiver.drain() {
                Ok(detections) => {
                    for detection in &detections {
                        self.on_detection(detection);
                    }
                }
                Err(e) => {
                    tracing::error!("Landmark receiver failed, tracking disabled: {}", e);
                    self.lose_tracking();
                }
            }
        }

        if let Some(tracker) = &mut self.tracker {
            if !tracker.is_running() {
                tracing::warn!("Hand tracker is gone, tracking disabled");
                self.lose_tracking();
            }
        }

        if self.tracking_lost {
            self.on_detection(&Detection::none());
        }
    }

    fn lose_tracking(&mut self) {
        if let Some(mut receiver) = self.receiver.take() {
            receiver.close();
        }
        if let Some(mut tracker) = self.tracker.take() {
            tracker.stop();
        }
        self.tracking_lost = true;
    }

    /// Render tick: drain tracking, then advance the driver with the latest
    /// progress.
    pub fn frame(&mut self, dt: f32) -> Option<FrameUpdate> {
        self.poll_tracking();
        let update = self.driver.tick(dt, self.gesture.progress());
        self.last_update = update;
        update
    }

    /// Uniform block for a frame produced by [`frame`](Self::frame).
    pub fn uniforms(&self, update: &FrameUpdate) -> FrameUniforms {
        let model = match update.kind {
            FrameKind::Points { rotation, .. } => Mat4::from_rotation_y(rotation),
            FrameKind::Orbital { .. } => Mat4::from_rotation_x(self.tilt),
            FrameKind::Background => Mat4::IDENTITY,
        };

        let mut uniforms = FrameUniforms::new(
            self.view.view_projection(model),
            Vec3::from(self.tunables.color),
            self.tunables.point_size,
            self.view.size(),
        );

        match update.kind {
            FrameKind::Points { .. } => {
                uniforms.color_mix = match self.color_source {
                    ColorSource::Tint => 0.0,
                    ColorSource::Pixel => 1.0,
                };
            }
            FrameKind::Orbital { time, zoom } => {
                uniforms.time = time;
                uniforms.zoom = zoom;
                uniforms.chaos_threshold = self.motion.chaos_threshold;
                uniforms.chaos_amplitude = self.motion.chaos_amplitude;
                uniforms.zoom_scale = self.motion.zoom_scale;
                uniforms.color_mix = 1.0;
            }
            FrameKind::Background => {}
        }
        uniforms
    }

    /// Apply edited tunables to the active scene.
    pub fn apply_panel(&mut self, change: PanelChange) {
        if !change.any() {
            return;
        }
        self.tunables = self.tunables.clamped();

        if change.dispersion {
            if let Some(Scene::Blend(buffer)) = self.driver.scene_mut() {
                buffer.set_dispersion(self.tunables.dispersion);
            }
        }
        tracing::debug!("Panel change applied: {:?}", self.tunables);
    }

    /// Cancel the frame loop and release tracking and scene resources.
    /// Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        self.driver.cancel();
        if let Some(mut receiver) = self.receiver.take() {
            receiver.close();
        }
        if let Some(mut tracker) = self.tracker.take() {
            tracker.stop();
        }
        self.driver.clear();
        tracing::info!("Session torn down");
    }

    pub fn scene_kind(&self) -> SceneKind {
        self.scene_kind
    }

    pub fn gesture(&self) -> &GestureSignal {
        &self.gesture
    }

    pub fn progress(&self) -> f32 {
        self.gesture.progress()
    }

    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn tunables_mut(&mut self) -> &mut Tunables {
        &mut self.tunables
    }

    /// Whether the panel should offer the dispersion slider.
    pub fn has_dispersion(&self) -> bool {
        matches!(self.driver.scene(), Some(Scene::Blend(_)))
    }

    pub fn last_update(&self) -> Option<FrameUpdate> {
        self.last_update
    }

    pub fn is_tracking(&self) -> bool {
        self.receiver.is_some()
    }

    /// Whether tracking ran and then failed or exited.
    pub fn tracking_lost(&self) -> bool {
        self.tracking_lost
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
