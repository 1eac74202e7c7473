use std::time::Duration;

use ballpit_assets::{EnvironmentLoader, EnvironmentMap, LoadPoll, MaterialPalette};
use ballpit_common::{BloomConfig, PitConfig};
use ballpit_input::{
    DragFrame, InteractionController, PointerEvent, PointerPhase, SessionState, TouchPhase,
    TouchTracker, ViewportRect,
};
use ballpit_kernel::Ray;
use ballpit_render::{PitCamera, RenderFrame, Renderer};
use ballpit_tools::FpsCounter;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{DriverError, FALLBACK_RADIANCE, Scene};

/// Setup progress. Transitions only forward.
#[derive(Debug)]
pub enum InitState {
    Uninitialized,
    LoadingAssets(EnvironmentLoader),
    Ready(Box<Scene>),
    TornDown,
}

impl InitState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::LoadingAssets(_) => "loading",
            Self::Ready(_) => "ready",
            Self::TornDown => "torn down",
        }
    }
}

/// What a call to [`FrameDriver::frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Not scheduled, not started, or torn down.
    Skipped,
    /// Waiting on the environment map.
    Loading,
    Rendered { substeps: u32, bloom: bool },
}

/// Owns the pit and the renderer and runs one frame per host callback.
///
/// Timestamps are durations since an arbitrary host-chosen origin; only
/// differences matter.
pub struct FrameDriver<R: Renderer> {
    config: PitConfig,
    state: InitState,
    renderer: R,
    camera: PitCamera,
    viewport: ViewportRect,
    bloom: BloomConfig,
    session: SessionState,
    controller: InteractionController,
    touches: TouchTracker,
    fps: FpsCounter,
    scheduled: bool,
    input_attached: bool,
    last_frame: Option<Duration>,
}

impl<R: Renderer> FrameDriver<R> {
    /// Validate `config` and size the camera for a `width` x `height` viewport.
    pub fn new(
        config: PitConfig,
        mut renderer: R,
        width: u32,
        height: u32,
    ) -> Result<Self, DriverError> {
        config.validate()?;
        let mut camera = PitCamera::new(&config.camera);
        camera.set_viewport(width, height);
        renderer.resize(width, height);
        Ok(Self {
            bloom: config.bloom.clamped(),
            controller: InteractionController::new(config.drag.clone()),
            config,
            state: InitState::Uninitialized,
            renderer,
            camera,
            viewport: ViewportRect::from_size(width as f32, height as f32),
            session: SessionState::default(),
            touches: TouchTracker::new(),
            fps: FpsCounter::new(),
            scheduled: false,
            input_attached: false,
            last_frame: None,
        })
    }

    /// Begin setup, gated on `loader`. Ignored unless uninitialized.
    pub fn start(&mut self, loader: EnvironmentLoader) {
        if !matches!(self.state, InitState::Uninitialized) {
            tracing::warn!(state = self.state.name(), "start ignored");
            return;
        }
        self.state = InitState::LoadingAssets(loader);
        self.scheduled = true;
        self.input_attached = true;
    }

    /// Begin setup, loading the configured environment map in the background.
    pub fn start_loading(&mut self) {
        let assets = &self.config.assets;
        let loader = EnvironmentLoader::spawn(&assets.environment_map, assets.load_timeout());
        self.start(loader);
    }

    /// Begin setup with an already decoded environment map.
    pub fn start_with_environment(&mut self, environment: EnvironmentMap) {
        self.start(EnvironmentLoader::ready(environment));
    }

    /// Run one frame at `now`.
    pub fn frame(&mut self, now: Duration) -> Result<FrameOutcome, DriverError> {
        if !self.scheduled {
            return Ok(FrameOutcome::Skipped);
        }
        let _span = tracing::info_span!("frame", state = self.state.name()).entered();
        let polled = match &self.state {
            InitState::Uninitialized | InitState::TornDown => return Ok(FrameOutcome::Skipped),
            InitState::Ready(_) => None,
            InitState::LoadingAssets(loader) => Some(loader.poll()),
        };
        match polled {
            None => {}
            Some(LoadPoll::Pending) => return Ok(FrameOutcome::Loading),
            Some(LoadPoll::Ready(environment)) => self.finish_setup(environment)?,
            Some(LoadPoll::Failed(e)) => {
                tracing::warn!(error = %e, "environment map unavailable, using flat lighting");
                self.finish_setup(EnvironmentMap::flat(FALLBACK_RADIANCE))?;
            }
        }
        self.run_frame(now)
    }

    fn finish_setup(&mut self, environment: EnvironmentMap) -> Result<(), DriverError> {
        self.renderer
            .set_environment(&environment)
            .map_err(DriverError::render)?;
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let scene = Scene::build(&self.config, MaterialPalette::default(), &mut rng);
        tracing::info!(
            entities = scene.registry.len(),
            seed = ?self.config.seed,
            flat_lighting = environment.is_flat(),
            "pit ready"
        );
        self.state = InitState::Ready(Box::new(scene));
        self.last_frame = None;
        Ok(())
    }

    fn run_frame(&mut self, now: Duration) -> Result<FrameOutcome, DriverError> {
        let InitState::Ready(scene) = &mut self.state else {
            return Ok(FrameOutcome::Skipped);
        };

        self.fps.tick(now);

        let ray = self.session.pointer.map(|ndc| self.camera.ray_from_ndc(ndc));
        if !self.session.dragging {
            self.controller
                .hit_test(&mut self.session, &mut scene.registry, ray.as_ref(), now);
        }

        scene.registry.advance_highlights(now, &self.config.highlight);

        if let (true, Some(ray)) = (self.session.dragging, ray.as_ref()) {
            let frame = DragFrame {
                origin: self.camera.position(),
                forward: self.camera.forward(),
                unit_force: self
                    .camera
                    .unit_force_scale(self.config.drag.reference_view_height),
            };
            self.controller
                .apply_drag(&self.session, &scene.registry, &mut scene.world, ray, &frame);
        }

        let elapsed = self
            .last_frame
            .map(|last| now.saturating_sub(last))
            .unwrap_or_default();
        self.last_frame = Some(now);
        let physics = &self.config.physics;
        let substeps = scene.world.step(
            physics.fixed_timestep,
            elapsed.as_secs_f32(),
            physics.max_substeps,
        );

        scene.registry.sync_meshes(&scene.world);

        let frame = RenderFrame::build(&self.camera, &scene.registry, &scene.palette);
        let bloom = self.bloom.enabled;
        if bloom {
            self.renderer.render_with_bloom(&frame, &self.bloom)
        } else {
            self.renderer.render(&frame)
        }
        .map_err(DriverError::render)?;

        Ok(FrameOutcome::Rendered { substeps, bloom })
    }

    fn pointer_ray(&self) -> Option<Ray> {
        self.session.pointer.map(|ndc| self.camera.ray_from_ndc(ndc))
    }

    /// Apply a pointer event. Ignored once input is detached.
    pub fn handle_pointer(&mut self, event: PointerEvent, now: Duration) -> PointerPhase {
        if !self.input_attached {
            return self.session.phase();
        }
        match event {
            PointerEvent::Move { x, y } | PointerEvent::Down { x, y } => {
                self.session.pointer = self.viewport.to_ndc(x, y);
            }
            PointerEvent::Leave => self.session.pointer = None,
            PointerEvent::Up => {}
        }
        let ray = self.pointer_ray();
        let InitState::Ready(scene) = &mut self.state else {
            return self.session.phase();
        };
        let registry = &mut scene.registry;
        match event {
            PointerEvent::Move { .. } => {
                self.controller
                    .hit_test(&mut self.session, registry, ray.as_ref(), now)
            }
            PointerEvent::Down { .. } => {
                self.controller
                    .press(&mut self.session, registry, ray.as_ref(), now)
            }
            PointerEvent::Up => self.controller.release(&mut self.session, registry, now),
            PointerEvent::Leave => self.session.phase(),
        }
    }

    /// Apply a touch event; only the first active touch is followed.
    pub fn handle_touch(
        &mut self,
        id: u64,
        phase: TouchPhase,
        x: f32,
        y: f32,
        now: Duration,
    ) -> PointerPhase {
        match self.touches.touch(id, phase, x, y) {
            Some(event) => self.handle_pointer(event, now),
            None => self.session.phase(),
        }
    }

    /// Resize camera and render targets, then render once immediately.
    pub fn handle_resize(&mut self, width: u32, height: u32) -> Result<(), DriverError> {
        if matches!(self.state, InitState::TornDown) || width == 0 || height == 0 {
            return Ok(());
        }
        self.camera.set_viewport(width, height);
        self.viewport = ViewportRect::from_size(width as f32, height as f32);
        self.renderer.resize(width, height);
        tracing::debug!(width, height, distance = self.camera.distance(), "resized");

        let InitState::Ready(scene) = &self.state else {
            return Ok(());
        };
        let frame = RenderFrame::build(&self.camera, &scene.registry, &scene.palette);
        if self.bloom.enabled {
            self.renderer.render_with_bloom(&frame, &self.bloom)
        } else {
            self.renderer.render(&frame)
        }
        .map_err(DriverError::render)
    }

    /// Stop scheduling frames. The first step of teardown.
    pub fn cancel(&mut self) {
        self.scheduled = false;
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Cancel, detach input, and release the scene and GPU resources.
    ///
    /// Returns false if already torn down.
    pub fn teardown(&mut self) -> bool {
        if matches!(self.state, InitState::TornDown) {
            return false;
        }
        self.cancel();
        self.input_attached = false;
        self.session = SessionState::default();
        if let InitState::Ready(mut scene) = std::mem::replace(&mut self.state, InitState::TornDown)
        {
            scene.release();
        }
        self.renderer.release();
        tracing::info!("pit torn down");
        true
    }

    pub fn state(&self) -> &InitState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, InitState::Ready(_))
    }

    pub fn scene(&self) -> Option<&Scene> {
        match &self.state {
            InitState::Ready(scene) => Some(scene.as_ref()),
            _ => None,
        }
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        match &mut self.state {
            InitState::Ready(scene) => Some(scene.as_mut()),
            _ => None,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn phase(&self) -> PointerPhase {
        self.session.phase()
    }

    pub fn camera(&self) -> &PitCamera {
        &self.camera
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn config(&self) -> &PitConfig {
        &self.config
    }

    pub fn bloom(&self) -> &BloomConfig {
        &self.bloom
    }

    /// Live bloom parameters, read on every frame.
    pub fn bloom_mut(&mut self) -> &mut BloomConfig {
        &mut self.bloom
    }

    pub fn fps(&self) -> f32 {
        self.fps.fps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballpit_common::GridDims;
    use ballpit_ecs::spawn::cell_center;
    use ballpit_render::DebugTextRenderer;
    use glam::Vec3;

    const W: u32 = 800;
    const H: u32 = 600;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn config(grid: GridDims) -> PitConfig {
        PitConfig {
            grid,
            seed: Some(7),
            ..PitConfig::default()
        }
    }

    fn ready_driver(grid: GridDims) -> FrameDriver<DebugTextRenderer> {
        let mut driver = FrameDriver::new(config(grid), DebugTextRenderer::new(), W, H).unwrap();
        driver.start_with_environment(EnvironmentMap::flat([1.0, 1.0, 1.0]));
        driver.frame(ms(0)).unwrap();
        assert!(driver.is_ready());
        driver
    }

    /// Client coordinates of a world point.
    fn screen_of(driver: &FrameDriver<DebugTextRenderer>, p: Vec3) -> (f32, f32) {
        let ndc = driver.camera().view_projection().project_point3(p);
        (
            (ndc.x + 1.0) * 0.5 * W as f32,
            (1.0 - ndc.y) * 0.5 * H as f32,
        )
    }

    fn entity_screen(driver: &FrameDriver<DebugTextRenderer>, index: usize) -> (f32, f32) {
        let scene = driver.scene().unwrap();
        let p = scene.registry.get(index).unwrap().mesh.transform.position;
        screen_of(driver, p)
    }

    #[test]
    fn nothing_runs_before_start() {
        let mut driver =
            FrameDriver::new(config(GridDims::default()), DebugTextRenderer::new(), W, H).unwrap();
        assert_eq!(driver.frame(ms(0)).unwrap(), FrameOutcome::Skipped);
        assert!(driver.scene().is_none());
        assert_eq!(driver.renderer().direct_frames(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = FrameDriver::new(
            config(GridDims::new(0, 1, 1)),
            DebugTextRenderer::new(),
            W,
            H,
        );
        assert!(matches!(result, Err(DriverError::Config(_))));
    }

    #[test]
    fn ready_spawns_full_grid_inside_walls() {
        let driver = ready_driver(GridDims::new(5, 5, 5));
        let scene = driver.scene().unwrap();
        assert_eq!(scene.registry.len(), 125);
        assert_eq!(scene.world.body_count(), 125);
        assert_eq!(scene.world.plane_count(), 6);
        assert_eq!(driver.renderer().environment(), Some((1, 1)));
    }

    #[test]
    fn failed_asset_load_falls_back_to_flat_lighting() {
        let mut driver =
            FrameDriver::new(config(GridDims::new(2, 2, 2)), DebugTextRenderer::new(), W, H)
                .unwrap();
        driver.start(EnvironmentLoader::spawn("/definitely/not/here.hdr", None));
        let mut now = 0;
        while !driver.is_ready() {
            let outcome = driver.frame(ms(now)).unwrap();
            if outcome == FrameOutcome::Loading {
                assert_eq!(driver.renderer().direct_frames(), 0);
                assert_eq!(driver.renderer().composite_frames(), 0);
                std::thread::sleep(ms(2));
            }
            now += 16;
            assert!(now < 60_000, "loader never resolved");
        }
        assert_eq!(driver.renderer().environment(), Some((1, 1)));
        assert_eq!(driver.scene().unwrap().registry.len(), 8);
    }

    #[test]
    fn scenario_spawn_two_by_two() {
        let driver = ready_driver(GridDims::new(2, 2, 1));
        let scene = driver.scene().unwrap();
        assert_eq!(scene.registry.len(), 4);
        let dims = GridDims::new(2, 2, 1);
        let spawn = &driver.config().spawn;
        for (entity, cell) in scene.registry.iter().zip(dims.cells()) {
            let p = entity.mesh.transform.position;
            assert!(scene.bounds.contains(p));
            // The setup frame takes no physics step.
            let drift = (p - cell_center(dims, cell, spawn.spacing)).length();
            assert!(drift < spawn.jitter * 2.0 + 0.05, "drift {drift}");
        }
    }

    #[test]
    fn scenario_hover_applies_glow_immediately() {
        let mut driver = ready_driver(GridDims::new(2, 2, 1));
        let (x, y) = entity_screen(&driver, 2);
        let phase = driver.handle_pointer(PointerEvent::Move { x, y }, ms(5));
        assert_eq!(phase, PointerPhase::Hovering(2));
        let scene = driver.scene().unwrap();
        assert!(scene.registry.get(2).unwrap().mesh.variant.is_glowing());
        assert_eq!(scene.registry.glowing_count(), 1);
    }

    #[test]
    fn scenario_press_drag_release() {
        let mut driver = ready_driver(GridDims::new(2, 2, 1));
        let (x, y) = entity_screen(&driver, 2);
        driver.handle_pointer(PointerEvent::Move { x, y }, ms(5));
        let phase = driver.handle_pointer(PointerEvent::Down { x, y }, ms(6));
        assert_eq!(phase, PointerPhase::Dragging);

        driver.handle_pointer(PointerEvent::Move { x: 1.0, y: 1.0 }, ms(7));
        assert_eq!(driver.phase(), PointerPhase::Dragging);
        driver.frame(ms(16)).unwrap();
        assert_eq!(driver.phase(), PointerPhase::Dragging);

        let phase = driver.handle_pointer(PointerEvent::Up, ms(20));
        assert_eq!(phase, PointerPhase::Idle);
    }

    #[test]
    fn release_after_leaving_ends_drag() {
        let mut driver = ready_driver(GridDims::new(2, 2, 1));
        let (x, y) = entity_screen(&driver, 1);
        driver.handle_pointer(PointerEvent::Down { x, y }, ms(1));
        assert_eq!(driver.phase(), PointerPhase::Dragging);

        driver.handle_pointer(PointerEvent::Leave, ms(2));
        assert_eq!(driver.phase(), PointerPhase::Dragging);
        assert_eq!(driver.handle_pointer(PointerEvent::Up, ms(3)), PointerPhase::Idle);

        driver.handle_pointer(PointerEvent::Move { x, y }, ms(4));
        driver.frame(ms(20)).unwrap();
        assert!(!driver.session().dragging);
        assert_eq!(driver.phase(), PointerPhase::Hovering(1));
    }

    #[test]
    fn non_finite_config_is_rejected() {
        let mut config = config(GridDims::new(1, 1, 1));
        config.spawn.jitter = f32::INFINITY;
        let result = FrameDriver::new(config, DebugTextRenderer::new(), W, H);
        assert!(matches!(result, Err(DriverError::Config(_))));
    }

    #[test]
    fn drag_pushes_spheres() {
        let mut driver = ready_driver(GridDims::new(2, 2, 1));
        driver.scene_mut().unwrap().world.set_gravity(Vec3::ZERO);
        let (x, y) = entity_screen(&driver, 0);
        driver.handle_pointer(PointerEvent::Down { x, y }, ms(1));
        assert_eq!(driver.phase(), PointerPhase::Dragging);
        driver.frame(ms(17)).unwrap();
        let scene = driver.scene().unwrap();
        let moving = scene
            .world
            .bodies()
            .filter(|(_, b)| b.linear_velocity.length() > 0.0)
            .count();
        assert_eq!(moving, 4);
    }

    #[test]
    fn scenario_bloom_disabled_renders_direct() {
        let mut driver = ready_driver(GridDims::new(2, 2, 1));
        driver.bloom_mut().enabled = false;
        let before = driver.renderer().direct_frames();
        for i in 1..=5 {
            let outcome = driver.frame(ms(i * 16)).unwrap();
            assert!(matches!(outcome, FrameOutcome::Rendered { bloom: false, .. }));
        }
        assert_eq!(driver.renderer().direct_frames(), before + 5);
        // Only the setup frame went through the composite path.
        assert_eq!(driver.renderer().composite_frames(), 1);
    }

    #[test]
    fn bloom_enabled_renders_composite() {
        let mut driver = ready_driver(GridDims::new(1, 1, 1));
        driver.frame(ms(16)).unwrap();
        assert_eq!(driver.renderer().composite_frames(), 2);
        assert_eq!(driver.renderer().direct_frames(), 0);
        driver.bloom_mut().set_strength(10.0);
        assert_eq!(driver.bloom().strength, BloomConfig::STRENGTH_MAX);
    }

    #[test]
    fn meshes_match_bodies_after_every_frame() {
        let mut driver = ready_driver(GridDims::new(3, 3, 3));
        for i in 1..=60 {
            driver.frame(ms(i * 16)).unwrap();
            let scene = driver.scene().unwrap();
            for entity in scene.registry.iter() {
                let body = scene.world.body(entity.body).unwrap();
                assert_eq!(entity.mesh.transform.position, body.position);
                assert_eq!(entity.mesh.transform.rotation, body.rotation);
            }
        }
        assert!(driver.scene().unwrap().world.tick() > 0);
    }

    #[test]
    fn at_most_one_entity_glows_at_full_hover() {
        let mut driver = ready_driver(GridDims::new(2, 2, 1));
        driver.scene_mut().unwrap().world.set_gravity(Vec3::ZERO);
        for (step, index) in [0usize, 1, 2, 3].into_iter().enumerate() {
            let (x, y) = entity_screen(&driver, index);
            let t = step as u64 * 2000;
            driver.handle_pointer(PointerEvent::Move { x, y }, ms(t));
            driver.frame(ms(t + 1500)).unwrap();
            let scene = driver.scene().unwrap();
            assert_eq!(scene.registry.glowing_count(), 1);
            assert!(scene.registry.get(index).unwrap().mesh.variant.is_glowing());
        }
    }

    #[test]
    fn highlight_completes_after_duration() {
        let mut driver = ready_driver(GridDims::new(2, 2, 1));
        driver.scene_mut().unwrap().world.set_gravity(Vec3::ZERO);
        let (x, y) = entity_screen(&driver, 1);
        driver.handle_pointer(PointerEvent::Move { x, y }, ms(100));
        driver.handle_pointer(PointerEvent::Leave, ms(100));
        driver.frame(ms(100)).unwrap();
        let entity = driver.scene().unwrap().registry.get(1).unwrap();
        assert!(entity.highlight.is_animating());

        driver.frame(ms(1099)).unwrap();
        let entity = driver.scene().unwrap().registry.get(1).unwrap();
        assert!(entity.highlight.is_animating());

        driver.frame(ms(1100)).unwrap();
        let entity = driver.scene().unwrap().registry.get(1).unwrap();
        assert!(!entity.highlight.is_animating());
        assert!(!entity.mesh.variant.is_glowing());
    }

    #[test]
    fn resize_updates_camera_and_renders_once() {
        let mut driver = ready_driver(GridDims::new(1, 1, 1));
        let before = driver.renderer().composite_frames();
        driver.handle_resize(400, 800).unwrap();
        assert!((driver.camera().distance() - 30.0).abs() < 1e-4);
        assert_eq!(driver.renderer().size(), (400, 800));
        assert_eq!(driver.renderer().composite_frames(), before + 1);

        driver.handle_resize(1600, 900).unwrap();
        assert_eq!(driver.camera().distance(), 15.0);
    }

    #[test]
    fn cancel_stops_frames() {
        let mut driver = ready_driver(GridDims::new(1, 1, 1));
        let tick = driver.scene().unwrap().world.tick();
        driver.cancel();
        assert!(!driver.is_scheduled());
        assert_eq!(driver.frame(ms(500)).unwrap(), FrameOutcome::Skipped);
        assert_eq!(driver.scene().unwrap().world.tick(), tick);
    }

    #[test]
    fn teardown_is_idempotent_and_detaches_input() {
        let mut driver = ready_driver(GridDims::new(2, 2, 2));
        assert!(driver.teardown());
        assert!(!driver.is_scheduled());
        assert!(driver.renderer().is_released());
        assert!(driver.scene().is_none());
        assert!(!driver.teardown());

        let phase = driver.handle_pointer(PointerEvent::Down { x: 400.0, y: 300.0 }, ms(1));
        assert_eq!(phase, PointerPhase::Idle);
        assert!(driver.session().pointer.is_none());
        driver.handle_resize(100, 100).unwrap();
        assert_eq!(driver.renderer().size(), (W, H));
        assert_eq!(driver.frame(ms(2)).unwrap(), FrameOutcome::Skipped);
    }

    #[test]
    fn teardown_while_loading() {
        let mut driver =
            FrameDriver::new(config(GridDims::new(1, 1, 1)), DebugTextRenderer::new(), W, H)
                .unwrap();
        driver.start(EnvironmentLoader::spawn("/definitely/not/here.hdr", None));
        assert!(driver.teardown());
        assert_eq!(driver.frame(ms(0)).unwrap(), FrameOutcome::Skipped);
        assert!(!driver.is_ready());
    }

    #[test]
    fn touch_follows_first_finger() {
        let mut driver = ready_driver(GridDims::new(2, 2, 1));
        let (x, y) = entity_screen(&driver, 3);
        let phase = driver.handle_touch(1, TouchPhase::Started, x, y, ms(1));
        assert_eq!(phase, PointerPhase::Dragging);
        driver.handle_touch(2, TouchPhase::Started, 0.0, 0.0, ms(2));
        driver.handle_touch(2, TouchPhase::Ended, 0.0, 0.0, ms(3));
        assert_eq!(driver.phase(), PointerPhase::Dragging);
        let phase = driver.handle_touch(1, TouchPhase::Ended, x, y, ms(4));
        assert_eq!(phase, PointerPhase::Idle);
    }

    #[test]
    fn physics_uses_wall_clock_delta() {
        let mut driver = ready_driver(GridDims::new(1, 1, 1));
        let start = driver.scene().unwrap().world.tick();
        // Setup frame had no previous timestamp, so it took no step.
        assert_eq!(start, 0);
        let outcome = driver.frame(ms(1000)).unwrap();
        assert_eq!(
            outcome,
            FrameOutcome::Rendered {
                substeps: driver.config().physics.max_substeps,
                bloom: true
            }
        );
    }
}
