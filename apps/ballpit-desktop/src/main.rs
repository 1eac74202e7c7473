use anyhow::Result;
use ballpit_common::{BloomConfig, GridDims, PitConfig};
use ballpit_driver::{FrameDriver, FrameOutcome};
use ballpit_input::{PointerEvent, PointerPhase, TouchPhase};
use ballpit_render_wgpu::{GpuContext, WgpuRenderer};
use ballpit_tools::PitInspector;
use clap::Parser;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "ballpit-desktop", about = "Interactive ball pit")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid width override
    #[arg(long)]
    width: Option<u32>,

    /// Grid height override
    #[arg(long)]
    height: Option<u32>,

    /// Grid depth override
    #[arg(long)]
    depth: Option<u32>,

    /// Equirectangular environment map override
    #[arg(long)]
    environment: Option<PathBuf>,

    /// Spawn RNG seed override
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn pit_config(&self) -> Result<PitConfig> {
        let mut config = match &self.config {
            Some(path) => PitConfig::load(path)?,
            None => PitConfig::default(),
        };
        let grid = config.grid;
        config.grid = GridDims::new(
            self.width.unwrap_or(grid.width),
            self.height.unwrap_or(grid.height),
            self.depth.unwrap_or(grid.depth),
        );
        if let Some(path) = &self.environment {
            config.assets.environment_map = path.clone();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

struct Overlay {
    ctx: EguiContext,
    winit: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

struct GpuApp {
    config: PitConfig,
    window: Option<Arc<Window>>,
    driver: Option<FrameDriver<WgpuRenderer>>,
    overlay: Option<Overlay>,
    started: Instant,
    cursor: (f32, f32),
    show_panel: bool,
}

impl GpuApp {
    fn new(config: PitConfig) -> Self {
        Self {
            config,
            window: None,
            driver: None,
            overlay: None,
            started: Instant::now(),
            cursor: (0.0, 0.0),
            show_panel: true,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Ball Pit")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);
        let size = window.inner_size();

        let gpu = GpuContext::new(window.clone(), size.width, size.height)?;

        let egui_ctx = EguiContext::default();
        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&gpu.device, gpu.format(), None, 1, false);

        let renderer = WgpuRenderer::new(gpu);
        let mut driver =
            FrameDriver::new(self.config.clone(), renderer, size.width, size.height)?;
        driver.start_loading();

        self.window = Some(window);
        self.driver = Some(driver);
        self.overlay = Some(Overlay {
            ctx: egui_ctx,
            winit: egui_winit,
            renderer: egui_renderer,
        });
        Ok(())
    }

    /// Frames are requested only while the driver keeps scheduling them.
    fn wants_frame(&self) -> bool {
        self.driver.as_ref().is_some_and(|driver| driver.is_scheduled())
    }

    fn request_frame(&self) {
        if let (true, Some(window)) = (self.wants_frame(), &self.window) {
            window.request_redraw();
        }
    }

    fn pointer(&mut self, event: PointerEvent) {
        let now = self.started.elapsed();
        if let Some(driver) = &mut self.driver {
            driver.handle_pointer(event, now);
        }
    }

    fn redraw(&mut self) {
        let now = self.started.elapsed();
        let (Some(window), Some(driver), Some(overlay)) =
            (&self.window, &mut self.driver, &mut self.overlay)
        else {
            return;
        };

        match driver.frame(now) {
            Ok(FrameOutcome::Rendered { .. }) => {}
            Ok(_) => return,
            Err(e) => {
                tracing::error!("frame failed: {e}");
                return;
            }
        }

        let raw_input = overlay.winit.take_egui_input(window);
        let show_panel = self.show_panel;
        let full_output = overlay.ctx.run(raw_input, |ctx| {
            if show_panel {
                draw_panel(ctx, driver);
            }
        });
        overlay
            .winit
            .handle_platform_output(window, full_output.platform_output);

        let paint_jobs = overlay
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        if let Some(view) = driver.renderer().overlay_view() {
            let gpu = driver.renderer().gpu();
            let (width, height) = gpu.size();
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [width, height],
                pixels_per_point: full_output.pixels_per_point,
            };
            for (id, image_delta) in &full_output.textures_delta.set {
                overlay
                    .renderer
                    .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
            }
            let mut encoder = gpu
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("egui_encoder"),
                });
            overlay.renderer.update_buffers(
                &gpu.device,
                &gpu.queue,
                &mut encoder,
                &paint_jobs,
                &screen_descriptor,
            );
            {
                let mut pass = encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("egui_pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    })
                    .forget_lifetime();
                overlay
                    .renderer
                    .render(&mut pass, &paint_jobs, &screen_descriptor);
            }
            gpu.queue.submit(std::iter::once(encoder.finish()));
        }
        for id in &full_output.textures_delta.free {
            overlay.renderer.free_texture(id);
        }

        driver.renderer_mut().present();
    }
}

fn draw_panel(ctx: &EguiContext, driver: &mut FrameDriver<WgpuRenderer>) {
    egui::SidePanel::left("pit_panel")
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.heading("Ball Pit");
            ui.separator();
            ui.label(format!("FPS: {:.0}", driver.fps()));
            if let Some(scene) = driver.scene() {
                let summary = PitInspector::summary(&scene.world, &scene.registry);
                ui.label(format!("Tick: {}  Time: {:.1}s", summary.tick, summary.time));
                ui.label(format!(
                    "Entities: {}  Glowing: {}",
                    summary.entity_count, summary.glowing
                ));
                ui.label(format!("Kinetic energy: {:.2}", summary.kinetic_energy));
            } else {
                ui.label("Loading environment...");
            }

            let phase = driver.phase();
            ui.label(match phase {
                PointerPhase::Idle => "Pointer: idle".to_string(),
                PointerPhase::Hovering(i) => format!("Pointer: hovering {i}"),
                PointerPhase::Dragging => "Pointer: dragging".to_string(),
            });
            let hovered = driver.session().hovered;
            if let (Some(index), Some(scene)) = (hovered, driver.scene()) {
                if let Some(info) =
                    PitInspector::inspect_entity(&scene.world, &scene.registry, index)
                {
                    ui.small(info.to_string());
                }
            }

            ui.separator();
            ui.heading("Bloom");
            let bloom = driver.bloom_mut();
            ui.checkbox(&mut bloom.enabled, "Enabled");
            let mut strength = bloom.strength;
            let strength_slider =
                egui::Slider::new(&mut strength, 0.0..=BloomConfig::STRENGTH_MAX).text("Strength");
            if ui.add(strength_slider).changed()
            {
                bloom.set_strength(strength);
            }
            let mut radius = bloom.radius;
            if ui
                .add(egui::Slider::new(&mut radius, 0.0..=1.0).text("Radius"))
                .changed()
            {
                bloom.set_radius(radius);
            }
            let mut threshold = bloom.threshold;
            if ui
                .add(egui::Slider::new(&mut threshold, 0.0..=1.0).text("Threshold"))
                .changed()
            {
                bloom.set_threshold(threshold);
            }

            ui.separator();
            ui.small("F1: Toggle Panel | Hover: Glow | Drag: Push");
        });
}

/// Pointer events that reach the driver even when egui consumes the window
/// event, so a drag released over the panel still ends.
fn release_event(event: &WindowEvent) -> Option<PointerEvent> {
    match event {
        WindowEvent::MouseInput {
            button: MouseButton::Left,
            state: ElementState::Released,
            ..
        } => Some(PointerEvent::Up),
        WindowEvent::CursorLeft { .. } => Some(PointerEvent::Leave),
        _ => None,
    }
}

fn touch_phase(phase: winit::event::TouchPhase) -> TouchPhase {
    match phase {
        winit::event::TouchPhase::Started => TouchPhase::Started,
        winit::event::TouchPhase::Moved => TouchPhase::Moved,
        winit::event::TouchPhase::Ended => TouchPhase::Ended,
        winit::event::TouchPhase::Cancelled => TouchPhase::Cancelled,
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!("initialization failed: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(release) = release_event(&event) {
            self.pointer(release);
        }
        if let (Some(window), Some(overlay)) = (&self.window, &mut self.overlay) {
            let response = overlay.winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(driver) = &mut self.driver {
                    driver.teardown();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(driver) = &mut self.driver {
                    if let Err(e) = driver.handle_resize(new_size.width, new_size.height) {
                        tracing::error!("resize failed: {e}");
                    }
                    driver.renderer_mut().present();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
                let (x, y) = self.cursor;
                self.pointer(PointerEvent::Move { x, y });
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => {
                let (x, y) = self.cursor;
                self.pointer(PointerEvent::Down { x, y });
            }
            WindowEvent::Touch(touch) => {
                let now = self.started.elapsed();
                if let Some(driver) = &mut self.driver {
                    driver.handle_touch(
                        touch.id,
                        touch_phase(touch.phase),
                        touch.location.x as f32,
                        touch.location.y as f32,
                        now,
                    );
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::F1),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.show_panel = !self.show_panel;
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                self.request_frame();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.request_frame();
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(driver) = &mut self.driver {
            driver.teardown();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = cli.pit_config()?;
    tracing::info!(
        grid = ?config.grid,
        environment = %config.assets.environment_map.display(),
        "ballpit-desktop starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
