use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use ballpit_assets::EnvironmentMap;
use ballpit_common::{GridDims, PitConfig};
use ballpit_driver::{FALLBACK_RADIANCE, FrameDriver};
use ballpit_input::{PointerEvent, PointerPhase};
use ballpit_kernel::PhysicsWorld;
use ballpit_render::DebugTextRenderer;
use ballpit_tools::PitInspector;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ballpit-cli", about = "Headless ball pit tool")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PitArgs {
    /// YAML config file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid dimensions as WxHxD, e.g. 5x5x5
    #[arg(short, long, value_parser = parse_grid)]
    grid: Option<GridDims>,

    /// Spawn RNG seed
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Viewport width in pixels
    #[arg(long, default_value = "1280")]
    viewport_width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value = "720")]
    viewport_height: u32,

    /// Render without bloom
    #[arg(long)]
    no_bloom: bool,

    /// Bloom strength, clamped to 0..=3
    #[arg(long)]
    bloom_strength: Option<f32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, crate info and the effective config
    Info {
        #[command(flatten)]
        pit: PitArgs,
    },
    /// Run the pit for a number of 60 Hz frames and report its state
    Simulate {
        #[command(flatten)]
        pit: PitArgs,
        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
    },
    /// Hover a pixel after settling and report the picked entity
    Pick {
        #[command(flatten)]
        pit: PitArgs,
        /// Pointer x in viewport pixels
        x: f32,
        /// Pointer y in viewport pixels
        y: f32,
        /// Frames to run before picking
        #[arg(long, default_value = "0")]
        settle: u64,
        /// Press after hovering and run this many drag frames
        #[arg(long, default_value = "0")]
        drag: u64,
    },
}

const FRAME: Duration = Duration::from_nanos(16_666_667);

fn parse_grid(s: &str) -> Result<GridDims, String> {
    let dims: Vec<u32> = s
        .split('x')
        .map(|p| p.trim().parse::<u32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<_, _>>()?;
    match dims[..] {
        [w, h, d] => Ok(GridDims::new(w, h, d)),
        _ => Err(format!("expected WxHxD, got {s:?}")),
    }
}

impl PitArgs {
    fn config(&self) -> anyhow::Result<PitConfig> {
        let mut config = match &self.config {
            Some(path) => PitConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => PitConfig::default(),
        };
        if let Some(grid) = self.grid {
            config.grid = grid;
        }
        config.seed = Some(self.seed);
        config.bloom.enabled &= !self.no_bloom;
        if let Some(strength) = self.bloom_strength {
            config.bloom.set_strength(strength);
        }
        config.validate()?;
        Ok(config)
    }

    /// A ready driver lit with the flat fallback environment.
    fn driver(&self) -> anyhow::Result<FrameDriver<DebugTextRenderer>> {
        let config = self.config()?;
        tracing::info!(
            grid = ?config.grid,
            seed = self.seed,
            bloom = config.bloom.enabled,
            "starting headless pit"
        );
        let mut driver = FrameDriver::new(
            config,
            DebugTextRenderer::new(),
            self.viewport_width,
            self.viewport_height,
        )?;
        driver.start_with_environment(EnvironmentMap::flat(FALLBACK_RADIANCE));
        driver.frame(Duration::ZERO)?;
        Ok(driver)
    }
}

fn run_frames(
    driver: &mut FrameDriver<DebugTextRenderer>,
    now: &mut Duration,
    frames: u64,
) -> anyhow::Result<()> {
    for _ in 0..frames {
        *now += FRAME;
        driver.frame(*now)?;
    }
    tracing::info!(frames, elapsed = ?*now, "frames complete");
    Ok(())
}

fn print_summary(driver: &FrameDriver<DebugTextRenderer>) {
    if let Some(scene) = driver.scene() {
        println!("{}", PitInspector::summary(&scene.world, &scene.registry));
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info { pit } => {
            println!("ballpit-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: tick={}", PhysicsWorld::default().tick());
            println!("ecs: {}", ballpit_ecs::crate_info());
            println!("assets: {}", ballpit_assets::crate_info());
            println!("render: {}", ballpit_render::crate_info());
            println!("tools: {}", ballpit_tools::crate_info());
            println!("---");
            print!("{}", pit.config()?.to_yaml()?);
        }
        Commands::Simulate { pit, frames } => {
            let mut driver = pit.driver()?;
            let mut now = Duration::ZERO;
            run_frames(&mut driver, &mut now, frames)?;
            print_summary(&driver);
            println!("{}", driver.renderer().last_output());
            driver.teardown();
        }
        Commands::Pick {
            pit,
            x,
            y,
            settle,
            drag,
        } => {
            let mut driver = pit.driver()?;
            let mut now = Duration::ZERO;
            run_frames(&mut driver, &mut now, settle)?;

            let phase = driver.handle_pointer(PointerEvent::Move { x, y }, now);
            match phase {
                PointerPhase::Hovering(index) => {
                    println!("Hovering entity {index}");
                    if let Some(scene) = driver.scene() {
                        if let Some(info) =
                            PitInspector::inspect_entity(&scene.world, &scene.registry, index)
                        {
                            println!("{info}");
                        }
                    }
                }
                _ => println!("Nothing under ({x}, {y})"),
            }

            if drag > 0 && driver.handle_pointer(PointerEvent::Down { x, y }, now)
                == PointerPhase::Dragging
            {
                run_frames(&mut driver, &mut now, drag)?;
                driver.handle_pointer(PointerEvent::Up, now);
                println!("After {drag} drag frames:");
                print_summary(&driver);
            }
            driver.teardown();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_parses_and_rejects_malformed() {
        assert_eq!(parse_grid("2x3x4").unwrap(), GridDims::new(2, 3, 4));
        assert!(parse_grid("2x3").is_err());
        assert!(parse_grid("axbxc").is_err());
    }

    #[test]
    fn simulate_builds_a_ready_driver_and_advances() {
        let cli = Cli::try_parse_from(["ballpit-cli", "simulate", "--grid", "2x2x2", "-f", "3"])
            .unwrap();
        let Commands::Simulate { pit, frames } = cli.command else {
            panic!("expected simulate");
        };
        let mut driver = pit.driver().unwrap();
        assert!(driver.is_scheduled());
        let mut now = Duration::ZERO;
        run_frames(&mut driver, &mut now, frames).unwrap();
        assert_eq!(now, FRAME * 3);
        assert_eq!(driver.scene().unwrap().registry.len(), 8);
        assert!(driver.teardown());
    }
}
