use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use netmap::config::SimConfig;
use netmap::driver::FrameLoop;
use netmap::io::{JsonLinesRenderer, PointerState, Renderer, StaticInput};
use netmap::simulation::Simulation;
use netmap::stats::StatsRenderer;

/// A headless force-directed particle network simulation.
#[derive(Parser)]
#[command(name = "netmap")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (.yaml, .yml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for scene generation
    #[arg(short, long, global = true, default_value = "1")]
    seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed a scene and run it for a number of frames
    Run {
        /// Number of frames to simulate
        #[arg(short, long, default_value = "600")]
        frames: u64,

        /// Step size in frames
        #[arg(long, default_value = "1.0")]
        dt: f32,

        /// Viewport width, overriding the configuration
        #[arg(long)]
        width: Option<f32>,

        /// Viewport height, overriding the configuration
        #[arg(long)]
        height: Option<f32>,

        /// Hold an active pointer at X,Y for the whole run
        #[arg(short, long, value_parser = parse_pointer)]
        pointer: Option<(f32, f32)>,

        /// Write JSON-lines frame snapshots to this file
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Snapshot and log every Nth frame
        #[arg(short, long, default_value = "60")]
        every: u64,
    },
    /// Seed a scene and write its initial frame as JSON
    Seed {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the effective configuration as YAML
    Config,
}

fn parse_pointer(value: &str) -> Result<(f32, f32), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{value}'"))?;
    let x = x.trim().parse::<f32>().map_err(|e| format!("bad x: {e}"))?;
    let y = y.trim().parse::<f32>().map_err(|e| format!("bad y: {e}"))?;
    if !x.is_finite() || !y.is_finite() {
        return Err("pointer coordinates must be finite".to_string());
    }
    Ok((x, y))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SimConfig> {
    match path {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(SimConfig::default()),
    }
}

fn seed_simulation(config: SimConfig, seed: u64) -> anyhow::Result<Simulation> {
    let mut rng = StdRng::seed_from_u64(seed);
    Simulation::seeded(config, &mut rng).with_context(|| format!("failed to seed scene {seed}"))
}

#[allow(clippy::too_many_arguments)]
fn run(
    mut config: SimConfig,
    seed: u64,
    frames: u64,
    dt: f32,
    width: Option<f32>,
    height: Option<f32>,
    pointer: Option<(f32, f32)>,
    snapshot: Option<&Path>,
    every: u64,
) -> anyhow::Result<()> {
    if let Some(width) = width {
        config.viewport.width = width;
    }
    if let Some(height) = height {
        config.viewport.height = height;
    }
    config.validate().context("invalid viewport override")?;

    let mut sim = seed_simulation(config, seed)?;
    let mut input = StaticInput {
        pointer: pointer
            .map(|(x, y)| PointerState::at(x, y))
            .unwrap_or_default(),
    };

    let mut renderers: Vec<Box<dyn Renderer>> =
        vec![Box::new(StatsRenderer::new(sim.config().zone, every))];
    if let Some(path) = snapshot {
        let file = File::create(path)
            .with_context(|| format!("failed to create snapshot file {}", path.display()))?;
        renderers.push(Box::new(JsonLinesRenderer::new(BufWriter::new(file), every)));
    }

    FrameLoop::new(frames, dt)
        .run(&mut sim, &mut input, &mut renderers)
        .context("rendering failed")?;

    let stats = sim.stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn seed_scene(config: SimConfig, seed: u64, output: Option<&Path>) -> anyhow::Result<()> {
    let sim = seed_simulation(config, seed)?;
    let json = serde_json::to_string_pretty(&sim.view())?;

    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            writeln!(file, "{json}")?;
            println!(
                "Seeded {} nodes and {} edges into {}",
                sim.nodes().len(),
                sim.edges().len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Run {
            frames,
            dt,
            width,
            height,
            pointer,
            snapshot,
            every,
        }) => {
            run(
                config,
                cli.seed,
                frames,
                dt,
                width,
                height,
                pointer,
                snapshot.as_deref(),
                every,
            )?;
        }
        Some(Commands::Seed { output }) => {
            seed_scene(config, cli.seed, output.as_deref())?;
        }
        Some(Commands::Config) => {
            print!("{}", config.to_yaml()?);
        }
        None => {
            println!("netmap: no command specified. Use --help for usage.");
        }
    }

    Ok(())
}
