//! RPS Ecosystem - CLI Entry Point
//!
//! Cyclic-dominance ecosystem simulator.

use clap::{Parser, Subcommand};
use rps_ecosystem::shared::{DriverEvent, Observer, SimulationHandle, StopReason};
use rps_ecosystem::stats::{Census, StatsHistory};
use rps_ecosystem::sweep::{sweep, SweepSummary};
use rps_ecosystem::{benchmark, Config};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "rps-ecosystem")]
#[command(version)]
#[command(about = "Spatial rock-paper-scissors ecosystem simulator with N breeds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the configuration file
#[derive(clap::Args)]
struct ArenaArgs {
    /// Configuration file (YAML)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Number of breeds
    #[arg(short, long)]
    breeds: Option<u8>,

    /// Side length of the arena
    #[arg(long)]
    size: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation until absorption
    Run {
        #[command(flatten)]
        arena: ArenaArgs,

        /// Stop after this many generations
        #[arg(long)]
        max_generations: Option<u64>,

        /// Stop after this many seconds of wall-clock time
        #[arg(long)]
        duration: Option<u64>,

        /// Draw the terrain in the terminal every frame
        #[arg(long)]
        render: bool,

        /// Write census history (JSON) to this file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run many seeded arenas in parallel and report absorption times
    Sweep {
        #[command(flatten)]
        arena: ArenaArgs,

        /// Number of trials
        #[arg(short, long, default_value = "8")]
        trials: usize,

        /// Generation cap per trial
        #[arg(long, default_value = "100000000")]
        max_generations: u64,

        /// Write per-trial results (JSON) to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of steps
        #[arg(short, long, default_value = "1000000")]
        steps: u64,

        /// Side length of the arena
        #[arg(long, default_value = "100")]
        size: usize,

        /// Number of breeds
        #[arg(short, long, default_value = "5")]
        breeds: u8,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            arena,
            max_generations,
            duration,
            render,
            history,
            quiet,
        } => {
            let config = load_config(&arena)?;
            init_logging(&config);
            run_simulation(config, max_generations, duration, render, history, quiet)
        }

        Commands::Sweep {
            arena,
            trials,
            max_generations,
            output,
        } => {
            let config = load_config(&arena)?;
            init_logging(&config);
            run_sweep(config, trials, max_generations, output)
        }

        Commands::Benchmark {
            steps,
            size,
            breeds,
        } => {
            init_logging(&Config::default());
            run_benchmark(steps, size, breeds)
        }

        Commands::Init { output } => generate_config(&output),
    }
}

fn init_logging(config: &Config) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.log_level.as_str()),
    )
    .init();
}

/// Load the config file if present, then apply command-line overrides
fn load_config(args: &ArenaArgs) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.config.exists() {
        println!("Loading config from: {:?}", args.config);
        Config::from_file(&args.config)?
    } else {
        Config::default()
    };

    if let Some(breeds) = args.breeds {
        config.arena.num_breeds = breeds;
    }
    if let Some(size) = args.size {
        config.arena.arena_size = size;
    }
    if args.seed.is_some() {
        config.arena.seed = args.seed;
    }

    config.validate()?;
    Ok(config)
}

fn run_simulation(
    config: Config,
    max_generations: Option<u64>,
    duration: Option<u64>,
    render: bool,
    history_path: Option<PathBuf>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut handle = SimulationHandle::from_config(&config)?;
    let mut observer = Observer::new(Arc::clone(handle.arena()), config.observer.clone());
    let mut history = StatsHistory::new(config.logging.stats_interval);

    println!("Starting simulation");
    println!(
        "  Arena: {}x{}",
        config.arena.arena_size, config.arena.arena_size
    );
    println!("  Breeds: {}", config.arena.num_breeds);
    println!("  Seed: {}", handle.arena().seed());
    println!();

    let frame_interval = Duration::from_millis(config.observer.frame_interval_ms.max(1));
    let status_interval = Duration::from_secs(1);
    let time_limit = duration.map(Duration::from_secs);
    let start = Instant::now();
    let mut last_status = Instant::now();

    handle.start()?;

    let event = loop {
        let finished = handle.try_recv_event();

        observer.refresh()?;
        let snapshot = observer.snapshot();
        if history.is_due(snapshot.generation) {
            history.record(snapshot.census());
        }

        if render {
            print!("\x1b[H\x1b[2J{}", observer.render_text());
        } else if !quiet && last_status.elapsed() >= status_interval {
            println!("{}", snapshot.census().summary());
            last_status = Instant::now();
        }

        if let Some(event) = finished {
            break Some(event);
        }

        let capped = max_generations.map_or(false, |cap| snapshot.generation >= cap);
        let timed_out = time_limit.map_or(false, |limit| start.elapsed() >= limit);
        if capped || timed_out {
            handle.stop();
            break handle.try_recv_event();
        }

        thread::sleep(frame_interval);
    };

    let elapsed = start.elapsed();
    let census = Census::take(handle.arena())?;
    history.record(census.clone());

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Generations: {}", census.generation);
    println!(
        "Speed: {:.0} steps/s",
        census.generation as f64 / elapsed.as_secs_f64()
    );
    match event {
        Some(DriverEvent::Finished {
            reason: StopReason::Absorbed,
            ..
        }) => {
            if let Some((breed, _)) = census.dominant() {
                println!("Absorbed: breed {} holds every cell", breed);
            }
        }
        Some(DriverEvent::Finished {
            reason: StopReason::Failed(e),
            ..
        }) => return Err(e.into()),
        _ => println!("Stopped before absorption ({} breeds left)", census.surviving()),
    }
    println!("{}", census.summary());

    if let Some(path) = history_path {
        history.save(&path.to_string_lossy())?;
        println!("Census history: {:?}", path);
    }

    Ok(())
}

fn run_sweep(
    config: Config,
    trials: usize,
    max_generations: u64,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let base_seed = config.arena.seed.unwrap_or_else(rand::random);
    let seeds: Vec<u64> = (0..trials as u64).map(|i| base_seed.wrapping_add(i)).collect();

    println!("=== Sweep ===");
    println!(
        "Arena: {}x{}, {} breeds",
        config.arena.arena_size, config.arena.arena_size, config.arena.num_breeds
    );
    println!("Trials: {} (seeds {}..)", trials, base_seed);
    println!("Generation cap: {}", max_generations);
    println!();

    let start = Instant::now();
    let results = sweep(&config.arena, &seeds, max_generations)?;
    log::info!("Sweep finished in {:.2}s", start.elapsed().as_secs_f64());

    for result in &results {
        match result.survivor {
            Some(breed) => println!(
                "  seed {:20}: breed {} absorbed at generation {}",
                result.seed, breed, result.generation
            ),
            None => println!(
                "  seed {:20}: not absorbed after {} generations",
                result.seed, result.generation
            ),
        }
    }
    println!();
    println!(
        "{}",
        SweepSummary::from_results(config.arena.num_breeds, &results)
    );

    if let Some(path) = output {
        std::fs::write(&path, serde_json::to_string_pretty(&results)?)?;
        println!("Results: {:?}", path);
    }

    Ok(())
}

fn run_benchmark(steps: u64, size: usize, breeds: u8) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== RPS Ecosystem Benchmark ===");
    println!("Steps: {}", steps);
    println!("Arena: {}x{}", size, size);
    println!();

    let result = benchmark(steps, size, breeds)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
