//! Mind CLI - simulated device harness for the Hydra Mind core
//!
//! Commands:
//! - watch: run the runtime against synthetic probes and print transitions
//! - config: print the default engine tuning as JSON

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use hydra_mind::runtime::SensorProbe;
use hydra_mind::{
    BehaviorEngine, EngineConfig, Runtime, RuntimeConfig, SensorUpdate, StateTransition,
    MIND_VERSION,
};

/// Mind - behavioral inference core simulator
#[derive(Parser)]
#[command(name = "mind")]
#[command(author = "Hydra Labs")]
#[command(version = MIND_VERSION)]
#[command(about = "Run the Hydra behavioral core against synthetic sensors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the runtime with simulated probes and print transitions
    Watch {
        /// How long to run before shutting down (seconds)
        #[arg(long, default_value = "30")]
        duration_secs: u64,

        /// Inference cycle period (ms)
        #[arg(long, default_value = "200")]
        period_ms: u32,

        /// Transition queue depth
        #[arg(long, default_value = "10")]
        capacity: usize,

        /// Engine tuning JSON file (defaults to the shipped tuning)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "auto")]
        format: OutputFormat,

        /// Seed for the synthetic wireless environment
        #[arg(long, default_value = "7")]
        seed: u64,
    },

    /// Print the default engine tuning as JSON
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable lines when stdout is a terminal, NDJSON otherwise
    Auto,
    /// One JSON object per transition
    Ndjson,
    /// Human-readable lines with state glyphs
    Text,
}

/// Synthetic wireless scanner: a seeded random walk through quiet and busy
/// stretches, so every state short of `Error` is reachable in one run.
struct SimulatedScanner {
    rng: u64,
    tick: u32,
}

impl SimulatedScanner {
    fn new(seed: u64) -> Self {
        Self {
            rng: seed.wrapping_mul(2).wrapping_add(1),
            tick: 0,
        }
    }

    fn next_u32(&mut self, bound: u32) -> u32 {
        self.rng = self
            .rng
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.rng >> 33) as u32) % bound
    }
}

impl SensorProbe for SimulatedScanner {
    fn name(&self) -> &str {
        "sim-scan"
    }

    fn period(&self) -> Duration {
        Duration::from_millis(500)
    }

    fn poll(&mut self) -> SensorUpdate {
        self.tick += 1;
        // Alternate busy and quiet phases every eight scans
        let busy = (self.tick / 8) % 2 == 0;
        let (wifi, ble) = if busy {
            (8 + self.next_u32(10), self.next_u32(10))
        } else {
            (self.next_u32(3), self.next_u32(2))
        };
        let wifi_rssi = -(40 + self.next_u32(50) as i32);
        let ble_rssi = -(30 + self.next_u32(60) as i32);
        SensorUpdate::wireless_scan(wifi, wifi_rssi, ble, ble_rssi)
    }
}

/// Synthetic resource monitor: healthy memory, real elapsed uptime.
struct SimulatedMonitor {
    started: Instant,
}

impl SensorProbe for SimulatedMonitor {
    fn name(&self) -> &str {
        "sim-system"
    }

    fn period(&self) -> Duration {
        Duration::from_millis(1_000)
    }

    fn poll(&mut self) -> SensorUpdate {
        let uptime = self.started.elapsed().as_secs() as u32;
        SensorUpdate::system_monitor(180_000, uptime, true)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Watch {
            duration_secs,
            period_ms,
            capacity,
            config,
            format,
            seed,
        } => watch(duration_secs, period_ms, capacity, config, format, seed),
        Commands::Config => {
            match EngineConfig::default().to_json() {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn watch(
    duration_secs: u64,
    period_ms: u32,
    capacity: usize,
    config_path: Option<PathBuf>,
    format: OutputFormat,
    seed: u64,
) -> ExitCode {
    let engine_config = match config_path {
        Some(path) => {
            let json = match fs::read_to_string(&path) {
                Ok(json) => json,
                Err(e) => {
                    eprintln!("error: cannot read {}: {e}", path.display());
                    return ExitCode::FAILURE;
                }
            };
            match EngineConfig::from_json(&json) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }
        None => EngineConfig::default(),
    };

    let runtime_config = RuntimeConfig {
        engine_period_ms: period_ms,
        channel_capacity: capacity,
        ..RuntimeConfig::default()
    };

    let as_text = match format {
        OutputFormat::Text => true,
        OutputFormat::Ndjson => false,
        OutputFormat::Auto => atty::is(atty::Stream::Stdout),
    };

    let probes: Vec<Box<dyn SensorProbe>> = vec![
        Box::new(SimulatedScanner::new(seed)),
        Box::new(SimulatedMonitor {
            started: Instant::now(),
        }),
    ];

    let runtime = match Runtime::spawn(
        BehaviorEngine::with_config(engine_config),
        runtime_config,
        probes,
    ) {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let deadline = Instant::now() + Duration::from_secs(duration_secs);
    while Instant::now() < deadline {
        while let Some(event) = runtime.try_receive() {
            print_transition(&event, as_text);
        }
        thread::sleep(Duration::from_millis(50));
    }
    runtime.shutdown();

    ExitCode::SUCCESS
}

fn print_transition(event: &StateTransition, as_text: bool) {
    if as_text {
        println!(
            "{} {} -> {} {}  (held {} for {} ms)",
            event.previous.glyph(),
            event.previous.label(),
            event.next.glyph(),
            event.next.label(),
            event.previous.label(),
            event.time_in_previous_ms,
        );
    } else {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("error: cannot encode transition: {e}"),
        }
    }
}
