//! bv_sim
//!
//! Headless Bubblemen VS driver: bot-vs-bot simulation through the JSON API,
//! preset config export, pop threshold lookup.

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use bv_core::engine::combat::pop_threshold;
#[cfg(feature = "cli")]
use bv_core::engine::config::PRESET_NAMES;
#[cfg(feature = "cli")]
use bv_core::{load_config_file, simulate_match, MatchConfig, SimulationRequest};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "bv_sim")]
#[command(about = "Run headless Bubblemen VS matches", long_about = None)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Explicit level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum ConfigFormat {
    Yaml,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Simulate one bot-vs-bot match
    Simulate {
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Config preset (classic, quick_play, endurance, deterministic)
        #[arg(long)]
        preset: Option<String>,

        /// Config file (.json, .yaml, .yml); overrides --preset
        #[arg(long)]
        config: Option<PathBuf>,

        /// Frame delta in seconds
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,

        /// Stop after this much simulated time
        #[arg(long, default_value_t = 120.0)]
        max_seconds: f32,

        /// Include every broadcast envelope in the output
        #[arg(long)]
        events: bool,

        /// Write the response here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print a preset config
    Config {
        #[arg(long, default_value = "classic")]
        preset: String,

        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Impact impulse needed to pop a vulnerable bubbleman of this scale
    Threshold {
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
    },
}

#[cfg(feature = "cli")]
fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        log::LevelFilter::Error
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        match cli.log_level.as_deref() {
            Some("error") => log::LevelFilter::Error,
            Some("warn") => log::LevelFilter::Warn,
            Some("debug") => log::LevelFilter::Debug,
            Some("trace") => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_secs()
        .init();
}

#[cfg(feature = "cli")]
fn build_request(
    seed: u64,
    preset: Option<String>,
    config: Option<PathBuf>,
    dt: f32,
    max_seconds: f32,
    events: bool,
) -> Result<SimulationRequest> {
    let config = match config {
        Some(path) => Some(load_config_file(&path)?),
        None => None,
    };
    Ok(SimulationRequest {
        preset,
        config,
        dt,
        max_seconds,
        include_events: events,
        ..SimulationRequest::new(seed)
    })
}

#[cfg(feature = "cli")]
fn write_output(out: Option<PathBuf>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn render_preset(name: &str, format: ConfigFormat) -> Result<String> {
    let cfg = MatchConfig::preset(name).with_context(|| {
        format!("unknown preset '{}' (expected one of {})", name, PRESET_NAMES.join(", "))
    })?;
    let text = match format {
        ConfigFormat::Yaml => cfg.to_yaml_string()?,
        ConfigFormat::Json => serde_json::to_string_pretty(&cfg)?,
    };
    Ok(text)
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    match cli.command {
        Commands::Simulate { seed, preset, config, dt, max_seconds, events, out } => {
            let request = build_request(seed, preset, config, dt, max_seconds, events)?;
            let response = simulate_match(&request)?;
            log::info!(
                "seed {}: {:?} after {:.1}s ({}-{})",
                seed,
                response.winner,
                response.elapsed_seconds,
                response.scores[0],
                response.scores[1]
            );
            write_output(out, &serde_json::to_string_pretty(&response)?)?;
        }
        Commands::Config { preset, format, out } => {
            write_output(out, &render_preset(&preset, format)?)?;
        }
        Commands::Threshold { scale } => {
            println!("{:.4}", pop_threshold(scale));
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("bv_sim CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
