//! RocketRAM - live system metrics for your terminal
//!
//! Samples CPU, memory, disk, network, GPU and battery on a fixed cadence,
//! graphs recent history, and raises debounced alerts when a resource stays
//! over its threshold.

mod config;
mod core;
mod integrations;
mod monitor;
mod notify;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, ConfigWatcher};
use crate::core::app::App;
use crate::integrations::system::SysinfoSource;
use crate::monitor::format::{format_bytes, format_percent, format_speed, format_uptime, PLACEHOLDER};
use crate::monitor::health::{HealthGrade, HealthReport};
use crate::monitor::sampler::Sampler;
use crate::monitor::{DisplayMetrics, MetricsMonitor};
use crate::notify::DesktopNotifier;

#[derive(Parser)]
#[command(name = "rocketram")]
#[command(author = "RocketRAM Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Live system metrics with threshold alerts", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample once and print the current metrics
    Snapshot {
        /// Print JSON instead of a table
        #[arg(short, long)]
        json: bool,
    },

    /// Print a health score with recommendations
    Health,

    /// Write the default configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

fn setup_logging(verbosity: u8) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // stdout belongs to the dashboard, so logs go to a file
    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rocketram")
        .join("logs");

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "rocketram.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

#[derive(Serialize)]
struct Snapshot {
    metrics: DisplayMetrics,
    health: HealthReport,
}

/// Two primary ticks one interval apart so load and rates have a baseline.
async fn take_snapshot(config: &Config) -> Snapshot {
    let interval = config.sampling.primary_interval();
    let source = SysinfoSource::new(config.network.interface.clone());
    let sampler = Sampler::new(Arc::new(source), config.sampling.timeouts.clone());
    let mut monitor = MetricsMonitor::new(interval, interval);

    let (primary, disk) = tokio::join!(sampler.primary_tick(), sampler.disk_tick());
    monitor.apply_primary(primary);
    monitor.apply_disk(disk);

    tokio::time::sleep(interval).await;

    let (primary, disk) = tokio::join!(sampler.primary_tick(), sampler.disk_tick());
    monitor.apply_primary(primary);
    monitor.apply_disk(disk);

    Snapshot {
        metrics: monitor.display().clone(),
        health: monitor.health(),
    }
}

fn print_metrics(metrics: &DisplayMetrics) {
    let cpu = &metrics.cpu;
    let mut cpu_facts = Vec::new();
    if let Some(cores) = cpu.cores {
        cpu_facts.push(format!("{} cores", cores));
    }
    if let Some(ghz) = cpu.speed_ghz {
        cpu_facts.push(format!("{:.2} GHz", ghz));
    }
    if let Some(temp) = cpu.temperature_c {
        cpu_facts.push(format!("{:.0}°C", temp));
    }
    println!(
        "{:<10} {:>4}  {} {}",
        "CPU",
        format_percent(cpu.percent),
        cpu.brand.as_deref().unwrap_or(PLACEHOLDER),
        if cpu_facts.is_empty() {
            String::new()
        } else {
            format!("({})", cpu_facts.join(", "))
        }
    );

    let memory = match &metrics.memory.info {
        Some(info) => format!("{} / {}", format_bytes(info.used), format_bytes(info.total)),
        None => PLACEHOLDER.to_string(),
    };
    println!("{:<10} {:>4}  {}", "Memory", format_percent(metrics.memory.percent), memory);

    let disk = &metrics.disk;
    let usage = match (disk.used, disk.total) {
        (Some(used), Some(total)) => format!("{} / {}", format_bytes(used), format_bytes(total)),
        _ => PLACEHOLDER.to_string(),
    };
    println!(
        "{:<10} {:>4}  {} {}  read {}  write {}",
        "Disk",
        format_percent(disk.percent),
        disk.mount.as_deref().unwrap_or(PLACEHOLDER),
        usage,
        format_speed(disk.io.inbound),
        format_speed(disk.io.outbound)
    );

    match &metrics.network.interface {
        Some(name) => println!(
            "{:<10} {}  down {}  up {}",
            "Network",
            name,
            format_speed(metrics.network.rate.inbound),
            format_speed(metrics.network.rate.outbound)
        ),
        None => println!("{:<10} {}", "Network", PLACEHOLDER),
    }

    if metrics.gpus.is_empty() {
        println!("{:<10} none detected", "GPU");
    }
    for gpu in &metrics.gpus {
        match gpu.vram_mb {
            Some(vram) => println!("{:<10} {} ({} MB)", "GPU", gpu.model, vram),
            None => println!("{:<10} {}", "GPU", gpu.model),
        }
    }

    match &metrics.battery {
        Some(battery) => println!(
            "{:<10} {:.0}% {}",
            "Battery",
            battery.percent,
            if battery.charging { "charging" } else { "discharging" }
        ),
        None => println!("{:<10} none", "Battery"),
    }

    println!(
        "{:<10} {}",
        "Uptime",
        metrics
            .uptime_secs
            .map(format_uptime)
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    );
    println!(
        "{:<10} {}",
        "Processes",
        metrics
            .process_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    );
}

fn print_health(report: &HealthReport) {
    let grade = match report.grade {
        HealthGrade::Good => "good",
        HealthGrade::Fair => "fair",
        HealthGrade::Poor => "poor",
    };
    println!("Health score: {}/100 ({})", report.score, grade);
    for recommendation in &report.recommendations {
        println!("  • {}", recommendation.text);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive for the duration of the program
    let _logging_guard = setup_logging(cli.verbose)?;

    let config_path = cli.config.or_else(Config::default_path);

    match cli.command {
        Some(Commands::Init { force }) => {
            let path = config_path
                .ok_or_else(|| anyhow::anyhow!("no configuration directory, pass --config"))?;
            config::init_config(&path, force)?;
        }
        Some(Commands::Snapshot { json }) => {
            let config = load_config(config_path.as_deref())?;
            let snapshot = take_snapshot(&config).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_metrics(&snapshot.metrics);
            }
        }
        Some(Commands::Health) => {
            let config = load_config(config_path.as_deref())?;
            let snapshot = take_snapshot(&config).await;
            print_health(&snapshot.health);
        }
        None => {
            let config = load_config(config_path.as_deref())?;
            tracing::info!(theme = %config.display.theme, "starting dashboard");

            let source = SysinfoSource::new(config.network.interface.clone());
            let sampler = Sampler::new(Arc::new(source), config.sampling.timeouts.clone());
            let notifier = Arc::new(DesktopNotifier::new("RocketRAM"));
            let watcher = ConfigWatcher::new(config_path, config);

            let mut app = App::new(watcher, sampler, notifier)?;
            app.run().await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_or_default(path),
        None => Ok(Config::default()),
    }
}
