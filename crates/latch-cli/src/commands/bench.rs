use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use latch_core::bench::{run_pipeline_reported, BenchmarkConfig, BenchmarkReport, LaunchCheck};
use latch_core::compute::DevicePreference;
use tracing::debug;

use crate::progress::SpinnerReporter;
use crate::summary::print_benchmark_summary;

#[derive(Clone, Copy, ValueEnum)]
pub enum DeviceArg {
    Auto,
    Cpu,
    Gpu,
}

impl From<DeviceArg> for DevicePreference {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Auto => Self::Auto,
            DeviceArg::Cpu => Self::Cpu,
            DeviceArg::Gpu => Self::Gpu,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LaunchCheckArg {
    Aggregate,
    PerLaunch,
}

impl From<LaunchCheckArg> for LaunchCheck {
    fn from(arg: LaunchCheckArg) -> Self {
        match arg {
            LaunchCheckArg::Aggregate => Self::Aggregate,
            LaunchCheckArg::PerLaunch => Self::PerLaunch,
        }
    }
}

#[derive(Args)]
pub struct BenchArgs {
    /// Input image (defaults to test.jpg)
    pub image: Option<PathBuf>,

    /// Benchmark config file (TOML); flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Compute device
    #[arg(long, value_enum)]
    pub device: Option<DeviceArg>,

    /// Untimed warm-up invocations
    #[arg(long)]
    pub warmups: Option<usize>,

    /// Timed invocations
    #[arg(long)]
    pub runs: Option<usize>,

    /// Keypoint budget handed to the detector
    #[arg(long)]
    pub keypoints: Option<usize>,

    /// Border margin in pixels
    #[arg(long)]
    pub margin: Option<f32>,

    /// When to query accelerator errors
    #[arg(long, value_enum)]
    pub launch_check: Option<LaunchCheckArg>,

    /// Write retrieved descriptors to this file
    #[arg(long)]
    pub dump: Option<PathBuf>,

    /// Only print the result lines
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: &BenchArgs) -> Result<()> {
    let config = build_config(args)?;
    debug!(?config, "Resolved benchmark config");

    let reporter = Arc::new(SpinnerReporter::new(args.quiet)?);
    let report = run_pipeline_reported(&config, reporter.clone())
        .with_context(|| format!("Benchmark failed for {}", config.input.display()))?;
    reporter.clear();

    if !args.quiet {
        print_benchmark_summary(&config, &report)?;
    }
    print_result_lines(&report, config.border_margin);
    Ok(())
}

fn build_config(args: &BenchArgs) -> Result<BenchmarkConfig> {
    let mut config: BenchmarkConfig = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid benchmark config")?
    } else {
        BenchmarkConfig::default()
    };

    if let Some(ref image) = args.image {
        config.input = image.clone();
    }
    if let Some(device) = args.device {
        config.device = device.into();
    }
    if let Some(warmups) = args.warmups {
        config.warmups = warmups;
    }
    if let Some(runs) = args.runs {
        config.runs = runs;
    }
    if let Some(budget) = args.keypoints {
        config.detector.n_features = budget;
    }
    if let Some(margin) = args.margin {
        config.border_margin = margin;
    }
    if let Some(check) = args.launch_check {
        config.launch_check = check.into();
    }
    if args.dump.is_some() {
        config.descriptor_dump = args.dump.clone();
    }
    Ok(config)
}

fn print_result_lines(report: &BenchmarkReport, margin: f32) {
    let outcome = &report.outcome;
    let count = outcome.descriptor_count();
    match outcome.timing.per_descriptor_us() {
        Some(us) => {
            let unit = if count == 1 { "desc" } else { "descs" };
            println!("LATCH took {us:.4} us per desc over {count} {unit}.");
        }
        None if count == 0 => {
            println!("LATCH skipped: no keypoints left after the {margin} px border filter.");
        }
        None => println!("LATCH not timed: zero measured runs over {count} descs."),
    }
    match outcome.device_error {
        Some(ref e) => println!("Accelerator reports: {e}"),
        None => println!("Accelerator reports: no error"),
    }
    println!("Checksum: {:x}", outcome.checksum);
}
