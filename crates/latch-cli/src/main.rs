mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "latch", about = "LATCH descriptor benchmark")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect keypoints and time descriptor computation
    Bench(commands::bench::BenchArgs),
    /// Print or save the default benchmark config
    Config(commands::config::ConfigArgs),
    /// Report detected keypoints per pyramid level
    Detect(commands::detect::DetectArgs),
    /// Compare two descriptor dumps
    Compare(commands::compare::CompareArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Bench(args) => commands::bench::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Detect(args) => commands::detect::run(args),
        Commands::Compare(args) => commands::compare::run(args),
    }
}

#[cfg(test)]
mod tests {
    use latch_core::consts::{
        DEFAULT_BORDER_MARGIN, DEFAULT_KEYPOINT_BUDGET, DEFAULT_ORB_FAST_THRESHOLD,
    };

    use super::*;

    #[test]
    fn test_detect_defaults_follow_consts() {
        let cli = Cli::try_parse_from(["latch", "detect", "frame.png"]).unwrap();
        let Commands::Detect(args) = cli.command else {
            panic!("expected the detect command");
        };
        assert_eq!(args.keypoints, DEFAULT_KEYPOINT_BUDGET);
        assert_eq!(args.threshold, DEFAULT_ORB_FAST_THRESHOLD);
        assert_eq!(args.margin, DEFAULT_BORDER_MARGIN);
    }

    #[test]
    fn test_detect_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "latch",
            "detect",
            "frame.png",
            "--keypoints",
            "300",
            "--threshold",
            "35",
        ])
        .unwrap();
        let Commands::Detect(args) = cli.command else {
            panic!("expected the detect command");
        };
        assert_eq!(args.keypoints, 300);
        assert_eq!(args.threshold, 35);
    }
}
