use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use latch_core::consts::{
    DEFAULT_BORDER_MARGIN, DEFAULT_KEYPOINT_BUDGET, DEFAULT_ORB_FAST_THRESHOLD,
};
use latch_core::detect::{octave_counts, Detector, OrbDetector, OrbParams, ScoreType};
use latch_core::io::load_grayscale;
use latch_core::keypoint::filter_border;

#[derive(Clone, Copy, ValueEnum)]
pub enum ScoreArg {
    Harris,
    Fast,
}

#[derive(Args)]
pub struct DetectArgs {
    /// Input image
    pub image: PathBuf,

    /// Keypoint budget
    #[arg(long, default_value_t = DEFAULT_KEYPOINT_BUDGET)]
    pub keypoints: usize,

    /// FAST intensity threshold
    #[arg(long, default_value_t = DEFAULT_ORB_FAST_THRESHOLD)]
    pub threshold: u8,

    /// Corner ranking
    #[arg(long, value_enum, default_value = "harris")]
    pub score: ScoreArg,

    /// Border margin applied before descriptor computation
    #[arg(long, default_value_t = DEFAULT_BORDER_MARGIN)]
    pub margin: f32,
}

pub fn run(args: &DetectArgs) -> Result<()> {
    let image = load_grayscale(&args.image)
        .with_context(|| format!("Failed to load {}", args.image.display()))?;
    let (width, height) = image.dimensions();

    let params = OrbParams {
        n_features: args.keypoints,
        fast_threshold: args.threshold,
        score_type: match args.score {
            ScoreArg::Harris => ScoreType::Harris,
            ScoreArg::Fast => ScoreType::Fast,
        },
        ..Default::default()
    };
    let detector = OrbDetector::new(params)?;
    let detected = detector.detect(&image)?;
    let per_level = octave_counts(&detected);
    let survivors = filter_border(detected, width, height, args.margin);
    let kept_per_level = octave_counts(&survivors);

    println!("Image:       {}x{}", width, height);
    println!("Detected:    {}", per_level.iter().sum::<usize>());
    println!("Kept:        {} (margin {} px)", survivors.len(), args.margin);
    println!();
    println!("{:>6} {:>9} {:>9}", "Level", "Detected", "Kept");
    for (level, &count) in per_level.iter().enumerate() {
        let kept = kept_per_level.get(level).copied().unwrap_or(0);
        println!("{:>6} {:>9} {:>9}", level, count, kept);
    }

    Ok(())
}
