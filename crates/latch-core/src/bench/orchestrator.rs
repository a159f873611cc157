use std::path::PathBuf;
use std::sync::Arc;

use image::GrayImage;
use tracing::info;

use crate::compute::{create_accelerator, Accelerator};
use crate::detect::{Detector, OrbDetector};
use crate::error::Result;
use crate::io::{load_grayscale, write_descriptors};
use crate::keypoint::{filter_border, marshal};
use crate::table::ConstantTable;

use super::config::BenchmarkConfig;
use super::driver::run_benchmark;
use super::types::{BenchmarkOutcome, NoOpReporter, PipelineStage, ProgressReporter};

/// What a full run measured, plus the context needed to print it.
#[derive(Clone, Debug)]
pub struct BenchmarkReport {
    pub device: String,
    pub kernel: String,
    pub table_version: String,
    pub width: u32,
    pub height: u32,
    /// Keypoints returned by the detector.
    pub detected: usize,
    /// Keypoints left after the border filter; one descriptor each.
    pub survivors: usize,
    pub outcome: BenchmarkOutcome,
    pub dump: Option<PathBuf>,
}

/// Run the whole benchmark on the accelerator selected by `config.device`.
///
/// The image is loaded before any accelerator is created, so an unreadable
/// input fails without touching the device.
pub fn run_pipeline(config: &BenchmarkConfig) -> Result<BenchmarkReport> {
    run_pipeline_reported(config, Arc::new(NoOpReporter))
}

pub fn run_pipeline_reported(
    config: &BenchmarkConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<BenchmarkReport> {
    config.validate()?;
    let image = load_stage(config, reporter.as_ref())?;
    let accelerator = create_accelerator(&config.device)?;
    run_on(config, &image, accelerator, reporter)
}

/// Run the benchmark on an explicit accelerator.
pub fn run_pipeline_with(
    config: &BenchmarkConfig,
    accelerator: Arc<dyn Accelerator>,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<BenchmarkReport> {
    config.validate()?;
    let image = load_stage(config, reporter.as_ref())?;
    run_on(config, &image, accelerator, reporter)
}

/// Benchmark an already decoded image.
pub fn run_on_image(
    config: &BenchmarkConfig,
    image: &GrayImage,
    accelerator: Arc<dyn Accelerator>,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<BenchmarkReport> {
    config.validate()?;
    run_on(config, image, accelerator, reporter)
}

fn load_stage(config: &BenchmarkConfig, reporter: &dyn ProgressReporter) -> Result<GrayImage> {
    reporter.begin_stage(PipelineStage::Loading, None);
    let image = load_grayscale(&config.input)?;
    reporter.finish_stage();
    Ok(image)
}

fn run_on(
    config: &BenchmarkConfig,
    image: &GrayImage,
    accelerator: Arc<dyn Accelerator>,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<BenchmarkReport> {
    let (width, height) = image.dimensions();
    info!(
        width,
        height,
        device = accelerator.name(),
        "Starting LATCH benchmark"
    );

    reporter.begin_stage(PipelineStage::Detecting, None);
    let detector = OrbDetector::new(config.detector.clone())?;
    let detected = detector.detect(image)?;
    let detected_count = detected.len();
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Filtering, Some(detected_count));
    let survivors = filter_border(detected, width, height, config.border_margin);
    let keypoints = marshal(&survivors);
    reporter.finish_stage();
    info!(
        detected = detected_count,
        survivors = keypoints.len(),
        "Keypoints ready"
    );

    let table = ConstantTable::latch();
    let kernel = accelerator.descriptor_kernel()?;
    let outcome = run_benchmark(
        accelerator.as_ref(),
        kernel.as_ref(),
        &table,
        image,
        &keypoints,
        &config.plan(),
        reporter.as_ref(),
    )?;

    if let Some(ref path) = config.descriptor_dump {
        reporter.begin_stage(PipelineStage::Writing, Some(outcome.descriptors.len()));
        write_descriptors(path, &outcome.descriptors)?;
        reporter.finish_stage();
        info!(path = %path.display(), count = outcome.descriptors.len(), "Descriptors written");
    }

    Ok(BenchmarkReport {
        device: accelerator.name().to_string(),
        kernel: kernel.name().to_string(),
        table_version: table.version().to_string(),
        width,
        height,
        detected: detected_count,
        survivors: keypoints.len(),
        outcome,
        dump: config.descriptor_dump.clone(),
    })
}
