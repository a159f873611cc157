use std::time::Instant;

use image::GrayImage;
use tracing::{debug, info, warn};

use crate::compute::{
    Accelerator, DescriptorBuffer, DescriptorKernel, ImageResource, KeypointBuffer, ResourceDesc,
    TableResource,
};
use crate::error::{LatchError, Result};
use crate::keypoint::KernelKeypoint;
use crate::table::ConstantTable;
use crate::verify::{checksum, Checksum};

use super::types::{
    BenchmarkOutcome, BenchmarkPlan, LaunchCheck, PipelineStage, ProgressReporter, RunPhase,
    Timing,
};

/// Provision the accelerator, invoke `kernel` `plan.warmups` times untimed
/// and `plan.runs` times timed, then read the descriptors back.
///
/// With no keypoints only the table and image are provisioned: nothing is
/// allocated for keypoints or output, the kernel is never invoked and the
/// timing is [`Timing::Skipped`]. Every resource is released before return,
/// on success and on error alike.
pub fn run_benchmark(
    accelerator: &dyn Accelerator,
    kernel: &dyn DescriptorKernel,
    table: &ConstantTable,
    image: &GrayImage,
    keypoints: &[KernelKeypoint],
    plan: &BenchmarkPlan,
    reporter: &dyn ProgressReporter,
) -> Result<BenchmarkOutcome> {
    let mut run = Run::new(reporter);
    let count = keypoints.len();

    reporter.begin_stage(PipelineStage::Provisioning, None);
    let triplets = accelerator.upload_table(table, ResourceDesc::linear_table())?;
    let texture = accelerator.upload_image(image, ResourceDesc::planar_image())?;
    let buffers = if count == 0 {
        None
    } else {
        let kps = accelerator.upload_keypoints(keypoints)?;
        let output = accelerator.alloc_descriptors(count)?;
        debug!(bytes = output.byte_len(), "Descriptor output allocated");
        Some((kps, output))
    };
    reporter.finish_stage();
    run.enter(RunPhase::Provisioned);

    let Some((kps, mut output)) = buffers else {
        info!("No keypoints survived filtering, skipping kernel invocations");
        run.enter(RunPhase::Retrieved);
        drop((texture, triplets));
        run.enter(RunPhase::Released);
        return Ok(BenchmarkOutcome {
            timing: Timing::Skipped,
            descriptors: Vec::new(),
            checksum: Checksum::default(),
            device_error: accelerator.take_last_error(),
        });
    };

    let launch = Launch {
        accelerator,
        kernel,
        image: &texture,
        triplets: &triplets,
        keypoints: &kps,
        count,
        check: plan.launch_check,
    };

    run.enter(RunPhase::WarmingUp);
    reporter.begin_stage(PipelineStage::WarmingUp, Some(plan.warmups));
    for i in 0..plan.warmups {
        launch.invoke(&mut output)?;
        reporter.advance(i + 1);
    }
    accelerator.synchronize()?;
    reporter.finish_stage();

    run.enter(RunPhase::Measuring);
    let timing = if plan.runs == 0 {
        Timing::Skipped
    } else {
        let start = Instant::now();
        for _ in 0..plan.runs {
            launch.invoke(&mut output)?;
        }
        accelerator.synchronize()?;
        Timing::Measured {
            elapsed: start.elapsed(),
            runs: plan.runs,
            descriptors: count,
        }
    };
    if let Some(us) = timing.per_descriptor_us() {
        info!(
            runs = plan.runs,
            descriptors = count,
            us_per_descriptor = us,
            "Measurement complete"
        );
    }

    reporter.begin_stage(PipelineStage::Retrieving, None);
    let descriptors = accelerator.download_descriptors(&output)?;
    reporter.finish_stage();
    run.enter(RunPhase::Retrieved);

    let device_error = accelerator.take_last_error();
    if let Some(ref e) = device_error {
        warn!(error = %e, "Accelerator reported an error");
    }
    let sum = checksum(&descriptors);

    drop(launch);
    drop((output, kps, texture, triplets));
    run.enter(RunPhase::Released);

    Ok(BenchmarkOutcome {
        timing,
        descriptors,
        checksum: sum,
        device_error,
    })
}

/// Tracks and reports the resource lifecycle.
struct Run<'a> {
    phase: RunPhase,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> Run<'a> {
    fn new(reporter: &'a dyn ProgressReporter) -> Self {
        reporter.phase_changed(RunPhase::Unprovisioned);
        Self {
            phase: RunPhase::Unprovisioned,
            reporter,
        }
    }

    fn enter(&mut self, next: RunPhase) {
        debug_assert!(next > self.phase, "{} -> {}", self.phase, next);
        debug!(from = %self.phase, to = %next, "Run phase");
        self.phase = next;
        self.reporter.phase_changed(next);
    }
}

/// Everything one kernel invocation needs, bound once.
struct Launch<'a> {
    accelerator: &'a dyn Accelerator,
    kernel: &'a dyn DescriptorKernel,
    image: &'a ImageResource,
    triplets: &'a TableResource,
    keypoints: &'a KeypointBuffer,
    count: usize,
    check: LaunchCheck,
}

impl Launch<'_> {
    fn invoke(&self, output: &mut DescriptorBuffer) -> Result<()> {
        self.kernel
            .compute_descriptors(self.image, self.triplets, self.keypoints, self.count, output)?;
        if self.check == LaunchCheck::PerLaunch {
            self.accelerator.synchronize()?;
            if let Some(e) = self.accelerator.take_last_error() {
                return Err(LatchError::Launch(e));
            }
        }
        Ok(())
    }
}
