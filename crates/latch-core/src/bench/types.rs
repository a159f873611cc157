use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::descriptor::Descriptor;
use crate::verify::Checksum;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Loading,
    Detecting,
    Filtering,
    Provisioning,
    WarmingUp,
    Measuring,
    Retrieving,
    Writing,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "Loading image"),
            Self::Detecting => write!(f, "Detecting keypoints"),
            Self::Filtering => write!(f, "Filtering keypoints"),
            Self::Provisioning => write!(f, "Provisioning accelerator"),
            Self::WarmingUp => write!(f, "Warming up"),
            Self::Measuring => write!(f, "Measuring"),
            Self::Retrieving => write!(f, "Retrieving descriptors"),
            Self::Writing => write!(f, "Writing descriptors"),
        }
    }
}

/// Lifecycle of the accelerator resources during one benchmark run.
///
/// Transitions are strictly forward, in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    Unprovisioned,
    Provisioned,
    WarmingUp,
    Measuring,
    Retrieved,
    Released,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unprovisioned => write!(f, "unprovisioned"),
            Self::Provisioned => write!(f, "provisioned"),
            Self::WarmingUp => write!(f, "warming up"),
            Self::Measuring => write!(f, "measuring"),
            Self::Retrieved => write!(f, "retrieved"),
            Self::Released => write!(f, "released"),
        }
    }
}

/// When asynchronous accelerator errors are queried.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchCheck {
    /// Once, after the descriptors are read back. Reported, not fatal.
    #[default]
    Aggregate,
    /// After every launch; the first error aborts the run. Adds a device
    /// synchronisation per launch, including inside the timed span.
    PerLaunch,
}

impl fmt::Display for LaunchCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aggregate => write!(f, "aggregate"),
            Self::PerLaunch => write!(f, "per launch"),
        }
    }
}

/// Invocation counts and error policy for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BenchmarkPlan {
    pub warmups: usize,
    pub runs: usize,
    pub launch_check: LaunchCheck,
}

/// Wall-clock result of the measured invocations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Timing {
    Measured {
        /// Issue of the first timed launch to completion of the last.
        elapsed: Duration,
        runs: usize,
        descriptors: usize,
    },
    /// Nothing was timed: zero keypoints or zero runs.
    Skipped,
}

impl Timing {
    /// Average microseconds per descriptor, `elapsed / (runs * descriptors)`.
    pub fn per_descriptor_us(&self) -> Option<f64> {
        match *self {
            Self::Measured {
                elapsed,
                runs,
                descriptors,
            } if runs > 0 && descriptors > 0 => {
                Some(elapsed.as_secs_f64() * 1e6 / (runs as f64 * descriptors as f64))
            }
            _ => None,
        }
    }
}

/// Everything one benchmark run produced.
#[derive(Clone, Debug)]
pub struct BenchmarkOutcome {
    pub timing: Timing,
    pub descriptors: Vec<Descriptor>,
    pub checksum: Checksum,
    /// Last asynchronous accelerator error, `None` when clean.
    pub device_error: Option<String>,
}

impl BenchmarkOutcome {
    pub fn descriptor_count(&self) -> usize {
        self.descriptors.len()
    }
}

/// Thread-safe progress reporting for the benchmark pipeline.
///
/// All methods have default no-op implementations. Nothing is reported
/// while the timed invocations are in flight.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the number of work items in
    /// this stage, if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}

    /// The resource lifecycle moved to `phase`.
    fn phase_changed(&self, _phase: RunPhase) {}
}

/// No-op progress reporter.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
