use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::compute::DevicePreference;
use crate::consts::{DEFAULT_BORDER_MARGIN, DEFAULT_INPUT, DEFAULT_RUNS, DEFAULT_WARMUPS};
use crate::detect::OrbParams;
use crate::error::{LatchError, Result};

use super::types::{BenchmarkPlan, LaunchCheck};

/// Full configuration of one benchmark run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default = "default_input")]
    pub input: PathBuf,
    #[serde(default)]
    pub device: DevicePreference,
    #[serde(default)]
    pub detector: OrbParams,
    /// Untimed invocations before measurement.
    #[serde(default = "default_warmups")]
    pub warmups: usize,
    /// Timed invocations.
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Keypoints within this many pixels of an edge are dropped.
    #[serde(default = "default_border_margin")]
    pub border_margin: f32,
    #[serde(default)]
    pub launch_check: LaunchCheck,
    /// Write the retrieved descriptors here when set.
    #[serde(default)]
    pub descriptor_dump: Option<PathBuf>,
}

fn default_input() -> PathBuf {
    PathBuf::from(DEFAULT_INPUT)
}
fn default_warmups() -> usize {
    DEFAULT_WARMUPS
}
fn default_runs() -> usize {
    DEFAULT_RUNS
}
fn default_border_margin() -> f32 {
    DEFAULT_BORDER_MARGIN
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            device: DevicePreference::default(),
            detector: OrbParams::default(),
            warmups: DEFAULT_WARMUPS,
            runs: DEFAULT_RUNS,
            border_margin: DEFAULT_BORDER_MARGIN,
            launch_check: LaunchCheck::default(),
            descriptor_dump: None,
        }
    }
}

impl BenchmarkConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.border_margin >= 0.0 && self.border_margin.is_finite()) {
            return Err(LatchError::InvalidConfig(format!(
                "border_margin must be a finite non-negative number, got {}",
                self.border_margin
            )));
        }
        self.detector.validate()
    }

    pub fn plan(&self) -> BenchmarkPlan {
        BenchmarkPlan {
            warmups: self.warmups,
            runs: self.runs,
            launch_check: self.launch_check,
        }
    }
}
