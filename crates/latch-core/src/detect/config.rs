use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_KEYPOINT_BUDGET, DEFAULT_ORB_EDGE_THRESHOLD, DEFAULT_ORB_FAST_THRESHOLD,
    DEFAULT_ORB_FIRST_LEVEL, DEFAULT_ORB_LEVELS, DEFAULT_ORB_PATCH_SIZE,
    DEFAULT_ORB_SCALE_FACTOR, DEFAULT_ORB_WTA_K,
};
use crate::error::{LatchError, Result};

/// How candidate corners are ranked before the per-level budget is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreType {
    /// Harris corner measure over a 7x7 block.
    #[default]
    Harris,
    /// Raw FAST segment score.
    Fast,
}

/// ORB detector parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrbParams {
    /// Upper bound on keypoints returned across all levels.
    #[serde(default = "default_n_features")]
    pub n_features: usize,
    /// Ratio between consecutive pyramid levels (> 1).
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,
    #[serde(default = "default_n_levels")]
    pub n_levels: usize,
    /// Border, in level pixels, where no keypoint is reported.
    #[serde(default = "default_edge_threshold")]
    pub edge_threshold: usize,
    /// Pyramid level the source image is placed at; lower levels are upscaled.
    #[serde(default = "default_first_level")]
    pub first_level: usize,
    /// Points per BRIEF comparison. Carried for parity with ORB, not used by
    /// LATCH descriptors.
    #[serde(default = "default_wta_k")]
    pub wta_k: usize,
    #[serde(default)]
    pub score_type: ScoreType,
    /// Diameter of the orientation patch at level 0.
    #[serde(default = "default_patch_size")]
    pub patch_size: usize,
    #[serde(default = "default_fast_threshold")]
    pub fast_threshold: u8,
}

fn default_n_features() -> usize {
    DEFAULT_KEYPOINT_BUDGET
}
fn default_scale_factor() -> f32 {
    DEFAULT_ORB_SCALE_FACTOR
}
fn default_n_levels() -> usize {
    DEFAULT_ORB_LEVELS
}
fn default_edge_threshold() -> usize {
    DEFAULT_ORB_EDGE_THRESHOLD
}
fn default_first_level() -> usize {
    DEFAULT_ORB_FIRST_LEVEL
}
fn default_wta_k() -> usize {
    DEFAULT_ORB_WTA_K
}
fn default_patch_size() -> usize {
    DEFAULT_ORB_PATCH_SIZE
}
fn default_fast_threshold() -> u8 {
    DEFAULT_ORB_FAST_THRESHOLD
}

impl Default for OrbParams {
    fn default() -> Self {
        Self {
            n_features: DEFAULT_KEYPOINT_BUDGET,
            scale_factor: DEFAULT_ORB_SCALE_FACTOR,
            n_levels: DEFAULT_ORB_LEVELS,
            edge_threshold: DEFAULT_ORB_EDGE_THRESHOLD,
            first_level: DEFAULT_ORB_FIRST_LEVEL,
            wta_k: DEFAULT_ORB_WTA_K,
            score_type: ScoreType::default(),
            patch_size: DEFAULT_ORB_PATCH_SIZE,
            fast_threshold: DEFAULT_ORB_FAST_THRESHOLD,
        }
    }
}

impl OrbParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.scale_factor > 1.0 && self.scale_factor.is_finite()) {
            return Err(LatchError::InvalidConfig(format!(
                "scale_factor must be > 1, got {}",
                self.scale_factor
            )));
        }
        if self.n_levels == 0 {
            return Err(LatchError::InvalidConfig("n_levels must be >= 1".into()));
        }
        if self.first_level >= self.n_levels {
            return Err(LatchError::InvalidConfig(format!(
                "first_level {} outside 0..{}",
                self.first_level, self.n_levels
            )));
        }
        if !(2..=4).contains(&self.wta_k) {
            return Err(LatchError::InvalidConfig(format!(
                "wta_k must be 2, 3 or 4, got {}",
                self.wta_k
            )));
        }
        if self.patch_size < 2 {
            return Err(LatchError::InvalidConfig("patch_size must be >= 2".into()));
        }
        Ok(())
    }

    /// Scale of `level` relative to the source image.
    pub fn level_scale(&self, level: usize) -> f32 {
        self.scale_factor
            .powi(level as i32 - self.first_level as i32)
    }

    /// Split `n_features` geometrically across levels, finer levels first.
    pub fn features_per_level(&self) -> Vec<usize> {
        let factor = 1.0 / self.scale_factor as f64;
        let levels = self.n_levels;
        let mut desired =
            self.n_features as f64 * (1.0 - factor) / (1.0 - factor.powi(levels as i32));

        let mut budget = Vec::with_capacity(levels);
        let mut assigned = 0usize;
        for _ in 0..levels.saturating_sub(1) {
            let n = (desired.round() as usize).min(self.n_features - assigned);
            budget.push(n);
            assigned += n;
            desired *= factor;
        }
        budget.push(self.n_features - assigned);
        budget
    }
}
