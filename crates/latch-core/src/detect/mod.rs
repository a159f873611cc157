pub mod config;
pub mod fast;
pub mod harris;
pub mod orb;
pub mod orientation;
pub mod pyramid;

pub use config::{OrbParams, ScoreType};
pub use orb::OrbDetector;

use image::GrayImage;

use crate::error::Result;
use crate::keypoint::DetectedKeypoint;

/// Keypoint source consumed by the benchmark pipeline.
pub trait Detector: Send + Sync {
    /// Detect keypoints in full-resolution pixel coordinates, angles in
    /// degrees.
    fn detect(&self, image: &GrayImage) -> Result<Vec<DetectedKeypoint>>;
}

/// Number of keypoints per pyramid octave, indexed by octave.
pub fn octave_counts(keypoints: &[DetectedKeypoint]) -> Vec<usize> {
    let mut counts = Vec::new();
    for kp in keypoints {
        let octave = kp.octave as usize;
        if counts.len() <= octave {
            counts.resize(octave + 1, 0);
        }
        counts[octave] += 1;
    }
    counts
}
