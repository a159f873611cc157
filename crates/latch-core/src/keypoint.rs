use std::f32::consts::PI;

use tracing::debug;

/// Degrees to radians, applied once at the kernel boundary.
pub const DEG_TO_RAD: f32 = PI / 180.0;

/// A keypoint as produced by the detector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectedKeypoint {
    /// Position in full-resolution pixel coordinates.
    pub x: f32,
    pub y: f32,
    /// Diameter of the meaningful neighbourhood, in pixels.
    pub size: f32,
    /// Orientation in degrees, `[0, 360)`.
    pub angle: f32,
    /// Detector response used for ranking.
    pub response: f32,
    /// Pyramid level the keypoint was found on.
    pub octave: u32,
}

/// A keypoint in the layout the descriptor kernel reads.
///
/// Matches the WGSL `Keypoint` struct: four packed `f32`, 16 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "gpu", derive(bytemuck::Pod, bytemuck::Zeroable))]
pub struct KernelKeypoint {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    /// Orientation in radians.
    pub angle: f32,
}

/// Drop keypoints whose sampling window would leave the image.
///
/// Keeps `margin < x < width - margin` and `margin < y < height - margin`,
/// preserving order.
pub fn filter_border(
    mut keypoints: Vec<DetectedKeypoint>,
    width: u32,
    height: u32,
    margin: f32,
) -> Vec<DetectedKeypoint> {
    let before = keypoints.len();
    let max_x = width as f32 - margin;
    let max_y = height as f32 - margin;
    keypoints.retain(|kp| kp.x > margin && kp.y > margin && kp.x < max_x && kp.y < max_y);
    debug!(
        detected = before,
        kept = keypoints.len(),
        margin,
        "Border filter applied"
    );
    keypoints
}

/// Convert detector keypoints into kernel records.
pub fn marshal(keypoints: &[DetectedKeypoint]) -> Vec<KernelKeypoint> {
    keypoints
        .iter()
        .map(|kp| KernelKeypoint {
            x: kp.x,
            y: kp.y,
            scale: kp.size,
            angle: kp.angle * DEG_TO_RAD,
        })
        .collect()
}
