#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};
use latch_core::keypoint::DetectedKeypoint;

/// Deterministic LCG so synthetic images are identical across runs.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    pub fn range(&mut self, lo: u32, hi: u32) -> u32 {
        lo + self.next_u32() % (hi - lo)
    }
}

/// Bright squares of varying size and intensity on a dark, slowly varying
/// background. Every square contributes four strong corners.
pub fn textured_image(width: u32, height: u32) -> GrayImage {
    let mut img = GrayImage::from_fn(width, height, |x, y| Luma([(20 + (x + y) % 40) as u8]));
    let mut rng = Lcg::new(0x5eed);
    let cell = 24;
    for cy in (0..height).step_by(cell as usize) {
        for cx in (0..width).step_by(cell as usize) {
            let side = rng.range(6, 15);
            let ox = cx + rng.range(2, cell - side);
            let oy = cy + rng.range(2, cell - side);
            let value = rng.range(140, 256) as u8;
            for y in oy..(oy + side).min(height) {
                for x in ox..(ox + side).min(width) {
                    img.put_pixel(x, y, Luma([value]));
                }
            }
        }
    }
    img
}

/// Horizontal ramp; no corners, but patch comparisons are not all equal.
pub fn ramp_image(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, _| Luma([(x * 255 / width.max(1)) as u8]))
}

pub fn flat_image(width: u32, height: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([value]))
}

pub fn save_png(dir: &Path, name: &str, image: &GrayImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

pub fn keypoint(x: f32, y: f32) -> DetectedKeypoint {
    DetectedKeypoint {
        x,
        y,
        size: 31.0,
        angle: 0.0,
        response: 1.0,
        octave: 0,
    }
}
