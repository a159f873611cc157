use std::cmp::Ordering;

use image::GrayImage;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{LatchError, Result};
use crate::keypoint::DetectedKeypoint;

use super::config::{OrbParams, ScoreType};
use super::fast::{detect_corners, Corner};
use super::harris::harris_response;
use super::orientation::intensity_centroid_angle;
use super::pyramid::{build_pyramid, PyramidLevel};
use super::Detector;

/// Oriented FAST keypoints on a scale pyramid.
#[derive(Clone, Debug, Default)]
pub struct OrbDetector {
    params: OrbParams,
}

impl OrbDetector {
    pub fn new(params: OrbParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &OrbParams {
        &self.params
    }

    fn detect_level(&self, level: &PyramidLevel, budget: usize) -> Vec<DetectedKeypoint> {
        if budget == 0 {
            return Vec::new();
        }
        let params = &self.params;
        let view = level.data.view();
        let (w, h) = (level.width(), level.height());
        let border = params.edge_threshold;

        let mut corners: Vec<Corner> = detect_corners(view, params.fast_threshold)
            .into_iter()
            .filter(|c| c.x >= border && c.y >= border && c.x < w - border && c.y < h - border)
            .collect();

        match params.score_type {
            ScoreType::Harris => {
                retain_best(&mut corners, 2 * budget);
                for corner in &mut corners {
                    corner.score = harris_response(view, corner.x, corner.y);
                }
                retain_best(&mut corners, budget);
            }
            ScoreType::Fast => retain_best(&mut corners, budget),
        }

        let radius = params.patch_size / 2;
        let size = params.patch_size as f32 * level.scale;
        corners
            .iter()
            .map(|c| DetectedKeypoint {
                x: c.x as f32 * level.scale,
                y: c.y as f32 * level.scale,
                size,
                angle: intensity_centroid_angle(view, c.x, c.y, radius),
                response: c.score,
                octave: level.index as u32,
            })
            .collect()
    }
}

impl Detector for OrbDetector {
    fn detect(&self, image: &GrayImage) -> Result<Vec<DetectedKeypoint>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(LatchError::InvalidDimensions { width, height });
        }

        let pyramid = build_pyramid(image, &self.params);
        let budgets = self.params.features_per_level();
        let pixels = width as usize * height as usize;

        let per_level: Vec<Vec<DetectedKeypoint>> = if pixels >= PARALLEL_PIXEL_THRESHOLD {
            pyramid
                .par_iter()
                .map(|level| self.detect_level(level, budgets[level.index]))
                .collect()
        } else {
            pyramid
                .iter()
                .map(|level| self.detect_level(level, budgets[level.index]))
                .collect()
        };

        for (level, found) in pyramid.iter().zip(&per_level) {
            debug!(
                level = level.index,
                width = level.width(),
                height = level.height(),
                keypoints = found.len(),
                "Pyramid level detected"
            );
        }

        let mut keypoints: Vec<DetectedKeypoint> = per_level.into_iter().flatten().collect();
        keypoints.truncate(self.params.n_features);
        info!(
            keypoints = keypoints.len(),
            levels = pyramid.len(),
            "ORB detection complete"
        );
        Ok(keypoints)
    }
}

/// Keep the `n` highest-scoring corners. The sort is stable, so equal scores
/// keep raster order.
fn retain_best(corners: &mut Vec<Corner>, n: usize) {
    if corners.len() <= n {
        return;
    }
    corners.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    corners.truncate(n);
}
