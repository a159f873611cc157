use image::imageops::{self, FilterType};
use image::GrayImage;
use ndarray::Array2;

use super::config::OrbParams;

/// One resampled copy of the source image.
pub struct PyramidLevel {
    pub index: usize,
    /// Source pixels per level pixel.
    pub scale: f32,
    /// Row-major samples, indexed `[[y, x]]`.
    pub data: Array2<u8>,
}

impl PyramidLevel {
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

/// Resample `image` once per level. Levels too small to hold a single
/// keypoint are omitted.
pub fn build_pyramid(image: &GrayImage, params: &OrbParams) -> Vec<PyramidLevel> {
    let (width, height) = image.dimensions();
    let min_side = 2 * params.edge_threshold + 1;

    let mut levels = Vec::with_capacity(params.n_levels);
    for index in 0..params.n_levels {
        let scale = params.level_scale(index);
        let w = (width as f32 / scale).round() as u32;
        let h = (height as f32 / scale).round() as u32;
        if (w as usize) < min_side || (h as usize) < min_side {
            break;
        }

        let resized = if (w, h) == (width, height) {
            image.clone()
        } else {
            imageops::resize(image, w, h, FilterType::Triangle)
        };
        let Ok(data) = Array2::from_shape_vec((h as usize, w as usize), resized.into_raw()) else {
            break;
        };
        levels.push(PyramidLevel { index, scale, data });
    }
    levels
}
