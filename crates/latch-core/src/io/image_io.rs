use std::path::Path;

use image::GrayImage;
use tracing::debug;

use crate::error::{LatchError, Result};

/// Load an image file as 8-bit grayscale, converting colour inputs.
pub fn load_grayscale(path: &Path) -> Result<GrayImage> {
    let img = image::open(path)?;
    let gray = img.to_luma8();
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Err(LatchError::InvalidDimensions { width, height });
    }
    debug!(path = %path.display(), width, height, "Image loaded");
    Ok(gray)
}
