use ndarray::ArrayView2;

use crate::consts::{HARRIS_BLOCK_SIZE, HARRIS_K};

/// Harris corner measure `det(M) - k * trace(M)^2` of the Sobel structure
/// tensor summed over a `HARRIS_BLOCK_SIZE` block centred on `(x, y)`.
///
/// Gradients are normalised to the 8-bit range so responses are comparable
/// across pyramid levels. Reads outside the image are clamped.
pub fn harris_response(image: ArrayView2<'_, u8>, x: usize, y: usize) -> f32 {
    let (h, w) = image.dim();
    let at = |px: isize, py: isize| -> f32 {
        let cx = px.clamp(0, w as isize - 1) as usize;
        let cy = py.clamp(0, h as isize - 1) as usize;
        image[[cy, cx]] as f32
    };

    let half = (HARRIS_BLOCK_SIZE / 2) as isize;
    let norm = 1.0 / (4.0 * HARRIS_BLOCK_SIZE as f32 * 255.0);
    let (mut a, mut b, mut c) = (0.0f32, 0.0f32, 0.0f32);
    for dy in -half..=half {
        for dx in -half..=half {
            let px = x as isize + dx;
            let py = y as isize + dy;
            let ix = (at(px + 1, py - 1) + 2.0 * at(px + 1, py) + at(px + 1, py + 1))
                - (at(px - 1, py - 1) + 2.0 * at(px - 1, py) + at(px - 1, py + 1));
            let iy = (at(px - 1, py + 1) + 2.0 * at(px, py + 1) + at(px + 1, py + 1))
                - (at(px - 1, py - 1) + 2.0 * at(px, py - 1) + at(px + 1, py - 1));
            let (ix, iy) = (ix * norm, iy * norm);
            a += ix * ix;
            b += ix * iy;
            c += iy * iy;
        }
    }
    a * c - b * b - HARRIS_K * (a + c) * (a + c)
}
