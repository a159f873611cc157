use ndarray::{Array2, ArrayView2};

/// Bresenham circle of radius 3, clockwise from twelve o'clock.
pub const FAST_CIRCLE: [(isize, isize); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Contiguous circle pixels required for a corner.
const ARC_LENGTH: usize = 9;

const RADIUS: usize = 3;

/// A FAST corner in level coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corner {
    pub x: usize,
    pub y: usize,
    pub score: f32,
}

/// FAST-9 segment test with 3x3 non-maximum suppression.
///
/// Returns corners in raster order.
pub fn detect_corners(image: ArrayView2<'_, u8>, threshold: u8) -> Vec<Corner> {
    let (h, w) = image.dim();
    if h <= 2 * RADIUS || w <= 2 * RADIUS {
        return Vec::new();
    }

    let mut scores = Array2::<f32>::zeros((h, w));
    for y in RADIUS..h - RADIUS {
        for x in RADIUS..w - RADIUS {
            scores[[y, x]] = corner_score(&image, x, y, threshold);
        }
    }

    let mut corners = Vec::new();
    for y in RADIUS..h - RADIUS {
        for x in RADIUS..w - RADIUS {
            let score = scores[[y, x]];
            if score > 0.0 && is_local_max(&scores, x, y, score) {
                corners.push(Corner { x, y, score });
            }
        }
    }
    corners
}

/// Sum of absolute differences beyond `threshold` along the circle when the
/// segment test passes, zero otherwise.
fn corner_score(image: &ArrayView2<'_, u8>, x: usize, y: usize, threshold: u8) -> f32 {
    let center = image[[y, x]] as i32;
    let t = threshold as i32;

    let mut ring = [0i32; 16];
    for (slot, &(dx, dy)) in ring.iter_mut().zip(FAST_CIRCLE.iter()) {
        let px = (x as isize + dx) as usize;
        let py = (y as isize + dy) as usize;
        *slot = image[[py, px]] as i32 - center;
    }

    let brighter = longest_arc(&ring, |d| d > t);
    let darker = longest_arc(&ring, |d| d < -t);
    if brighter < ARC_LENGTH && darker < ARC_LENGTH {
        return 0.0;
    }

    let (bright_sum, dark_sum) = ring.iter().fold((0i32, 0i32), |(b, d), &v| {
        if v > t {
            (b + v - t, d)
        } else if v < -t {
            (b, d - v - t)
        } else {
            (b, d)
        }
    });
    bright_sum.max(dark_sum) as f32
}

/// Longest run of circle pixels satisfying `pred`, wrapping around.
fn longest_arc(ring: &[i32; 16], pred: impl Fn(i32) -> bool) -> usize {
    let mut best = 0;
    let mut run = 0;
    for i in 0..ring.len() * 2 {
        if pred(ring[i % ring.len()]) {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best.min(ring.len())
}

/// Ties are broken towards the first pixel in raster order.
fn is_local_max(scores: &Array2<f32>, x: usize, y: usize, score: f32) -> bool {
    for dy in -1isize..=1 {
        for dx in -1isize..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let n = scores[[(y as isize + dy) as usize, (x as isize + dx) as usize]];
            let earlier = dy < 0 || (dy == 0 && dx < 0);
            if n > score || (earlier && n == score) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_arc_wraps() {
        let mut ring = [0i32; 16];
        for i in (0..5).chain(12..16) {
            ring[i] = 50;
        }
        assert_eq!(longest_arc(&ring, |d| d > 20), 9);
    }

    #[test]
    fn test_flat_image_has_no_corners() {
        let image = Array2::<u8>::from_elem((20, 20), 128);
        assert!(detect_corners(image.view(), 20).is_empty());
    }

    #[test]
    fn test_bright_square_corner_detected() {
        let mut image = Array2::<u8>::zeros((32, 32));
        for y in 16..32 {
            for x in 16..32 {
                image[[y, x]] = 255;
            }
        }
        let corners = detect_corners(image.view(), 20);
        assert!(corners
            .iter()
            .any(|c| c.x.abs_diff(16) <= 1 && c.y.abs_diff(16) <= 1));
    }
}
