use ndarray::ArrayView2;

/// Intensity-centroid orientation in degrees, `[0, 360)`.
///
/// Moments are summed over the disc of `radius` around `(x, y)`; reads
/// outside the image are clamped.
pub fn intensity_centroid_angle(image: ArrayView2<'_, u8>, x: usize, y: usize, radius: usize) -> f32 {
    let (h, w) = image.dim();
    let r = radius as isize;
    let r2 = r * r;

    let mut m01 = 0i64;
    let mut m10 = 0i64;
    for dy in -r..=r {
        let py = (y as isize + dy).clamp(0, h as isize - 1) as usize;
        for dx in -r..=r {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let px = (x as isize + dx).clamp(0, w as isize - 1) as usize;
            let v = image[[py, px]] as i64;
            m10 += dx as i64 * v;
            m01 += dy as i64 * v;
        }
    }

    let angle = (m01 as f32).atan2(m10 as f32).to_degrees();
    let angle = if angle < 0.0 { angle + 360.0 } else { angle };
    // -0.0 and rounding can land exactly on 360
    if angle >= 360.0 {
        0.0
    } else {
        angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    #[test]
    fn test_brighter_right_points_east() {
        let image = Array2::from_shape_fn((41, 41), |(_, x)| (x * 6) as u8);
        let angle = intensity_centroid_angle(image.view(), 20, 20, 15);
        assert!(angle < 1.0 || angle > 359.0, "angle {angle}");
    }

    #[test]
    fn test_brighter_below_points_south() {
        let image = Array2::from_shape_fn((41, 41), |(y, _)| (y * 6) as u8);
        let angle = intensity_centroid_angle(image.view(), 20, 20, 15);
        assert_abs_diff_eq!(angle, 90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_flat_patch_in_range() {
        let image = Array2::<u8>::from_elem((41, 41), 10);
        let angle = intensity_centroid_angle(image.view(), 20, 20, 15);
        assert!((0.0..360.0).contains(&angle));
    }
}
