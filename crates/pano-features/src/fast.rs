use pano_image::Image;
use rayon::prelude::*;

use crate::error::FeatureError;

/// A detected corner with its FAST response.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Keypoint {
    /// Column of the corner in pixels.
    pub x: i32,
    /// Row of the corner in pixels.
    pub y: i32,
    /// Corner strength, the larger the more distinctive.
    pub response: i32,
}

impl Keypoint {
    /// Pixel coordinates as floating point.
    pub fn position(&self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }
}

// Bresenham circle of radius 3, clockwise starting at the top.
const CIRCLE: [(i32, i32); 16] = [
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

/// FAST segment test returning the corner score, or `None` if the pixel is not a corner.
///
/// The score is the sum of absolute differences beyond the threshold over the pixels of the
/// winning polarity, based on <https://www.edwardrosten.com/work/rosten_2006_machine.pdf>.
fn fast_corner_score(
    src: &[u8],
    pixel_idx: i32,
    offsets: &[i32; 16],
    threshold: u8,
    arc_length: u8,
) -> Option<i32> {
    let center = src[pixel_idx as usize] as i32;
    let lower = center - threshold as i32;
    let upper = center + threshold as i32;

    let mut pixels = [0i32; 16];
    for (p, off) in pixels.iter_mut().zip(offsets.iter()) {
        *p = src[(pixel_idx + off) as usize] as i32;
    }

    // high-speed test on the compass points
    let brighter = [0, 4, 8, 12].iter().filter(|&&i| pixels[i] > upper).count();
    let darker = [0, 4, 8, 12].iter().filter(|&&i| pixels[i] < lower).count();
    if arc_length >= 9 && brighter < 2 && darker < 2 {
        return None;
    }

    // look for a contiguous arc, wrapping around the circle
    let mut consecutive_brighter = 0u8;
    let mut consecutive_darker = 0u8;
    let mut is_corner = false;
    for k in 0..(16 + arc_length as usize) {
        let p = pixels[k % 16];
        if p > upper {
            consecutive_brighter += 1;
            consecutive_darker = 0;
        } else if p < lower {
            consecutive_darker += 1;
            consecutive_brighter = 0;
        } else {
            consecutive_brighter = 0;
            consecutive_darker = 0;
        }
        if consecutive_brighter >= arc_length || consecutive_darker >= arc_length {
            is_corner = true;
            break;
        }
    }

    if !is_corner {
        return None;
    }

    let sum_brighter: i32 = pixels.iter().filter(|&&p| p > upper).map(|&p| p - upper).sum();
    let sum_darker: i32 = pixels.iter().filter(|&&p| p < lower).map(|&p| lower - p).sum();
    Some(sum_brighter.max(sum_darker))
}

/// Fast feature detector
///
/// # Arguments
///
/// * `src` - The source image as Gray8 image.
/// * `threshold` - The intensity difference for a circle pixel to count as brighter/darker.
/// * `arc_length` - The total number of consecutive pixels in the Bresenham circle that must be brighter or darker than the center pixel.
/// * `nms` - Whether to keep only the local maxima of the response in a 3x3 neighbourhood.
///
/// # Returns
///
/// The detected keypoints in row-major order.
pub fn fast_feature_detector(
    src: &Image<u8, 1>,
    threshold: u8,
    arc_length: u8,
    nms: bool,
) -> Result<Vec<Keypoint>, FeatureError> {
    if !(1..=16).contains(&arc_length) {
        return Err(FeatureError::InvalidArcLength(arc_length));
    }

    let (cols, rows) = (src.cols() as i32, src.rows() as i32);
    if cols < 7 || rows < 7 {
        return Ok(Vec::new());
    }

    let mut offsets = [0i32; 16];
    for (off, (dx, dy)) in offsets.iter_mut().zip(CIRCLE.iter()) {
        *off = dy * cols + dx;
    }

    let data = src.as_slice();

    // dense score map, zero where there is no corner
    let scores: Vec<i32> = (0..rows)
        .into_par_iter()
        .flat_map_iter(|y| {
            (0..cols).map(move |x| {
                if y < 3 || y >= rows - 3 || x < 3 || x >= cols - 3 {
                    return 0;
                }
                fast_corner_score(data, y * cols + x, &offsets, threshold, arc_length)
                    .unwrap_or(0)
            })
        })
        .collect();

    let keypoints = (3..rows - 3)
        .into_par_iter()
        .flat_map_iter(|y| {
            let scores = &scores;
            (3..cols - 3).filter_map(move |x| {
                let score = scores[(y * cols + x) as usize];
                if score <= 0 {
                    return None;
                }
                if nms {
                    for dy in -1..=1 {
                        for dx in -1..=1 {
                            if dx == 0 && dy == 0 {
                                continue;
                            }
                            let other = scores[((y + dy) * cols + x + dx) as usize];
                            // ties are broken towards the earlier pixel in raster order
                            if other > score || (other == score && (dy < 0 || (dy == 0 && dx < 0))) {
                                return None;
                            }
                        }
                    }
                }
                Some(Keypoint { x, y, response: score })
            })
        })
        .collect();

    Ok(keypoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pano_image::Image;

    #[test]
    fn test_fast_feature_detector() -> Result<(), FeatureError> {
        #[rustfmt::skip]
        let img = Image::new(
            [7, 7].into(),
            vec![
                50,  50,  50,  50,  50,  50,  50,
                50,  50,  50,  50,  50,  50,  50,
                50,  50,  50, 200,  50,  50,  50,
                50,  50, 200, 200, 200,  50,  50,
                50,  50,  50, 200,  50,  50,  50,
                50,  50,  50,  50,  50,  50,  50,
                50,  50,  50,  50,  50,  50,  50,
            ],
        )?;
        let keypoints = fast_feature_detector(&img, 100, 9, false)?;
        assert_eq!(keypoints.len(), 1);
        assert_eq!((keypoints[0].x, keypoints[0].y), (3, 3));
        // 16 circle pixels, each 150 - 100 darker
        assert_eq!(keypoints[0].response, 16 * 50);
        Ok(())
    }

    #[test]
    fn test_fast_feature_detector_flat() -> Result<(), FeatureError> {
        let img = Image::<u8, 1>::from_size_val([16, 16].into(), 80)?;
        let keypoints = fast_feature_detector(&img, 10, 9, true)?;
        assert!(keypoints.is_empty());
        Ok(())
    }

    #[test]
    fn test_fast_feature_detector_square_corners() -> Result<(), FeatureError> {
        // bright square on dark background, corners at (8, 8) and (15, 15)
        let img = Image::<u8, 1>::from_fn([24, 24].into(), |x, y| {
            if (8..16).contains(&x) && (8..16).contains(&y) {
                [220]
            } else {
                [20]
            }
        })?;
        let keypoints = fast_feature_detector(&img, 50, 9, true)?;
        assert!(!keypoints.is_empty());
        for kp in keypoints.iter() {
            let near_corner = [(8, 8), (15, 8), (8, 15), (15, 15)]
                .iter()
                .any(|&(cx, cy)| (kp.x - cx).abs() <= 2 && (kp.y - cy).abs() <= 2);
            assert!(near_corner, "unexpected keypoint {:?}", kp);
        }
        Ok(())
    }

    #[test]
    fn test_fast_feature_detector_invalid_arc() -> Result<(), FeatureError> {
        let img = Image::<u8, 1>::from_size_val([8, 8].into(), 0)?;
        assert_eq!(
            fast_feature_detector(&img, 10, 17, true),
            Err(FeatureError::InvalidArcLength(17))
        );
        Ok(())
    }

    #[test]
    fn test_fast_feature_detector_too_small() -> Result<(), FeatureError> {
        let img = Image::<u8, 1>::from_size_val([5, 5].into(), 0)?;
        assert!(fast_feature_detector(&img, 10, 9, true)?.is_empty());
        Ok(())
    }
}
