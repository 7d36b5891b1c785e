use pano_image::Image;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

use crate::error::FeatureError;
use crate::fast::Keypoint;

/// Number of intensity comparisons in a descriptor.
pub const DESCRIPTOR_BITS: usize = 256;

/// A 256-bit binary descriptor.
pub type Descriptor = [u8; DESCRIPTOR_BITS / 8];

/// Hamming distance between two descriptors.
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x ^ y).count_ones())
        .sum()
}

/// The sampling pattern of point pairs compared by a BRIEF descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct BriefPattern {
    pairs: Vec<[(i32, i32); 2]>,
    radius: i32,
}

impl BriefPattern {
    /// Draw a random pattern of [`DESCRIPTOR_BITS`] point pairs inside a square patch.
    ///
    /// The same `seed` always yields the same pattern, so descriptors of different images
    /// are comparable.
    ///
    /// # Arguments
    ///
    /// * `patch_size` - The side of the square patch around each keypoint, must be odd.
    /// * `seed` - Seed of the pattern generator.
    pub fn new(patch_size: usize, seed: u64) -> Result<Self, FeatureError> {
        if patch_size < 5 || patch_size % 2 == 0 {
            return Err(FeatureError::InvalidPatchSize(patch_size));
        }

        let radius = (patch_size / 2) as i32;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut draw = || (rng.random_range(-radius..=radius), rng.random_range(-radius..=radius));

        let pairs = (0..DESCRIPTOR_BITS).map(|_| [draw(), draw()]).collect();

        Ok(Self { pairs, radius })
    }

    /// Distance from the image border below which keypoints cannot be described.
    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Compute descriptors for the keypoints whose patch lies fully inside the image.
    ///
    /// # Arguments
    ///
    /// * `smoothed` - The smoothed grayscale image.
    /// * `keypoints` - The detected keypoints.
    ///
    /// # Returns
    ///
    /// The kept keypoints and their descriptors, in the input order.
    pub fn describe(
        &self,
        smoothed: &Image<u8, 1>,
        keypoints: &[Keypoint],
    ) -> (Vec<Keypoint>, Vec<Descriptor>) {
        let (cols, rows) = (smoothed.cols() as i32, smoothed.rows() as i32);
        let r = self.radius;
        let data = smoothed.as_slice();

        keypoints
            .par_iter()
            .filter(|kp| kp.x >= r && kp.x < cols - r && kp.y >= r && kp.y < rows - r)
            .map(|kp| {
                let sample = |(dx, dy): (i32, i32)| data[((kp.y + dy) * cols + kp.x + dx) as usize];
                let mut desc = [0u8; DESCRIPTOR_BITS / 8];
                for (bit, [p, q]) in self.pairs.iter().enumerate() {
                    if sample(*p) < sample(*q) {
                        desc[bit / 8] |= 1 << (bit % 8);
                    }
                }
                (*kp, desc)
            })
            .unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textured(size: usize, shift: usize) -> Result<Image<u8, 1>, FeatureError> {
        Ok(Image::from_fn([size, size].into(), |x, y| {
            let (u, v) = (x + shift, y);
            [((u * 37 + v * 91 + (u * v) % 17) % 251) as u8]
        })?)
    }

    #[test]
    fn test_hamming_distance() {
        let a = [0u8; 32];
        let mut b = [0u8; 32];
        assert_eq!(hamming_distance(&a, &b), 0);
        b[0] = 0b1011;
        b[31] = 0xff;
        assert_eq!(hamming_distance(&a, &b), 11);
    }

    #[test]
    fn test_pattern_is_deterministic() -> Result<(), FeatureError> {
        let p1 = BriefPattern::new(31, 7)?;
        let p2 = BriefPattern::new(31, 7)?;
        assert_eq!(p1, p2);
        assert_eq!(p1.radius(), 15);
        assert!(p1
            .pairs
            .iter()
            .flatten()
            .all(|(dx, dy)| dx.abs() <= 15 && dy.abs() <= 15));
        Ok(())
    }

    #[test]
    fn test_pattern_invalid_patch() {
        assert_eq!(
            BriefPattern::new(8, 0),
            Err(FeatureError::InvalidPatchSize(8))
        );
    }

    #[test]
    fn test_describe_translation_invariant() -> Result<(), FeatureError> {
        let pattern = BriefPattern::new(15, 0)?;
        let img1 = textured(48, 0)?;
        let img2 = textured(48, 5)?;

        let kp1 = Keypoint { x: 25, y: 20, response: 1 };
        let kp2 = Keypoint { x: 20, y: 20, response: 1 };

        let (_, d1) = pattern.describe(&img1, &[kp1]);
        let (_, d2) = pattern.describe(&img2, &[kp2]);
        assert_eq!(d1.len(), 1);
        assert_eq!(hamming_distance(&d1[0], &d2[0]), 0);
        Ok(())
    }

    #[test]
    fn test_describe_drops_border_keypoints() -> Result<(), FeatureError> {
        let pattern = BriefPattern::new(15, 0)?;
        let img = textured(40, 0)?;
        let keypoints = [
            Keypoint { x: 3, y: 20, response: 1 },
            Keypoint { x: 20, y: 20, response: 2 },
            Keypoint { x: 20, y: 33, response: 3 },
            Keypoint { x: 7, y: 7, response: 4 },
        ];
        let (kept, desc) = pattern.describe(&img, &keypoints);
        assert_eq!(kept, vec![keypoints[1], keypoints[3]]);
        assert_eq!(desc.len(), 2);
        Ok(())
    }
}
