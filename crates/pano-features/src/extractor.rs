use pano_image::Image;
use pano_imgproc::{color::gray_from_rgb_u8, filter::gaussian_blur};

use crate::brief::{BriefPattern, Descriptor};
use crate::error::FeatureError;
use crate::fast::{fast_feature_detector, Keypoint};
use crate::matcher::{match_descriptors, DescriptorMatch};

/// Parameters of the FAST/BRIEF feature pipeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FeatureParams {
    /// FAST intensity threshold.
    pub fast_threshold: u8,
    /// FAST contiguous arc length.
    pub fast_arc_length: u8,
    /// Keep at most this many keypoints, strongest first.
    pub max_keypoints: usize,
    /// Side of the square BRIEF sampling patch.
    pub patch_size: usize,
    /// Seed of the BRIEF sampling pattern.
    pub pattern_seed: u64,
    /// Keep only mutual nearest neighbours when matching.
    pub cross_check: bool,
    /// Optional Lowe ratio applied when matching.
    pub max_ratio: Option<f32>,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            fast_arc_length: 9,
            max_keypoints: 1000,
            patch_size: 31,
            pattern_seed: 0x5eed,
            cross_check: false,
            max_ratio: None,
        }
    }
}

/// Keypoints of one image with their descriptors, index aligned.
#[derive(Clone, Debug, Default)]
pub struct Features {
    /// The described keypoints.
    pub keypoints: Vec<Keypoint>,
    /// One descriptor per keypoint.
    pub descriptors: Vec<Descriptor>,
}

impl Features {
    /// Number of described keypoints.
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    /// Whether no keypoint could be described.
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Detects FAST corners and describes them with BRIEF.
pub struct FastBriefExtractor {
    params: FeatureParams,
    pattern: BriefPattern,
}

impl FastBriefExtractor {
    /// Create an extractor, drawing the sampling pattern once.
    pub fn new(params: FeatureParams) -> Result<Self, FeatureError> {
        let pattern = BriefPattern::new(params.patch_size, params.pattern_seed)?;
        Ok(Self { params, pattern })
    }

    /// The parameters of this extractor.
    pub fn params(&self) -> &FeatureParams {
        &self.params
    }

    /// Detect and describe the features of an RGB image.
    pub fn detect_and_describe(&self, image: &Image<u8, 3>) -> Result<Features, FeatureError> {
        let mut gray = Image::from_size_val(image.size(), 0u8)?;
        gray_from_rgb_u8(image, &mut gray)?;

        let mut keypoints = fast_feature_detector(
            &gray,
            self.params.fast_threshold,
            self.params.fast_arc_length,
            true,
        )?;

        // strongest first, stable so equal responses keep raster order
        keypoints.sort_by(|a, b| b.response.cmp(&a.response));
        keypoints.truncate(self.params.max_keypoints);

        let mut smoothed = Image::from_size_val(gray.size(), 0u8)?;
        gaussian_blur(&gray, &mut smoothed, 7, 2.0)?;

        let (keypoints, descriptors) = self.pattern.describe(&smoothed, &keypoints);
        log::trace!(
            "described {} keypoints on a {} image",
            keypoints.len(),
            image.size()
        );

        Ok(Features {
            keypoints,
            descriptors,
        })
    }

    /// Match `query` features against `train` features.
    pub fn match_features(&self, query: &Features, train: &Features) -> Vec<DescriptorMatch> {
        match_descriptors(
            &query.descriptors,
            &train.descriptors,
            self.params.cross_check,
            self.params.max_ratio,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // bright rectangles on a dark background, shifted horizontally by `shift`
    fn blocks(width: usize, height: usize, shift: usize) -> Result<Image<u8, 3>, FeatureError> {
        Ok(Image::from_fn([width, height].into(), |x, y| {
            let u = x + shift;
            let on = (u / 16 + y / 16) % 2 == 0 && (u % 16) > 3 && (y % 16) > 3;
            let v = if on { 40 + ((u * 7 + y * 3) % 180) as u8 } else { 10 };
            [v, v, v]
        })?)
    }

    #[test]
    fn test_extractor_invalid_patch() {
        let params = FeatureParams {
            patch_size: 4,
            ..Default::default()
        };
        assert!(matches!(
            FastBriefExtractor::new(params),
            Err(FeatureError::InvalidPatchSize(4))
        ));
    }

    #[test]
    fn test_detect_and_describe_aligned() -> Result<(), FeatureError> {
        let extractor = FastBriefExtractor::new(FeatureParams::default())?;
        let features = extractor.detect_and_describe(&blocks(128, 96, 0)?)?;
        assert!(!features.is_empty());
        assert_eq!(features.keypoints.len(), features.descriptors.len());
        let r = 15;
        assert!(features
            .keypoints
            .iter()
            .all(|kp| kp.x >= r && kp.x < 128 - r && kp.y >= r && kp.y < 96 - r));
        Ok(())
    }

    #[test]
    fn test_detect_and_describe_max_keypoints() -> Result<(), FeatureError> {
        let params = FeatureParams {
            max_keypoints: 5,
            ..Default::default()
        };
        let extractor = FastBriefExtractor::new(params)?;
        let features = extractor.detect_and_describe(&blocks(128, 96, 0)?)?;
        assert!(features.len() <= 5);
        Ok(())
    }

    #[test]
    fn test_flat_image_has_no_features() -> Result<(), FeatureError> {
        let extractor = FastBriefExtractor::new(FeatureParams::default())?;
        let flat = Image::<u8, 3>::from_size_val([64, 64].into(), 128)?;
        let features = extractor.detect_and_describe(&flat)?;
        assert!(features.is_empty());
        assert!(extractor.match_features(&features, &features).is_empty());
        Ok(())
    }

    #[test]
    fn test_match_shifted_images() -> Result<(), FeatureError> {
        let extractor = FastBriefExtractor::new(FeatureParams::default())?;
        let f1 = extractor.detect_and_describe(&blocks(160, 96, 0)?)?;
        let f2 = extractor.detect_and_describe(&blocks(160, 96, 32)?)?;

        let matches = extractor.match_features(&f2, &f1);
        let exact: Vec<_> = matches.iter().filter(|m| m.distance == 0.0).collect();
        assert!(!exact.is_empty());

        // identical patches only occur at the true 32 pixel offset or a period of the texture
        let consistent = exact
            .iter()
            .filter(|m| {
                let p2 = f2.keypoints[m.query_idx];
                let p1 = f1.keypoints[m.train_idx];
                p1.x - p2.x == 32 && p1.y == p2.y
            })
            .count();
        assert!(consistent > 0);
        Ok(())
    }
}
