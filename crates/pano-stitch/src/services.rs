use pano_features::{FastBriefExtractor, FeatureParams, Features};
use pano_geometry::{
    linalg::Mat33,
    ransac::{ransac_homography, RansacParams},
};
use pano_image::{Image, ImageDtype, ImageSize};
use pano_imgproc::{interpolation::InterpolationMode, warp::warp_perspective};

use crate::error::StitchError;
use crate::transform::Transform;

/// A matched pair of points between the previous and the current image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correspondence {
    /// Point in the previous image, in pixels.
    pub previous: [f64; 2],
    /// Point in the current image, in pixels.
    pub current: [f64; 2],
    /// Match distance, smaller is better.
    pub distance: f64,
}

/// Finds corresponding points between two images.
pub trait FeatureMatcher {
    /// Keypoints and descriptors of one image.
    type Features;

    /// Detect keypoints and compute their descriptors.
    fn detect_and_describe(&self, image: &Image<u8, 3>) -> Result<Self::Features, StitchError>;

    /// Match the features of the previous image against the current one.
    ///
    /// An empty result is valid and means the images share nothing recognisable.
    fn match_features(
        &self,
        previous: &Self::Features,
        current: &Self::Features,
    ) -> Result<Vec<Correspondence>, StitchError>;
}

/// Fits a homography to point correspondences, tolerating outliers.
pub trait HomographyEstimator {
    /// Estimate the homography mapping `src` points onto `dst` points.
    ///
    /// Must fail on fewer than four points or degenerate configurations.
    fn estimate(&self, src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<Mat33, StitchError>;
}

/// Resamples an image into a canvas through a transform.
pub trait ImageWarper<T, const C: usize> {
    /// Warp `image` into a canvas of `size`, leaving uncovered pixels all-zero.
    fn warp(
        &self,
        image: &Image<T, C>,
        transform: &Transform,
        size: ImageSize,
    ) -> Result<Image<T, C>, StitchError>;
}

impl<M: FeatureMatcher + ?Sized> FeatureMatcher for &M {
    type Features = M::Features;

    fn detect_and_describe(&self, image: &Image<u8, 3>) -> Result<Self::Features, StitchError> {
        (**self).detect_and_describe(image)
    }

    fn match_features(
        &self,
        previous: &Self::Features,
        current: &Self::Features,
    ) -> Result<Vec<Correspondence>, StitchError> {
        (**self).match_features(previous, current)
    }
}

impl<E: HomographyEstimator + ?Sized> HomographyEstimator for &E {
    fn estimate(&self, src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<Mat33, StitchError> {
        (**self).estimate(src, dst)
    }
}

impl<T, const C: usize, W: ImageWarper<T, C> + ?Sized> ImageWarper<T, C> for &W {
    fn warp(
        &self,
        image: &Image<T, C>,
        transform: &Transform,
        size: ImageSize,
    ) -> Result<Image<T, C>, StitchError> {
        (**self).warp(image, transform, size)
    }
}

/// FAST corners described with BRIEF and matched by Hamming distance.
pub struct FastBriefMatcher {
    extractor: FastBriefExtractor,
}

impl FastBriefMatcher {
    /// Create a matcher with the given feature parameters.
    pub fn new(params: FeatureParams) -> Result<Self, StitchError> {
        Ok(Self {
            extractor: FastBriefExtractor::new(params)?,
        })
    }
}

impl FeatureMatcher for FastBriefMatcher {
    type Features = Features;

    fn detect_and_describe(&self, image: &Image<u8, 3>) -> Result<Features, StitchError> {
        Ok(self.extractor.detect_and_describe(image)?)
    }

    fn match_features(
        &self,
        previous: &Features,
        current: &Features,
    ) -> Result<Vec<Correspondence>, StitchError> {
        // query the previous image, train on the current one
        let matches = self.extractor.match_features(previous, current);
        Ok(matches
            .iter()
            .map(|m| Correspondence {
                previous: previous.keypoints[m.query_idx].position(),
                current: current.keypoints[m.train_idx].position(),
                distance: m.distance,
            })
            .collect())
    }
}

/// RANSAC over minimal samples followed by a least-squares refit on the inliers.
#[derive(Clone, Debug, Default)]
pub struct RansacHomographyEstimator {
    params: RansacParams,
}

impl RansacHomographyEstimator {
    /// Create an estimator with the given RANSAC parameters.
    pub fn new(params: RansacParams) -> Self {
        Self { params }
    }
}

impl HomographyEstimator for RansacHomographyEstimator {
    fn estimate(&self, src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<Mat33, StitchError> {
        let result = ransac_homography(src, dst, &self.params)?;
        log::debug!(
            "homography from {} points, {} inliers",
            src.len(),
            result.inlier_count
        );
        Ok(result.model)
    }
}

/// Inverse-mapping perspective warp with bilinear sampling.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerspectiveWarper {
    /// Sampling mode of the source image.
    pub interpolation: InterpolationMode,
}

impl<T: ImageDtype, const C: usize> ImageWarper<T, C> for PerspectiveWarper {
    fn warp(
        &self,
        image: &Image<T, C>,
        transform: &Transform,
        size: ImageSize,
    ) -> Result<Image<T, C>, StitchError> {
        let mut dst = Image::from_size_val(size, T::default())?;
        warp_perspective(image, &mut dst, &transform.to_flat(), self.interpolation)?;
        Ok(dst)
    }
}
