use std::path::Path;

use pano_image::{Image, ImageSize};
use pano_imgproc::pyramid::pyrdown_to_fit;
use pano_io::functional::{read_image_any_rgb8, write_image_rgb8};

use crate::bounds::CanvasBounds;
use crate::chain::TransformChainBuilder;
use crate::compositor::Compositor;
use crate::config::StitchConfig;
use crate::error::StitchError;
use crate::recenter::{center_index, recenter};
use crate::services::{
    FastBriefMatcher, FeatureMatcher, HomographyEstimator, ImageWarper, PerspectiveWarper,
    RansacHomographyEstimator,
};
use crate::transform::TransformSet;

/// Geometry of a panorama before any pixel is warped.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    /// One transform per image, each mapping into the canvas.
    pub transforms: TransformSet,
    /// Extent of the projected images in the reference frame.
    pub bounds: CanvasBounds,
    /// Pixel size of the canvas.
    pub canvas_size: ImageSize,
    /// Index of the reference image.
    pub center: usize,
}

/// The full stitching pipeline over pluggable collaborators.
pub struct Stitcher<M, E, W> {
    matcher: M,
    estimator: E,
    warper: W,
    config: StitchConfig,
}

impl Stitcher<FastBriefMatcher, RansacHomographyEstimator, PerspectiveWarper> {
    /// Create a stitcher with the default FAST/BRIEF matcher, RANSAC estimator and
    /// bilinear perspective warper.
    pub fn from_config(config: StitchConfig) -> Result<Self, StitchError> {
        let matcher = FastBriefMatcher::new(config.features.clone())?;
        let estimator = RansacHomographyEstimator::new(config.ransac);
        Self::new(matcher, estimator, PerspectiveWarper::default(), config)
    }
}

impl<M, E, W> Stitcher<M, E, W>
where
    M: FeatureMatcher,
    E: HomographyEstimator,
    W: ImageWarper<u8, 3>,
{
    /// Create a stitcher from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::Config`] when `config` does not pass [`StitchConfig::validate`].
    pub fn new(
        matcher: M,
        estimator: E,
        warper: W,
        config: StitchConfig,
    ) -> Result<Self, StitchError> {
        config.validate()?;
        Ok(Self {
            matcher,
            estimator,
            warper,
            config,
        })
    }

    /// The configuration of this stitcher.
    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Compute the canvas transforms of an ordered image sequence.
    ///
    /// Returns `Ok(None)` for an empty sequence.
    pub fn align(&self, images: &[Image<u8, 3>]) -> Result<Option<Alignment>, StitchError> {
        let Some(reference) = images.get(center_index(images.len())) else {
            return Ok(None);
        };

        let chain = TransformChainBuilder::new(&self.matcher, &self.estimator, &self.config)
            .build(images)?;
        let recentered = recenter(&chain)?;

        // the reference image stands in for the extent of every image
        let Some(bounds) = CanvasBounds::from_transforms(&recentered, reference.size())? else {
            return Ok(None);
        };
        let canvas_size = bounds.canvas_size(self.config.max_canvas_pixels)?;
        log::info!(
            "canvas x: [{:.2}, {:.2}] y: [{:.2}, {:.2}] -> {}",
            bounds.xmin,
            bounds.xmax,
            bounds.ymin,
            bounds.ymax,
            canvas_size
        );

        Ok(Some(Alignment {
            transforms: bounds.apply(&recentered),
            bounds,
            canvas_size,
            center: center_index(images.len()),
        }))
    }

    /// Stitch an ordered image sequence into one panorama.
    ///
    /// Returns `Ok(None)` for an empty sequence, without calling any collaborator.
    pub fn stitch(&self, images: &[Image<u8, 3>]) -> Result<Option<Image<u8, 3>>, StitchError> {
        let Some(alignment) = self.align(images)? else {
            return Ok(None);
        };

        let panorama = Compositor::new(&self.warper).composite(
            images,
            &alignment.transforms,
            alignment.canvas_size,
            alignment.center,
        )?;

        Ok(Some(panorama))
    }

    /// Read the images at `inputs`, stitch them and write the panorama to `output`.
    ///
    /// The panorama is halved with a Gaussian pyramid until it fits `display_max`. Nothing is
    /// written when there is no input or when any stage fails.
    ///
    /// # Returns
    ///
    /// The size of the written image, or `None` when there was nothing to stitch.
    pub fn stitch_files(
        &self,
        inputs: &[impl AsRef<Path>],
        output: impl AsRef<Path>,
    ) -> Result<Option<ImageSize>, StitchError> {
        let images = inputs
            .iter()
            .map(|path| read_image_any_rgb8(path))
            .collect::<Result<Vec<_>, _>>()?;

        let Some(panorama) = self.stitch(&images)? else {
            log::info!("no input images, nothing written");
            return Ok(None);
        };

        let full_size = panorama.size();
        let panorama = pyrdown_to_fit(panorama, self.config.display_max)?;
        if panorama.size() != full_size {
            log::info!("downscaled panorama from {} to {}", full_size, panorama.size());
        }

        write_image_rgb8(output.as_ref(), &panorama)?;
        log::info!("wrote {}", output.as_ref().display());

        Ok(Some(panorama.size()))
    }
}
