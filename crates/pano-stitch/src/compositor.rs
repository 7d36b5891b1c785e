use pano_image::{Image, ImageDtype, ImageError, ImageSize};
use rayon::prelude::*;

use crate::error::StitchError;
use crate::services::ImageWarper;
use crate::transform::{Frame, Transform};

/// Copy every pixel of `layer` that is not background into `base`.
///
/// A pixel is background when all its channels are zero.
///
/// # Arguments
///
/// * `base` - The image to write into.
/// * `layer` - The layer to take non-background pixels from, same size as `base`.
pub fn overwrite_non_background<T: ImageDtype, const C: usize>(
    base: &mut Image<T, C>,
    layer: &Image<T, C>,
) -> Result<(), ImageError> {
    if base.size() != layer.size() {
        return Err(ImageError::InvalidImageSize(
            layer.width(),
            layer.height(),
            base.width(),
            base.height(),
        ));
    }

    let background = T::default();
    base.as_slice_mut()
        .par_chunks_exact_mut(C)
        .zip(layer.as_slice().par_chunks_exact(C))
        .for_each(|(dst, src)| {
            if src.iter().any(|&v| v != background) {
                dst.copy_from_slice(src);
            }
        });

    Ok(())
}

/// Warps every image into the canvas and merges the layers by overwriting.
pub struct Compositor<'a, W> {
    warper: &'a W,
}

impl<'a, W> Compositor<'a, W> {
    /// Create a compositor using `warper` to resample the images.
    pub fn new(warper: &'a W) -> Self {
        Self { warper }
    }

    /// Composite `images` into a canvas of `canvas_size`.
    ///
    /// The panorama starts as the warped layer of image `center`. Then every layer, the
    /// center one included, is written over it in input order, so where layers overlap the
    /// later image wins. Layers are warped one at a time.
    ///
    /// # Arguments
    ///
    /// * `images` - The source images.
    /// * `transforms` - One transform per image into the canvas frame.
    /// * `canvas_size` - The size of the panorama.
    /// * `center` - Index of the reference image.
    pub fn composite<T, const C: usize>(
        &self,
        images: &[Image<T, C>],
        transforms: &[Transform],
        canvas_size: ImageSize,
        center: usize,
    ) -> Result<Image<T, C>, StitchError>
    where
        T: ImageDtype,
        W: ImageWarper<T, C>,
    {
        if images.len() != transforms.len() {
            return Err(StitchError::TransformCountMismatch {
                images: images.len(),
                transforms: transforms.len(),
            });
        }
        if center >= images.len() {
            return Err(StitchError::Config(format!(
                "reference image {center} out of range for {} images",
                images.len()
            )));
        }
        debug_assert!(transforms.iter().all(|t| t.dst() == Frame::Canvas));

        let center_layer = self
            .warper
            .warp(&images[center], &transforms[center], canvas_size)?;
        let mut panorama = center_layer.clone();

        for (index, (image, transform)) in images.iter().zip(transforms.iter()).enumerate() {
            if index == center {
                overwrite_non_background(&mut panorama, &center_layer)?;
                continue;
            }
            let layer = self.warper.warp(image, transform, canvas_size)?;
            overwrite_non_background(&mut panorama, &layer)?;
            log::trace!("composited image {index}");
        }

        log::info!("composited {} images into {}", images.len(), canvas_size);
        Ok(panorama)
    }
}
