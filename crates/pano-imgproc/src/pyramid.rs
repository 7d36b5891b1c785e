use rayon::prelude::*;

use crate::filter::{pyramid_kernel_1d, separable_filter};
use pano_image::{Image, ImageDtype, ImageError, ImageSize};

/// Size of the image produced by one [`pyrdown`] step.
pub fn pyrdown_size(size: ImageSize) -> ImageSize {
    ImageSize {
        width: size.width.div_ceil(2),
        height: size.height.div_ceil(2),
    }
}

/// Blur an image with the 5x5 gaussian pyramid kernel and then downsample it by two.
///
/// The output keeps every even row and column of the blurred image, i.e. its size is
/// `((width + 1) / 2, (height + 1) / 2)`.
///
/// # Arguments
///
/// * `src` - The source image to be downsampled.
/// * `dst` - The destination image to store the result.
///
/// # Example
///
/// ```
/// use pano_image::{Image, ImageSize};
/// use pano_imgproc::pyramid::pyrdown;
///
/// let image = Image::<u8, 3>::from_size_val(
///     ImageSize {
///         width: 5,
///         height: 4,
///     },
///     10,
/// ).unwrap();
///
/// let mut downsampled = Image::<u8, 3>::from_size_val(
///     ImageSize {
///         width: 3,
///         height: 2,
///     },
///     0,
/// ).unwrap();
///
/// pyrdown(&image, &mut downsampled).unwrap();
/// assert!(downsampled.as_slice().iter().all(|&v| v == 10));
/// ```
pub fn pyrdown<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError> {
    let expected = pyrdown_size(src.size());
    if dst.size() != expected {
        return Err(ImageError::InvalidImageSize(
            dst.width(),
            dst.height(),
            expected.width,
            expected.height,
        ));
    }

    let kernel = pyramid_kernel_1d();
    let mut blurred = Image::<T, C>::from_size_val(src.size(), T::default())?;
    separable_filter(src, &mut blurred, &kernel, &kernel)?;

    let (src_cols, dst_cols) = (src.cols(), dst.cols());
    if dst_cols == 0 {
        return Ok(());
    }
    let blurred = blurred.as_slice();

    dst.as_slice_mut()
        .par_chunks_exact_mut(dst_cols * C)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let src_row = 2 * y * src_cols * C;
            for x in 0..dst_cols {
                let src_idx = src_row + 2 * x * C;
                dst_row[x * C..(x + 1) * C].copy_from_slice(&blurred[src_idx..src_idx + C]);
            }
        });

    Ok(())
}

/// Repeatedly apply [`pyrdown`] while the image is larger than `max_size` on either axis.
///
/// Returns the input unchanged when it already fits. A zero-sized `max_size` is rejected since
/// halving stops shrinking at one pixel.
pub fn pyrdown_to_fit<T: ImageDtype, const C: usize>(
    src: Image<T, C>,
    max_size: ImageSize,
) -> Result<Image<T, C>, ImageError> {
    if max_size.width == 0 || max_size.height == 0 {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            max_size.width,
            max_size.height,
        ));
    }
    let mut image = src;
    while image.width() > max_size.width || image.height() > max_size.height {
        let mut dst = Image::<T, C>::from_size_val(pyrdown_size(image.size()), T::default())?;
        pyrdown(&image, &mut dst)?;
        image = dst;
    }
    Ok(image)
}
