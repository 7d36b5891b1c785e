use rayon::prelude::*;

use pano_image::{Image, ImageDtype, ImageError};

/// Reflect an index into `[0, len)` mirroring around the border pixel (`dcb|abcd|cba`).
#[inline]
pub(crate) fn reflect_101(idx: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let len = len as isize;
    let mut idx = idx;
    while idx < 0 || idx >= len {
        if idx < 0 {
            idx = -idx;
        }
        if idx >= len {
            idx = 2 * len - 2 - idx;
        }
    }
    idx as usize
}

/// Apply a separable filter to an image.
///
/// The horizontal kernel is applied first, then the vertical one. Borders are reflected.
///
/// # Arguments
///
/// * `src` - The input image with shape (H, W, C).
/// * `dst` - The output image with shape (H, W, C).
/// * `kernel_x` - The horizontal kernel.
/// * `kernel_y` - The vertical kernel.
pub fn separable_filter<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let (cols, rows) = (src.cols(), src.rows());
    if cols == 0 || rows == 0 {
        return Ok(());
    }

    let half_x = (kernel_x.len() / 2) as isize;
    let half_y = (kernel_y.len() / 2) as isize;
    let src_data = src.as_slice();

    // horizontal pass
    let mut temp = vec![0.0f32; cols * rows * C];
    temp.par_chunks_exact_mut(cols * C)
        .enumerate()
        .for_each(|(y, temp_row)| {
            for x in 0..cols {
                for c in 0..C {
                    let mut sum = 0.0;
                    for (k, w) in kernel_x.iter().enumerate() {
                        let xs = reflect_101(x as isize + k as isize - half_x, cols);
                        let val: f32 = src_data[(y * cols + xs) * C + c].into();
                        sum += val * w;
                    }
                    temp_row[x * C + c] = sum;
                }
            }
        });

    // vertical pass
    dst.as_slice_mut()
        .par_chunks_exact_mut(cols * C)
        .enumerate()
        .for_each(|(y, dst_row)| {
            for x in 0..cols {
                for c in 0..C {
                    let mut sum = 0.0;
                    for (k, w) in kernel_y.iter().enumerate() {
                        let ys = reflect_101(y as isize + k as isize - half_y, rows);
                        sum += temp[(ys * cols + x) * C + c] * w;
                    }
                    dst_row[x * C + c] = T::from_f32(sum);
                }
            }
        });

    Ok(())
}

/// Blur an image with a square gaussian kernel.
///
/// # Arguments
///
/// * `src` - The input image with shape (H, W, C).
/// * `dst` - The output image with shape (H, W, C).
/// * `kernel_size` - The size of the kernel, should be odd.
/// * `sigma` - The sigma of the gaussian kernel.
pub fn gaussian_blur<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel_size: usize,
    sigma: f32,
) -> Result<(), ImageError> {
    let kernel = super::gaussian_kernel_1d(kernel_size, sigma);
    separable_filter(src, dst, &kernel, &kernel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_101_borders() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(3, 5), 3);
        assert_eq!(reflect_101(-3, 1), 0);
    }

    #[test]
    fn blur_constant_image_is_constant() -> Result<(), ImageError> {
        let src = Image::<u8, 3>::from_size_val([6, 4].into(), 77)?;
        let mut dst = Image::<u8, 3>::from_size_val(src.size(), 0)?;
        gaussian_blur(&src, &mut dst, 5, 1.5)?;
        assert!(dst.as_slice().iter().all(|&v| v == 77));
        Ok(())
    }

    #[test]
    fn blur_spreads_impulse() -> Result<(), ImageError> {
        let mut src = Image::<f32, 1>::from_size_val([5, 5].into(), 0.0)?;
        src.set_pixel(2, 2, 0, 1.0)?;
        let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
        let kernel = super::super::pyramid_kernel_1d();
        separable_filter(&src, &mut dst, &kernel, &kernel)?;
        let center = *dst.get_pixel(2, 2, 0)?;
        assert!((center - 36.0 / 256.0).abs() < 1e-6);
        let total: f32 = dst.as_slice().iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        Ok(())
    }
}
