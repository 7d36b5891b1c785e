use std::path::Path;

use pano_image::{Image, ImageSize};

use crate::error::IoError;

/// Reads an image from the given file path as RGB8.
///
/// The method tries to read from any image format supported by the image crate and converts
/// grayscale or alpha images to three channels.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// An RGB8 image containing the image data.
pub fn read_image_any_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let file_path = file_path.as_ref();

    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let img = image::ImageReader::open(file_path)?
        .with_guessed_format()?
        .decode()?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    log::debug!("read {} from {}", size, file_path.display());

    Ok(Image::new(size, img.into_rgb8().into_raw())?)
}

/// Writes an RGB8 image to the given file path.
///
/// The encoder is chosen from the file extension, e.g. `png` or `jpg`.
///
/// # Arguments
///
/// * `file_path` - The destination path.
/// * `image` - The image to encode.
pub fn write_image_rgb8(file_path: impl AsRef<Path>, image: &Image<u8, 3>) -> Result<(), IoError> {
    let file_path = file_path.as_ref();

    let format = image::ImageFormat::from_path(file_path)
        .map_err(|_| IoError::InvalidFileExtension(file_path.to_path_buf()))?;

    let (width, height) = (image.width(), image.height());
    let (w, h) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(IoError::ImageTooLarge(width, height)),
    };

    let buffer = image::RgbImage::from_raw(w, h, image.as_slice().to_vec())
        .ok_or(IoError::ImageTooLarge(width, height))?;

    buffer.save_with_format(file_path, format)?;

    log::debug!("wrote {} to {}", image.size(), file_path.display());

    Ok(())
}
