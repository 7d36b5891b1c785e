use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use pano_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels covered by this size, or `None` if it overflows `usize`.
    pub fn area(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

impl From<ImageSize> for [u32; 2] {
    fn from(size: ImageSize) -> Self {
        [size.width as u32, size.height as u32]
    }
}

/// Trait for image data types.
///
/// Send and Sync is required for the rayon based row iterators.
pub trait ImageDtype: Copy + Default + PartialEq + Into<f32> + Send + Sync {
    /// Convert a f32 value to the image data type.
    fn from_f32(x: f32) -> Self;
}

impl ImageDtype for f32 {
    fn from_f32(x: f32) -> Self {
        x
    }
}

impl ImageDtype for u8 {
    fn from_f32(x: f32) -> Self {
        x.round().clamp(0.0, 255.0) as u8
    }
}

/// Represents an image with pixel data.
///
/// The pixels are stored row-major and interleaved, i.e. with shape (H, W, C), where H is the
/// height of the image, W the width and C the number of channels.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use pano_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 3>::new(
    ///    ImageSize {
    ///       width: 10,
    ///       height: 20,
    ///    },
    ///    vec![0u8; 10 * 20 * 3],
    /// ).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        let len = Self::data_len(size)?;
        if data.len() != len {
            return Err(ImageError::InvalidChannelShape(data.len(), len));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with the given size and default pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `val` - The default value of the pixel data.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ImageTooLarge`] if the number of elements overflows `usize`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pano_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 3>::from_size_val(
    ///   ImageSize {
    ///     width: 10,
    ///     height: 20,
    ///   }, 0u8).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        let data = vec![val; Self::data_len(size)?];
        Image::new(size, data)
    }

    /// Create a new image by evaluating `f(x, y)` for every pixel.
    ///
    /// # Examples
    ///
    /// ```
    /// use pano_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 1>::from_fn([3, 2].into(), |x, y| [(x + 10 * y) as u8]).unwrap();
    ///
    /// assert_eq!(image.as_slice(), &[0, 1, 2, 10, 11, 12]);
    /// ```
    pub fn from_fn(
        size: ImageSize,
        mut f: impl FnMut(usize, usize) -> [T; CHANNELS],
    ) -> Result<Self, ImageError> {
        let mut data = Vec::with_capacity(Self::data_len(size)?);
        for y in 0..size.height {
            for x in 0..size.width {
                data.extend(f(x, y));
            }
        }
        Image::new(size, data)
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of columns of the image.
    pub fn cols(&self) -> usize {
        self.size.width
    }

    /// Get the number of rows of the image.
    pub fn rows(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// Get the pixel data of the image as a flat slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get the pixel data of the image as a mutable flat slice.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the image and return its pixel data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Get all the channels of a pixel.
    ///
    /// # Errors
    ///
    /// If the pixel coordinates are out of bounds, an error is returned.
    pub fn pixel(&self, x: usize, y: usize) -> Result<&[T], ImageError> {
        if x >= self.width() || y >= self.height() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }
        let base = (y * self.width() + x) * CHANNELS;
        Ok(&self.data[base..base + CHANNELS])
    }

    /// Get a single channel value of a pixel.
    ///
    /// # Errors
    ///
    /// If the pixel coordinates or the channel are out of bounds, an error is returned.
    pub fn get_pixel(&self, x: usize, y: usize, ch: usize) -> Result<&T, ImageError> {
        if ch >= CHANNELS {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, CHANNELS));
        }
        Ok(&self.pixel(x, y)?[ch])
    }

    /// Set a single channel value of a pixel.
    ///
    /// # Errors
    ///
    /// If the pixel coordinates or the channel are out of bounds, an error is returned.
    pub fn set_pixel(&mut self, x: usize, y: usize, ch: usize, val: T) -> Result<(), ImageError> {
        if ch >= CHANNELS {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, CHANNELS));
        }
        if x >= self.width() || y >= self.height() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }
        let idx = (y * self.width() + x) * CHANNELS + ch;
        self.data[idx] = val;
        Ok(())
    }

    /// Number of elements of an image of `size`.
    fn data_len(size: ImageSize) -> Result<usize, ImageError> {
        let len = size.area().and_then(|area| area.checked_mul(CHANNELS));
        len.ok_or(ImageError::ImageTooLarge(size.width, size.height))
    }
}

#[cfg(test)]
mod tests {
    use super::{Image, ImageSize};
    use crate::ImageError;

    #[test]
    fn image_size() {
        let image_size = ImageSize {
            width: 10,
            height: 20,
        };
        assert_eq!(image_size.width, 10);
        assert_eq!(image_size.height, 20);
        assert_eq!(image_size.area(), Some(200));
    }

    #[test]
    fn image_smoke() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 10,
                height: 20,
            },
            vec![0u8; 10 * 20 * 3],
        )?;
        assert_eq!(image.size().width, 10);
        assert_eq!(image.size().height, 20);
        assert_eq!(image.num_channels(), 3);
        Ok(())
    }

    #[test]
    fn image_invalid_shape() {
        let result = Image::<u8, 3>::new([2, 2].into(), vec![0u8; 11]);
        assert_eq!(result, Err(ImageError::InvalidChannelShape(11, 12)));
    }

    #[test]
    fn image_pixel_access() -> Result<(), ImageError> {
        let mut image = Image::<u8, 3>::from_size_val([3, 2].into(), 0)?;
        image.set_pixel(2, 1, 1, 42)?;
        assert_eq!(*image.get_pixel(2, 1, 1)?, 42);
        assert_eq!(image.pixel(2, 1)?, &[0, 42, 0]);
        assert!(image.get_pixel(3, 0, 0).is_err());
        assert!(image.get_pixel(0, 0, 3).is_err());
        Ok(())
    }

    #[test]
    fn image_too_large() {
        let size = ImageSize {
            width: usize::MAX / 2,
            height: 3,
        };
        assert_eq!(size.area(), None);
        assert_eq!(
            Image::<u8, 3>::from_size_val(size, 0),
            Err(ImageError::ImageTooLarge(usize::MAX / 2, 3))
        );

        // the pixel count fits but not the element count
        let size = ImageSize {
            width: usize::MAX / 4,
            height: 2,
        };
        assert!(size.area().is_some());
        assert!(Image::<u8, 3>::from_fn(size, |_, _| [0; 3]).is_err());
    }
}
