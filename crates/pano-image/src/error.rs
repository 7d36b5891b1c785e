/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the image size is not valid.
    #[error("Invalid image size ({0}, {1}) expected ({2}, {3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when the image has no pixels.
    #[error("Image size must be non-zero, got {0}x{1}")]
    EmptyImage(usize, usize),

    /// Error when the pixel coordinates are out of bounds.
    #[error("Pixel coordinates ({0}, {1}) are out of bounds ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when the channel index is out of bounds.
    #[error("Channel index {0} is out of bounds {1}")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when the determinant of a transform is zero.
    #[error("Cannot compute the determinant of the transform")]
    CannotComputeDeterminant,

    /// Error when the number of elements of an image overflows `usize`.
    #[error("Image size {0}x{1} is too large to allocate")]
    ImageTooLarge(usize, usize),
}
