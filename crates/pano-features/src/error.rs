use pano_image::ImageError;

/// An error type for feature detection and description.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FeatureError {
    /// The FAST arc length must lie in 1..=16.
    #[error("Invalid FAST arc length {0}, expected a value in 1..=16")]
    InvalidArcLength(u8),

    /// The descriptor patch does not fit the sampling pattern.
    #[error("Invalid descriptor patch size {0}, expected an odd value of at least 5")]
    InvalidPatchSize(usize),

    /// Error from the underlying image operations.
    #[error(transparent)]
    Image(#[from] ImageError),
}
