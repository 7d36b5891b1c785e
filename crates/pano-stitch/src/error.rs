use pano_features::FeatureError;
use pano_geometry::GeometryError;
use pano_image::ImageError;
use pano_io::IoError;

/// An error type for the stitching pipeline.
#[derive(thiserror::Error, Debug)]
pub enum StitchError {
    /// No correspondences at all between two adjacent images.
    #[error("No correspondences found between image {previous} and image {current}")]
    AlignmentFailure {
        /// Index of the earlier image of the pair.
        previous: usize,
        /// Index of the later image of the pair.
        current: usize,
    },

    /// Not enough correspondences to fit a homography, whatever the threshold.
    #[error("Only {found} usable correspondences between images {pair:?}, at least 4 are required")]
    InsufficientCorrespondences {
        /// Indices of the adjacent image pair.
        pair: (usize, usize),
        /// Number of usable correspondences.
        found: usize,
    },

    /// The reference transform cannot be inverted.
    #[error("Transform of image {index} is singular")]
    SingularTransform {
        /// Index of the image whose transform is singular.
        index: usize,
    },

    /// An image corner is projected to infinity.
    #[error("Transform of image {index} maps the image to an unbounded region")]
    UnboundedCanvas {
        /// Index of the offending image.
        index: usize,
    },

    /// The canvas would hold more pixels than allowed.
    #[error("Canvas of {width:.1}x{height:.1} exceeds the limit of {max_pixels} pixels")]
    CanvasTooLarge {
        /// Projected width of the canvas.
        width: f64,
        /// Projected height of the canvas.
        height: f64,
        /// Largest allowed number of canvas pixels.
        max_pixels: usize,
    },

    /// The number of transforms does not match the number of images.
    #[error("Got {transforms} transforms for {images} images")]
    TransformCountMismatch {
        /// Number of images.
        images: usize,
        /// Number of transforms.
        transforms: usize,
    },

    /// Error reading or writing images.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Error from the image containers or image processing.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error from feature detection.
    #[error(transparent)]
    Features(#[from] FeatureError),

    /// Error from homography estimation.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Invalid or unreadable configuration.
    #[error("Invalid configuration. {0}")]
    Config(String),
}
