#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Canvas extent of a set of projected images.
pub mod bounds;

/// Chaining of pairwise homographies along the image sequence.
pub mod chain;

/// Merging of warped layers into one panorama.
pub mod compositor;

/// Pipeline configuration.
pub mod config;

/// Error types for the stitching pipeline.
pub mod error;

/// End to end stitching of image sequences and files.
pub mod pipeline;

/// Re-basing of a transform chain on its middle image.
pub mod recenter;

/// Collaborator traits and their default implementations.
///
/// The pipeline only talks to feature matching, homography estimation and warping through
/// [`services::FeatureMatcher`], [`services::HomographyEstimator`] and
/// [`services::ImageWarper`], so any of them can be swapped out.
pub mod services;

/// Homographies tagged with their source and destination frames.
pub mod transform;

pub use bounds::CanvasBounds;
pub use chain::{select_good_matches, GoodMatches, TransformChainBuilder};
pub use compositor::{overwrite_non_background, Compositor};
pub use config::StitchConfig;
pub use error::StitchError;
pub use pipeline::{Alignment, Stitcher};
pub use recenter::{center_index, recenter};
pub use services::{
    Correspondence, FastBriefMatcher, FeatureMatcher, HomographyEstimator, ImageWarper,
    PerspectiveWarper, RansacHomographyEstimator,
};
pub use transform::{Frame, Transform, TransformSet};
