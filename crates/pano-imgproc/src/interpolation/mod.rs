//! Pixel interpolation methods for image transformations.
//!
//! - **Nearest**: Fastest, uses nearest pixel value (no interpolation)
//! - **Bilinear**: Smooth linear interpolation between adjacent pixels

mod bilinear;
mod interpolate;
mod nearest;

pub use interpolate::{interpolate_pixel, InterpolationMode};
