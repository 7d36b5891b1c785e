//! Geometric image transformations using perspective warps.
//!
//! A perspective transform (homography) is given as a row-major 3x3 matrix mapping source
//! pixel coordinates into destination pixel coordinates.

mod perspective;

pub use perspective::{inverse_perspective_matrix, transform_point, warp_perspective};
