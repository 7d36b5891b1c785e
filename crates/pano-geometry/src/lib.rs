#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the geometry module.
pub mod error;

/// Homography solvers from point correspondences.
pub mod homography;

/// Linear algebra utilities on 3x3 matrices.
pub mod linalg;

/// Robust model fitting with RANSAC.
pub mod ransac;

pub use error::GeometryError;
