#![deny(missing_docs)]
//! Feature detection, description and matching.
//!
//! This crate provides the pieces needed to find the same physical points across two
//! overlapping photographs:
//!
//! - **FAST**: Features from Accelerated Segment Test corner detection
//! - **BRIEF**: 256-bit binary descriptors from intensity comparisons
//! - **Matching**: brute-force Hamming nearest neighbours with optional filters

/// BRIEF binary descriptors.
pub mod brief;

/// Error types for the features module.
pub mod error;

/// Combined detection and description of an RGB image.
pub mod extractor;

/// FAST corner detector.
pub mod fast;

/// Descriptor matching.
pub mod matcher;

pub use brief::{hamming_distance, BriefPattern, Descriptor, DESCRIPTOR_BITS};
pub use error::FeatureError;
pub use extractor::{FastBriefExtractor, FeatureParams, Features};
pub use fast::{fast_feature_detector, Keypoint};
pub use matcher::{match_descriptors, DescriptorMatch};
