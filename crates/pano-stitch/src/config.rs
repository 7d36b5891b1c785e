use std::path::Path;

use pano_features::FeatureParams;
use pano_geometry::{homography::MIN_HOMOGRAPHY_POINTS, ransac::RansacParams};
use pano_image::ImageSize;
use serde::{Deserialize, Serialize};

use crate::error::StitchError;

/// Tunable parameters of the stitching pipeline.
///
/// Every field has a default, so a JSON file only needs the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    /// Ceiling for the minimum correspondence distance used to seed the good-match filter.
    pub good_distance: f64,
    /// Correspondences closer than `distance_ratio` times the minimum distance are kept.
    pub distance_ratio: f64,
    /// Increment added to the minimum distance each time the filter selects too few matches.
    pub relax_step: f64,
    /// Number of good matches the filter must reach.
    pub min_correspondences: usize,
    /// Robust homography estimation parameters.
    pub ransac: RansacParams,
    /// Feature detection and matching parameters.
    pub features: FeatureParams,
    /// The written panorama is halved until it fits in this size.
    pub display_max: ImageSize,
    /// Largest canvas, in pixels, the compositor may allocate.
    pub max_canvas_pixels: usize,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            good_distance: 0.02,
            distance_ratio: 3.0,
            relax_step: 0.01,
            min_correspondences: MIN_HOMOGRAPHY_POINTS,
            ransac: RansacParams::default(),
            features: FeatureParams::default(),
            display_max: ImageSize {
                width: 1500,
                height: 700,
            },
            max_canvas_pixels: 100_000_000,
        }
    }
}

impl StitchConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StitchError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(pano_io::IoError::from)?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| StitchError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that would make the pipeline loop forever or never match.
    pub fn validate(&self) -> Result<(), StitchError> {
        if !(self.good_distance.is_finite() && self.good_distance >= 0.0) {
            return Err(StitchError::Config(format!(
                "good_distance must be finite and non-negative, got {}",
                self.good_distance
            )));
        }
        if !(self.distance_ratio.is_finite() && self.distance_ratio > 0.0) {
            return Err(StitchError::Config(format!(
                "distance_ratio must be positive, got {}",
                self.distance_ratio
            )));
        }
        if !(self.relax_step.is_finite() && self.relax_step > 0.0) {
            return Err(StitchError::Config(format!(
                "relax_step must be positive, got {}",
                self.relax_step
            )));
        }
        if self.min_correspondences < MIN_HOMOGRAPHY_POINTS {
            return Err(StitchError::Config(format!(
                "min_correspondences must be at least {MIN_HOMOGRAPHY_POINTS}, got {}",
                self.min_correspondences
            )));
        }
        if self.display_max.width == 0 || self.display_max.height == 0 {
            return Err(StitchError::Config(format!(
                "display_max must be non-empty, got {}",
                self.display_max
            )));
        }
        if self.max_canvas_pixels == 0 {
            return Err(StitchError::Config("max_canvas_pixels must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_is_valid() -> Result<(), StitchError> {
        let config = StitchConfig::default();
        config.validate()?;
        assert_eq!(config.good_distance, 0.02);
        assert_eq!(config.min_correspondences, 4);
        assert_eq!(config.display_max, [1500, 700].into());
        Ok(())
    }

    #[test]
    fn partial_json_takes_defaults() -> Result<(), StitchError> {
        let config: StitchConfig =
            serde_json::from_str(r#"{ "relax_step": 0.05, "ransac": { "threshold": 1.5 } }"#)
                .map_err(|e| StitchError::Config(e.to_string()))?;
        assert_eq!(config.relax_step, 0.05);
        assert_eq!(config.ransac.threshold, 1.5);
        assert_eq!(config.ransac.max_iterations, 2000);
        assert_eq!(config.distance_ratio, 3.0);
        assert_eq!(config.features, FeatureParams::default());
        Ok(())
    }

    #[test]
    fn invalid_values_rejected() {
        let config = StitchConfig {
            relax_step: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StitchError::Config(_))));

        let config = StitchConfig {
            min_correspondences: 3,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StitchError::Config(_))));

        let config = StitchConfig {
            max_canvas_pixels: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StitchError::Config(_))));
    }

    #[test]
    fn from_json_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{ "display_max": {{ "width": 800, "height": 600 }} }}"#)?;

        let config = StitchConfig::from_json_file(file.path())?;
        assert_eq!(config.display_max, [800, 600].into());
        assert_eq!(config.good_distance, 0.02);

        let mut bad = tempfile::NamedTempFile::new()?;
        write!(bad, r#"{{ "distance_ratio": -1.0 }}"#)?;
        assert!(matches!(
            StitchConfig::from_json_file(bad.path()),
            Err(StitchError::Config(_))
        ));
        Ok(())
    }
}
