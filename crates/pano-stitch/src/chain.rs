use pano_image::Image;

use crate::config::StitchConfig;
use crate::error::StitchError;
use crate::services::{Correspondence, FeatureMatcher, HomographyEstimator};
use crate::transform::{Frame, Transform, TransformSet};

/// Correspondences kept by the good-match filter.
#[derive(Clone, Debug, PartialEq)]
pub struct GoodMatches {
    /// The kept correspondences, in input order.
    pub selected: Vec<Correspondence>,
    /// Distance threshold that selected them.
    pub threshold: f64,
    /// How many times the threshold had to be relaxed.
    pub relax_steps: usize,
}

/// Keep the correspondences whose distance is below `distance_ratio` times the minimum.
///
/// The minimum distance is capped at `good_distance`. While fewer than `min_correspondences`
/// pass, the minimum is increased by `relax_step` and the filter is run again. The number of
/// relaxation steps is solved for directly from the `min_correspondences`-th smallest distance,
/// so the filter runs once whatever the distance scale or step size.
///
/// Returns `None` when fewer than `min_correspondences` have a finite distance, since no
/// threshold can then ever select enough of them, or when the step cannot relax the threshold.
pub fn select_good_matches(
    correspondences: &[Correspondence],
    config: &StitchConfig,
) -> Option<GoodMatches> {
    let required = config.min_correspondences.max(1);
    let mut finite: Vec<f64> = correspondences
        .iter()
        .map(|c| c.distance)
        .filter(|d| d.is_finite())
        .collect();
    if finite.len() < required {
        return None;
    }
    finite.sort_by(f64::total_cmp);

    let seed = finite[0].min(config.good_distance);
    // the threshold must end strictly above this distance
    let kth = finite[required - 1];
    let ratio = config.distance_ratio;
    let step = config.relax_step;

    let mut steps = 0.0;
    if !(ratio * seed > kth) {
        if !(step > 0.0) {
            return None;
        }
        steps = ((kth / ratio - seed) / step).floor().max(-1.0) + 1.0;
    }

    let mut threshold = ratio * (seed + steps * step);
    for _ in 0..2 {
        if threshold > kth {
            break;
        }
        steps += 1.0;
        threshold = ratio * (seed + steps * step);
    }
    if !(threshold > kth) {
        // the step is below the precision of the distances
        threshold = next_above(kth);
    }

    let selected: Vec<Correspondence> = correspondences
        .iter()
        .filter(|c| c.distance < threshold)
        .copied()
        .collect();
    if selected.len() < required {
        return None;
    }

    Some(GoodMatches {
        selected,
        threshold,
        relax_steps: steps as usize,
    })
}

/// Smallest float strictly greater than a finite `x`.
fn next_above(x: f64) -> f64 {
    if x == 0.0 {
        f64::from_bits(1)
    } else if x > 0.0 {
        f64::from_bits(x.to_bits() + 1)
    } else {
        f64::from_bits(x.to_bits() - 1)
    }
}

/// Features of one image together with its index in the sequence.
struct FrameFeatures<F> {
    index: usize,
    features: F,
}

/// Chains pairwise homographies so that every image is expressed in the first image's frame.
pub struct TransformChainBuilder<'a, M, E> {
    matcher: &'a M,
    estimator: &'a E,
    config: &'a StitchConfig,
}

impl<'a, M, E> TransformChainBuilder<'a, M, E>
where
    M: FeatureMatcher,
    E: HomographyEstimator,
{
    /// Create a builder from its collaborators.
    pub fn new(matcher: &'a M, estimator: &'a E, config: &'a StitchConfig) -> Self {
        Self {
            matcher,
            estimator,
            config,
        }
    }

    /// Build one cumulative transform per image, each mapping into `Frame::Image(0)`.
    ///
    /// An empty sequence yields an empty set without calling any collaborator, as does the
    /// feature extraction of a lone image.
    ///
    /// # Errors
    ///
    /// Fails with [`StitchError::AlignmentFailure`] when an adjacent pair has no
    /// correspondences, with [`StitchError::InsufficientCorrespondences`] when fewer than
    /// four of them are usable, and with the estimator's error when no homography fits.
    pub fn build(&self, images: &[Image<u8, 3>]) -> Result<TransformSet, StitchError> {
        let Some(first) = images.first() else {
            return Ok(Vec::new());
        };

        let mut transforms = vec![Transform::identity(Frame::Image(0))];
        if images.len() == 1 {
            return Ok(transforms);
        }

        let mut previous = FrameFeatures {
            index: 0,
            features: self.matcher.detect_and_describe(first)?,
        };

        for (index, image) in images.iter().enumerate().skip(1) {
            let current = FrameFeatures {
                index,
                features: self.matcher.detect_and_describe(image)?,
            };

            let pairwise = self.pairwise_transform(&previous, &current)?;
            let cumulative = transforms[index - 1].compose(&pairwise);
            log::debug!("image {index} -> image 0: {:?}", cumulative.matrix());
            transforms.push(cumulative);

            previous = current;
        }

        log::info!("chained {} transforms", transforms.len());
        Ok(transforms)
    }

    /// Homography mapping the current image onto the previous one.
    fn pairwise_transform(
        &self,
        previous: &FrameFeatures<M::Features>,
        current: &FrameFeatures<M::Features>,
    ) -> Result<Transform, StitchError> {
        let pair = (previous.index, current.index);

        let correspondences = self
            .matcher
            .match_features(&previous.features, &current.features)?;
        if correspondences.is_empty() {
            return Err(StitchError::AlignmentFailure {
                previous: previous.index,
                current: current.index,
            });
        }

        let good = select_good_matches(&correspondences, self.config).ok_or_else(|| {
            StitchError::InsufficientCorrespondences {
                pair,
                found: correspondences.len(),
            }
        })?;

        if good.relax_steps > 0 {
            log::warn!(
                "images {pair:?}: relaxed the match threshold {} times to {:.4}",
                good.relax_steps,
                good.threshold
            );
        }
        log::debug!(
            "images {pair:?}: {} of {} correspondences kept",
            good.selected.len(),
            correspondences.len()
        );

        let (src, dst): (Vec<[f64; 2]>, Vec<[f64; 2]>) = good
            .selected
            .iter()
            .map(|c| (c.current, c.previous))
            .unzip();

        let matrix = self.estimator.estimate(&src, &dst)?;

        Ok(Transform::new(
            matrix,
            Frame::Image(current.index),
            Frame::Image(previous.index),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_distances(distances: &[f64]) -> Vec<Correspondence> {
        distances
            .iter()
            .enumerate()
            .map(|(i, &distance)| Correspondence {
                previous: [i as f64, 0.0],
                current: [i as f64, 1.0],
                distance,
            })
            .collect()
    }

    #[test]
    fn select_without_relaxing() {
        let config = StitchConfig::default();
        // min 0.01, threshold 0.03
        let c = with_distances(&[0.01, 0.02, 0.025, 0.029, 0.03, 0.5]);
        let good = select_good_matches(&c, &config).expect("enough matches");
        assert_eq!(good.relax_steps, 0);
        assert_eq!(good.selected.len(), 4);
        assert!(good.selected.iter().all(|m| m.distance < 0.03));
    }

    #[test]
    fn select_uses_true_minimum() {
        let config = StitchConfig::default();
        // the smallest distance is not the first nor the last entry
        let c = with_distances(&[0.009, 0.004, 0.011, 0.0115, 0.2]);
        let good = select_good_matches(&c, &config).expect("enough matches");
        assert_eq!(good.relax_steps, 0);
        assert!((good.threshold - 0.012).abs() < 1e-12);
        assert_eq!(good.selected.len(), 4);
    }

    #[test]
    fn select_caps_minimum_at_good_distance() {
        let config = StitchConfig::default();
        // min 0.3 is capped to 0.02, then relaxed in steps of 0.01 until 3 * seed > 0.325
        let c = with_distances(&[0.3, 0.31, 0.32, 0.325]);
        let good = select_good_matches(&c, &config).expect("enough matches");
        assert_eq!(good.selected.len(), 4);
        assert_eq!(good.relax_steps, 9);
    }

    #[test]
    fn select_terminates_with_four_entries() {
        let config = StitchConfig::default();
        let c = with_distances(&[0.0, 0.9, 0.95, 1.0]);
        let good = select_good_matches(&c, &config).expect("enough matches");
        assert_eq!(good.selected.len(), 4);
        assert!(good.threshold > 1.0);
        assert!(good.relax_steps <= 34);
    }

    #[test]
    fn select_too_few() {
        let config = StitchConfig::default();
        assert!(select_good_matches(&with_distances(&[0.0, 0.0, 0.0]), &config).is_none());
        assert!(
            select_good_matches(&with_distances(&[0.0, 0.0, 0.0, f64::NAN]), &config).is_none()
        );
    }

    #[test]
    fn select_large_distances() {
        let config = StitchConfig::default();
        // about 4e10 relaxation steps of 0.01
        let c = with_distances(&[1.0e9, 1.1e9, 1.2e9, 1.3e9, 5.0e9]);
        let good = select_good_matches(&c, &config).expect("enough matches");
        assert_eq!(good.selected.len(), 4);
        assert!(good.threshold > 1.3e9);
        assert!(good.threshold < 5.0e9);
        assert!(good.relax_steps as f64 > 4.0e10);
    }

    #[test]
    fn select_step_below_precision() {
        let config = StitchConfig {
            relax_step: 1e-20,
            ..Default::default()
        };
        let c = with_distances(&[0.5, 0.75, 0.9, 1.0, 2.0]);
        let good = select_good_matches(&c, &config).expect("enough matches");
        assert_eq!(good.selected.len(), 4);
        assert!(good.threshold > 1.0);
        assert!(good.threshold < 2.0);
    }

    #[test]
    fn select_zero_step_cannot_relax() {
        let config = StitchConfig {
            relax_step: 0.0,
            ..Default::default()
        };
        let c = with_distances(&[0.5, 0.75, 0.9, 1.0]);
        assert!(select_good_matches(&c, &config).is_none());

        // no relaxation needed
        let c = with_distances(&[0.01, 0.01, 0.02, 0.025]);
        assert!(select_good_matches(&c, &config).is_some());
    }
}
