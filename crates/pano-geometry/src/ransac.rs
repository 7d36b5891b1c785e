use rand::prelude::*;
use rand::SeedableRng;

use crate::error::GeometryError;
use crate::homography::{
    homography_4pt2d, homography_dlt, homography_reproj_error, MIN_HOMOGRAPHY_POINTS,
};
use crate::linalg::Mat33;

/// Parameters for RANSAC model estimation.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Maximum number of RANSAC iterations.
    pub max_iterations: usize,
    /// Inlier threshold in pixels (compared against the squared reprojection error).
    pub threshold: f64,
    /// Minimum number of inliers required for acceptance.
    pub min_inliers: usize,
    /// Optional RNG seed for deterministic runs.
    pub random_seed: Option<u64>,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            threshold: 3.0,
            min_inliers: MIN_HOMOGRAPHY_POINTS,
            random_seed: Some(0),
        }
    }
}

/// Result of a RANSAC model fit.
#[derive(Clone, Debug)]
pub struct RansacResult<M> {
    /// Estimated model.
    pub model: M,
    /// Per-point inlier mask.
    pub inliers: Vec<bool>,
    /// Total inlier count.
    pub inlier_count: usize,
    /// Sum of inlier errors (lower is better).
    pub score: f64,
}

fn score_homography(
    h: &Mat33,
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
    threshold_sq: f64,
) -> (Vec<bool>, usize, f64) {
    let mut inliers = vec![false; x1.len()];
    let mut count = 0usize;
    let mut score = 0.0f64;
    for (i, (p1, p2)) in x1.iter().zip(x2.iter()).enumerate() {
        let d = homography_reproj_error(h, p1, p2);
        if d <= threshold_sq {
            inliers[i] = true;
            count += 1;
            score += d;
        }
    }
    (inliers, count, score)
}

/// Estimate a homography with RANSAC using the 4-point solver.
///
/// The best hypothesis is refined with a normalized least-squares fit over its inliers.
///
/// # Arguments
///
/// * `x1` - The source 2d points.
/// * `x2` - The destination 2d points.
/// * `params` - The RANSAC parameters.
///
/// # Returns
///
/// The homography mapping `x1` onto `x2` together with its inlier set.
pub fn ransac_homography(
    x1: &[[f64; 2]],
    x2: &[[f64; 2]],
    params: &RansacParams,
) -> Result<RansacResult<Mat33>, GeometryError> {
    if x1.len() != x2.len() || x1.len() < MIN_HOMOGRAPHY_POINTS {
        return Err(GeometryError::InvalidInput {
            required: MIN_HOMOGRAPHY_POINTS,
            got: x1.len().min(x2.len()),
        });
    }

    let mut rng = match params.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => {
            let mut tr = rand::rng();
            StdRng::from_rng(&mut tr)
        }
    };

    let n = x1.len();
    let threshold_sq = params.threshold * params.threshold;
    let mut best_model = None;
    let mut best_inliers = Vec::new();
    let mut best_count = 0usize;
    let mut best_score = f64::INFINITY;

    for _ in 0..params.max_iterations {
        let sample = rand::seq::index::sample(&mut rng, n, MIN_HOMOGRAPHY_POINTS);
        let mut s1 = [[0.0; 2]; 4];
        let mut s2 = [[0.0; 2]; 4];
        for (i, idx) in sample.iter().enumerate() {
            s1[i] = x1[idx];
            s2[i] = x2[idx];
        }
        let h = match homography_4pt2d(&s1, &s2) {
            Ok(h) => h,
            Err(_) => continue,
        };

        let (inliers, count, score) = score_homography(&h, x1, x2, threshold_sq);

        if count > best_count || (count == best_count && score < best_score) {
            best_model = Some(h);
            best_inliers = inliers;
            best_count = count;
            best_score = score;
        }

        if best_count == n {
            break;
        }
    }

    let model = match best_model {
        Some(m) if best_count >= params.min_inliers.max(MIN_HOMOGRAPHY_POINTS) => m,
        _ => {
            return Err(GeometryError::RansacFailure {
                inliers: best_count,
                required: params.min_inliers.max(MIN_HOMOGRAPHY_POINTS),
            })
        }
    };

    // refine on the consensus set, keep the sample model if the refit does not improve it
    let (in1, in2): (Vec<[f64; 2]>, Vec<[f64; 2]>) = best_inliers
        .iter()
        .zip(x1.iter().zip(x2.iter()))
        .filter(|(&inlier, _)| inlier)
        .map(|(_, (p1, p2))| (*p1, *p2))
        .unzip();

    match homography_dlt(&in1, &in2) {
        Ok(refined) => {
            let (inliers, count, score) = score_homography(&refined, x1, x2, threshold_sq);
            if count >= best_count {
                return Ok(RansacResult {
                    model: refined,
                    inliers,
                    inlier_count: count,
                    score,
                });
            }
            log::debug!("ransac refit lost inliers ({count} < {best_count}), keeping sample model");
        }
        Err(err) => log::debug!("ransac refit failed: {err}"),
    }

    Ok(RansacResult {
        model,
        inliers: best_inliers,
        inlier_count: best_count,
        score: best_score,
    })
}
