use crate::error::GeometryError;
use crate::linalg::{self, Mat33};

/// Minimum number of correspondences that determine a homography.
pub const MIN_HOMOGRAPHY_POINTS: usize = 4;

/// Fill the two DLT rows of point pair `i` into `mat_a`.
fn write_dlt_rows(mat_a: &mut faer::Mat<f64>, i: usize, x1: &[f64; 2], x2: &[f64; 2]) {
    mat_a[(2 * i, 0)] = x1[0];
    mat_a[(2 * i, 1)] = x1[1];
    mat_a[(2 * i, 2)] = 1.0;
    mat_a[(2 * i, 6)] = -x2[0] * x1[0];
    mat_a[(2 * i, 7)] = -x2[0] * x1[1];
    mat_a[(2 * i, 8)] = -x2[0];

    mat_a[(2 * i + 1, 3)] = x1[0];
    mat_a[(2 * i + 1, 4)] = x1[1];
    mat_a[(2 * i + 1, 5)] = 1.0;
    mat_a[(2 * i + 1, 6)] = -x2[1] * x1[0];
    mat_a[(2 * i + 1, 7)] = -x2[1] * x1[1];
    mat_a[(2 * i + 1, 8)] = -x2[1];
}

/// Solve `A h = 0` for the right singular vector of the smallest singular value.
///
/// Fails when the null space has more than one dimension, i.e. the points do not constrain
/// the eight degrees of freedom (collinear or repeated points).
fn solve_nullspace(mat_a: &faer::Mat<f64>) -> Result<Mat33, GeometryError> {
    let svd = mat_a.svd();

    // singular values come sorted in non-increasing order
    let s = svd.s_diagonal();
    if s[7] <= 1e-9 * s[0] {
        return Err(GeometryError::Degenerate("points do not constrain a homography"));
    }

    let h = svd.v().col(8);
    Ok([
        [h[0], h[1], h[2]],
        [h[3], h[4], h[5]],
        [h[6], h[7], h[8]],
    ])
}

/// Compute the homography matrix from four 2d point correspondences.
///
/// * `x1` - The source 2d points with shape (4, 2).
/// * `x2` - The destination 2d points with shape (4, 2).
///
/// # Returns
///
/// The homography matrix from src to dst, normalized so that `h[2][2] == 1`.
///
/// # Errors
///
/// Fails when the four points are degenerate and the solution is singular.
pub fn homography_4pt2d(x1: &[[f64; 2]; 4], x2: &[[f64; 2]; 4]) -> Result<Mat33, GeometryError> {
    // 8x9 system padded to 9x9 so the svd returns a full right basis
    let mut mat_a = faer::Mat::<f64>::zeros(9, 9);
    for i in 0..4 {
        write_dlt_rows(&mut mat_a, i, &x1[i], &x2[i]);
    }

    let mut homo = solve_nullspace(&mat_a)?;
    linalg::normalize_mat33_inplace(&mut homo);

    let det = linalg::det_mat33(&homo);
    if !det.is_finite() || det.abs() < 1e-8 {
        return Err(GeometryError::Degenerate("det is too small"));
    }

    Ok(homo)
}

/// Similarity transform that moves the centroid to the origin with mean distance sqrt(2).
fn normalization_transform(points: &[[f64; 2]]) -> Result<Mat33, GeometryError> {
    let n = points.len() as f64;
    let (cx, cy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    let (cx, cy) = (cx / n, cy / n);

    let mean_dist = points
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    if mean_dist < f64::EPSILON {
        return Err(GeometryError::Degenerate("all points coincide"));
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    Ok([[s, 0.0, -s * cx], [0.0, s, -s * cy], [0.0, 0.0, 1.0]])
}

/// Compute the least-squares homography from N >= 4 point correspondences.
///
/// Uses the normalized direct linear transform: both point sets are conditioned with a
/// similarity transform before solving, and the result is denormalized afterwards.
///
/// * `x1` - The source 2d points.
/// * `x2` - The destination 2d points.
///
/// # Returns
///
/// The homography matrix from src to dst, normalized so that `h[2][2] == 1`.
///
/// # Example
///
/// ```
/// use pano_geometry::homography::homography_dlt;
///
/// let x1 = [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0], [5.0, 3.0]];
/// let x2: Vec<[f64; 2]> = x1.iter().map(|p| [p[0] + 80.0, p[1]]).collect();
///
/// let h = homography_dlt(&x1, &x2).unwrap();
/// assert!((h[0][2] - 80.0).abs() < 1e-6);
/// assert!(h[1][2].abs() < 1e-6);
/// ```
pub fn homography_dlt(x1: &[[f64; 2]], x2: &[[f64; 2]]) -> Result<Mat33, GeometryError> {
    if x1.len() != x2.len() || x1.len() < MIN_HOMOGRAPHY_POINTS {
        return Err(GeometryError::InvalidInput {
            required: MIN_HOMOGRAPHY_POINTS,
            got: x1.len().min(x2.len()),
        });
    }

    let t1 = normalization_transform(x1)?;
    let t2 = normalization_transform(x2)?;

    // pad to at least 9 rows so the svd returns a full right basis
    let rows = (2 * x1.len()).max(9);
    let mut mat_a = faer::Mat::<f64>::zeros(rows, 9);
    for (i, (p1, p2)) in x1.iter().zip(x2.iter()).enumerate() {
        let n1 = linalg::transform_point2d(&t1, p1);
        let n2 = linalg::transform_point2d(&t2, p2);
        write_dlt_rows(&mut mat_a, i, &n1, &n2);
    }

    let homo_n = solve_nullspace(&mat_a)?;

    // H = T2^-1 * Hn * T1
    let t2_inv = linalg::inverse_mat33(&t2)?;
    let mut homo = linalg::matmul33(&t2_inv, &linalg::matmul33(&homo_n, &t1));

    if homo[2][2].abs() < f64::EPSILON {
        return Err(GeometryError::Degenerate("homography maps the origin to infinity"));
    }
    linalg::normalize_mat33_inplace(&mut homo);

    let det = linalg::det_mat33(&homo);
    if !det.is_finite() || det.abs() < 1e-12 {
        return Err(GeometryError::Degenerate("det is too small"));
    }

    Ok(homo)
}

/// Squared forward reprojection error `|H x1 - x2|^2` of a correspondence.
pub fn homography_reproj_error(h: &Mat33, x1: &[f64; 2], x2: &[f64; 2]) -> f64 {
    let p = linalg::transform_point2d(h, x1);
    let err = (p[0] - x2[0]).powi(2) + (p[1] - x2[1]).powi(2);
    if err.is_finite() {
        err
    } else {
        f64::INFINITY
    }
}
