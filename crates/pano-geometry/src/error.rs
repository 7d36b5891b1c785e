/// Errors returned by the geometry solvers.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GeometryError {
    /// Input correspondences are invalid or insufficient.
    #[error("Need at least {required} correspondences with equal lengths, got {got}")]
    InvalidInput {
        /// Minimum required correspondences for the model.
        required: usize,
        /// Number of correspondences provided.
        got: usize,
    },

    /// The points are degenerate (e.g. collinear) and do not define a model.
    #[error("Degenerate configuration: {0}")]
    Degenerate(&'static str),

    /// The matrix is singular and cannot be inverted.
    #[error("Matrix is singular (det = {0:e})")]
    SingularMatrix(f64),

    /// RANSAC failed to find a valid model.
    #[error("RANSAC failed to find a valid model ({inliers} inliers, {required} required)")]
    RansacFailure {
        /// Best inlier count found.
        inliers: usize,
        /// Minimum inlier count required.
        required: usize,
    },
}
