use crate::error::GeometryError;

/// A row-major 3x3 matrix.
pub type Mat33 = [[f64; 3]; 3];

/// Determinants below this magnitude are treated as singular.
pub const SINGULAR_EPS: f64 = 1e-12;

/// The 3x3 identity matrix.
pub const IDENTITY: Mat33 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Build a pure translation matrix.
pub fn translation_mat33(tx: f64, ty: f64) -> Mat33 {
    [[1.0, 0.0, tx], [0.0, 1.0, ty], [0.0, 0.0, 1.0]]
}

/// Compute the determinant of a 3x3 matrix.
pub fn det_mat33(m: &Mat33) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Multiply two 3x3 matrices, `a * b`.
///
/// Applying the product to a point applies `b` first and then `a`.
///
/// Example:
///
/// ```
/// use pano_geometry::linalg::{matmul33, translation_mat33};
///
/// let a = translation_mat33(1.0, 2.0);
/// let b = translation_mat33(3.0, -1.0);
/// assert_eq!(matmul33(&a, &b), translation_mat33(4.0, 1.0));
/// ```
pub fn matmul33(a: &Mat33, b: &Mat33) -> Mat33 {
    let mut m = [[0.0; 3]; 3];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    m
}

/// Invert a 3x3 matrix via its adjugate.
///
/// # Errors
///
/// Returns [`GeometryError::SingularMatrix`] when the determinant is (numerically) zero.
pub fn inverse_mat33(m: &Mat33) -> Result<Mat33, GeometryError> {
    let det = det_mat33(m);

    if !det.is_finite() || det.abs() <= SINGULAR_EPS {
        return Err(GeometryError::SingularMatrix(det));
    }

    let inv_det = 1.0 / det;
    Ok([
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
        ],
    ])
}

/// Multiply a 3x3 matrix by a 3d vector.
pub fn mat33_mul_vec3(m: &Mat33, v: &[f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Map a 2d point through a homography, dividing by the homogeneous coordinate.
///
/// Points sent to infinity come back as non-finite coordinates.
pub fn transform_point2d(m: &Mat33, p: &[f64; 2]) -> [f64; 2] {
    let q = mat33_mul_vec3(m, &[p[0], p[1], 1.0]);
    [q[0] / q[2], q[1] / q[2]]
}

/// Scale a homography in place so that its bottom-right entry is one.
///
/// Matrices with a vanishing bottom-right entry are left untouched.
pub fn normalize_mat33_inplace(m: &mut Mat33) {
    let s = m[2][2];
    if s.abs() < f64::EPSILON {
        return;
    }
    m.iter_mut().flatten().for_each(|v| *v /= s);
}

/// Flatten a 3x3 matrix into a row-major array.
pub fn flatten_mat33(m: &Mat33) -> [f64; 9] {
    [
        m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
    ]
}
