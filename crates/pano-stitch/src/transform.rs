use pano_geometry::linalg::{self, Mat33};

use crate::error::StitchError;

/// A coordinate frame a transform maps from or into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Frame {
    /// Pixel coordinates of the input image with this index.
    Image(usize),
    /// Pixel coordinates of the output canvas.
    Canvas,
}

/// A homography tagged with the frames it maps between.
///
/// The tags make composition order explicit: `a.compose(&b)` is only meaningful when `b` lands
/// in the frame `a` starts from, which is checked in debug builds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    matrix: Mat33,
    src: Frame,
    dst: Frame,
}

/// One transform per input image, in input order.
pub type TransformSet = Vec<Transform>;

impl Transform {
    /// Create a transform mapping `src` coordinates into `dst` coordinates.
    pub fn new(matrix: Mat33, src: Frame, dst: Frame) -> Self {
        Self { matrix, src, dst }
    }

    /// The identity of a frame onto itself.
    pub fn identity(frame: Frame) -> Self {
        Self::new(linalg::IDENTITY, frame, frame)
    }

    /// A pure translation by `(tx, ty)`.
    pub fn translation(tx: f64, ty: f64, src: Frame, dst: Frame) -> Self {
        Self::new(linalg::translation_mat33(tx, ty), src, dst)
    }

    /// The row-major matrix.
    pub fn matrix(&self) -> &Mat33 {
        &self.matrix
    }

    /// The frame this transform maps from.
    pub fn src(&self) -> Frame {
        self.src
    }

    /// The frame this transform maps into.
    pub fn dst(&self) -> Frame {
        self.dst
    }

    /// The product `self · rhs`, i.e. apply `rhs` first and then `self`.
    pub fn compose(&self, rhs: &Transform) -> Transform {
        debug_assert_eq!(
            self.src, rhs.dst,
            "composing {:?} -> {:?} after {:?} -> {:?}",
            self.src, self.dst, rhs.src, rhs.dst
        );
        Transform::new(linalg::matmul33(&self.matrix, &rhs.matrix), rhs.src, self.dst)
    }

    /// The inverse transform, mapping `dst` back into `src`.
    pub fn inverse(&self) -> Result<Transform, StitchError> {
        let inv = linalg::inverse_mat33(&self.matrix)?;
        Ok(Transform::new(inv, self.dst, self.src))
    }

    /// Map a point from the source frame into the destination frame.
    pub fn apply(&self, p: [f64; 2]) -> [f64; 2] {
        linalg::transform_point2d(&self.matrix, &p)
    }

    /// The matrix flattened row-major, as consumed by the warping routines.
    pub fn to_flat(&self) -> [f64; 9] {
        linalg::flatten_mat33(&self.matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn compose_applies_right_first() {
        let scale = Transform::new(
            [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]],
            Frame::Image(1),
            Frame::Image(0),
        );
        let shift = Transform::translation(10.0, 0.0, Frame::Image(0), Frame::Canvas);

        let t = shift.compose(&scale);
        assert_eq!(t.src(), Frame::Image(1));
        assert_eq!(t.dst(), Frame::Canvas);
        assert_eq!(t.apply([1.0, 1.0]), [12.0, 2.0]);
    }

    #[test]
    fn inverse_swaps_frames() -> Result<(), StitchError> {
        let t = Transform::new(
            [[1.1, 0.05, -80.0], [0.02, 0.95, 3.0], [1e-4, 0.0, 1.0]],
            Frame::Image(2),
            Frame::Image(1),
        );
        let inv = t.inverse()?;
        assert_eq!(inv.src(), Frame::Image(1));
        assert_eq!(inv.dst(), Frame::Image(2));

        let p = inv.apply(t.apply([30.0, 40.0]));
        assert_relative_eq!(p[0], 30.0, epsilon = 1e-9);
        assert_relative_eq!(p[1], 40.0, epsilon = 1e-9);

        let eye = inv.compose(&t);
        for (row, expected) in eye.matrix().iter().zip(linalg::IDENTITY.iter()) {
            for (a, b) in row.iter().zip(expected.iter()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-9);
            }
        }
        Ok(())
    }

    #[test]
    fn singular_inverse_fails() {
        let t = Transform::new([[0.0; 3]; 3], Frame::Image(0), Frame::Image(0));
        assert!(matches!(t.inverse(), Err(StitchError::Geometry(_))));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "composing")]
    fn mismatched_frames_panic_in_debug() {
        let a = Transform::identity(Frame::Image(0));
        let b = Transform::identity(Frame::Image(1));
        let _ = a.compose(&b);
    }
}
