use crate::error::StitchError;
use crate::transform::{Frame, Transform, TransformSet};

/// Index of the reference image of a sequence of `n` images.
pub fn center_index(n: usize) -> usize {
    n.saturating_sub(1) / 2
}

/// Re-express a chain relative to its middle image instead of its first one.
///
/// Every `T_i` becomes `inverse(T_center) · T_i`, and `T_center` itself is set to the exact
/// identity so the reference image is warped without resampling drift.
///
/// # Errors
///
/// Returns [`StitchError::SingularTransform`] when `T_center` cannot be inverted.
pub fn recenter(transforms: &[Transform]) -> Result<TransformSet, StitchError> {
    if transforms.is_empty() {
        return Ok(Vec::new());
    }

    let center = center_index(transforms.len());
    let to_center = transforms[center]
        .inverse()
        .map_err(|_| StitchError::SingularTransform { index: center })?;

    let recentered = transforms
        .iter()
        .enumerate()
        .map(|(i, t)| {
            if i == center {
                Transform::identity(Frame::Image(center))
            } else {
                to_center.compose(t)
            }
        })
        .collect();

    log::debug!("recentered {} transforms on image {center}", transforms.len());
    Ok(recentered)
}
