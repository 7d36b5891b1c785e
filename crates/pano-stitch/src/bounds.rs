use pano_image::ImageSize;

use crate::error::StitchError;
use crate::transform::{Frame, Transform, TransformSet};

/// Extent of all projected images in the reference frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasBounds {
    /// Smallest projected x.
    pub xmin: f64,
    /// Largest projected x.
    pub xmax: f64,
    /// Smallest projected y.
    pub ymin: f64,
    /// Largest projected y.
    pub ymax: f64,
}

impl CanvasBounds {
    /// Project the pixel-centre corners of an `extent`-sized image through every transform
    /// and take the extremes.
    ///
    /// The corners of a rectangle bound its image under any projective map that keeps the
    /// rectangle on one side of the horizon, so four points per image suffice.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::UnboundedCanvas`] when a corner is sent to infinity. Returns
    /// `Ok(None)` for an empty set or a zero-sized extent.
    pub fn from_transforms(
        transforms: &[Transform],
        extent: ImageSize,
    ) -> Result<Option<Self>, StitchError> {
        if transforms.is_empty() || extent.width == 0 || extent.height == 0 {
            return Ok(None);
        }

        let (w, h) = ((extent.width - 1) as f64, (extent.height - 1) as f64);
        let corners = [[0.0, 0.0], [w, 0.0], [0.0, h], [w, h]];

        let mut bounds = CanvasBounds {
            xmin: f64::INFINITY,
            xmax: f64::NEG_INFINITY,
            ymin: f64::INFINITY,
            ymax: f64::NEG_INFINITY,
        };

        for (index, transform) in transforms.iter().enumerate() {
            let homogeneous_w: Vec<f64> = corners
                .iter()
                .map(|&[x, y]| {
                    let m = transform.matrix();
                    m[2][0] * x + m[2][1] * y + m[2][2]
                })
                .collect();

            // corners on both sides of the horizon make the image unbounded
            let all_positive = homogeneous_w.iter().all(|&w| w > 0.0);
            let all_negative = homogeneous_w.iter().all(|&w| w < 0.0);
            if !(all_positive || all_negative) {
                return Err(StitchError::UnboundedCanvas { index });
            }

            for corner in corners {
                let [x, y] = transform.apply(corner);
                if !(x.is_finite() && y.is_finite()) {
                    return Err(StitchError::UnboundedCanvas { index });
                }
                bounds.xmin = bounds.xmin.min(x);
                bounds.xmax = bounds.xmax.max(x);
                bounds.ymin = bounds.ymin.min(y);
                bounds.ymax = bounds.ymax.max(y);
            }
        }

        Ok(Some(bounds))
    }

    /// `xmax - xmin`.
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// `ymax - ymin`.
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// The offset `(-xmin, -ymin)` that moves all content to non-negative coordinates.
    pub fn translation(&self) -> [f64; 2] {
        [-self.xmin, -self.ymin]
    }

    /// Pixel size of the canvas, large enough to hold every projected pixel centre.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::CanvasTooLarge`] when the canvas would hold more than
    /// `max_pixels` pixels. Images projected close to the horizon end up here.
    pub fn canvas_size(&self, max_pixels: usize) -> Result<ImageSize, StitchError> {
        let too_large = || StitchError::CanvasTooLarge {
            width: self.width(),
            height: self.height(),
            max_pixels,
        };
        let side = |extent: f64| {
            let rounded = extent.round();
            // false for NaN too
            if !(rounded >= 0.0 && rounded < max_pixels as f64) {
                return None;
            }
            (rounded as usize).checked_add(1)
        };

        let size = ImageSize {
            width: side(self.width()).ok_or_else(too_large)?,
            height: side(self.height()).ok_or_else(too_large)?,
        };
        match size.area() {
            Some(area) if area <= max_pixels => Ok(size),
            _ => Err(too_large()),
        }
    }

    /// The translation `E` from the reference frame into the canvas.
    pub fn to_canvas(&self, reference: Frame) -> Transform {
        let [tx, ty] = self.translation();
        Transform::translation(tx, ty, reference, Frame::Canvas)
    }

    /// Left-multiply every transform by `E` so that all of them map into the canvas.
    pub fn apply(&self, transforms: &[Transform]) -> TransformSet {
        transforms
            .iter()
            .map(|t| self.to_canvas(t.dst()).compose(t))
            .collect()
    }
}
