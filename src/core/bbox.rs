//! Axis-aligned bounding box in world coordinates.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// Normalizes swapped corners so that min < max on both axes.
    /// Degenerate (zero-area) or non-finite boxes are rejected.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Result<Self> {
        let (xmin, xmax) = if xmin <= xmax { (xmin, xmax) } else { (xmax, xmin) };
        let (ymin, ymax) = if ymin <= ymax { (ymin, ymax) } else { (ymax, ymin) };
        let bbox = Self { xmin, ymin, xmax, ymax };
        if !bbox.is_finite() {
            return Err(Error::InvalidGrid(format!(
                "bounding box has non-finite coordinates: {:?}",
                bbox
            )));
        }
        if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
            return Err(Error::InvalidGrid(format!(
                "bounding box has zero area: {:?}",
                bbox
            )));
        }
        Ok(bbox)
    }

    /// Empty accumulator for folding points into an extent.
    pub fn empty() -> Self {
        Self {
            xmin: f64::INFINITY,
            ymin: f64::INFINITY,
            xmax: f64::NEG_INFINITY,
            ymax: f64::NEG_INFINITY,
        }
    }

    pub fn expand(&mut self, x: f64, y: f64) {
        self.xmin = self.xmin.min(x);
        self.xmax = self.xmax.max(x);
        self.ymin = self.ymin.min(y);
        self.ymax = self.ymax.max(y);
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite() && self.ymin.is_finite() && self.xmax.is_finite() && self.ymax.is_finite()
    }
}
