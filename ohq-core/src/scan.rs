//! Ephemeral values produced by one detection tick.

use serde::{Deserialize, Serialize};

/// Image-space rectangle around a detected code, used for overlay drawing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Smallest axis-aligned box containing all of `points`.
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn around(points: &[(f64, f64)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for (x, y) in rest {
            min.0 = min.0.min(*x);
            min.1 = min.1.min(*y);
            max.0 = max.0.max(*x);
            max.1 = max.1.max(*y);
        }
        Some(Self {
            x: min.0,
            y: min.1,
            width: max.0 - min.0,
            height: max.1 - min.1,
        })
    }
}

/// One successfully decoded code. Lives for a single tick and the overlay
/// render that follows it; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Raw decoded string, exactly as the decoder produced it
    pub text: String,
    /// Where the code sits in the frame, when the decoder reports it
    pub bounds: Option<BoundingBox>,
}

impl Detection {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bounds: None,
        }
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_around_corner_points() {
        let bounds =
            BoundingBox::around(&[(10.0, 20.0), (110.0, 24.0), (108.0, 130.0), (12.0, 126.0)])
                .unwrap();
        assert!((bounds.x - 10.0).abs() < f64::EPSILON);
        assert!((bounds.y - 20.0).abs() < f64::EPSILON);
        assert!((bounds.width - 100.0).abs() < f64::EPSILON);
        assert!((bounds.height - 110.0).abs() < f64::EPSILON);
        assert!(BoundingBox::around(&[]).is_none());
    }
}
