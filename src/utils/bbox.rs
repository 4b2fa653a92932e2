use crate::EPS;
use geo::{Area, BooleanOps, LineString, Polygon};
use serde::{Deserialize, Serialize};

/// Quadrilateral reported by the recognition engine in the format
/// `(x0, y0, x1, y1, x2, y2, x3, y3)`: top-left, top-right, bottom-right, bottom-left.
///
/// The box may be rotated. The corner-based metrics below treat it as an
/// axis-aligned rectangle spanned by specific corner indices.
///
#[derive(Clone, Copy, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarpedBox([f32; 8]);

impl WarpedBox {
    pub fn new(coords: [f32; 8]) -> Self {
        Self(coords)
    }

    /// Constructor for the axis-aligned box with the top-left corner at `(x, y)`
    ///
    pub fn xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self([
            x,
            y,
            x + width,
            y,
            x + width,
            y + height,
            x,
            y + height,
        ])
    }

    pub fn coords(&self) -> &[f32; 8] {
        &self.0
    }

    /// Horizontal midpoint of the top edge
    pub fn center_x(&self) -> f32 {
        (self.0[0] + self.0[2]) / 2.0
    }

    /// Vertical midpoint of the left edge
    pub fn center_y(&self) -> f32 {
        (self.0[1] + self.0[7]) / 2.0
    }

    /// Area with the width taken from corners 0 and 1 and the height from corners 0 and 3.
    ///
    pub fn own_area(&self) -> f32 {
        (self.0[2] - self.0[0]) * (self.0[7] - self.0[1])
    }

    /// Intersection of the rectangles spanned by the top-left (indices 0, 1) and
    /// bottom-right (indices 4, 5) corners.
    ///
    pub fn intersection(l: &WarpedBox, r: &WarpedBox) -> f32 {
        let (x1, y1) = (l.0[0].max(r.0[0]), l.0[1].max(r.0[1]));
        let (x2, y2) = (l.0[4].min(r.0[4]), l.0[5].min(r.0[5]));
        (x2 - x1).max(0.0) * (y2 - y1).max(0.0)
    }

    /// Corner-based intersection over union. Degenerate pairs with a zero union yield `0.0`.
    ///
    pub fn iou(l: &WarpedBox, r: &WarpedBox) -> f32 {
        let intersection = WarpedBox::intersection(l, r);
        let union = l.own_area() + r.own_area() - intersection;
        if union.abs() < EPS {
            0.0
        } else {
            intersection / union
        }
    }

    /// Exact intersection over union of both quadrilaterals taken as polygons.
    ///
    pub fn polygon_iou(l: &WarpedBox, r: &WarpedBox) -> f32 {
        let lp = Polygon::from(l);
        let rp = Polygon::from(r);
        if lp.unsigned_area() < EPS as f64 || rp.unsigned_area() < EPS as f64 {
            return 0.0;
        }
        let intersection = lp.intersection(&rp).unsigned_area();
        let union = lp.union(&rp).unsigned_area();
        if union < EPS as f64 {
            0.0
        } else {
            (intersection / union) as f32
        }
    }
}

impl From<&WarpedBox> for Polygon<f64> {
    fn from(b: &WarpedBox) -> Self {
        let c = b.0.map(|v| v as f64);
        Polygon::new(
            LineString::from(vec![(c[0], c[1]), (c[2], c[3]), (c[4], c[5]), (c[6], c[7])]),
            vec![],
        )
    }
}
