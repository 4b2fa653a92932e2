use crate::utils::bbox::WarpedBox;
use crate::Errors;
use serde::{Deserialize, Serialize};

/// Default vehicle box overlap required to continue a vehicle under a different plate text
pub const DEFAULT_MATCH_IOU_THRESHOLD: f32 = 0.58;

/// Overlap policy used to re-identify a vehicle from the previous frame when its plate text changed.
///
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum MatchMetric {
    /// IoU over the rectangles spanned by the box corners, see [`WarpedBox::iou`]
    CornerIoU(f32),
    /// IoU over the quadrilaterals, see [`WarpedBox::polygon_iou`]
    PolygonIoU(f32),
}

impl Default for MatchMetric {
    fn default() -> Self {
        MatchMetric::CornerIoU(DEFAULT_MATCH_IOU_THRESHOLD)
    }
}

impl MatchMetric {
    pub fn threshold(&self) -> f32 {
        match self {
            MatchMetric::CornerIoU(t) | MatchMetric::PolygonIoU(t) => *t,
        }
    }

    /// The same policy with another threshold
    ///
    pub fn with_threshold(self, threshold: f32) -> Self {
        match self {
            MatchMetric::CornerIoU(_) => MatchMetric::CornerIoU(threshold),
            MatchMetric::PolygonIoU(_) => MatchMetric::PolygonIoU(threshold),
        }
    }

    pub fn validate(&self) -> Result<(), Errors> {
        let t = self.threshold();
        if t > 0.0 && t <= 1.0 {
            Ok(())
        } else {
            Err(Errors::InvalidThreshold(t))
        }
    }

    pub fn metric(&self, track: &WarpedBox, candidate: &WarpedBox) -> f32 {
        match self {
            MatchMetric::CornerIoU(_) => WarpedBox::iou(track, candidate),
            MatchMetric::PolygonIoU(_) => WarpedBox::polygon_iou(track, candidate),
        }
    }

    /// Returns the overlap when it reaches the threshold
    ///
    pub fn matches(&self, track: &WarpedBox, candidate: &WarpedBox) -> Option<f32> {
        Some(self.metric(track, candidate)).filter(|iou| *iou >= self.threshold())
    }
}
