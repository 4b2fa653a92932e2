use crate::trackers::plate::metric::MatchMetric;
use crate::trackers::zone::ZoneConfig;
use crate::Errors;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Class that is used to configure the plate tracker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateTrackerOptions {
    zone: ZoneConfig,
    metric: MatchMetric,
}

impl PlateTrackerOptions {
    pub(crate) fn build(self) -> Result<(ZoneConfig, MatchMetric), Errors> {
        self.zone.validate()?;
        self.metric.validate()?;
        Ok((self.zone, self.metric))
    }

    /// Loads the options from JSON, missing fields keep their defaults.
    ///
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Image size and the counting strips
    ///
    pub fn zone(mut self, zone: ZoneConfig) -> Self {
        self.zone = zone;
        self
    }

    /// The policy used to continue a vehicle from the previous frame when its plate text is not known.
    ///
    pub fn metric(mut self, metric: MatchMetric) -> Self {
        self.metric = metric;
        self
    }

    /// The minimal overlap of vehicle boxes in consecutive frames to treat them as the same vehicle.
    /// The metric kind is kept.
    ///
    pub fn match_threshold(mut self, threshold: f32) -> Self {
        self.metric = self.metric.with_threshold(threshold);
        self
    }
}
