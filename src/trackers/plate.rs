/// Geometric re-identification policy
pub mod metric;

/// Tracker configuration
pub mod options;

use crate::trackers::plate::metric::MatchMetric;
use crate::trackers::plate::options::PlateTrackerOptions;
use crate::trackers::vehicle::{Detection, VehicleRecord};
use crate::trackers::zone::{Direction, ZoneConfig, ZoneCounter};
use crate::utils::bbox::WarpedBox;
use crate::Errors;
use anyhow::{Context, Result};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// How a detection was bound to a vehicle
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The plate text is known
    Continued(u64),
    /// The vehicle box overlaps a vehicle from the previous frame; the vehicle is re-keyed from `from` to `to`
    Merged { id: u64, from: String, to: String },
    /// A new vehicle
    Created(u64),
}

impl Resolution {
    pub fn id(&self) -> u64 {
        match self {
            Resolution::Continued(id) | Resolution::Created(id) => *id,
            Resolution::Merged { id, .. } => *id,
        }
    }
}

/// Vehicle seen in the frame, ready for rendering
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VehicleView {
    pub id: u64,
    pub text: String,
    pub plate_box: WarpedBox,
    pub vehicle_box: WarpedBox,
    pub speed: f32,
    pub counted: Option<Direction>,
}

impl From<&VehicleRecord> for VehicleView {
    fn from(v: &VehicleRecord) -> Self {
        Self {
            id: v.id(),
            text: v.text().to_string(),
            plate_box: *v.plate_box(),
            vehicle_box: *v.vehicle_box(),
            speed: v.speed(),
            counted: v.counted(),
        }
    }
}

/// Tracking results for a frame
///
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    /// Vehicles in the order they were first resolved within the frame
    pub vehicles: Vec<VehicleView>,
    pub incoming: u64,
    pub outgoing: u64,
}

/// Persistable tracker state
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    /// Distinct plate texts of all tracked vehicles, sorted
    pub plates: Vec<String>,
    pub vehicles: usize,
    pub incoming: u64,
    pub outgoing: u64,
}

impl TrackerSnapshot {
    /// Writes the snapshot as JSON
    ///
    pub fn persist<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Unable to create plate ledger {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

/// Plate tracker.
///
/// Vehicles are kept in an arena indexed by their identities (starting from `1`) and are looked up
/// by the current plate text. Vehicles seen in the previous frame are kept in the order they were
/// resolved, the geometric re-identification scans them in that order and the first match wins.
///
pub struct PlateTracker {
    metric: MatchMetric,
    zone: ZoneCounter,
    vehicles: Vec<VehicleRecord>,
    known: HashMap<String, u64>,
    /// Raw detection texts merged into vehicles known under other texts, current frame only
    frame_aliases: HashMap<String, u64>,
    last_frame: Vec<u64>,
    current_frame: Vec<u64>,
}

impl Default for PlateTracker {
    fn default() -> Self {
        Self::with_parts(ZoneConfig::default(), MatchMetric::default())
    }
}

#[inline]
fn slot(id: u64) -> usize {
    (id - 1) as usize
}

impl PlateTracker {
    /// Creates new tracker
    ///
    /// # Parameters
    /// * `opts` - zone geometry and matching policy; they are validated
    ///
    pub fn new(opts: PlateTrackerOptions) -> Result<Self, Errors> {
        let (zone, metric) = opts.build()?;
        Ok(Self::with_parts(zone, metric))
    }

    fn with_parts(zone: ZoneConfig, metric: MatchMetric) -> Self {
        Self {
            metric,
            zone: ZoneCounter::new(zone),
            vehicles: Vec::default(),
            known: HashMap::default(),
            frame_aliases: HashMap::default(),
            last_frame: Vec::default(),
            current_frame: Vec::default(),
        }
    }

    pub fn zone(&self) -> &ZoneConfig {
        self.zone.config()
    }

    pub fn metric(&self) -> &MatchMetric {
        &self.metric
    }

    pub fn incoming(&self) -> u64 {
        self.zone.incoming()
    }

    pub fn outgoing(&self) -> u64 {
        self.zone.outgoing()
    }

    pub fn vehicle(&self, id: u64) -> Option<&VehicleRecord> {
        id.checked_sub(1)
            .and_then(|i| self.vehicles.get(i as usize))
    }

    /// Vehicle currently known under the plate text
    ///
    pub fn find(&self, text: &str) -> Option<&VehicleRecord> {
        self.known.get(text).and_then(|id| self.vehicle(*id))
    }

    pub fn vehicles(&self) -> &[VehicleRecord] {
        &self.vehicles
    }

    /// Vehicles seen in the previous frame
    ///
    pub fn last_frame(&self) -> &[u64] {
        &self.last_frame
    }

    /// Vehicles seen in the frame being processed
    ///
    pub fn current_frame(&self) -> &[u64] {
        &self.current_frame
    }

    /// Binds the detection to a vehicle, updating its boxes, speed and count.
    ///
    /// Detections of a frame must be resolved in the order the engine reported them,
    /// and [`PlateTracker::end_frame`] must be called before the next frame.
    ///
    pub fn resolve(&mut self, detection: &Detection) -> Resolution {
        let known = self.known.get(&detection.text).copied().or_else(|| {
            self.frame_aliases
                .get(&detection.text)
                .copied()
                .filter(|id| self.is_alias_of(*id, detection))
        });

        if let Some(id) = known {
            self.observe(id, detection);
            self.mark_current(id);
            debug!(
                "Frame {}: '{}' continues vehicle {}",
                detection.frame, detection.text, id
            );
            return Resolution::Continued(id);
        }

        let metric = self.metric;
        let matched = self.last_frame.iter().copied().find(|id| {
            metric
                .matches(self.vehicles[slot(*id)].vehicle_box(), &detection.vehicle_box)
                .is_some()
        });

        match matched {
            Some(id) => {
                let from = self.vehicles[slot(id)].text().to_string();
                let to = from.clone().max(detection.text.clone());

                self.last_frame.retain(|e| *e != id);
                self.known.remove(&from);
                self.vehicles[slot(id)].rename(to.clone());
                self.known.insert(to.clone(), id);
                self.frame_aliases.insert(detection.text.clone(), id);

                self.observe(id, detection);
                self.mark_current(id);
                debug!(
                    "Frame {}: '{}' overlaps vehicle {} ('{}'), re-keyed as '{}'",
                    detection.frame, detection.text, id, from, to
                );
                Resolution::Merged { id, from, to }
            }
            None => {
                let id = self.vehicles.len() as u64 + 1;
                let mut vehicle = VehicleRecord::new(id, detection);
                self.zone.evaluate(&mut vehicle);
                self.vehicles.push(vehicle);
                self.known.insert(detection.text.clone(), id);
                self.mark_current(id);
                debug!(
                    "Frame {}: '{}' is new vehicle {}",
                    detection.frame, detection.text, id
                );
                Resolution::Created(id)
            }
        }
    }

    /// An alias only holds for the box the vehicle was merged with
    fn is_alias_of(&self, id: u64, detection: &Detection) -> bool {
        let current = self.vehicles[slot(id)].vehicle_box();
        current == &detection.vehicle_box
            || self
                .metric
                .matches(current, &detection.vehicle_box)
                .is_some()
    }

    fn observe(&mut self, id: u64, detection: &Detection) -> Option<Direction> {
        let vehicle = &mut self.vehicles[slot(id)];
        vehicle.observe(detection);
        self.zone.evaluate(vehicle)
    }

    fn mark_current(&mut self, id: u64) {
        if !self.current_frame.contains(&id) {
            self.current_frame.push(id);
        }
    }

    /// Renderable state of the frame being processed
    ///
    pub fn report(&self, frame: u64) -> FrameReport {
        FrameReport {
            frame,
            vehicles: self
                .current_frame
                .iter()
                .map(|id| VehicleView::from(&self.vehicles[slot(*id)]))
                .collect(),
            incoming: self.incoming(),
            outgoing: self.outgoing(),
        }
    }

    /// Frame boundary: vehicles of the current frame become the candidates for the geometric
    /// re-identification in the next frame.
    ///
    pub fn end_frame(&mut self) {
        self.last_frame = std::mem::take(&mut self.current_frame);
        self.frame_aliases.clear();
    }

    /// Resolves the detections of the frame in order, reports the frame and moves to the next one
    ///
    pub fn process_frame(&mut self, frame: u64, detections: &[Detection]) -> FrameReport {
        for d in detections {
            self.resolve(d);
        }
        let report = self.report(frame);
        debug!(
            "Frame {}: {} detections, {} vehicles [{}]",
            frame,
            detections.len(),
            report.vehicles.len(),
            report.vehicles.iter().map(|v| v.text.as_str()).join(", ")
        );
        self.end_frame();
        report
    }

    /// Frame without tracking results. The boundary still moves, so no vehicle of the
    /// frame before it can be re-identified geometrically.
    ///
    pub fn skip_frame(&mut self, frame: u64) -> FrameReport {
        self.process_frame(frame, &[])
    }

    /// Distinct plate texts of all tracked vehicles, sorted
    ///
    pub fn plates(&self) -> Vec<String> {
        self.known.keys().cloned().sorted().collect()
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            plates: self.plates(),
            vehicles: self.vehicles.len(),
            incoming: self.incoming(),
            outgoing: self.outgoing(),
        }
    }
}
