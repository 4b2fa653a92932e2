pub use crate::adapter::{adapt, EngineFrame, EngineResult};
pub use crate::session::{Session, SessionLimits, StopReason};
pub use crate::trackers::plate::metric::MatchMetric;
pub use crate::trackers::plate::options::PlateTrackerOptions;
pub use crate::trackers::plate::{
    FrameReport, PlateTracker, Resolution, TrackerSnapshot, VehicleView,
};
pub use crate::trackers::vehicle::{Detection, VehicleRecord};
pub use crate::trackers::zone::{Direction, Strip, ZoneConfig, ZoneCounter};
pub use crate::utils::bbox::WarpedBox;
