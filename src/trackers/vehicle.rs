use crate::trackers::zone::Direction;
use crate::utils::bbox::WarpedBox;
use log::debug;
use serde::{Deserialize, Serialize};

/// Plate recognized by the engine together with the vehicle it belongs to
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub text: String,
    pub plate_box: WarpedBox,
    pub vehicle_box: WarpedBox,
    /// Frame the detection was produced for
    pub frame: u64,
}

impl Detection {
    pub fn new(
        text: impl Into<String>,
        plate_box: WarpedBox,
        vehicle_box: WarpedBox,
        frame: u64,
    ) -> Self {
        Self {
            text: text.into(),
            plate_box,
            vehicle_box,
            frame,
        }
    }
}

/// Tracked vehicle
///
#[derive(Clone, Debug, Serialize)]
pub struct VehicleRecord {
    id: u64,
    text: String,
    plate_box: WarpedBox,
    vehicle_box: WarpedBox,
    /// The frame when the record was lastly updated
    frame: u64,
    /// Vertical displacement of the vehicle box in pixels per frame
    speed: f32,
    observations: usize,
    counted: Option<Direction>,
}

impl VehicleRecord {
    pub(crate) fn new(id: u64, detection: &Detection) -> Self {
        Self {
            id,
            text: detection.text.clone(),
            plate_box: detection.plate_box,
            vehicle_box: detection.vehicle_box,
            frame: detection.frame,
            speed: 0.0,
            observations: 1,
            counted: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn plate_box(&self) -> &WarpedBox {
        &self.plate_box
    }

    pub fn vehicle_box(&self) -> &WarpedBox {
        &self.vehicle_box
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Speed estimated on the last update, `0.0` until the vehicle is observed twice
    ///
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Direction the vehicle was counted in
    ///
    pub fn counted(&self) -> Option<Direction> {
        self.counted
    }

    pub fn is_counted(&self) -> bool {
        self.counted.is_some()
    }

    /// Re-estimates the speed against the stored box and frame.
    ///
    /// The speed is the absolute displacement of the box vertical midpoint divided by the
    /// number of frames passed. When no frame passed, the update is skipped and the
    /// previous speed is returned.
    ///
    /// The stored box and frame are left untouched.
    ///
    pub fn update_speed(&mut self, vehicle_box: &WarpedBox, frame: u64) -> f32 {
        let frames = frame.abs_diff(self.frame);
        if frames == 0 {
            debug!(
                "Vehicle {} observed twice in frame {}, speed {} kept",
                self.id, frame, self.speed
            );
            return self.speed;
        }
        let displacement = (self.vehicle_box.center_y() - vehicle_box.center_y()).abs();
        self.speed = displacement / frames as f32;
        self.speed
    }

    /// Applies the detection: speed first, then boxes and frame
    ///
    pub(crate) fn observe(&mut self, detection: &Detection) {
        self.update_speed(&detection.vehicle_box, detection.frame);
        self.vehicle_box = detection.vehicle_box;
        self.plate_box = detection.plate_box;
        self.frame = detection.frame;
        self.observations += 1;
    }

    pub(crate) fn rename(&mut self, text: String) {
        self.text = text;
    }

    /// Sets the counted direction once. Returns `false` if the vehicle was counted before.
    ///
    pub(crate) fn mark_counted(&mut self, direction: Direction) -> bool {
        if self.counted.is_some() {
            return false;
        }
        self.counted = Some(direction);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::test_stuff::{detection, vehicle_box};
    use crate::trackers::vehicle::VehicleRecord;
    use crate::trackers::zone::Direction;
    use crate::EPS;

    #[test]
    fn speed() {
        let mut v = VehicleRecord::new(1, &detection("ABC123", 1, 100.0, 100.0));
        assert_eq!(v.speed(), 0.0);
        assert_eq!(v.observations(), 1);

        v.observe(&detection("ABC123", 3, 100.0, 120.0));
        assert!((v.speed() - 10.0).abs() < EPS);
        assert_eq!(v.frame(), 3);
        assert_eq!(v.observations(), 2);

        // moving up gives the same magnitude
        v.observe(&detection("ABC123", 4, 100.0, 115.0));
        assert!((v.speed() - 5.0).abs() < EPS);

        // not smoothed
        v.observe(&detection("ABC123", 5, 100.0, 115.0));
        assert_eq!(v.speed(), 0.0);
    }

    #[test]
    fn zero_frame_delta() {
        let mut v = VehicleRecord::new(1, &detection("ABC123", 1, 100.0, 100.0));
        v.observe(&detection("ABC123", 2, 100.0, 104.0));
        assert!((v.speed() - 4.0).abs() < EPS);

        let res = v.update_speed(&vehicle_box(100.0, 300.0), 2);
        assert!(res.is_finite());
        assert!((res - 4.0).abs() < EPS);
        assert!((v.speed() - 4.0).abs() < EPS);

        v.observe(&detection("ABC123", 2, 100.0, 300.0));
        assert!((v.speed() - 4.0).abs() < EPS);
    }

    #[test]
    fn frame_going_back() {
        let mut v = VehicleRecord::new(1, &detection("ABC123", 10, 100.0, 100.0));
        let res = v.update_speed(&vehicle_box(100.0, 90.0), 8);
        assert!((res - 5.0).abs() < EPS);
    }

    #[test]
    fn counted_once() {
        let mut v = VehicleRecord::new(7, &detection("ABC123", 1, 100.0, 100.0));
        assert!(!v.is_counted());
        assert!(v.mark_counted(Direction::Outgoing));
        assert!(!v.mark_counted(Direction::Incoming));
        assert_eq!(v.counted(), Some(Direction::Outgoing));
        assert_eq!(v.id(), 7);
    }
}
