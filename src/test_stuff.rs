use crate::trackers::vehicle::Detection;
use crate::utils::bbox::WarpedBox;
use rand::distributions::Uniform;
use rand::prelude::ThreadRng;
use rand::Rng;
use serde_json::json;

pub const VEHICLE_WIDTH: f32 = 200.0;
pub const VEHICLE_HEIGHT: f32 = 150.0;

pub fn vehicle_box(x: f32, y: f32) -> WarpedBox {
    WarpedBox::xywh(x, y, VEHICLE_WIDTH, VEHICLE_HEIGHT)
}

/// Plate box placed at the bottom center of the vehicle box
pub fn plate_box(x: f32, y: f32) -> WarpedBox {
    WarpedBox::xywh(x + 70.0, y + 110.0, 60.0, 20.0)
}

pub fn detection(text: &str, frame: u64, x: f32, y: f32) -> Detection {
    Detection::new(text, plate_box(x, y), vehicle_box(x, y), frame)
}

/// Engine result payload in the format produced by the recognition engine
///
pub fn engine_payload(frame_id: u64, detections: &[Detection]) -> String {
    let plates = detections
        .iter()
        .map(|d| {
            json!({
                "text": d.text,
                "confidences": [90.0, 99.0],
                "warpedBox": d.plate_box,
                "car": {
                    "confidence": 95.0,
                    "warpedBox": d.vehicle_box
                }
            })
        })
        .collect::<Vec<_>>();
    json!({
        "duration": 12,
        "frame_id": frame_id,
        "plates": plates
    })
    .to_string()
}

/// Vehicle moving vertically with a jittered per-frame displacement
///
pub struct VehicleGen {
    text: String,
    x: f32,
    y: f32,
    frame: u64,
    gen: ThreadRng,
    dist_pos: Uniform<f32>,
    step: f32,
}

impl VehicleGen {
    pub fn new(text: &str, x: f32, y: f32, step: f32) -> Self {
        Self {
            text: text.to_string(),
            x,
            y,
            frame: 0,
            gen: rand::thread_rng(),
            dist_pos: Uniform::new(-1.0, 1.0),
            step,
        }
    }
}

impl Iterator for VehicleGen {
    type Item = Detection;

    fn next(&mut self) -> Option<Self::Item> {
        self.frame += 1;
        let d = detection(&self.text, self.frame, self.x, self.y);
        self.y += self.step + self.gen.sample(self.dist_pos);
        Some(d)
    }
}
