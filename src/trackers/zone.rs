use crate::trackers::vehicle::VehicleRecord;
use crate::utils::bbox::WarpedBox;
use crate::Errors;
use log::info;
use serde::{Deserialize, Serialize};

/// Counting direction. Outgoing vehicles move in the left half of the image, incoming ones in the right half.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// Horizontal band in image-normalized vertical coordinates.
///
/// A vehicle is inside the band when its vertical midpoint lays strictly between
/// `from * height` and `to * height`.
///
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Strip {
    pub from: f32,
    pub to: f32,
}

impl Strip {
    pub fn new(from: f32, to: f32) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, y: f32, image_height: f32) -> bool {
        y > image_height * self.from && y < image_height * self.to
    }

    fn validate(&self) -> Result<(), Errors> {
        if (0.0..=1.0).contains(&self.from) && (0.0..=1.0).contains(&self.to) && self.from <= self.to
        {
            Ok(())
        } else {
            Err(Errors::InvalidStrip(self.from, self.to))
        }
    }
}

/// Counting zone geometry
///
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub image_width: f32,
    pub image_height: f32,
    pub outgoing: Strip,
    pub incoming: Strip,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            image_width: 1280.0,
            image_height: 720.0,
            outgoing: Strip::new(0.554, 0.60),
            incoming: Strip::new(0.36, 0.41),
        }
    }
}

impl ZoneConfig {
    pub fn new(image_width: f32, image_height: f32, outgoing: Strip, incoming: Strip) -> Self {
        Self {
            image_width,
            image_height,
            outgoing,
            incoming,
        }
    }

    pub fn validate(&self) -> Result<(), Errors> {
        if !(self.image_width > 0.0 && self.image_height > 0.0) {
            return Err(Errors::InvalidImageSize(self.image_width, self.image_height));
        }
        self.outgoing.validate()?;
        self.incoming.validate()
    }

    pub fn strip(&self, direction: Direction) -> &Strip {
        match direction {
            Direction::Incoming => &self.incoming,
            Direction::Outgoing => &self.outgoing,
        }
    }

    /// Image half the box belongs to, decided by the box horizontal midpoint
    ///
    pub fn half(&self, b: &WarpedBox) -> Direction {
        if b.center_x() > self.image_width / 2.0 {
            Direction::Incoming
        } else {
            Direction::Outgoing
        }
    }

    /// Direction the box is counted in if it lays inside the strip of its half
    ///
    pub fn classify(&self, b: &WarpedBox) -> Option<Direction> {
        let direction = self.half(b);
        Some(direction).filter(|d| self.strip(*d).contains(b.center_y(), self.image_height))
    }

    /// Pixel region covered by the strip, for overlays
    ///
    pub fn strip_region(&self, direction: Direction) -> WarpedBox {
        let strip = self.strip(direction);
        let half_width = self.image_width / 2.0;
        let x = match direction {
            Direction::Outgoing => 0.0,
            Direction::Incoming => half_width,
        };
        let y = strip.from * self.image_height;
        WarpedBox::xywh(x, y, half_width, (strip.to - strip.from) * self.image_height)
    }
}

/// Counts vehicles crossing the strips, every vehicle at most once
///
#[derive(Clone, Debug)]
pub struct ZoneCounter {
    config: ZoneConfig,
    incoming: u64,
    outgoing: u64,
}

impl ZoneCounter {
    pub fn new(config: ZoneConfig) -> Self {
        Self {
            config,
            incoming: 0,
            outgoing: 0,
        }
    }

    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    pub fn incoming(&self) -> u64 {
        self.incoming
    }

    pub fn outgoing(&self) -> u64 {
        self.outgoing
    }

    /// Counts the vehicle if it is not counted yet and its current box lays inside a strip.
    ///
    /// Returns the direction when the vehicle is counted by this call.
    ///
    pub fn evaluate(&mut self, vehicle: &mut VehicleRecord) -> Option<Direction> {
        if vehicle.is_counted() {
            return None;
        }
        let direction = self.config.classify(vehicle.vehicle_box())?;
        if !vehicle.mark_counted(direction) {
            return None;
        }
        match direction {
            Direction::Incoming => self.incoming += 1,
            Direction::Outgoing => self.outgoing += 1,
        }
        info!(
            "Vehicle {} ({}) counted as {:?}, in: {}, out: {}",
            vehicle.id(),
            vehicle.text(),
            direction,
            self.incoming,
            self.outgoing
        );
        Some(direction)
    }
}
