/// Plate tracker: identity resolution across frames
pub mod plate;

/// Vehicle records and speed estimation
pub mod vehicle;

/// Directional counting strips
pub mod zone;
