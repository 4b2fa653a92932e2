/// Engine quadrilaterals and their overlap metrics
pub mod bbox;
