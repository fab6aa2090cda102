use serde::{Deserialize, Serialize};

use crate::error::{IrrigatorError, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub latitude: f32,
    pub longitude: f32,

    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "auto".to_string()
}

impl Location {
    pub fn new(name: &str, latitude: f32, longitude: f32) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
            timezone: default_timezone(),
        }
    }
}

pub fn default_locations() -> Vec<Location> {
    vec![
        Location::new("Zagreb", 45.8144, 15.978),
        Location::new("Buenaventura", 3.8801, -77.0312),
        Location::new("London", 51.5085, -0.1257),
    ]
}

/// Index of the location called `name`, ignoring case.
pub fn find(locations: &[Location], name: &str) -> Result<usize> {
    locations
        .iter()
        .position(|l| l.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| IrrigatorError::UnknownLocation(name.to_string()))
}
