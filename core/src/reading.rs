//! Sensor Reading - the online input

use serde::{Deserialize, Serialize};

/// Field names a reading supplies at serve time, in wire order.
pub const READING_FIELDS: &[&str] = &[
    "moisture",
    "temperature",
    "humidity",
    "light",
    "ph",
    "nitrogen",
    "phosphorus",
    "potassium",
    "conductivity",
    "hour",
    "day",
    "month",
];

/// Number of fields a reading supplies.
pub const READING_FIELD_COUNT: usize = 12;

/// One sensor reading as received over the wire.
///
/// All fields are mandatory; a missing or mistyped field is rejected by
/// the JSON boundary before the pipeline ever sees the reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub moisture: f32,
    pub temperature: f32,
    pub humidity: f32,
    pub light: f32,
    pub ph: f32,
    pub nitrogen: f32,
    pub phosphorus: f32,
    pub potassium: f32,
    pub conductivity: f32,
    pub hour: u32,
    pub day: u32,
    pub month: u32,
}

impl SensorReading {
    /// Field value by name; calendar fields are widened to `f32`.
    pub fn value_of(&self, name: &str) -> Option<f32> {
        match name {
            "moisture" => Some(self.moisture),
            "temperature" => Some(self.temperature),
            "humidity" => Some(self.humidity),
            "light" => Some(self.light),
            "ph" => Some(self.ph),
            "nitrogen" => Some(self.nitrogen),
            "phosphorus" => Some(self.phosphorus),
            "potassium" => Some(self.potassium),
            "conductivity" => Some(self.conductivity),
            "hour" => Some(self.hour as f32),
            "day" => Some(self.day as f32),
            "month" => Some(self.month as f32),
            _ => None,
        }
    }

    /// All field values in [`READING_FIELDS`] order.
    pub fn values(&self) -> [f32; READING_FIELD_COUNT] {
        [
            self.moisture,
            self.temperature,
            self.humidity,
            self.light,
            self.ph,
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.conductivity,
            self.hour as f32,
            self.day as f32,
            self.month as f32,
        ]
    }
}

// ============================================================================
// TESTS
// ============================================================================
