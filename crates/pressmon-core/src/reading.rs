//! Canonical sensor readings and the per-device sensor table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Device id used when a payload carries none
pub const UNKNOWN_DEVICE: &str = "unknown";

/// Normalized unit of telemetry, fully defaulted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalReading {
    /// Producing device
    pub device_id: String,
    /// Heater temperature in °C
    pub temperature: f64,
    /// Cylinder pressure in kPa
    pub pressure: f64,
    /// Press-top ultrasonic distance in mm
    pub distance: f64,
    /// Bread present on the plate (IR barrier)
    pub ir_bread: bool,
    /// Hand inside the press area (IR barrier)
    pub ir_hand: bool,
    /// Client-side arrival time
    pub received_at: DateTime<Utc>,
}

impl Default for CanonicalReading {
    fn default() -> Self {
        Self {
            device_id: UNKNOWN_DEVICE.to_string(),
            temperature: 0.0,
            pressure: 0.0,
            distance: 0.0,
            ir_bread: false,
            ir_hand: false,
            received_at: DateTime::<Utc>::default(),
        }
    }
}

impl CanonicalReading {
    /// Copy of this reading stamped with a new arrival time
    pub fn stamped(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }

    /// One-line operator summary, e.g. for the HUD
    pub fn summary(&self) -> String {
        format!(
            "T:{:.1}°C | P:{:.2} kPa | D:{:.1} mm | bread:{} hand:{}",
            self.temperature,
            self.pressure,
            self.distance,
            if self.ir_bread { "yes" } else { "no" },
            if self.ir_hand { "yes" } else { "no" },
        )
    }
}

/// Most recent reading per device. Last write wins; there is no clear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorTable {
    readings: HashMap<String, CanonicalReading>,
    last_device: Option<String>,
}

impl SensorTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for the reading's device
    pub fn upsert(&mut self, reading: CanonicalReading) {
        let device_id = reading.device_id.clone();
        self.readings.insert(device_id.clone(), reading);
        self.last_device = Some(device_id);
    }

    /// Reading for a device
    pub fn get(&self, device_id: &str) -> Option<&CanonicalReading> {
        self.readings.get(device_id)
    }

    /// The reading written most recently, across all devices
    pub fn latest(&self) -> Option<&CanonicalReading> {
        self.last_device
            .as_deref()
            .and_then(|id| self.readings.get(id))
    }

    /// Number of devices seen
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Check if no device has reported yet
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Device ids in sorted order
    pub fn device_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.readings.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// All readings, unordered
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalReading> {
        self.readings.values()
    }
}
