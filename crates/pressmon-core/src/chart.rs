//! Chart history
//!
//! Rolling window of the most recent readings for the temperature, pressure
//! and distance charts. Charts only ever append; the oldest point falls off
//! once the window is full.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::reading::CanonicalReading;

/// Points kept per chart
pub const CHART_WINDOW: usize = 30;

/// One chart sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Local wall-clock label, `HH:MM:SS`
    pub time: String,
    /// Degrees Celsius
    pub temperature: f64,
    /// kPa
    pub pressure: f64,
    /// Millimetres
    pub distance: f64,
}

impl ChartPoint {
    /// Sample a reading, labelled with its receive time
    pub fn from_reading(reading: &CanonicalReading) -> Self {
        Self {
            time: time_label(reading.received_at),
            temperature: reading.temperature,
            pressure: reading.pressure,
            distance: reading.distance,
        }
    }
}

fn time_label(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Min / max / last of one series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    /// Smallest value in the window
    pub min: f64,
    /// Largest value in the window
    pub max: f64,
    /// Newest value
    pub last: f64,
}

/// Bounded history feeding the charts
#[derive(Debug, Clone)]
pub struct ChartHistory {
    points: VecDeque<ChartPoint>,
    capacity: usize,
}

impl Default for ChartHistory {
    fn default() -> Self {
        Self::new(CHART_WINDOW)
    }
}

impl ChartHistory {
    /// History keeping the newest `capacity` points (minimum one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a data point
    pub fn push(&mut self, point: ChartPoint) {
        if self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Append the chart projection of a reading
    pub fn push_reading(&mut self, reading: &CanonicalReading) {
        self.push(ChartPoint::from_reading(reading));
    }

    /// Number of points held
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if nothing has been pushed yet
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Maximum number of points kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Points oldest first
    pub fn points(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter()
    }

    /// Newest point
    pub fn last(&self) -> Option<&ChartPoint> {
        self.points.back()
    }

    /// Drop every point
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Temperature range over the window
    pub fn temperature_stats(&self) -> Option<SeriesStats> {
        self.stats(|p| p.temperature)
    }

    /// Pressure range over the window
    pub fn pressure_stats(&self) -> Option<SeriesStats> {
        self.stats(|p| p.pressure)
    }

    /// Distance range over the window
    pub fn distance_stats(&self) -> Option<SeriesStats> {
        self.stats(|p| p.distance)
    }

    fn stats(&self, series: impl Fn(&ChartPoint) -> f64) -> Option<SeriesStats> {
        let last = series(self.points.back()?);
        let (min, max) = self
            .points
            .iter()
            .map(&series)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        Some(SeriesStats { min, max, last })
    }
}

/// Colour band of the temperature readout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureBand {
    /// Below 20 °C
    Cold,
    /// 20 to 30 °C
    Cool,
    /// 30 to 40 °C
    Warm,
    /// 40 to 50 °C
    Hot,
    /// 50 °C and above
    Scorching,
}

impl TemperatureBand {
    /// Band containing `temperature` (°C)
    pub fn classify(temperature: f64) -> Self {
        if temperature < 20.0 {
            TemperatureBand::Cold
        } else if temperature < 30.0 {
            TemperatureBand::Cool
        } else if temperature < 40.0 {
            TemperatureBand::Warm
        } else if temperature < 50.0 {
            TemperatureBand::Hot
        } else {
            TemperatureBand::Scorching
        }
    }

    /// Display colour name
    pub fn color(&self) -> &'static str {
        match self {
            TemperatureBand::Cold => "blue",
            TemperatureBand::Cool => "green",
            TemperatureBand::Warm => "yellow",
            TemperatureBand::Hot => "orange",
            TemperatureBand::Scorching => "red",
        }
    }
}
