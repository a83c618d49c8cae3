//! Reading-to-scene mappings and the easing step

/// Shortest stroke distance in mm (press fully closed)
pub const DISTANCE_MIN_MM: f64 = 20.0;
/// Longest stroke distance in mm (press fully open)
pub const DISTANCE_MAX_MM: f64 = 60.0;
/// Distance used when no reading has arrived yet (mid stroke)
pub const IDLE_DISTANCE_MM: f64 = 40.0;
/// Press-top travel above/below its baseline, in scene units
pub const PRESS_TRAVEL: f64 = 0.03;

/// Per-frame exponential smoothing factor
pub const EASING_FACTOR: f64 = 0.15;

/// Press-top Y offset for a distance reading. Maps 20 mm to `+0.03` and 60 mm
/// to `-0.03`, linear in between, clamped outside.
pub fn distance_to_offset(distance: f64) -> f64 {
    let d = if distance.is_finite() {
        distance.clamp(DISTANCE_MIN_MM, DISTANCE_MAX_MM)
    } else {
        IDLE_DISTANCE_MM
    };
    let span = DISTANCE_MAX_MM - DISTANCE_MIN_MM;
    PRESS_TRAVEL - ((d - DISTANCE_MIN_MM) / span) * (2.0 * PRESS_TRAVEL)
}

/// HSL hue (0..=0.66) of the heater plate: blue when cold, red at 100 °C and
/// above
pub fn plate_hue(temperature: f64) -> f64 {
    let t = if temperature.is_finite() {
        (temperature / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (1.0 - t) * 0.66
}

/// Move `current` a `factor` fraction of the way to `target`
pub fn ease(current: f64, target: f64, factor: f64) -> f64 {
    current + (target - current) * factor
}
