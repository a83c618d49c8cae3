//! Camera pose, presets and auto-follow easing

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named camera positions from the camera panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPreset {
    /// Straight on
    Front,
    /// Three-quarter view from above
    Diagonal,
    /// From the right
    Side,
    /// Looking down
    Top,
}

impl CameraPreset {
    /// Every preset, in menu order
    pub const ALL: [CameraPreset; 4] = [
        CameraPreset::Front,
        CameraPreset::Diagonal,
        CameraPreset::Side,
        CameraPreset::Top,
    ];

    /// Camera position for this preset
    pub fn position(&self) -> Vector3<f64> {
        match self {
            CameraPreset::Front => Vector3::new(3.0, 2.0, 5.0),
            CameraPreset::Diagonal => Vector3::new(4.0, 2.0, 3.0),
            CameraPreset::Side => Vector3::new(0.0, 2.0, 6.0),
            CameraPreset::Top => Vector3::new(0.0, 7.0, 0.0),
        }
    }

    /// Lower-case name, as accepted by `FromStr`
    pub fn label(&self) -> &'static str {
        match self {
            CameraPreset::Front => "Front",
            CameraPreset::Diagonal => "Diagonal",
            CameraPreset::Side => "Side",
            CameraPreset::Top => "Top",
        }
    }
}

impl fmt::Display for CameraPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CameraPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CameraPreset::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown camera preset '{s}'"))
    }
}

/// World axis for fine camera adjustments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Left/right
    X,
    /// Up/down
    Y,
    /// Toward/away from the press
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Camera state.
///
/// While `auto_follow` is set, [`CameraPose::step`] eases `position` toward
/// `target`. A manual orbit turns following off and takes the position as-is;
/// any preset, reset or nudge turns it back on.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPose {
    /// Current camera position
    pub position: Vector3<f64>,
    /// Position being eased toward
    pub target: Vector3<f64>,
    /// Whether `position` follows `target`
    pub auto_follow: bool,
}

impl Default for CameraPose {
    fn default() -> Self {
        let front = CameraPreset::Front.position();
        Self {
            position: front,
            target: front,
            auto_follow: true,
        }
    }
}

impl CameraPose {
    /// The user grabbed the orbit controls
    pub fn begin_manual_orbit(&mut self) {
        self.auto_follow = false;
    }

    /// Position reported by the orbit controls while dragging
    pub fn set_manual_position(&mut self, position: Vector3<f64>) {
        self.auto_follow = false;
        self.position = position;
    }

    /// Ease toward a preset
    pub fn apply_preset(&mut self, preset: CameraPreset) {
        self.follow(preset.position());
    }

    /// Back to the front view
    pub fn reset(&mut self) {
        self.apply_preset(CameraPreset::Front);
    }

    /// Shift the target along one axis
    pub fn nudge(&mut self, axis: Axis, delta: f64) {
        let mut target = self.target;
        target[axis.index()] += delta;
        self.follow(target);
    }

    /// Set one target coordinate
    pub fn set_axis(&mut self, axis: Axis, value: f64) {
        let mut target = self.target;
        target[axis.index()] = value;
        self.follow(target);
    }

    fn follow(&mut self, target: Vector3<f64>) {
        self.target = target;
        self.auto_follow = true;
    }

    /// One frame of easing. Returns the position to render.
    pub fn step(&mut self, factor: f64) -> Vector3<f64> {
        if self.auto_follow {
            self.position = self.position.lerp(&self.target, factor);
        }
        self.position
    }

    /// The camera always looks at the press
    pub fn look_at(&self) -> Vector3<f64> {
        Vector3::zeros()
    }
}
