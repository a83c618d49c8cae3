//! Per-frame visual driver

use nalgebra::Vector3;

use super::camera::CameraPose;
use super::mapping::{distance_to_offset, ease, plate_hue, IDLE_DISTANCE_MM};
use super::scene::{SceneBindings, SceneGraph, SceneRole};
use super::EASING_FACTOR;
use crate::reading::CanonicalReading;

/// What one frame rendered
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    /// Rendered press-top Y, if the press top is bound
    pub press_top_y: Option<f64>,
    /// Camera position after easing
    pub camera_position: Vector3<f64>,
    /// Point the camera faces
    pub look_at: Vector3<f64>,
    /// Bread indicator shown
    pub bread_visible: bool,
    /// Hand indicator shown
    pub hand_visible: bool,
}

/// Eases the camera and scene objects toward the latest reading once per
/// frame, independent of how often readings arrive
#[derive(Debug, Clone)]
pub struct VisualDriver {
    bindings: SceneBindings,
    camera: CameraPose,
    easing: f64,
}

impl Default for VisualDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualDriver {
    /// Driver with nothing bound and the camera at its front preset
    pub fn new() -> Self {
        Self {
            bindings: SceneBindings::default(),
            camera: CameraPose::default(),
            easing: EASING_FACTOR,
        }
    }

    /// Resolve roles against a freshly loaded scene
    pub fn bind<S: SceneGraph + ?Sized>(&mut self, scene: &S) {
        self.bindings = SceneBindings::resolve(scene);
    }

    /// Roles resolved by the last [`VisualDriver::bind`]
    pub fn bindings(&self) -> &SceneBindings {
        &self.bindings
    }

    /// Camera state
    pub fn camera(&self) -> &CameraPose {
        &self.camera
    }

    /// Camera state, for presets and manual moves
    pub fn camera_mut(&mut self) -> &mut CameraPose {
        &mut self.camera
    }

    /// Advance one frame. `reading` is the latest published reading, if any
    /// has arrived.
    pub fn frame<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        reading: Option<&CanonicalReading>,
    ) -> FrameState {
        let distance = reading.map_or(IDLE_DISTANCE_MM, |r| r.distance);
        let bread_visible = reading.is_some_and(|r| r.ir_bread);
        let hand_visible = reading.is_some_and(|r| r.ir_hand);

        let press_top_y = self.bindings.get(SceneRole::PressTop).map(|binding| {
            let target_y = binding.baseline.y + distance_to_offset(distance);
            let mut position = scene.position(binding.node).unwrap_or(binding.baseline);
            position.y = ease(position.y, target_y, self.easing);
            scene.set_position(binding.node, position);
            position.y
        });

        if let Some(binding) = self.bindings.get(SceneRole::BreadIndicator) {
            scene.set_visible(binding.node, bread_visible);
        }
        if let Some(binding) = self.bindings.get(SceneRole::HandIndicator) {
            scene.set_visible(binding.node, hand_visible);
        }
        if let (Some(binding), Some(r)) = (self.bindings.get(SceneRole::ColorPlate), reading) {
            scene.set_color_hsl(binding.node, plate_hue(r.temperature), 1.0, 0.5);
        }

        let camera_position = self.camera.step(self.easing);

        FrameState {
            press_top_y,
            camera_position,
            look_at: self.camera.look_at(),
            bread_visible,
            hand_visible,
        }
    }
}
