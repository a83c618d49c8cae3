//! Visual Interpolation Driver
//!
//! Turns the latest reading into scene state once per frame: the press top
//! eases toward a Y derived from the distance sensor, the bread and hand
//! indicators follow the IR flags, the heater plate is tinted by temperature
//! and the camera eases toward its target while auto-follow is on.

mod camera;
mod driver;
mod mapping;
mod scene;

pub use camera::{Axis, CameraPose, CameraPreset};
pub use driver::{FrameState, VisualDriver};
pub use mapping::{
    distance_to_offset, ease, plate_hue, DISTANCE_MAX_MM, DISTANCE_MIN_MM, EASING_FACTOR,
    IDLE_DISTANCE_MM, PRESS_TRAVEL,
};
pub use scene::{Binding, InMemoryScene, NodeId, SceneBindings, SceneGraph, SceneNode, SceneRole};
