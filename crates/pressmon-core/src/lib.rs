//! # PressMon Core Library
//!
//! Live-telemetry core for the PressMon pneumatic heat-press monitor.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Normalization of any inbound sensor payload into a canonical reading
//! - The streaming connection to the sensor backend, with reconnect and an
//!   operator log
//! - An observable store of the latest readings and connection status
//! - Per-frame easing of the 3D press scene and camera
//! - Start/stop/port commands against the collection service
//!
//! ## Example
//!
//! ```rust,ignore
//! use pressmon_core::prelude::*;
//!
//! let config = ConfigStore::default_location()?.load();
//! let monitor = Monitor::mount_ws(config);
//!
//! let mut latest = monitor.store().subscribe_latest();
//! while latest.changed().await.is_ok() {
//!     println!("{}", latest.borrow().summary());
//! }
//! ```

pub mod chart;
pub mod command;
pub mod config;
pub mod demo;
pub mod monitor;
pub mod normalize;
pub mod reading;
pub mod store;
pub mod telemetry;
pub mod visual;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::chart::{ChartHistory, ChartPoint, TemperatureBand};
    pub use crate::command::{CommandDispatcher, CommandError, SerialParams, SerialPortInfo, StartRequest};
    pub use crate::config::{ConfigStore, MonitorConfig};
    pub use crate::demo::{DemoConnector, DemoSimulator};
    pub use crate::monitor::Monitor;
    pub use crate::normalize::{normalize, normalize_text};
    pub use crate::reading::{CanonicalReading, SensorTable};
    pub use crate::store::SensorStore;
    pub use crate::telemetry::{ConnectionState, ConnectionStatus, Connector, DataSource, WsConnector};
    pub use crate::visual::{CameraPose, CameraPreset, InMemoryScene, SceneGraph, VisualDriver};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
