//! Telemetry Connection Manager
//!
//! Keeps the live streaming connection to the sensor backend: opens it,
//! re-opens it after a fixed back-off, feeds every inbound frame through the
//! normalizer into the per-device sensor table, and keeps the bounded operator
//! log. Failures never escape as errors; they become state transitions plus
//! log lines.

mod error;
mod log;
mod manager;
mod service;
pub mod transport;

pub use error::TelemetryError;
pub use log::LogBuffer;
pub use manager::ConnectionManager;
pub use service::{TelemetryHandle, TelemetryService};
pub use transport::{Connector, SocketEvent, SocketHandle, WsConnector};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay before re-opening a closed stream
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No socket
    #[default]
    Disconnected,
    /// Socket opening
    Connecting,
    /// Socket open and streaming
    Connected,
}

/// Remote collection pipeline feeding the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Backend-side generator
    Fake,
    /// Hardware rig on a serial port
    Serial,
}

impl DataSource {
    /// Path segment used by the collection service
    pub fn path(&self) -> &'static str {
        match self {
            DataSource::Fake => "fake",
            DataSource::Serial => "serial",
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Connection plus collection status, as shown by the status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Streaming connection state
    pub state: ConnectionState,
    /// Whether a collection is running on the service
    pub is_collecting: bool,
    /// Pipeline of the running collection
    pub data_source: Option<DataSource>,
}

impl ConnectionStatus {
    /// Socket open and streaming
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}
