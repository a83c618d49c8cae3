//! Telemetry errors

use thiserror::Error;

/// Transport-level failures. These are turned into state transitions and log
/// lines by the manager and never reach the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
    /// Could not establish the connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failure on an established connection
    #[error("WebSocket error: {0}")]
    Transport(String),

    /// The service task has exited
    #[error("Telemetry service stopped")]
    ServiceStopped,
}
