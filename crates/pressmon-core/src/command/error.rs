//! Command errors

use thiserror::Error;

/// Failures of a request to the collection service. Every variant is also
/// reported as an operator log line by the dispatcher.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Request could not be sent or its body read
    #[error("Collection service unreachable: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Failed to {action}: HTTP {status}")]
    Status {
        /// What was being attempted
        action: String,
        /// HTTP status returned
        status: reqwest::StatusCode,
    },

    /// Body did not have the expected shape
    #[error("Invalid response from collection service: {0}")]
    InvalidResponse(String),

    /// Stop requested while nothing is collecting
    #[error("No active collection to stop")]
    NoActiveCollection,

    /// The telemetry service task has exited
    #[error("Telemetry service stopped")]
    ServiceStopped,
}

impl From<crate::telemetry::TelemetryError> for CommandError {
    fn from(_: crate::telemetry::TelemetryError) -> Self {
        CommandError::ServiceStopped
    }
}
