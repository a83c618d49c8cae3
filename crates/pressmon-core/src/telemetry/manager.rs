//! Connection manager state
//!
//! Synchronous core of the telemetry connection: it owns the connection state,
//! the sensor table and the log buffer and applies socket events to them in
//! arrival order. The async [`TelemetryService`](super::TelemetryService)
//! owns one of these plus the socket and the reconnect timer.

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::{ConnectionState, LogBuffer, TelemetryError, RECONNECT_DELAY};
use crate::config::MonitorConfig;
use crate::normalize::{classify_message, normalize, InboundMessage};
use crate::reading::{CanonicalReading, SensorTable};
use crate::store::SensorStore;

/// Connection state, sensor table and log, published to the store on change
pub struct ConnectionManager {
    url: String,
    auto_reconnect: bool,
    reconnect_delay: Duration,
    state: ConnectionState,
    table: SensorTable,
    logs: LogBuffer,
    store: SensorStore,
}

impl ConnectionManager {
    /// Create a manager for the configured endpoint
    pub fn new(config: &MonitorConfig, store: SensorStore) -> Self {
        Self {
            url: config.ws_url.clone(),
            auto_reconnect: config.auto_reconnect,
            reconnect_delay: RECONNECT_DELAY,
            state: ConnectionState::Disconnected,
            table: SensorTable::new(),
            logs: LogBuffer::new(config.effective_log_limit()),
            store,
        }
    }

    /// Endpoint the manager connects to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Readings received so far, per device
    pub fn table(&self) -> &SensorTable {
        &self.table
    }

    /// Operator log
    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    /// Whether closes are followed by a scheduled reconnect
    pub fn auto_reconnect(&self) -> bool {
        self.auto_reconnect
    }

    /// Append an operator log line
    pub fn add_log(&mut self, message: &str) {
        self.logs.push(message);
        self.store.publish_logs(self.logs.snapshot());
    }

    /// Drop every log line
    pub fn clear_logs(&mut self) {
        self.logs.clear();
        self.store.publish_logs(Vec::new());
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        self.store.set_connection_state(state);
    }

    /// A socket is being opened
    pub fn on_connecting(&mut self) {
        tracing::info!("Connecting to {}", self.url);
        self.set_state(ConnectionState::Connecting);
    }

    /// The socket is open
    pub fn on_open(&mut self) {
        tracing::info!("Telemetry stream connected");
        self.set_state(ConnectionState::Connected);
        self.add_log("Connected to WebSocket");
    }

    /// Apply one inbound frame. Returns the stored reading for ingest messages.
    pub fn on_message(&mut self, text: &str, received_at: DateTime<Utc>) -> Option<&CanonicalReading> {
        self.add_log(text);

        match classify_message(text) {
            InboundMessage::Ingest(message) => {
                let reading = normalize(&message, received_at);
                tracing::debug!(device = %reading.device_id, "ingest: {}", reading.summary());
                self.table.upsert(reading);
                self.store.publish_table(&self.table);
                self.table.latest()
            }
            InboundMessage::Keepalive => {
                tracing::trace!("keepalive");
                None
            }
            InboundMessage::Other(_) => None,
            InboundMessage::Invalid => {
                tracing::debug!("ignoring non-JSON frame");
                None
            }
        }
    }

    /// Transport failure. The caller force-closes the socket afterwards.
    pub fn on_error(&mut self, error: &TelemetryError) {
        tracing::warn!("Telemetry transport error: {error}");
        self.add_log(&format!("WebSocket error: {error}"));
    }

    /// The socket is gone. Returns the back-off after which to reconnect, if
    /// reconnecting is enabled.
    pub fn on_closed(&mut self, reason: Option<&str>) -> Option<Duration> {
        self.set_state(ConnectionState::Disconnected);
        match reason {
            Some(reason) => self.add_log(&format!("Disconnected: {reason}")),
            None => self.add_log("Disconnected."),
        }

        if self.auto_reconnect {
            let delay = self.reconnect_delay;
            self.add_log(&format!("Retrying in {}s...", delay.as_secs()));
            Some(delay)
        } else {
            None
        }
    }

    /// User closed the socket; no reconnect follows
    pub fn on_manual_disconnect(&mut self) {
        tracing::info!("Telemetry stream closed by user");
        self.set_state(ConnectionState::Disconnected);
        self.add_log("Manual disconnect");
    }

    /// Monitor scope is going away
    pub fn on_shutdown(&mut self) {
        self.set_state(ConnectionState::Disconnected);
    }
}
