//! Sensor State Store
//!
//! Process-wide observable projection of the current reading(s), connection
//! and collection status, operator log and serial ports. Each facet is a
//! `tokio::sync::watch` register: readers take a snapshot or subscribe to
//! changes, only the connection manager and the command dispatcher write.

use std::sync::Arc;
use tokio::sync::watch;

use crate::command::SerialPortInfo;
use crate::reading::{CanonicalReading, SensorTable};
use crate::telemetry::{ConnectionState, ConnectionStatus, DataSource};

struct Registers {
    latest: watch::Sender<CanonicalReading>,
    sensors: watch::Sender<SensorTable>,
    status: watch::Sender<ConnectionStatus>,
    logs: watch::Sender<Vec<String>>,
    ports: watch::Sender<Vec<SerialPortInfo>>,
}

/// Shared, cheaply clonable handle to the store
#[derive(Clone)]
pub struct SensorStore {
    registers: Arc<Registers>,
}

impl Default for SensorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorStore {
    /// All-zero reading, empty table, disconnected, no logs, no ports
    pub fn new() -> Self {
        Self {
            registers: Arc::new(Registers {
                latest: watch::channel(CanonicalReading::default()).0,
                sensors: watch::channel(SensorTable::new()).0,
                status: watch::channel(ConnectionStatus::default()).0,
                logs: watch::channel(Vec::new()).0,
                ports: watch::channel(Vec::new()).0,
            }),
        }
    }

    /// Latest canonical reading across all devices
    pub fn latest(&self) -> CanonicalReading {
        self.registers.latest.borrow().clone()
    }

    /// Snapshot of the per-device table
    pub fn sensors(&self) -> SensorTable {
        self.registers.sensors.borrow().clone()
    }

    /// Connection and collection status
    pub fn status(&self) -> ConnectionStatus {
        *self.registers.status.borrow()
    }

    /// Operator log lines, oldest first
    pub fn logs(&self) -> Vec<String> {
        self.registers.logs.borrow().clone()
    }

    /// Serial ports reported by the collection service
    pub fn available_ports(&self) -> Vec<SerialPortInfo> {
        self.registers.ports.borrow().clone()
    }

    /// Watch the most recent reading
    pub fn subscribe_latest(&self) -> watch::Receiver<CanonicalReading> {
        self.registers.latest.subscribe()
    }

    /// Watch the per-device table
    pub fn subscribe_sensors(&self) -> watch::Receiver<SensorTable> {
        self.registers.sensors.subscribe()
    }

    /// Watch connection and collection status
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.registers.status.subscribe()
    }

    /// Watch the operator log
    pub fn subscribe_logs(&self) -> watch::Receiver<Vec<String>> {
        self.registers.logs.subscribe()
    }

    /// Watch the serial port list
    pub fn subscribe_ports(&self) -> watch::Receiver<Vec<SerialPortInfo>> {
        self.registers.ports.subscribe()
    }

    pub(crate) fn publish_table(&self, table: &SensorTable) {
        if let Some(latest) = table.latest() {
            self.registers.latest.send_replace(latest.clone());
        }
        self.registers.sensors.send_replace(table.clone());
    }

    pub(crate) fn set_connection_state(&self, state: ConnectionState) {
        self.registers.status.send_if_modified(|status| {
            let changed = status.state != state;
            status.state = state;
            changed
        });
    }

    pub(crate) fn set_collection(&self, is_collecting: bool, source: Option<DataSource>) {
        self.registers.status.send_modify(|status| {
            status.is_collecting = is_collecting;
            status.data_source = source;
        });
    }

    pub(crate) fn publish_logs(&self, lines: Vec<String>) {
        self.registers.logs.send_replace(lines);
    }

    pub(crate) fn set_ports(&self, ports: Vec<SerialPortInfo>) {
        self.registers.ports.send_replace(ports);
    }
}
