//! Monitor scope
//!
//! Wires the sensor store, the telemetry service and the command dispatcher
//! together for the lifetime of one UI scope. Mounting connects when the
//! configuration asks for it; unmounting closes the socket, cancels the
//! reconnect timer and waits for the service task to finish.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::command::CommandDispatcher;
use crate::config::MonitorConfig;
use crate::store::SensorStore;
use crate::telemetry::{Connector, TelemetryHandle, TelemetryService, WsConnector};

/// A mounted monitor
pub struct Monitor {
    config: MonitorConfig,
    store: SensorStore,
    telemetry: TelemetryHandle,
    commands: CommandDispatcher,
    task: JoinHandle<()>,
}

impl Monitor {
    /// Mount with the WebSocket transport
    pub fn mount_ws(config: MonitorConfig) -> Self {
        Self::mount(config, Arc::new(WsConnector))
    }

    /// Mount with any transport. Must be called inside a tokio runtime.
    pub fn mount(config: MonitorConfig, connector: Arc<dyn Connector>) -> Self {
        let store = SensorStore::new();
        let (telemetry, task) = TelemetryService::spawn(&config, store.clone(), connector);
        let commands = CommandDispatcher::new(&config.api_url, telemetry.clone(), store.clone());

        if config.auto_connect {
            // The service was spawned just above, so it is still receiving
            if let Err(e) = telemetry.connect() {
                tracing::error!("auto-connect failed: {e}");
            }
        }

        tracing::info!(
            ws = %config.ws_url,
            api = %config.api_url,
            "Monitor mounted"
        );

        Self {
            config,
            store,
            telemetry,
            commands,
            task,
        }
    }

    /// Configuration the monitor was mounted with
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Shared state registers
    pub fn store(&self) -> &SensorStore {
        &self.store
    }

    /// Handle to the telemetry service
    pub fn telemetry(&self) -> &TelemetryHandle {
        &self.telemetry
    }

    /// Collection service client
    pub fn commands(&self) -> &CommandDispatcher {
        &self.commands
    }

    /// Tear everything down. No callback fires afterwards.
    pub async fn unmount(self) {
        if self.telemetry.shutdown().is_err() {
            tracing::debug!("telemetry service already stopped");
        }
        if let Err(e) = self.task.await {
            tracing::error!("telemetry service task failed: {e}");
        }
        tracing::info!("Monitor unmounted");
    }
}
