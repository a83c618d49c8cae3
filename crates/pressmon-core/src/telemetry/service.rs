//! Telemetry service task
//!
//! Single task that owns the [`ConnectionManager`], the live socket and the
//! pending reconnect timer. Commands and socket events are handled one at a
//! time, so connect / disconnect / reconnect never race each other and at most
//! one socket and one timer exist at any moment.

use chrono::Utc;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Sleep};

use super::{ConnectionManager, Connector, SocketEvent, SocketHandle, TelemetryError};
use crate::config::MonitorConfig;
use crate::store::SensorStore;

#[derive(Debug)]
enum Command {
    Connect,
    Disconnect,
    Reconnect,
    AddLog(String),
    ClearLogs,
    Shutdown,
}

enum Step {
    Command(Option<Command>),
    Socket(SocketEvent),
    ReconnectDue,
}

/// Cheap clonable handle for steering the telemetry service
#[derive(Debug, Clone)]
pub struct TelemetryHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl TelemetryHandle {
    fn send(&self, command: Command) -> Result<(), TelemetryError> {
        self.commands
            .send(command)
            .map_err(|_| TelemetryError::ServiceStopped)
    }

    /// Open the stream. No-op while a socket already exists.
    pub fn connect(&self) -> Result<(), TelemetryError> {
        self.send(Command::Connect)
    }

    /// Close the stream and cancel any pending reconnect
    pub fn disconnect(&self) -> Result<(), TelemetryError> {
        self.send(Command::Disconnect)
    }

    /// Close the current socket and open a fresh one right away
    pub fn reconnect(&self) -> Result<(), TelemetryError> {
        self.send(Command::Reconnect)
    }

    /// Append an operator log line
    pub fn add_log(&self, message: impl Into<String>) -> Result<(), TelemetryError> {
        self.send(Command::AddLog(message.into()))
    }

    /// Empty the operator log
    pub fn clear_logs(&self) -> Result<(), TelemetryError> {
        self.send(Command::ClearLogs)
    }

    /// Tear down the socket and timer and stop the service task
    pub fn shutdown(&self) -> Result<(), TelemetryError> {
        self.send(Command::Shutdown)
    }

    /// Whether the service task is still running
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// Owner of the streaming connection
pub struct TelemetryService {
    manager: ConnectionManager,
    connector: Arc<dyn Connector>,
    socket: Option<SocketHandle>,
    reconnect: Option<Pin<Box<Sleep>>>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl TelemetryService {
    /// Start the service task. Must be called inside a tokio runtime.
    pub fn spawn(
        config: &MonitorConfig,
        store: SensorStore,
        connector: Arc<dyn Connector>,
    ) -> (TelemetryHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = TelemetryService {
            manager: ConnectionManager::new(config, store),
            connector,
            socket: None,
            reconnect: None,
            commands: rx,
        };
        let task = tokio::spawn(service.run());
        (TelemetryHandle { commands: tx }, task)
    }

    async fn run(mut self) {
        tracing::debug!("Telemetry service started for {}", self.manager.url());

        loop {
            let step = tokio::select! {
                command = self.commands.recv() => Step::Command(command),
                event = next_socket_event(&mut self.socket) => Step::Socket(event),
                _ = reconnect_due(&mut self.reconnect) => Step::ReconnectDue,
            };

            match step {
                Step::Command(Some(Command::Connect)) => self.connect(),
                Step::Command(Some(Command::Disconnect)) => self.disconnect(),
                Step::Command(Some(Command::Reconnect)) => self.reconnect(),
                Step::Command(Some(Command::AddLog(message))) => self.manager.add_log(&message),
                Step::Command(Some(Command::ClearLogs)) => self.manager.clear_logs(),
                Step::Command(Some(Command::Shutdown)) | Step::Command(None) => break,
                Step::Socket(event) => self.handle_socket_event(event),
                Step::ReconnectDue => {
                    self.reconnect = None;
                    tracing::info!("Reconnecting to {}", self.manager.url());
                    self.connect();
                }
            }
        }

        self.teardown();
        tracing::debug!("Telemetry service stopped");
    }

    fn connect(&mut self) {
        if self.socket.is_some() {
            tracing::debug!("connect ignored: socket already open");
            return;
        }
        self.reconnect = None;
        self.manager.on_connecting();
        self.socket = Some(self.connector.open(self.manager.url()));
    }

    fn disconnect(&mut self) {
        self.reconnect = None;
        if let Some(socket) = self.socket.take() {
            socket.close();
            self.manager.on_manual_disconnect();
        }
    }

    fn reconnect(&mut self) {
        self.manager.add_log("Manual reconnect triggered");
        self.reconnect = None;
        if let Some(socket) = self.socket.take() {
            socket.close();
            self.manager.on_manual_disconnect();
        }
        self.connect();
    }

    fn handle_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Opened => self.manager.on_open(),
            SocketEvent::Message(text) => {
                self.manager.on_message(&text, Utc::now());
            }
            SocketEvent::Error(error) => {
                self.manager.on_error(&error);
                if let Some(socket) = &self.socket {
                    socket.close();
                }
            }
            SocketEvent::Closed(reason) => {
                self.socket = None;
                if let Some(delay) = self.manager.on_closed(reason.as_deref()) {
                    self.reconnect = Some(Box::pin(sleep(delay)));
                }
            }
        }
    }

    fn teardown(&mut self) {
        self.reconnect = None;
        if let Some(socket) = self.socket.take() {
            socket.close();
        }
        self.manager.on_shutdown();
    }
}

/// Next event from the live socket, or pending forever without one. A socket
/// whose I/O side vanished counts as closed.
async fn next_socket_event(socket: &mut Option<SocketHandle>) -> SocketEvent {
    match socket {
        Some(socket) => socket.next_event().await.unwrap_or(SocketEvent::Closed(None)),
        None => std::future::pending().await,
    }
}

async fn reconnect_due(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
