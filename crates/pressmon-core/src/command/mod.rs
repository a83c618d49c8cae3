//! Command Dispatcher
//!
//! Sends user intents to the remote collection service over HTTP:
//!
//! - `POST {api}/fake/start` and `POST {api}/serial/start {port, baudrate, device_id}`
//! - `POST {api}/{source}/stop`
//! - `GET {api}/serial/ports`
//!
//! Each request is sent once. Its outcome is appended to the operator log as a
//! single line and reflected in the store's collection status; there is no
//! automatic retry.

mod error;

pub use error::CommandError;

use serde::{Deserialize, Serialize};

use crate::config::MonitorConfig;
use crate::store::SensorStore;
use crate::telemetry::{DataSource, TelemetryHandle};

/// A serial port reported by the collection service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialPortInfo {
    /// OS device path, e.g. `/dev/ttyUSB0`
    pub device: String,
    /// Human-readable port name
    #[serde(default)]
    pub name: Option<String>,
    /// Driver or adapter description
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /serial/start`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialParams {
    /// Serial device path
    pub port: String,
    /// Line speed
    #[serde(rename = "baudrate")]
    pub baud_rate: u32,
    /// Id the service stamps on readings
    pub device_id: String,
}

impl SerialParams {
    /// Parameters taken from the saved configuration
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            port: config.serial_port.clone(),
            baud_rate: config.baud_rate,
            device_id: config.device_id.clone(),
        }
    }
}

/// Which collection pipeline to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartRequest {
    /// Backend-side generated data
    Fake,
    /// Hardware rig on a serial port
    Serial(SerialParams),
}

impl StartRequest {
    /// Data source this request starts
    pub fn source(&self) -> DataSource {
        match self {
            StartRequest::Fake => DataSource::Fake,
            StartRequest::Serial(_) => DataSource::Serial,
        }
    }
}

/// `GET /serial/ports` response
#[derive(Debug, Deserialize)]
struct PortsResponse {
    ok: bool,
    ports: Vec<SerialPortInfo>,
    #[serde(default)]
    count: Option<usize>,
}

/// Client for the collection service
#[derive(Clone)]
pub struct CommandDispatcher {
    client: reqwest::Client,
    api_url: String,
    telemetry: TelemetryHandle,
    store: SensorStore,
}

impl CommandDispatcher {
    /// Create a dispatcher for `api_url` reporting into `store` and the
    /// telemetry log
    pub fn new(api_url: &str, telemetry: TelemetryHandle, store: SensorStore) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("PressMon/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            telemetry,
            store,
        }
    }

    /// Service base URL, without trailing slash
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    fn log(&self, message: String) {
        if self.telemetry.add_log(message).is_err() {
            tracing::debug!("dropping log line: telemetry service stopped");
        }
    }

    /// Start a collection pipeline on the service
    pub async fn start(&self, request: StartRequest) -> Result<(), CommandError> {
        let source = request.source();
        let url = self.endpoint(&format!("{}/start", source.path()));

        let builder = match &request {
            StartRequest::Fake => self.client.post(&url),
            StartRequest::Serial(params) => self.client.post(&url).json(params),
        };

        let outcome = match builder.send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(CommandError::Status {
                action: format!("start {source} collection"),
                status: response.status(),
            }),
            Err(e) => Err(CommandError::Http(e)),
        };

        match &outcome {
            Ok(()) => {
                tracing::info!("{source} collection started");
                self.store.set_collection(true, Some(source));
                match &request {
                    StartRequest::Serial(params) => self.log(format!(
                        "SERIAL collection started on {} @ {} baud ({})",
                        params.port, params.baud_rate, params.device_id
                    )),
                    StartRequest::Fake => self.log("FAKE collection started".to_string()),
                }
            }
            Err(e) => {
                tracing::warn!("start {source} failed: {e}");
                self.log(format!("Failed to start {source} collection: {e}"));
            }
        }
        outcome
    }

    /// Stop the active collection
    pub async fn stop(&self) -> Result<(), CommandError> {
        let Some(source) = self.store.status().data_source else {
            self.log("No active collection to stop".to_string());
            return Err(CommandError::NoActiveCollection);
        };
        self.stop_source(source).await
    }

    /// Stop `source` whether or not this process started it
    pub async fn stop_source(&self, source: DataSource) -> Result<(), CommandError> {
        let url = self.endpoint(&format!("{}/stop", source.path()));
        let outcome = match self.client.post(&url).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(CommandError::Status {
                action: format!("stop {source} collection"),
                status: response.status(),
            }),
            Err(e) => Err(CommandError::Http(e)),
        };

        match &outcome {
            Ok(()) => {
                tracing::info!("{source} collection stopped");
                self.store.set_collection(false, None);
                self.log(format!("Stopped {source} collection"));
            }
            Err(e) => {
                tracing::warn!("stop {source} failed: {e}");
                self.log(format!("Failed to stop {source} collection: {e}"));
            }
        }
        outcome
    }

    /// Refresh the list of serial ports. Any failure publishes an empty list.
    pub async fn list_ports(&self) -> Result<Vec<SerialPortInfo>, CommandError> {
        match self.fetch_ports().await {
            Ok(ports) => {
                self.log(format!("Found {} serial ports", ports.len()));
                self.store.set_ports(ports.clone());
                Ok(ports)
            }
            Err(e) => {
                tracing::warn!("listing serial ports failed: {e}");
                self.store.set_ports(Vec::new());
                self.log(format!("Failed to fetch serial ports: {e}"));
                Err(e)
            }
        }
    }

    async fn fetch_ports(&self) -> Result<Vec<SerialPortInfo>, CommandError> {
        let response = self.client.get(self.endpoint("serial/ports")).send().await?;

        if !response.status().is_success() {
            return Err(CommandError::Status {
                action: "list serial ports".to_string(),
                status: response.status(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        parse_ports(body)
    }

    /// Close the stream and open a fresh one right away
    pub fn reconnect(&self) -> Result<(), CommandError> {
        self.telemetry.reconnect()?;
        Ok(())
    }
}

/// Validate a `/serial/ports` body
fn parse_ports(body: serde_json::Value) -> Result<Vec<SerialPortInfo>, CommandError> {
    let parsed: PortsResponse = serde_json::from_value(body)
        .map_err(|e| CommandError::InvalidResponse(e.to_string()))?;

    if !parsed.ok {
        return Err(CommandError::InvalidResponse("ok=false".to_string()));
    }
    if let Some(count) = parsed.count {
        if count != parsed.ports.len() {
            tracing::debug!(
                "port count mismatch: count={count}, listed={}",
                parsed.ports.len()
            );
        }
    }
    Ok(parsed.ports)
}
