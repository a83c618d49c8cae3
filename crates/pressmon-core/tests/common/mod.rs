//! Shared test fixtures

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pressmon_core::telemetry::{Connector, SocketEvent, SocketHandle};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Server side of one socket opened through [`MockConnector`]
#[derive(Clone)]
pub struct MockSocket {
    pub url: String,
    pub events: mpsc::UnboundedSender<SocketEvent>,
    pub cancel: CancellationToken,
}

impl MockSocket {
    pub fn open(&self) {
        let _ = self.events.send(SocketEvent::Opened);
    }

    pub fn message(&self, text: &str) {
        let _ = self.events.send(SocketEvent::Message(text.to_string()));
    }

    pub fn close(&self) {
        let _ = self.events.send(SocketEvent::Closed(None));
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Connector recording every socket it opens; the test drives the events
#[derive(Clone, Default)]
pub struct MockConnector {
    sockets: Arc<Mutex<Vec<MockSocket>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> usize {
        self.sockets.lock().unwrap().len()
    }

    pub fn socket(&self, index: usize) -> MockSocket {
        self.sockets.lock().unwrap()[index].clone()
    }

    pub fn last(&self) -> MockSocket {
        self.sockets
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no socket opened")
    }
}

impl Connector for MockConnector {
    fn open(&self, url: &str) -> SocketHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        self.sockets.lock().unwrap().push(MockSocket {
            url: url.to_string(),
            events: tx,
            cancel: cancel.clone(),
        });
        SocketHandle::new(rx, cancel)
    }
}

/// Route library logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("pressmon_core=debug")
        .with_test_writer()
        .try_init()
        .ok();
}

/// Let spawned tasks run. Time is paused in these tests, so this only yields.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub fn ingest(device: &str, temperature: f64, pressure_kpa: f64, distance: f64) -> String {
    serde_json::json!({
        "event": "ingest",
        "reading": {
            "device_id": device,
            "temperature": temperature,
            "pressao_kPa": pressure_kpa,
            "distance": distance,
        }
    })
    .to_string()
}
