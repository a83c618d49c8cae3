//! Streaming transport
//!
//! A [`Connector`] starts opening a connection and immediately hands back a
//! [`SocketHandle`]; everything that happens afterwards (open, frames, errors,
//! close) arrives as [`SocketEvent`]s on that handle. Closing the handle
//! cancels the I/O task.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

use super::TelemetryError;

/// Something that happened on a socket
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    /// Connection established
    Opened,
    /// Text frame (binary frames are decoded lossily)
    Message(String),
    /// Transport failure; a `Closed` event always follows
    Error(TelemetryError),
    /// Connection gone, with the remote's reason if it gave one
    Closed(Option<String>),
}

/// Live connection handle owned by the connection manager
#[derive(Debug)]
pub struct SocketHandle {
    events: mpsc::UnboundedReceiver<SocketEvent>,
    cancel: CancellationToken,
}

impl SocketHandle {
    /// Wrap an event stream and the token that tears it down
    pub fn new(events: mpsc::UnboundedReceiver<SocketEvent>, cancel: CancellationToken) -> Self {
        Self { events, cancel }
    }

    /// Request the connection to close
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Next event; `None` once the I/O side has gone away
    pub async fn next_event(&mut self) -> Option<SocketEvent> {
        self.events.recv().await
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Opens streaming connections
pub trait Connector: Send + Sync + 'static {
    /// Begin connecting to `url`. Must not block; progress is reported on the
    /// returned handle.
    fn open(&self, url: &str) -> SocketHandle;
}

/// WebSocket connector backed by `tokio-tungstenite`
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&self, url: &str) -> SocketHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(run_socket(url.to_string(), tx, cancel.clone()));
        SocketHandle::new(rx, cancel)
    }
}

async fn run_socket(
    url: String,
    events: mpsc::UnboundedSender<SocketEvent>,
    cancel: CancellationToken,
) {
    let connected = tokio::select! {
        _ = cancel.cancelled() => {
            let _ = events.send(SocketEvent::Closed(None));
            return;
        }
        result = connect_async(url.as_str()) => result,
    };

    let mut stream = match connected {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::debug!("WebSocket connect to {url} failed: {e}");
            let _ = events.send(SocketEvent::Error(TelemetryError::ConnectionFailed(
                e.to_string(),
            )));
            let _ = events.send(SocketEvent::Closed(None));
            return;
        }
    };

    let _ = events.send(SocketEvent::Opened);

    let reason = loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(e) = stream.close(None).await {
                    tracing::debug!("WebSocket close handshake failed: {e}");
                }
                break None;
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(SocketEvent::Message(text));
                }
                Some(Ok(Message::Binary(bytes))) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    let _ = events.send(SocketEvent::Message(text));
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame
                        .map(|f| f.reason.to_string())
                        .filter(|reason| !reason.is_empty());
                }
                // Ping/pong are answered by tungstenite
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = events.send(SocketEvent::Error(TelemetryError::Transport(e.to_string())));
                    break None;
                }
                None => break None,
            }
        }
    };

    let _ = events.send(SocketEvent::Closed(reason));
}
