//! Tests for the production connectors

mod common;

#[cfg(test)]
mod tests {
    use super::common::init_tracing;
    use pressmon_core::config::MonitorConfig;
    use pressmon_core::demo::DemoConnector;
    use pressmon_core::monitor::Monitor;
    use pressmon_core::telemetry::{
        ConnectionState, Connector, SocketEvent, TelemetryError, WsConnector,
    };
    use std::sync::Arc;
    use std::time::Duration;

    const REFUSED_URL: &str = "ws://127.0.0.1:1/ws";

    fn retries(lines: &[String]) -> usize {
        lines.iter().filter(|l| l.ends_with("Retrying in 5s...")).count()
    }

    async fn within<F: std::future::Future>(future: F) -> F::Output {
        tokio::time::timeout(Duration::from_secs(10), future)
            .await
            .expect("timed out")
    }

    #[tokio::test]
    async fn test_ws_refused_reports_error_then_closed() {
        init_tracing();
        let mut socket = WsConnector.open(REFUSED_URL);

        let first = within(socket.next_event()).await;
        assert!(
            matches!(first, Some(SocketEvent::Error(TelemetryError::ConnectionFailed(_)))),
            "unexpected first event: {first:?}"
        );
        assert_eq!(within(socket.next_event()).await, Some(SocketEvent::Closed(None)));
        assert_eq!(within(socket.next_event()).await, None);
    }

    #[tokio::test]
    async fn test_ws_close_before_connect() {
        let mut socket = WsConnector.open(REFUSED_URL);
        socket.close();

        // Whichever side wins the race, the stream ends with a close
        let mut last = None;
        while let Some(event) = within(socket.next_event()).await {
            last = Some(event);
        }
        assert_eq!(last, Some(SocketEvent::Closed(None)));
    }

    #[tokio::test]
    async fn test_monitor_on_refused_url_schedules_retry() {
        init_tracing();
        let config = MonitorConfig {
            ws_url: REFUSED_URL.to_string(),
            auto_connect: true,
            ..MonitorConfig::default()
        };
        let monitor = Monitor::mount_ws(config);

        let mut logs = monitor.store().subscribe_logs();
        within(logs.wait_for(|lines| retries(lines) == 1)).await.unwrap();

        let lines = monitor.store().logs();
        assert!(lines.iter().any(|l| l.contains("WebSocket error: Connection failed")));
        assert!(lines.iter().any(|l| l.ends_with("Disconnected.")));
        assert_eq!(monitor.store().status().state, ConnectionState::Disconnected);

        // The failed socket is gone, so a fresh connect goes through
        monitor.telemetry().connect().unwrap();
        within(logs.wait_for(|lines| retries(lines) == 2)).await.unwrap();
        monitor.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_connector_fills_table() {
        let config = MonitorConfig {
            auto_connect: true,
            ..MonitorConfig::default()
        };
        let connector = DemoConnector::new("demo-rig", Duration::from_millis(10));
        let monitor = Monitor::mount(config, Arc::new(connector));

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(monitor.store().status().state, ConnectionState::Connected);
        let sensors = monitor.store().sensors();
        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors.device_ids(), vec!["demo-rig"]);
        assert_eq!(monitor.store().latest().device_id, "demo-rig");
        assert!(monitor.store().logs().iter().any(|l| l.ends_with("Connected to WebSocket")));

        monitor.telemetry().disconnect().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(monitor.store().status().state, ConnectionState::Disconnected);
        monitor.unmount().await;
    }
}
