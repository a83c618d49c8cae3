//! Tests for the telemetry connection lifecycle

mod common;

#[cfg(test)]
mod tests {
    use super::common::{ingest, settle, MockConnector};
    use pressmon_core::config::MonitorConfig;
    use pressmon_core::monitor::Monitor;
    use pressmon_core::telemetry::{ConnectionState, RECONNECT_DELAY};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn config(auto_connect: bool) -> MonitorConfig {
        MonitorConfig {
            ws_url: "ws://rig.local:4000/sensor/ws".to_string(),
            auto_connect,
            ..MonitorConfig::default()
        }
    }

    fn mount(auto_connect: bool) -> (Monitor, MockConnector) {
        let connector = MockConnector::new();
        let monitor = Monitor::mount(config(auto_connect), Arc::new(connector.clone()));
        (monitor, connector)
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_connect_on_mount() {
        let (monitor, connector) = mount(true);
        settle().await;

        assert_eq!(connector.opened(), 1);
        assert_eq!(connector.socket(0).url, "ws://rig.local:4000/sensor/ws");
        assert_eq!(monitor.store().status().state, ConnectionState::Connecting);

        connector.socket(0).open();
        settle().await;
        assert!(monitor.store().status().is_connected());

        monitor.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_connect_opens_one_socket() {
        let (monitor, connector) = mount(false);
        settle().await;
        assert_eq!(connector.opened(), 0);

        monitor.telemetry().connect().unwrap();
        monitor.telemetry().connect().unwrap();
        settle().await;
        connector.socket(0).open();
        settle().await;
        monitor.telemetry().connect().unwrap();
        settle().await;

        assert_eq!(connector.opened(), 1);
        monitor.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_once_per_close_after_backoff() {
        let (monitor, connector) = mount(true);
        settle().await;
        connector.socket(0).open();
        settle().await;

        connector.socket(0).close();
        settle().await;
        assert_eq!(monitor.store().status().state, ConnectionState::Disconnected);

        tokio::time::sleep(RECONNECT_DELAY - Duration::from_millis(50)).await;
        assert_eq!(connector.opened(), 1, "reconnected before the back-off");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(connector.opened(), 2);

        // No further attempts while the new socket is alive
        tokio::time::sleep(RECONNECT_DELAY * 3).await;
        assert_eq!(connector.opened(), 2);

        monitor.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_reconnect_when_disabled() {
        let connector = MockConnector::new();
        let monitor = Monitor::mount(
            MonitorConfig {
                auto_reconnect: false,
                ..config(true)
            },
            Arc::new(connector.clone()),
        );
        settle().await;
        connector.socket(0).close();

        tokio::time::sleep(RECONNECT_DELAY * 2).await;
        assert_eq!(connector.opened(), 1);
        monitor.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_reconnect() {
        let (monitor, connector) = mount(true);
        settle().await;
        connector.socket(0).close();
        settle().await;

        monitor.telemetry().disconnect().unwrap();
        tokio::time::sleep(RECONNECT_DELAY * 2).await;

        assert_eq!(connector.opened(), 1);
        assert_eq!(monitor.store().status().state, ConnectionState::Disconnected);
        monitor.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_closes_socket_and_is_idempotent() {
        let (monitor, connector) = mount(true);
        settle().await;
        connector.socket(0).open();
        settle().await;

        monitor.telemetry().disconnect().unwrap();
        monitor.telemetry().disconnect().unwrap();
        settle().await;

        assert!(connector.socket(0).is_cancelled());
        assert_eq!(monitor.store().status().state, ConnectionState::Disconnected);
        let manual = monitor
            .store()
            .logs()
            .iter()
            .filter(|l| l.ends_with("Manual disconnect"))
            .count();
        assert_eq!(manual, 1);

        tokio::time::sleep(RECONNECT_DELAY * 2).await;
        assert_eq!(connector.opened(), 1);
        monitor.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_reconnect_is_immediate() {
        let (monitor, connector) = mount(true);
        settle().await;
        connector.socket(0).open();
        settle().await;

        monitor.commands().reconnect().unwrap();
        settle().await;

        assert!(connector.socket(0).is_cancelled());
        assert_eq!(connector.opened(), 2);
        assert_eq!(monitor.store().status().state, ConnectionState::Connecting);
        monitor.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_device_ingest_keeps_latest_values() {
        let (monitor, connector) = mount(true);
        settle().await;
        let socket = connector.socket(0);
        socket.open();
        socket.message(&ingest("press-01", 170.0, 90.0, 58.0));
        socket.message(&ingest("press-01", 182.0, 101.5, 21.0));
        settle().await;

        let table = monitor.store().sensors();
        assert_eq!(table.len(), 1);
        let reading = table.get("press-01").unwrap();
        assert_eq!(reading.temperature, 182.0);
        assert_eq!(reading.pressure, 101.5);
        assert_eq!(reading.distance, 21.0);
        assert_eq!(monitor.store().latest().device_id, "press-01");

        monitor.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_devices_are_tracked_separately() {
        let (monitor, connector) = mount(true);
        settle().await;
        let socket = connector.socket(0);
        socket.message(&ingest("press-01", 170.0, 90.0, 58.0));
        socket.message(&ingest("press-02", 60.0, 10.0, 40.0));
        settle().await;

        let table = monitor.store().sensors();
        assert_eq!(table.device_ids(), vec!["press-01", "press-02"]);
        assert_eq!(monitor.store().latest().device_id, "press-02");
        monitor.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_frame_is_logged_not_stored() {
        let (monitor, connector) = mount(true);
        settle().await;
        let socket = connector.socket(0);
        socket.open();
        socket.message("{\"event\":\"ingest\",\"reading\":");
        settle().await;

        assert!(monitor.store().sensors().is_empty());
        let logs = monitor.store().logs();
        assert!(logs.last().unwrap().ends_with("{\"event\":\"ingest\",\"reading\":"));
        monitor.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_new_readings() {
        let (monitor, connector) = mount(true);
        let mut latest = monitor.store().subscribe_latest();
        settle().await;

        connector.socket(0).message(&ingest("press-01", 150.0, 0.0, 60.0));
        latest.changed().await.unwrap();
        assert_eq!(latest.borrow().temperature, 150.0);
        monitor.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_closes_socket_and_stops_timers() {
        let (monitor, connector) = mount(true);
        settle().await;
        connector.socket(0).close();
        settle().await;

        let store = monitor.store().clone();
        let telemetry = monitor.telemetry().clone();
        monitor.unmount().await;

        tokio::time::sleep(RECONNECT_DELAY * 2).await;
        assert_eq!(connector.opened(), 1);
        assert_eq!(store.status().state, ConnectionState::Disconnected);
        assert!(telemetry.connect().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_logs() {
        let (monitor, connector) = mount(true);
        settle().await;
        connector.socket(0).open();
        monitor.telemetry().add_log("operator note").unwrap();
        settle().await;
        assert!(monitor.store().logs().iter().any(|l| l.ends_with("operator note")));

        monitor.telemetry().clear_logs().unwrap();
        settle().await;
        assert!(monitor.store().logs().is_empty());
        monitor.unmount().await;
    }
}
