//! Tests for the per-frame visual driver fed from the store

mod common;

#[cfg(test)]
mod tests {
    use super::common::{ingest, settle, MockConnector};
    use nalgebra::Vector3;
    use pressmon_core::config::MonitorConfig;
    use pressmon_core::monitor::Monitor;
    use pressmon_core::visual::{
        distance_to_offset, CameraPreset, InMemoryScene, VisualDriver, EASING_FACTOR,
    };
    use std::sync::Arc;

    #[test]
    fn test_offset_mapping() {
        assert!((distance_to_offset(20.0) - 0.03).abs() < 1e-12);
        assert!(distance_to_offset(40.0).abs() < 1e-12);
        assert!((distance_to_offset(60.0) + 0.03).abs() < 1e-12);
        assert_eq!(distance_to_offset(5.0), distance_to_offset(20.0));
        assert_eq!(distance_to_offset(90.0), distance_to_offset(60.0));
        assert!(distance_to_offset(30.0) > distance_to_offset(50.0));
    }

    #[test]
    fn test_orbit_then_preset_eases_gradually() {
        let mut scene = InMemoryScene::press_model();
        let mut driver = VisualDriver::new();
        driver.bind(&scene);

        driver.camera_mut().begin_manual_orbit();
        driver.camera_mut().set_manual_position(Vector3::new(-4.0, 1.0, -4.0));
        let held = driver.frame(&mut scene, None).camera_position;
        assert_eq!(held, Vector3::new(-4.0, 1.0, -4.0));

        driver.camera_mut().apply_preset(CameraPreset::Side);
        assert!(driver.camera().auto_follow);

        let target = CameraPreset::Side.position();
        let mut previous = (held - target).norm();
        for _ in 0..20 {
            let frame = driver.frame(&mut scene, None);
            let remaining = (frame.camera_position - target).norm();
            assert!(remaining < previous);
            assert!((previous - remaining) / previous - EASING_FACTOR < 1e-9);
            assert_eq!(frame.look_at, Vector3::zeros());
            previous = remaining;
        }
        assert!(previous > 0.0, "camera snapped instead of easing");
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_follow_published_reading() {
        let connector = MockConnector::new();
        let monitor = Monitor::mount(MonitorConfig::default(), Arc::new(connector.clone()));
        settle().await;

        let socket = connector.socket(0);
        socket.open();
        socket.message(&ingest("press-01", 182.0, 100.0, 20.0));
        settle().await;

        let mut scene = InMemoryScene::press_model();
        let mut driver = VisualDriver::new();
        driver.bind(&scene);

        let latest = monitor.store().latest();
        let mut y = 0.0;
        for _ in 0..120 {
            y = driver.frame(&mut scene, Some(&latest)).press_top_y.unwrap();
        }
        assert!((y - 1.23).abs() < 1e-6);

        monitor.unmount().await;
    }
}
