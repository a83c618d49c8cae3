//! Terminal rendering of monitor state

use pressmon_core::chart::{ChartHistory, TemperatureBand};
use pressmon_core::command::SerialPortInfo;
use pressmon_core::config::MonitorConfig;
use pressmon_core::reading::CanonicalReading;
use pressmon_core::telemetry::{ConnectionState, ConnectionStatus};
use pressmon_core::visual::FrameState;
use serde_json::json;
use std::fmt::Write as _;

/// Status badge text
pub fn status_label(status: &ConnectionStatus) -> String {
    let connection = match status.state {
        ConnectionState::Connected => "connected",
        ConnectionState::Connecting => "connecting",
        ConnectionState::Disconnected => "disconnected",
    };
    match (status.is_collecting, status.data_source) {
        (true, Some(source)) => format!("{connection}, collecting {source}"),
        (true, None) => format!("{connection}, collecting"),
        (false, _) => connection.to_string(),
    }
}

/// One status line: connection, reading, chart ranges and scene pose
pub fn hud_line(
    status: &ConnectionStatus,
    reading: Option<&CanonicalReading>,
    frame: &FrameState,
    chart: &ChartHistory,
) -> String {
    let mut line = format!("[{}]", status_label(status));

    match reading {
        Some(r) => {
            let band = TemperatureBand::classify(r.temperature);
            let _ = write!(line, " {} {} ({})", r.device_id, r.summary(), band.color());
        }
        None => line.push_str(" waiting for data"),
    }

    if let Some(t) = chart.temperature_stats() {
        let _ = write!(line, " | T {:.1}..{:.1}", t.min, t.max);
    }
    if let Some(p) = chart.pressure_stats() {
        let _ = write!(line, " P {:.1}..{:.1}", p.min, p.max);
    }
    if let Some(y) = frame.press_top_y {
        let _ = write!(line, " | top y={y:.4}");
    }
    let c = frame.camera_position;
    let _ = write!(line, " cam=({:.2}, {:.2}, {:.2})", c.x, c.y, c.z);
    line
}

/// Machine-readable status line
pub fn hud_json(
    status: &ConnectionStatus,
    reading: Option<&CanonicalReading>,
    frame: &FrameState,
    chart: &ChartHistory,
) -> String {
    let c = frame.camera_position;
    json!({
        "status": status,
        "reading": reading,
        "chart_points": chart.len(),
        "press_top_y": frame.press_top_y,
        "bread_visible": frame.bread_visible,
        "hand_visible": frame.hand_visible,
        "camera": [c.x, c.y, c.z],
    })
    .to_string()
}

/// Lines of `lines` that come after `previous_last`. Everything is new when
/// the previous last line has been evicted or there was none.
pub fn new_lines<'a>(previous_last: Option<&str>, lines: &'a [String]) -> &'a [String] {
    let Some(previous) = previous_last else {
        return lines;
    };
    match lines.iter().rposition(|l| l == previous) {
        Some(pos) => &lines[pos + 1..],
        None => lines,
    }
}

pub fn ports_table(ports: &[SerialPortInfo]) -> String {
    if ports.is_empty() {
        return "no serial ports found\n".to_string();
    }
    let mut out = String::new();
    for port in ports {
        let _ = write!(out, "{}", port.device);
        if let Some(name) = &port.name {
            let _ = write!(out, "  {name}");
        }
        if let Some(description) = &port.description {
            let _ = write!(out, "  - {description}");
        }
        out.push('\n');
    }
    out
}

pub fn config_table(config: &MonitorConfig) -> String {
    let rows = [
        ("ws_url", config.ws_url.clone()),
        ("api_url", config.api_url.clone()),
        ("serial_port", config.serial_port.clone()),
        ("baud_rate", config.baud_rate.to_string()),
        ("device_id", config.device_id.clone()),
        ("auto_connect", config.auto_connect.to_string()),
        ("auto_reconnect", config.auto_reconnect.to_string()),
        ("log_limit", config.log_limit.to_string()),
    ];
    let mut out = String::new();
    for (key, value) in rows {
        let _ = writeln!(out, "{key:<15} {value}");
    }
    out
}
