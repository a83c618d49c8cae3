//! Subcommand handlers

use anyhow::{Context as _, Result};
use pressmon_core::chart::ChartHistory;
use pressmon_core::command::{SerialParams, StartRequest};
use pressmon_core::config::{ConfigStore, MonitorConfig};
use pressmon_core::demo::DemoConnector;
use pressmon_core::monitor::Monitor;
use pressmon_core::telemetry::{Connector, DataSource, WsConnector};
use pressmon_core::visual::{CameraPreset, FrameState, InMemoryScene, VisualDriver};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::output;

/// Resolved configuration plus output mode
pub struct Context {
    store: ConfigStore,
    config: MonitorConfig,
    json: bool,
}

impl Context {
    /// Load the saved config and apply command-line overrides. Overrides are
    /// not written back.
    pub fn load(
        config_dir: Option<PathBuf>,
        ws_url: Option<String>,
        api_url: Option<String>,
        json: bool,
    ) -> Result<Self> {
        let store = match config_dir {
            Some(dir) => ConfigStore::at(dir),
            None => ConfigStore::default_location()?,
        };
        let mut config = store.load();
        if let Some(url) = ws_url {
            config.ws_url = url;
        }
        if let Some(url) = api_url {
            config.api_url = url;
        }
        Ok(Self {
            store,
            config,
            json,
        })
    }

    /// Monitor without a stream, for one-shot service commands
    fn mount_offline(&self) -> Monitor {
        let config = MonitorConfig {
            auto_connect: false,
            ..self.config.clone()
        };
        Monitor::mount(config, Arc::new(WsConnector))
    }
}

/// Options of the live monitor
pub struct MonitorOptions {
    pub camera: CameraPreset,
    pub fps: u32,
    pub hud_interval: f64,
    pub duration: Option<f64>,
}

/// Live monitor loop: readings feed the chart history as they arrive, the
/// scene driver ticks at a fixed rate, and a status line is printed
/// periodically. Ends on Ctrl-C or after `duration`.
pub async fn monitor(ctx: &Context, options: MonitorOptions, demo_period_ms: Option<u64>) -> Result<()> {
    let connector: Arc<dyn Connector> = match demo_period_ms {
        Some(ms) => Arc::new(DemoConnector::new(
            &ctx.config.device_id,
            Duration::from_millis(ms),
        )),
        None => Arc::new(WsConnector),
    };

    let config = MonitorConfig {
        auto_connect: true,
        ..ctx.config.clone()
    };
    let monitor = Monitor::mount(config, connector);

    let mut scene = InMemoryScene::press_model();
    let mut driver = VisualDriver::new();
    driver.bind(&scene);
    driver.camera_mut().apply_preset(options.camera);

    let mut chart = ChartHistory::default();
    let mut readings = monitor.store().subscribe_latest();
    let mut logs = monitor.store().subscribe_logs();
    let mut last_log: Option<String> = None;
    let mut have_reading = false;
    let mut frame: Option<FrameState> = None;

    let mut frames = tokio::time::interval(Duration::from_secs_f64(1.0 / options.fps as f64));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut hud = tokio::time::interval(Duration::from_secs_f64(options.hud_interval));
    hud.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);
    let deadline = until(options.duration.map(Duration::from_secs_f64));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut interrupted => {
                tracing::info!("Interrupted");
                break;
            }
            _ = &mut deadline => break,
            changed = readings.changed() => {
                if changed.is_err() {
                    break;
                }
                let reading = readings.borrow_and_update().clone();
                chart.push_reading(&reading);
                have_reading = true;
            }
            changed = logs.changed() => {
                if changed.is_err() {
                    break;
                }
                let lines = logs.borrow_and_update().clone();
                if !ctx.json {
                    for line in output::new_lines(last_log.as_deref(), &lines) {
                        eprintln!("{line}");
                    }
                }
                last_log = lines.last().cloned();
            }
            _ = frames.tick() => {
                let latest = have_reading.then(|| monitor.store().latest());
                frame = Some(driver.frame(&mut scene, latest.as_ref()));
            }
            _ = hud.tick() => {
                if let Some(frame) = &frame {
                    let status = monitor.store().status();
                    let latest = have_reading.then(|| monitor.store().latest());
                    if ctx.json {
                        println!("{}", output::hud_json(&status, latest.as_ref(), frame, &chart));
                    } else {
                        println!("{}", output::hud_line(&status, latest.as_ref(), frame, &chart));
                    }
                }
            }
        }
    }

    monitor.unmount().await;
    Ok(())
}

async fn until(deadline: Option<Duration>) {
    match deadline {
        Some(after) => tokio::time::sleep(after).await,
        None => std::future::pending().await,
    }
}

pub async fn start_fake(ctx: &Context) -> Result<()> {
    let monitor = ctx.mount_offline();
    let result = monitor.commands().start(StartRequest::Fake).await;
    monitor.unmount().await;

    result.context("starting fake collection")?;
    println!("fake collection started");
    Ok(())
}

pub async fn start_serial(
    ctx: &Context,
    port: Option<String>,
    baud: Option<u32>,
    device_id: Option<String>,
) -> Result<()> {
    let mut params = SerialParams::from_config(&ctx.config);
    if let Some(port) = port {
        params.port = port;
    }
    if let Some(baud) = baud {
        params.baud_rate = baud;
    }
    if let Some(device_id) = device_id {
        params.device_id = device_id;
    }
    let summary = format!("{} @ {} baud ({})", params.port, params.baud_rate, params.device_id);

    let monitor = ctx.mount_offline();
    let result = monitor.commands().start(StartRequest::Serial(params)).await;
    monitor.unmount().await;

    result.context("starting serial collection")?;
    println!("serial collection started on {summary}");
    Ok(())
}

pub async fn stop(ctx: &Context, source: DataSource) -> Result<()> {
    let monitor = ctx.mount_offline();
    let result = monitor.commands().stop_source(source).await;
    monitor.unmount().await;

    result.with_context(|| format!("stopping {source} collection"))?;
    println!("{source} collection stopped");
    Ok(())
}

pub async fn ports(ctx: &Context) -> Result<()> {
    let monitor = ctx.mount_offline();
    let result = monitor.commands().list_ports().await;
    monitor.unmount().await;

    let ports = result.context("listing serial ports")?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
    } else {
        print!("{}", output::ports_table(&ports));
    }
    Ok(())
}

pub fn config_show(ctx: &Context) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&ctx.config)?);
    } else {
        print!("{}", output::config_table(&ctx.config));
    }
    Ok(())
}

pub fn config_set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    // Start from what is stored so command-line overrides are not persisted
    let mut config = ctx.store.load();
    config.set(key, value).with_context(|| format!("setting {key}"))?;
    ctx.store.save(&config).context("saving configuration")?;
    println!("{key} = {value}");
    Ok(())
}

pub fn config_reset(ctx: &Context) -> Result<()> {
    ctx.store
        .save(&MonitorConfig::default())
        .context("saving configuration")?;
    println!("configuration reset to defaults");
    Ok(())
}

pub fn config_path(ctx: &Context) -> Result<()> {
    println!("{}", ctx.store.path().display());
    Ok(())
}
