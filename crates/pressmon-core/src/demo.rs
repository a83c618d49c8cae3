//! Demo Mode - Simulated press rig for running without a backend
//!
//! Generates ingest messages for a heat press cycling through load, press,
//! hold and release with the heater warming toward its set point.
//! [`DemoConnector`] serves those messages as a streaming connection so the
//! full telemetry path can be exercised offline.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::normalize::INGEST_EVENT;
use crate::telemetry::{Connector, SocketEvent, SocketHandle};

/// Heater set point in °C
pub const HEATER_SET_POINT: f64 = 182.5;
/// Ambient temperature the heater starts from
const AMBIENT_C: f64 = 24.0;
/// Press-top distance when open, in mm
const OPEN_MM: f64 = 60.0;
/// Press-top distance when closed, in mm
const CLOSED_MM: f64 = 20.0;
/// Line pressure when idle, in kPa
const IDLE_KPA: f64 = 2.0;

/// Simulated press rig
pub struct DemoSimulator {
    device_id: String,
    /// Time of the first update (ms)
    start_time_ms: Option<u64>,
    /// Time of the next cycle (ms from start)
    next_cycle_at_ms: u64,
    phase: PressPhase,
    /// Peak pressure of the current cycle
    peak_kpa: f64,
    /// Whether the operator reaches in during this cycle's load phase
    hand_in_cycle: bool,
    rng: StdRng,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PressPhase {
    /// Press open, plate empty
    Idle,
    /// Bread placed on the plate
    Loading { start_ms: u64 },
    /// Press top coming down
    Pressing { start_ms: u64 },
    /// Press closed at pressure
    Hold { start_ms: u64 },
    /// Press top going back up
    Releasing { start_ms: u64 },
}

const LOADING_MS: u64 = 1500;
const PRESSING_MS: u64 = 1200;
const HOLD_MS: u64 = 3000;
const RELEASING_MS: u64 = 1000;

impl Default for DemoSimulator {
    fn default() -> Self {
        Self::new("demo-press-01")
    }
}

impl DemoSimulator {
    /// Create a simulator for `device_id`
    pub fn new(device_id: &str) -> Self {
        Self::with_rng(device_id, StdRng::from_entropy())
    }

    /// Deterministic simulator
    pub fn with_seed(device_id: &str, seed: u64) -> Self {
        Self::with_rng(device_id, StdRng::seed_from_u64(seed))
    }

    fn with_rng(device_id: &str, mut rng: StdRng) -> Self {
        let first_cycle = rng.gen_range(1000..3000);
        Self {
            device_id: device_id.to_string(),
            start_time_ms: None,
            next_cycle_at_ms: first_cycle,
            phase: PressPhase::Idle,
            peak_kpa: 0.0,
            hand_in_cycle: false,
            rng,
        }
    }

    /// Device id stamped on every message
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Advance the simulation and build the reading for `elapsed_ms`
    ///
    /// Field names follow the collection backend (`pressao_kPa`), so the
    /// output exercises the normalizer's alias handling.
    pub fn update(&mut self, elapsed_ms: u64) -> Value {
        let start = *self.start_time_ms.get_or_insert(elapsed_ms);
        let sim_time = elapsed_ms.saturating_sub(start);

        self.update_phase(sim_time);

        let t = sim_time as f64 / 1000.0;

        // Heater warms toward its set point with a small control ripple
        let temperature = AMBIENT_C
            + (HEATER_SET_POINT - AMBIENT_C) * (1.0 - (-t / 45.0).exp())
            + 0.6 * (t * 0.8).sin();

        let (distance, pressure, bread, hand) = match self.phase {
            PressPhase::Idle => (OPEN_MM, IDLE_KPA, false, false),
            PressPhase::Loading { start_ms } => {
                let reaching = self.hand_in_cycle && sim_time - start_ms < LOADING_MS / 2;
                (OPEN_MM, IDLE_KPA, true, reaching)
            }
            PressPhase::Pressing { start_ms } => {
                let progress = progress(sim_time, start_ms, PRESSING_MS);
                (
                    OPEN_MM + (CLOSED_MM - OPEN_MM) * progress,
                    IDLE_KPA + (self.peak_kpa - IDLE_KPA) * progress,
                    true,
                    false,
                )
            }
            PressPhase::Hold { .. } => (
                CLOSED_MM,
                self.peak_kpa + 1.5 * (t * 5.0).sin(),
                true,
                false,
            ),
            PressPhase::Releasing { start_ms } => {
                let progress = progress(sim_time, start_ms, RELEASING_MS);
                (
                    CLOSED_MM + (OPEN_MM - CLOSED_MM) * progress,
                    self.peak_kpa + (IDLE_KPA - self.peak_kpa) * progress,
                    true,
                    false,
                )
            }
        };

        json!({
            "event": INGEST_EVENT,
            "reading": {
                "device_id": self.device_id,
                "temperature": round2(temperature),
                "pressao_kPa": round2(pressure.max(0.0)),
                "distance": round2(distance),
                "ir_bread": bread,
                "ir_hand": hand,
            }
        })
    }

    /// Advance the press-cycle state machine
    fn update_phase(&mut self, sim_time: u64) {
        match self.phase {
            PressPhase::Idle => {
                if sim_time >= self.next_cycle_at_ms {
                    self.peak_kpa = self.rng.gen_range(85.0..110.0);
                    self.hand_in_cycle = self.rng.gen_bool(0.3);
                    self.phase = PressPhase::Loading { start_ms: sim_time };
                }
            }
            PressPhase::Loading { start_ms } => {
                if sim_time >= start_ms + LOADING_MS {
                    self.phase = PressPhase::Pressing { start_ms: sim_time };
                }
            }
            PressPhase::Pressing { start_ms } => {
                if sim_time >= start_ms + PRESSING_MS {
                    self.phase = PressPhase::Hold { start_ms: sim_time };
                }
            }
            PressPhase::Hold { start_ms } => {
                if sim_time >= start_ms + HOLD_MS {
                    self.phase = PressPhase::Releasing { start_ms: sim_time };
                }
            }
            PressPhase::Releasing { start_ms } => {
                if sim_time >= start_ms + RELEASING_MS {
                    self.phase = PressPhase::Idle;
                    self.next_cycle_at_ms = sim_time + self.rng.gen_range(2000..5000);
                }
            }
        }
    }
}

fn progress(now_ms: u64, start_ms: u64, length_ms: u64) -> f64 {
    (now_ms.saturating_sub(start_ms) as f64 / length_ms as f64).min(1.0)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Serves [`DemoSimulator`] output as a streaming connection
#[derive(Debug, Clone)]
pub struct DemoConnector {
    device_id: String,
    period: Duration,
}

impl Default for DemoConnector {
    fn default() -> Self {
        Self::new("demo-press-01", Duration::from_millis(200))
    }
}

impl DemoConnector {
    /// One message every `period` for `device_id`
    pub fn new(device_id: &str, period: Duration) -> Self {
        Self {
            device_id: device_id.to_string(),
            period: period.max(Duration::from_millis(1)),
        }
    }
}

impl Connector for DemoConnector {
    fn open(&self, url: &str) -> SocketHandle {
        tracing::info!("Demo stream standing in for {url}");
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(run_demo(
            DemoSimulator::new(&self.device_id),
            self.period,
            tx,
            cancel.clone(),
        ));
        SocketHandle::new(rx, cancel)
    }
}

async fn run_demo(
    mut simulator: DemoSimulator,
    period: Duration,
    events: mpsc::UnboundedSender<SocketEvent>,
    cancel: CancellationToken,
) {
    if events.send(SocketEvent::Opened).is_err() {
        return;
    }

    let started = tokio::time::Instant::now();
    let mut ticker = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let message = simulator.update(elapsed_ms).to_string();
                if events.send(SocketEvent::Message(message)).is_err() {
                    return;
                }
            }
        }
    }

    let _ = events.send(SocketEvent::Closed(None));
}
