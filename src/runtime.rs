//! Periodic task runtime
//!
//! Mirrors the device's task layout: one independent periodic thread per
//! sensor producer, one for the inference engine, all communicating only
//! through the shared store and the transition channel. Producers and the
//! engine never share a stack and never block unbounded on each other; the
//! single mutex is always taken with a timeout and the channel send never
//! waits.
//!
//! On the device these tasks run for the lifetime of the process. The
//! shutdown path exists for hosts with bounded lifetimes — the test suite and
//! the CLI simulator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::channel::{TransitionChannel, TransitionRx};
use crate::config::RuntimeConfig;
use crate::engine::BehaviorEngine;
use crate::error::MindError;
use crate::store::SensorStore;
use crate::types::{SensorUpdate, StateTransition};

/// Longest single sleep while waiting out a period, so shutdown stays
/// responsive even for slow probes.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// A periodic measurement producer.
///
/// The seam behind which the real collaborators live: the wireless scanner,
/// the resource monitor, the input path. Each probe owns a subset of the
/// sensor record and is polled on its own period.
pub trait SensorProbe: Send + 'static {
    /// Name used for the probe's thread and log lines.
    fn name(&self) -> &str;

    /// How often the probe is polled.
    fn period(&self) -> Duration;

    /// Produce the probe's partial update for this cycle.
    fn poll(&mut self) -> SensorUpdate;
}

/// Handle over the spawned task set.
pub struct Runtime {
    store: Arc<SensorStore>,
    running: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
    transitions: TransitionRx,
}

impl Runtime {
    /// Spawn the engine task plus one task per probe.
    ///
    /// The engine polls the store every `config.engine_period_ms`, skipping
    /// the cycle (state frozen, logged) when the snapshot times out, and
    /// publishes transitions over a bounded queue of
    /// `config.channel_capacity`.
    pub fn spawn(
        mut engine: BehaviorEngine,
        config: RuntimeConfig,
        probes: Vec<Box<dyn SensorProbe>>,
    ) -> Result<Self, MindError> {
        config.validate()?;

        let store = Arc::new(SensorStore::new());
        let running = Arc::new(AtomicBool::new(true));
        let (tx, rx) = TransitionChannel::bounded(config.channel_capacity);
        let mut workers = Vec::with_capacity(probes.len() + 1);

        info!(
            engine_id = %engine.instance_id(),
            probes = probes.len(),
            period_ms = config.engine_period_ms,
            "spawning mind runtime"
        );

        for mut probe in probes {
            let thread_name = format!("probe-{}", probe.name());
            let period = probe.period();
            let timeout = Duration::from_millis(u64::from(config.update_timeout_ms));
            let store = Arc::clone(&store);
            let running = Arc::clone(&running);

            let handle = thread::Builder::new().name(thread_name).spawn(move || {
                run_periodic(&running, period, || {
                    let update = probe.poll();
                    // A timed-out merge is "no update this cycle"; the store
                    // already logs it.
                    let _ = store.update(&update, timeout);
                });
            })?;
            workers.push(handle);
        }

        {
            let period = Duration::from_millis(u64::from(config.engine_period_ms));
            let period_ms = config.engine_period_ms;
            let timeout = Duration::from_millis(u64::from(config.snapshot_timeout_ms));
            let store = Arc::clone(&store);
            let running = Arc::clone(&running);

            let handle = thread::Builder::new().name("mind-engine".into()).spawn(move || {
                run_periodic(&running, period, || match store.snapshot(timeout) {
                    Some(readings) => {
                        if let Some(event) = engine.tick(&readings, period_ms) {
                            let _ = tx.publish(event);
                        }
                    }
                    None => warn!("sensor snapshot timed out, inference cycle skipped"),
                });
            })?;
            workers.push(handle);
        }

        Ok(Self {
            store,
            running,
            workers,
            transitions: rx,
        })
    }

    /// The shared store, for producers that live outside the probe set.
    pub fn store(&self) -> Arc<SensorStore> {
        Arc::clone(&self.store)
    }

    /// Non-blocking poll of the transition queue.
    pub fn try_receive(&self) -> Option<StateTransition> {
        self.transitions.try_receive()
    }

    /// Stop every task and wait for it to exit.
    pub fn shutdown(mut self) {
        self.running.store(false, Ordering::Relaxed);
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("runtime task panicked during shutdown");
            }
        }
    }
}

/// Fixed-cadence loop: run the body, then sleep out the remainder of the
/// period, re-checking the running flag at most every [`SLEEP_SLICE`].
fn run_periodic(running: &AtomicBool, period: Duration, mut body: impl FnMut()) {
    let mut next_wake = Instant::now() + period;
    while running.load(Ordering::Relaxed) {
        body();
        while running.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now >= next_wake {
                break;
            }
            thread::sleep((next_wake - now).min(SLEEP_SLICE));
        }
        next_wake += period;
    }
}
