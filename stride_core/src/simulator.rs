//! Simulated walking: a periodic task that feeds random steps to the session.
//!
//! At most one task runs per simulator. Stopping is idempotent and dropping
//! the simulator stops it, so no ticking outlives its owner.

use crate::session::SessionEngine;
use crate::storage::KeyValueStore;
use crate::{Error, Result};
use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Session shared between the tracker and the simulation task
pub type SharedSession<S> = Arc<Mutex<SessionEngine<S>>>;

/// Smallest and largest number of steps added per tick
pub const STEPS_PER_TICK: std::ops::RangeInclusive<i64> = 1..=5;

/// Uniformly random step count for one tick
pub fn random_step_amount() -> i64 {
    rand::thread_rng().gen_range(STEPS_PER_TICK)
}

/// Running simulation task. Cancelled exactly once, by [`cancel`](Self::cancel) or on drop.
struct SimulationHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SimulationHandle {
    fn cancel(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
            self.task.abort();
            tracing::debug!("Walk simulation stopped");
        }
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct WalkSimulator {
    interval: Duration,
    handle: Option<SimulationHandle>,
}

impl WalkSimulator {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            handle: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Start ticking against `session`, replacing any running simulation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<S>(&mut self, session: SharedSession<S>) -> Result<()>
    where
        S: KeyValueStore + 'static,
    {
        if self.interval.is_zero() {
            return Err(Error::Config("simulation interval must be non-zero".into()));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| Error::Other("walk simulation needs a tokio runtime".into()))?;

        self.stop();

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let interval = self.interval;

        let task = runtime.spawn(async move {
            // First tick lands one full interval after start
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // Each tick persists through the store, so keep it off the executor
                        let session = session.clone();
                        match tokio::task::spawn_blocking(move || tick(&session)).await {
                            Ok(true) => {}
                            Ok(false) => break,
                            Err(e) => {
                                tracing::warn!("Walk simulation tick failed: {}", e);
                                break;
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Walk simulation received shutdown signal");
                        break;
                    }
                }
            }
        });

        tracing::info!("Walk simulation started ({:?} per tick)", interval);
        self.handle = Some(SimulationHandle {
            shutdown: Some(shutdown_tx),
            task,
        });
        Ok(())
    }

    /// Stop the running simulation. Returns whether one was running.
    ///
    /// A tick already writing on the blocking pool finishes; no new tick starts.
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(mut handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Flip between walking and paused. Returns the new active state.
    pub fn toggle<S>(&mut self, session: SharedSession<S>) -> Result<bool>
    where
        S: KeyValueStore + 'static,
    {
        if self.stop() {
            return Ok(false);
        }
        self.start(session)?;
        Ok(true)
    }
}

impl Drop for WalkSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Apply one tick. Returns false when the task should end.
fn tick<S: KeyValueStore>(session: &SharedSession<S>) -> bool {
    let amount = random_step_amount();
    match session.lock() {
        Ok(mut engine) => {
            if engine.is_retired() {
                return false;
            }
            let state = engine.add_steps(amount);
            tracing::trace!("Simulated {} steps, now {}", amount, state.step_count);
            true
        }
        Err(_) => {
            tracing::warn!("Session lock poisoned, stopping walk simulation");
            false
        }
    }
}
