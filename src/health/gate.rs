//! Delayed, resettable boolean gate.
//!
//! # States
//! - Pending: `achieved == false`, a transition is scheduled for `deadline`
//! - Achieved: `achieved == true`, no deadline
//!
//! # State Transitions
//! ```text
//! Pending → Achieved: delay elapses with no newer reset (same generation)
//! Achieved → Pending: reset (straight back to Achieved when delay is zero)
//! Pending → Pending: reset restarts the window and bumps the generation
//! ```
//!
//! # Design Decisions
//! - Reads are a single atomic load, never blocked by writers
//! - Every scheduled transition carries the generation that created it; a
//!   transition whose generation is stale does nothing
//! - Aborting the previous timer is an optimisation, correctness rests on the
//!   generation check
//! - Reset and timer fire share one short critical section (the timer slot)
//! - A delay the clock cannot represent leaves the gate pending for good

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::observability::metrics;

/// Sentinel stored in `deadline` when no transition is pending.
const NO_DEADLINE: u64 = 0;

/// A boolean that becomes true `delay` after its most recent reset.
///
/// Construction performs the first reset, so a fresh gate is pending unless
/// its delay is zero. The gate's timer runs on the Tokio runtime captured at
/// construction; [`reset`](Self::reset) may be called from any thread.
pub struct DelayedGate {
    shared: Arc<GateShared>,
    runtime: Handle,
}

struct GateShared {
    name: &'static str,
    delay: Duration,
    /// Reference point for `deadline`, stored as nanoseconds since `epoch`.
    epoch: Instant,
    achieved: AtomicBool,
    deadline: AtomicU64,
    generation: AtomicU64,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl DelayedGate {
    /// Create an unnamed gate on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(delay: Duration) -> Self {
        Self::named("gate", delay)
    }

    /// Create a gate whose name shows up in logs and metric labels.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn named(name: &'static str, delay: Duration) -> Self {
        Self::with_runtime(name, delay, Handle::current())
    }

    /// Create a gate that schedules its transitions on `runtime`.
    pub fn with_runtime(name: &'static str, delay: Duration, runtime: Handle) -> Self {
        let gate = Self {
            shared: Arc::new(GateShared {
                name,
                delay,
                epoch: Instant::now(),
                achieved: AtomicBool::new(false),
                deadline: AtomicU64::new(NO_DEADLINE),
                generation: AtomicU64::new(0),
                timer: Mutex::new(None),
            }),
            runtime,
        };
        gate.reset();
        gate
    }

    pub fn name(&self) -> &'static str {
        self.shared.name
    }

    /// The delay applied after every reset. Fixed for the gate's lifetime.
    pub fn delay(&self) -> Duration {
        self.shared.delay
    }

    /// Current state. Lock-free.
    pub fn is_achieved(&self) -> bool {
        self.shared.achieved.load(Ordering::SeqCst)
    }

    /// Force the gate back to pending and restart its delay window.
    ///
    /// A zero delay leaves the gate achieved on return. Any transition
    /// scheduled by an earlier reset becomes a no-op.
    pub fn reset(&self) {
        let shared = &self.shared;
        let mut timer = shared.lock_timer();

        let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        shared.achieved.store(false, Ordering::SeqCst);
        if let Some(previous) = timer.take() {
            previous.abort();
        }
        metrics::record_gate_reset(shared.name);

        if shared.delay.is_zero() {
            shared.deadline.store(NO_DEADLINE, Ordering::SeqCst);
            shared.achieved.store(true, Ordering::SeqCst);
            metrics::record_gate_state(shared.name, true);
            tracing::debug!(gate = shared.name, generation, "Gate reset with zero delay");
            return;
        }

        let now = Instant::now();
        shared.deadline.store(
            shared.offset_nanos(now).saturating_add(duration_nanos(shared.delay)),
            Ordering::SeqCst,
        );
        metrics::record_gate_state(shared.name, false);

        let Some(fire_at) = now.checked_add(shared.delay) else {
            tracing::warn!(
                gate = shared.name,
                generation,
                "Gate delay is past the clock's range; gate stays pending"
            );
            return;
        };

        let task_shared = Arc::clone(shared);
        *timer = Some(self.runtime.spawn(async move {
            // The runtime caps a single sleep at roughly 2.2 years.
            while Instant::now() < fire_at {
                tokio::time::sleep_until(fire_at).await;
            }
            task_shared.fire(generation);
        }));

        tracing::debug!(
            gate = shared.name,
            generation,
            delay_ms = shared.delay.as_millis() as u64,
            "Gate reset"
        );
    }

    /// Time left until the pending transition fires; zero when none is pending.
    ///
    /// Advisory only: the transition is driven by the timer, not by this value.
    pub fn remaining_delay(&self) -> Duration {
        let deadline = self.shared.deadline.load(Ordering::SeqCst);
        if deadline == NO_DEADLINE {
            return Duration::ZERO;
        }
        let now = self.shared.offset_nanos(Instant::now());
        Duration::from_nanos(deadline.saturating_sub(now))
    }

    #[cfg(test)]
    fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }
}

impl Drop for DelayedGate {
    fn drop(&mut self) {
        if let Some(timer) = self.shared.lock_timer().take() {
            timer.abort();
        }
    }
}

impl std::fmt::Debug for DelayedGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayedGate")
            .field("name", &self.shared.name)
            .field("delay", &self.shared.delay)
            .field("achieved", &self.is_achieved())
            .field("remaining", &self.remaining_delay())
            .finish()
    }
}

impl GateShared {
    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn offset_nanos(&self, at: Instant) -> u64 {
        duration_nanos(at.saturating_duration_since(self.epoch))
    }

    /// Timer body. Holds the timer slot so a concurrent reset cannot slip in
    /// between the generation check and the state change.
    fn fire(&self, generation: u64) {
        let mut timer = self.lock_timer();
        let current = self.generation.load(Ordering::SeqCst);
        if current != generation {
            tracing::trace!(gate = self.name, generation, current, "Stale gate timer ignored");
            return;
        }

        // Clear the deadline first: readers may see "pending, 0 ms left" but
        // never "achieved with a deadline".
        self.deadline.store(NO_DEADLINE, Ordering::SeqCst);
        self.achieved.store(true, Ordering::SeqCst);
        timer.take();

        metrics::record_gate_state(self.name, true);
        tracing::info!(gate = self.name, generation, "Gate achieved");
    }
}

fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
