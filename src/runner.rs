//! Cooperative stepping for the long-running engines.
//!
//! Knuth-Bendix and Todd-Coxeter run unbounded computations that must be
//! interruptible and resumable. Each engine is an explicit state machine
//! with a single `step` method performing one unit of progress; the loops
//! here drive `step` while polling a stop flag, a deadline, and a step
//! budget between units.

use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of a single unit of engine progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Work was done; more remains.
    Progressed,
    /// The engine reached its terminal state.
    Finished,
    /// A stop flag or deadline fired; state is valid and resumable.
    Interrupted,
}

/// A cloneable handle that requests an engine stop at its next
/// suspension point.
#[derive(Debug, Clone, Default)]
pub struct Stopper {
    flag: Arc<AtomicBool>,
}

impl Stopper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. The engine returns `Interrupted` at its next
    /// suspension point.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Clear the request so the engine can be resumed.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Bounds applied to a driving loop: an optional deadline and an optional
/// step budget, checked between units of progress.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    deadline: Option<Instant>,
    steps_left: Option<u64>,
}

impl RunControl {
    /// No bound: run until the engine finishes.
    pub fn forever() -> Self {
        Self::default()
    }

    /// Stop once `duration` has elapsed.
    pub fn for_duration(duration: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + duration),
            steps_left: None,
        }
    }

    /// Stop after `steps` units of progress.
    pub fn for_steps(steps: u64) -> Self {
        Self {
            deadline: None,
            steps_left: Some(steps),
        }
    }

    /// True if another unit may run; consumes one unit of budget.
    pub fn checkpoint(&mut self) -> bool {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return false;
            }
        }
        match self.steps_left {
            Some(0) => false,
            Some(ref mut n) => {
                *n -= 1;
                true
            }
            None => true,
        }
    }
}

/// The shared contract of the long-running engines.
///
/// Implementors provide one unit of progress per `step` call; the provided
/// methods drive the loop under the various bounds. The facade dispatches
/// over concrete engine types, so this trait exists for the loop logic, not
/// for dynamic dispatch.
pub trait Runner {
    /// Perform one unit of progress.
    fn step(&mut self) -> Result<StepOutcome>;

    /// True once the engine reached its terminal state.
    fn finished(&self) -> bool;

    /// True once the engine has performed any work.
    fn started(&self) -> bool;

    /// The engine's stop handle.
    fn stopper(&self) -> &Stopper;

    /// Drive `step` under the given bounds.
    fn run_with(&mut self, ctl: &mut RunControl) -> Result<StepOutcome> {
        loop {
            if self.finished() {
                return Ok(StepOutcome::Finished);
            }
            if self.stopper().stop_requested() {
                self.stopper().reset();
                return Ok(StepOutcome::Interrupted);
            }
            if !ctl.checkpoint() {
                return Ok(StepOutcome::Interrupted);
            }
            match self.step()? {
                StepOutcome::Progressed => {}
                other => return Ok(other),
            }
        }
    }

    /// Run until finished. May not terminate; the stop handle is the only
    /// way out for presentations with an infinite quotient.
    fn run(&mut self) -> Result<StepOutcome> {
        self.run_with(&mut RunControl::forever())
    }

    /// Run until finished or `duration` elapses.
    fn run_for(&mut self, duration: Duration) -> Result<StepOutcome> {
        self.run_with(&mut RunControl::for_duration(duration))
    }

    /// Run until finished or `steps` units have been performed.
    fn run_steps(&mut self, steps: u64) -> Result<StepOutcome> {
        self.run_with(&mut RunControl::for_steps(steps))
    }

    /// Run until finished or `predicate` returns true, checking it between
    /// units of progress.
    fn run_until<F>(&mut self, mut predicate: F) -> Result<StepOutcome>
    where
        Self: Sized,
        F: FnMut(&Self) -> bool,
    {
        loop {
            if self.finished() {
                return Ok(StepOutcome::Finished);
            }
            if predicate(self) || self.stopper().stop_requested() {
                self.stopper().reset();
                return Ok(StepOutcome::Interrupted);
            }
            match self.step()? {
                StepOutcome::Progressed => {}
                other => return Ok(other),
            }
        }
    }
}
