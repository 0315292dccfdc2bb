//! Fixed-interval routine scheduling.
//!
//! The host calls [`RoutineScheduler::due`] every frame; routines whose
//! interval has elapsed are returned in registration order and marked as run.
//! A routine first becomes due one interval after it was registered. Missed
//! intervals are not made up: a routine is returned at most once per call.

use std::time::{Duration, Instant};

/// A routine and how often it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutineDefinition<R> {
    pub interval: Duration,
    pub routine: R,
}

impl<R> RoutineDefinition<R> {
    pub fn new(interval: Duration, routine: R) -> Self {
        Self { interval, routine }
    }
}

#[derive(Debug, Clone)]
struct ScheduledRoutine<R> {
    definition: RoutineDefinition<R>,
    last_run: Instant,
}

impl<R> ScheduledRoutine<R> {
    fn is_ready(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_run) >= self.definition.interval
    }
}

#[derive(Debug, Clone)]
pub struct RoutineScheduler<R> {
    routines: Vec<ScheduledRoutine<R>>,
}

impl<R> Default for RoutineScheduler<R> {
    fn default() -> Self {
        Self { routines: Vec::new() }
    }
}

impl<R: Copy + PartialEq> RoutineScheduler<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a routine. Registering the same routine again replaces its
    /// interval and restarts its timer.
    pub fn setup_routine(&mut self, definition: RoutineDefinition<R>, now: Instant) {
        self.routines.retain(|r| r.definition.routine != definition.routine);
        self.routines.push(ScheduledRoutine {
            definition,
            last_run: now,
        });
    }

    /// Routines due at `now`, in registration order.
    pub fn due(&mut self, now: Instant) -> Vec<R> {
        let mut due = Vec::new();
        for scheduled in &mut self.routines {
            if scheduled.is_ready(now) {
                scheduled.last_run = now;
                due.push(scheduled.definition.routine);
            }
        }
        due
    }

    pub fn clear(&mut self) {
        self.routines.clear();
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}
