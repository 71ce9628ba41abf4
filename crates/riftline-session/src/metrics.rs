//! Session metrics: per-tick timing and health counters.
//!
//! A tick that overruns its budget is counted and absorbed; the loop never
//! advances multiple simulation steps to catch up.

use std::time::Duration;

// ---------------------------------------------------------------------------
// TickTimings
// ---------------------------------------------------------------------------

/// Wall-clock timing of the last tick's phases.
#[derive(Debug, Clone, Default)]
pub struct TickTimings {
    /// Input drain and application.
    pub inputs: Duration,
    /// Timer upkeep, effects, scheduler fire, ability execution.
    pub simulation: Duration,
    /// Motion integration, projectiles, zones, grid rebuild, collision.
    pub physics: Duration,
    /// Vision, priority, delta encode, outbound enqueue.
    pub delivery: Duration,
    /// Whole tick.
    pub total: Duration,
}

// ---------------------------------------------------------------------------
// SessionMetrics
// ---------------------------------------------------------------------------

/// Counters accumulated over a session's lifetime.
#[derive(Debug, Clone, Default)]
pub struct SessionMetrics {
    /// Ticks executed.
    pub ticks: u64,
    /// Ticks whose wall-clock time exceeded the tick budget.
    pub budget_overruns: u64,
    /// Inputs dropped by the per-tick bound (oldest-first).
    pub dropped_inputs: u64,
    /// Inputs dropped by sequence-gate rejection.
    pub rejected_sequences: u64,
    /// Entity steps that panicked and were caught.
    pub caught_panics: u64,
    /// Positions clamped after producing non-finite values.
    pub clamped_positions: u64,
    /// Collision pairs separated.
    pub collisions_resolved: u64,
    /// Events published.
    pub events_published: u64,
    /// Outbound messages enqueued.
    pub messages_sent: u64,
    /// Timing of the most recent tick.
    pub last_tick: TickTimings,
}

impl SessionMetrics {
    /// Record a finished tick's timing against the budget.
    pub fn record_tick(&mut self, timings: TickTimings, budget: Duration) {
        self.ticks += 1;
        if timings.total > budget {
            self.budget_overruns += 1;
        }
        self.last_tick = timings;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overruns_are_counted_not_compensated() {
        let mut metrics = SessionMetrics::default();
        let budget = Duration::from_millis(8);

        metrics.record_tick(
            TickTimings {
                total: Duration::from_millis(4),
                ..Default::default()
            },
            budget,
        );
        assert_eq!(metrics.budget_overruns, 0);

        metrics.record_tick(
            TickTimings {
                total: Duration::from_millis(20),
                ..Default::default()
            },
            budget,
        );
        assert_eq!(metrics.budget_overruns, 1);
        assert_eq!(metrics.ticks, 2);
    }
}
