//! Deterministic per-cycle schedules for the staged preparation protocol:
//! cycle planning, temperature ramps, and the alchemical coupling ramp.

use tracing::warn;

/// A fixed-length block structure for one phase: `cycles` blocks of
/// `steps_per_cycle` integration steps each.
///
/// The division truncates; remainder steps are dropped. The original protocol
/// relied on this silently, so the truncation is kept but never silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclePlan {
    pub cycles: u64,
    pub steps_per_cycle: u64,
}

impl CyclePlan {
    pub fn new(total_steps: u64, steps_per_cycle: u64) -> Self {
        let cycles = total_steps / steps_per_cycle;
        let remainder = total_steps % steps_per_cycle;
        if remainder != 0 {
            warn!(
                total_steps,
                steps_per_cycle, remainder, "Step count does not divide evenly; dropping remainder steps."
            );
        }
        Self {
            cycles,
            steps_per_cycle,
        }
    }

    /// Steps actually executed by this plan (remainder excluded).
    pub fn total_steps(&self) -> u64 {
        self.cycles * self.steps_per_cycle
    }
}

/// Linear target-temperature ramp for the thermalization phase, from
/// `initial` to `target` kelvin over `cycles` increments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureRamp {
    initial: f64,
    target: f64,
    cycles: u64,
}

impl TemperatureRamp {
    pub fn new(initial: f64, target: f64, cycles: u64) -> Self {
        Self {
            initial,
            target,
            cycles,
        }
    }

    pub fn initial(&self) -> f64 {
        self.initial
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Per-cycle temperature increment, `(target - initial) / cycles`.
    pub fn increment(&self) -> f64 {
        (self.target - self.initial) / self.cycles as f64
    }
}

/// Evenly spaced coupling values over `[start, end]`: C+1 points for C
/// cycles, with `lambda1` and `lambda2` driven in lock-step by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambdaSchedule {
    start: f64,
    end: f64,
    cycles: u64,
}

impl LambdaSchedule {
    pub fn new(start: f64, end: f64, cycles: u64) -> Self {
        Self { start, end, cycles }
    }

    /// Number of points in the schedule (`cycles + 1`).
    pub fn len(&self) -> usize {
        self.cycles as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Step size between consecutive points.
    pub fn step(&self) -> f64 {
        (self.end - self.start) / self.cycles as f64
    }

    /// The i-th point, `start + i * (end - start) / cycles`. The final point
    /// is pinned to `end` so the ramp lands on the target exactly.
    pub fn value(&self, index: u64) -> f64 {
        if index >= self.cycles {
            self.end
        } else {
            self.start + index as f64 * self.step()
        }
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        (0..=self.cycles).map(|i| self.value(i))
    }
}
