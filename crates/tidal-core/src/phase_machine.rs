//! Four-phase breath timeline.
//!
//! Drives a prescribed pattern as a ticking state machine so a caller can
//! animate a guided session: advance by elapsed microseconds, observe phase
//! transitions and completed cycles, and read normalized cycle progress.

use crate::bands::PhasePattern;

/// Breathing phase within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Inhale,
    HoldIn,
    Exhale,
    HoldOut,
}

impl Phase {
    /// Successor phase; `HoldOut` wraps to `Inhale` and completes the cycle.
    fn next(self) -> (Phase, bool) {
        match self {
            Phase::Inhale => (Phase::HoldIn, false),
            Phase::HoldIn => (Phase::Exhale, false),
            Phase::Exhale => (Phase::HoldOut, false),
            Phase::HoldOut => (Phase::Inhale, true),
        }
    }

    /// Wire label; both holds are reported as "hold".
    pub fn wire_label(&self) -> &'static str {
        match self {
            Phase::Inhale => "inhale",
            Phase::HoldIn | Phase::HoldOut => "hold",
            Phase::Exhale => "exhale",
        }
    }
}

/// Phase durations in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDurations {
    pub inhale_us: u64,
    pub hold_in_us: u64,
    pub exhale_us: u64,
    pub hold_out_us: u64,
}

impl PhaseDurations {
    pub fn from_pattern(pattern: &PhasePattern) -> Self {
        Self {
            inhale_us: (pattern.inhale * 1_000_000.0) as u64,
            hold_in_us: (pattern.hold_in * 1_000_000.0) as u64,
            exhale_us: (pattern.exhale * 1_000_000.0) as u64,
            hold_out_us: (pattern.hold_out * 1_000_000.0) as u64,
        }
    }

    pub fn total_us(&self) -> u64 {
        self.inhale_us + self.hold_in_us + self.exhale_us + self.hold_out_us
    }

    fn duration_of(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Inhale => self.inhale_us,
            Phase::HoldIn => self.hold_in_us,
            Phase::Exhale => self.exhale_us,
            Phase::HoldOut => self.hold_out_us,
        }
    }

    /// Elapsed time within the cycle at the start of `phase`.
    fn offset_of(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Inhale => 0,
            Phase::HoldIn => self.inhale_us,
            Phase::Exhale => self.inhale_us + self.hold_in_us,
            Phase::HoldOut => self.inhale_us + self.hold_in_us + self.exhale_us,
        }
    }
}

/// Ticking breath timeline over a fixed set of phase durations.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: Phase,
    elapsed_us: u64,
    durations: PhaseDurations,
    cycle_index: u64,
}

impl PhaseMachine {
    pub fn new(durations: PhaseDurations) -> Self {
        Self {
            phase: Phase::Inhale,
            elapsed_us: 0,
            durations,
            cycle_index: 0,
        }
    }

    pub fn current_phase(&self) -> Phase {
        self.phase
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycle_index
    }

    fn remaining_us(&self) -> u64 {
        self.durations
            .duration_of(self.phase)
            .saturating_sub(self.elapsed_us)
    }

    /// Move to the next phase, resetting phase-elapsed time.
    fn advance(&mut self) -> (Phase, bool) {
        let (next, completed) = self.phase.next();
        self.phase = next;
        self.elapsed_us = 0;
        if completed {
            self.cycle_index += 1;
        }
        (next, completed)
    }

    /// Advance by `dt_us`. Returns the phases entered during the tick and how
    /// many full cycles completed. Zero-length phases are skipped eagerly so
    /// an exact-boundary tick lands at the start of the next cycle; an
    /// all-zero pattern consumes the tick without advancing.
    pub fn tick(&mut self, mut dt_us: u64) -> (Vec<Phase>, u64) {
        let mut entered = Vec::new();
        let mut cycles = 0u64;
        if self.durations.total_us() == 0 {
            return (entered, cycles);
        }
        loop {
            while self.remaining_us() == 0 {
                let (next, completed) = self.advance();
                entered.push(next);
                if completed {
                    cycles += 1;
                }
            }
            if dt_us == 0 {
                break;
            }
            let left = self.remaining_us();
            if dt_us < left {
                self.elapsed_us += dt_us;
                break;
            }
            dt_us -= left;
            let (next, completed) = self.advance();
            entered.push(next);
            if completed {
                cycles += 1;
            }
        }
        (entered, cycles)
    }

    /// Normalized position within the cycle, in [0, 1).
    pub fn cycle_phase_norm(&self) -> f32 {
        let total = self.durations.total_us();
        if total == 0 {
            return 0.0;
        }
        let pos = self
            .durations
            .offset_of(self.phase)
            .saturating_add(self.elapsed_us)
            .min(total);
        pos as f32 / total as f32
    }
}
