//! Breathing-mode band table.
//!
//! Maps smoothed stress onto one of four named modes, each carrying a base
//! four-phase breathing pattern (inhale, hold-in, exhale, hold-out, seconds).
//! The table is a closed enumeration: bands are a design constant, not
//! runtime-mutable data.
//!
//! Selection applies a hysteresis margin so the mode does not flap near band
//! edges: the currently-held band is widened outward by the margin while every
//! other band is shrunk inward, making the current band harder to leave.

use serde::{Deserialize, Serialize};

/// Named breathing mode, ordered from lowest to highest stress band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreathMode {
    Calm,
    Focus,
    #[serde(rename = "Wind-down")]
    WindDown,
    Relief,
}

impl BreathMode {
    /// Wire name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            BreathMode::Calm => "Calm",
            BreathMode::Focus => "Focus",
            BreathMode::WindDown => "Wind-down",
            BreathMode::Relief => "Relief",
        }
    }

    /// Position of this mode's band in the table (Calm = 0).
    pub fn band_index(&self) -> usize {
        match self {
            BreathMode::Calm => 0,
            BreathMode::Focus => 1,
            BreathMode::WindDown => 2,
            BreathMode::Relief => 3,
        }
    }
}

impl Default for BreathMode {
    fn default() -> Self {
        BreathMode::Calm
    }
}

impl std::fmt::Display for BreathMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four-phase breathing pattern, phase durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhasePattern {
    pub inhale: f32,
    pub hold_in: f32,
    pub exhale: f32,
    pub hold_out: f32,
}

impl PhasePattern {
    pub const fn new(inhale: f32, hold_in: f32, exhale: f32, hold_out: f32) -> Self {
        Self {
            inhale,
            hold_in,
            exhale,
            hold_out,
        }
    }

    /// Total cycle length in seconds.
    pub fn total(&self) -> f32 {
        self.inhale + self.hold_in + self.exhale + self.hold_out
    }

    /// Clamp each phase to its hard bounds.
    pub fn clamped(&self, bounds: &PhaseBounds) -> PhasePattern {
        PhasePattern {
            inhale: self.inhale.clamp(bounds.inhale.0, bounds.inhale.1),
            hold_in: self.hold_in.clamp(bounds.hold_in.0, bounds.hold_in.1),
            exhale: self.exhale.clamp(bounds.exhale.0, bounds.exhale.1),
            hold_out: self.hold_out.clamp(bounds.hold_out.0, bounds.hold_out.1),
        }
    }

    /// Phase entries in cycle order with their wire labels. Both holds are
    /// reported as "hold".
    pub fn steps(&self) -> [(&'static str, f32); 4] {
        [
            ("inhale", self.inhale),
            ("hold", self.hold_in),
            ("exhale", self.exhale),
            ("hold", self.hold_out),
        ]
    }
}

/// Hard per-phase (min, max) bounds in seconds.
#[derive(Debug, Clone, Copy)]
pub struct PhaseBounds {
    pub inhale: (f32, f32),
    pub hold_in: (f32, f32),
    pub exhale: (f32, f32),
    pub hold_out: (f32, f32),
}

/// Guardrails applied to every emitted pattern regardless of band.
pub const GUARDRAILS: PhaseBounds = PhaseBounds {
    inhale: (2.0, 6.0),
    hold_in: (0.0, 7.0),
    exhale: (4.0, 10.0),
    hold_out: (0.0, 2.0),
};

/// One stress band: a right-open interval of smoothed stress mapped to a mode
/// and its base pattern.
#[derive(Debug, Clone, Copy)]
pub struct Band {
    pub mode: BreathMode,
    pub lo: f32,
    pub hi: f32,
    pub pattern: PhasePattern,
}

impl Band {
    #[inline]
    fn contains(&self, x: f32, lo_shift: f32, hi_shift: f32) -> bool {
        x >= self.lo + lo_shift && x < self.hi + hi_shift
    }
}

/// The band table, ordered Calm → Relief. Relief's upper edge is 1.01 so a
/// smoothed value of exactly 1.0 still lands in a band.
pub const BANDS: [Band; 4] = [
    Band {
        mode: BreathMode::Calm,
        lo: 0.00,
        hi: 0.25,
        pattern: PhasePattern::new(4.0, 2.0, 4.0, 0.0),
    },
    Band {
        mode: BreathMode::Focus,
        lo: 0.25,
        hi: 0.50,
        pattern: PhasePattern::new(4.0, 0.0, 6.0, 0.0),
    },
    Band {
        mode: BreathMode::WindDown,
        lo: 0.50,
        hi: 0.75,
        pattern: PhasePattern::new(4.0, 7.0, 8.0, 0.0),
    },
    Band {
        mode: BreathMode::Relief,
        lo: 0.75,
        hi: 1.01,
        pattern: PhasePattern::new(3.0, 0.0, 6.0, 0.0),
    },
];

/// Base pattern for a mode.
pub fn pattern_for(mode: BreathMode) -> PhasePattern {
    BANDS[mode.band_index()].pattern
}

/// Select a band for `x` with hysteresis around the currently-held mode.
///
/// The current band's edges are widened outward by `margin` on both ends and
/// every other band is shrunk inward, so the held mode wins ties near its own
/// boundaries. If the shifted intervals leave `x` in a gap, fall back to the
/// raw edges; if even that fails (out-of-range input), default to Calm.
pub fn select_band(x: f32, current: BreathMode, margin: f32) -> (BreathMode, PhasePattern) {
    for band in &BANDS {
        let (lo_shift, hi_shift) = if band.mode == current {
            (-margin, margin)
        } else {
            (margin, -margin)
        };
        if band.contains(x, lo_shift, hi_shift) {
            return (band.mode, band.pattern);
        }
    }

    // Margins can open gaps between adjacent bands; retry with raw edges.
    for band in &BANDS {
        if band.contains(x, 0.0, 0.0) {
            return (band.mode, band.pattern);
        }
    }

    log::debug!("stress {x:.3} outside every band, defaulting to Calm");
    (BreathMode::Calm, BANDS[0].pattern)
}

/// Fixed coaching line for a mode.
pub fn affirmation(mode: BreathMode) -> &'static str {
    match mode {
        BreathMode::Calm => "Slow, even breaths. Shoulders soft.",
        BreathMode::Focus => "Inhale ease; exhale tension. You\u{2019}re doing fine.",
        BreathMode::WindDown => "Let the long exhale settle the body.",
        BreathMode::Relief => "Short inhale, longer exhale. You\u{2019}re safe right now.",
    }
}

/// Coaching line used when the mode cannot be resolved.
pub const FALLBACK_AFFIRMATION: &str = "Breathe gently. Let the jaw unclench.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_cover_unit_interval() {
        // Adjacent bands share an edge and the table covers [0, 1].
        for pair in BANDS.windows(2) {
            assert_eq!(pair[0].hi, pair[1].lo);
        }
        assert_eq!(BANDS[0].lo, 0.0);
        assert!(BANDS[3].hi > 1.0);
    }

    #[test]
    fn raw_edges_select_expected_modes() {
        assert_eq!(select_band(0.0, BreathMode::Calm, 0.07).0, BreathMode::Calm);
        assert_eq!(select_band(0.30, BreathMode::Focus, 0.07).0, BreathMode::Focus);
        assert_eq!(
            select_band(0.60, BreathMode::WindDown, 0.07).0,
            BreathMode::WindDown
        );
        assert_eq!(
            select_band(1.0, BreathMode::Relief, 0.07).0,
            BreathMode::Relief
        );
    }

    #[test]
    fn current_band_is_sticky_below_its_raw_edge() {
        // 0.24 sits under the raw Calm/Focus boundary but inside Focus's
        // widened interval [0.18, 0.57), so Focus must hold.
        let (mode, _) = select_band(0.24, BreathMode::Focus, 0.07);
        assert_eq!(mode, BreathMode::Focus);
    }

    #[test]
    fn current_band_is_sticky_above_its_raw_edge() {
        let (mode, _) = select_band(0.52, BreathMode::Focus, 0.07);
        assert_eq!(mode, BreathMode::Focus);
    }

    #[test]
    fn non_current_band_requires_clearing_the_margin() {
        // From Calm at 0.26: Focus's shrunk interval starts at 0.32, Calm's
        // widened interval runs to 0.32: stay Calm.
        let (mode, _) = select_band(0.26, BreathMode::Calm, 0.07);
        assert_eq!(mode, BreathMode::Calm);
        // Clearing the margin flips.
        let (mode, _) = select_band(0.33, BreathMode::Calm, 0.07);
        assert_eq!(mode, BreathMode::Focus);
    }

    #[test]
    fn gap_falls_back_to_raw_edges() {
        // From Calm at 0.70: Wind-down's shrunk interval is [0.57, 0.68), so
        // the hysteresis pass misses; raw edges place 0.70 in Wind-down.
        let (mode, _) = select_band(0.70, BreathMode::Calm, 0.07);
        assert_eq!(mode, BreathMode::WindDown);
    }

    #[test]
    fn out_of_range_defaults_to_calm() {
        assert_eq!(select_band(1.5, BreathMode::Relief, 0.07).0, BreathMode::Calm);
        assert_eq!(select_band(-0.5, BreathMode::Focus, 0.07).0, BreathMode::Calm);
    }

    #[test]
    fn guardrails_clamp_each_phase() {
        let wild = PhasePattern::new(1.0, 9.0, 20.0, 5.0);
        let safe = wild.clamped(&GUARDRAILS);
        assert_eq!(safe, PhasePattern::new(2.0, 7.0, 10.0, 2.0));
    }

    #[test]
    fn base_patterns_already_within_guardrails() {
        for band in &BANDS {
            assert_eq!(band.pattern.clamped(&GUARDRAILS), band.pattern);
        }
    }

    #[test]
    fn mode_wire_names() {
        assert_eq!(BreathMode::WindDown.as_str(), "Wind-down");
        assert_eq!(
            serde_json::to_string(&BreathMode::WindDown).unwrap(),
            "\"Wind-down\""
        );
    }

    #[test]
    fn steps_report_both_holds_as_hold() {
        let steps = pattern_for(BreathMode::Calm).steps();
        assert_eq!(steps[0], ("inhale", 4.0));
        assert_eq!(steps[1], ("hold", 2.0));
        assert_eq!(steps[2], ("exhale", 4.0));
        assert_eq!(steps[3], ("hold", 0.0));
    }
}
