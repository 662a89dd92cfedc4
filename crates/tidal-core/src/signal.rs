//! Smoothing and freshness primitives for the stress signal.
//!
//! The raw stress probability from the face pipeline is noisy frame-to-frame;
//! everything downstream of ingestion works on an exponential moving average.
//! Freshness is a data-level property: a reading can go stale (no update
//! within tolerance) or unstable (inside a freeze window opened by a bad
//! capture), and staleness wins when both apply.

use serde::{Deserialize, Serialize};

use crate::clock;

/// Reported quality of the stress signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalQuality {
    Ok,
    Unstable,
    Stale,
}

impl SignalQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalQuality::Ok => "ok",
            SignalQuality::Unstable => "unstable",
            SignalQuality::Stale => "stale",
        }
    }
}

impl std::fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify signal freshness. Staleness takes priority over instability.
pub fn classify(
    now_us: i64,
    last_ts_us: i64,
    freeze_until_us: i64,
    stale_tolerance_sec: f32,
) -> SignalQuality {
    if clock::dt_sec(now_us, last_ts_us) > stale_tolerance_sec {
        SignalQuality::Stale
    } else if now_us < freeze_until_us {
        SignalQuality::Unstable
    } else {
        SignalQuality::Ok
    }
}

/// One EMA update: `alpha * sample + (1 - alpha) * prev`.
#[inline]
pub fn ema_step(prev: f32, sample: f32, alpha: f32) -> f32 {
    alpha * sample + (1.0 - alpha) * prev
}

/// Move `prev` toward `candidate` by at most `limit_frac` of `prev`'s
/// magnitude. A non-positive `prev` jumps directly to the candidate (first
/// ever value, nothing to ramp from).
pub fn ramp_limit(prev: f32, candidate: f32, limit_frac: f32) -> f32 {
    if prev <= 0.0 {
        return candidate;
    }
    let delta = candidate - prev;
    let max_step = prev.abs() * limit_frac;
    if delta.abs() <= max_step {
        candidate
    } else if delta > 0.0 {
        prev + max_step
    } else {
        prev - max_step
    }
}
