//! Per-user controller state.
//!
//! One record per user id, created lazily on first touch and kept for process
//! lifetime. The record is a recomputable cache of recent signal history, not
//! a system of record, so there is no teardown path.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bands::{pattern_for, BreathMode};
use crate::config;

/// Mutable state for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBreathState {
    /// Last raw stress reading in [0, 1].
    pub stress_raw: f32,
    /// EMA-smoothed stress in [0, 1].
    pub stress_smoothed: f32,
    /// Time of last ingest in microseconds; 0 means never.
    pub last_ts_us: i64,
    /// Last selected band.
    pub last_mode: BreathMode,
    /// Cycle length of the last emitted pattern, seconds.
    pub last_cycle_len: f32,
    /// While now < this, the signal is held as unstable.
    pub freeze_until_us: i64,
    /// Per-user smoothing factor in (0, 1].
    pub ema_alpha: f32,
    /// In-progress guided session, if any. Set iff `session_started_at_us` is.
    pub active_session_id: Option<Uuid>,
    /// Start time of the active session in microseconds.
    pub session_started_at_us: Option<i64>,
    /// Count of acknowledged adherence events.
    pub telemetry_events: u64,
}

impl UserBreathState {
    pub fn new(ema_alpha: f32) -> Self {
        Self {
            stress_raw: 0.0,
            stress_smoothed: 0.0,
            last_ts_us: 0,
            last_mode: BreathMode::Calm,
            // Default to the Calm cycle so the first plan has a ramp origin.
            last_cycle_len: pattern_for(BreathMode::Calm).total(),
            freeze_until_us: 0,
            ema_alpha,
            active_session_id: None,
            session_started_at_us: None,
            telemetry_events: 0,
        }
    }

    pub fn session_active(&self) -> bool {
        self.active_session_id.is_some()
    }
}

impl Default for UserBreathState {
    fn default() -> Self {
        Self::new(config::EMA_ALPHA_DEFAULT)
    }
}
