//! The breathing-coach controller.
//!
//! Owns the per-user state map and implements the service operations: stress
//! ingestion, status, plan, session bookkeeping, and telemetry acknowledgment.
//! Every operation takes an explicit `now_us` timestamp in its `*_at` form so
//! behavior is deterministic under test; the plain forms read the system
//! clock.
//!
//! By contract none of these operations fail: bad input is absorbed at the
//! normalization boundary and converted into defaults. The controller is an
//! advisory subsystem: always returning something sensible beats strict
//! validation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bands::{self, BreathMode};
use crate::clock;
use crate::config::CoachConfig;
use crate::ingest::{self, FaceObservation};
use crate::signal::{self, SignalQuality};
use crate::state::UserBreathState;

/// Session length requested when the caller does not supply one, seconds.
pub const DEFAULT_SESSION_TARGET_SEC: u32 = 180;

const NOTE_STABLE: &str = "Using stable pace";
const NOTE_ADAPTIVE: &str = "Adaptive pace from face stress";
const MSG_ALREADY_ACTIVE: &str = "already active";
const MSG_NO_ACTIVE_SESSION: &str = "no active session";

/// Snapshot of one user's signal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub user_id: String,
    pub stress_raw: f32,
    pub stress_smoothed: f32,
    pub last_mode: BreathMode,
    pub signal_quality: SignalQuality,
    pub last_update_age_sec: f32,
    pub active_session_id: Option<Uuid>,
}

/// One phase entry of a prescribed pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseStep {
    pub phase: String,
    pub seconds: f32,
}

/// A prescribed breathing plan for one window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    /// ISO-8601 UTC time the plan was computed.
    pub start_at: String,
    pub mode: BreathMode,
    pub stress_smoothed: f32,
    pub cycles: u32,
    pub pattern: Vec<PhaseStep>,
    pub notes: String,
    pub affirmation: String,
    pub signal_quality: SignalQuality,
    pub window_sec: u32,
}

impl PlanResponse {
    /// Reconstruct the prescribed phase pattern, e.g. to drive a
    /// [`crate::phase_machine::PhaseMachine`] for a guided session.
    pub fn phase_pattern(&self) -> bands::PhasePattern {
        let phase = |i: usize| self.pattern.get(i).map(|s| s.seconds).unwrap_or(0.0);
        bands::PhasePattern::new(phase(0), phase(1), phase(2), phase(3))
    }
}

/// Outcome of a session-start request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionStart {
    Started {
        session_id: Uuid,
        started_at: String,
        duration_target_sec: u32,
        with_audio: bool,
    },
    /// A session was already running; its id is returned unchanged.
    AlreadyActive {
        session_id: Uuid,
        started_at: String,
        message: String,
    },
}

impl SessionStart {
    pub fn session_id(&self) -> Uuid {
        match self {
            SessionStart::Started { session_id, .. }
            | SessionStart::AlreadyActive { session_id, .. } => *session_id,
        }
    }

    pub fn already_active(&self) -> bool {
        matches!(self, SessionStart::AlreadyActive { .. })
    }
}

/// Outcome of a session-stop request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopOutcome {
    Stopped { session_id: Uuid, duration_sec: f32 },
    Idle { message: String },
}

/// Acknowledgment for an adherence-telemetry payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryAck {
    pub ok: bool,
    pub user_id: String,
    pub ack: bool,
}

/// Per-user adaptive breathing coach.
///
/// State records are created lazily on first touch and guarded individually,
/// so concurrent operations on the same user are linearizable while unrelated
/// users never contend.
pub struct BreathCoachController {
    cfg: CoachConfig,
    users: RwLock<HashMap<String, Arc<Mutex<UserBreathState>>>>,
}

impl BreathCoachController {
    pub fn new() -> Self {
        Self::with_config(CoachConfig::default())
    }

    pub fn with_config(cfg: CoachConfig) -> Self {
        debug_assert!(cfg.validate().is_ok(), "invalid CoachConfig");
        Self {
            cfg,
            users: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CoachConfig {
        &self.cfg
    }

    /// Number of user records currently held.
    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    /// Fetch or lazily create the state record for a user.
    fn entry(&self, uid: &str) -> Arc<Mutex<UserBreathState>> {
        if let Some(existing) = self.users.read().get(uid) {
            return existing.clone();
        }
        let mut map = self.users.write();
        map.entry(uid.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(UserBreathState::new(self.cfg.ema_alpha))))
            .clone()
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Update the stress cache from the face pipeline.
    ///
    /// A capture without a usable face (or with non-ok quality) opens a freeze
    /// window and leaves the smoothed value untouched; a good capture feeds
    /// the EMA. The ingest timestamp is always advanced.
    pub fn push_face_stress_at(
        &self,
        user_id: Option<&str>,
        stress_prob: f32,
        face_present: bool,
        quality: &str,
        now_us: i64,
    ) {
        let uid = ingest::normalize_user_id(user_id);
        let stress_prob = ingest::sanitize_stress_prob(stress_prob);
        let entry = self.entry(&uid);
        let mut s = entry.lock();

        if !face_present || quality != ingest::QUALITY_OK {
            let until = now_us + (self.cfg.freeze_on_unstable_sec * 1_000_000.0) as i64;
            s.freeze_until_us = s.freeze_until_us.max(until);
            log::debug!("{uid}: unstable capture (quality={quality}), holding pace");
        } else {
            if s.last_ts_us <= 0 {
                // First-ever reading: no prior to blend with.
                s.stress_smoothed = stress_prob;
            } else {
                s.stress_smoothed = signal::ema_step(s.stress_smoothed, stress_prob, s.ema_alpha);
            }
            s.stress_raw = stress_prob;
        }
        s.last_ts_us = now_us;
    }

    pub fn push_face_stress(
        &self,
        user_id: Option<&str>,
        stress_prob: f32,
        face_present: bool,
        quality: &str,
    ) {
        self.push_face_stress_at(user_id, stress_prob, face_present, quality, clock::now_us());
    }

    /// Ingest a raw classifier result, deriving presence and quality.
    pub fn ingest_face_result_at(
        &self,
        user_id: Option<&str>,
        obs: &FaceObservation,
        now_us: i64,
    ) {
        self.push_face_stress_at(
            user_id,
            obs.stress_prob,
            obs.face_present(),
            obs.quality(),
            now_us,
        );
    }

    pub fn ingest_face_result(&self, user_id: Option<&str>, obs: &FaceObservation) {
        self.ingest_face_result_at(user_id, obs, clock::now_us());
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Report the current signal state. Pure read apart from lazy creation.
    pub fn get_status_at(&self, user_id: Option<&str>, now_us: i64) -> StatusReport {
        let uid = ingest::normalize_user_id(user_id);
        let entry = self.entry(&uid);
        let s = entry.lock();

        StatusReport {
            signal_quality: signal::classify(
                now_us,
                s.last_ts_us,
                s.freeze_until_us,
                self.cfg.stale_tolerance_sec,
            ),
            last_update_age_sec: clock::dt_sec(now_us, s.last_ts_us),
            user_id: uid,
            stress_raw: s.stress_raw,
            stress_smoothed: s.stress_smoothed,
            last_mode: s.last_mode,
            active_session_id: s.active_session_id,
        }
    }

    pub fn get_status(&self, user_id: Option<&str>) -> StatusReport {
        self.get_status_at(user_id, clock::now_us())
    }

    /// Prescribe a breathing plan for the coming window.
    ///
    /// Inside a freeze window the last mode is held and its base pattern
    /// reused; otherwise a band is selected with hysteresis and persisted.
    /// Staleness alone does not freeze the mode; it only downgrades the
    /// reported quality and the advisory note. The cycle length is
    /// ramp-limited against the previous plan; the per-phase pattern is not,
    /// so within a mode each breath stays textbook-accurate while the cycle
    /// count shifts gradually.
    pub fn plan_at(
        &self,
        user_id: Option<&str>,
        window_sec: Option<u32>,
        now_us: i64,
    ) -> PlanResponse {
        let uid = ingest::normalize_user_id(user_id);
        let window_sec = window_sec.unwrap_or(self.cfg.default_window_sec);
        let entry = self.entry(&uid);
        let mut s = entry.lock();

        let unstable = now_us < s.freeze_until_us;
        let stale = clock::dt_sec(now_us, s.last_ts_us) > self.cfg.stale_tolerance_sec;

        let (mode, base) = if unstable {
            (s.last_mode, bands::pattern_for(s.last_mode))
        } else {
            let (mode, base) =
                bands::select_band(s.stress_smoothed, s.last_mode, self.cfg.hyst_margin);
            if mode != s.last_mode {
                log::debug!(
                    "{uid}: mode {} -> {} at smoothed stress {:.3}",
                    s.last_mode,
                    mode,
                    s.stress_smoothed
                );
            }
            s.last_mode = mode;
            (mode, base)
        };

        let base = base.clamped(&bands::GUARDRAILS);
        let candidate_cycle_len = base.total();
        let cycle_len = signal::ramp_limit(
            s.last_cycle_len,
            candidate_cycle_len,
            self.cfg.ramp_limit_frac,
        );
        s.last_cycle_len = cycle_len;

        let cycles = if cycle_len <= 0.0 {
            1
        } else {
            ((window_sec as f32 / cycle_len).floor() as u32).max(1)
        };

        let pattern = base
            .steps()
            .iter()
            .map(|&(phase, seconds)| PhaseStep {
                phase: phase.to_string(),
                seconds,
            })
            .collect();

        let signal_quality = if stale {
            SignalQuality::Stale
        } else if unstable {
            SignalQuality::Unstable
        } else {
            SignalQuality::Ok
        };
        let notes = if unstable || stale {
            NOTE_STABLE
        } else {
            NOTE_ADAPTIVE
        };

        PlanResponse {
            start_at: clock::iso8601_utc(now_us),
            mode,
            stress_smoothed: s.stress_smoothed,
            cycles,
            pattern,
            notes: notes.to_string(),
            affirmation: bands::affirmation(mode).to_string(),
            signal_quality,
            window_sec,
        }
    }

    pub fn plan(&self, user_id: Option<&str>, window_sec: Option<u32>) -> PlanResponse {
        self.plan_at(user_id, window_sec, clock::now_us())
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Start a guided session. Idempotent while one is active: the existing
    /// id is returned and no new session is created.
    pub fn start_session_at(
        &self,
        user_id: Option<&str>,
        duration_target_sec: u32,
        with_audio: bool,
        now_us: i64,
    ) -> SessionStart {
        let uid = ingest::normalize_user_id(user_id);
        let entry = self.entry(&uid);
        let mut s = entry.lock();

        if let (Some(session_id), Some(started_us)) = (s.active_session_id, s.session_started_at_us)
        {
            return SessionStart::AlreadyActive {
                session_id,
                started_at: clock::iso8601_utc(started_us),
                message: MSG_ALREADY_ACTIVE.to_string(),
            };
        }

        let session_id = Uuid::new_v4();
        s.active_session_id = Some(session_id);
        s.session_started_at_us = Some(now_us);
        log::debug!("{uid}: session {session_id} started");
        SessionStart::Started {
            session_id,
            started_at: clock::iso8601_utc(now_us),
            duration_target_sec,
            with_audio,
        }
    }

    pub fn start_session(
        &self,
        user_id: Option<&str>,
        duration_target_sec: u32,
        with_audio: bool,
    ) -> SessionStart {
        self.start_session_at(user_id, duration_target_sec, with_audio, clock::now_us())
    }

    /// Stop the active session, if any.
    pub fn stop_session_at(&self, user_id: Option<&str>, now_us: i64) -> StopOutcome {
        let uid = ingest::normalize_user_id(user_id);
        let entry = self.entry(&uid);
        let mut s = entry.lock();

        match s.active_session_id.take() {
            None => StopOutcome::Idle {
                message: MSG_NO_ACTIVE_SESSION.to_string(),
            },
            Some(session_id) => {
                let started_us = s.session_started_at_us.take().unwrap_or(now_us);
                log::debug!("{uid}: session {session_id} stopped");
                StopOutcome::Stopped {
                    session_id,
                    duration_sec: clock::dt_sec(now_us, started_us),
                }
            }
        }
    }

    pub fn stop_session(&self, user_id: Option<&str>) -> StopOutcome {
        self.stop_session_at(user_id, clock::now_us())
    }

    // ------------------------------------------------------------------
    // Telemetry
    // ------------------------------------------------------------------

    /// Acknowledge an adherence-event payload. Any JSON shape is accepted;
    /// only a per-user counter is kept.
    pub fn ingest_telemetry(
        &self,
        user_id: Option<&str>,
        payload: &serde_json::Value,
    ) -> TelemetryAck {
        let uid = ingest::normalize_user_id(user_id);
        let entry = self.entry(&uid);
        let mut s = entry.lock();
        s.telemetry_events += 1;
        log::trace!("{uid}: telemetry event #{}: {payload}", s.telemetry_events);
        TelemetryAck {
            ok: true,
            user_id: uid,
            ack: true,
        }
    }
}

impl Default for BreathCoachController {
    fn default() -> Self {
        Self::new()
    }
}
