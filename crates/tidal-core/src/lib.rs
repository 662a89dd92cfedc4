//! Tidal core: adaptive breathing-coach controller.
//!
//! Maintains one state record per user, ingests noisy stress readings from an
//! upstream face-emotion classifier, smooths them with an EMA, and maps the
//! smoothed value onto a breathing-pattern band with hysteresis and
//! ramp-limited pacing. The controller is an advisory cache: it never raises
//! user-visible errors, and all of its state is recomputable process memory.
//!
//! # Pipeline
//!
//! ```text
//! face classifier ──► ingest (normalize) ──► per-user EMA + freeze window
//!                                                   │
//! status / plan queries ◄── band selection ◄────────┘
//!                           (hysteresis + guardrails + ramp limit)
//! ```

pub mod bands;
pub mod clock;
pub mod config;
pub mod controller;
pub mod ingest;
pub mod phase_machine;
pub mod signal;
pub mod state;

#[cfg(test)]
mod tests_proptest;

// Band table and pattern types
pub use bands::{affirmation, select_band, Band, BreathMode, PhaseBounds, PhasePattern, BANDS, GUARDRAILS};

// Configuration
pub use config::{CoachConfig, ConfigError};

// Controller and response records
pub use controller::{
    BreathCoachController, PhaseStep, PlanResponse, SessionStart, StatusReport, StopOutcome,
    TelemetryAck,
};

// Input normalization boundary
pub use ingest::{normalize_user_id, sanitize_stress_prob, FaceObservation};

// Phase timeline
pub use phase_machine::{Phase, PhaseDurations, PhaseMachine};

// Smoothing and freshness primitives
pub use signal::{ema_step, ramp_limit, SignalQuality};

// Per-user state record
pub use state::UserBreathState;
