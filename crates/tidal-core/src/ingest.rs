//! Input normalization boundary.
//!
//! Every defaulting and coercion the controller performs on its inputs lives
//! here, so the "always succeeds" contract stays auditable in one place:
//! missing user ids collapse to `"anon"`, non-finite stress values are coerced
//! to 0.0, and the upstream classifier result is reduced to the
//! (stress, face_present, quality) triple the controller ingests.

use serde::{Deserialize, Serialize};

/// Quality tag for a capture with a visible face.
pub const QUALITY_OK: &str = "ok";
/// Quality tag for a capture with no detectable face.
pub const QUALITY_NO_FACE: &str = "no_face";

/// User id used when no identity is available.
pub const ANON_USER: &str = "anon";

/// Collapse a missing or empty user id to the anonymous id.
pub fn normalize_user_id(user_id: Option<&str>) -> String {
    match user_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => ANON_USER.to_string(),
    }
}

/// Coerce a non-finite stress probability to 0.0. Finite out-of-range values
/// pass through untouched; the upstream classifier owns the [0, 1] contract.
pub fn sanitize_stress_prob(stress_prob: f32) -> f32 {
    if stress_prob.is_finite() {
        stress_prob
    } else {
        log::warn!("non-finite stress_prob {stress_prob}, coercing to 0.0");
        0.0
    }
}

/// Result of one face-emotion classification, as delivered by the upstream
/// pipeline. Missing fields deserialize to their zero values.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FaceObservation {
    /// Number of faces detected in the frame.
    #[serde(default)]
    pub faces: u32,
    /// Stress probability for the dominant face.
    #[serde(default)]
    pub stress_prob: f32,
}

impl FaceObservation {
    /// Whether the frame contained a usable face.
    pub fn face_present(&self) -> bool {
        self.faces > 0
    }

    /// Derived quality tag for the capture.
    pub fn quality(&self) -> &'static str {
        if self.face_present() {
            QUALITY_OK
        } else {
            QUALITY_NO_FACE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ids_collapse_to_anon() {
        assert_eq!(normalize_user_id(None), "anon");
        assert_eq!(normalize_user_id(Some("")), "anon");
        assert_eq!(normalize_user_id(Some("u1")), "u1");
    }

    #[test]
    fn non_finite_stress_coerced() {
        assert_eq!(sanitize_stress_prob(f32::NAN), 0.0);
        assert_eq!(sanitize_stress_prob(f32::INFINITY), 0.0);
        // Finite out-of-range values pass through.
        assert_eq!(sanitize_stress_prob(1.7), 1.7);
        assert_eq!(sanitize_stress_prob(0.4), 0.4);
    }

    #[test]
    fn observation_derives_presence_and_quality() {
        let seen = FaceObservation { faces: 2, stress_prob: 0.6 };
        assert!(seen.face_present());
        assert_eq!(seen.quality(), "ok");

        let empty = FaceObservation { faces: 0, stress_prob: 0.6 };
        assert!(!empty.face_present());
        assert_eq!(empty.quality(), "no_face");
    }

    #[test]
    fn missing_fields_default_on_deserialize() {
        let obs: FaceObservation = serde_json::from_str("{}").unwrap();
        assert_eq!(obs.faces, 0);
        assert_eq!(obs.stress_prob, 0.0);
    }
}
