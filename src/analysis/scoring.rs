// Score normalization - maps finished extrema to bounded 0-100 scores
//
// Two distance models are used:
// - target distance: 100 minus the absolute distance to an ideal value
// - range distance:  100 minus the distance outside an acceptable range
// Both lose one point per degree and never drop below zero. Undefined
// inputs produce undefined scores.

use serde::{Deserialize, Serialize};

use crate::analysis::phase::PhaseSummary;
use crate::config::ScoringConfig;

/// Score by distance from an ideal value
pub fn target_distance_score(value: Option<f64>, target: f64) -> Option<f64> {
    let value = value.filter(|v| v.is_finite())?;
    Some((100.0 - (value - target).abs()).max(0.0))
}

/// Score by distance outside an acceptable `[min, max]` range
pub fn range_distance_score(value: Option<f64>, min: f64, max: f64) -> Option<f64> {
    let value = value.filter(|v| v.is_finite())?;
    let distance = (min - value).max(value - max).max(0.0);
    Some((100.0 - distance).max(0.0))
}

/// Score a shoulder angular velocity against a full-marks divisor
pub fn angular_velocity_score(velocity: Option<f64>, divisor: f64) -> Option<f64> {
    let velocity = velocity.filter(|v| v.is_finite())?;
    let score = velocity / divisor * 100.0;
    score.is_finite().then(|| score.clamp(0.0, 100.0))
}

/// Public per-jump metrics record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JumpMetrics {
    pub hip_normalized_score: Option<f64>,
    pub smallest_loading_min_hip_flexion: Option<f64>,
    pub knee_normalized_score: Option<f64>,
    pub smallest_loading_min_knee_flexion: Option<f64>,
    pub angular_velocity: Option<f64>,
    pub angular_velocity_score: Option<f64>,
}

/// All scores derived from a finished phase session
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreMetrics {
    pub hip_score: Option<f64>,
    pub knee_score: Option<f64>,
    pub min_hip_flexion: Option<f64>,
    pub min_knee_flexion: Option<f64>,
    pub max_knee_flexion: Option<f64>,
    pub angular_velocity: Option<f64>,
    pub angular_velocity_score: Option<f64>,
    /// Peak loading shoulder angle scored against its target; kept out of
    /// [`JumpMetrics`]
    pub loading_shoulder_score: Option<f64>,
}

impl ScoreMetrics {
    /// The public subset of the scores
    pub fn to_jump_metrics(&self) -> JumpMetrics {
        JumpMetrics {
            hip_normalized_score: self.hip_score,
            smallest_loading_min_hip_flexion: self.min_hip_flexion,
            knee_normalized_score: self.knee_score,
            smallest_loading_min_knee_flexion: self.min_knee_flexion,
            angular_velocity: self.angular_velocity,
            angular_velocity_score: self.angular_velocity_score,
        }
    }
}

/// Applies the configured targets to phase summaries
#[derive(Debug, Clone, Default)]
pub struct ScoreNormalizer {
    config: ScoringConfig,
}

impl ScoreNormalizer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, summary: &PhaseSummary) -> ScoreMetrics {
        let loading = &summary.loading;
        let angular_velocity = summary.angular_velocity.filter(|v| v.is_finite());

        ScoreMetrics {
            hip_score: target_distance_score(loading.min_hip_flexion, self.config.hip_target_deg),
            knee_score: range_distance_score(
                loading.min_knee_flexion,
                self.config.knee_range_min_deg,
                self.config.knee_range_max_deg,
            ),
            min_hip_flexion: loading.min_hip_flexion,
            min_knee_flexion: loading.min_knee_flexion,
            max_knee_flexion: loading.max_knee_flexion,
            angular_velocity,
            angular_velocity_score: angular_velocity_score(
                angular_velocity,
                self.config.angular_velocity_divisor,
            ),
            loading_shoulder_score: target_distance_score(
                summary.loading_shoulder_peak.angle,
                self.config.shoulder_target_deg,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::phase::{JumpPhase, LoadingExtrema, ShoulderPeak};

    #[test]
    fn test_target_distance() {
        assert_eq!(target_distance_score(Some(70.0), 70.0), Some(100.0));
        assert_eq!(target_distance_score(Some(80.0), 70.0), Some(90.0));
        assert_eq!(target_distance_score(Some(60.0), 70.0), Some(90.0));
        assert_eq!(target_distance_score(Some(250.0), 70.0), Some(0.0));
        assert_eq!(target_distance_score(None, 70.0), None);
        assert_eq!(target_distance_score(Some(f64::NAN), 70.0), None);
    }

    #[test]
    fn test_target_distance_monotonic() {
        let mut last = f64::INFINITY;
        for step in 0..300 {
            let score = target_distance_score(Some(70.0 + step as f64), 70.0).unwrap();
            assert!(score <= last);
            assert!(score >= 0.0);
            last = score;
        }
    }

    #[test]
    fn test_range_distance() {
        for inside in [83.0, 85.5, 90.0] {
            assert_eq!(range_distance_score(Some(inside), 83.0, 90.0), Some(100.0));
        }
        assert_eq!(range_distance_score(Some(80.0), 83.0, 90.0), Some(97.0));
        assert_eq!(range_distance_score(Some(95.0), 83.0, 90.0), Some(95.0));
        assert_eq!(range_distance_score(Some(-50.0), 83.0, 90.0), Some(0.0));
        assert_eq!(range_distance_score(None, 83.0, 90.0), None);
    }

    #[test]
    fn test_angular_velocity_score_clamps() {
        assert_eq!(angular_velocity_score(Some(250.0), 500.0), Some(50.0));
        assert_eq!(angular_velocity_score(Some(900.0), 500.0), Some(100.0));
        assert_eq!(angular_velocity_score(Some(-40.0), 500.0), Some(0.0));
        assert_eq!(angular_velocity_score(None, 500.0), None);
        assert_eq!(angular_velocity_score(Some(10.0), 0.0), None);
    }

    #[test]
    fn test_normalizer_applies_targets() {
        let summary = PhaseSummary {
            phase: JumpPhase::Takeoff,
            analysis_side: None,
            side_locked: false,
            loading: LoadingExtrema {
                running_min_hip_flexion: Some(75.0),
                min_hip_flexion: Some(75.0),
                min_knee_flexion: Some(80.0),
                max_knee_flexion: Some(120.0),
            },
            loading_shoulder_peak: ShoulderPeak {
                angle: Some(100.0),
                timestamp: Some(0.2),
            },
            takeoff_shoulder_peak: ShoulderPeak::default(),
            angular_velocity: Some(400.0),
            frames_seen: 10,
            frames_with_person: 10,
        };

        let metrics = ScoreNormalizer::default().score(&summary);
        assert_eq!(metrics.hip_score, Some(95.0));
        assert_eq!(metrics.knee_score, Some(97.0));
        assert_eq!(metrics.angular_velocity_score, Some(80.0));
        assert_eq!(metrics.loading_shoulder_score, Some(90.0));

        let public = metrics.to_jump_metrics();
        assert_eq!(public.smallest_loading_min_hip_flexion, Some(75.0));
        assert_eq!(public.smallest_loading_min_knee_flexion, Some(80.0));
        assert_eq!(public.angular_velocity, Some(400.0));
    }

    #[test]
    fn test_public_record_field_names() {
        let json = serde_json::to_value(JumpMetrics::default()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 6);
        assert!(object["hip_normalized_score"].is_null());
        assert!(object.contains_key("angular_velocity_score"));
        assert!(!object.contains_key("loading_shoulder_score"));
    }
}
