//! Configuration management for analysis parameter tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling fast iteration without recompilation. Every threshold used by the
//! phase engine, the score normalizers and the height estimator can be
//! adjusted via the config file for rapid experimentation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub phase: PhaseConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub height: HeightConfig,
    #[serde(default)]
    pub video: VideoConfig,
}

/// Phase segmentation thresholds (degrees)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Minimum landmark visibility for a joint angle to be defined
    pub min_visibility: f64,
    /// Average hip flexion at or below which loading begins
    pub loading_entry_hip_deg: f64,
    /// Rebound above the loading minimum required for takeoff
    pub rebound_margin_deg: f64,
    /// Frame-to-frame hip flexion increase required for takeoff
    pub dramatic_increase_deg: f64,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            min_visibility: 0.5,
            loading_entry_hip_deg: 90.0,
            rebound_margin_deg: 4.0,
            dramatic_increase_deg: 6.0,
        }
    }
}

/// Score normalization targets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Ideal smallest loading hip flexion
    pub hip_target_deg: f64,
    /// Acceptable smallest loading knee flexion, lower bound
    pub knee_range_min_deg: f64,
    /// Acceptable smallest loading knee flexion, upper bound
    pub knee_range_max_deg: f64,
    /// Ideal peak shoulder angle during loading
    pub shoulder_target_deg: f64,
    /// Angular velocity (deg/s) that maps to a full score
    pub angular_velocity_divisor: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            hip_target_deg: 70.0,
            knee_range_min_deg: 83.0,
            knee_range_max_deg: 90.0,
            shoulder_target_deg: 90.0,
            angular_velocity_divisor: 500.0,
        }
    }
}

/// Flight-time height estimator parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightConfig {
    /// Frames used to vote for the camera-facing side
    pub side_detect_frames: usize,
    /// Valid ankle samples averaged into the ground reference
    pub ground_calibration_frames: usize,
    /// Pixels above ground the ankle must rise to count as airborne
    pub airborne_threshold_px: f64,
    /// Capacity of the ankle smoothing window
    pub smooth_window: usize,
    /// Jumps below this height (meters) are discarded
    pub min_jump_height_m: f64,
    /// Gravitational acceleration (m/s^2)
    pub gravity: f64,
}

impl Default for HeightConfig {
    fn default() -> Self {
        Self {
            side_detect_frames: 5,
            ground_calibration_frames: 30,
            airborne_threshold_px: 7.0,
            smooth_window: 5,
            min_jump_height_m: 0.05,
            gravity: 9.81,
        }
    }
}

/// Frame source parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Frame rate used when a recording does not report a usable one
    pub default_fps: f64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self { default_fps: 30.0 }
    }
}

impl VideoConfig {
    /// Resolve the effective frame rate for a recording
    pub fn resolve_fps(&self, reported: Option<f64>) -> f64 {
        match reported {
            Some(fps) if fps.is_finite() && fps > 0.0 => fps,
            _ => self.default_fps,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration. If the file doesn't exist or the JSON is
    /// invalid, a warning is logged and the defaults are returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.phase.rebound_margin_deg, 4.0);
        assert_eq!(config.phase.dramatic_increase_deg, 6.0);
        assert_eq!(config.phase.loading_entry_hip_deg, 90.0);
        assert_eq!(config.scoring.hip_target_deg, 70.0);
        assert_eq!(config.scoring.angular_velocity_divisor, 500.0);
        assert_eq!(config.height.side_detect_frames, 5);
        assert_eq!(config.height.ground_calibration_frames, 30);
        assert_eq!(config.height.smooth_window, 5);
        assert_eq!(config.height.gravity, 9.81);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{ "height": { "airborne_threshold_px": 12.0 } }"#).unwrap();
        assert_eq!(parsed.height.airborne_threshold_px, 12.0);
        assert_eq!(parsed.height.smooth_window, 5);
        assert_eq!(parsed.phase.rebound_margin_deg, 4.0);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/jump_config.json");
        assert_eq!(config.scoring.knee_range_min_deg, 83.0);
    }

    #[test]
    fn test_resolve_fps() {
        let video = VideoConfig::default();
        assert_eq!(video.resolve_fps(Some(60.0)), 60.0);
        assert_eq!(video.resolve_fps(Some(0.0)), 30.0);
        assert_eq!(video.resolve_fps(Some(f64::NAN)), 30.0);
        assert_eq!(video.resolve_fps(None), 30.0);
    }
}
