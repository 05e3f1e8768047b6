// Jump Trainer Core - jump phase analysis and flight-time height estimation
// Streaming per-frame state machines over pre-extracted pose recordings

// Module declarations
pub mod analysis;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod height;
pub mod pipeline;
pub mod pose;
pub mod testing;

// Re-exports for convenience
pub use analysis::{JumpMetrics, JumpPhase, PhaseSession, PhaseUpdate, ScoreNormalizer};
pub use config::AppConfig;
pub use error::{AnalysisError, ErrorCode, RecordingError};
pub use fixtures::{PoseRecording, RecordingCatalog};
pub use height::{HeightEstimator, HeightPhase};
pub use pipeline::{JumpAnalyzer, JumpReport};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        let report = JumpReport {
            recording: "r".to_string(),
            fps: 30.0,
            frames: 0,
            metrics: JumpMetrics::default(),
            jump_height_m: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["jump_height_m"].is_null());
        assert_eq!(JumpAnalyzer::default().config().video.default_fps, 30.0);
    }
}
