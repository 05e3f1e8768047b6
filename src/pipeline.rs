// Pipeline - runs both analyses over one recording and merges the results
//
// The phase pipeline (landmarks -> angles -> phase session -> scores) and
// the height pipeline (skeletons -> height estimator) share nothing but the
// immutable recording. Each runs as a single-pass fold on its own blocking
// worker; the report is produced only when both succeed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::{
    JumpMetrics, PhaseSession, PhaseSummary, PhaseUpdate, ScoreMetrics, ScoreNormalizer,
};
use crate::config::{AppConfig, HeightConfig};
use crate::error::AnalysisError;
use crate::fixtures::PoseRecording;
use crate::height::{HeightEstimator, HeightSummary};

pub const PHASE_PIPELINE: &str = "phase";
pub const HEIGHT_PIPELINE: &str = "height";

/// Merged result of both pipelines for one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpReport {
    pub recording: String,
    pub fps: f64,
    pub frames: usize,
    pub metrics: JumpMetrics,
    pub jump_height_m: Option<f64>,
}

/// Finished phase pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseOutcome {
    pub summary: PhaseSummary,
    pub scores: ScoreMetrics,
}

/// Fold the landmark track through a phase session
///
/// `on_update` sees every frame's [`PhaseUpdate`] in order.
pub fn run_phase_pipeline<F>(
    recording: &PoseRecording,
    fps: f64,
    config: &AppConfig,
    mut on_update: F,
) -> Result<PhaseOutcome, AnalysisError>
where
    F: FnMut(&PhaseUpdate),
{
    let mut session = PhaseSession::new(config.phase.clone());
    for (frame_index, timestamp, sample) in recording.landmark_samples(fps) {
        let update = match sample {
            Some(sample) => session.observe(&sample),
            None => session.observe_empty(frame_index, timestamp),
        };
        on_update(&update);
    }

    let summary = session.finish();
    if summary.frames_with_person == 0 {
        return Err(AnalysisError::NoPersonDetected {
            pipeline: PHASE_PIPELINE.to_string(),
            frames: summary.frames_seen,
        });
    }

    let scores = ScoreNormalizer::new(config.scoring.clone()).score(&summary);
    Ok(PhaseOutcome { summary, scores })
}

/// Fold the skeleton track through a height estimator
pub fn run_height_pipeline(
    recording: &PoseRecording,
    fps: f64,
    config: &HeightConfig,
) -> Result<HeightSummary, AnalysisError> {
    let mut estimator = HeightEstimator::new(config.clone(), fps);
    for frame in &recording.skeleton_frames {
        estimator.process(frame.frame_index, frame.keypoints.as_ref());
    }

    let summary = estimator.finish();
    if summary.frames_with_person == 0 {
        return Err(AnalysisError::NoPersonDetected {
            pipeline: HEIGHT_PIPELINE.to_string(),
            frames: summary.frames_seen,
        });
    }
    Ok(summary)
}

/// Runs both pipelines concurrently for one recording at a time
#[derive(Debug, Clone, Default)]
pub struct JumpAnalyzer {
    config: AppConfig,
}

impl JumpAnalyzer {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Analyze a recording on two blocking workers and merge the results
    pub async fn analyze(&self, recording: PoseRecording) -> Result<JumpReport, AnalysisError> {
        let fps = self.config.video.resolve_fps(recording.fps);
        let recording = Arc::new(recording);
        tracing::info!(
            "[Pipeline] Analyzing '{}' at {:.2} fps ({} frames)",
            recording.name,
            fps,
            recording.frame_count()
        );

        let phase_task = {
            let recording = Arc::clone(&recording);
            let config = self.config.clone();
            tokio::task::spawn_blocking(move || {
                run_phase_pipeline(&recording, fps, &config, |_| {})
            })
        };
        let height_task = {
            let recording = Arc::clone(&recording);
            let config = self.config.height.clone();
            tokio::task::spawn_blocking(move || run_height_pipeline(&recording, fps, &config))
        };

        let (phase, height) = tokio::try_join!(
            join_worker(PHASE_PIPELINE, phase_task),
            join_worker(HEIGHT_PIPELINE, height_task)
        )?;

        let report = JumpReport {
            recording: recording.name.clone(),
            fps,
            frames: recording.frame_count(),
            metrics: phase.scores.to_jump_metrics(),
            jump_height_m: height.best_height_m,
        };
        tracing::info!(
            "[Pipeline] Finished '{}': phase={}, height={:?}",
            report.recording,
            phase.summary.phase.display_name(),
            report.jump_height_m
        );
        Ok(report)
    }
}

async fn join_worker<T>(
    pipeline: &str,
    handle: tokio::task::JoinHandle<Result<T, AnalysisError>>,
) -> Result<T, AnalysisError> {
    match handle.await {
        Ok(result) => result,
        Err(join_err) => {
            tracing::error!("[Pipeline] {} worker panicked: {}", pipeline, join_err);
            Err(AnalysisError::WorkerFailed {
                pipeline: pipeline.to_string(),
                reason: join_err.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::JumpPhase;
    use crate::fixtures::{LandmarkFrame, SkeletonFrame};
    use crate::testing::SyntheticJump;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn test_phase_pipeline_on_synthetic_jump() {
        let jump = SyntheticJump::default();
        let recording = jump.generate();
        let mut phases = Vec::new();
        let outcome = run_phase_pipeline(&recording, 30.0, &AppConfig::default(), |update| {
            phases.push(update.phase)
        })
        .unwrap();

        assert_eq!(phases.len(), jump.total_frames());
        assert_eq!(phases[0], Some(JumpPhase::Approach));
        let loading_start = jump.loading_start_frame() as usize;
        assert_eq!(phases[loading_start - 1], Some(JumpPhase::Approach));
        assert_eq!(phases[loading_start], Some(JumpPhase::Loading));
        assert_eq!(phases[jump.takeoff_frame() as usize], Some(JumpPhase::Takeoff));
        assert_eq!(outcome.summary.phase, JumpPhase::Takeoff);

        let min_hip = outcome.scores.min_hip_flexion.unwrap();
        assert!((min_hip - 75.0).abs() < 1e-6);
        assert!((outcome.scores.hip_score.unwrap() - 95.0).abs() < 1e-6);
        assert!((outcome.scores.knee_score.unwrap() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_height_pipeline_on_synthetic_jump() {
        let jump = SyntheticJump::default();
        let summary =
            run_height_pipeline(&jump.generate(), 30.0, &HeightConfig::default()).unwrap();
        assert_eq!(summary.jumps.len(), 1);
        assert_eq!(summary.jumps[0].air_frames, jump.expected_air_frames());
        assert!((summary.best_height_m.unwrap() - jump.expected_height_m()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_tracks_report_no_person() {
        let recording = PoseRecording {
            landmark_frames: vec![LandmarkFrame {
                frame_index: 0,
                landmarks: None,
            }],
            skeleton_frames: vec![SkeletonFrame {
                frame_index: 0,
                keypoints: None,
            }],
            ..PoseRecording::default()
        };

        let phase = run_phase_pipeline(&recording, 30.0, &AppConfig::default(), |_| {});
        assert!(matches!(
            phase,
            Err(AnalysisError::NoPersonDetected { ref pipeline, frames: 1 }) if pipeline == PHASE_PIPELINE
        ));
        let height = run_height_pipeline(&recording, 30.0, &HeightConfig::default());
        assert!(matches!(
            height,
            Err(AnalysisError::NoPersonDetected { ref pipeline, .. }) if pipeline == HEIGHT_PIPELINE
        ));
    }

    #[test]
    fn test_analyze_merges_both_pipelines() {
        let jump = SyntheticJump::default().with_name("merge");
        let report = runtime()
            .block_on(JumpAnalyzer::default().analyze(jump.generate()))
            .unwrap();

        assert_eq!(report.recording, "merge");
        assert_eq!(report.fps, 30.0);
        assert_eq!(report.frames, jump.total_frames());
        assert!(report.metrics.hip_normalized_score.is_some());
        assert!((report.jump_height_m.unwrap() - jump.expected_height_m()).abs() < 1e-9);
    }

    #[test]
    fn test_analyze_fails_when_one_pipeline_fails() {
        let mut recording = SyntheticJump::default().generate();
        for frame in &mut recording.skeleton_frames {
            frame.keypoints = None;
        }
        let err = runtime()
            .block_on(JumpAnalyzer::default().analyze(recording))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NoPersonDetected { .. }));
    }

    #[test]
    fn test_missing_fps_uses_default() {
        let mut recording = SyntheticJump::default().generate();
        recording.fps = Some(0.0);
        let report = runtime()
            .block_on(JumpAnalyzer::default().analyze(recording))
            .unwrap();
        assert_eq!(report.fps, 30.0);
    }
}
