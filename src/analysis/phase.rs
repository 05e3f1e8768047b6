// PhaseSession - jump phase segmentation over a stream of joint angles
//
// The session is a fold over frames in strict temporal order. It keeps only
// O(1) running state: the current phase, the previous average hip flexion,
// loading extrema, the analysis side and two shoulder peak trackers.
//
// Phase transitions (see `next_phase`):
//
//   approach --(avg hip <= entry threshold)--> loading
//   loading  --(rebound >= margin AND frame increase >= dramatic)--> takeoff
//   takeoff  is terminal
//
// Frames without any hip flexion value leave phase and extrema untouched,
// so occluded stretches never reset an analysis in progress.

use serde::{Deserialize, Serialize};

use crate::analysis::angles::{AngleExtractor, JointAngleSet, SideAngles};
use crate::config::PhaseConfig;
use crate::pose::{FrameSample, Side};

/// Biomechanical phase of the jump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpPhase {
    Approach,
    Loading,
    Takeoff,
}

impl JumpPhase {
    pub fn display_name(&self) -> &'static str {
        match self {
            JumpPhase::Approach => "approach",
            JumpPhase::Loading => "loading",
            JumpPhase::Takeoff => "takeoff",
        }
    }
}

/// Hip flexion inputs to one phase transition decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSignal {
    /// Mean hip flexion of the current frame
    pub avg_hip_flexion: f64,
    /// Mean hip flexion of the last frame that had one
    pub prev_avg_hip_flexion: Option<f64>,
    /// Running loading minimum, already including the current frame
    pub loading_min_hip_flexion: Option<f64>,
}

/// Transition table for the phase state machine
///
/// `approach` can only move to `loading`, `loading` can only move to
/// `takeoff`, and `takeoff` never moves.
pub fn next_phase(phase: JumpPhase, signal: &PhaseSignal, config: &PhaseConfig) -> JumpPhase {
    match phase {
        JumpPhase::Approach => {
            if signal.avg_hip_flexion <= config.loading_entry_hip_deg {
                JumpPhase::Loading
            } else {
                JumpPhase::Approach
            }
        }
        JumpPhase::Loading => {
            let rebounded = signal
                .loading_min_hip_flexion
                .is_some_and(|min| signal.avg_hip_flexion >= min + config.rebound_margin_deg);
            let dramatic = signal
                .prev_avg_hip_flexion
                .is_some_and(|prev| signal.avg_hip_flexion - prev >= config.dramatic_increase_deg);

            if rebounded && dramatic {
                JumpPhase::Takeoff
            } else {
                JumpPhase::Loading
            }
        }
        JumpPhase::Takeoff => JumpPhase::Takeoff,
    }
}

/// Strict running maximum of an angle and the time it occurred
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoulderPeak {
    pub angle: Option<f64>,
    pub timestamp: Option<f64>,
}

impl ShoulderPeak {
    fn observe(&mut self, angle: f64, timestamp: f64) {
        if self.angle.map_or(true, |peak| angle > peak) {
            self.angle = Some(angle);
            self.timestamp = Some(timestamp);
        }
    }

    fn value(&self) -> Option<(f64, f64)> {
        Some((self.angle?, self.timestamp?))
    }
}

/// Extrema observed across the loading span
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadingExtrema {
    /// Running minimum hip flexion of the current loading run
    pub running_min_hip_flexion: Option<f64>,
    pub min_hip_flexion: Option<f64>,
    pub min_knee_flexion: Option<f64>,
    pub max_knee_flexion: Option<f64>,
}

impl LoadingExtrema {
    fn start_run(&mut self, avg_hip: f64, knee: Option<f64>) {
        self.running_min_hip_flexion = Some(avg_hip);
        self.absorb(knee);
    }

    fn continue_run(&mut self, avg_hip: f64, knee: Option<f64>) {
        self.running_min_hip_flexion = Some(
            self.running_min_hip_flexion
                .map_or(avg_hip, |min| min.min(avg_hip)),
        );
        self.absorb(knee);
    }

    fn absorb(&mut self, knee: Option<f64>) {
        if let Some(running) = self.running_min_hip_flexion {
            if self.min_hip_flexion.map_or(true, |min| running < min) {
                self.min_hip_flexion = Some(running);
            }
        }
        if let Some(knee) = knee {
            if self.min_knee_flexion.map_or(true, |min| knee < min) {
                self.min_knee_flexion = Some(knee);
            }
            if self.max_knee_flexion.map_or(true, |max| knee > max) {
                self.max_knee_flexion = Some(knee);
            }
        }
    }
}

/// Per-side counters of frames with a valid shoulder angle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideVotes {
    pub left: u32,
    pub right: u32,
}

impl SideVotes {
    /// Count this frame and pick the side it suggests, if any
    ///
    /// A single visible shoulder wins outright; with both visible the side
    /// with more valid frames so far wins, ties going left.
    fn vote(&mut self, left_present: bool, right_present: bool) -> Option<Side> {
        if left_present {
            self.left += 1;
        }
        if right_present {
            self.right += 1;
        }

        match (left_present, right_present) {
            (true, false) => Some(Side::Left),
            (false, true) => Some(Side::Right),
            (true, true) if self.left >= self.right => Some(Side::Left),
            (true, true) => Some(Side::Right),
            (false, false) => None,
        }
    }
}

/// What the engine knows after one frame, for overlays and streaming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseUpdate {
    pub frame_index: u64,
    pub timestamp: f64,
    /// `None` when the frame had no person or no hip flexion
    pub phase: Option<JumpPhase>,
    pub side: Option<Side>,
    pub side_angles: Option<SideAngles>,
}

impl PhaseUpdate {
    /// Text lines describing this frame, as drawn on annotated video
    pub fn overlay_lines(&self) -> Vec<String> {
        fn line(label: &str, value: Option<f64>) -> String {
            match value {
                Some(v) => format!("{}: {:.1}", label, v),
                None => format!("{}: not detected!", label),
            }
        }

        let phase = match self.phase {
            Some(phase) => format!("Jump phase: {}", phase.display_name()),
            None => "Jump phase: not detected!".to_string(),
        };
        let side = match self.side {
            Some(side) => format!("Dominant side: {}", side.display_name()),
            None => "Dominant side: not detected!".to_string(),
        };
        let angles = self.side_angles.unwrap_or_default();

        vec![
            phase,
            side,
            line("Knee flexion", angles.knee_flexion),
            line("Hip flexion", angles.hip_flexion),
            line("Ankle angle", angles.ankle_angle),
            line("Shoulder angle", angles.shoulder_angle),
        ]
    }
}

/// Finalized, read-only view of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub phase: JumpPhase,
    pub analysis_side: Option<Side>,
    pub side_locked: bool,
    pub loading: LoadingExtrema,
    pub loading_shoulder_peak: ShoulderPeak,
    pub takeoff_shoulder_peak: ShoulderPeak,
    /// Shoulder swing speed between the two peaks (deg/s)
    pub angular_velocity: Option<f64>,
    pub frames_seen: usize,
    pub frames_with_person: usize,
}

/// Mutable phase segmentation state for one video
#[derive(Debug, Clone)]
pub struct PhaseSession {
    config: PhaseConfig,
    extractor: AngleExtractor,
    phase: JumpPhase,
    prev_avg_hip_flexion: Option<f64>,
    loading: LoadingExtrema,
    analysis_side: Option<Side>,
    side_locked: bool,
    votes: SideVotes,
    loading_shoulder_peak: ShoulderPeak,
    takeoff_shoulder_peak: ShoulderPeak,
    frames_seen: usize,
    frames_with_person: usize,
}

impl PhaseSession {
    pub fn new(config: PhaseConfig) -> Self {
        Self {
            extractor: AngleExtractor::from_config(&config),
            config,
            phase: JumpPhase::Approach,
            prev_avg_hip_flexion: None,
            loading: LoadingExtrema::default(),
            analysis_side: None,
            side_locked: false,
            votes: SideVotes::default(),
            loading_shoulder_peak: ShoulderPeak::default(),
            takeoff_shoulder_peak: ShoulderPeak::default(),
            frames_seen: 0,
            frames_with_person: 0,
        }
    }

    pub fn phase(&self) -> JumpPhase {
        self.phase
    }

    pub fn analysis_side(&self) -> Option<Side> {
        self.analysis_side
    }

    pub fn is_side_locked(&self) -> bool {
        self.side_locked
    }

    pub fn loading_extrema(&self) -> &LoadingExtrema {
        &self.loading
    }

    pub fn frames_with_person(&self) -> usize {
        self.frames_with_person
    }

    /// Process a frame in which a person was detected
    pub fn observe(&mut self, frame: &FrameSample) -> PhaseUpdate {
        let angles = self.extractor.extract(frame);
        self.observe_angles(frame.frame_index, frame.timestamp, &angles)
    }

    /// Record a frame in which no person was detected
    pub fn observe_empty(&mut self, frame_index: u64, timestamp: f64) -> PhaseUpdate {
        self.frames_seen += 1;
        PhaseUpdate {
            frame_index,
            timestamp,
            phase: None,
            side: self.analysis_side,
            side_angles: None,
        }
    }

    /// Process precomputed joint angles for one frame
    pub fn observe_angles(
        &mut self,
        frame_index: u64,
        timestamp: f64,
        angles: &JointAngleSet,
    ) -> PhaseUpdate {
        self.frames_seen += 1;
        self.frames_with_person += 1;

        let left_shoulder = angles.left.shoulder_angle;
        let right_shoulder = angles.right.shoulder_angle;
        let candidate = self
            .votes
            .vote(left_shoulder.is_some(), right_shoulder.is_some());
        if !self.side_locked {
            if let Some(side) = candidate {
                self.analysis_side = Some(side);
            }
        }

        let selected_shoulder = match self.analysis_side {
            Some(side) => angles.side(side).shoulder_angle,
            None => left_shoulder.or(right_shoulder),
        };

        let mut update = PhaseUpdate {
            frame_index,
            timestamp,
            phase: None,
            side: self.analysis_side,
            side_angles: self.analysis_side.map(|side| *angles.side(side)),
        };

        let Some(avg_hip) = angles.average_hip_flexion() else {
            return update;
        };

        self.advance(frame_index, avg_hip, angles.min_knee_flexion());

        if self.phase == JumpPhase::Loading && !self.side_locked {
            if let Some(side) = self.analysis_side {
                self.side_locked = true;
                log::info!(
                    "[PhaseEngine] Analysis side locked to {} at frame {}",
                    side.display_name(),
                    frame_index
                );
            }
        }

        if let Some(angle) = selected_shoulder {
            match self.phase {
                JumpPhase::Loading => self.loading_shoulder_peak.observe(angle, timestamp),
                JumpPhase::Takeoff => self.takeoff_shoulder_peak.observe(angle, timestamp),
                JumpPhase::Approach => {}
            }
        }

        update.phase = Some(self.phase);
        update
    }

    fn advance(&mut self, frame_index: u64, avg_hip: f64, knee: Option<f64>) {
        if self.phase == JumpPhase::Loading {
            self.loading.continue_run(avg_hip, knee);
        }

        let signal = PhaseSignal {
            avg_hip_flexion: avg_hip,
            prev_avg_hip_flexion: self.prev_avg_hip_flexion,
            loading_min_hip_flexion: self.loading.running_min_hip_flexion,
        };
        let next = next_phase(self.phase, &signal, &self.config);

        if next != self.phase {
            if next == JumpPhase::Loading {
                self.loading.start_run(avg_hip, knee);
            }
            log::info!(
                "[PhaseEngine] {} -> {} at frame {} (avg hip {:.1})",
                self.phase.display_name(),
                next.display_name(),
                frame_index,
                avg_hip
            );
            self.phase = next;
        }

        self.prev_avg_hip_flexion = Some(avg_hip);
    }

    /// Freeze the session into its end-of-stream summary
    pub fn finish(&self) -> PhaseSummary {
        let angular_velocity = match (
            self.loading_shoulder_peak.value(),
            self.takeoff_shoulder_peak.value(),
        ) {
            (Some((loading_angle, loading_ts)), Some((takeoff_angle, takeoff_ts))) => {
                let delta_t = takeoff_ts - loading_ts;
                let velocity = (takeoff_angle - loading_angle) / delta_t;
                (delta_t > 0.0 && velocity.is_finite()).then_some(velocity)
            }
            _ => None,
        };

        log::debug!(
            "[PhaseEngine] Finished in {} after {} frames ({} with person)",
            self.phase.display_name(),
            self.frames_seen,
            self.frames_with_person
        );

        PhaseSummary {
            phase: self.phase,
            analysis_side: self.analysis_side,
            side_locked: self.side_locked,
            loading: self.loading,
            loading_shoulder_peak: self.loading_shoulder_peak,
            takeoff_shoulder_peak: self.takeoff_shoulder_peak,
            angular_velocity,
            frames_seen: self.frames_seen,
            frames_with_person: self.frames_with_person,
        }
    }
}

impl Default for PhaseSession {
    fn default() -> Self {
        Self::new(PhaseConfig::default())
    }
}
