// HeightEstimator - flight-time jump height from ankle motion
//
// The estimator is a four-state machine driven one frame at a time:
//
//   side_detect -> calibrating -> standing <-> airborne
//
// 1. side_detect: the first N frames vote for the camera-facing side; that
//    side's ankle is tracked for the rest of the video
// 2. calibrating: the mean of the first M valid ankle samples becomes the
//    ground reference
// 3. standing: the ankle rising more than the airborne threshold above the
//    ground starts a flight; the launch reference is the lowest ankle
//    position in the smoothing window, approximating the last grounded frame
// 4. airborne: the flight ends on the first frame the ankle drops below the
//    launch reference
//
// Height follows from a symmetric ballistic flight of duration t:
//
//   h = g * (t / 2)^2 / 2 = g * t^2 / 8

use serde::{Deserialize, Serialize};

use crate::config::HeightConfig;
use crate::height::window::{AnkleSample, AnkleWindow};
use crate::pose::{Side, Skeleton};

/// State of the height estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightPhase {
    SideDetect,
    Calibrating,
    Standing,
    Airborne,
}

impl HeightPhase {
    pub fn display_name(&self) -> &'static str {
        match self {
            HeightPhase::SideDetect => "side_detect",
            HeightPhase::Calibrating => "calibrating",
            HeightPhase::Standing => "standing",
            HeightPhase::Airborne => "airborne",
        }
    }
}

/// A completed flight that cleared the minimum height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpEvent {
    pub launch_frame: u64,
    pub landing_frame: u64,
    pub air_frames: u64,
    pub flight_time_s: f64,
    pub height_m: f64,
}

/// Ballistic height (m) of a flight lasting `flight_time_s`
pub fn ballistic_height(flight_time_s: f64, gravity: f64) -> f64 {
    gravity * flight_time_s * flight_time_s / 8.0
}

/// Finalized result of a height estimation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightSummary {
    /// Best jump in meters, `None` when no jump cleared the minimum
    pub best_height_m: Option<f64>,
    pub jumps: Vec<JumpEvent>,
    pub phase: HeightPhase,
    pub ankle_side: Option<Side>,
    pub ground_y: Option<f64>,
    pub frames_seen: usize,
    pub frames_with_person: usize,
}

/// Mutable height estimation state for one video
#[derive(Debug, Clone)]
pub struct HeightEstimator {
    config: HeightConfig,
    fps: f64,
    phase: HeightPhase,
    side_detect_frames: usize,
    left_votes: u32,
    right_votes: u32,
    ankle_side: Option<Side>,
    calibration: Vec<f64>,
    ground_y: Option<f64>,
    window: AnkleWindow,
    launch: Option<AnkleSample>,
    jumps: Vec<JumpEvent>,
    frames_seen: usize,
    frames_with_person: usize,
}

impl HeightEstimator {
    /// Create an estimator for a video running at `fps` frames per second
    pub fn new(config: HeightConfig, fps: f64) -> Self {
        let calibration_frames = config.ground_calibration_frames.max(1);
        Self {
            window: AnkleWindow::new(config.smooth_window),
            calibration: Vec::with_capacity(calibration_frames),
            config,
            fps,
            phase: HeightPhase::SideDetect,
            side_detect_frames: 0,
            left_votes: 0,
            right_votes: 0,
            ankle_side: None,
            ground_y: None,
            launch: None,
            jumps: Vec::new(),
            frames_seen: 0,
            frames_with_person: 0,
        }
    }

    pub fn phase(&self) -> HeightPhase {
        self.phase
    }

    pub fn ankle_side(&self) -> Option<Side> {
        self.ankle_side
    }

    pub fn ground_y(&self) -> Option<f64> {
        self.ground_y
    }

    pub fn launch(&self) -> Option<AnkleSample> {
        self.launch
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn completed_jumps(&self) -> &[JumpEvent] {
        &self.jumps
    }

    pub fn frames_with_person(&self) -> usize {
        self.frames_with_person
    }

    /// Feed one frame; `skeleton` is `None` when no person was detected
    pub fn process(&mut self, frame_index: u64, skeleton: Option<&Skeleton>) -> HeightPhase {
        self.frames_seen += 1;
        if skeleton.is_some() {
            self.frames_with_person += 1;
        }

        if self.phase == HeightPhase::SideDetect {
            self.detect_side(skeleton);
            return self.phase;
        }

        let ankle_y = match (skeleton, self.ankle_side) {
            (Some(skeleton), Some(side)) => skeleton.ankle_y(side),
            _ => None,
        };
        let Some(y) = ankle_y else {
            return self.phase;
        };

        match self.phase {
            HeightPhase::SideDetect => {}
            HeightPhase::Calibrating => self.calibrate(y),
            HeightPhase::Standing => {
                self.window.push(AnkleSample { y, frame_index });
                self.check_takeoff(y, frame_index);
            }
            HeightPhase::Airborne => {
                self.window.push(AnkleSample { y, frame_index });
                self.check_landing(y, frame_index);
            }
        }

        self.phase
    }

    fn detect_side(&mut self, skeleton: Option<&Skeleton>) {
        match skeleton.and_then(Skeleton::facing_side) {
            Some(Side::Left) => self.left_votes += 1,
            Some(Side::Right) => self.right_votes += 1,
            None => {}
        }
        self.side_detect_frames += 1;

        if self.side_detect_frames >= self.config.side_detect_frames.max(1) {
            let side = if self.left_votes >= self.right_votes {
                Side::Left
            } else {
                Side::Right
            };
            log::info!(
                "[HeightEstimator] Tracking {} ankle (votes left={}, right={})",
                side.display_name(),
                self.left_votes,
                self.right_votes
            );
            self.ankle_side = Some(side);
            self.phase = HeightPhase::Calibrating;
        }
    }

    fn calibrate(&mut self, y: f64) {
        self.calibration.push(y);
        if self.calibration.len() >= self.config.ground_calibration_frames.max(1) {
            let ground = self.calibration.iter().sum::<f64>() / self.calibration.len() as f64;
            log::info!(
                "[HeightEstimator] Ground calibrated at y={:.1} from {} samples",
                ground,
                self.calibration.len()
            );
            self.ground_y = Some(ground);
            self.phase = HeightPhase::Standing;
        }
    }

    fn check_takeoff(&mut self, y: f64, frame_index: u64) {
        let Some(ground) = self.ground_y else {
            return;
        };
        if y >= ground - self.config.airborne_threshold_px {
            return;
        }
        if let Some(launch) = self.window.lowest_point() {
            log::debug!(
                "[HeightEstimator] Airborne at frame {} (launch y={:.1} @ frame {})",
                frame_index,
                launch.y,
                launch.frame_index
            );
            self.launch = Some(launch);
            self.phase = HeightPhase::Airborne;
        }
    }

    fn check_landing(&mut self, y: f64, frame_index: u64) {
        let Some(launch) = self.launch else {
            return;
        };
        if y <= launch.y {
            return;
        }

        let air_frames = frame_index.saturating_sub(launch.frame_index);
        let flight_time_s = air_frames as f64 / self.fps;
        let height_m = ballistic_height(flight_time_s, self.config.gravity);

        if height_m.is_finite() && height_m >= self.config.min_jump_height_m {
            log::info!(
                "[HeightEstimator] Jump of {:.3} m ({} frames airborne, landed at frame {})",
                height_m,
                air_frames,
                frame_index
            );
            self.jumps.push(JumpEvent {
                launch_frame: launch.frame_index,
                landing_frame: frame_index,
                air_frames,
                flight_time_s,
                height_m,
            });
        } else {
            log::debug!(
                "[HeightEstimator] Discarded {:.3} m flight below {:.3} m minimum",
                height_m,
                self.config.min_jump_height_m
            );
        }

        self.window.clear();
        self.launch = None;
        self.phase = HeightPhase::Standing;
    }

    /// Highest completed jump, if any
    pub fn best_height(&self) -> Option<f64> {
        self.jumps.iter().map(|jump| jump.height_m).reduce(f64::max)
    }

    pub fn finish(&self) -> HeightSummary {
        HeightSummary {
            best_height_m: self.best_height(),
            jumps: self.jumps.clone(),
            phase: self.phase,
            ankle_side: self.ankle_side,
            ground_y: self.ground_y,
            frames_seen: self.frames_seen,
            frames_with_person: self.frames_with_person,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::skeleton::{
        LEFT_ANKLE, LEFT_HIP, LEFT_SHOULDER, RIGHT_ANKLE, RIGHT_HIP, RIGHT_SHOULDER,
    };

    const FPS: f64 = 30.0;
    const GROUND: f64 = 400.0;

    /// Left-facing skeleton with both ankles at `ankle_y`
    fn left_facing(ankle_y: f64) -> Skeleton {
        Skeleton::empty()
            .with_point(LEFT_SHOULDER, 100.0, 100.0)
            .with_point(RIGHT_SHOULDER, 110.0, 100.0)
            .with_point(LEFT_HIP, 100.0, 250.0)
            .with_point(RIGHT_HIP, 110.0, 250.0)
            .with_point(LEFT_ANKLE, 100.0, ankle_y)
            .with_point(RIGHT_ANKLE, 110.0, ankle_y)
    }

    struct Feed {
        estimator: HeightEstimator,
        frame: u64,
    }

    impl Feed {
        fn new(config: HeightConfig) -> Self {
            Self {
                estimator: HeightEstimator::new(config, FPS),
                frame: 0,
            }
        }

        fn push(&mut self, skeleton: Option<Skeleton>) -> HeightPhase {
            let phase = self.estimator.process(self.frame, skeleton.as_ref());
            self.frame += 1;
            phase
        }

        fn ankle(&mut self, y: f64, count: usize) {
            for _ in 0..count {
                self.push(Some(left_facing(y)));
            }
        }

        /// Side detection plus ground calibration on flat ground
        fn calibrated() -> Self {
            let mut feed = Self::new(HeightConfig::default());
            feed.ankle(GROUND, 5 + 30);
            assert_eq!(feed.estimator.phase(), HeightPhase::Standing);
            feed
        }
    }

    #[test]
    fn test_side_detect_window_counts_every_frame() {
        let mut feed = Feed::new(HeightConfig::default());
        for _ in 0..4 {
            assert_eq!(feed.push(None), HeightPhase::SideDetect);
        }
        assert_eq!(feed.push(None), HeightPhase::Calibrating);
        // No votes defaults to the left ankle
        assert_eq!(feed.estimator.ankle_side(), Some(Side::Left));
    }

    #[test]
    fn test_side_detect_majority() {
        let right_facing = Skeleton::empty()
            .with_point(LEFT_HIP, 120.0, 250.0)
            .with_point(RIGHT_HIP, 100.0, 250.0);
        let mut feed = Feed::new(HeightConfig::default());
        feed.push(Some(right_facing));
        feed.push(Some(right_facing));
        feed.push(Some(left_facing(GROUND)));
        feed.push(None);
        feed.push(Some(right_facing));
        assert_eq!(feed.estimator.ankle_side(), Some(Side::Right));
    }

    #[test]
    fn test_side_detect_tie_goes_left() {
        let right_facing = Skeleton::empty()
            .with_point(LEFT_SHOULDER, 120.0, 100.0)
            .with_point(RIGHT_SHOULDER, 100.0, 100.0);
        let mut feed = Feed::new(HeightConfig::default());
        feed.push(Some(right_facing));
        feed.push(Some(left_facing(GROUND)));
        feed.push(None);
        feed.push(None);
        feed.push(None);
        assert_eq!(feed.estimator.ankle_side(), Some(Side::Left));
    }

    #[test]
    fn test_calibration_skips_missing_ankles() {
        let mut feed = Feed::new(HeightConfig::default());
        feed.ankle(GROUND, 5);
        feed.ankle(GROUND, 20);
        feed.push(None);
        feed.push(Some(left_facing(0.0)));
        assert_eq!(feed.estimator.phase(), HeightPhase::Calibrating);
        feed.ankle(GROUND + 10.0, 10);
        assert_eq!(feed.estimator.phase(), HeightPhase::Standing);
        let expected = (20.0 * GROUND + 10.0 * (GROUND + 10.0)) / 30.0;
        assert!((feed.estimator.ground_y().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_small_rise_is_not_airborne() {
        let mut feed = Feed::calibrated();
        feed.ankle(GROUND - 7.0, 10);
        assert_eq!(feed.estimator.phase(), HeightPhase::Standing);
        feed.ankle(GROUND - 7.5, 1);
        assert_eq!(feed.estimator.phase(), HeightPhase::Airborne);
    }

    #[test]
    fn test_flight_time_height() {
        let n = 12;
        let mut feed = Feed::calibrated();
        feed.ankle(GROUND, 5);
        feed.ankle(GROUND - 30.0, n);
        assert_eq!(feed.estimator.phase(), HeightPhase::Airborne);
        feed.ankle(GROUND + 2.0, 1);
        assert_eq!(feed.estimator.phase(), HeightPhase::Standing);

        // Launch reference is the last grounded frame, one before the rise
        let jumps = feed.estimator.completed_jumps();
        assert_eq!(jumps.len(), 1);
        assert_eq!(jumps[0].air_frames, n as u64 + 1);
        let expected = 9.81 * ((n as f64 + 1.0) / FPS).powi(2) / 8.0;
        assert!((jumps[0].height_m - expected).abs() < 1e-9);

        let nominal = 9.81 * (n as f64 / FPS).powi(2) / 8.0;
        assert!((feed.estimator.best_height().unwrap() - nominal).abs() < 0.05);
        assert_eq!(feed.estimator.window_len(), 0);
        assert_eq!(feed.estimator.launch(), None);
    }

    #[test]
    fn test_returning_to_launch_height_stays_airborne() {
        let mut feed = Feed::calibrated();
        feed.ankle(GROUND, 5);
        feed.ankle(GROUND - 20.0, 5);
        feed.ankle(GROUND, 3);
        assert_eq!(feed.estimator.phase(), HeightPhase::Airborne);
        assert!(feed.estimator.completed_jumps().is_empty());
    }

    #[test]
    fn test_short_hop_is_discarded() {
        // 3 frames from launch to landing = 0.1 s -> 0.012 m, below 0.05 m
        let mut feed = Feed::calibrated();
        feed.ankle(GROUND, 5);
        feed.ankle(GROUND - 20.0, 2);
        feed.ankle(GROUND + 1.0, 1);
        assert_eq!(feed.estimator.phase(), HeightPhase::Standing);
        assert!(feed.estimator.completed_jumps().is_empty());
        assert_eq!(feed.estimator.finish().best_height_m, None);
    }

    #[test]
    fn test_missing_ankles_do_not_land() {
        let mut feed = Feed::calibrated();
        feed.ankle(GROUND, 5);
        feed.ankle(GROUND - 25.0, 4);
        for _ in 0..6 {
            feed.push(None);
        }
        assert_eq!(feed.estimator.phase(), HeightPhase::Airborne);
        feed.ankle(GROUND + 3.0, 1);
        // Occluded frames still count toward the flight duration
        assert_eq!(feed.estimator.completed_jumps()[0].air_frames, 11);
    }

    #[test]
    fn test_best_of_multiple_jumps() {
        let mut feed = Feed::calibrated();
        feed.ankle(GROUND, 5);
        feed.ankle(GROUND - 30.0, 10);
        feed.ankle(GROUND + 1.0, 1);
        feed.ankle(GROUND, 10);
        feed.ankle(GROUND - 30.0, 15);
        feed.ankle(GROUND + 1.0, 1);

        let summary = feed.estimator.finish();
        assert_eq!(summary.jumps.len(), 2);
        let best = summary.best_height_m.unwrap();
        assert_eq!(best, summary.jumps[1].height_m);
        assert!(summary.jumps[0].height_m < best);
    }

    #[test]
    fn test_no_person_reports_nothing() {
        let mut feed = Feed::new(HeightConfig::default());
        for _ in 0..50 {
            feed.push(None);
        }
        let summary = feed.estimator.finish();
        assert_eq!(summary.frames_seen, 50);
        assert_eq!(summary.frames_with_person, 0);
        assert_eq!(summary.best_height_m, None);
        assert_eq!(summary.phase, HeightPhase::Calibrating);
    }

    #[test]
    fn test_ballistic_height() {
        assert!((ballistic_height(0.5, 9.81) - 0.3065625).abs() < 1e-12);
        assert_eq!(ballistic_height(0.0, 9.81), 0.0);
    }
}
