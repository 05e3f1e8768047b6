//! Deterministic synthetic jump recordings.
//!
//! Generates both keypoint tracks of a side-on countermovement jump so the
//! pipelines can be exercised without a pose model or a video. The
//! landmark track drives hip flexion through approach, a descending loading
//! dip and a sharp takeoff rebound. The skeleton track stands still long
//! enough for side detection and ground calibration, then follows a
//! ballistic arc for `air_frames` frames and lands with a small heel dip.
//!
//! Pixel jitter comes from a seeded `StdRng`, so equal parameters always produce
//! equal recordings.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::fixtures::{LandmarkFrame, PoseRecording, SkeletonFrame};
use crate::height::ballistic_height;
use crate::pose::skeleton::{
    LEFT_ANKLE, LEFT_HIP, LEFT_KNEE, LEFT_SHOULDER, NOSE, RIGHT_ANKLE, RIGHT_HIP, RIGHT_KNEE,
    RIGHT_SHOULDER,
};
use crate::pose::{Keypoint, Landmark, LandmarkMap, Side, Skeleton};

const SEGMENT_TORSO: f64 = 150.0;
const SEGMENT_THIGH: f64 = 100.0;
const SEGMENT_SHIN: f64 = 100.0;
const SEGMENT_ARM: f64 = 70.0;
const SEGMENT_FOOT: f64 = 30.0;
const LANDMARK_VISIBILITY: f64 = 0.95;
const HIP_X: f64 = 320.0;
const HIP_Y: f64 = 260.0;

/// Parameters of a generated jump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticJump {
    pub name: String,
    pub fps: f64,
    /// Frames standing on the ground before leaving it
    pub standing_frames: usize,
    /// Trailing standing frames that form the loading dip
    pub loading_frames: usize,
    pub air_frames: usize,
    pub landing_frames: usize,
    /// Approach hip flexion, well above the loading entry threshold
    pub approach_hip_deg: f64,
    /// First loading frame's hip flexion
    pub loading_entry_hip_deg: f64,
    /// Deepest loading hip flexion
    pub min_hip_deg: f64,
    /// Knee flexion is hip flexion plus this offset
    pub knee_offset_deg: f64,
    pub ground_y: f64,
    pub pixels_per_meter: f64,
    pub gravity: f64,
    /// Maximum absolute pixel noise per coordinate
    pub jitter_px: f64,
    pub seed: u64,
}

impl Default for SyntheticJump {
    fn default() -> Self {
        Self {
            name: "synthetic_jump".to_string(),
            fps: 30.0,
            standing_frames: 50,
            loading_frames: 8,
            air_frames: 12,
            landing_frames: 10,
            approach_hip_deg: 120.0,
            loading_entry_hip_deg: 88.0,
            min_hip_deg: 75.0,
            knee_offset_deg: 10.0,
            ground_y: 400.0,
            pixels_per_meter: 400.0,
            gravity: 9.81,
            jitter_px: 0.0,
            seed: 0x5A5A_FFF0,
        }
    }
}

impl SyntheticJump {
    pub fn with_air_frames(mut self, air_frames: usize) -> Self {
        self.air_frames = air_frames;
        self
    }

    pub fn with_jitter(mut self, jitter_px: f64) -> Self {
        self.jitter_px = jitter_px.max(0.0);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn total_frames(&self) -> usize {
        self.standing_frames + self.air_frames + self.landing_frames
    }

    /// First frame with both feet off the ground
    pub fn takeoff_frame(&self) -> u64 {
        self.standing_frames as u64
    }

    /// Frames from the last grounded frame to the first landing frame
    pub fn expected_air_frames(&self) -> u64 {
        self.air_frames as u64 + 1
    }

    /// Height the estimator should report for a noise-free recording
    pub fn expected_height_m(&self) -> f64 {
        ballistic_height(self.expected_air_frames() as f64 / self.fps, self.gravity)
    }

    /// Frame at which the landmark track enters loading
    pub fn loading_start_frame(&self) -> u64 {
        self.standing_frames.saturating_sub(self.loading_frames) as u64
    }

    pub fn generate(&self) -> PoseRecording {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let total = self.total_frames();

        let mut landmark_frames = Vec::with_capacity(total);
        let mut skeleton_frames = Vec::with_capacity(total);
        for frame in 0..total {
            let frame_index = frame as u64;
            let pose = self.pose_at(frame);
            landmark_frames.push(LandmarkFrame {
                frame_index,
                landmarks: Some(self.landmarks(&pose, &mut rng)),
            });
            skeleton_frames.push(SkeletonFrame {
                frame_index,
                keypoints: Some(self.skeleton(frame, &pose, &mut rng)),
            });
        }

        PoseRecording {
            name: self.name.clone(),
            fps: Some(self.fps),
            landmark_frames,
            skeleton_frames,
        }
    }

    fn pose_at(&self, frame: usize) -> JointTargets {
        let loading_start = self.loading_start_frame() as usize;
        let hip = if frame < loading_start {
            // Slow descent toward the entry threshold, never reaching it
            let progress = frame as f64 / loading_start.max(1) as f64;
            self.approach_hip_deg - progress * (self.approach_hip_deg - 95.0).max(0.0)
        } else if frame < self.standing_frames {
            let steps = self.loading_frames.saturating_sub(1).max(1) as f64;
            let progress = (frame - loading_start) as f64 / steps;
            self.loading_entry_hip_deg - progress * (self.loading_entry_hip_deg - self.min_hip_deg)
        } else {
            let rebound = 15.0 * (frame - self.standing_frames + 1) as f64;
            (self.min_hip_deg + rebound).min(170.0)
        };

        // Arms swing back while loading, then forward and up through takeoff
        let shoulder = if frame < loading_start {
            25.0
        } else if frame < self.standing_frames {
            30.0 + 2.0 * (frame - loading_start) as f64
        } else {
            (50.0 + 10.0 * (frame - self.standing_frames + 1) as f64).min(130.0)
        };

        JointTargets {
            hip_flexion: hip,
            knee_flexion: (hip + self.knee_offset_deg).min(178.0),
            shoulder_angle: shoulder,
        }
    }

    fn landmarks(&self, pose: &JointTargets, rng: &mut StdRng) -> LandmarkMap {
        let mut map = LandmarkMap::new();
        for side in [Side::Left, Side::Right] {
            // The far side sits a few pixels behind the near side
            let offset = match side {
                Side::Left => 0.0,
                Side::Right => 8.0,
            };
            let chain = Chain::solve(HIP_X + offset, HIP_Y, pose);
            let points = [
                (Landmark::shoulder(side), chain.shoulder),
                (Landmark::elbow(side), chain.elbow),
                (Landmark::hip(side), chain.hip),
                (Landmark::knee(side), chain.knee),
                (Landmark::ankle(side), chain.ankle),
                (Landmark::foot_index(side), chain.foot),
            ];
            for (landmark, (x, y)) in points {
                let (x, y) = (x + self.noise(rng), y + self.noise(rng));
                map.insert(landmark, Keypoint::new(x, y, LANDMARK_VISIBILITY));
            }
        }
        map.insert(
            Landmark::Nose,
            Keypoint::new(HIP_X + 20.0, HIP_Y - SEGMENT_TORSO - 40.0, LANDMARK_VISIBILITY),
        );
        map
    }

    fn skeleton(&self, frame: usize, pose: &JointTargets, rng: &mut StdRng) -> Skeleton {
        let chain = Chain::solve(HIP_X, HIP_Y, pose);
        let ankle_y = self.ankle_height(frame);
        let lift = self.ground_y - ankle_y;
        // Heel compression on landing only moves the ankles
        let body_lift = lift.max(0.0);

        let mut skeleton = Skeleton::empty().with_point(
            NOSE,
            HIP_X + 20.0,
            HIP_Y - SEGMENT_TORSO - 40.0 - body_lift,
        );
        // Left-facing: each right point sits further right than its left twin
        for (left, right, (x, y)) in [
            (LEFT_SHOULDER, RIGHT_SHOULDER, chain.shoulder),
            (LEFT_HIP, RIGHT_HIP, chain.hip),
            (LEFT_KNEE, RIGHT_KNEE, chain.knee),
        ] {
            let y = y - body_lift;
            skeleton = skeleton
                .with_point(left, x + self.noise(rng), y + self.noise(rng))
                .with_point(right, x + 12.0 + self.noise(rng), y + self.noise(rng));
        }
        skeleton
            .with_point(LEFT_ANKLE, chain.ankle.0 + self.noise(rng), ankle_y + self.noise(rng))
            .with_point(
                RIGHT_ANKLE,
                chain.ankle.0 + 12.0 + self.noise(rng),
                ankle_y + self.noise(rng),
            )
    }

    /// Ankle pixel height at `frame` before noise
    fn ankle_height(&self, frame: usize) -> f64 {
        if frame < self.standing_frames {
            return self.ground_y;
        }
        let airborne = frame - self.standing_frames;
        if airborne < self.air_frames {
            let flight_time = self.air_frames as f64 / self.fps;
            let apex_px = ballistic_height(flight_time, self.gravity) * self.pixels_per_meter;
            let s = (airborne as f64 + 0.5) / self.air_frames as f64;
            return self.ground_y - 4.0 * apex_px * s * (1.0 - s);
        }
        if airborne - self.air_frames < 2 {
            // Landing dip must clear the noisiest grounded sample
            return self.ground_y + 3.0 + 2.0 * self.jitter_px;
        }
        self.ground_y
    }

    fn noise(&self, rng: &mut StdRng) -> f64 {
        if self.jitter_px > 0.0 {
            rng.gen_range(-self.jitter_px..=self.jitter_px)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct JointTargets {
    hip_flexion: f64,
    knee_flexion: f64,
    shoulder_angle: f64,
}

/// Limb positions realizing a set of joint angles
struct Chain {
    shoulder: (f64, f64),
    elbow: (f64, f64),
    hip: (f64, f64),
    knee: (f64, f64),
    ankle: (f64, f64),
    foot: (f64, f64),
}

impl Chain {
    fn solve(hip_x: f64, hip_y: f64, pose: &JointTargets) -> Self {
        let hip = (hip_x, hip_y);
        // Thigh hangs straight down; the torso opens from it by hip flexion
        let thigh_dir = (0.0, 1.0);
        let knee = advance(hip, thigh_dir, SEGMENT_THIGH);
        let torso_dir = rotate(thigh_dir, pose.hip_flexion);
        let shoulder = advance(hip, torso_dir, SEGMENT_TORSO);

        let knee_to_hip = (-thigh_dir.0, -thigh_dir.1);
        let shin_dir = rotate(knee_to_hip, -pose.knee_flexion);
        let ankle = advance(knee, shin_dir, SEGMENT_SHIN);

        let ankle_to_knee = (-shin_dir.0, -shin_dir.1);
        let foot = advance(ankle, rotate(ankle_to_knee, 90.0), SEGMENT_FOOT);

        let shoulder_to_hip = (-torso_dir.0, -torso_dir.1);
        let elbow = advance(shoulder, rotate(shoulder_to_hip, pose.shoulder_angle), SEGMENT_ARM);

        Self {
            shoulder,
            elbow,
            hip,
            knee,
            ankle,
            foot,
        }
    }
}

fn rotate((x, y): (f64, f64), degrees: f64) -> (f64, f64) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

fn advance(from: (f64, f64), dir: (f64, f64), length: f64) -> (f64, f64) {
    (from.0 + dir.0 * length, from.1 + dir.1 * length)
}
