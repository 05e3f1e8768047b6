// Landmark - the 33-point named body schema consumed by the phase pipeline
//
// Landmarks arrive from the external pose model in a fixed index order with
// pixel coordinates, a depth value and a visibility confidence. A frame is
// converted once into a `FrameSample` keyed by `Landmark` and is read-only
// afterwards.

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::RecordingError;
use crate::pose::Side;

/// Named body landmark, in the pose model's index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

/// Number of landmarks produced per detected person
pub const LANDMARK_COUNT: usize = 33;

impl Landmark {
    /// All landmarks in model index order
    pub const ALL: [Landmark; LANDMARK_COUNT] = [
        Landmark::Nose,
        Landmark::LeftEyeInner,
        Landmark::LeftEye,
        Landmark::LeftEyeOuter,
        Landmark::RightEyeInner,
        Landmark::RightEye,
        Landmark::RightEyeOuter,
        Landmark::LeftEar,
        Landmark::RightEar,
        Landmark::MouthLeft,
        Landmark::MouthRight,
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        Landmark::LeftElbow,
        Landmark::RightElbow,
        Landmark::LeftWrist,
        Landmark::RightWrist,
        Landmark::LeftPinky,
        Landmark::RightPinky,
        Landmark::LeftIndex,
        Landmark::RightIndex,
        Landmark::LeftThumb,
        Landmark::RightThumb,
        Landmark::LeftHip,
        Landmark::RightHip,
        Landmark::LeftKnee,
        Landmark::RightKnee,
        Landmark::LeftAnkle,
        Landmark::RightAnkle,
        Landmark::LeftHeel,
        Landmark::RightHeel,
        Landmark::LeftFootIndex,
        Landmark::RightFootIndex,
    ];

    /// Landmark at a model index
    pub fn from_index(index: usize) -> Option<Landmark> {
        Self::ALL.get(index).copied()
    }

    /// snake_case name used in recordings
    pub fn name(&self) -> &'static str {
        match self {
            Landmark::Nose => "nose",
            Landmark::LeftEyeInner => "left_eye_inner",
            Landmark::LeftEye => "left_eye",
            Landmark::LeftEyeOuter => "left_eye_outer",
            Landmark::RightEyeInner => "right_eye_inner",
            Landmark::RightEye => "right_eye",
            Landmark::RightEyeOuter => "right_eye_outer",
            Landmark::LeftEar => "left_ear",
            Landmark::RightEar => "right_ear",
            Landmark::MouthLeft => "mouth_left",
            Landmark::MouthRight => "mouth_right",
            Landmark::LeftShoulder => "left_shoulder",
            Landmark::RightShoulder => "right_shoulder",
            Landmark::LeftElbow => "left_elbow",
            Landmark::RightElbow => "right_elbow",
            Landmark::LeftWrist => "left_wrist",
            Landmark::RightWrist => "right_wrist",
            Landmark::LeftPinky => "left_pinky",
            Landmark::RightPinky => "right_pinky",
            Landmark::LeftIndex => "left_index",
            Landmark::RightIndex => "right_index",
            Landmark::LeftThumb => "left_thumb",
            Landmark::RightThumb => "right_thumb",
            Landmark::LeftHip => "left_hip",
            Landmark::RightHip => "right_hip",
            Landmark::LeftKnee => "left_knee",
            Landmark::RightKnee => "right_knee",
            Landmark::LeftAnkle => "left_ankle",
            Landmark::RightAnkle => "right_ankle",
            Landmark::LeftHeel => "left_heel",
            Landmark::RightHeel => "right_heel",
            Landmark::LeftFootIndex => "left_foot_index",
            Landmark::RightFootIndex => "right_foot_index",
        }
    }

    pub fn shoulder(side: Side) -> Landmark {
        match side {
            Side::Left => Landmark::LeftShoulder,
            Side::Right => Landmark::RightShoulder,
        }
    }

    pub fn elbow(side: Side) -> Landmark {
        match side {
            Side::Left => Landmark::LeftElbow,
            Side::Right => Landmark::RightElbow,
        }
    }

    pub fn hip(side: Side) -> Landmark {
        match side {
            Side::Left => Landmark::LeftHip,
            Side::Right => Landmark::RightHip,
        }
    }

    pub fn knee(side: Side) -> Landmark {
        match side {
            Side::Left => Landmark::LeftKnee,
            Side::Right => Landmark::RightKnee,
        }
    }

    pub fn ankle(side: Side) -> Landmark {
        match side {
            Side::Left => Landmark::LeftAnkle,
            Side::Right => Landmark::RightAnkle,
        }
    }

    pub fn foot_index(side: Side) -> Landmark {
        match side {
            Side::Left => Landmark::LeftFootIndex,
            Side::Right => Landmark::RightFootIndex,
        }
    }
}

static BY_NAME: Lazy<HashMap<&'static str, Landmark>> =
    Lazy::new(|| Landmark::ALL.iter().map(|lm| (lm.name(), *lm)).collect());

impl FromStr for Landmark {
    type Err = RecordingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BY_NAME
            .get(s)
            .copied()
            .ok_or_else(|| RecordingError::Malformed {
                reason: format!("unknown landmark '{}'", s),
            })
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single landmark measurement in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    /// Depth relative to the hips; unused by the 2D angle geometry
    #[serde(default)]
    pub z: f64,
    /// Model confidence that the landmark is visible, in [0, 1]
    #[serde(default = "default_visibility")]
    pub visibility: f64,
}

fn default_visibility() -> f64 {
    1.0
}

impl Keypoint {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility,
        }
    }

    /// Whether the landmark is confident enough to use
    pub fn is_visible(&self, min_visibility: f64) -> bool {
        self.visibility >= min_visibility
    }
}

/// Named landmarks of one person in one frame
///
/// Unknown landmark names in a recording are skipped rather than rejected,
/// so recordings from richer models still load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkMap(HashMap<Landmark, Keypoint>);

impl LandmarkMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, landmark: Landmark, keypoint: Keypoint) {
        self.0.insert(landmark, keypoint);
    }

    pub fn get(&self, landmark: Landmark) -> Option<&Keypoint> {
        self.0.get(&landmark)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build from keypoints in model index order
    pub fn from_indexed(keypoints: &[Keypoint]) -> Result<Self, RecordingError> {
        if keypoints.len() > LANDMARK_COUNT {
            return Err(RecordingError::Malformed {
                reason: format!(
                    "expected at most {} landmarks, got {}",
                    LANDMARK_COUNT,
                    keypoints.len()
                ),
            });
        }
        Ok(Self(
            keypoints
                .iter()
                .enumerate()
                .filter_map(|(idx, kp)| Landmark::from_index(idx).map(|lm| (lm, *kp)))
                .collect(),
        ))
    }
}

impl FromIterator<(Landmark, Keypoint)> for LandmarkMap {
    fn from_iter<I: IntoIterator<Item = (Landmark, Keypoint)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for LandmarkMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ordered: std::collections::BTreeMap<&'static str, &Keypoint> = self
            .0
            .iter()
            .map(|(lm, kp)| (lm.name(), kp))
            .collect();
        ordered.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LandmarkMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, Keypoint>::deserialize(deserializer)?;
        let mut map = HashMap::with_capacity(raw.len());
        for (name, keypoint) in raw {
            match name.parse::<Landmark>() {
                Ok(landmark) => {
                    map.insert(landmark, keypoint);
                }
                Err(_) => log::debug!("[Recording] Skipping unknown landmark '{}'", name),
            }
        }
        Ok(Self(map))
    }
}

/// One frame of named landmarks with its position in time
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSample {
    pub frame_index: u64,
    /// Seconds since the start of the video (`frame_index / fps`)
    pub timestamp: f64,
    pub landmarks: LandmarkMap,
}

impl FrameSample {
    pub fn new(frame_index: u64, fps: f64, landmarks: LandmarkMap) -> Self {
        Self {
            frame_index,
            timestamp: frame_index as f64 / fps,
            landmarks,
        }
    }

    pub fn get(&self, landmark: Landmark) -> Option<&Keypoint> {
        self.landmarks.get(landmark)
    }
}
