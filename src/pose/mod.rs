// Pose module - keypoint schemas produced by the external pose models
//
// Two schemas are consumed:
// 1. landmark: 33 named landmarks with visibility, feeding the phase pipeline
// 2. skeleton: 17 indexed COCO points, feeding the height pipeline

pub mod landmark;
pub mod skeleton;

pub use landmark::{FrameSample, Keypoint, Landmark, LandmarkMap, LANDMARK_COUNT};
pub use skeleton::{Skeleton, SKELETON_POINTS};

use serde::{Deserialize, Serialize};

/// Body side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn display_name(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}
