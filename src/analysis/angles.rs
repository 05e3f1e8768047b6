// AngleExtractor - joint angle geometry for a single frame
//
// For three landmarks (A, B, C) forming a joint at B, the angle is the one
// between vectors BA and BC:
//
//   angle = degrees(acos((BA . BC) / (|BA| |BC|)))
//
// computed on the 2D pixel positions. An angle is undefined when a landmark
// is missing, when its visibility is below the configured minimum, or when
// either vector has zero length.

use serde::{Deserialize, Serialize};

use crate::config::PhaseConfig;
use crate::pose::{FrameSample, Keypoint, Landmark, Side};

/// Four joint angles (degrees) for one side of the body
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SideAngles {
    pub knee_flexion: Option<f64>,
    pub hip_flexion: Option<f64>,
    pub ankle_angle: Option<f64>,
    pub shoulder_angle: Option<f64>,
}

/// Joint angles for both sides of one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointAngleSet {
    pub left: SideAngles,
    pub right: SideAngles,
}

impl JointAngleSet {
    pub fn side(&self, side: Side) -> &SideAngles {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Mean of the available hip flexion values
    pub fn average_hip_flexion(&self) -> Option<f64> {
        match (self.left.hip_flexion, self.right.hip_flexion) {
            (Some(l), Some(r)) => Some((l + r) / 2.0),
            (Some(v), None) | (None, Some(v)) => Some(v),
            (None, None) => None,
        }
    }

    /// Smaller of the available knee flexion values
    pub fn min_knee_flexion(&self) -> Option<f64> {
        match (self.left.knee_flexion, self.right.knee_flexion) {
            (Some(l), Some(r)) => Some(l.min(r)),
            (Some(v), None) | (None, Some(v)) => Some(v),
            (None, None) => None,
        }
    }
}

/// Angle at `b` between `ba` and `bc`, in degrees
///
/// Returns `None` for zero-length vectors or a non-finite result. The cosine
/// is clamped to [-1, 1] so rounding on nearly collinear points cannot push
/// `acos` out of its domain.
pub fn angle_at(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Option<f64> {
    let ba = (a.0 - b.0, a.1 - b.1);
    let bc = (c.0 - b.0, c.1 - b.1);

    let magnitude = ba.0.hypot(ba.1) * bc.0.hypot(bc.1);
    if magnitude == 0.0 || !magnitude.is_finite() {
        return None;
    }

    let cosine = (ba.0 * bc.0 + ba.1 * bc.1) / magnitude;
    let degrees = cosine.clamp(-1.0, 1.0).acos().to_degrees();
    degrees.is_finite().then_some(degrees)
}

/// Extracts joint angles from landmark frames
#[derive(Debug, Clone)]
pub struct AngleExtractor {
    min_visibility: f64,
}

impl AngleExtractor {
    pub fn new(min_visibility: f64) -> Self {
        Self { min_visibility }
    }

    pub fn from_config(config: &PhaseConfig) -> Self {
        Self::new(config.min_visibility)
    }

    /// Angle at landmark `b`, or `None` if any landmark is unusable
    pub fn joint_angle(
        &self,
        frame: &FrameSample,
        a: Landmark,
        b: Landmark,
        c: Landmark,
    ) -> Option<f64> {
        let a = self.usable(frame.get(a))?;
        let b = self.usable(frame.get(b))?;
        let c = self.usable(frame.get(c))?;
        angle_at(a, b, c)
    }

    /// All four joint angles for both sides
    pub fn extract(&self, frame: &FrameSample) -> JointAngleSet {
        JointAngleSet {
            left: self.side_angles(frame, Side::Left),
            right: self.side_angles(frame, Side::Right),
        }
    }

    fn side_angles(&self, frame: &FrameSample, side: Side) -> SideAngles {
        let shoulder = Landmark::shoulder(side);
        let elbow = Landmark::elbow(side);
        let hip = Landmark::hip(side);
        let knee = Landmark::knee(side);
        let ankle = Landmark::ankle(side);
        let foot = Landmark::foot_index(side);

        SideAngles {
            knee_flexion: self.joint_angle(frame, hip, knee, ankle),
            hip_flexion: self.joint_angle(frame, shoulder, hip, knee),
            ankle_angle: self.joint_angle(frame, knee, ankle, foot),
            shoulder_angle: self.joint_angle(frame, hip, shoulder, elbow),
        }
    }

    fn usable(&self, keypoint: Option<&Keypoint>) -> Option<(f64, f64)> {
        keypoint
            .filter(|kp| kp.is_visible(self.min_visibility))
            .map(|kp| (kp.x, kp.y))
    }
}

impl Default for AngleExtractor {
    fn default() -> Self {
        Self::from_config(&PhaseConfig::default())
    }
}
