// Skeleton - the 17-point COCO schema consumed by the height pipeline
//
// The detector reports one (x, y) pixel pair per index. A point at the
// origin, or with any non-positive coordinate, means "not detected".

use serde::{Deserialize, Serialize};

use crate::pose::Side;

/// Number of keypoints in a COCO skeleton
pub const SKELETON_POINTS: usize = 17;

pub const NOSE: usize = 0;
pub const LEFT_SHOULDER: usize = 5;
pub const RIGHT_SHOULDER: usize = 6;
pub const LEFT_HIP: usize = 11;
pub const RIGHT_HIP: usize = 12;
pub const LEFT_KNEE: usize = 13;
pub const RIGHT_KNEE: usize = 14;
pub const LEFT_ANKLE: usize = 15;
pub const RIGHT_ANKLE: usize = 16;

/// One person's 17-point skeleton for a single frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Skeleton {
    points: [[f64; 2]; SKELETON_POINTS],
}

impl Skeleton {
    pub fn new(points: [[f64; 2]; SKELETON_POINTS]) -> Self {
        Self { points }
    }

    /// Skeleton with every point undetected
    pub fn empty() -> Self {
        Self::new([[0.0, 0.0]; SKELETON_POINTS])
    }

    pub fn with_point(mut self, index: usize, x: f64, y: f64) -> Self {
        if let Some(point) = self.points.get_mut(index) {
            *point = [x, y];
        }
        self
    }

    /// Detected point at `index`, or `None` when it is missing
    pub fn point(&self, index: usize) -> Option<(f64, f64)> {
        let [x, y] = *self.points.get(index)?;
        (x > 0.0 && y > 0.0).then_some((x, y))
    }

    /// Vertical pixel position of the ankle on `side`
    pub fn ankle_y(&self, side: Side) -> Option<f64> {
        let index = match side {
            Side::Left => LEFT_ANKLE,
            Side::Right => RIGHT_ANKLE,
        };
        self.point(index).map(|(_, y)| y)
    }

    /// Which side of the body faces the camera
    ///
    /// For the shoulder pair and the hip pair, the horizontal offset
    /// `right_x - left_x` is taken when both x values are positive. A
    /// positive mean offset votes for the left side. Returns `None` when no
    /// pair is usable.
    pub fn facing_side(&self) -> Option<Side> {
        let pairs = [(LEFT_SHOULDER, RIGHT_SHOULDER), (LEFT_HIP, RIGHT_HIP)];
        let offsets: Vec<f64> = pairs
            .iter()
            .filter_map(|&(l, r)| {
                let lx = self.points[l][0];
                let rx = self.points[r][0];
                (lx > 0.0 && rx > 0.0).then_some(rx - lx)
            })
            .collect();

        if offsets.is_empty() {
            return None;
        }
        let mean = offsets.iter().sum::<f64>() / offsets.len() as f64;
        Some(if mean > 0.0 { Side::Left } else { Side::Right })
    }
}
