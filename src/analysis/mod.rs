// Analysis module - phase segmentation pipeline
//
// Landmark frames flow through three stages:
// 1. angles:  frame -> joint angles per side
// 2. phase:   joint angles -> phase state, side selection, running extrema
// 3. scoring: finished extrema -> bounded 0-100 scores

pub mod angles;
pub mod phase;
pub mod scoring;

pub use angles::{AngleExtractor, JointAngleSet, SideAngles};
pub use phase::{JumpPhase, PhaseSession, PhaseSummary, PhaseUpdate};
pub use scoring::{JumpMetrics, ScoreMetrics, ScoreNormalizer};
