// Height module - jump height from ankle flight time
//
// Skeleton frames are reduced to one ankle's vertical position, calibrated
// against the standing ground level, and segmented into flights. Each
// flight's duration converts to height through ballistic motion.

pub mod estimator;
pub mod window;

pub use estimator::{ballistic_height, HeightEstimator, HeightPhase, HeightSummary, JumpEvent};
pub use window::{AnkleSample, AnkleWindow};
