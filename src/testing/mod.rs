//! Testability harness utilities.
//!
//! Synthetic recordings let the pipelines, the CLI and the integration
//! tests run end to end without a pose model or video decoder.

pub mod synthetic;

pub use synthetic::SyntheticJump;
