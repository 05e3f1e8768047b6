//! Pose recording utilities for the deterministic CLI harness.
//!
//! A recording is the pre-extracted output of both pose models for one
//! video: named landmark frames for the phase pipeline and COCO skeleton
//! frames for the height pipeline. This module discovers recordings on
//! disk, loads and validates them, and writes new ones.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::RecordingError;
use crate::pose::{FrameSample, LandmarkMap, Skeleton};

/// Default location for recording JSON assets.
pub const DEFAULT_RECORDING_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const RECORDING_EXTENSION: &str = "json";

/// Landmarks of one frame; `None` when the model found no person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub frame_index: u64,
    #[serde(default)]
    pub landmarks: Option<LandmarkMap>,
}

/// Skeleton of one frame; `None` when the detector found no person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonFrame {
    pub frame_index: u64,
    #[serde(default)]
    pub keypoints: Option<Skeleton>,
}

/// Both keypoint tracks of one video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseRecording {
    #[serde(default)]
    pub name: String,
    /// Frame rate reported by the video decoder, if any
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub landmark_frames: Vec<LandmarkFrame>,
    #[serde(default)]
    pub skeleton_frames: Vec<SkeletonFrame>,
}

impl PoseRecording {
    pub fn from_json(json: &str) -> std::result::Result<Self, RecordingError> {
        let recording: PoseRecording = serde_json::from_str(json)?;
        recording.validate()?;
        Ok(recording)
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, RecordingError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of frames in the longer of the two tracks.
    pub fn frame_count(&self) -> usize {
        self.landmark_frames.len().max(self.skeleton_frames.len())
    }

    /// Landmark frames as timestamped samples, `None` for empty frames.
    pub fn landmark_samples(
        &self,
        fps: f64,
    ) -> impl Iterator<Item = (u64, f64, Option<FrameSample>)> + '_ {
        self.landmark_frames.iter().map(move |frame| {
            let timestamp = frame.frame_index as f64 / fps;
            let sample = frame
                .landmarks
                .clone()
                .map(|landmarks| FrameSample::new(frame.frame_index, fps, landmarks));
            (frame.frame_index, timestamp, sample)
        })
    }

    /// Frame indices must strictly increase within each track.
    fn validate(&self) -> std::result::Result<(), RecordingError> {
        check_ordered("landmark_frames", self.landmark_frames.iter().map(|f| f.frame_index))?;
        check_ordered("skeleton_frames", self.skeleton_frames.iter().map(|f| f.frame_index))
    }

    /// Write the recording as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> std::result::Result<(), RecordingError> {
        let write_failed = |reason: String| RecordingError::WriteFailed {
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| write_failed(err.to_string()))?;
        }
        let json = self.to_json_pretty()?;
        fs::write(path, json).map_err(|err| write_failed(err.to_string()))
    }
}

fn check_ordered(
    track: &str,
    indices: impl Iterator<Item = u64>,
) -> std::result::Result<(), RecordingError> {
    let mut previous: Option<u64> = None;
    for index in indices {
        if let Some(prev) = previous {
            if index <= prev {
                return Err(RecordingError::Malformed {
                    reason: format!(
                        "{} out of order: frame {} follows frame {}",
                        track, index, prev
                    ),
                });
            }
        }
        previous = Some(index);
    }
    Ok(())
}

/// Metadata describing an available recording.
#[derive(Clone, Debug)]
pub struct RecordingMetadata {
    pub name: String,
    pub path: PathBuf,
}

/// Catalog responsible for discovering recordings on disk.
pub struct RecordingCatalog {
    root: PathBuf,
}

impl RecordingCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all recordings by their metadata.
    pub fn discover(&self) -> Result<Vec<RecordingMetadata>> {
        let mut recordings = Vec::new();
        if !self.root.exists() {
            return Ok(recordings);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORDING_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                recordings.push(RecordingMetadata {
                    name: name.to_string(),
                    path: path.clone(),
                });
            }
        }

        recordings.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(recordings)
    }

    /// Load a recording by catalog name or by path.
    ///
    /// A recording without a `name` takes its file stem.
    pub fn load(&self, recording: &str) -> std::result::Result<PoseRecording, RecordingError> {
        let path = self.resolve_path(recording)?;
        let json = fs::read_to_string(&path).map_err(|err| RecordingError::Unreadable {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;

        let mut loaded = PoseRecording::from_json(&json)?;
        if loaded.name.is_empty() {
            loaded.name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(recording)
                .to_string();
        }

        log::info!(
            "[RecordingCatalog] Loaded '{}' from {} ({} landmark / {} skeleton frames)",
            loaded.name,
            path.display(),
            loaded.landmark_frames.len(),
            loaded.skeleton_frames.len()
        );
        Ok(loaded)
    }

    fn resolve_path(&self, recording: &str) -> std::result::Result<PathBuf, RecordingError> {
        let as_path = Path::new(recording);
        if as_path.exists() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self
            .root
            .join(format!("{}.{}", recording, RECORDING_EXTENSION));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(RecordingError::NotFound {
                name: recording.to_string(),
                root: self.root.display().to_string(),
            })
        }
    }
}

impl Default for RecordingCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_RECORDING_ROOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::pose::{Keypoint, Landmark};

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "jump_trainer_fixtures_{}_{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_recording_json() {
        let json = r#"{
            "name": "clip",
            "fps": 25.0,
            "landmark_frames": [
                { "frame_index": 0, "landmarks": { "left_hip": { "x": 1.0, "y": 2.0, "visibility": 0.9 } } },
                { "frame_index": 1, "landmarks": null }
            ],
            "skeleton_frames": [
                { "frame_index": 0, "keypoints": null }
            ]
        }"#;
        let recording = PoseRecording::from_json(json).unwrap();
        assert_eq!(recording.name, "clip");
        assert_eq!(recording.fps, Some(25.0));
        assert_eq!(recording.frame_count(), 2);

        let first = recording.landmark_frames[0].landmarks.as_ref().unwrap();
        assert_eq!(first.get(Landmark::LeftHip).unwrap().z, 0.0);
        assert!(recording.landmark_frames[1].landmarks.is_none());
        assert!(recording.skeleton_frames[0].keypoints.is_none());
    }

    #[test]
    fn test_missing_sections_default_empty() {
        let recording = PoseRecording::from_json("{}").unwrap();
        assert!(recording.name.is_empty());
        assert_eq!(recording.fps, None);
        assert_eq!(recording.frame_count(), 0);
    }

    #[test]
    fn test_out_of_order_frames_are_malformed() {
        let json = r#"{ "skeleton_frames": [
            { "frame_index": 3, "keypoints": null },
            { "frame_index": 3, "keypoints": null }
        ] }"#;
        let err = PoseRecording::from_json(json).unwrap_err();
        assert_eq!(err.code(), 3002);
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = PoseRecording::from_json("{ not json").unwrap_err();
        assert!(matches!(err, RecordingError::Malformed { .. }));
    }

    #[test]
    fn test_landmark_samples_use_fps() {
        let mut landmarks = LandmarkMap::new();
        landmarks.insert(Landmark::Nose, Keypoint::new(1.0, 1.0, 1.0));
        let recording = PoseRecording {
            landmark_frames: vec![
                LandmarkFrame {
                    frame_index: 0,
                    landmarks: None,
                },
                LandmarkFrame {
                    frame_index: 15,
                    landmarks: Some(landmarks),
                },
            ],
            ..PoseRecording::default()
        };

        let samples: Vec<_> = recording.landmark_samples(30.0).collect();
        assert!(samples[0].2.is_none());
        assert_eq!(samples[1].1, 0.5);
        assert_eq!(samples[1].2.as_ref().unwrap().timestamp, 0.5);
    }

    #[test]
    fn test_catalog_discover_and_load() {
        let root = scratch_dir("catalog");
        let recording = PoseRecording {
            fps: Some(30.0),
            skeleton_frames: vec![SkeletonFrame {
                frame_index: 0,
                keypoints: Some(Skeleton::empty()),
            }],
            ..PoseRecording::default()
        };
        recording.save(&root.join("b_jump.json")).unwrap();
        recording.save(&root.join("a_jump.json")).unwrap();
        fs::write(root.join("notes.txt"), "ignored").unwrap();

        let catalog = RecordingCatalog::new(&root);
        let names: Vec<String> = catalog
            .discover()
            .unwrap()
            .into_iter()
            .map(|meta| meta.name)
            .collect();
        assert_eq!(names, vec!["a_jump", "b_jump"]);

        let loaded = catalog.load("a_jump").unwrap();
        assert_eq!(loaded.name, "a_jump");
        assert_eq!(loaded.skeleton_frames.len(), 1);

        let by_path = catalog
            .load(root.join("b_jump.json").to_str().unwrap())
            .unwrap();
        assert_eq!(by_path.name, "b_jump");

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_catalog_missing_recording() {
        let catalog = RecordingCatalog::new("/nonexistent/recordings");
        assert!(catalog.discover().unwrap().is_empty());
        let err = catalog.load("nope").unwrap_err();
        assert_eq!(err.code(), 3003);
    }
}
