//! Shared data models for the adsurf pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Quadrilateral geometry and per-frame detection records
//! - Temporal fields, stable contours and reviewable instances
//! - Video metadata and tuning configuration
//! - Versioned intermediate artifacts persisted between phases
//! - Pipeline phase states and status reporting

pub mod artifact;
pub mod contour;
pub mod detection;
pub mod geometry;
pub mod phase;
pub mod timestamp;
pub mod tuning;
pub mod video;

// Re-export common types
pub use artifact::{
    ArtifactError, ContourTable, DetectionLogArtifact, SmoothedContoursArtifact,
    ARTIFACT_SCHEMA_VERSION,
};
pub use contour::{ConfirmedSubset, Field, Instance, StableContour};
pub use detection::{DetectionLog, DetectionRecord, DetectionRow};
pub use geometry::{Point, Quad};
pub use phase::{Outcome, PhaseState, PipelineStatus};
pub use timestamp::{format_mm_ss, frame_to_seconds};
pub use tuning::{TuningConfig, TuningError};
pub use video::VideoMetadata;
