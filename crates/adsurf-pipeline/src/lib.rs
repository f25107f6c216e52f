//! Phase sequencing for the ad-surface pipeline.
//!
//! This crate provides:
//! - The scan → detect → review → insert orchestrator and its state machine
//! - Versioned artifact persistence between phases
//! - Instance previews, the field report and post-insert cleanup
//! - Tuning-file loading, structured phase logging and metrics

pub mod artifacts;
pub mod cleanup;
pub mod config;
pub mod context;
pub mod error;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod previews;
pub mod report;
pub mod tuning_store;

pub use artifacts::ArtifactStore;
pub use config::PipelineConfig;
pub use context::PipelineContext;
pub use error::{PipelineError, PipelineResult};
pub use layout::WorkspaceLayout;
pub use logging::{init_tracing, PhaseLogger};
pub use orchestrator::{messages, PipelineOrchestrator};
pub use previews::confirmed_from_previews;
pub use tuning_store::TuningStore;
