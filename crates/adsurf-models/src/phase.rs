//! Pipeline phase states and the status returned to callers.

use std::fmt;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::contour::Instance;

/// Position of the pipeline in the scan → review → insert sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    /// Nothing in progress and no pending artifacts
    #[default]
    Idle,
    /// Reading frames and detecting candidates
    Scanning,
    /// Detection log persisted
    Scanned,
    /// Previews rendered, waiting for the operator
    WaitingForReview,
    /// Operator selection received
    Confirmed,
    /// Re-rendering the video
    Inserting,
    /// Deliverable written
    Done,
    /// Last phase aborted on a fatal error or cancellation
    Failed,
}

impl PhaseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseState::Idle => "idle",
            PhaseState::Scanning => "scanning",
            PhaseState::Scanned => "scanned",
            PhaseState::WaitingForReview => "waiting_for_review",
            PhaseState::Confirmed => "confirmed",
            PhaseState::Inserting => "inserting",
            PhaseState::Done => "done",
            PhaseState::Failed => "failed",
        }
    }

    /// A phase is running and owns the artifacts.
    pub fn is_active(&self) -> bool {
        matches!(self, PhaseState::Scanning | PhaseState::Inserting)
    }

    /// Whether moving to `next` is a legal transition.
    pub fn can_transition_to(&self, next: PhaseState) -> bool {
        use PhaseState::*;
        match (self, next) {
            (_, Failed) => self.is_active() || *self == Scanned,
            (Idle | Scanned | WaitingForReview | Done | Failed, Scanning) => true,
            (Scanning, Scanned) => true,
            (Scanned, WaitingForReview | Idle) => true,
            (WaitingForReview, Confirmed) => true,
            (Confirmed, Inserting) => true,
            (Inserting, Done) => true,
            (Done, Idle) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result kind of a successful scan or insert call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Previews are ready for review
    Ready,
    /// No surface was found, or every instance was rejected
    NothingToInsert,
    /// The output video has been written
    Completed,
}

/// What a scan or insert call reports back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineStatus {
    pub state: PhaseState,
    pub outcome: Outcome,
    /// Human-readable summary
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<Instance>,
    /// Per-field timing report text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    /// Path of the final deliverable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl PipelineStatus {
    pub fn new(state: PhaseState, outcome: Outcome, message: impl Into<String>) -> Self {
        Self {
            state,
            outcome,
            message: message.into(),
            instances: Vec::new(),
            report: None,
            output: None,
        }
    }

    pub fn with_instances(mut self, instances: Vec<Instance>) -> Self {
        self.instances = instances;
        self
    }

    pub fn with_report(mut self, report: impl Into<String>) -> Self {
        self.report = Some(report.into());
        self
    }

    pub fn with_output(mut self, output: PathBuf) -> Self {
        self.output = Some(output);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        use PhaseState::*;
        let path = [Idle, Scanning, Scanned, WaitingForReview, Confirmed, Inserting, Done, Idle];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_illegal_transitions() {
        use PhaseState::*;
        assert!(!Idle.can_transition_to(Inserting));
        assert!(!Scanning.can_transition_to(Scanning));
        assert!(!WaitingForReview.can_transition_to(Failed));
        assert!(Inserting.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Scanning));
    }

    #[test]
    fn test_status_serialization_omits_empty() {
        let status = PipelineStatus::new(PhaseState::Idle, Outcome::NothingToInsert, "none");
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "idle");
        assert_eq!(json["outcome"], "nothing_to_insert");
        assert!(json.get("instances").is_none());
        assert!(json.get("output").is_none());
    }
}
