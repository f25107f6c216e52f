//! Cross-phase pipeline state.

use adsurf_models::{PhaseState, VideoMetadata};
use tokio::sync::watch;
use tracing::debug;

use crate::artifacts::ArtifactStore;
use crate::error::{PipelineError, PipelineResult};
use crate::layout::WorkspaceLayout;

/// Everything the phases share: the state machine position, the metadata of
/// the current pass, where artifacts live and the cancellation signal.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    state: PhaseState,
    metadata: Option<VideoMetadata>,
    layout: WorkspaceLayout,
    cancel: watch::Receiver<bool>,
}

impl PipelineContext {
    pub fn new(layout: WorkspaceLayout) -> Self {
        // The sender is dropped immediately, so the flag stays false.
        let (_tx, cancel) = watch::channel(false);
        Self {
            state: PhaseState::Idle,
            metadata: None,
            layout,
            cancel,
        }
    }

    /// Context for a workspace that may hold artifacts from an earlier
    /// process: persisted smoothed contours mean a review is pending, a
    /// lone detection log means detect has yet to run.
    pub fn resume(layout: WorkspaceLayout) -> Self {
        let store = ArtifactStore::new(layout.clone());
        let mut ctx = Self::new(layout);
        if store.has_smoothed_contours() {
            ctx.state = PhaseState::WaitingForReview;
        } else if store.has_detection_log() {
            ctx.state = PhaseState::Scanned;
        }
        debug!(state = %ctx.state, "Pipeline context resumed");
        ctx
    }

    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn set_cancel(&mut self, cancel: watch::Receiver<bool>) {
        self.cancel = cancel;
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    pub fn set_metadata(&mut self, metadata: VideoMetadata) {
        self.metadata = Some(metadata);
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    pub fn artifacts(&self) -> ArtifactStore {
        ArtifactStore::new(self.layout.clone())
    }

    /// Move to `next`, rejecting transitions the state machine forbids.
    pub fn transition(&mut self, next: PhaseState) -> PipelineResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(from = %self.state, to = %next, "Phase transition");
        self.state = next;
        Ok(())
    }

    /// Mark the running phase as failed. No-op outside a phase.
    pub fn fail(&mut self) {
        if self.state.can_transition_to(PhaseState::Failed) {
            self.state = PhaseState::Failed;
        }
    }

    /// Receiver handed to long-running child processes.
    pub fn cancel_signal(&self) -> &watch::Receiver<bool> {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Error out at a frame boundary when cancellation was requested.
    pub fn check_cancelled(&self) -> PipelineResult<()> {
        if self.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_follow_state_machine() {
        let mut ctx = PipelineContext::new(WorkspaceLayout::new("/tmp/none"));
        assert!(ctx.transition(PhaseState::Inserting).is_err());
        assert_eq!(ctx.state(), PhaseState::Idle);

        ctx.transition(PhaseState::Scanning).unwrap();
        ctx.transition(PhaseState::Scanned).unwrap();
        ctx.transition(PhaseState::WaitingForReview).unwrap();
        ctx.transition(PhaseState::Confirmed).unwrap();
        ctx.transition(PhaseState::Inserting).unwrap();
        ctx.fail();
        assert_eq!(ctx.state(), PhaseState::Failed);
    }

    #[test]
    fn test_fail_is_noop_when_idle() {
        let mut ctx = PipelineContext::new(WorkspaceLayout::new("/tmp/none"));
        ctx.fail();
        assert_eq!(ctx.state(), PhaseState::Idle);
    }

    #[test]
    fn test_cancel_flag() {
        let (tx, rx) = watch::channel(false);
        let ctx = PipelineContext::new(WorkspaceLayout::new("/tmp/none")).with_cancel(rx);
        assert!(ctx.check_cancelled().is_ok());
        tx.send(true).unwrap();
        assert!(matches!(ctx.check_cancelled(), Err(PipelineError::Cancelled)));
    }

    #[test]
    fn test_resume_detects_pending_review() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::new(tmp.path());
        assert_eq!(PipelineContext::resume(layout.clone()).state(), PhaseState::Idle);

        std::fs::create_dir_all(layout.files_dir()).unwrap();
        std::fs::write(layout.detection_log_path(), b"{}").unwrap();
        assert_eq!(PipelineContext::resume(layout.clone()).state(), PhaseState::Scanned);

        std::fs::write(layout.smoothed_contours_path(), b"{}").unwrap();
        assert_eq!(
            PipelineContext::resume(layout).state(),
            PhaseState::WaitingForReview
        );
    }
}
