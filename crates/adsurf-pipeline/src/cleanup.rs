//! Best-effort removal of per-pass intermediates after insertion.

use std::path::PathBuf;

use adsurf_media::fs_utils::remove_best_effort;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::layout::WorkspaceLayout;

/// Drop the contours and previews of an earlier pass before a new scan, so
/// [`crate::PipelineContext::resume`] never lands on a stale review.
pub async fn discard_review(layout: &WorkspaceLayout) -> PipelineResult<()> {
    remove_best_effort(layout.instances_dir()).await;
    let smoothed = layout.smoothed_contours_path();
    if !remove_best_effort(&smoothed).await {
        return Err(PipelineError::internal(format!(
            "cannot remove stale {}",
            smoothed.display()
        )));
    }
    Ok(())
}

/// Delete both artifacts, the preview directory and any `extra` paths.
///
/// Failures are logged and counted but never escalated; the return value is
/// the number of paths that could not be removed.
pub async fn cleanup_after_insert(layout: &WorkspaceLayout, extra: &[PathBuf]) -> usize {
    let mut targets = vec![
        layout.detection_log_path(),
        layout.smoothed_contours_path(),
        layout.instances_dir(),
    ];
    targets.extend_from_slice(extra);

    let mut failures = 0;
    for path in &targets {
        if !remove_best_effort(path).await {
            failures += 1;
        }
    }
    info!(removed = targets.len() - failures, failures, "Workspace cleaned");
    failures
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_removes_intermediates_and_tolerates_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::new(tmp.path());
        layout.ensure().await.unwrap();
        std::fs::write(layout.smoothed_contours_path(), b"{}").unwrap();
        std::fs::write(layout.preview_path(0), b"").unwrap();
        let audio = layout.audio_path("clip", "abcd1234");
        std::fs::write(&audio, b"").unwrap();

        let failures = cleanup_after_insert(&layout, &[audio.clone()]).await;
        assert_eq!(failures, 0);
        assert!(!layout.smoothed_contours_path().exists());
        assert!(!layout.instances_dir().exists());
        assert!(!audio.exists());
        assert!(layout.output_dir().is_dir());
    }

    #[tokio::test]
    async fn test_unremovable_path_is_counted_not_raised() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::new(tmp.path());
        layout.ensure().await.unwrap();
        std::fs::write(layout.smoothed_contours_path(), b"{}").unwrap();
        // A path below a regular file can be neither stat'ed nor removed.
        let blocker = layout.files_dir().join("result.mp4");
        std::fs::write(&blocker, b"").unwrap();
        let stuck = blocker.join("audio.m4a");

        let failures = cleanup_after_insert(&layout, &[stuck]).await;
        assert_eq!(failures, 1);
        assert!(!layout.smoothed_contours_path().exists());
    }

    #[tokio::test]
    async fn test_discard_review_clears_previous_pass() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::new(tmp.path());
        layout.ensure().await.unwrap();
        std::fs::write(layout.smoothed_contours_path(), b"{}").unwrap();
        std::fs::write(layout.preview_path(3), b"").unwrap();

        discard_review(&layout).await.unwrap();
        assert!(!layout.smoothed_contours_path().exists());
        assert!(!layout.preview_path(3).exists());
        assert!(layout.files_dir().is_dir());
    }
}
