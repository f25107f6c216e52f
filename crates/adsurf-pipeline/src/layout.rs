//! On-disk workspace layout: `files/` for intermediates, `output/` for
//! previews, reports and deliverables.

use std::path::{Path, PathBuf};

use crate::error::PipelineResult;

pub const DETECTION_LOG_FILE: &str = "detection_log.json";
pub const SMOOTHED_CONTOURS_FILE: &str = "smoothed_contours.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files_dir(&self) -> PathBuf {
        self.root.join("files")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    pub fn instances_dir(&self) -> PathBuf {
        self.output_dir().join("instances")
    }

    pub fn detection_log_path(&self) -> PathBuf {
        self.files_dir().join(DETECTION_LOG_FILE)
    }

    pub fn smoothed_contours_path(&self) -> PathBuf {
        self.files_dir().join(SMOOTHED_CONTOURS_FILE)
    }

    pub fn preview_path(&self, index: usize) -> PathBuf {
        self.instances_dir().join(format!("{}.png", index))
    }

    pub fn report_path(&self, video_name: &str) -> PathBuf {
        self.output_dir().join(format!("report_{}.txt", video_name))
    }

    /// Video-only render written before the audio is muxed back.
    pub fn silent_render_path(&self, ext: &str) -> PathBuf {
        self.files_dir().join(format!("result.{}", ext))
    }

    pub fn audio_path(&self, video_name: &str, tag: &str) -> PathBuf {
        self.files_dir().join(format!("audio_{}_{}.m4a", video_name, tag))
    }

    pub fn deliverable_path(&self, video_name: &str, tag: &str, ext: &str) -> PathBuf {
        self.output_dir()
            .join(format!("output_{}_{}.{}", video_name, tag, ext))
    }

    /// Create `files/`, `output/` and `output/instances/`.
    pub async fn ensure(&self) -> PipelineResult<()> {
        tokio::fs::create_dir_all(self.files_dir()).await?;
        tokio::fs::create_dir_all(self.instances_dir()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = WorkspaceLayout::new("/w");
        assert_eq!(layout.detection_log_path(), PathBuf::from("/w/files/detection_log.json"));
        assert_eq!(layout.preview_path(3), PathBuf::from("/w/output/instances/3.png"));
        assert_eq!(layout.report_path("clip"), PathBuf::from("/w/output/report_clip.txt"));
        assert_eq!(
            layout.deliverable_path("clip", "1a2b3c4d", "mp4"),
            PathBuf::from("/w/output/output_clip_1a2b3c4d.mp4")
        );
        assert_eq!(
            layout.audio_path("clip", "1a2b3c4d"),
            PathBuf::from("/w/files/audio_clip_1a2b3c4d.m4a")
        );
    }

    #[tokio::test]
    async fn test_ensure_creates_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::new(tmp.path());
        layout.ensure().await.unwrap();
        assert!(layout.files_dir().is_dir());
        assert!(layout.instances_dir().is_dir());
    }
}
