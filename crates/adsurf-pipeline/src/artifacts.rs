//! Persistence of the two intermediate artifacts.
//!
//! The detection log lives from scan to detect, the smoothed contours from
//! detect to insert. Writes go to a temporary sibling first and are renamed
//! into place, so a reader never observes a partial document.

use std::path::Path;

use adsurf_models::{
    DetectionLog, DetectionLogArtifact, SmoothedContoursArtifact, StableContour, VideoMetadata,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::PipelineResult;
use crate::layout::WorkspaceLayout;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    layout: WorkspaceLayout,
}

impl ArtifactStore {
    pub fn new(layout: WorkspaceLayout) -> Self {
        Self { layout }
    }

    pub fn has_detection_log(&self) -> bool {
        self.layout.detection_log_path().is_file()
    }

    pub fn has_smoothed_contours(&self) -> bool {
        self.layout.smoothed_contours_path().is_file()
    }

    pub async fn save_detection_log(
        &self,
        log: &DetectionLog,
        metadata: &VideoMetadata,
    ) -> PipelineResult<()> {
        let artifact = DetectionLogArtifact::new(log, metadata.clone());
        write_json(&self.layout.detection_log_path(), &artifact).await
    }

    pub async fn load_detection_log(&self) -> PipelineResult<(DetectionLog, VideoMetadata)> {
        let artifact: DetectionLogArtifact = read_json(&self.layout.detection_log_path()).await?;
        Ok(artifact.into_log()?)
    }

    pub async fn save_smoothed_contours(
        &self,
        contours: &[StableContour],
        metadata: &VideoMetadata,
    ) -> PipelineResult<()> {
        let artifact = SmoothedContoursArtifact::new(contours, metadata.clone());
        write_json(&self.layout.smoothed_contours_path(), &artifact).await
    }

    pub async fn load_smoothed_contours(
        &self,
    ) -> PipelineResult<(Vec<StableContour>, VideoMetadata)> {
        let artifact: SmoothedContoursArtifact =
            read_json(&self.layout.smoothed_contours_path()).await?;
        Ok(artifact.into_contours()?)
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), bytes = bytes.len(), "Artifact written");
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> PipelineResult<T> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use adsurf_models::{ArtifactError, DetectionRecord, Field, Quad};

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            fps: 25.0,
            width: 320,
            height: 240,
            frames_count: 3,
            logo_aspect_ratio: 0.5,
            video_name: "clip".into(),
            has_audio: true,
        }
    }

    #[tokio::test]
    async fn test_detection_log_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(WorkspaceLayout::new(tmp.path()));
        assert!(!store.has_detection_log());

        let mut log = DetectionLog::new();
        log.push_frame(0, vec![]);
        log.push_frame(1, vec![Quad::rect(1.0, 2.0, 30.0, 40.0)]);
        log.push_frame(2, vec![]);
        store.save_detection_log(&log, &metadata()).await.unwrap();

        assert!(store.has_detection_log());
        let (loaded, meta) = store.load_detection_log().await.unwrap();
        assert_eq!(loaded, log);
        assert_eq!(meta.video_name, "clip");
    }

    #[tokio::test]
    async fn test_unknown_schema_version_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::new(tmp.path());
        let store = ArtifactStore::new(layout.clone());

        let contour = StableContour::new(
            Field::new(4, 4),
            vec![DetectionRecord::new(4, Quad::rect(0.0, 0.0, 5.0, 5.0))],
        );
        store.save_smoothed_contours(&[contour], &metadata()).await.unwrap();

        let path = layout.smoothed_contours_path();
        let mut doc: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        doc["schema_version"] = serde_json::json!(99);
        std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let err = store.load_smoothed_contours().await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Artifact(ArtifactError::UnsupportedVersion { found: 99, .. })
        ));
    }
}
