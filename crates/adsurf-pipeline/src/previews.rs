//! Instance previews and the review directory.
//!
//! One `<index>.png` per instance: the source frame at the instance's frame
//! index with the logo composited. The operator reviews by deleting the
//! previews of rejected surfaces; the remaining file names are the
//! confirmed subset.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use adsurf_media::vision::Compositor;
use adsurf_media::{save_png, VideoBackend, VideoInfo};
use adsurf_models::{ConfirmedSubset, Instance, StableContour};
use tracing::{debug, info};

use crate::context::PipelineContext;
use crate::error::{PipelineError, PipelineResult};

/// Empty the preview directory, creating it when missing.
pub async fn reset_previews(dir: &Path) -> PipelineResult<()> {
    if tokio::fs::try_exists(dir).await? {
        tokio::fs::remove_dir_all(dir).await?;
    }
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

/// Render every instance preview in a single pass over the video.
pub async fn render_previews(
    backend: &dyn VideoBackend,
    ctx: &PipelineContext,
    video: &Path,
    info: &VideoInfo,
    compositor: &Compositor,
    contours: &[StableContour],
    instances: &[Instance],
) -> PipelineResult<Vec<PathBuf>> {
    let mut pending: HashMap<u64, Vec<&Instance>> = HashMap::new();
    for instance in instances {
        pending
            .entry(instance.record.frame_index)
            .or_default()
            .push(instance);
    }
    let Some(&last_frame) = pending.keys().max() else {
        return Ok(Vec::new());
    };

    let mut reader = backend.open_reader(video, info).await?;
    let mut written = Vec::with_capacity(instances.len());
    let mut frame_index: u64 = 0;

    while frame_index <= last_frame {
        ctx.check_cancelled()?;
        let Some(frame) = reader.next_frame().await? else {
            break;
        };

        if let Some(due) = pending.remove(&frame_index) {
            for instance in due {
                let contour = contours.get(instance.index).ok_or_else(|| {
                    PipelineError::internal(format!("instance {} has no contour", instance.index))
                })?;
                let mut preview = frame.clone();
                compositor.composite(&mut preview, frame_index, contour)?;
                let path = ctx.layout().preview_path(instance.index);
                save_png(&preview, &path)?;
                debug!(instance = instance.index, frame = frame_index, "Preview written");
                written.push(path);
            }
        }
        frame_index += 1;
    }

    if let Some(&missing) = pending.keys().min() {
        return Err(PipelineError::input_unreadable(format!(
            "video ended at frame {} before preview frame {}",
            frame_index, missing
        )));
    }

    written.sort();
    info!(previews = written.len(), "Previews rendered");
    Ok(written)
}

/// Instance indices whose `<n>.png` preview is still present.
///
/// Files that do not follow the naming scheme are ignored.
pub async fn confirmed_from_previews(dir: &Path) -> PipelineResult<ConfirmedSubset> {
    if !tokio::fs::try_exists(dir).await? {
        return Ok(ConfirmedSubset::new());
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut indices = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if !is_png {
            continue;
        }
        if let Some(index) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<usize>().ok())
        {
            indices.push(index);
        }
    }
    Ok(indices.into_iter().collect())
}
