//! In-memory [`VideoBackend`] for driving the pipeline without FFmpeg.
//!
//! Videos are registered under a path together with their frames. Writers
//! keep the encoded frames in memory and drop an empty placeholder file at
//! the target path so filesystem steps (moves, cleanup) behave as usual.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use image::RgbImage;
use tokio::sync::watch;

use crate::error::{MediaError, MediaResult};
use crate::probe::VideoInfo;
use crate::video::{FrameSink, FrameSource, VideoBackend};

#[derive(Debug, Clone)]
struct MemoryVideo {
    fps: f64,
    frames: Arc<Vec<RgbImage>>,
    has_audio: bool,
}

#[derive(Debug, Default)]
struct Inner {
    videos: HashMap<PathBuf, MemoryVideo>,
    written: HashMap<PathBuf, Vec<RgbImage>>,
}

/// Shared, cloneable in-memory video store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves plain data behind.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a video. All frames must share one size.
    pub fn insert_video(&self, path: impl Into<PathBuf>, fps: f64, frames: Vec<RgbImage>, has_audio: bool) {
        self.lock().videos.insert(
            path.into(),
            MemoryVideo {
                fps,
                frames: Arc::new(frames),
                has_audio,
            },
        );
    }

    /// Frames written to `path`, if any writer finished there.
    pub fn written(&self, path: &Path) -> Option<Vec<RgbImage>> {
        self.lock().written.get(path).cloned()
    }

    fn video(&self, path: &Path) -> MediaResult<MemoryVideo> {
        self.lock()
            .videos
            .get(path)
            .cloned()
            .ok_or_else(|| MediaError::FileNotFound(path.to_path_buf()))
    }

    fn record_output(&self, path: &Path, frames: Vec<RgbImage>) {
        self.lock().written.insert(path.to_path_buf(), frames);
    }
}

struct MemorySource {
    frames: Arc<Vec<RgbImage>>,
    next: usize,
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn next_frame(&mut self) -> MediaResult<Option<RgbImage>> {
        let frame = self.frames.get(self.next).cloned();
        if frame.is_some() {
            self.next += 1;
        }
        Ok(frame)
    }
}

struct MemorySink {
    backend: MemoryBackend,
    path: PathBuf,
    frames: Vec<RgbImage>,
    size: (u32, u32),
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn write_frame(&mut self, frame: &RgbImage) -> MediaResult<()> {
        if frame.dimensions() != self.size {
            return Err(MediaError::degenerate("frame size differs from the stream size"));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    async fn finish(&mut self) -> MediaResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, b"").await?;
        let frames = std::mem::take(&mut self.frames);
        self.backend.record_output(&self.path, frames);
        Ok(())
    }
}

#[async_trait]
impl VideoBackend for MemoryBackend {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        let video = self.video(path)?;
        let (width, height) = video
            .frames
            .first()
            .map(|f| f.dimensions())
            .unwrap_or((0, 0));
        let frames_count = video.frames.len() as u64;
        Ok(VideoInfo {
            duration: if video.fps > 0.0 { frames_count as f64 / video.fps } else { 0.0 },
            width,
            height,
            fps: video.fps,
            frames_count,
            codec: "rawvideo".to_string(),
            has_audio: video.has_audio,
        })
    }

    async fn open_reader(&self, path: &Path, _info: &VideoInfo) -> MediaResult<Box<dyn FrameSource>> {
        let video = self.video(path)?;
        Ok(Box::new(MemorySource {
            frames: video.frames,
            next: 0,
        }))
    }

    async fn open_writer(&self, path: &Path, info: &VideoInfo) -> MediaResult<Box<dyn FrameSink>> {
        Ok(Box::new(MemorySink {
            backend: self.clone(),
            path: path.to_path_buf(),
            frames: Vec::new(),
            size: (info.width, info.height),
        }))
    }

    async fn extract_audio(
        &self,
        video: &Path,
        audio_out: &Path,
        cancel: &watch::Receiver<bool>,
    ) -> MediaResult<()> {
        if *cancel.borrow() {
            return Err(MediaError::Cancelled);
        }
        if !self.video(video)?.has_audio {
            return Err(MediaError::ffmpeg_failed(
                "Output file does not contain any stream",
                None,
                Some(1),
            ));
        }
        tokio::fs::write(audio_out, b"").await?;
        Ok(())
    }

    async fn mux_audio(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        cancel: &watch::Receiver<bool>,
    ) -> MediaResult<()> {
        if *cancel.borrow() {
            return Err(MediaError::Cancelled);
        }
        if !audio.exists() {
            return Err(MediaError::FileNotFound(audio.to_path_buf()));
        }
        let frames = self
            .written(video)
            .ok_or_else(|| MediaError::FileNotFound(video.to_path_buf()))?;
        tokio::fs::write(output, b"").await?;
        self.record_output(output, frames);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[tokio::test]
    async fn test_round_trip_through_memory() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MemoryBackend::new();
        let src = dir.path().join("in.mp4");
        let frames = vec![RgbImage::from_pixel(4, 2, Rgb([9, 9, 9])); 3];
        backend.insert_video(&src, 30.0, frames, false);

        let info = backend.probe(&src).await.unwrap();
        assert_eq!((info.width, info.height, info.frames_count), (4, 2, 3));

        let mut reader = backend.open_reader(&src, &info).await.unwrap();
        let out = dir.path().join("out.mp4");
        let mut writer = backend.open_writer(&out, &info).await.unwrap();
        while let Some(frame) = reader.next_frame().await.unwrap() {
            writer.write_frame(&frame).await.unwrap();
        }
        writer.finish().await.unwrap();

        assert!(out.exists());
        assert_eq!(backend.written(&out).unwrap().len(), 3);
        let (_tx, rx) = watch::channel(false);
        assert!(backend.extract_audio(&src, &dir.path().join("a.m4a"), &rx).await.is_err());
    }

    #[tokio::test]
    async fn test_cancelled_audio_extract_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MemoryBackend::new();
        let src = dir.path().join("in.mp4");
        backend.insert_video(&src, 30.0, vec![RgbImage::new(4, 2)], true);

        let (tx, rx) = watch::channel(true);
        let audio = dir.path().join("a.m4a");
        let err = backend.extract_audio(&src, &audio, &rx).await.unwrap_err();
        assert!(matches!(err, MediaError::Cancelled));
        assert!(!audio.exists());

        tx.send_replace(false);
        backend.extract_audio(&src, &audio, &rx).await.unwrap();
        assert!(audio.exists());
    }
}
