//! Frame-level video I/O over FFmpeg rawvideo pipes.
//!
//! Decoding spawns `ffmpeg ... -f rawvideo -pix_fmt rgb24 -` and slices the
//! stdout stream into `width × height × 3` frames. Encoding feeds frames of
//! the same layout into `ffmpeg -f rawvideo -i -` and writes libx264/yuv420p.
//!
//! [`VideoBackend`] is the seam the pipeline drives, so phases can run against
//! [`crate::memory::MemoryBackend`] in tests.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::audio;
use crate::command::{collect_stderr, join_stderr, FfmpegCommand, FfmpegRunner, PIPE};
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_video, VideoInfo};

/// Sequential source of decoded RGB frames.
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` at end of stream.
    async fn next_frame(&mut self) -> MediaResult<Option<RgbImage>>;
}

/// Sequential sink of RGB frames.
#[async_trait]
pub trait FrameSink: Send {
    async fn write_frame(&mut self, frame: &RgbImage) -> MediaResult<()>;

    /// Flush and close the stream. Must be called once after the last frame.
    async fn finish(&mut self) -> MediaResult<()>;
}

/// Everything the pipeline needs from the video toolchain.
#[async_trait]
pub trait VideoBackend: Send + Sync {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo>;

    async fn open_reader(&self, path: &Path, info: &VideoInfo) -> MediaResult<Box<dyn FrameSource>>;

    async fn open_writer(&self, path: &Path, info: &VideoInfo) -> MediaResult<Box<dyn FrameSink>>;

    /// Copy the audio track of `video` into `audio_out`.
    ///
    /// Fails with [`MediaError::Cancelled`] once `cancel` turns `true`.
    async fn extract_audio(
        &self,
        video: &Path,
        audio_out: &Path,
        cancel: &watch::Receiver<bool>,
    ) -> MediaResult<()>;

    /// Combine the video of `video` with `audio` into `output`.
    async fn mux_audio(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        cancel: &watch::Receiver<bool>,
    ) -> MediaResult<()>;
}

/// Encoder settings for rendered output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeSettings {
    /// Video codec (default: libx264)
    pub codec: String,
    /// Output pixel format (default: yuv420p)
    pub pixel_format: String,
    /// Constant rate factor (default: 18)
    pub crf: u8,
    /// Encoder preset (default: medium)
    pub preset: String,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
            crf: 18,
            preset: "medium".to_string(),
        }
    }
}

/// Decodes a video file into RGB24 frames through an FFmpeg child process.
pub struct FfmpegFrameReader {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr_task: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    frames_read: u64,
    finished: bool,
}

impl FfmpegFrameReader {
    pub fn open(path: &Path, width: u32, height: u32) -> MediaResult<Self> {
        if width == 0 || height == 0 {
            return Err(MediaError::invalid_video(format!(
                "{} has no decodable frame size",
                path.display()
            )));
        }

        let cmd = FfmpegCommand::new(path, PIPE)
            .no_audio()
            .raw_rgb_output();

        let mut child = cmd
            .to_process()?
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stdout not captured"))?;
        let stderr_task = collect_stderr(child.stderr.take());

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            stderr_task,
            width,
            height,
            frames_read: 0,
            finished: false,
        })
    }

    fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    async fn close(&mut self) -> MediaResult<()> {
        let status = self.child.wait().await?;
        let stderr = join_stderr(self.stderr_task.take()).await;
        if status.success() {
            return Ok(());
        }
        if self.frames_read == 0 {
            return Err(MediaError::invalid_video(
                stderr.unwrap_or_else(|| "FFmpeg could not decode the input".to_string()),
            ));
        }
        Err(MediaError::ffmpeg_failed(
            "FFmpeg decoder exited with non-zero status",
            stderr,
            status.code(),
        ))
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameReader {
    async fn next_frame(&mut self) -> MediaResult<Option<RgbImage>> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.frame_bytes()];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.stdout.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled < buf.len() {
            self.finished = true;
            if filled > 0 {
                warn!(
                    bytes = filled,
                    frames = self.frames_read,
                    "Discarding truncated trailing frame"
                );
            }
            self.close().await?;
            debug!(frames = self.frames_read, "Decoder reached end of stream");
            return Ok(None);
        }

        self.frames_read += 1;
        let frame = RgbImage::from_raw(self.width, self.height, buf)
            .ok_or_else(|| MediaError::internal("Frame buffer size mismatch"))?;
        Ok(Some(frame))
    }
}

/// Encodes RGB24 frames into a video file through an FFmpeg child process.
pub struct FfmpegFrameWriter {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_task: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
}

impl FfmpegFrameWriter {
    pub fn create(path: &Path, info: &VideoInfo, settings: &EncodeSettings) -> MediaResult<Self> {
        let cmd = FfmpegCommand::new(PIPE, path)
            .raw_rgb_input(info.width, info.height, info.fps)
            .no_audio()
            .video_codec(settings.codec.clone())
            .pixel_format(settings.pixel_format.clone())
            .crf(settings.crf)
            .preset(settings.preset.clone());

        let mut child = cmd
            .to_process()?
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stdin not captured"))?;
        let stderr_task = collect_stderr(child.stderr.take());

        Ok(Self {
            child,
            stdin: Some(stdin),
            stderr_task,
            width: info.width,
            height: info.height,
        })
    }

    async fn fail(&mut self, message: &str) -> MediaError {
        let _ = self.child.kill().await;
        let stderr = join_stderr(self.stderr_task.take()).await;
        MediaError::ffmpeg_failed(message, stderr, None)
    }
}

#[async_trait]
impl FrameSink for FfmpegFrameWriter {
    async fn write_frame(&mut self, frame: &RgbImage) -> MediaResult<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(MediaError::degenerate(format!(
                "frame is {}x{}, encoder expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(MediaError::internal("Encoder already finished"));
        };
        if stdin.write_all(frame.as_raw()).await.is_err() {
            return Err(self.fail("FFmpeg encoder closed its input").await);
        }
        Ok(())
    }

    async fn finish(&mut self) -> MediaResult<()> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin.shutdown().await?;
        }
        let status = self.child.wait().await?;
        let stderr = join_stderr(self.stderr_task.take()).await;
        if !status.success() {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg encoder exited with non-zero status",
                stderr,
                status.code(),
            ));
        }
        Ok(())
    }
}

/// [`VideoBackend`] backed by the `ffmpeg`/`ffprobe` CLI tools.
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    encode: EncodeSettings,
    timeout_secs: Option<u64>,
}

impl FfmpegBackend {
    pub fn new(encode: EncodeSettings) -> Self {
        Self {
            encode,
            timeout_secs: None,
        }
    }

    /// Timeout applied to the audio extract/mux commands.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    fn runner(&self, cancel: &watch::Receiver<bool>) -> FfmpegRunner {
        let runner = FfmpegRunner::new().with_cancel(cancel.clone());
        match self.timeout_secs {
            Some(secs) => runner.with_timeout(secs),
            None => runner,
        }
    }
}

#[async_trait]
impl VideoBackend for FfmpegBackend {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        probe_video(path).await
    }

    async fn open_reader(&self, path: &Path, info: &VideoInfo) -> MediaResult<Box<dyn FrameSource>> {
        Ok(Box::new(FfmpegFrameReader::open(path, info.width, info.height)?))
    }

    async fn open_writer(&self, path: &Path, info: &VideoInfo) -> MediaResult<Box<dyn FrameSink>> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(Box::new(FfmpegFrameWriter::create(path, info, &self.encode)?))
    }

    async fn extract_audio(
        &self,
        video: &Path,
        audio_out: &Path,
        cancel: &watch::Receiver<bool>,
    ) -> MediaResult<()> {
        audio::extract_audio(&self.runner(cancel), video, audio_out).await
    }

    async fn mux_audio(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        cancel: &watch::Receiver<bool>,
    ) -> MediaResult<()> {
        audio::mux_audio(&self.runner(cancel), video, audio, output).await
    }
}
