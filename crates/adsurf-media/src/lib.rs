//! FFmpeg CLI plumbing and the frame-level vision core.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a cancellable runner
//! - FFprobe metadata and RGB24 rawvideo frame reading/writing
//! - Audio extraction and remuxing
//! - Quadrilateral detection, stability tracking, corner normalization,
//!   Savitzky–Golay smoothing and perspective compositing

pub mod audio;
pub mod command;
pub mod error;
pub mod fs_utils;
pub mod image_io;
pub mod memory;
pub mod probe;
pub mod progress;
pub mod video;
pub mod vision;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use image_io::{save_png, Logo};
pub use memory::MemoryBackend;
pub use probe::{probe_video, VideoInfo};
pub use progress::ProgressMilestones;
pub use video::{
    EncodeSettings, FfmpegBackend, FfmpegFrameReader, FfmpegFrameWriter, FrameSink, FrameSource,
    VideoBackend,
};
