//! Video metadata computed once per pass.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata of the source video and logo for one pipeline pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoMetadata {
    /// Frame rate (fps)
    pub fps: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame count reported by the container (may be an estimate)
    pub frames_count: u64,
    /// Logo height divided by logo width
    pub logo_aspect_ratio: f64,
    /// Source file stem
    pub video_name: String,
    /// Whether the source carries an audio stream
    #[serde(default)]
    pub has_audio: bool,
}

impl VideoMetadata {
    /// Bytes in one packed RGB24 frame.
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Whether the metadata describes a decodable video.
    pub fn is_readable(&self) -> bool {
        self.fps > 0.0 && self.width > 0 && self.height > 0
    }
}
