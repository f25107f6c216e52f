//! Audio track extraction and remuxing.

use std::path::Path;

use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Copy the audio stream of `video` into `audio_out` without re-encoding.
pub async fn extract_audio(runner: &FfmpegRunner, video: &Path, audio_out: &Path) -> MediaResult<()> {
    if !video.exists() {
        return Err(MediaError::FileNotFound(video.to_path_buf()));
    }
    let cmd = extract_command(video, audio_out);
    runner.run(&cmd).await?;
    info!(audio = %audio_out.display(), "Extracted audio track");
    Ok(())
}

/// Mux the video of `video` with `audio`, stopping at the shorter stream.
pub async fn mux_audio(
    runner: &FfmpegRunner,
    video: &Path,
    audio: &Path,
    output: &Path,
) -> MediaResult<()> {
    for path in [video, audio] {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
    }
    let cmd = mux_command(video, audio, output);
    runner.run(&cmd).await?;
    info!(output = %output.display(), "Muxed audio into output");
    Ok(())
}

fn extract_command(video: &Path, audio_out: &Path) -> FfmpegCommand {
    FfmpegCommand::new(video, audio_out)
        .no_video()
        .output_args(["-acodec", "copy"])
}

fn mux_command(video: &Path, audio: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(video, output)
        .add_input(audio)
        .stream_copy()
        .shortest()
}
