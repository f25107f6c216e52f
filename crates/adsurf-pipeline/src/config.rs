//! Pipeline configuration.

use std::path::PathBuf;

use adsurf_media::EncodeSettings;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Workspace root holding `files/` and `output/`
    pub work_dir: PathBuf,
    /// Directory relative video and logo paths are resolved against
    pub input_dir: PathBuf,
    /// Tuning defaults shipped with the service
    pub default_conf_path: PathBuf,
    /// Operator overrides, written by configuration updates
    pub user_conf_path: PathBuf,
    /// Container extension of the deliverable
    pub output_ext: String,
    /// Encoder settings for the re-rendered video
    pub encode: EncodeSettings,
    /// Timeout for individual ffmpeg jobs (audio extract and mux)
    pub ffmpeg_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let work_dir = PathBuf::from(".");
        Self {
            input_dir: work_dir.join("output"),
            default_conf_path: work_dir.join("conf").join("default_configurations.yaml"),
            user_conf_path: work_dir.join("conf").join("configurations.json"),
            work_dir,
            output_ext: "mp4".to_string(),
            encode: EncodeSettings::default(),
            ffmpeg_timeout_secs: 3600,
        }
    }
}

impl PipelineConfig {
    /// Default layout rooted at `work_dir`.
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        Self {
            input_dir: work_dir.join("output"),
            default_conf_path: work_dir.join("conf").join("default_configurations.yaml"),
            user_conf_path: work_dir.join("conf").join("configurations.json"),
            work_dir,
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let work_dir = std::env::var("ADSURF_WORK_DIR").unwrap_or_else(|_| ".".to_string());
        let mut config = Self::with_work_dir(work_dir);

        if let Ok(dir) = std::env::var("ADSURF_INPUT_DIR") {
            config.input_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("ADSURF_DEFAULT_CONF") {
            config.default_conf_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("ADSURF_USER_CONF") {
            config.user_conf_path = PathBuf::from(path);
        }
        config.output_ext = std::env::var("ADSURF_OUTPUT_EXT")
            .map(|ext| ext.trim_start_matches('.').to_string())
            .unwrap_or_else(|_| "mp4".to_string());
        config.encode.crf = std::env::var("ADSURF_CRF")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(config.encode.crf);
        config.encode.preset =
            std::env::var("ADSURF_PRESET").unwrap_or_else(|_| config.encode.preset.clone());
        config.ffmpeg_timeout_secs = std::env::var("ADSURF_FFMPEG_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600);
        config
    }

    /// Resolve a user-supplied input path; absolute paths are kept as-is.
    pub fn resolve_input(&self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        if path.is_absolute() {
            path
        } else {
            self.input_dir.join(path)
        }
    }
}
