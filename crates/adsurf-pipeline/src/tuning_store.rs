//! Tuning-configuration loading and saving.
//!
//! The operator file wins over the shipped defaults when it exists; either
//! is then overlaid with `ADSURF_TUNING__<KEY>` environment variables.
//! Keys absent everywhere fall back to [`TuningConfig::default`].

use std::path::{Path, PathBuf};

use adsurf_models::TuningConfig;
use config::{Config, Environment, File};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::PipelineResult;

pub const TUNING_ENV_PREFIX: &str = "ADSURF_TUNING";

#[derive(Debug, Clone)]
pub struct TuningStore {
    default_path: PathBuf,
    user_path: PathBuf,
    env_prefix: String,
}

impl TuningStore {
    pub fn new(default_path: impl Into<PathBuf>, user_path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: default_path.into(),
            user_path: user_path.into(),
            env_prefix: TUNING_ENV_PREFIX.to_string(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.default_conf_path, &config.user_conf_path)
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn user_path(&self) -> &Path {
        &self.user_path
    }

    /// The file that [`load`](Self::load) reads, if any exists.
    pub fn active_file(&self) -> Option<&Path> {
        if self.user_path.is_file() {
            Some(&self.user_path)
        } else if self.default_path.is_file() {
            Some(&self.default_path)
        } else {
            None
        }
    }

    /// Load and validate the current tuning.
    pub fn load(&self) -> PipelineResult<TuningConfig> {
        let mut builder = Config::builder();
        if let Some(path) = self.active_file() {
            debug!(path = %path.display(), "Loading tuning file");
            builder = builder.add_source(File::from(path.to_path_buf()));
        }
        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let tuning: TuningConfig = builder.build()?.try_deserialize()?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Persist `tuning` as the operator file.
    pub async fn save(&self, tuning: &TuningConfig) -> PipelineResult<()> {
        tuning.validate()?;
        if let Some(parent) = self.user_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(tuning)?;
        tokio::fs::write(&self.user_path, bytes).await?;
        info!(path = %self.user_path.display(), "Tuning saved");
        Ok(())
    }

    /// Apply a partial update on top of the current tuning and persist it.
    pub async fn update(&self, patch: &serde_json::Value) -> PipelineResult<TuningConfig> {
        let merged = self.load()?.merged_with(patch)?;
        self.save(&merged).await?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use serde_json::json;

    fn store(dir: &Path, prefix: &str) -> TuningStore {
        TuningStore::new(
            dir.join("default_configurations.yaml"),
            dir.join("configurations.json"),
        )
        .with_env_prefix(prefix)
    }

    #[test]
    fn test_missing_files_use_builtin_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let tuning = store(tmp.path(), "ADSURF_TEST_NOFILE").load().unwrap();
        assert_eq!(tuning, TuningConfig::default());
    }

    #[test]
    fn test_default_file_fills_missing_keys() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("default_configurations.yaml"),
            "kernel: 7\ncontour_threshold: 2.5\n",
        )
        .unwrap();
        let tuning = store(tmp.path(), "ADSURF_TEST_YAML").load().unwrap();
        assert_eq!(tuning.kernel, 7);
        assert_eq!(tuning.contour_threshold, 2.5);
        assert_eq!(tuning.window, TuningConfig::default().window);
    }

    #[tokio::test]
    async fn test_user_file_takes_precedence() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("default_configurations.yaml"), "kernel: 7\n").unwrap();
        let s = store(tmp.path(), "ADSURF_TEST_USER");

        let updated = s.update(&json!({"min_area_threshold": 800.0})).await.unwrap();
        assert_eq!(updated.kernel, 7);
        assert_eq!(updated.min_area_threshold, 800.0);
        assert_eq!(s.active_file(), Some(s.user_path()));

        let reloaded = s.load().unwrap();
        assert_eq!(reloaded, updated);
    }

    #[tokio::test]
    async fn test_invalid_update_is_not_saved() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), "ADSURF_TEST_INVALID");
        let err = s.update(&json!({"kernel": 4})).await.unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(!s.user_path().exists());

        let err = s.update(&json!({"kernal": 5})).await.unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_environment_overrides_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("default_configurations.yaml"), "window: 21\n").unwrap();
        std::env::set_var("ADSURF_TEST_ENV__WINDOW", "9");
        let tuning = store(tmp.path(), "ADSURF_TEST_ENV").load().unwrap();
        std::env::remove_var("ADSURF_TEST_ENV__WINDOW");
        assert_eq!(tuning.window, 9);
    }
}
