//! Application state.

use std::path::PathBuf;
use std::sync::Arc;

use adsurf_media::{FfmpegBackend, VideoBackend};
use adsurf_pipeline::{PipelineConfig, PipelineContext, PipelineOrchestrator, TuningStore};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex, MutexGuard, RwLock};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Video and logo of the scan awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPair {
    pub video: PathBuf,
    pub logo: PathBuf,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<PipelineOrchestrator>,
    pub tuning: Arc<TuningStore>,
    /// Held for the whole duration of a pipeline run
    pub pipeline: Arc<Mutex<PipelineContext>>,
    pub session: Arc<RwLock<Option<SessionPair>>>,
    cancel: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// State backed by the ffmpeg CLI.
    pub fn new(config: ApiConfig, pipeline: PipelineConfig) -> Self {
        let backend = FfmpegBackend::new(pipeline.encode.clone())
            .with_timeout(pipeline.ffmpeg_timeout_secs);
        Self::with_backend(config, pipeline, Arc::new(backend))
    }

    pub fn with_backend(
        config: ApiConfig,
        pipeline: PipelineConfig,
        backend: Arc<dyn VideoBackend>,
    ) -> Self {
        let tuning = TuningStore::from_config(&pipeline);
        let orchestrator = PipelineOrchestrator::new(backend, pipeline);
        let (cancel, cancel_rx) = watch::channel(false);
        let ctx = orchestrator.context().with_cancel(cancel_rx);

        Self {
            config,
            orchestrator: Arc::new(orchestrator),
            tuning: Arc::new(tuning),
            pipeline: Arc::new(Mutex::new(ctx)),
            session: Arc::new(RwLock::new(None)),
            cancel: Arc::new(cancel),
        }
    }

    /// Take the run lock, or fail with 409 when a run is in flight.
    ///
    /// Clears any cancellation left over from the previous run.
    pub fn begin_run(&self) -> ApiResult<MutexGuard<'_, PipelineContext>> {
        let guard = self
            .pipeline
            .try_lock()
            .map_err(|_| ApiError::conflict("A pipeline run is already in progress"))?;
        self.cancel.send_replace(false);
        Ok(guard)
    }

    /// Ask the running phase to stop at its next frame boundary.
    pub fn cancel_run(&self) {
        self.cancel.send_replace(true);
    }
}
