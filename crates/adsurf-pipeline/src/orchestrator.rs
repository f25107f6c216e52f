//! Scan → detect → review → insert sequencing.
//!
//! Each phase reopens the video, fully consumes it and hands its result to
//! the next phase through a persisted artifact. The [`PipelineContext`]
//! enforces phase order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use adsurf_media::fs_utils::{move_file, remove_best_effort};
use adsurf_media::vision::{
    instances, normalize_contours, Compositor, StabilityTracker, SurfaceDetector, TemporalSmoother,
};
use adsurf_media::{Logo, MediaError, MediaResult, ProgressMilestones, VideoBackend, VideoInfo};
use adsurf_models::{
    ConfirmedSubset, DetectionLog, Outcome, PhaseState, PipelineStatus, StableContour,
    TuningConfig, VideoMetadata,
};
use tracing::{trace, Instrument};

use crate::cleanup::{cleanup_after_insert, discard_review};
use crate::config::PipelineConfig;
use crate::context::PipelineContext;
use crate::error::{PipelineError, PipelineResult};
use crate::layout::WorkspaceLayout;
use crate::logging::PhaseLogger;
use crate::metrics;
use crate::previews::{confirmed_from_previews, render_previews, reset_previews};
use crate::report::build_report;

/// Operator-facing status messages.
pub mod messages {
    pub const READY: &str =
        "Insert templates are ready. Please check the templates for further actions.";
    pub const NO_SURFACES: &str =
        "No places to insert ad were found. Please try different video file.";
    pub const NOTHING_TO_INSERT: &str =
        "There is nothing to insert. Please try different video file.";
    pub const COMPLETED: &str = "Video file has been processed.";
    pub const RUN_SCAN_FIRST: &str =
        "Please run Video Processing before Advertisement Insertion.";
    pub const BAD_INPUT: &str = "ERROR WHILE ENTERING LOGO OR VIDEO PATH.";
}

fn video_name(video: &Path) -> String {
    video
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video")
        .to_string()
}

fn short_tag() -> String {
    let mut tag = uuid::Uuid::new_v4().simple().to_string();
    tag.truncate(8);
    tag
}

/// Drives the three phases over a [`VideoBackend`].
#[derive(Clone)]
pub struct PipelineOrchestrator {
    backend: Arc<dyn VideoBackend>,
    config: PipelineConfig,
}

impl PipelineOrchestrator {
    pub fn new(backend: Arc<dyn VideoBackend>, config: PipelineConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn layout(&self) -> WorkspaceLayout {
        WorkspaceLayout::new(&self.config.work_dir)
    }

    /// Context for this workspace, picking up a pending review if one exists.
    pub fn context(&self) -> PipelineContext {
        PipelineContext::resume(self.layout())
    }

    /// Scan and detect in one call; returns the review status.
    pub async fn scan(
        &self,
        ctx: &mut PipelineContext,
        video: impl AsRef<Path>,
        logo: impl AsRef<Path>,
        tuning: &TuningConfig,
    ) -> PipelineResult<PipelineStatus> {
        let video = self.config.resolve_input(video.as_ref());
        let logo = self.config.resolve_input(logo.as_ref());
        self.scan_phase(ctx, &video, &logo, tuning).await?;
        self.detect_phase(ctx, &video, &logo, tuning).await
    }

    /// Insert the logo into the confirmed surfaces and remux the audio.
    ///
    /// Without an explicit subset the confirmed instances are the previews
    /// still present in the review directory.
    pub async fn insert(
        &self,
        ctx: &mut PipelineContext,
        video: impl AsRef<Path>,
        logo: impl AsRef<Path>,
        confirmed: Option<ConfirmedSubset>,
    ) -> PipelineResult<PipelineStatus> {
        let video = self.config.resolve_input(video.as_ref());
        let logo = self.config.resolve_input(logo.as_ref());
        let logger = PhaseLogger::new("insert", &video_name(&video));
        let started = Instant::now();
        let result = self
            .insert_inner(ctx, &video, &logo, confirmed, &logger)
            .instrument(logger.create_span())
            .await;
        finish_phase(ctx, &logger, started, &result);
        result
    }

    /// Detect candidates on every frame and persist the detection log.
    pub async fn scan_phase(
        &self,
        ctx: &mut PipelineContext,
        video: &Path,
        logo: &Path,
        tuning: &TuningConfig,
    ) -> PipelineResult<DetectionLog> {
        let logger = PhaseLogger::new("scan", &video_name(video));
        let started = Instant::now();
        let result = self
            .scan_inner(ctx, video, logo, tuning, &logger)
            .instrument(logger.create_span())
            .await;
        finish_phase(ctx, &logger, started, &result);
        result
    }

    /// Track, normalize and smooth the persisted log, then render previews.
    pub async fn detect_phase(
        &self,
        ctx: &mut PipelineContext,
        video: &Path,
        logo: &Path,
        tuning: &TuningConfig,
    ) -> PipelineResult<PipelineStatus> {
        let logger = PhaseLogger::new("detect", &video_name(video));
        let started = Instant::now();
        let result = self
            .detect_inner(ctx, video, logo, tuning, &logger)
            .instrument(logger.create_span())
            .await;
        finish_phase(ctx, &logger, started, &result);
        result
    }

    async fn open_inputs(&self, video: &Path, logo: &Path) -> PipelineResult<(VideoInfo, Logo)> {
        let logo = Logo::load(logo).map_err(|e| unreadable(&e))?;
        let info = self.backend.probe(video).await.map_err(|e| match e {
            MediaError::FfmpegNotFound | MediaError::FfprobeNotFound => PipelineError::from(e),
            other => unreadable(&other),
        })?;
        if info.fps <= 0.0 || info.width == 0 || info.height == 0 {
            return Err(PipelineError::input_unreadable(format!(
                "{} ({}: fps {}, size {}x{})",
                messages::BAD_INPUT,
                video.display(),
                info.fps,
                info.width,
                info.height
            )));
        }
        Ok((info, logo))
    }

    async fn scan_inner(
        &self,
        ctx: &mut PipelineContext,
        video: &Path,
        logo: &Path,
        tuning: &TuningConfig,
        logger: &PhaseLogger,
    ) -> PipelineResult<DetectionLog> {
        ctx.transition(PhaseState::Scanning)?;
        logger.log_start("scanning frames for surfaces");

        tuning.validate()?;
        let (info, logo) = self.open_inputs(video, logo).await?;
        ctx.layout().ensure().await?;
        discard_review(ctx.layout()).await?;

        let detector = Arc::new(SurfaceDetector::from_tuning(tuning));
        let mut reader = self.backend.open_reader(video, &info).await?;
        let mut log = DetectionLog::new();
        let mut milestones = ProgressMilestones::new(info.frames_count);
        let mut frame_index: u64 = 0;

        loop {
            ctx.check_cancelled()?;
            let Some(frame) = reader.next_frame().await? else {
                break;
            };
            let det = Arc::clone(&detector);
            let quads = tokio::task::spawn_blocking(move || det.detect(&frame)).await?;
            trace!(frame = frame_index, candidates = quads.len(), "Frame scanned");
            metrics::record_frame_scanned(quads.len());
            log.push_frame(frame_index, quads);

            frame_index += 1;
            if let Some(pct) = milestones.observe(frame_index) {
                logger.log_progress(&format!("{}% of the movie is processed", pct));
            }
        }
        drop(reader);

        if frame_index == 0 {
            return Err(PipelineError::input_unreadable(format!(
                "{} ({} has no decodable frames)",
                messages::BAD_INPUT,
                video.display()
            )));
        }

        let metadata = VideoMetadata {
            fps: info.fps,
            width: info.width,
            height: info.height,
            frames_count: frame_index,
            logo_aspect_ratio: logo.aspect_ratio(),
            video_name: video_name(video),
            has_audio: info.has_audio,
        };
        ctx.artifacts().save_detection_log(&log, &metadata).await?;
        ctx.set_metadata(metadata);
        ctx.transition(PhaseState::Scanned)?;

        logger.log_completion(&format!(
            "{} candidates in {} frames",
            log.len(),
            log.frames_count
        ));
        Ok(log)
    }

    async fn detect_inner(
        &self,
        ctx: &mut PipelineContext,
        video: &Path,
        logo: &Path,
        tuning: &TuningConfig,
        logger: &PhaseLogger,
    ) -> PipelineResult<PipelineStatus> {
        let store = ctx.artifacts();
        if ctx.state() != PhaseState::Scanned || !store.has_detection_log() {
            return Err(PipelineError::sequence(messages::RUN_SCAN_FIRST));
        }
        logger.log_start("tracking stable surfaces");

        let (log, metadata) = store.load_detection_log().await?;
        ctx.set_metadata(metadata.clone());

        let tracker = StabilityTracker::from_tuning(tuning);
        let smoother = TemporalSmoother::from_tuning(tuning)?;
        let fps = metadata.fps;
        let smoothed = tokio::task::spawn_blocking(move || -> MediaResult<Vec<StableContour>> {
            let mut contours = tracker.track(&log, fps)?;
            normalize_contours(&mut contours);
            if contours.is_empty() {
                return Ok(contours);
            }
            smoother.smooth(&contours)
        })
        .await??;
        metrics::record_stable_contours(smoothed.len());

        let layout = ctx.layout().clone();
        if smoothed.is_empty() {
            remove_best_effort(layout.detection_log_path()).await;
            ctx.transition(PhaseState::Idle)?;
            logger.log_completion("no stable surfaces");
            return Ok(PipelineStatus::new(
                ctx.state(),
                Outcome::NothingToInsert,
                messages::NO_SURFACES,
            ));
        }

        let found = instances(&smoothed);
        let (info, logo) = self.open_inputs(video, logo).await?;
        let compositor = Compositor::new(logo);
        reset_previews(&layout.instances_dir()).await?;
        render_previews(
            self.backend.as_ref(),
            ctx,
            video,
            &info,
            &compositor,
            &smoothed,
            &found,
        )
        .await?;

        let report = build_report(&smoothed, fps);
        tokio::fs::write(layout.report_path(&metadata.video_name), &report).await?;
        ctx.artifacts()
            .save_smoothed_contours(&smoothed, &metadata)
            .await?;
        remove_best_effort(layout.detection_log_path()).await;
        ctx.transition(PhaseState::WaitingForReview)?;

        logger.log_completion(&format!("{} surfaces ready for review", found.len()));
        Ok(
            PipelineStatus::new(ctx.state(), Outcome::Ready, messages::READY)
                .with_instances(found)
                .with_report(report),
        )
    }

    async fn insert_inner(
        &self,
        ctx: &mut PipelineContext,
        video: &Path,
        logo: &Path,
        confirmed: Option<ConfirmedSubset>,
        logger: &PhaseLogger,
    ) -> PipelineResult<PipelineStatus> {
        let store = ctx.artifacts();
        if ctx.state() != PhaseState::WaitingForReview || !store.has_smoothed_contours() {
            return Err(PipelineError::sequence(messages::RUN_SCAN_FIRST));
        }
        let layout = ctx.layout().clone();

        let (contours, metadata) = store.load_smoothed_contours().await?;
        if metadata.video_name != video_name(video) {
            return Err(PipelineError::sequence(messages::RUN_SCAN_FIRST));
        }
        let confirmed = match confirmed {
            Some(subset) => subset,
            None => confirmed_from_previews(&layout.instances_dir()).await?,
        };
        let selected: Vec<StableContour> = contours
            .into_iter()
            .enumerate()
            .filter(|(i, _)| confirmed.contains(*i))
            .map(|(_, c)| c)
            .collect();
        if selected.is_empty() {
            logger.log_warning("every instance was rejected");
            return Ok(PipelineStatus::new(
                ctx.state(),
                Outcome::NothingToInsert,
                messages::NOTHING_TO_INSERT,
            ));
        }

        ctx.transition(PhaseState::Confirmed)?;
        ctx.transition(PhaseState::Inserting)?;
        logger.log_start(&format!("inserting into {} surfaces", selected.len()));

        let (info, logo) = self.open_inputs(video, logo).await?;
        if (info.width, info.height) != (metadata.width, metadata.height) {
            return Err(PipelineError::NumericDegeneracy(format!(
                "video is {}x{} but was scanned at {}x{}",
                info.width, info.height, metadata.width, metadata.height
            )));
        }
        ctx.set_metadata(metadata.clone());

        let ext = &self.config.output_ext;
        let silent = layout.silent_render_path(ext);
        let compositor = Arc::new(Compositor::new(logo));
        let mut reader = self.backend.open_reader(video, &info).await?;
        let mut writer = self.backend.open_writer(&silent, &info).await?;
        let mut milestones = ProgressMilestones::new(metadata.frames_count);
        let mut frame_index: u64 = 0;
        let mut composited: u64 = 0;

        loop {
            ctx.check_cancelled()?;
            let Some(frame) = reader.next_frame().await? else {
                break;
            };
            if frame.dimensions() != (metadata.width, metadata.height) {
                return Err(PipelineError::NumericDegeneracy(format!(
                    "frame {} is {}x{} but the surfaces were tracked at {}x{}",
                    frame_index,
                    frame.width(),
                    frame.height(),
                    metadata.width,
                    metadata.height
                )));
            }

            let quad = selected.iter().find_map(|c| c.quad_at(frame_index)).copied();
            let frame = match quad {
                Some(quad) => {
                    let comp = Arc::clone(&compositor);
                    let frame = tokio::task::spawn_blocking(move || -> MediaResult<_> {
                        let mut frame = frame;
                        comp.composite_quad(&mut frame, &quad)?;
                        Ok(frame)
                    })
                    .await??;
                    metrics::record_frame_composited();
                    composited += 1;
                    frame
                }
                None => frame,
            };
            writer.write_frame(&frame).await?;

            frame_index += 1;
            if let Some(pct) = milestones.observe(frame_index) {
                logger.log_progress(&format!("{}% of the insertion is completed", pct));
            }
        }
        writer.finish().await?;
        drop(reader);

        let tag = short_tag();
        let deliverable = layout.deliverable_path(&metadata.video_name, &tag, ext);
        let mut leftovers: Vec<PathBuf> = vec![silent.clone()];
        if info.has_audio {
            let audio = layout.audio_path(&metadata.video_name, &tag);
            self.backend
                .extract_audio(video, &audio, ctx.cancel_signal())
                .await?;
            self.backend
                .mux_audio(&silent, &audio, &deliverable, ctx.cancel_signal())
                .await?;
            leftovers.push(audio);
        } else {
            logger.log_warning("source has no audio stream, keeping the silent render");
            move_file(&silent, &deliverable).await?;
        }

        ctx.transition(PhaseState::Done)?;
        let failures = cleanup_after_insert(&layout, &leftovers).await;
        if failures > 0 {
            logger.log_warning(&format!("{} intermediate files could not be removed", failures));
        }

        logger.log_completion(&format!(
            "{} of {} frames composited into {}",
            composited,
            frame_index,
            deliverable.display()
        ));
        Ok(
            PipelineStatus::new(ctx.state(), Outcome::Completed, messages::COMPLETED)
                .with_output(deliverable),
        )
    }
}

fn unreadable(e: &MediaError) -> PipelineError {
    PipelineError::input_unreadable(format!("{} ({})", messages::BAD_INPUT, e))
}

fn finish_phase<T>(
    ctx: &mut PipelineContext,
    logger: &PhaseLogger,
    started: Instant,
    result: &PipelineResult<T>,
) {
    let secs = started.elapsed().as_secs_f64();
    match result {
        Ok(_) => metrics::record_phase_duration(logger.phase(), "success", secs),
        Err(e) => {
            if !e.is_sequence_error() {
                ctx.fail();
            }
            logger.log_error(&e.to_string());
            metrics::record_phase_failure(logger.phase());
            metrics::record_phase_duration(logger.phase(), "failure", secs);
        }
    }
}
