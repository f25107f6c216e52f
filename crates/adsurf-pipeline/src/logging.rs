//! Structured phase logging and subscriber setup.
//!
//! Provides consistent, structured logging for pipeline phases with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber: colored text for dev, JSON when
/// `LOG_FORMAT=json`.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "adsurf=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Phase logger for structured logging with consistent formatting.
///
/// Every event carries the phase name and the video being processed.
#[derive(Debug, Clone)]
pub struct PhaseLogger {
    phase: String,
    video: String,
}

impl PhaseLogger {
    /// Create a logger for `phase` (e.g. "scan", "detect", "insert").
    pub fn new(phase: &str, video: &str) -> Self {
        Self {
            phase: phase.to_string(),
            video: video.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            phase = %self.phase,
            video = %self.video,
            "Phase started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            phase = %self.phase,
            video = %self.video,
            "Phase progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            phase = %self.phase,
            video = %self.video,
            "Phase warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            phase = %self.phase,
            video = %self.video,
            "Phase error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            phase = %self.phase,
            video = %self.video,
            "Phase completed: {}", message
        );
    }

    pub fn phase(&self) -> &str {
        &self.phase
    }

    pub fn video(&self) -> &str {
        &self.video
    }

    /// Create a tracing span for this phase.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "phase",
            phase = %self.phase,
            video = %self.video
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_logger_creation() {
        let logger = PhaseLogger::new("scan", "clip");
        assert_eq!(logger.phase(), "scan");
        assert_eq!(logger.video(), "clip");
    }

    #[test]
    fn test_phase_logger_methods_do_not_panic() {
        let logger = PhaseLogger::new("insert", "clip");
        let _guard = logger.create_span().entered();
        logger.log_start("begin");
        logger.log_progress("25% of the insertion is completed");
        logger.log_warning("slow");
        logger.log_error("boom");
        logger.log_completion("done");
    }
}
