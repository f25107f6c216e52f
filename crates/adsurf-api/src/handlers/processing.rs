//! Scan and insertion handlers.
//!
//! `POST /api/processing` scans and stores the video/logo pair for the
//! session; `GET /api/processing` inserts using that pair once the operator
//! has reviewed the previews.

use adsurf_models::{ConfirmedSubset, Outcome, PipelineStatus};
use adsurf_pipeline::{messages, PipelineError};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::{AppState, SessionPair};

#[derive(Debug, Deserialize)]
pub struct ProcessingRequest {
    pub video: String,
    pub logo: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct InsertQuery {
    /// Comma-separated instance indices, e.g. `0,2`
    pub keep: Option<String>,
}

fn parse_keep(raw: &str) -> ApiResult<ConfirmedSubset> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| ApiError::bad_request(format!("invalid instance index '{}'", s)))
        })
        .collect()
}

/// Scan the video, detect stable surfaces and render previews.
pub async fn start_processing(
    State(state): State<AppState>,
    Json(req): Json<ProcessingRequest>,
) -> ApiResult<Json<PipelineStatus>> {
    if req.video.trim().is_empty() || req.logo.trim().is_empty() {
        return Err(ApiError::bad_request(messages::BAD_INPUT));
    }
    let mut ctx = state.begin_run().inspect_err(|_| metrics::record_run_conflict("scan"))?;
    let tuning = state.tuning.load()?;

    info!(video = %req.video, logo = %req.logo, "Scan requested");
    let status = state
        .orchestrator
        .scan(&mut ctx, &req.video, &req.logo, &tuning)
        .await?;

    let pair = SessionPair {
        video: req.video.into(),
        logo: req.logo.into(),
    };
    *state.session.write().await = (status.outcome == Outcome::Ready).then_some(pair);
    Ok(Json(status))
}

/// Insert the logo into the confirmed surfaces of the session's video.
pub async fn run_insertion(
    State(state): State<AppState>,
    Query(query): Query<InsertQuery>,
) -> ApiResult<Json<PipelineStatus>> {
    let confirmed = query.keep.as_deref().map(parse_keep).transpose()?;
    let pair = state
        .session
        .read()
        .await
        .clone()
        .ok_or_else(|| PipelineError::sequence(messages::RUN_SCAN_FIRST))?;

    let mut ctx = state.begin_run().inspect_err(|_| metrics::record_run_conflict("insert"))?;
    info!(video = %pair.video.display(), "Insertion requested");
    let status = state
        .orchestrator
        .insert(&mut ctx, &pair.video, &pair.logo, confirmed)
        .await?;

    if status.outcome == Outcome::Completed {
        *state.session.write().await = None;
    }
    Ok(Json(status))
}

/// Stop the running phase at its next frame boundary.
pub async fn cancel_processing(State(state): State<AppState>) -> StatusCode {
    state.cancel_run();
    StatusCode::ACCEPTED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keep() {
        let subset = parse_keep("0, 2,,5").unwrap();
        assert_eq!(subset, [0usize, 2, 5].into_iter().collect::<ConfirmedSubset>());
        assert!(parse_keep("").unwrap().is_empty());
        assert!(matches!(parse_keep("1,x"), Err(ApiError::BadRequest(_))));
    }
}
