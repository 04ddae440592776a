//! services/reader_api/src/web/rest.rs
//!
//! Contains the Axum handlers for the read-only REST endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    protocol::{KhatamDto, KhatamSessionDto, ProgressDto},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Local;
use quran_reader_core::{khatam, tasks};
use std::sync::Arc;
use tracing::error;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_progress_handler,
        surah_progress_handler,
        active_khatam_handler,
    ),
    components(
        schemas(ProgressDto, KhatamDto, KhatamSessionDto)
    ),
    tags(
        (name = "Quran Reader API", description = "Reading progress and khatam endpoints. Reading itself happens over /ws.")
    )
)]
pub struct ApiDoc;

fn internal(context: &str, e: impl std::fmt::Display) -> (StatusCode, String) {
    error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("{}: {}", context, e),
    )
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the stored reading progress of every surah that has any, most recently read first.
#[utoipa::path(
    get,
    path = "/progress",
    responses(
        (status = 200, description = "Stored progress, most recently read first", body = [ProgressDto]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_progress_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let progress = app_state
        .progress
        .list_progress()
        .await
        .map_err(|e| internal("Failed to list reading progress", e))?;
    let dtos: Vec<ProgressDto> = progress.iter().map(ProgressDto::from).collect();
    Ok(Json(dtos))
}

/// Get the stored reading progress of one surah.
#[utoipa::path(
    get,
    path = "/progress/{surah}",
    responses(
        (status = 200, description = "Stored progress of the surah", body = ProgressDto),
        (status = 400, description = "Not a surah number"),
        (status = 404, description = "Nothing recorded for this surah"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("surah" = u16, Path, description = "Surah number, 1 to 114.")
    )
)]
pub async fn surah_progress_handler(
    State(app_state): State<Arc<AppState>>,
    Path(surah): Path<u16>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if khatam::verse_count(surah).is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("{} is not a surah number", surah),
        ));
    }
    let progress = app_state
        .progress
        .get_progress(surah)
        .await
        .map_err(|e| internal("Failed to load reading progress", e))?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!("No reading progress for surah {}", surah),
            )
        })?;
    Ok(Json(ProgressDto::from(&progress)))
}

/// Get the active khatam session with today's metrics.
#[utoipa::path(
    get,
    path = "/khatam/active",
    responses(
        (status = 200, description = "The active session, if any, and today's reading", body = KhatamDto),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn active_khatam_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let overview = tasks::khatam_overview(app_state.khatam.as_ref(), Local::now().date_naive())
        .await
        .map_err(|e| internal("Failed to load khatam session", e))?;
    Ok(Json(KhatamDto::from(&overview)))
}
