use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::services::standings::StandingsReport;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/standings",
    tag = "Standings",
    operation_id = "getCourseStandings",
    summary = "Course progress standings",
    description = "Ranks every participating team by periods passed, then by correct problems and runtime, with a pass/fail forecast per team. Also returns the time windows of the first and last course periods.",
    responses(
        (status = 200, description = "Standings report", body = StandingsReport),
        (status = 500, description = "Store failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_standings(
    State(state): State<AppState>,
) -> Result<Json<StandingsReport>, AppError> {
    let report = state.standings.report().await?;
    Ok(Json(report))
}
