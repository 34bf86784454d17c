use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::{AppJson, AppPath};
use crate::models::judging::{JudgingDetailResponse, VerifyJudgingRequest, validate_verify_judging};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Judgings",
    operation_id = "getJudging",
    summary = "Get a judging",
    description = "Returns the judging with its lifecycle state, aborted and still-busy flags, runtime aggregates over its runs, and start/end times both absolute and relative to the contest start.",
    params(("id" = i32, Path, description = "Judging ID")),
    responses(
        (status = 200, description = "Judging detail", body = JudgingDetailResponse),
        (status = 404, description = "Judging or contest not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_judging(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<JudgingDetailResponse>, AppError> {
    let detail = state.judgings.detail(id).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/{id}/verify",
    tag = "Judgings",
    operation_id = "verifyJudging",
    summary = "Verify a judging",
    description = "Marks a finished, valid judging as checked by a jury member.",
    params(("id" = i32, Path, description = "Judging ID")),
    request_body = VerifyJudgingRequest,
    responses(
        (status = 200, description = "Verified judging", body = JudgingDetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Judging not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Judging running, invalid or already verified (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(jury_member = %payload.jury_member))]
pub async fn verify_judging(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<VerifyJudgingRequest>,
) -> Result<Json<JudgingDetailResponse>, AppError> {
    validate_verify_judging(&payload)?;

    state
        .judgings
        .verify(id, payload.jury_member.trim().to_string(), payload.comment)
        .await?;
    let detail = state.judgings.detail(id).await?;
    Ok(Json(detail))
}
