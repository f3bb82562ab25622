use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    error::Result,
    extract::{AppJson, AppQuery},
    middleware::{parse_id, AuthUser},
    pagination::{InterviewPage, PageQuery, Pagination},
    state::AppState,
};
use super::{
    interview_dto::{
        GenerateInterviewRequest, GeneratedInterviewResponse, InterviewDetail,
        InterviewStatsResponse, SubmissionResponse, SubmitInterviewRequest,
    },
    interview_service::{HISTORY_DEFAULT_LIMIT, HISTORY_MAX_LIMIT},
};

/// Generate a five-question mock interview
#[utoipa::path(
    post,
    path = "/api/interviews/generate",
    tag = "interviews",
    request_body = GenerateInterviewRequest,
    responses(
        (status = 200, description = "Interview generated", body = GeneratedInterviewResponse),
        (status = 400, description = "Missing fields or invalid difficulty"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "AI returned an unusable question set"),
        (status = 503, description = "AI service unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_interview(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<GenerateInterviewRequest>,
) -> Result<impl IntoResponse> {
    let generated = state.interview_service.generate(user_id, payload).await?;

    Ok((StatusCode::OK, Json(generated)))
}

/// Submit answers for an interview
#[utoipa::path(
    post,
    path = "/api/interviews/{id}/submit",
    tag = "interviews",
    params(
        ("id" = Uuid, Path, description = "Interview ID")
    ),
    request_body = SubmitInterviewRequest,
    responses(
        (status = 200, description = "Interview scored", body = SubmissionResponse),
        (status = 400, description = "Invalid answers or already completed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your interview"),
        (status = 404, description = "Interview not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn submit_interview(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(interview_id): Path<String>,
    AppJson(payload): AppJson<SubmitInterviewRequest>,
) -> Result<impl IntoResponse> {
    let interview_id = parse_id(&interview_id, "interview")?;
    let submission = state
        .interview_service
        .submit(user_id, interview_id, payload)
        .await?;

    Ok((StatusCode::OK, Json(submission)))
}

/// Completed interviews, most recent first
#[utoipa::path(
    get,
    path = "/api/interviews/history",
    tag = "interviews",
    params(PageQuery),
    responses(
        (status = 200, description = "Interview history", body = InterviewPage),
        (status = 400, description = "Invalid pagination"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn interview_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<impl IntoResponse> {
    let pagination =
        Pagination::resolve(query.page, query.limit, HISTORY_DEFAULT_LIMIT, HISTORY_MAX_LIMIT)?;
    let history = state.interview_service.history(user_id, pagination).await?;

    Ok((StatusCode::OK, Json(history)))
}

/// Score statistics over completed interviews
#[utoipa::path(
    get,
    path = "/api/interviews/stats",
    tag = "interviews",
    responses(
        (status = 200, description = "Interview statistics", body = InterviewStatsResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn interview_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let stats = state.interview_service.stats(user_id).await?;

    Ok((StatusCode::OK, Json(stats)))
}

/// Get one of your interviews
#[utoipa::path(
    get,
    path = "/api/interviews/{id}",
    tag = "interviews",
    params(
        ("id" = Uuid, Path, description = "Interview ID")
    ),
    responses(
        (status = 200, description = "Interview details", body = InterviewDetail),
        (status = 400, description = "Invalid interview ID"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your interview"),
        (status = 404, description = "Interview not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_interview(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(interview_id): Path<String>,
) -> Result<impl IntoResponse> {
    let interview_id = parse_id(&interview_id, "interview")?;
    let interview = state.interview_service.get(user_id, interview_id).await?;

    Ok((StatusCode::OK, Json(interview)))
}
