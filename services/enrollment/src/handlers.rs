use axum::{
    extract::{Path, State},
    response::Json,
};
use uuid::Uuid;

use kairos_auth::Claims;
use kairos_common::{ApiResponse, AppError};
use kairos_database::{AcademicProgram, Enrollment, Schedule};

use crate::{
    models::{
        CreateProgramRequest, CreateScheduleRequest, EnrollmentStatusChange,
        EnrollmentSubmission, ProgramWithSchedules, SubmissionResult, UpdateProgramRequest,
    },
    services::AppState,
};

/// Public submission endpoint; no authentication required.
pub async fn submit_enrollment(
    State(state): State<AppState>,
    Json(submission): Json<EnrollmentSubmission>,
) -> Result<Json<ApiResponse<SubmissionResult>>, AppError> {
    let result = state.enrollment_service.submit_enrollment(submission).await?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn list_programs(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProgramWithSchedules>>>, AppError> {
    let programs = state.catalog.list_active_programs().await?;
    Ok(Json(ApiResponse::success(programs)))
}

// Admin catalog management

pub async fn create_program(
    State(state): State<AppState>,
    claims: Claims,
    Json(request): Json<CreateProgramRequest>,
) -> Result<Json<ApiResponse<AcademicProgram>>, AppError> {
    let program = state.catalog.create_program(request).await?;
    tracing::info!("program '{}' created by {}", program.name, claims.username);
    Ok(Json(ApiResponse::success(program)))
}

pub async fn update_program(
    State(state): State<AppState>,
    Path(program_id): Path<Uuid>,
    Json(request): Json<UpdateProgramRequest>,
) -> Result<Json<ApiResponse<AcademicProgram>>, AppError> {
    let program = state.catalog.update_program(program_id, request).await?;
    Ok(Json(ApiResponse::success(program)))
}

pub async fn create_schedule(
    State(state): State<AppState>,
    Path(program_id): Path<Uuid>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<Json<ApiResponse<Schedule>>, AppError> {
    let schedule = state.catalog.create_schedule(program_id, request).await?;
    Ok(Json(ApiResponse::success(schedule)))
}

pub async fn change_enrollment_status(
    State(state): State<AppState>,
    claims: Claims,
    Path(enrollment_id): Path<Uuid>,
    Json(change): Json<EnrollmentStatusChange>,
) -> Result<Json<ApiResponse<Enrollment>>, AppError> {
    let enrollment = state
        .enrollment_service
        .change_enrollment_status(enrollment_id, change)
        .await?;
    tracing::info!(
        "enrollment {} set to {} by {}",
        enrollment_id,
        enrollment.status,
        claims.username
    );
    Ok(Json(ApiResponse::success(enrollment)))
}

// Health check endpoint
pub async fn health_check() -> Result<Json<ApiResponse<String>>, AppError> {
    Ok(Json(ApiResponse::success("Enrollment service is healthy".to_string())))
}
