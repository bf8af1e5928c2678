// src/api/handlers/gdpr_handler.rs

use crate::api::dto::gdpr_dto::{
    AuditLogQueryParams, CleanupRequest, ExportQueryParams, PendingDeletionsResponse,
    RetentionPoliciesResponse, SoftDeleteRequest,
};
use crate::api::AppState;
use crate::domain::retention_policy::retention_policies;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::policy::{self, PolicyAction};
use crate::service::audit_log_service::{AuditLogDto, AuditLogQuery};
use crate::service::purge_service::PurgeRunSummary;
use crate::service::soft_delete_service::CascadeOutcome;
use crate::types::ApiResponse;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

/// Soft-delete a user account (no cascade to children or owned records).
pub async fn soft_delete_user_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SoftDeleteRequest>,
) -> AppResult<ApiResponse<CascadeOutcome>> {
    policy::require(&user, PolicyAction::SoftDelete)?;
    request.validate()?;

    let outcome = app_state
        .soft_delete_service
        .soft_delete_user(id, &user, &request.reason)
        .await?;

    Ok(ApiResponse::success(outcome))
}

/// Soft-delete a child record.
pub async fn soft_delete_child_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SoftDeleteRequest>,
) -> AppResult<ApiResponse<CascadeOutcome>> {
    policy::require(&user, PolicyAction::SoftDelete)?;
    request.validate()?;

    let outcome = app_state
        .soft_delete_service
        .soft_delete_child(id, &user, &request.reason)
        .await?;

    Ok(ApiResponse::success(outcome))
}

/// Soft-delete a group. Refuses while the group still has non-deleted
/// children.
pub async fn soft_delete_group_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SoftDeleteRequest>,
) -> AppResult<ApiResponse<CascadeOutcome>> {
    policy::require(&user, PolicyAction::SoftDelete)?;
    request.validate()?;

    app_state
        .soft_delete_service
        .ensure_group_has_no_active_children(id)
        .await?;

    let outcome = app_state
        .soft_delete_service
        .soft_delete_group(id, &user, &request.reason)
        .await?;

    Ok(ApiResponse::success(outcome))
}

/// Soft-delete an institution, cascading to its groups and children.
pub async fn soft_delete_institution_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SoftDeleteRequest>,
) -> AppResult<ApiResponse<CascadeOutcome>> {
    policy::require(&user, PolicyAction::SoftDelete)?;
    request.validate()?;

    let outcome = app_state
        .soft_delete_service
        .soft_delete_institution(id, &user, &request.reason)
        .await?;

    Ok(ApiResponse::success(outcome))
}

/// Soft-deleted records with their days until permanent deletion.
pub async fn pending_deletions_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<ApiResponse<PendingDeletionsResponse>> {
    policy::require(&user, PolicyAction::ViewPendingDeletions)?;

    let records = app_state.purge_service.pending_deletions().await?;
    let total = records.len();

    Ok(ApiResponse::success(PendingDeletionsResponse {
        records,
        total,
    }))
}

/// Audit trail query, newest first.
pub async fn audit_logs_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<AuditLogQueryParams>,
) -> AppResult<ApiResponse<Vec<AuditLogDto>>> {
    policy::require(&user, PolicyAction::ViewAuditLogs)?;

    let limit = params.limit.unwrap_or(100).clamp(1, 1000);
    let logs = app_state
        .audit_log_service
        .query(
            AuditLogQuery {
                date_from: params.date_from,
                date_to: params.date_to,
                action: params.action,
                actor_name_contains: params.actor,
                institution_id: None,
            },
            limit,
        )
        .await?;

    Ok(ApiResponse::success(logs))
}

/// Trigger a retention purge run.
pub async fn cleanup_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CleanupRequest>,
) -> AppResult<ApiResponse<PurgeRunSummary>> {
    policy::require(&user, PolicyAction::TriggerPurge)?;
    request.validate()?;

    let summary = app_state
        .purge_service
        .purge(user.user_id, request.retention_months)
        .await?;

    Ok(ApiResponse::success(summary))
}

/// Dump of the retention policy registry.
pub async fn retention_periods_handler(
    State(_app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<ApiResponse<RetentionPoliciesResponse>> {
    policy::require(&user, PolicyAction::ViewRetentionPolicies)?;

    Ok(ApiResponse::success(RetentionPoliciesResponse {
        policies: retention_policies(),
    }))
}

/// Full personal-data export; inline JSON by default, file attachment
/// with `?mode=attachment`.
pub async fn export_user_data_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Query(params): Query<ExportQueryParams>,
) -> AppResult<Response> {
    policy::require(&user, PolicyAction::ExportUserData)?;
    policy::require_self_or_admin(&user, user_id)?;

    let export = app_state
        .data_export_service
        .export_user(user_id, user.user_id)
        .await?;

    if params.mode.as_deref() == Some("attachment") {
        let body = serde_json::to_vec_pretty(&export).map_err(|err| {
            AppError::InternalServerError(format!("Failed to serialize export: {}", err))
        })?;
        let disposition = format!(
            "attachment; filename=\"user-data-export-{}.json\"",
            user_id
        );
        return Ok((
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            body,
        )
            .into_response());
    }

    Ok(ApiResponse::success(export).into_response())
}

/// GDPR lifecycle router.
pub fn gdpr_router(app_state: AppState) -> Router {
    Router::new()
        .route("/gdpr/soft-delete/user/{id}", post(soft_delete_user_handler))
        .route(
            "/gdpr/soft-delete/child/{id}",
            post(soft_delete_child_handler),
        )
        .route(
            "/gdpr/soft-delete/group/{id}",
            post(soft_delete_group_handler),
        )
        .route(
            "/gdpr/soft-delete/institution/{id}",
            post(soft_delete_institution_handler),
        )
        .route("/gdpr/pending-deletions", get(pending_deletions_handler))
        .route("/gdpr/audit-logs", get(audit_logs_handler))
        .route("/gdpr/cleanup", post(cleanup_handler))
        .route("/gdpr/retention-periods", get(retention_periods_handler))
        .route("/gdpr/export/{user_id}", get(export_user_data_handler))
        .with_state(app_state)
}
