// src/api/handlers/deletion_request_handler.rs

use crate::api::dto::deletion_request_dto::{
    CreateDeletionRequestBody, DeletionRequestListParams, RejectDeletionRequestBody,
};
use crate::api::AppState;
use crate::domain::deletion_request_model::DeletionRequestStatus;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::policy::{self, PolicyAction};
use crate::service::deletion_request_service::DeletionRequestDto;
use crate::types::{response::ResponsePaginationMeta, ApiResponse, ResponseMeta};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

/// Create a deletion request for a user account (self-service, or on
/// behalf of a user by an admin).
pub async fn create_deletion_request_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<CreateDeletionRequestBody>,
) -> AppResult<ApiResponse<DeletionRequestDto>> {
    policy::require(&user, PolicyAction::CreateDeletionRequest)?;
    policy::require_self_or_admin(&user, user_id)?;
    request.validate()?;

    let dto = app_state
        .deletion_request_service
        .create(user_id, user.user_id, &request.reason)
        .await?;

    Ok(ApiResponse::success(dto))
}

pub async fn list_deletion_requests_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<DeletionRequestListParams>,
) -> AppResult<ApiResponse<Vec<DeletionRequestDto>>> {
    policy::require(&user, PolicyAction::ReviewDeletionRequests)?;

    let status = match params.status.as_deref() {
        None => None,
        Some("PENDING") => Some(DeletionRequestStatus::Pending),
        Some("APPROVED") => Some(DeletionRequestStatus::Approved),
        Some("REJECTED") => Some(DeletionRequestStatus::Rejected),
        Some(other) => {
            return Err(AppError::ValidationError(format!(
                "Unknown status filter: {}",
                other
            )))
        }
    };

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);
    let (requests, total) = app_state
        .deletion_request_service
        .list(status, page, per_page)
        .await?;

    let meta = ResponseMeta::with_pagination(ResponsePaginationMeta {
        current_page: page,
        page_size: per_page,
        total_pages: total.div_ceil(per_page),
        total_items: total,
    });

    Ok(ApiResponse::success_with_meta(requests, meta))
}

pub async fn get_deletion_request_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<DeletionRequestDto>> {
    policy::require(&user, PolicyAction::ReviewDeletionRequests)?;

    let dto = app_state.deletion_request_service.get(id).await?;
    Ok(ApiResponse::success(dto))
}

/// Approve: transitions the request and soft-deletes the target user in
/// one transaction.
pub async fn approve_deletion_request_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<DeletionRequestDto>> {
    policy::require(&user, PolicyAction::ReviewDeletionRequests)?;

    let dto = app_state
        .deletion_request_service
        .approve(id, &user)
        .await?;

    Ok(ApiResponse::success(dto))
}

/// Reject with a mandatory reason; the target user is untouched.
pub async fn reject_deletion_request_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectDeletionRequestBody>,
) -> AppResult<ApiResponse<DeletionRequestDto>> {
    policy::require(&user, PolicyAction::ReviewDeletionRequests)?;
    request.validate()?;

    let dto = app_state
        .deletion_request_service
        .reject(id, &user, &request.reason)
        .await?;

    Ok(ApiResponse::success(dto))
}

/// Deletion-request workflow router.
pub fn deletion_request_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/gdpr/request-delete/{user_id}",
            post(create_deletion_request_handler),
        )
        .route("/gdpr/requests", get(list_deletion_requests_handler))
        .route("/gdpr/requests/{id}", get(get_deletion_request_handler))
        .route(
            "/gdpr/requests/{id}/approve",
            post(approve_deletion_request_handler),
        )
        .route(
            "/gdpr/requests/{id}/reject",
            post(reject_deletion_request_handler),
        )
        .with_state(app_state)
}
