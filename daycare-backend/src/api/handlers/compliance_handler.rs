// src/api/handlers/compliance_handler.rs

use crate::api::dto::compliance_dto::{
    AnomalyListResponse, ComplianceQueryParams, ComplianceScoreResponse,
    RecommendationListResponse,
};
use crate::api::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::policy::{self, PolicyAction};
use crate::service::backup_service::BackupVerification;
use crate::service::compliance_service::ComplianceReport;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Router,
};

use crate::types::ApiResponse;

const DEFAULT_PERIOD_DAYS: u32 = 30;

/// An admin sees its own institution's report; a super admin sees the
/// platform-wide one.
fn report_scope(user: &AuthenticatedUser) -> Option<uuid::Uuid> {
    if user.is_super_admin() {
        None
    } else {
        user.institution_id
    }
}

pub async fn compliance_report_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ComplianceQueryParams>,
) -> AppResult<ApiResponse<ComplianceReport>> {
    policy::require(&user, PolicyAction::ViewCompliance)?;

    let report = app_state
        .compliance_service
        .generate_report(
            report_scope(&user),
            params.days.unwrap_or(DEFAULT_PERIOD_DAYS),
        )
        .await?;

    Ok(ApiResponse::success(report))
}

pub async fn anomaly_detection_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ComplianceQueryParams>,
) -> AppResult<ApiResponse<AnomalyListResponse>> {
    policy::require(&user, PolicyAction::ViewCompliance)?;

    let report = app_state
        .compliance_service
        .generate_report(
            report_scope(&user),
            params.days.unwrap_or(DEFAULT_PERIOD_DAYS),
        )
        .await?;

    let total = report.anomalies.len();
    Ok(ApiResponse::success(AnomalyListResponse {
        anomalies: report.anomalies,
        total,
    }))
}

pub async fn recommendations_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ComplianceQueryParams>,
) -> AppResult<ApiResponse<RecommendationListResponse>> {
    policy::require(&user, PolicyAction::ViewCompliance)?;

    let report = app_state
        .compliance_service
        .generate_report(
            report_scope(&user),
            params.days.unwrap_or(DEFAULT_PERIOD_DAYS),
        )
        .await?;

    let total = report.recommendations.len();
    Ok(ApiResponse::success(RecommendationListResponse {
        recommendations: report.recommendations,
        total,
    }))
}

pub async fn compliance_score_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ComplianceQueryParams>,
) -> AppResult<ApiResponse<ComplianceScoreResponse>> {
    policy::require(&user, PolicyAction::ViewCompliance)?;

    let report = app_state
        .compliance_service
        .generate_report(
            report_scope(&user),
            params.days.unwrap_or(DEFAULT_PERIOD_DAYS),
        )
        .await?;

    Ok(ApiResponse::success(ComplianceScoreResponse {
        compliance_score: report.compliance_score,
        generated_at: report.generated_at,
    }))
}

pub async fn verify_backup_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<ApiResponse<BackupVerification>> {
    policy::require(&user, PolicyAction::VerifyBackup)?;

    let verification = app_state.backup_service.verify(user.user_id).await?;
    Ok(ApiResponse::success(verification))
}

/// Compliance analytics router.
pub fn compliance_router(app_state: AppState) -> Router {
    Router::new()
        .route("/gdpr/compliance-report", get(compliance_report_handler))
        .route("/gdpr/anomaly-detection", get(anomaly_detection_handler))
        .route("/gdpr/recommendations", get(recommendations_handler))
        .route("/gdpr/compliance-score", get(compliance_score_handler))
        .route("/gdpr/verify-backup", post(verify_backup_handler))
        .with_state(app_state)
}
