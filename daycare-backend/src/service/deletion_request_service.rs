// src/service/deletion_request_service.rs

//! Deletion-request workflow: PENDING → APPROVED | REJECTED.
//!
//! Approval transitions the request and soft-deletes the target user in
//! one transaction (two audit entries: request-approved + user-deleted).
//! Rejection never touches the target.

use crate::db::DbPool;
use crate::domain::audit_log_model::AuditAction;
use crate::domain::deletion_request_model::{
    append_rejection, ActiveModel as DeletionRequestActiveModel, DeletionRequestStatus,
    Model as DeletionRequestModel,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::repository::deletion_request_repository::DeletionRequestRepository;
use crate::repository::user_repository::UserRepository;
use crate::service::audit_log_service::AuditLogService;
use crate::service::soft_delete_service::SoftDeleteService;
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{DatabaseTransaction, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct DeletionRequestService {
    db: DbPool,
    request_repo: Arc<DeletionRequestRepository>,
    user_repo: Arc<UserRepository>,
    soft_delete_service: Arc<SoftDeleteService>,
    audit_log_service: Arc<AuditLogService>,
}

impl DeletionRequestService {
    pub fn new(
        db: DbPool,
        request_repo: Arc<DeletionRequestRepository>,
        user_repo: Arc<UserRepository>,
        soft_delete_service: Arc<SoftDeleteService>,
        audit_log_service: Arc<AuditLogService>,
    ) -> Self {
        Self {
            db,
            request_repo,
            user_repo,
            soft_delete_service,
            audit_log_service,
        }
    }

    /// Create a PENDING request for a target user.
    ///
    /// The duplicate-pending check runs inside the same transaction that
    /// inserts the row; together with the partial unique index on
    /// `(target_user_id) WHERE status = 'pending'` this closes the race
    /// between two concurrent creates.
    pub async fn create(
        &self,
        target_user_id: Uuid,
        requester_id: Uuid,
        reason: &str,
    ) -> AppResult<DeletionRequestDto> {
        if reason.trim().is_empty() {
            return Err(AppError::ValidationError(
                "A reason is required for a deletion request".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let result: AppResult<DeletionRequestModel> = async {
            let user = self
                .user_repo
                .find_by_id_include_deleted_in(&txn, target_user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Target user not found".to_string()))?;
            if user.deleted_at.is_some() {
                return Err(AppError::NotFound(
                    "Target user is already marked for deletion".to_string(),
                ));
            }

            if self
                .request_repo
                .find_pending_by_target_in(&txn, target_user_id)
                .await?
                .is_some()
            {
                return Err(AppError::Conflict(
                    "A pending deletion request already exists for this user".to_string(),
                ));
            }

            let now = Utc::now();
            let request = self
                .request_repo
                .create_in(
                    &txn,
                    DeletionRequestActiveModel {
                        id: Set(Uuid::new_v4()),
                        target_user_id: Set(target_user_id),
                        requester_id: Set(requester_id),
                        reason: Set(reason.trim().to_string()),
                        status: Set(DeletionRequestStatus::Pending),
                        reviewer_id: Set(None),
                        reviewed_at: Set(None),
                        created_at: Set(now),
                        updated_at: Set(now),
                    },
                )
                .await?;

            self.audit_log_service
                .record_in(
                    &txn,
                    requester_id,
                    AuditAction::GdprDeleteRequestCreated,
                    "deletion_request",
                    Some(request.id),
                    serde_json::json!({
                        "target_user_id": target_user_id,
                        "reason": reason.trim(),
                    })
                    .to_string(),
                    user.institution_id,
                )
                .await?;

            Ok(request)
        }
        .await;

        match result {
            Ok(request) => {
                txn.commit().await?;
                info!(request_id = %request.id, target_user_id = %target_user_id, "Deletion request created");
                Ok(DeletionRequestDto::from(request))
            }
            Err(err) => {
                rollback(txn).await;
                Err(err)
            }
        }
    }

    /// Approve a PENDING request: stamp the reviewer, transition to
    /// APPROVED and cascade-delete the target user, all in one
    /// transaction.
    pub async fn approve(
        &self,
        request_id: Uuid,
        reviewer: &AuthenticatedUser,
    ) -> AppResult<DeletionRequestDto> {
        let txn = self.db.begin().await?;
        let result: AppResult<DeletionRequestModel> = async {
            let request = self.load_pending(&txn, request_id).await?;
            let now = Utc::now();

            let updated = self
                .request_repo
                .update_in(
                    &txn,
                    DeletionRequestActiveModel {
                        id: Set(request.id),
                        status: Set(DeletionRequestStatus::Approved),
                        reviewer_id: Set(Some(reviewer.user_id)),
                        reviewed_at: Set(Some(now)),
                        updated_at: Set(now),
                        ..Default::default()
                    },
                )
                .await?;

            self.audit_log_service
                .record_in(
                    &txn,
                    reviewer.user_id,
                    AuditAction::GdprDeleteRequestApproved,
                    "deletion_request",
                    Some(request.id),
                    serde_json::json!({ "target_user_id": request.target_user_id }).to_string(),
                    None,
                )
                .await?;

            // 承認と同一トランザクションで対象ユーザーを論理削除する。
            // ユーザー削除そのものの監査エントリはカスケード側が書く。
            self.soft_delete_service
                .cascade_user_in(&txn, request.target_user_id, reviewer, &request.reason)
                .await?;

            Ok(updated)
        }
        .await;

        match result {
            Ok(request) => {
                txn.commit().await?;
                info!(request_id = %request.id, "Deletion request approved");
                Ok(DeletionRequestDto::from(request))
            }
            Err(err) => {
                rollback(txn).await;
                Err(err)
            }
        }
    }

    /// Reject a PENDING request with a non-empty reason, appended to the
    /// stored reason with the fixed separator. The target user is never
    /// touched.
    pub async fn reject(
        &self,
        request_id: Uuid,
        reviewer: &AuthenticatedUser,
        reason: &str,
    ) -> AppResult<DeletionRequestDto> {
        if reason.trim().is_empty() {
            return Err(AppError::ValidationError(
                "A reason is required to reject a deletion request".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let result: AppResult<DeletionRequestModel> = async {
            let request = self.load_pending(&txn, request_id).await?;
            let now = Utc::now();
            let combined_reason = append_rejection(&request.reason, reason);

            let updated = self
                .request_repo
                .update_in(
                    &txn,
                    DeletionRequestActiveModel {
                        id: Set(request.id),
                        status: Set(DeletionRequestStatus::Rejected),
                        reason: Set(combined_reason),
                        reviewer_id: Set(Some(reviewer.user_id)),
                        reviewed_at: Set(Some(now)),
                        updated_at: Set(now),
                        ..Default::default()
                    },
                )
                .await?;

            self.audit_log_service
                .record_in(
                    &txn,
                    reviewer.user_id,
                    AuditAction::GdprDeleteRequestRejected,
                    "deletion_request",
                    Some(request.id),
                    serde_json::json!({
                        "target_user_id": request.target_user_id,
                        "rejection_reason": reason.trim(),
                    })
                    .to_string(),
                    None,
                )
                .await?;

            Ok(updated)
        }
        .await;

        match result {
            Ok(request) => {
                txn.commit().await?;
                info!(request_id = %request.id, "Deletion request rejected");
                Ok(DeletionRequestDto::from(request))
            }
            Err(err) => {
                rollback(txn).await;
                Err(err)
            }
        }
    }

    pub async fn get(&self, request_id: Uuid) -> AppResult<DeletionRequestDto> {
        let request = self
            .request_repo
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Deletion request not found".to_string()))?;
        Ok(DeletionRequestDto::from(request))
    }

    pub async fn list(
        &self,
        status: Option<DeletionRequestStatus>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<DeletionRequestDto>, u64)> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        let (rows, total) = self.request_repo.find_page(status, page, per_page).await?;
        Ok((rows.into_iter().map(DeletionRequestDto::from).collect(), total))
    }

    async fn load_pending(
        &self,
        txn: &DatabaseTransaction,
        request_id: Uuid,
    ) -> AppResult<DeletionRequestModel> {
        let request = self
            .request_repo
            .find_by_id_in(txn, request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Deletion request not found".to_string()))?;

        if request.status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "Deletion request is not pending (status: {:?})",
                request.status
            )));
        }

        Ok(request)
    }
}

async fn rollback(txn: DatabaseTransaction) {
    if let Err(err) = txn.rollback().await {
        tracing::error!(error = %err, "Failed to rollback deletion-request transaction");
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletionRequestDto {
    pub id: Uuid,
    pub target_user_id: Uuid,
    pub requester_id: Uuid,
    pub reason: String,
    pub status: DeletionRequestStatus,
    pub reviewer_id: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DeletionRequestModel> for DeletionRequestDto {
    fn from(model: DeletionRequestModel) -> Self {
        Self {
            id: model.id,
            target_user_id: model.target_user_id,
            requester_id: model.requester_id,
            reason: model.reason,
            status: model.status,
            reviewer_id: model.reviewer_id,
            reviewed_at: model.reviewed_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
