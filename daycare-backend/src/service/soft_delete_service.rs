// src/service/soft_delete_service.rs

//! Soft-delete cascades.
//!
//! Marking order for a cascade is owners before dependents
//! (`INSTITUTION_CASCADE_ORDER`), so a half-marked subtree is never
//! reachable through a live parent. Every cascade commits its marks and
//! its single audit entry in one transaction.

use crate::db::DbPool;
use crate::domain::audit_log_model::AuditAction;
use crate::domain::retention_policy::EntityKind;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::policy;
use crate::repository::child_repository::ChildRepository;
use crate::repository::group_repository::GroupRepository;
use crate::repository::institution_repository::InstitutionRepository;
use crate::repository::user_repository::UserRepository;
use crate::service::audit_log_service::AuditLogService;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, TransactionTrait};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// A dependent record marked alongside the primary target.
#[derive(Debug, Clone, Serialize)]
pub struct CascadedRecord {
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
}

/// Result of one top-level soft-delete call.
#[derive(Debug, Clone, Serialize)]
pub struct CascadeOutcome {
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
    pub deleted_at: Option<DateTime<Utc>>,
    /// True when the target was already marked and the call was an
    /// idempotent no-op (Group / Institution only).
    pub already_deleted: bool,
    pub cascaded: Vec<CascadedRecord>,
}

impl CascadeOutcome {
    fn new(entity_type: EntityKind, entity_id: Uuid, deleted_at: DateTime<Utc>) -> Self {
        Self {
            entity_type,
            entity_id,
            deleted_at: Some(deleted_at),
            already_deleted: false,
            cascaded: Vec::new(),
        }
    }

    fn noop(entity_type: EntityKind, entity_id: Uuid, deleted_at: Option<DateTime<Utc>>) -> Self {
        Self {
            entity_type,
            entity_id,
            deleted_at,
            already_deleted: true,
            cascaded: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct SoftDeleteService {
    db: DbPool,
    user_repo: Arc<UserRepository>,
    child_repo: Arc<ChildRepository>,
    group_repo: Arc<GroupRepository>,
    institution_repo: Arc<InstitutionRepository>,
    audit_log_service: Arc<AuditLogService>,
}

impl SoftDeleteService {
    pub fn new(
        db: DbPool,
        user_repo: Arc<UserRepository>,
        child_repo: Arc<ChildRepository>,
        group_repo: Arc<GroupRepository>,
        institution_repo: Arc<InstitutionRepository>,
        audit_log_service: Arc<AuditLogService>,
    ) -> Self {
        Self {
            db,
            user_repo,
            child_repo,
            group_repo,
            institution_repo,
            audit_log_service,
        }
    }

    /// Soft-delete a user account. Repeating the call on an already
    /// deleted user is an error (unlike the container types below).
    /// The user's notes, messages and tasks are left untouched; each runs
    /// on its own retention clock.
    pub async fn soft_delete_user(
        &self,
        id: Uuid,
        actor: &AuthenticatedUser,
        reason: &str,
    ) -> AppResult<CascadeOutcome> {
        let txn = self.db.begin().await?;
        match self.cascade_user_in(&txn, id, actor, reason).await {
            Ok(outcome) => {
                txn.commit().await?;
                info!(user_id = %id, actor_id = %actor.user_id, "User soft-deleted");
                Ok(outcome)
            }
            Err(err) => {
                rollback(txn).await;
                Err(err)
            }
        }
    }

    /// Cascade body for a user, running inside the caller's transaction.
    /// Also used by the deletion-request workflow so that approval and
    /// deletion commit together.
    pub async fn cascade_user_in(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
        actor: &AuthenticatedUser,
        reason: &str,
    ) -> AppResult<CascadeOutcome> {
        let user = self
            .user_repo
            .find_by_id_include_deleted_in(txn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        policy::require_institution_scope(actor, user.institution_id)?;

        if user.deleted_at.is_some() {
            return Err(AppError::AlreadyDeleted(
                "User is already marked for deletion".to_string(),
            ));
        }

        let now = Utc::now();
        let marked = self.user_repo.mark_deleted_in(txn, id, now).await?;
        if marked == 0 {
            // 同時実行で先に削除された場合
            return Err(AppError::AlreadyDeleted(
                "User is already marked for deletion".to_string(),
            ));
        }

        self.audit_log_service
            .record_in(
                txn,
                actor.user_id,
                AuditAction::UserSoftDeleted,
                EntityKind::User.as_str(),
                Some(id),
                serde_json::json!({ "reason": reason }).to_string(),
                user.institution_id,
            )
            .await?;

        Ok(CascadeOutcome::new(EntityKind::User, id, now))
    }

    /// Soft-delete a child record. Same strictness as user targets.
    pub async fn soft_delete_child(
        &self,
        id: Uuid,
        actor: &AuthenticatedUser,
        reason: &str,
    ) -> AppResult<CascadeOutcome> {
        let child = self
            .child_repo
            .find_by_id_include_deleted(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Child not found".to_string()))?;

        policy::require_institution_scope(actor, child.institution_id)?;

        if child.deleted_at.is_some() {
            return Err(AppError::AlreadyDeleted(
                "Child is already marked for deletion".to_string(),
            ));
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;
        let result: AppResult<()> = async {
            self.child_repo.mark_deleted_in(&txn, id, now).await?;
            self.audit_log_service
                .record_in(
                    &txn,
                    actor.user_id,
                    AuditAction::ChildSoftDeleted,
                    EntityKind::Child.as_str(),
                    Some(id),
                    serde_json::json!({ "reason": reason }).to_string(),
                    child.institution_id,
                )
                .await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                txn.commit().await?;
                Ok(CascadeOutcome::new(EntityKind::Child, id, now))
            }
            Err(err) => {
                rollback(txn).await;
                Err(err)
            }
        }
    }

    /// Soft-delete a group. Idempotent: an already deleted group returns
    /// success without a state change or a new audit entry.
    ///
    /// Precondition (enforced by the calling path): the group has no
    /// non-deleted children.
    pub async fn soft_delete_group(
        &self,
        id: Uuid,
        actor: &AuthenticatedUser,
        reason: &str,
    ) -> AppResult<CascadeOutcome> {
        let group = self
            .group_repo
            .find_by_id_include_deleted(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;

        policy::require_institution_scope(actor, group.institution_id)?;

        if group.deleted_at.is_some() {
            return Ok(CascadeOutcome::noop(EntityKind::Group, id, group.deleted_at));
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;
        let result: AppResult<()> = async {
            self.group_repo.mark_deleted_in(&txn, id, now).await?;
            self.audit_log_service
                .record_in(
                    &txn,
                    actor.user_id,
                    AuditAction::GroupSoftDeleted,
                    EntityKind::Group.as_str(),
                    Some(id),
                    serde_json::json!({ "reason": reason }).to_string(),
                    group.institution_id,
                )
                .await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                txn.commit().await?;
                Ok(CascadeOutcome::new(EntityKind::Group, id, now))
            }
            Err(err) => {
                rollback(txn).await;
                Err(err)
            }
        }
    }

    /// Soft-delete an institution and cascade to its groups and their
    /// children, in that order, in a single transaction. Idempotent like
    /// group deletion.
    pub async fn soft_delete_institution(
        &self,
        id: Uuid,
        actor: &AuthenticatedUser,
        reason: &str,
    ) -> AppResult<CascadeOutcome> {
        let institution = self
            .institution_repo
            .find_by_id_include_deleted(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Institution not found".to_string()))?;

        policy::require_institution_scope(actor, Some(institution.id))?;

        if institution.deleted_at.is_some() {
            return Ok(CascadeOutcome::noop(
                EntityKind::Institution,
                id,
                institution.deleted_at,
            ));
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;
        let result: AppResult<Vec<CascadedRecord>> = async {
            self.institution_repo.mark_deleted_in(&txn, id, now).await?;

            // グループ → 園児の順にマークする
            let group_ids = self
                .group_repo
                .find_active_ids_by_institution_in(&txn, id)
                .await?;
            let child_ids = self
                .child_repo
                .find_active_ids_by_group_ids_in(&txn, &group_ids)
                .await?;

            self.group_repo
                .mark_deleted_by_ids_in(&txn, &group_ids, now)
                .await?;
            self.child_repo
                .mark_deleted_by_ids_in(&txn, &child_ids, now)
                .await?;

            self.audit_log_service
                .record_in(
                    &txn,
                    actor.user_id,
                    AuditAction::InstitutionSoftDeleted,
                    EntityKind::Institution.as_str(),
                    Some(id),
                    serde_json::json!({
                        "reason": reason,
                        "cascaded_groups": group_ids.len(),
                        "cascaded_children": child_ids.len(),
                    })
                    .to_string(),
                    Some(id),
                )
                .await?;

            let mut cascaded: Vec<CascadedRecord> = group_ids
                .into_iter()
                .map(|group_id| CascadedRecord {
                    entity_type: EntityKind::Group,
                    entity_id: group_id,
                })
                .collect();
            cascaded.extend(child_ids.into_iter().map(|child_id| CascadedRecord {
                entity_type: EntityKind::Child,
                entity_id: child_id,
            }));

            Ok(cascaded)
        }
        .await;

        match result {
            Ok(cascaded) => {
                txn.commit().await?;
                info!(
                    institution_id = %id,
                    cascaded = cascaded.len(),
                    "Institution soft-deleted with cascade"
                );
                Ok(CascadeOutcome {
                    cascaded,
                    ..CascadeOutcome::new(EntityKind::Institution, id, now)
                })
            }
            Err(err) => {
                rollback(txn).await;
                Err(err)
            }
        }
    }

    /// Group-deletion precondition: refuse while non-deleted children
    /// remain in the group.
    pub async fn ensure_group_has_no_active_children(&self, group_id: Uuid) -> AppResult<()> {
        let active = self.child_repo.count_active_by_group(group_id).await?;
        if active > 0 {
            return Err(AppError::Conflict(format!(
                "Group still has {} active children",
                active
            )));
        }
        Ok(())
    }
}

async fn rollback(txn: DatabaseTransaction) {
    if let Err(err) = txn.rollback().await {
        tracing::error!(error = %err, "Failed to rollback soft-delete transaction");
    }
}
