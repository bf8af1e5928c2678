// src/service/purge_service.rs

//! Retention purge: permanent erasure of records past their retention
//! window, in dependency order (dependents strictly before owners).
//!
//! Each entity kind runs in its own transaction so one kind's failure
//! never rolls back progress on the others; a run is resumable by
//! construction because unpurged rows simply stay candidates for the
//! next invocation.

use crate::db::DbPool;
use crate::domain::audit_log_model::AuditAction;
use crate::domain::retention_policy::{retention_cutoff, EntityKind, PURGE_ORDER};
use crate::error::{AppError, AppResult};
use crate::log_with_context;
use crate::repository::activity_log_repository::ActivityLogRepository;
use crate::repository::audit_log_repository::AuditLogRepository;
use crate::repository::check_in_repository::CheckInRepository;
use crate::repository::child_repository::ChildRepository;
use crate::repository::closed_day_repository::ClosedDayRepository;
use crate::repository::failed_login_repository::FailedLoginRepository;
use crate::repository::group_repository::GroupRepository;
use crate::repository::institution_repository::InstitutionRepository;
use crate::repository::message_repository::MessageRepository;
use crate::repository::note_repository::NoteRepository;
use crate::repository::notification_repository::NotificationRepository;
use crate::repository::personal_task_repository::PersonalTaskRepository;
use crate::repository::user_repository::UserRepository;
use crate::service::audit_log_service::AuditLogService;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, TransactionTrait};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 1回の実行で1種別あたりに消す最大行数。巨大トランザクションを防ぐ。
pub const PURGE_BATCH_SIZE: u64 = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct PurgeKindResult {
    pub entity_type: EntityKind,
    pub purged: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurgeFailure {
    pub entity_type: EntityKind,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurgeRunSummary {
    pub purged: Vec<PurgeKindResult>,
    pub total_purged: u64,
    pub retention_months_override: Option<u32>,
    pub failures: Vec<PurgeFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A soft-deleted record awaiting permanent erasure.
#[derive(Debug, Clone, Serialize)]
pub struct PendingDeletionRecord {
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
    pub display_name: String,
    pub deleted_at: DateTime<Utc>,
    pub permanent_deletion_at: DateTime<Utc>,
    pub days_until_permanent_deletion: i64,
}

#[derive(Clone)]
pub struct PurgeService {
    db: DbPool,
    user_repo: Arc<UserRepository>,
    child_repo: Arc<ChildRepository>,
    group_repo: Arc<GroupRepository>,
    institution_repo: Arc<InstitutionRepository>,
    note_repo: Arc<NoteRepository>,
    message_repo: Arc<MessageRepository>,
    notification_repo: Arc<NotificationRepository>,
    personal_task_repo: Arc<PersonalTaskRepository>,
    closed_day_repo: Arc<ClosedDayRepository>,
    check_in_repo: Arc<CheckInRepository>,
    failed_login_repo: Arc<FailedLoginRepository>,
    activity_log_repo: Arc<ActivityLogRepository>,
    audit_log_repo: Arc<AuditLogRepository>,
    audit_log_service: Arc<AuditLogService>,
    /// Single-flight guard: only one purge run may be active at a time.
    run_lock: Arc<Mutex<()>>,
}

pub struct PurgeServiceRepos {
    pub user_repo: Arc<UserRepository>,
    pub child_repo: Arc<ChildRepository>,
    pub group_repo: Arc<GroupRepository>,
    pub institution_repo: Arc<InstitutionRepository>,
    pub note_repo: Arc<NoteRepository>,
    pub message_repo: Arc<MessageRepository>,
    pub notification_repo: Arc<NotificationRepository>,
    pub personal_task_repo: Arc<PersonalTaskRepository>,
    pub closed_day_repo: Arc<ClosedDayRepository>,
    pub check_in_repo: Arc<CheckInRepository>,
    pub failed_login_repo: Arc<FailedLoginRepository>,
    pub activity_log_repo: Arc<ActivityLogRepository>,
    pub audit_log_repo: Arc<AuditLogRepository>,
}

impl PurgeService {
    pub fn new(db: DbPool, repos: PurgeServiceRepos, audit_log_service: Arc<AuditLogService>) -> Self {
        Self {
            db,
            user_repo: repos.user_repo,
            child_repo: repos.child_repo,
            group_repo: repos.group_repo,
            institution_repo: repos.institution_repo,
            note_repo: repos.note_repo,
            message_repo: repos.message_repo,
            notification_repo: repos.notification_repo,
            personal_task_repo: repos.personal_task_repo,
            closed_day_repo: repos.closed_day_repo,
            check_in_repo: repos.check_in_repo,
            failed_login_repo: repos.failed_login_repo,
            activity_log_repo: repos.activity_log_repo,
            audit_log_repo: repos.audit_log_repo,
            audit_log_service,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Run one purge pass over every entity kind in `PURGE_ORDER`.
    ///
    /// `actor_id` is the invoking operator, or `Uuid::nil()` for the
    /// scheduled system run.
    pub async fn purge(
        &self,
        actor_id: Uuid,
        retention_months_override: Option<u32>,
    ) -> AppResult<PurgeRunSummary> {
        let _guard = self.run_lock.try_lock().map_err(|_| {
            AppError::Conflict("A purge run is already in progress".to_string())
        })?;

        if let Some(months) = retention_months_override {
            if months == 0 {
                return Err(AppError::ValidationError(
                    "retention_months must be at least 1".to_string(),
                ));
            }
        }

        let started_at = Utc::now();
        let mut purged = Vec::new();
        let mut failures = Vec::new();
        let mut total_purged: u64 = 0;

        for kind in PURGE_ORDER {
            let cutoff = retention_cutoff(kind, started_at, retention_months_override);
            match self.purge_kind(kind, cutoff).await {
                Ok(count) => {
                    total_purged += count;
                    purged.push(PurgeKindResult {
                        entity_type: kind,
                        purged: count,
                    });
                }
                Err(err) => {
                    // 他の種別のパージは継続する
                    warn!(
                        entity_type = kind.as_str(),
                        error = %err,
                        "Purge failed for entity type"
                    );
                    failures.push(PurgeFailure {
                        entity_type: kind,
                        error: err.to_string(),
                    });
                }
            }
        }

        let finished_at = Utc::now();
        let summary = PurgeRunSummary {
            purged,
            total_purged,
            retention_months_override,
            failures,
            started_at,
            finished_at,
        };

        // 実行全体の要約をひとつだけ記録する
        let details = serde_json::json!({
            "total_purged": summary.total_purged,
            "purged": summary
                .purged
                .iter()
                .map(|r| (r.entity_type.as_str(), r.purged))
                .collect::<std::collections::BTreeMap<_, _>>(),
            "failures": summary.failures.len(),
            "retention_months_override": summary.retention_months_override,
        })
        .to_string();

        self.audit_log_service
            .record(
                actor_id,
                AuditAction::RetentionCleanupRun,
                "retention_cleanup",
                None,
                details,
                None,
            )
            .await?;

        info!(
            total_purged = summary.total_purged,
            failures = summary.failures.len(),
            "Retention cleanup run completed"
        );

        Ok(summary)
    }

    /// Purge one kind in its own transaction.
    async fn purge_kind(&self, kind: EntityKind, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let ids = self.find_expired_ids(kind, cutoff).await?;
        if ids.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        match self.delete_ids_in(&txn, kind, &ids).await {
            Ok(deleted) => {
                txn.commit().await?;
                if deleted > 0 {
                    log_with_context!(
                        tracing::Level::INFO,
                        "Purged expired records",
                        "entity_type" => kind.as_str(),
                        "deleted" => deleted
                    );
                }
                Ok(deleted)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    error!(
                        error = %rollback_err,
                        entity_type = kind.as_str(),
                        "Failed to rollback purge transaction"
                    );
                }
                Err(err)
            }
        }
    }

    async fn find_expired_ids(
        &self,
        kind: EntityKind,
        cutoff: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>> {
        let ids = match kind {
            EntityKind::Institution => {
                self.institution_repo
                    .find_expired_ids(cutoff, PURGE_BATCH_SIZE)
                    .await?
            }
            EntityKind::Group => {
                self.group_repo
                    .find_expired_ids(cutoff, PURGE_BATCH_SIZE)
                    .await?
            }
            EntityKind::Child => {
                self.child_repo
                    .find_expired_ids(cutoff, PURGE_BATCH_SIZE)
                    .await?
            }
            EntityKind::User => {
                self.user_repo
                    .find_expired_ids(cutoff, PURGE_BATCH_SIZE)
                    .await?
            }
            EntityKind::Note => {
                self.note_repo
                    .find_expired_ids(cutoff, PURGE_BATCH_SIZE)
                    .await?
            }
            EntityKind::Message => {
                self.message_repo
                    .find_expired_ids(cutoff, PURGE_BATCH_SIZE)
                    .await?
            }
            EntityKind::Notification => {
                self.notification_repo
                    .find_expired_ids(cutoff, PURGE_BATCH_SIZE)
                    .await?
            }
            EntityKind::PersonalTask => {
                self.personal_task_repo
                    .find_expired_ids(cutoff, PURGE_BATCH_SIZE)
                    .await?
            }
            EntityKind::ClosedDay => {
                self.closed_day_repo
                    .find_expired_ids(cutoff, PURGE_BATCH_SIZE)
                    .await?
            }
            EntityKind::CheckIn => {
                self.check_in_repo
                    .find_expired_ids(cutoff, PURGE_BATCH_SIZE)
                    .await?
            }
            EntityKind::FailedLogin => {
                self.failed_login_repo
                    .find_expired_ids(cutoff, PURGE_BATCH_SIZE)
                    .await?
            }
            EntityKind::ActivityLog => {
                self.activity_log_repo
                    .find_expired_ids(cutoff, PURGE_BATCH_SIZE)
                    .await?
            }
            EntityKind::AuditLog => {
                self.audit_log_repo
                    .find_expired_ids(cutoff, PURGE_BATCH_SIZE)
                    .await?
            }
        };
        Ok(ids)
    }

    async fn delete_ids_in(
        &self,
        txn: &DatabaseTransaction,
        kind: EntityKind,
        ids: &[Uuid],
    ) -> AppResult<u64> {
        let deleted = match kind {
            EntityKind::Institution => self.institution_repo.delete_by_ids_in(txn, ids).await?,
            EntityKind::Group => self.group_repo.delete_by_ids_in(txn, ids).await?,
            EntityKind::Child => self.child_repo.delete_by_ids_in(txn, ids).await?,
            EntityKind::User => self.user_repo.delete_by_ids_in(txn, ids).await?,
            EntityKind::Note => self.note_repo.delete_by_ids_in(txn, ids).await?,
            EntityKind::Message => self.message_repo.delete_by_ids_in(txn, ids).await?,
            EntityKind::Notification => self.notification_repo.delete_by_ids_in(txn, ids).await?,
            EntityKind::PersonalTask => self.personal_task_repo.delete_by_ids_in(txn, ids).await?,
            EntityKind::ClosedDay => self.closed_day_repo.delete_by_ids_in(txn, ids).await?,
            EntityKind::CheckIn => self.check_in_repo.delete_by_ids_in(txn, ids).await?,
            EntityKind::FailedLogin => self.failed_login_repo.delete_by_ids_in(txn, ids).await?,
            EntityKind::ActivityLog => self.activity_log_repo.delete_by_ids_in(txn, ids).await?,
            EntityKind::AuditLog => self.audit_log_repo.delete_by_ids_in(txn, ids).await?,
        };
        Ok(deleted)
    }

    /// Soft-deleted records still inside their retention window, with the
    /// number of days left before they become purge candidates.
    pub async fn pending_deletions(&self) -> AppResult<Vec<PendingDeletionRecord>> {
        let now = Utc::now();
        let mut records = Vec::new();

        for user in self.user_repo.find_soft_deleted().await? {
            if let Some(deleted_at) = user.deleted_at {
                records.push(pending_record(
                    EntityKind::User,
                    user.id,
                    user.email,
                    deleted_at,
                    now,
                ));
            }
        }
        for child in self.child_repo.find_soft_deleted().await? {
            if let Some(deleted_at) = child.deleted_at {
                let name = format!("{} {}", child.first_name, child.last_name);
                records.push(pending_record(EntityKind::Child, child.id, name, deleted_at, now));
            }
        }
        for group in self.group_repo.find_soft_deleted().await? {
            if let Some(deleted_at) = group.deleted_at {
                records.push(pending_record(
                    EntityKind::Group,
                    group.id,
                    group.name,
                    deleted_at,
                    now,
                ));
            }
        }
        for institution in self.institution_repo.find_soft_deleted().await? {
            if let Some(deleted_at) = institution.deleted_at {
                records.push(pending_record(
                    EntityKind::Institution,
                    institution.id,
                    institution.name,
                    deleted_at,
                    now,
                ));
            }
        }

        records.sort_by_key(|r| r.days_until_permanent_deletion);
        Ok(records)
    }

    /// Spawn the recurring purge timer. Errors are logged, never fatal;
    /// a run that overlaps a manual invocation is skipped by the
    /// single-flight guard.
    pub fn spawn_scheduler(service: Arc<PurgeService>, interval_hours: u64) {
        if interval_hours == 0 {
            info!("Purge scheduler disabled (PURGE_INTERVAL_HOURS=0)");
            return;
        }

        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(interval_hours * 60 * 60));
            // 起動直後の即時実行はスキップする
            interval.tick().await;

            loop {
                interval.tick().await;
                match service.purge(Uuid::nil(), None).await {
                    Ok(summary) => {
                        info!(
                            total_purged = summary.total_purged,
                            "Scheduled purge run finished"
                        );
                    }
                    Err(AppError::Conflict(_)) => {
                        info!("Scheduled purge skipped: another run is in progress");
                    }
                    Err(err) => {
                        error!(error = %err, "Scheduled purge run failed");
                    }
                }
            }
        });
    }
}

fn pending_record(
    entity_type: EntityKind,
    entity_id: Uuid,
    display_name: String,
    deleted_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> PendingDeletionRecord {
    let permanent_deletion_at = deleted_at
        .checked_add_months(chrono::Months::new(entity_type.retention_months()))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    let days_until = (permanent_deletion_at - now).num_days().max(0);

    PendingDeletionRecord {
        entity_type,
        entity_id,
        display_name,
        deleted_at,
        permanent_deletion_at,
        days_until_permanent_deletion: days_until,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn pending_record_counts_days_until_cutoff() {
        let deleted_at = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 12, 10, 0, 0, 0).unwrap();
        // Group retention is 12 months: permanent deletion on 2027-01-10.
        let record = pending_record(
            EntityKind::Group,
            Uuid::new_v4(),
            "Sunflowers".to_string(),
            deleted_at,
            now,
        );
        assert_eq!(record.days_until_permanent_deletion, 31);
    }

    #[test]
    fn pending_record_clamps_overdue_to_zero() {
        let deleted_at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let record = pending_record(
            EntityKind::User,
            Uuid::new_v4(),
            "parent@example.com".to_string(),
            deleted_at,
            now,
        );
        assert_eq!(record.days_until_permanent_deletion, 0);
    }
}
