// src/service/audit_log_service.rs
use crate::domain::audit_log_model::{AuditAction, AuditLogBuilder, Model as AuditLogModel};
use crate::error::AppResult;
use crate::log_with_context;
use crate::repository::audit_log_repository::{AuditLogFilter, AuditLogRepository};
use crate::repository::user_repository::UserRepository;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseTransaction;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// 監査ログ照会のパラメータ
#[derive(Debug, Clone, Default)]
pub struct AuditLogQuery {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub action: Option<String>,
    pub actor_name_contains: Option<String>,
    pub institution_id: Option<Uuid>,
}

pub struct AuditLogService {
    audit_log_repo: Arc<AuditLogRepository>,
    user_repo: Arc<UserRepository>,
}

impl AuditLogService {
    pub fn new(audit_log_repo: Arc<AuditLogRepository>, user_repo: Arc<UserRepository>) -> Self {
        Self {
            audit_log_repo,
            user_repo,
        }
    }

    /// Append an audit entry on its own connection. Only used for actions
    /// that have no enclosing transaction (e.g. read-only operations such
    /// as data export and backup verification).
    pub async fn record(
        &self,
        actor_id: Uuid,
        action: AuditAction,
        entity_type: impl Into<String>,
        entity_id: Option<Uuid>,
        details: impl Into<String>,
        institution_id: Option<Uuid>,
    ) -> AppResult<AuditLogModel> {
        let entry = build_entry(actor_id, action, entity_type, entity_id, details, institution_id);
        let model = self.audit_log_repo.create(entry).await?;

        log_with_context!(
            tracing::Level::INFO,
            "Audit log recorded",
            "actor_id" => actor_id,
            "action" => action.as_str(),
            "entity_type" => &model.entity_type
        );

        Ok(model)
    }

    /// Append an audit entry inside the caller's transaction.
    ///
    /// Every privacy-relevant mutation goes through here: if the insert
    /// fails the caller's transaction fails with it, so no mutation can
    /// commit without its audit row.
    pub async fn record_in(
        &self,
        txn: &DatabaseTransaction,
        actor_id: Uuid,
        action: AuditAction,
        entity_type: impl Into<String>,
        entity_id: Option<Uuid>,
        details: impl Into<String>,
        institution_id: Option<Uuid>,
    ) -> AppResult<AuditLogModel> {
        let entry = build_entry(actor_id, action, entity_type, entity_id, details, institution_id);
        let model = self.audit_log_repo.create_in(txn, entry).await?;
        Ok(model)
    }

    /// Filtered query, newest first.
    pub async fn query(&self, query: AuditLogQuery, limit: u64) -> AppResult<Vec<AuditLogDto>> {
        let actor_ids = match &query.actor_name_contains {
            Some(needle) => Some(self.user_repo.find_ids_by_name_contains(needle).await?),
            None => None,
        };

        let filter = AuditLogFilter {
            date_from: query.date_from,
            date_to: query.date_to,
            action: query.action,
            actor_ids,
            institution_id: query.institution_id,
        };

        let logs = self.audit_log_repo.find_filtered(&filter, limit).await?;
        Ok(logs.into_iter().map(AuditLogDto::from).collect())
    }
}

fn build_entry(
    actor_id: Uuid,
    action: AuditAction,
    entity_type: impl Into<String>,
    entity_id: Option<Uuid>,
    details: impl Into<String>,
    institution_id: Option<Uuid>,
) -> crate::domain::audit_log_model::ActiveModel {
    let mut builder = AuditLogBuilder::new(actor_id, action, entity_type).details(details);
    if let Some(id) = entity_id {
        builder = builder.entity_id(id);
    }
    if let Some(id) = institution_id {
        builder = builder.institution_id(id);
    }
    builder.build()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuditLogDto {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub details: Option<String>,
    pub institution_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogModel> for AuditLogDto {
    fn from(model: AuditLogModel) -> Self {
        Self {
            id: model.id,
            actor_id: model.user_id,
            action: model.action,
            entity_type: model.entity_type,
            entity_id: model.entity_id,
            details: model.details,
            institution_id: model.institution_id,
            created_at: model.created_at,
        }
    }
}
