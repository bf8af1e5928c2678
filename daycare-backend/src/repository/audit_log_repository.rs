// src/repository/audit_log_repository.rs
use crate::domain::audit_log_model::{
    self, ActiveModel as AuditLogActiveModel, Entity as AuditLogEntity, Model as AuditLogModel,
};
use chrono::{DateTime, Utc};
use sea_orm::{entity::*, query::*, DatabaseTransaction, DbConn, DbErr};
use uuid::Uuid;

/// クエリフィルター。全てオプショナル。
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub action: Option<String>,
    /// Pre-resolved actor ids (e.g. from a name search). An empty vector
    /// matches nothing.
    pub actor_ids: Option<Vec<Uuid>>,
    pub institution_id: Option<Uuid>,
}

pub struct AuditLogRepository {
    db: DbConn,
}

impl AuditLogRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    // 監査ログの作成（単独トランザクション）
    pub async fn create(&self, audit_log: AuditLogActiveModel) -> Result<AuditLogModel, DbErr> {
        audit_log.insert(&self.db).await
    }

    /// Insert inside the caller's transaction. Privacy-relevant mutations
    /// call this so the audit row commits or rolls back with them.
    pub async fn create_in(
        &self,
        txn: &DatabaseTransaction,
        audit_log: AuditLogActiveModel,
    ) -> Result<AuditLogModel, DbErr> {
        audit_log.insert(txn).await
    }

    // フィルター付きで新しい順に取得
    pub async fn find_filtered(
        &self,
        filter: &AuditLogFilter,
        limit: u64,
    ) -> Result<Vec<AuditLogModel>, DbErr> {
        let mut query = AuditLogEntity::find();

        if let Some(from) = filter.date_from {
            query = query.filter(audit_log_model::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(audit_log_model::Column::CreatedAt.lte(to));
        }
        if let Some(action) = &filter.action {
            query = query.filter(audit_log_model::Column::Action.eq(action.clone()));
        }
        if let Some(actor_ids) = &filter.actor_ids {
            query = query.filter(audit_log_model::Column::UserId.is_in(actor_ids.iter().copied()));
        }
        if let Some(institution_id) = filter.institution_id {
            query = query.filter(audit_log_model::Column::InstitutionId.eq(institution_id));
        }

        query
            .order_by_desc(audit_log_model::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }

    // 期間内のエントリを全件取得（コンプライアンス集計用）
    pub async fn find_in_period(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        institution_id: Option<Uuid>,
    ) -> Result<Vec<AuditLogModel>, DbErr> {
        let mut query = AuditLogEntity::find()
            .filter(audit_log_model::Column::CreatedAt.gte(from))
            .filter(audit_log_model::Column::CreatedAt.lte(to));

        if let Some(institution_id) = institution_id {
            query = query.filter(audit_log_model::Column::InstitutionId.eq(institution_id));
        }

        query
            .order_by_asc(audit_log_model::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    pub async fn count(&self) -> Result<u64, DbErr> {
        AuditLogEntity::find().count(&self.db).await
    }

    // 保持期間を過ぎたエントリのID（パージ用バッチ）
    pub async fn find_expired_ids(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Uuid>, DbErr> {
        let rows = AuditLogEntity::find()
            .filter(audit_log_model::Column::CreatedAt.lt(cutoff))
            .order_by_asc(audit_log_model::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|m| m.id).collect())
    }

    pub async fn delete_by_ids_in(
        &self,
        txn: &DatabaseTransaction,
        ids: &[Uuid],
    ) -> Result<u64, DbErr> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = AuditLogEntity::delete_many()
            .filter(audit_log_model::Column::Id.is_in(ids.iter().copied()))
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }
}

impl Clone for AuditLogRepository {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
