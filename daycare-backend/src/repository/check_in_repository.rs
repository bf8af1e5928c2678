// src/repository/check_in_repository.rs
use crate::domain::check_in_model::{self, Entity as CheckInEntity};
use chrono::{DateTime, Utc};
use sea_orm::{entity::*, query::*, DatabaseTransaction, DbConn, DbErr};
use uuid::Uuid;

/// 打刻記録は `deleted_at` を持たないため、`created_at` 基準で期限切れを
/// 判定する。
pub struct CheckInRepository {
    db: DbConn,
}

impl CheckInRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_expired_ids(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Uuid>, DbErr> {
        let rows = CheckInEntity::find()
            .filter(check_in_model::Column::CreatedAt.lt(cutoff))
            .order_by_asc(check_in_model::Column::CreatedAt)
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
        let result = CheckInEntity::delete_many()
            .filter(check_in_model::Column::Id.is_in(ids.iter().copied()))
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count_all(&self) -> Result<u64, DbErr> {
        CheckInEntity::find().count(&self.db).await
    }
}

impl Clone for CheckInRepository {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
