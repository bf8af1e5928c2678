// src/repository/activity_log_repository.rs
use crate::domain::activity_log_model::{self, Entity as ActivityLogEntity};
use chrono::{DateTime, Utc};
use sea_orm::{entity::*, query::*, DatabaseTransaction, DbConn, DbErr};
use uuid::Uuid;

pub struct ActivityLogRepository {
    db: DbConn,
}

impl ActivityLogRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_expired_ids(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Uuid>, DbErr> {
        let rows = ActivityLogEntity::find()
            .filter(activity_log_model::Column::CreatedAt.lt(cutoff))
            .order_by_asc(activity_log_model::Column::CreatedAt)
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
        let result = ActivityLogEntity::delete_many()
            .filter(activity_log_model::Column::Id.is_in(ids.iter().copied()))
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }
}

impl Clone for ActivityLogRepository {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
