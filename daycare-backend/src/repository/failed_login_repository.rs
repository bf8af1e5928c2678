// src/repository/failed_login_repository.rs
use crate::domain::failed_login_model::{self, Entity as FailedLoginEntity};
use chrono::{DateTime, Utc};
use sea_orm::{entity::*, query::*, DatabaseTransaction, DbConn, DbErr};
use uuid::Uuid;

pub struct FailedLoginRepository {
    db: DbConn,
}

impl FailedLoginRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_expired_ids(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Uuid>, DbErr> {
        let rows = FailedLoginEntity::find()
            .filter(failed_login_model::Column::CreatedAt.lt(cutoff))
            .order_by_asc(failed_login_model::Column::CreatedAt)
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
        let result = FailedLoginEntity::delete_many()
            .filter(failed_login_model::Column::Id.is_in(ids.iter().copied()))
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }
}

impl Clone for FailedLoginRepository {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
