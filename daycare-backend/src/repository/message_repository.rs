// src/repository/message_repository.rs
use crate::domain::message_model::{self, Entity as MessageEntity, Model as MessageModel};
use chrono::{DateTime, Utc};
use sea_orm::{entity::*, query::*, DatabaseTransaction, DbConn, DbErr};
use uuid::Uuid;

pub struct MessageRepository {
    db: DbConn,
}

impl MessageRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_by_sender(&self, sender_id: Uuid) -> Result<Vec<MessageModel>, DbErr> {
        MessageEntity::find()
            .filter(message_model::Column::SenderId.eq(sender_id))
            .filter(message_model::Column::DeletedAt.is_null())
            .order_by_desc(message_model::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    pub async fn find_expired_ids(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Uuid>, DbErr> {
        let rows = MessageEntity::find()
            .filter(message_model::Column::DeletedAt.is_not_null())
            .filter(message_model::Column::DeletedAt.lt(cutoff))
            .order_by_asc(message_model::Column::DeletedAt)
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
        let result = MessageEntity::delete_many()
            .filter(message_model::Column::Id.is_in(ids.iter().copied()))
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count_soft_deleted(&self) -> Result<u64, DbErr> {
        MessageEntity::find()
            .filter(message_model::Column::DeletedAt.is_not_null())
            .count(&self.db)
            .await
    }

    pub async fn count_overdue(&self, cutoff: DateTime<Utc>) -> Result<u64, DbErr> {
        MessageEntity::find()
            .filter(message_model::Column::DeletedAt.is_not_null())
            .filter(message_model::Column::DeletedAt.lt(cutoff))
            .count(&self.db)
            .await
    }
}

impl Clone for MessageRepository {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
