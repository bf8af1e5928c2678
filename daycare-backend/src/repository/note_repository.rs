// src/repository/note_repository.rs
use crate::domain::note_model::{self, Entity as NoteEntity, Model as NoteModel};
use chrono::{DateTime, Utc};
use sea_orm::{entity::*, query::*, DatabaseTransaction, DbConn, DbErr};
use uuid::Uuid;

pub struct NoteRepository {
    db: DbConn,
}

impl NoteRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    // データエクスポート用。削除済みは含めない。
    pub async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<NoteModel>, DbErr> {
        NoteEntity::find()
            .filter(note_model::Column::AuthorId.eq(author_id))
            .filter(note_model::Column::DeletedAt.is_null())
            .order_by_desc(note_model::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    pub async fn find_expired_ids(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Uuid>, DbErr> {
        let rows = NoteEntity::find()
            .filter(note_model::Column::DeletedAt.is_not_null())
            .filter(note_model::Column::DeletedAt.lt(cutoff))
            .order_by_asc(note_model::Column::DeletedAt)
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
        let result = NoteEntity::delete_many()
            .filter(note_model::Column::Id.is_in(ids.iter().copied()))
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count_soft_deleted(&self) -> Result<u64, DbErr> {
        NoteEntity::find()
            .filter(note_model::Column::DeletedAt.is_not_null())
            .count(&self.db)
            .await
    }

    pub async fn count_overdue(&self, cutoff: DateTime<Utc>) -> Result<u64, DbErr> {
        NoteEntity::find()
            .filter(note_model::Column::DeletedAt.is_not_null())
            .filter(note_model::Column::DeletedAt.lt(cutoff))
            .count(&self.db)
            .await
    }
}

impl Clone for NoteRepository {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
