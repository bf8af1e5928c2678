// src/repository/user_repository.rs
use crate::domain::user_model::{self, Entity as UserEntity, Model as UserModel};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, DatabaseTransaction, DbConn, DbErr};
use uuid::Uuid;

pub struct UserRepository {
    db: DbConn,
}

impl UserRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    // デフォルトの読み取りは論理削除済みを除外する
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserModel>, DbErr> {
        UserEntity::find_by_id(id)
            .filter(user_model::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
    }

    /// Lifecycle paths need to see soft-deleted rows too.
    pub async fn find_by_id_include_deleted(&self, id: Uuid) -> Result<Option<UserModel>, DbErr> {
        UserEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn find_by_id_include_deleted_in(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> Result<Option<UserModel>, DbErr> {
        UserEntity::find_by_id(id).one(txn).await
    }

    /// Stamp `deleted_at` on a live row. Returns the number of rows
    /// affected; 0 means the row was missing or already marked.
    pub async fn mark_deleted_in(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = UserEntity::update_many()
            .col_expr(user_model::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(user_model::Column::UpdatedAt, Expr::value(now))
            .filter(user_model::Column::Id.eq(id))
            .filter(user_model::Column::DeletedAt.is_null())
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn find_soft_deleted(&self) -> Result<Vec<UserModel>, DbErr> {
        UserEntity::find()
            .filter(user_model::Column::DeletedAt.is_not_null())
            .order_by_asc(user_model::Column::DeletedAt)
            .all(&self.db)
            .await
    }

    pub async fn find_expired_ids(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Uuid>, DbErr> {
        let rows = UserEntity::find()
            .filter(user_model::Column::DeletedAt.is_not_null())
            .filter(user_model::Column::DeletedAt.lt(cutoff))
            .order_by_asc(user_model::Column::DeletedAt)
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
        let result = UserEntity::delete_many()
            .filter(user_model::Column::Id.is_in(ids.iter().copied()))
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count_soft_deleted(&self) -> Result<u64, DbErr> {
        UserEntity::find()
            .filter(user_model::Column::DeletedAt.is_not_null())
            .count(&self.db)
            .await
    }

    pub async fn count_overdue(&self, cutoff: DateTime<Utc>) -> Result<u64, DbErr> {
        UserEntity::find()
            .filter(user_model::Column::DeletedAt.is_not_null())
            .filter(user_model::Column::DeletedAt.lt(cutoff))
            .count(&self.db)
            .await
    }

    pub async fn count_all(&self) -> Result<u64, DbErr> {
        UserEntity::find().count(&self.db).await
    }

    // 監査ログの actor 名検索用
    pub async fn find_ids_by_name_contains(&self, needle: &str) -> Result<Vec<Uuid>, DbErr> {
        let rows = UserEntity::find()
            .filter(
                Condition::any()
                    .add(user_model::Column::FirstName.contains(needle))
                    .add(user_model::Column::LastName.contains(needle))
                    .add(user_model::Column::Email.contains(needle)),
            )
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|m| m.id).collect())
    }
}

impl Clone for UserRepository {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
