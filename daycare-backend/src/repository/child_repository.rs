// src/repository/child_repository.rs
use crate::domain::child_model::{self, Entity as ChildEntity, Model as ChildModel};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, DatabaseTransaction, DbConn, DbErr};
use uuid::Uuid;

pub struct ChildRepository {
    db: DbConn,
}

impl ChildRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ChildModel>, DbErr> {
        ChildEntity::find_by_id(id)
            .filter(child_model::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
    }

    pub async fn find_by_id_include_deleted(&self, id: Uuid) -> Result<Option<ChildModel>, DbErr> {
        ChildEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn mark_deleted_in(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = ChildEntity::update_many()
            .col_expr(child_model::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(child_model::Column::UpdatedAt, Expr::value(now))
            .filter(child_model::Column::Id.eq(id))
            .filter(child_model::Column::DeletedAt.is_null())
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Active child ids of the given groups, read inside the cascade
    /// transaction.
    pub async fn find_active_ids_by_group_ids_in(
        &self,
        txn: &DatabaseTransaction,
        group_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, DbErr> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = ChildEntity::find()
            .filter(child_model::Column::GroupId.is_in(group_ids.iter().copied()))
            .filter(child_model::Column::DeletedAt.is_null())
            .all(txn)
            .await?;
        Ok(rows.into_iter().map(|m| m.id).collect())
    }

    pub async fn mark_deleted_by_ids_in(
        &self,
        txn: &DatabaseTransaction,
        ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = ChildEntity::update_many()
            .col_expr(child_model::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(child_model::Column::UpdatedAt, Expr::value(now))
            .filter(child_model::Column::Id.is_in(ids.iter().copied()))
            .filter(child_model::Column::DeletedAt.is_null())
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }

    // グループ削除の前提条件チェックに使う
    pub async fn count_active_by_group(&self, group_id: Uuid) -> Result<u64, DbErr> {
        ChildEntity::find()
            .filter(child_model::Column::GroupId.eq(group_id))
            .filter(child_model::Column::DeletedAt.is_null())
            .count(&self.db)
            .await
    }

    pub async fn find_soft_deleted(&self) -> Result<Vec<ChildModel>, DbErr> {
        ChildEntity::find()
            .filter(child_model::Column::DeletedAt.is_not_null())
            .order_by_asc(child_model::Column::DeletedAt)
            .all(&self.db)
            .await
    }

    pub async fn find_expired_ids(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Uuid>, DbErr> {
        let rows = ChildEntity::find()
            .filter(child_model::Column::DeletedAt.is_not_null())
            .filter(child_model::Column::DeletedAt.lt(cutoff))
            .order_by_asc(child_model::Column::DeletedAt)
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
        let result = ChildEntity::delete_many()
            .filter(child_model::Column::Id.is_in(ids.iter().copied()))
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count_soft_deleted(&self) -> Result<u64, DbErr> {
        ChildEntity::find()
            .filter(child_model::Column::DeletedAt.is_not_null())
            .count(&self.db)
            .await
    }

    pub async fn count_overdue(&self, cutoff: DateTime<Utc>) -> Result<u64, DbErr> {
        ChildEntity::find()
            .filter(child_model::Column::DeletedAt.is_not_null())
            .filter(child_model::Column::DeletedAt.lt(cutoff))
            .count(&self.db)
            .await
    }

    pub async fn count_all(&self) -> Result<u64, DbErr> {
        ChildEntity::find().count(&self.db).await
    }
}

impl Clone for ChildRepository {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
