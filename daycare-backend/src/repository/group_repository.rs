// src/repository/group_repository.rs
use crate::domain::group_model::{self, Entity as GroupEntity, Model as GroupModel};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, DatabaseTransaction, DbConn, DbErr};
use uuid::Uuid;

pub struct GroupRepository {
    db: DbConn,
}

impl GroupRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GroupModel>, DbErr> {
        GroupEntity::find_by_id(id)
            .filter(group_model::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
    }

    pub async fn find_by_id_include_deleted(&self, id: Uuid) -> Result<Option<GroupModel>, DbErr> {
        GroupEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn mark_deleted_in(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = GroupEntity::update_many()
            .col_expr(group_model::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(group_model::Column::UpdatedAt, Expr::value(now))
            .filter(group_model::Column::Id.eq(id))
            .filter(group_model::Column::DeletedAt.is_null())
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Active (non-deleted) group ids of an institution, read inside the
    /// cascade transaction so the marked set is consistent with the marks.
    pub async fn find_active_ids_by_institution_in(
        &self,
        txn: &DatabaseTransaction,
        institution_id: Uuid,
    ) -> Result<Vec<Uuid>, DbErr> {
        let rows = GroupEntity::find()
            .filter(group_model::Column::InstitutionId.eq(institution_id))
            .filter(group_model::Column::DeletedAt.is_null())
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
        let result = GroupEntity::update_many()
            .col_expr(group_model::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(group_model::Column::UpdatedAt, Expr::value(now))
            .filter(group_model::Column::Id.is_in(ids.iter().copied()))
            .filter(group_model::Column::DeletedAt.is_null())
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn find_soft_deleted(&self) -> Result<Vec<GroupModel>, DbErr> {
        GroupEntity::find()
            .filter(group_model::Column::DeletedAt.is_not_null())
            .order_by_asc(group_model::Column::DeletedAt)
            .all(&self.db)
            .await
    }

    pub async fn find_expired_ids(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Uuid>, DbErr> {
        let rows = GroupEntity::find()
            .filter(group_model::Column::DeletedAt.is_not_null())
            .filter(group_model::Column::DeletedAt.lt(cutoff))
            .order_by_asc(group_model::Column::DeletedAt)
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
        let result = GroupEntity::delete_many()
            .filter(group_model::Column::Id.is_in(ids.iter().copied()))
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count_soft_deleted(&self) -> Result<u64, DbErr> {
        GroupEntity::find()
            .filter(group_model::Column::DeletedAt.is_not_null())
            .count(&self.db)
            .await
    }

    pub async fn count_overdue(&self, cutoff: DateTime<Utc>) -> Result<u64, DbErr> {
        GroupEntity::find()
            .filter(group_model::Column::DeletedAt.is_not_null())
            .filter(group_model::Column::DeletedAt.lt(cutoff))
            .count(&self.db)
            .await
    }
}

impl Clone for GroupRepository {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
