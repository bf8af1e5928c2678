// src/repository/institution_repository.rs
use crate::domain::institution_model::{
    self, Entity as InstitutionEntity, Model as InstitutionModel,
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, DatabaseTransaction, DbConn, DbErr};
use uuid::Uuid;

pub struct InstitutionRepository {
    db: DbConn,
}

impl InstitutionRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<InstitutionModel>, DbErr> {
        InstitutionEntity::find_by_id(id)
            .filter(institution_model::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
    }

    pub async fn find_by_id_include_deleted(
        &self,
        id: Uuid,
    ) -> Result<Option<InstitutionModel>, DbErr> {
        InstitutionEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn mark_deleted_in(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = InstitutionEntity::update_many()
            .col_expr(institution_model::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(institution_model::Column::UpdatedAt, Expr::value(now))
            .filter(institution_model::Column::Id.eq(id))
            .filter(institution_model::Column::DeletedAt.is_null())
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn find_soft_deleted(&self) -> Result<Vec<InstitutionModel>, DbErr> {
        InstitutionEntity::find()
            .filter(institution_model::Column::DeletedAt.is_not_null())
            .order_by_asc(institution_model::Column::DeletedAt)
            .all(&self.db)
            .await
    }

    pub async fn find_expired_ids(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Uuid>, DbErr> {
        let rows = InstitutionEntity::find()
            .filter(institution_model::Column::DeletedAt.is_not_null())
            .filter(institution_model::Column::DeletedAt.lt(cutoff))
            .order_by_asc(institution_model::Column::DeletedAt)
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
        let result = InstitutionEntity::delete_many()
            .filter(institution_model::Column::Id.is_in(ids.iter().copied()))
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count_soft_deleted(&self) -> Result<u64, DbErr> {
        InstitutionEntity::find()
            .filter(institution_model::Column::DeletedAt.is_not_null())
            .count(&self.db)
            .await
    }

    pub async fn count_overdue(&self, cutoff: DateTime<Utc>) -> Result<u64, DbErr> {
        InstitutionEntity::find()
            .filter(institution_model::Column::DeletedAt.is_not_null())
            .filter(institution_model::Column::DeletedAt.lt(cutoff))
            .count(&self.db)
            .await
    }
}

impl Clone for InstitutionRepository {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
