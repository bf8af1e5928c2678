// src/repository/deletion_request_repository.rs
use crate::domain::deletion_request_model::{
    self, ActiveModel as DeletionRequestActiveModel, DeletionRequestStatus,
    Entity as DeletionRequestEntity, Model as DeletionRequestModel,
};
use sea_orm::{entity::*, query::*, DatabaseTransaction, DbConn, DbErr};
use uuid::Uuid;

pub struct DeletionRequestRepository {
    db: DbConn,
}

impl DeletionRequestRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn create_in(
        &self,
        txn: &DatabaseTransaction,
        request: DeletionRequestActiveModel,
    ) -> Result<DeletionRequestModel, DbErr> {
        request.insert(txn).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DeletionRequestModel>, DbErr> {
        DeletionRequestEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn find_by_id_in(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> Result<Option<DeletionRequestModel>, DbErr> {
        DeletionRequestEntity::find_by_id(id).one(txn).await
    }

    /// Pending request for a target, read inside the creating transaction.
    /// Combined with the partial unique index this closes the window
    /// between two concurrent `create` calls.
    pub async fn find_pending_by_target_in(
        &self,
        txn: &DatabaseTransaction,
        target_user_id: Uuid,
    ) -> Result<Option<DeletionRequestModel>, DbErr> {
        DeletionRequestEntity::find()
            .filter(deletion_request_model::Column::TargetUserId.eq(target_user_id))
            .filter(deletion_request_model::Column::Status.eq(DeletionRequestStatus::Pending))
            .one(txn)
            .await
    }

    pub async fn update_in(
        &self,
        txn: &DatabaseTransaction,
        request: DeletionRequestActiveModel,
    ) -> Result<DeletionRequestModel, DbErr> {
        request.update(txn).await
    }

    pub async fn find_page(
        &self,
        status: Option<DeletionRequestStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<DeletionRequestModel>, u64), DbErr> {
        let mut query = DeletionRequestEntity::find();
        if let Some(status) = status {
            query = query.filter(deletion_request_model::Column::Status.eq(status));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(deletion_request_model::Column::CreatedAt)
            .limit(per_page)
            .offset(page.saturating_sub(1) * per_page)
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }
}

impl Clone for DeletionRequestRepository {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
