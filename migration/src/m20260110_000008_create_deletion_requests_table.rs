use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DeletionRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DeletionRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    // 対象・申請者はコンプライアンス記録としてアカウントの
                    // パージ後も残るため、FKは張らない
                    .col(
                        ColumnDef::new(DeletionRequests::TargetUserId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeletionRequests::RequesterId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DeletionRequests::Reason).text().not_null())
                    .col(
                        ColumnDef::new(DeletionRequests::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DeletionRequests::ReviewerId).uuid().null())
                    .col(
                        ColumnDef::new(DeletionRequests::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DeletionRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP"),
                    )
                    .col(
                        ColumnDef::new(DeletionRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_deletion_requests_status")
                    .table(DeletionRequests::Table)
                    .col(DeletionRequests::Status)
                    .to_owned(),
            )
            .await?;

        // 「1ユーザーにつき PENDING は最大1件」を部分ユニークインデックスで
        // 強制する（サービス層のチェックと同一トランザクションで効く）
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX uq_deletion_requests_pending_target \
                 ON deletion_requests (target_user_id) \
                 WHERE status = 'pending'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DeletionRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DeletionRequests {
    Table,
    Id,
    TargetUserId,
    RequesterId,
    Reason,
    Status,
    ReviewerId,
    ReviewedAt,
    CreatedAt,
    UpdatedAt,
}
