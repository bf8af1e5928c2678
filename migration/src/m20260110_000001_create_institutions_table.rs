use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Institutions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Institutions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Institutions::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Institutions::Address).text().null())
                    .col(ColumnDef::new(Institutions::Phone).string_len(32).null())
                    .col(
                        ColumnDef::new(Institutions::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Institutions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP"),
                    )
                    .col(
                        ColumnDef::new(Institutions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP"),
                    )
                    .to_owned(),
            )
            .await?;

        // 論理削除済みの検索（パージ候補の選択）用
        manager
            .create_index(
                Index::create()
                    .name("idx_institutions_deleted_at")
                    .table(Institutions::Table)
                    .col(Institutions::DeletedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Institutions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Institutions {
    Table,
    Id,
    Name,
    Address,
    Phone,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}
