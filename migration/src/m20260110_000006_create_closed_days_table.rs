use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClosedDays::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClosedDays::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClosedDays::InstitutionId).uuid().not_null())
                    .col(ColumnDef::new(ClosedDays::Date).date().not_null())
                    .col(ColumnDef::new(ClosedDays::Reason).string_len(255).not_null())
                    .col(
                        ColumnDef::new(ClosedDays::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ClosedDays::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP"),
                    )
                    .col(
                        ColumnDef::new(ClosedDays::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_closed_days_institution_id")
                            .from(ClosedDays::Table, ClosedDays::InstitutionId)
                            .to(Institutions::Table, Institutions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_closed_days_institution_id")
                    .table(ClosedDays::Table)
                    .col(ClosedDays::InstitutionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClosedDays::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ClosedDays {
    Table,
    Id,
    InstitutionId,
    Date,
    Reason,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Institutions {
    Table,
    Id,
}
