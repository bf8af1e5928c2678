use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Children::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Children::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Children::GroupId).uuid().null())
                    .col(ColumnDef::new(Children::InstitutionId).uuid().null())
                    .col(
                        ColumnDef::new(Children::FirstName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Children::LastName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Children::BirthDate).date().not_null())
                    .col(ColumnDef::new(Children::ParentUserId).uuid().null())
                    .col(
                        ColumnDef::new(Children::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Children::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP"),
                    )
                    .col(
                        ColumnDef::new(Children::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_children_group_id")
                            .from(Children::Table, Children::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_children_institution_id")
                            .from(Children::Table, Children::InstitutionId)
                            .to(Institutions::Table, Institutions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_children_parent_user_id")
                            .from(Children::Table, Children::ParentUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_children_group_id")
                    .table(Children::Table)
                    .col(Children::GroupId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_children_deleted_at")
                    .table(Children::Table)
                    .col(Children::DeletedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Children::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Children {
    Table,
    Id,
    GroupId,
    InstitutionId,
    FirstName,
    LastName,
    BirthDate,
    ParentUserId,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Groups {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Institutions {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
