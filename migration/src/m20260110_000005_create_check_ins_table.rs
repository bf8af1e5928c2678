use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CheckIns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CheckIns::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CheckIns::ChildId).uuid().null())
                    .col(ColumnDef::new(CheckIns::RecordedBy).uuid().null())
                    .col(
                        ColumnDef::new(CheckIns::CheckedInAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CheckIns::CheckedOutAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CheckIns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_check_ins_child_id")
                            .from(CheckIns::Table, CheckIns::ChildId)
                            .to(Children::Table, Children::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_check_ins_recorded_by")
                            .from(CheckIns::Table, CheckIns::RecordedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_check_ins_child_id")
                    .table(CheckIns::Table)
                    .col(CheckIns::ChildId)
                    .to_owned(),
            )
            .await?;

        // 保持期間の判定は created_at 基準
        manager
            .create_index(
                Index::create()
                    .name("idx_check_ins_created_at")
                    .table(CheckIns::Table)
                    .col(CheckIns::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CheckIns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CheckIns {
    Table,
    Id,
    ChildId,
    RecordedBy,
    CheckedInAt,
    CheckedOutAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Children {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
