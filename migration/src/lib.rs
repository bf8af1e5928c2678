// migration/src/lib.rs
pub use sea_orm_migration::prelude::*;

// 基本テーブル
mod m20260110_000001_create_institutions_table;
mod m20260110_000002_create_users_table;
mod m20260110_000003_create_groups_table;
mod m20260110_000004_create_children_table;

// 日常業務データ
mod m20260110_000005_create_check_ins_table;
mod m20260110_000006_create_closed_days_table;
mod m20260110_000007_create_user_content_tables;

// GDPRライフサイクル関連
mod m20260110_000008_create_deletion_requests_table;
mod m20260110_000009_create_audit_logs_table;
mod m20260110_000010_create_log_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            // 1. 所有チェーンの順にテーブルを作成（施設 → ユーザー → グループ → 園児）
            Box::new(m20260110_000001_create_institutions_table::Migration),
            Box::new(m20260110_000002_create_users_table::Migration),
            Box::new(m20260110_000003_create_groups_table::Migration),
            Box::new(m20260110_000004_create_children_table::Migration),
            // 2. 従属テーブル
            Box::new(m20260110_000005_create_check_ins_table::Migration),
            Box::new(m20260110_000006_create_closed_days_table::Migration),
            Box::new(m20260110_000007_create_user_content_tables::Migration),
            // 3. ライフサイクル・監査テーブル
            Box::new(m20260110_000008_create_deletion_requests_table::Migration),
            Box::new(m20260110_000009_create_audit_logs_table::Migration),
            Box::new(m20260110_000010_create_log_tables::Migration),
        ]
    }
}
